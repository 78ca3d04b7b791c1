use super::engine::is_testable;
use crate::pedigree::{Kinship, Pedigree, Sex};
use crate::utils::{Result, SampleKind};
use rayon::iter::{IntoParallelIterator, ParallelIterator};

/// Share of the family's best genotyping rate an individual needs to stay in
/// the unrelated sample.
const TYPED_FRACTION: f64 = 0.9;

/// Individuals taking part in one round of Hardy-Weinberg testing.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedSample {
    pub kind: SampleKind,
    pub members: Vec<bool>,
    /// Fraction of testable markers genotyped per individual; only filled for
    /// the unrelated sample.
    pub genotyped_proportions: Vec<f64>,
}

impl SelectedSample {
    pub fn count(&self) -> usize {
        self.members.iter().filter(|&&m| m).count()
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.members[index]
    }

    pub fn label(&self, chromosome_x: bool) -> String {
        let who = if chromosome_x { "Females" } else { "Individuals" };
        match self.kind {
            SampleKind::All => format!("Among All {}", who),
            SampleKind::Founders if chromosome_x => "Among Founder Females".to_string(),
            SampleKind::Founders => "Among Founders".to_string(),
            SampleKind::Unrelated => format!("Using {} Unrelated {}", self.count(), who),
        }
    }
}

pub fn select_sample(ped: &Pedigree, kind: SampleKind, chromosome_x: bool) -> Result<SelectedSample> {
    let mut members: Vec<bool> = (0..ped.len())
        .map(|i| !ped.is_excluded(i) && !(chromosome_x && ped[i].sex == Sex::Male))
        .collect();
    let mut genotyped_proportions = vec![0.0; ped.len()];

    match kind {
        SampleKind::All => {}
        SampleKind::Founders => {
            for (selected, person) in members.iter_mut().zip(&ped.persons) {
                *selected &= person.is_founder();
            }
        }
        SampleKind::Unrelated => {
            select_unrelated(ped, &mut members, &mut genotyped_proportions)?;
        }
    }

    let sample = SelectedSample {
        kind,
        members,
        genotyped_proportions,
    };
    log::debug!("Selected {} individuals for {} sample", sample.count(), kind);
    Ok(sample)
}

fn select_unrelated(ped: &Pedigree, members: &mut [bool], proportions: &mut [f64]) -> Result<()> {
    let eligible: &[bool] = members;
    let tested: Vec<bool> = (0..ped.marker_count())
        .into_par_iter()
        .map(|m| is_testable(ped, m, eligible))
        .collect::<Result<_>>()?;
    let n_tested = tested.iter().filter(|&&t| t).count();
    if n_tested == 0 {
        log::debug!("No testable markers, keeping every eligible individual");
        return Ok(());
    }

    for (person, proportion) in ped.persons.iter().zip(proportions.iter_mut()) {
        let typed = tested
            .iter()
            .enumerate()
            .filter(|&(m, &t)| t && person.is_genotyped(m))
            .count();
        *proportion = typed as f64 / n_tested as f64;
    }

    for family in &ped.families {
        let max_typed = family
            .members()
            .filter(|&i| members[i])
            .map(|i| proportions[i])
            .fold(0.0, f64::max);
        if max_typed > 0.0 {
            let cutoff = TYPED_FRACTION * max_typed;
            for i in family.members() {
                members[i] &= proportions[i] >= cutoff;
            }
        }

        let founders_present = family
            .members()
            .filter(|&i| ped[i].is_founder())
            .all(|i| members[i]);
        if founders_present {
            for i in family.members() {
                members[i] &= ped[i].is_founder();
            }
            continue;
        }

        log::trace!("Family {}: choosing unrelated members greedily", family.famid);
        let kinship = Kinship::new(ped, family);
        let candidates: Vec<usize> = family.members().filter(|&i| members[i]).collect();
        let keep = select_independent_members(&candidates, |a, b| kinship.coefficient(a, b));
        for i in candidates {
            members[i] = keep.contains(&i);
        }
    }
    Ok(())
}

/// Repeatedly keeps the candidate with the fewest remaining relatives
/// (earliest wins ties) and drops everyone related to it. No two returned
/// individuals have a positive kinship coefficient.
pub fn select_independent_members<F>(candidates: &[usize], kinship: F) -> Vec<usize>
where
    F: Fn(usize, usize) -> f64,
{
    let mut remaining: Vec<usize> = candidates.to_vec();
    let mut chosen = Vec::new();
    while !remaining.is_empty() {
        let mut pick = remaining[0];
        let mut fewest = usize::MAX;
        for &i in &remaining {
            let relatives = remaining
                .iter()
                .filter(|&&j| j != i && kinship(i, j) > 0.0)
                .count();
            if relatives < fewest {
                fewest = relatives;
                pick = i;
            }
        }
        chosen.push(pick);
        remaining.retain(|&j| j != pick && kinship(pick, j) <= 0.0);
    }
    chosen
}
