use super::relationship::{classify_family, Relationship, RelativePair};
use crate::pedigree::{Affection, Pedigree, Person, Sex};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

/// A quantitative column of the pedigree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variable {
    Trait(usize),
    Covariate(usize),
}

impl Variable {
    pub fn value(&self, person: &Person) -> Option<f64> {
        match *self {
            Variable::Trait(t) => person.traits.get(t).copied().flatten(),
            Variable::Covariate(c) => person.covariates.get(c).copied().flatten(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correlation {
    /// Undefined when fewer than two pairs are observed or either side has no variance.
    pub r: Option<f64>,
    /// Distinct pairs with both values observed.
    pub pairs: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AffectionCounts {
    pub unaffected: usize,
    pub discordant: usize,
    pub affected: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AffectionClass {
    Unaffected,
    Discordant,
    Affected,
}

fn affection_class(
    ped: &Pedigree,
    pair: &RelativePair,
    affection: usize,
) -> Option<AffectionClass> {
    let status = |i: usize| ped[i].affections.get(affection).copied();
    match (status(pair.first)?, status(pair.second)?) {
        (Affection::Unaffected, Affection::Unaffected) => Some(AffectionClass::Unaffected),
        (Affection::Affected, Affection::Affected) => Some(AffectionClass::Affected),
        (Affection::Unaffected, Affection::Affected)
        | (Affection::Affected, Affection::Unaffected) => Some(AffectionClass::Discordant),
        _ => None,
    }
}

/// Pairs of relatives grouped by relationship. Split and filter operations
/// return new stores and leave `self` untouched.
#[derive(Debug, Clone, Default)]
pub struct PedigreePairs {
    lists: [Vec<RelativePair>; 7],
    include_other: bool,
}

pub struct SexSplit {
    pub female: PedigreePairs,
    pub male: PedigreePairs,
    pub opposite: PedigreePairs,
}

pub struct SexOrderSplit {
    pub male_first: PedigreePairs,
    pub female_first: PedigreePairs,
}

pub struct AffectionSplit {
    pub unaffected: PedigreePairs,
    pub discordant: PedigreePairs,
    pub affected: PedigreePairs,
}

impl PedigreePairs {
    pub fn new(include_other: bool) -> Self {
        Self {
            lists: Default::default(),
            include_other,
        }
    }

    /// Classifies every family, in parallel, appending results in family order.
    pub fn build(ped: &Pedigree, include_other: bool) -> Self {
        let per_family: Vec<Vec<(Relationship, RelativePair)>> = ped
            .families
            .par_iter()
            .map(|family| classify_family(ped, family, include_other))
            .collect();

        let mut pairs = Self::new(include_other);
        for (rel, pair) in per_family.into_iter().flatten() {
            pairs.append(rel, pair);
        }
        log::debug!("Classified {} relative pairs", pairs.total());
        pairs
    }

    pub fn append(&mut self, rel: Relationship, pair: RelativePair) {
        self.lists[rel.index()].push(pair);
    }

    pub fn pairs(&self, rel: Relationship) -> &[RelativePair] {
        &self.lists[rel.index()]
    }

    pub fn count(&self, rel: Relationship) -> usize {
        self.lists[rel.index()].len()
    }

    pub fn includes_other(&self) -> bool {
        self.include_other
    }

    /// Pairs across all categories; "other" pairs count only when that pass is enabled.
    pub fn total(&self) -> usize {
        Relationship::ALL
            .iter()
            .filter(|rel| **rel != Relationship::Other || self.include_other)
            .map(|rel| self.count(*rel))
            .sum()
    }

    fn partition<K, F, const N: usize>(
        &self,
        rels: &[Relationship],
        keys: [K; N],
        classify: F,
    ) -> [PedigreePairs; N]
    where
        K: PartialEq,
        F: Fn(&RelativePair) -> Option<K>,
    {
        let mut parts: [PedigreePairs; N] =
            std::array::from_fn(|_| Self::new(self.include_other));
        for rel in rels {
            for pair in self.pairs(*rel) {
                let Some(key) = classify(pair) else {
                    continue;
                };
                if let Some(slot) = keys.iter().position(|k| *k == key) {
                    parts[slot].append(*rel, *pair);
                }
            }
        }
        parts
    }

    pub fn split_on_sex(&self, ped: &Pedigree) -> SexSplit {
        let [female, male, opposite] = self.partition(&Relationship::ALL, [0u8, 1, 2], |pair| {
            match (ped[pair.first].sex, ped[pair.second].sex) {
                (Sex::Female, Sex::Female) => Some(0),
                (Sex::Male, Sex::Male) => Some(1),
                (Sex::Male, Sex::Female) | (Sex::Female, Sex::Male) => Some(2),
                _ => None,
            }
        });
        SexSplit {
            female,
            male,
            opposite,
        }
    }

    /// Splits opposite-sex directional pairs by the sex of the ancestor.
    pub fn split_on_sex_order(&self, ped: &Pedigree) -> SexOrderSplit {
        let directional: Vec<Relationship> = Relationship::ALL
            .into_iter()
            .filter(|rel| rel.is_directional())
            .collect();
        let [male_first, female_first] =
            self.partition(&directional, [Sex::Male, Sex::Female], |pair| {
                match (ped[pair.first].sex, ped[pair.second].sex) {
                    (Sex::Male, Sex::Female) => Some(Sex::Male),
                    (Sex::Female, Sex::Male) => Some(Sex::Female),
                    _ => None,
                }
            });
        SexOrderSplit {
            male_first,
            female_first,
        }
    }

    /// Pairs with an undiagnosed member fall into none of the three groups.
    pub fn split_on_affection(&self, ped: &Pedigree, affection: usize) -> AffectionSplit {
        let keys = [
            AffectionClass::Unaffected,
            AffectionClass::Discordant,
            AffectionClass::Affected,
        ];
        let [unaffected, discordant, affected] = self.partition(&Relationship::ALL, keys, |pair| {
            affection_class(ped, pair, affection)
        });
        AffectionSplit {
            unaffected,
            discordant,
            affected,
        }
    }

    pub fn count_affection_types(
        &self,
        ped: &Pedigree,
        affection: usize,
        rel: Relationship,
    ) -> AffectionCounts {
        let mut counts = AffectionCounts::default();
        for pair in self.pairs(rel) {
            match affection_class(ped, pair, affection) {
                Some(AffectionClass::Unaffected) => counts.unaffected += 1,
                Some(AffectionClass::Discordant) => counts.discordant += 1,
                Some(AffectionClass::Affected) => counts.affected += 1,
                None => {}
            }
        }
        counts
    }

    fn keep_where<F>(&self, keep: F) -> PedigreePairs
    where
        F: Fn(usize) -> bool,
    {
        let mut filtered = Self::new(self.include_other);
        for rel in Relationship::ALL {
            for pair in self.pairs(rel) {
                if keep(pair.first) && keep(pair.second) {
                    filtered.append(rel, *pair);
                }
            }
        }
        filtered
    }

    pub fn filter_on_trait(&self, ped: &Pedigree, trait_index: usize) -> PedigreePairs {
        self.keep_where(|i| ped[i].is_phenotyped(trait_index))
    }

    pub fn filter_on_covariate(&self, ped: &Pedigree, covariate: usize) -> PedigreePairs {
        self.keep_where(|i| ped[i].has_covariate(covariate))
    }

    pub fn filter_on_diagnosed(&self, ped: &Pedigree, affection: usize) -> PedigreePairs {
        self.keep_where(|i| ped[i].is_diagnosed(affection))
    }

    pub fn filter_on_genotyped(&self, ped: &Pedigree, marker: usize) -> PedigreePairs {
        self.keep_where(|i| ped[i].is_genotyped(marker))
    }

    /// Pearson correlation of `variable` between the two members of each pair.
    /// With `mirror`, every pair also contributes its swapped observation.
    pub fn correlation(
        &self,
        ped: &Pedigree,
        rel: Relationship,
        variable: Variable,
        mirror: bool,
    ) -> Correlation {
        let mut observations: Vec<(f64, f64)> = Vec::new();
        let mut pairs = 0;
        for pair in self.pairs(rel) {
            let x = variable.value(&ped[pair.first]);
            let y = variable.value(&ped[pair.second]);
            let (Some(x), Some(y)) = (x, y) else {
                continue;
            };
            pairs += 1;
            observations.push((x, y));
            if mirror {
                observations.push((y, x));
            }
        }
        let r = if pairs > 1 {
            pearson(&observations)
        } else {
            None
        };
        Correlation { r, pairs }
    }
}

fn pearson(observations: &[(f64, f64)]) -> Option<f64> {
    let n = observations.len() as f64;
    let (sum_x, sum_y) = observations
        .iter()
        .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
    let (mean_x, mean_y) = (sum_x / n, sum_y / n);
    let (mut s_xx, mut s_yy, mut s_xy) = (0.0, 0.0, 0.0);
    for (x, y) in observations {
        s_xx += (x - mean_x) * (x - mean_x);
        s_yy += (y - mean_y) * (y - mean_y);
        s_xy += (x - mean_x) * (y - mean_y);
    }
    let denom = s_xx * s_yy;
    (denom > 0.0).then(|| s_xy / denom.sqrt())
}
