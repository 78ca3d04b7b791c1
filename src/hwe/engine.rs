use super::exact::exact_hwe;
use super::pooling::{AlleleFrequencies, GenotypeTable};
use super::sample::{select_sample, SelectedSample};
use super::HweConfig;
use crate::pedigree::Pedigree;
use crate::utils::Result;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Fewest genotyped individuals a marker needs to be tested.
const MIN_GENOTYPED: usize = 4;
/// Two-allele markers with at least this many genotypes use the chi-square test.
const EXACT_TEST_LIMIT: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestMethod {
    Exact,
    Asymptotic,
}

impl TestMethod {
    pub fn flag(&self) -> &'static str {
        match self {
            TestMethod::Exact => "E",
            TestMethod::Asymptotic => "A",
        }
    }
}

/// Result of testing one marker. Matrices are lower triangular and indexed by
/// position among the alleles left after pooling.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerTest {
    pub marker: usize,
    pub genotyped: usize,
    pub method: TestMethod,
    pub p_value: f64,
    pub chi_square: f64,
    /// Empty for asymptotic tests.
    pub het_probabilities: Vec<f64>,
    pub allele_names: Vec<String>,
    pub pooled_names: Vec<String>,
    pub pooled_count: usize,
    pub observed: Vec<Vec<f64>>,
    pub expected: Vec<Vec<f64>>,
    pub expected_hets: usize,
    pub smallest_allele: u32,
    pub largest_allele: u32,
}

impl MarkerTest {
    pub fn fails(&self, cutoff: f64) -> bool {
        self.p_value < cutoff
    }

    pub fn is_pooled(&self) -> bool {
        self.pooled_count > 1
    }

    pub fn allele_count(&self) -> usize {
        self.allele_names.len()
    }

    pub fn total_homozygotes(&self) -> usize {
        (0..self.observed.len())
            .map(|i| self.observed[i][i] as usize)
            .sum()
    }

    pub fn observed_hets(&self) -> usize {
        self.genotyped - self.total_homozygotes()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkerOutcome {
    Tested(Box<MarkerTest>),
    Monomorphic,
    Sparse,
}

enum Prepared {
    Monomorphic,
    Sparse,
    Ready {
        raw: GenotypeTable,
        pooling: AlleleFrequencies,
        table: GenotypeTable,
    },
}

fn prepare(ped: &Pedigree, marker: usize, selected: &[bool]) -> Result<Prepared> {
    if ped.count_alleles(marker) <= 1 {
        return Ok(Prepared::Monomorphic);
    }
    let raw = GenotypeTable::count(ped, marker, selected, None);
    if raw.genotyped < MIN_GENOTYPED {
        return Ok(Prepared::Sparse);
    }
    let pooling = AlleleFrequencies::pool(raw.frequencies.clone(), raw.genotyped)?;
    let table = GenotypeTable::count(ped, marker, selected, Some(&pooling));
    if table.realized().len() <= 1 {
        return Ok(Prepared::Monomorphic);
    }
    Ok(Prepared::Ready {
        raw,
        pooling,
        table,
    })
}

/// Whether `marker` would be tested on the `selected` individuals.
pub fn is_testable(ped: &Pedigree, marker: usize, selected: &[bool]) -> Result<bool> {
    Ok(matches!(
        prepare(ped, marker, selected)?,
        Prepared::Ready { .. }
    ))
}

pub fn test_marker(ped: &Pedigree, marker: usize, selected: &[bool]) -> Result<MarkerOutcome> {
    let (raw, pooling, table) = match prepare(ped, marker, selected)? {
        Prepared::Monomorphic => return Ok(MarkerOutcome::Monomorphic),
        Prepared::Sparse => return Ok(MarkerOutcome::Sparse),
        Prepared::Ready {
            raw,
            pooling,
            table,
        } => (raw, pooling, table),
    };

    let info = ped.marker(marker);
    let label = |allele: usize| info.allele_label(allele as u32 + 1).to_string();
    let realized = table.realized();
    let n = table.genotyped;
    let nf = n as f64;
    let freq = &table.frequencies;
    let pooled_count = pooling.pooled_count();

    let mut observed = vec![vec![0.0; realized.len()]; realized.len()];
    let mut expected = vec![vec![0.0; realized.len()]; realized.len()];
    let mut chi_square = 0.0;
    let mut expected_hets = 0.0;
    for (i, &a) in realized.iter().enumerate() {
        for (j, &b) in realized.iter().enumerate().take(i + 1) {
            let exp = if i == j {
                nf * freq[a] * freq[a]
            } else {
                2.0 * nf * freq[a] * freq[b]
            };
            let obs = table.observed[a][b];
            observed[i][j] = obs;
            expected[i][j] = exp;
            chi_square += (obs - exp) * (obs - exp) / exp;
            if i != j {
                expected_hets += exp;
            }
        }
    }

    let (method, p_value, het_probabilities) = if realized.len() == 2 && n < EXACT_TEST_LIMIT {
        let minor = freq[realized[0]].min(freq[realized[1]]);
        let rare = (2.0 * nf * minor + 1e-6) as usize;
        let hets = observed[1][0] as usize;
        let exact = exact_hwe(rare, hets, n)?;
        (TestMethod::Exact, exact.p_value, exact.het_probabilities)
    } else {
        let k = realized.len() as f64;
        let chi = ChiSquared::new(k * (k - 1.0) / 2.0).map_err(|e| e.to_string())?;
        (TestMethod::Asymptotic, chi.sf(chi_square), Vec::new())
    };

    let allele_names = realized
        .iter()
        .map(|&a| {
            if pooled_count > 1 && pooling.pool_target == Some(a) {
                "* P".to_string()
            } else {
                label(a)
            }
        })
        .collect();
    let pooled_names = if pooled_count > 1 {
        (0..pooling.pooled.len())
            .filter(|&a| pooling.pooled[a])
            .map(label)
            .collect()
    } else {
        Vec::new()
    };

    let typed = raw.realized();
    let smallest_allele = typed.first().map_or(0, |&a| a as u32 + 1);
    let largest_allele = typed.last().map_or(0, |&a| a as u32 + 1);

    Ok(MarkerOutcome::Tested(Box::new(MarkerTest {
        marker,
        genotyped: n,
        method,
        p_value,
        chi_square,
        het_probabilities,
        allele_names,
        pooled_names,
        pooled_count,
        observed,
        expected,
        expected_hets: expected_hets.floor() as usize,
        smallest_allele,
        largest_allele,
    })))
}

/// Run-level tallies over every marker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HweSummary {
    pub attempted: usize,
    pub performed: usize,
    pub failed: usize,
    pub failed_05: usize,
    pub failed_01: usize,
    pub pooled: usize,
    pub failed_pooled: usize,
    pub sparse: Vec<String>,
    pub monomorphic: Vec<String>,
}

impl HweSummary {
    pub fn tally(ped: &Pedigree, outcomes: &[MarkerOutcome], cutoff: f64) -> Self {
        let mut summary = HweSummary::default();
        for (marker, outcome) in outcomes.iter().enumerate() {
            summary.attempted += 1;
            match outcome {
                MarkerOutcome::Monomorphic => {
                    summary.monomorphic.push(ped.marker(marker).name.clone())
                }
                MarkerOutcome::Sparse => summary.sparse.push(ped.marker(marker).name.clone()),
                MarkerOutcome::Tested(test) => {
                    summary.performed += 1;
                    summary.failed += test.fails(cutoff) as usize;
                    summary.failed_05 += test.fails(0.05) as usize;
                    summary.failed_01 += test.fails(0.01) as usize;
                    if test.is_pooled() {
                        summary.pooled += 1;
                        summary.failed_pooled += test.fails(cutoff) as usize;
                    }
                }
            }
        }
        summary
    }
}

#[derive(Debug, Clone)]
pub struct HweRun {
    pub sample: SelectedSample,
    pub outcomes: Vec<MarkerOutcome>,
    pub summary: HweSummary,
}

impl HweRun {
    /// Tests to list in the report: all of them, or only the failures.
    pub fn reported<'a>(&'a self, config: &'a HweConfig) -> impl Iterator<Item = &'a MarkerTest> {
        self.outcomes.iter().filter_map(move |outcome| match outcome {
            MarkerOutcome::Tested(test)
                if config.show_all || test.fails(config.significance_cutoff) =>
            {
                Some(test.as_ref())
            }
            _ => None,
        })
    }
}

pub fn test_all_markers(ped: &Pedigree, config: &HweConfig) -> Result<HweRun> {
    let sample = select_sample(ped, config.sample, config.chromosome_x)?;
    let outcomes = (0..ped.marker_count())
        .into_par_iter()
        .map(|m| {
            test_marker(ped, m, &sample.members)
                .map_err(|e| format!("Marker {}: {}", ped.marker(m).name, e))
        })
        .collect::<Result<Vec<_>>>()?;
    let summary = HweSummary::tally(ped, &outcomes, config.significance_cutoff);
    log::info!(
        "{}: {} of {} markers tested, {} failed at {}",
        sample.label(config.chromosome_x),
        summary.performed,
        summary.attempted,
        summary.failed,
        config.significance_cutoff
    );
    Ok(HweRun {
        sample,
        outcomes,
        summary,
    })
}
