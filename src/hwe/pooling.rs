use crate::pedigree::Pedigree;
use crate::utils::Result;

/// Allele frequencies of one marker, indexed by allele code minus one, with
/// rare alleles flagged for pooling into `pool_target`.
#[derive(Debug, Clone, PartialEq)]
pub struct AlleleFrequencies {
    pub frequencies: Vec<f64>,
    pub pooled: Vec<bool>,
    pub pool_target: Option<usize>,
}

/// Smallest allele frequency kept as its own category for `genotyped` individuals.
pub fn pooling_threshold(genotyped: usize) -> f64 {
    (3.0 / genotyped as f64).sqrt()
}

impl AlleleFrequencies {
    /// Flags alleles rarer than the pooling threshold. At least one common
    /// category always survives, and a pool that is itself too rare absorbs
    /// the rarest common allele when more than one common allele exists.
    pub fn pool(frequencies: Vec<f64>, genotyped: usize) -> Result<Self> {
        if genotyped == 0 {
            return Err("Cannot pool alleles of a marker with no genotyped individuals".into());
        }
        let threshold = pooling_threshold(genotyped);
        let mut pooled = vec![false; frequencies.len()];
        let mut pooled_sum = 0.0;
        let mut most_common_rare: Option<usize> = None;
        let mut rarest_common: Option<usize> = None;
        let mut common = 0;

        for (i, &freq) in frequencies.iter().enumerate() {
            if freq == 0.0 {
                continue;
            }
            if freq < threshold {
                pooled_sum += freq;
                pooled[i] = true;
                if most_common_rare.map_or(true, |m| freq > frequencies[m]) {
                    most_common_rare = Some(i);
                }
            } else {
                if rarest_common.map_or(true, |m| freq < frequencies[m]) {
                    rarest_common = Some(i);
                }
                common += 1;
            }
        }

        if common == 0 {
            if let Some(m) = most_common_rare {
                pooled_sum -= frequencies[m];
                pooled[m] = false;
            }
        } else if pooled_sum > 0.0 && pooled_sum < threshold && common > 1 {
            if let Some(m) = rarest_common {
                pooled_sum += frequencies[m];
                pooled[m] = true;
            }
        }

        let pool_target = if pooled_sum > 0.0 {
            pooled.iter().rposition(|&p| p)
        } else {
            None
        };
        Ok(Self {
            frequencies,
            pooled,
            pool_target,
        })
    }

    /// Index an allele is counted under once pooling is applied.
    pub fn collapse(&self, allele: usize) -> usize {
        match self.pool_target {
            Some(target) if self.pooled[allele] => target,
            _ => allele,
        }
    }

    pub fn pooled_count(&self) -> usize {
        self.pooled.iter().filter(|&&p| p).count()
    }

    /// Frequencies with every pooled allele folded into the pool target.
    pub fn collapsed(&self) -> Vec<f64> {
        let mut collapsed = vec![0.0; self.frequencies.len()];
        for (i, freq) in self.frequencies.iter().enumerate() {
            collapsed[self.collapse(i)] += freq;
        }
        collapsed
    }
}

/// Genotype counts of one marker over the selected individuals.
#[derive(Debug, Clone, PartialEq)]
pub struct GenotypeTable {
    pub genotyped: usize,
    pub frequencies: Vec<f64>,
    /// Lower-triangular counts: `observed[i][j]` with `i >= j`.
    pub observed: Vec<Vec<f64>>,
}

impl GenotypeTable {
    /// Counts genotypes of `marker` among `selected` individuals, merging
    /// alleles according to `pooling` when given.
    pub fn count(
        ped: &Pedigree,
        marker: usize,
        selected: &[bool],
        pooling: Option<&AlleleFrequencies>,
    ) -> Self {
        let alleles = ped.count_alleles(marker);
        let mut counts = vec![0.0; alleles];
        let mut observed = vec![vec![0.0; alleles]; alleles];
        let mut genotyped = 0;

        for (person, _) in ped.persons.iter().zip(selected).filter(|&(_, &s)| s) {
            if !person.is_genotyped(marker) {
                continue;
            }
            let genotype = person.markers[marker];
            let mut one = genotype.one as usize - 1;
            let mut two = genotype.two as usize - 1;
            if let Some(pooling) = pooling {
                one = pooling.collapse(one);
                two = pooling.collapse(two);
            }
            observed[one.max(two)][one.min(two)] += 1.0;
            counts[one] += 1.0;
            counts[two] += 1.0;
            genotyped += 1;
        }

        let frequencies = if genotyped > 0 {
            let total = 2.0 * genotyped as f64;
            counts.iter().map(|c| c / total).collect()
        } else {
            counts
        };
        Self {
            genotyped,
            frequencies,
            observed,
        }
    }

    /// Indices of alleles with non-zero frequency.
    pub fn realized(&self) -> Vec<usize> {
        self.frequencies
            .iter()
            .enumerate()
            .filter(|&(_, &f)| f > 0.0)
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pedigree::testing::{build_genotyped, founder};
    use crate::pedigree::Sex;

    #[test]
    fn rare_alleles_pool_together() {
        // t = sqrt(3/100) ~ 0.173
        let table = AlleleFrequencies::pool(vec![0.95, 0.03, 0.02], 100).unwrap();
        assert_eq!(table.pooled, vec![false, true, true]);
        assert_eq!(table.pool_target, Some(2));
        assert_eq!(table.pooled_count(), 2);
        let collapsed = table.collapsed();
        assert!((collapsed[2] - 0.05).abs() < 1e-12);
        assert_eq!(collapsed[1], 0.0);
    }

    #[test]
    fn no_common_allele_keeps_most_frequent_rare() {
        // t = sqrt(3/4) ~ 0.866, every allele is rare
        let table = AlleleFrequencies::pool(vec![0.5, 0.25, 0.25], 4).unwrap();
        assert_eq!(table.pooled, vec![false, true, true]);
        assert_eq!(table.pool_target, Some(2));
    }

    #[test]
    fn thin_pool_absorbs_rarest_common_allele() {
        // t = sqrt(3/300) = 0.1; pool of 0.05 is below t
        let table = AlleleFrequencies::pool(vec![0.6, 0.35, 0.05], 300).unwrap();
        assert_eq!(table.pooled, vec![false, true, true]);
        assert_eq!(table.pool_target, Some(2));
    }

    #[test]
    fn thin_pool_with_single_common_allele_is_left_alone() {
        let table = AlleleFrequencies::pool(vec![0.95, 0.05], 300).unwrap();
        assert_eq!(table.pooled, vec![false, true]);
        assert_eq!(table.pool_target, Some(1));
        assert_eq!(table.collapse(1), 1);
    }

    #[test]
    fn nothing_rare_is_a_no_op() {
        let table = AlleleFrequencies::pool(vec![0.5, 0.0, 0.5], 100).unwrap();
        assert_eq!(table.pool_target, None);
        assert_eq!(table.pooled_count(), 0);
        assert_eq!(table.collapsed(), vec![0.5, 0.0, 0.5]);
    }

    #[test]
    fn empty_marker_err() {
        assert!(AlleleFrequencies::pool(vec![0.0, 0.0], 0).is_err());
    }

    #[test]
    fn pooling_is_idempotent() {
        // t = sqrt(3/100) ~ 0.173; pool of 0.2 stays a category of its own
        let first = AlleleFrequencies::pool(vec![0.5, 0.3, 0.12, 0.08], 100).unwrap();
        let collapsed = first.collapsed();
        let second = AlleleFrequencies::pool(collapsed.clone(), 100).unwrap();
        assert_eq!(second.pooled_count(), 0);
        assert_eq!(second.collapsed(), collapsed);
        let realized = |f: &[f64]| f.iter().filter(|&&x| x > 0.0).count();
        assert_eq!(realized(&second.collapsed()), 3);
    }

    #[test]
    fn genotype_table_counts_selected_only() {
        let ped = build_genotyped(
            3,
            vec![
                founder("F", "1", Sex::Male),
                founder("F", "2", Sex::Female),
                founder("F", "3", Sex::Male),
                founder("F", "4", Sex::Female),
            ],
            &[(1, 2), (2, 3), (0, 0), (3, 3)],
        );
        let table = GenotypeTable::count(&ped, 0, &[true, true, true, false], None);
        assert_eq!(table.genotyped, 2);
        assert_eq!(table.frequencies, vec![0.25, 0.5, 0.25]);
        assert_eq!(table.observed[1][0], 1.0);
        assert_eq!(table.observed[2][1], 1.0);

        let pooling = AlleleFrequencies {
            frequencies: table.frequencies.clone(),
            pooled: vec![true, false, true],
            pool_target: Some(2),
        };
        let merged = GenotypeTable::count(&ped, 0, &[true; 4], Some(&pooling));
        assert_eq!(merged.genotyped, 3);
        assert_eq!(merged.realized(), vec![1, 2]);
        assert_eq!(merged.observed[2][1], 2.0);
        assert_eq!(merged.observed[2][2], 1.0);
    }
}
