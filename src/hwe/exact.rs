use crate::utils::Result;

/// Relative slack when ranking heterozygote counts; equally likely counts
/// must rank together after rounding in the recurrence.
const TIE_TOLERANCE: f64 = 1e-7;

#[derive(Debug, Clone, PartialEq)]
pub struct ExactTest {
    pub p_value: f64,
    /// Probability of each heterozygote count given the allele counts;
    /// counts of the wrong parity stay at zero.
    pub het_probabilities: Vec<f64>,
}

fn parity(n: usize) -> &'static str {
    if n % 2 == 1 {
        "odd"
    } else {
        "even"
    }
}

/// Exact test of Hardy-Weinberg proportions for a two-allele marker with
/// `rare` copies of the minor allele and `hets` heterozygotes among
/// `genotypes` individuals. The p-value sums the probabilities of every
/// heterozygote count no more likely than the observed one.
pub fn exact_hwe(rare: usize, hets: usize, genotypes: usize) -> Result<ExactTest> {
    let n = genotypes;
    if rare > 2 * n {
        return Err(format!(
            "{} minor alleles exceed the {} alleles carried by {} individuals",
            rare,
            2 * n,
            n
        ));
    }
    let rare = if rare > n { 2 * n - rare } else { rare };
    if hets > rare {
        return Err(format!(
            "{} heterozygotes but only {} minor alleles",
            hets, rare
        ));
    }
    if rare % 2 != hets % 2 {
        return Err(format!(
            "{} number of minor alleles, but {} number of heterozygotes",
            parity(rare),
            parity(hets)
        ));
    }

    let mut probs = vec![0.0; rare + 1];
    let mut mid = rare * (2 * n - rare) / (2 * n).max(1);
    if mid % 2 != rare % 2 {
        mid += 1;
    }

    probs[mid] = 1.0;
    let mut sum = 1.0;

    let mut hom_r = ((rare - mid) / 2) as f64;
    let mut hom_c = (n - mid) as f64 - hom_r;
    let mut het = mid;
    while het > 1 {
        let h = het as f64;
        probs[het - 2] = probs[het] * h * (h - 1.0) / (4.0 * (hom_r + 1.0) * (hom_c + 1.0));
        sum += probs[het - 2];
        hom_r += 1.0;
        hom_c += 1.0;
        het -= 2;
    }

    let mut hom_r = ((rare - mid) / 2) as f64;
    let mut hom_c = (n - mid) as f64 - hom_r;
    let mut het = mid;
    while het + 2 <= rare {
        let h = het as f64;
        probs[het + 2] = probs[het] * 4.0 * hom_r * hom_c / ((h + 2.0) * (h + 1.0));
        sum += probs[het + 2];
        hom_r -= 1.0;
        hom_c -= 1.0;
        het += 2;
    }

    for p in probs.iter_mut() {
        *p /= sum;
    }

    let observed = probs[hets] * (1.0 + TIE_TOLERANCE);
    let p_value: f64 = probs.iter().filter(|&&p| p <= observed).sum();
    Ok(ExactTest {
        p_value: p_value.min(1.0),
        het_probabilities: probs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use statrs::function::factorial::ln_factorial;

    /// P(hets | n, rare) from the closed form, for comparison with the recurrence.
    fn closed_form(n: u64, rare: u64, hets: u64) -> f64 {
        let hom_r = (rare - hets) / 2;
        let hom_c = n - hets - hom_r;
        let common = 2 * n - rare;
        let ln = hets as f64 * 2f64.ln() + ln_factorial(n) + ln_factorial(rare)
            + ln_factorial(common)
            - ln_factorial(hom_r)
            - ln_factorial(hets)
            - ln_factorial(hom_c)
            - ln_factorial(2 * n);
        ln.exp()
    }

    #[test]
    fn small_sample_by_hand() {
        // n = 3, two minor alleles: P(0 hets) = 0.2, P(2 hets) = 0.8
        let test = exact_hwe(2, 0, 3).unwrap();
        assert!((test.het_probabilities[0] - 0.2).abs() < 1e-12);
        assert!((test.het_probabilities[2] - 0.8).abs() < 1e-12);
        assert!((test.p_value - 0.2).abs() < 1e-12);
        assert!((exact_hwe(2, 2, 3).unwrap().p_value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn matches_closed_form_distribution() {
        for &(n, rare) in &[(100u64, 21u64), (100, 100), (57, 30), (10, 7)] {
            let hets = rare % 2;
            let test = exact_hwe(rare as usize, hets as usize, n as usize).unwrap();
            let mut total = 0.0;
            for h in (rare % 2..=rare).step_by(2) {
                let expected = closed_form(n, rare, h);
                let got = test.het_probabilities[h as usize];
                assert!(
                    (expected - got).abs() < 1e-9,
                    "n={} rare={} h={}: {} vs {}",
                    n,
                    rare,
                    h,
                    expected,
                    got
                );
                total += got;
            }
            assert!((total - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn p_value_ranks_by_probability() {
        let n = 100;
        let rare = 40;
        for hets in (0..=rare).step_by(2) {
            let test = exact_hwe(rare, hets, n).unwrap();
            let observed = closed_form(n as u64, rare as u64, hets as u64);
            let expected: f64 = (0..=rare)
                .step_by(2)
                .map(|h| closed_form(n as u64, rare as u64, h as u64))
                .filter(|&p| p <= observed * (1.0 + TIE_TOLERANCE))
                .sum();
            assert!((test.p_value - expected.min(1.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn balanced_alleles_known_p_values() {
        // 100 individuals, allele frequency 0.5
        let deficit = exact_hwe(100, 40, 100).unwrap();
        let excess = exact_hwe(100, 60, 100).unwrap();
        assert!((deficit.p_value - 0.0469).abs() < 5e-5);
        assert!((excess.p_value - 0.0710).abs() < 5e-5);
        assert!((exact_hwe(100, 50, 100).unwrap().p_value - 1.0).abs() < 1e-12);
        assert!((exact_hwe(40, 20, 100).unwrap().p_value - 0.000511).abs() < 5e-7);
    }

    #[test]
    fn equally_likely_counts_share_p_value() {
        // P(30 hets) == P(36 hets) exactly for 36 minor alleles in 188 individuals
        let fewer = exact_hwe(36, 30, 188).unwrap();
        let more = exact_hwe(36, 36, 188).unwrap();
        assert_eq!(fewer.p_value, more.p_value);
        assert!((more.p_value - 0.383668).abs() < 1e-6);
    }

    #[test]
    fn heterozygote_excess_and_deficit_both_fail() {
        // 100 individuals, 40 minor alleles: expectation is ~32 hets
        assert!(exact_hwe(40, 2, 100).unwrap().p_value < 1e-6);
        assert!(exact_hwe(40, 40, 100).unwrap().p_value < 0.05);
        assert!(exact_hwe(40, 32, 100).unwrap().p_value > 0.5);
    }

    #[test]
    fn minor_allele_is_folded() {
        // 160 copies of one allele in 100 individuals means 40 of the other
        let folded = exact_hwe(160, 32, 100).unwrap();
        let direct = exact_hwe(40, 32, 100).unwrap();
        assert_eq!(folded, direct);
    }

    #[test]
    fn parity_mismatch_err() {
        let err = exact_hwe(21, 4, 100).unwrap_err();
        assert_eq!(err, "odd number of minor alleles, but even number of heterozygotes");
    }

    #[test]
    fn too_many_heterozygotes_err() {
        assert!(exact_hwe(10, 12, 100).is_err());
    }
}
