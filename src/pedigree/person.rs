use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Unknown,
    Male,
    Female,
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "1" | "M" | "m" => Sex::Male,
            "2" | "F" | "f" => Sex::Female,
            _ => Sex::Unknown,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affection {
    Unknown,
    Unaffected,
    Affected,
}

impl Affection {
    pub fn is_diagnosed(&self) -> bool {
        *self != Affection::Unknown
    }
}

impl FromStr for Affection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" => Ok(Affection::Unaffected),
            "2" => Ok(Affection::Affected),
            "0" => Ok(Affection::Unknown),
            _ => Err(format!("Invalid affection status: {}", s)),
        }
    }
}

/// Unordered pair of allele codes; code 0 means the allele is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Genotype {
    pub one: u32,
    pub two: u32,
}

impl Genotype {
    pub const MISSING: Genotype = Genotype { one: 0, two: 0 };

    pub fn new(one: u32, two: u32) -> Self {
        Self { one, two }
    }

    pub fn is_known(&self) -> bool {
        self.one > 0 && self.two > 0
    }

    pub fn is_heterozygous(&self) -> bool {
        self.is_known() && self.one != self.two
    }
}

#[derive(Debug, Clone)]
pub struct Person {
    pub famid: String,
    pub pid: String,
    pub sex: Sex,
    /// Global indices into the pedigree; both set or both unset.
    pub father: Option<usize>,
    pub mother: Option<usize>,
    /// Family-local position in an ordering where parents precede children.
    pub traverse: usize,
    pub markers: Vec<Genotype>,
    pub traits: Vec<Option<f64>>,
    pub covariates: Vec<Option<f64>>,
    pub affections: Vec<Affection>,
}

impl Person {
    pub fn is_founder(&self) -> bool {
        self.father.is_none()
    }

    pub fn parents(&self) -> Option<(usize, usize)> {
        match (self.father, self.mother) {
            (Some(father), Some(mother)) => Some((father, mother)),
            _ => None,
        }
    }

    pub fn is_genotyped(&self, marker: usize) -> bool {
        self.markers.get(marker).is_some_and(|g| g.is_known())
    }

    pub fn is_phenotyped(&self, trait_index: usize) -> bool {
        matches!(self.traits.get(trait_index), Some(Some(_)))
    }

    pub fn has_covariate(&self, covariate: usize) -> bool {
        matches!(self.covariates.get(covariate), Some(Some(_)))
    }

    pub fn is_diagnosed(&self, affection: usize) -> bool {
        self.affections
            .get(affection)
            .is_some_and(|a| a.is_diagnosed())
    }

    pub fn genotyped_markers(&self) -> usize {
        self.markers.iter().filter(|g| g.is_known()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_sex_codes() {
        assert_eq!("1".parse::<Sex>().unwrap(), Sex::Male);
        assert_eq!("m".parse::<Sex>().unwrap(), Sex::Male);
        assert_eq!("F".parse::<Sex>().unwrap(), Sex::Female);
        assert_eq!("0".parse::<Sex>().unwrap(), Sex::Unknown);
        assert_eq!("x".parse::<Sex>().unwrap(), Sex::Unknown);
    }

    #[test]
    fn parse_affection_codes() {
        assert_eq!("2".parse::<Affection>().unwrap(), Affection::Affected);
        assert_eq!("1".parse::<Affection>().unwrap(), Affection::Unaffected);
        assert_eq!("0".parse::<Affection>().unwrap(), Affection::Unknown);
        assert!("3".parse::<Affection>().is_err());
    }

    #[test]
    fn genotype_missing_alleles() {
        assert!(!Genotype::MISSING.is_known());
        assert!(!Genotype::new(1, 0).is_known());
        assert!(Genotype::new(1, 2).is_heterozygous());
        assert!(!Genotype::new(2, 2).is_heterozygous());
    }
}
