use std::{fmt, str::FromStr};

/// Which individuals take part in a Hardy-Weinberg run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    All,
    Founders,
    Unrelated,
}

impl FromStr for SampleKind {
    type Err = &'static str;
    fn from_str(kind: &str) -> Result<Self, Self::Err> {
        match kind {
            "all" => Ok(SampleKind::All),
            "founders" => Ok(SampleKind::Founders),
            "unrelated" | "independent" => Ok(SampleKind::Unrelated),
            _ => Err("Invalid sample (all, founders or unrelated)"),
        }
    }
}

impl fmt::Display for SampleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SampleKind::All => "all",
            SampleKind::Founders => "founders",
            SampleKind::Unrelated => "unrelated",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_sample_kinds() {
        assert_eq!("all".parse::<SampleKind>(), Ok(SampleKind::All));
        assert_eq!("founders".parse::<SampleKind>(), Ok(SampleKind::Founders));
        assert_eq!("unrelated".parse::<SampleKind>(), Ok(SampleKind::Unrelated));
        assert_eq!("independent".parse::<SampleKind>(), Ok(SampleKind::Unrelated));
        assert!("everyone".parse::<SampleKind>().is_err());
    }
}
