mod relationship;
mod report;
mod store;

pub use relationship::{classify_family, AncestorSets, Relationship, RelativePair};
pub use report::PairsWriter;
pub use store::{
    AffectionCounts, AffectionSplit, Correlation, PedigreePairs, SexOrderSplit, SexSplit,
    Variable,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct PairsConfig {
    /// Label remaining pairs that share any ancestor as "other".
    pub include_other: bool,
    /// Repeat statistics for female-female, male-male and opposite-sex pairs.
    pub by_sex: bool,
}
