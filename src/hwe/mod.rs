mod engine;
mod exact;
mod pooling;
mod report;
mod sample;

use crate::utils::SampleKind;

pub use engine::{
    is_testable, test_all_markers, test_marker, HweRun, HweSummary, MarkerOutcome, MarkerTest,
    TestMethod,
};
pub use exact::{exact_hwe, ExactTest};
pub use pooling::{pooling_threshold, AlleleFrequencies, GenotypeTable};
pub use report::{format_p_value, HweWriter, SelectionWriter};
pub use sample::{select_independent_members, select_sample, SelectedSample};

#[derive(Debug, Clone, Copy)]
pub struct HweConfig {
    /// Markers with a p-value below this fail.
    pub significance_cutoff: f64,
    /// Report every tested marker, not only the failures.
    pub show_all: bool,
    pub sample: SampleKind,
    /// Males are hemizygous and left out of every sample.
    pub chromosome_x: bool,
}

impl Default for HweConfig {
    fn default() -> Self {
        Self {
            significance_cutoff: 0.05,
            show_all: false,
            sample: SampleKind::All,
            chromosome_x: false,
        }
    }
}
