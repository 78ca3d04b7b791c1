pub mod hwe;
pub mod pairs;

use crate::cli::PedigreeArgs;
use crate::pedigree::{load_pedigree, Pedigree};
use crate::utils::Result;

/// Loads the pedigree named on the command line and applies the sample filters.
fn load_filtered(args: &PedigreeArgs) -> Result<(Pedigree, Option<String>)> {
    let mut ped = load_pedigree(&args.data_path, &args.ped_path, &args.missing)?;
    let filter = args.filter();
    if filter.is_active() {
        ped.apply_filter(&filter);
        if ped.remaining() == 0 {
            log::warn!("Filters excluded every individual");
        }
    }
    Ok((ped, filter.describe()))
}
