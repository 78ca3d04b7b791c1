use super::load_filtered;
use crate::cli::PairsArgs;
use crate::pairs::{PairsWriter, PedigreePairs, Relationship};
use crate::utils::{create_writer, initialize_thread_pool, open_report_file, Result};

pub fn pairs(args: PairsArgs) -> Result<()> {
    let config = args.config();
    let (ped, filter_note) = load_filtered(&args.pedigree)?;

    let pool = initialize_thread_pool(args.pedigree.num_threads)?;
    let pairs = pool.install(|| PedigreePairs::build(&ped, config.include_other));
    for rel in Relationship::ALL {
        if rel != Relationship::Other || config.include_other {
            log::debug!("{}: {}", rel, pairs.count(rel));
        }
    }

    let writer = create_writer(&args.pedigree.output_prefix, "pairs", open_report_file)?;
    let mut writer = PairsWriter::new(writer, config.by_sex, filter_note);
    writer.write(&ped, &pairs)?;
    log::info!(
        "Classified {} relative pairs in {} families",
        pairs.total(),
        ped.families.len()
    );
    Ok(())
}
