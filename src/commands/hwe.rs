use super::load_filtered;
use crate::cli::HweArgs;
use crate::hwe::{test_all_markers, HweWriter, SelectionWriter};
use crate::utils::{create_writer, initialize_thread_pool, open_report_file, Result, SampleKind};

pub fn hwe(args: HweArgs) -> Result<()> {
    let (ped, filter_note) = load_filtered(&args.pedigree)?;
    if ped.marker_count() == 0 {
        log::warn!("No markers to test");
    }

    let prefix = &args.pedigree.output_prefix;
    let writer = create_writer(prefix, "hwe", open_report_file)?;
    let mut writer = HweWriter::new(writer, filter_note.clone());
    let pool = initialize_thread_pool(args.pedigree.num_threads)?;

    for config in args.configs() {
        let run = pool.install(|| test_all_markers(&ped, &config))?;
        writer.write_run(&ped, &run, &config)?;

        if config.sample == SampleKind::Unrelated && run.sample.count() > 0 {
            let selection = create_writer(prefix, "hweselection", open_report_file)?;
            SelectionWriter::new(selection, filter_note.clone()).write(&ped, &run.sample)?;
        }
        log::info!(
            "{} sample: {} markers performed, {} failed [0.05], {} failed [0.01], {} sparse, {} monomorphic",
            config.sample,
            run.summary.performed,
            run.summary.failed_05,
            run.summary.failed_01,
            run.summary.sparse.len(),
            run.summary.monomorphic.len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::write_inputs;

    fn args(dir: &std::path::Path, samples: Vec<SampleKind>) -> HweArgs {
        HweArgs {
            pedigree: write_inputs(dir),
            samples,
            significance_cutoff: 0.05,
            show_all: true,
            chromosome_x: false,
        }
    }

    #[test]
    fn writes_one_section_per_sample() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(dir.path(), vec![SampleKind::All, SampleKind::Founders]);
        let prefix = args.pedigree.output_prefix.clone();
        hwe(args).unwrap();
        let report = std::fs::read_to_string(format!("{}.hwe", prefix)).unwrap();
        assert!(report.contains("HARDY-WEINBERG CHECK AMONG ALL INDIVIDUALS\n"));
        assert!(report.contains("HARDY-WEINBERG CHECK AMONG FOUNDERS\n"));
        assert!(report.contains("Total Tests"));
        assert!(!std::path::Path::new(&format!("{}.hweselection", prefix)).exists());
    }

    #[test]
    fn unrelated_sample_writes_selection() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(dir.path(), vec![SampleKind::Unrelated]);
        let prefix = args.pedigree.output_prefix.clone();
        hwe(args).unwrap();
        let report = std::fs::read_to_string(format!("{}.hwe", prefix)).unwrap();
        assert!(report.contains("HARDY-WEINBERG CHECK USING 5 UNRELATED INDIVIDUALS\n"));
        let selection = std::fs::read_to_string(format!("{}.hweselection", prefix)).unwrap();
        assert!(selection.starts_with("\nINDIVIDUALS SELECTED FOR HARDY-WEINBERG TESTING\n"));
        assert_eq!(selection.matches("FOUNDER").count(), 5);
    }
}
