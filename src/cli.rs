use crate::hwe::HweConfig;
use crate::pairs::PairsConfig;
use crate::pedigree::{PedigreeFilter, DEFAULT_MISSING_CODE};
use crate::utils::{Result, SampleKind};
use clap::{ArgAction, ArgGroup, Args, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use std::{
    io::Write,
    path::{Path, PathBuf},
};

pub static FULL_VERSION: Lazy<String> = Lazy::new(|| {
    format!(
        "{}-{}",
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    )
});

#[derive(Parser)]
#[command(name="pedqc",
          version=&**FULL_VERSION,
          about="Relative pair classification and Hardy-Weinberg testing for pedigree data",
          long_about = None,
          disable_help_subcommand = true,
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = ArgAction::Count, help = "Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)")]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Classify and summarize relative pairs")]
    Pairs(PairsArgs),
    #[clap(about = "Test markers for Hardy-Weinberg equilibrium")]
    Hwe(HweArgs),
}

/// Inputs and filters shared by every subcommand.
#[derive(Args, Debug)]
pub struct PedigreeArgs {
    #[clap(required = true)]
    #[clap(short = 'd')]
    #[clap(long = "dat")]
    #[clap(help = "Data file describing the pedigree columns")]
    #[clap(value_name = "DAT")]
    #[arg(value_parser = check_file_exists)]
    pub data_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'p')]
    #[clap(long = "ped")]
    #[clap(help = "Pedigree file")]
    #[clap(value_name = "PED")]
    #[arg(value_parser = check_file_exists)]
    pub ped_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-prefix")]
    #[clap(help = "Prefix for output files")]
    #[clap(value_name = "OUTPUT_PREFIX")]
    #[arg(value_parser = check_prefix_path)]
    pub output_prefix: String,

    #[clap(short = 't')]
    #[clap(long = "threads")]
    #[clap(help = "Number of threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    #[arg(value_parser = threads_in_range)]
    pub num_threads: usize,

    #[clap(help_heading("Input"))]
    #[clap(long = "missing")]
    #[clap(value_name = "CODE")]
    #[clap(help = "Missing value code for quantitative traits and covariates")]
    #[clap(default_value = DEFAULT_MISSING_CODE)]
    pub missing: String,

    #[clap(help_heading("Filters"))]
    #[clap(long = "min-genos")]
    #[clap(value_name = "N")]
    #[clap(help = "Exclude individuals genotyped on fewer markers")]
    #[clap(default_value = "0")]
    pub min_genotypes: usize,

    #[clap(help_heading("Filters"))]
    #[clap(long = "min-phenos")]
    #[clap(value_name = "N")]
    #[clap(help = "Exclude individuals phenotyped for fewer traits")]
    #[clap(default_value = "0")]
    pub min_phenotypes: usize,

    #[clap(help_heading("Filters"))]
    #[clap(long = "min-covariates")]
    #[clap(value_name = "N")]
    #[clap(help = "Exclude individuals with fewer observed covariates")]
    #[clap(default_value = "0")]
    pub min_covariates: usize,
}

impl PedigreeArgs {
    pub fn filter(&self) -> PedigreeFilter {
        PedigreeFilter {
            min_genotypes: self.min_genotypes,
            min_phenotypes: self.min_phenotypes,
            min_covariates: self.min_covariates,
        }
    }
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("pairs")))]
#[command(arg_required_else_help(true))]
pub struct PairsArgs {
    #[command(flatten)]
    pub pedigree: PedigreeArgs,

    #[clap(long = "other")]
    #[clap(help = "Also count pairs sharing an ancestor without a named relationship")]
    pub include_other: bool,

    #[clap(long = "by-sex")]
    #[clap(help = "Repeat statistics for female, male and opposite-sex pairs")]
    pub by_sex: bool,
}

impl PairsArgs {
    pub fn config(&self) -> PairsConfig {
        PairsConfig {
            include_other: self.include_other,
            by_sex: self.by_sex,
        }
    }
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("hwe")))]
#[command(arg_required_else_help(true))]
pub struct HweArgs {
    #[command(flatten)]
    pub pedigree: PedigreeArgs,

    #[clap(short = 's')]
    #[clap(long = "sample")]
    #[clap(value_name = "SAMPLE")]
    #[clap(help = "Individuals to test: all, founders, unrelated (comma-separated)")]
    #[clap(value_delimiter = ',')]
    #[clap(default_value = "all")]
    pub samples: Vec<SampleKind>,

    #[clap(long = "cutoff")]
    #[clap(value_name = "P")]
    #[clap(help = "Significance level below which a marker fails")]
    #[clap(default_value = "0.05")]
    #[arg(value_parser = ensure_unit_float)]
    pub significance_cutoff: f64,

    #[clap(long = "show-all")]
    #[clap(help = "Report every tested marker, not only failures")]
    pub show_all: bool,

    #[clap(long = "chromosome-x")]
    #[clap(help = "Markers are X-linked; males are left out of every sample")]
    pub chromosome_x: bool,
}

impl HweArgs {
    /// One configuration per requested sample, duplicates dropped.
    pub fn configs(&self) -> Vec<HweConfig> {
        let mut samples = self.samples.clone();
        samples.dedup();
        samples
            .into_iter()
            .map(|sample| HweConfig {
                significance_cutoff: self.significance_cutoff,
                show_all: self.show_all,
                sample,
                chromosome_x: self.chromosome_x,
            })
            .collect()
    }
}

pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn check_prefix_path(s: &str) -> Result<String> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(format!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(s.to_string())
}

fn threads_in_range(s: &str) -> Result<usize> {
    let thread: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid thread number", s))?;
    if thread >= 1 {
        Ok(thread)
    } else {
        Err("Number of threads must be at least 1".into())
    }
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn ensure_unit_float(s: &str) -> Result<f64> {
    let value = s
        .parse::<f64>()
        .map_err(|e| format!("Could not parse float: {}", e))?;
    if !(0.0..=1.0).contains(&value) {
        Err(format!(
            "The value must be between 0.0 and 1.0, got: {}",
            value
        ))
    } else {
        Ok(value)
    }
}
