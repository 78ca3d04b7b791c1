//! Plain-text Hardy-Weinberg reports.

use super::engine::{HweRun, MarkerTest, TestMethod};
use super::sample::SelectedSample;
use super::HweConfig;
use crate::pedigree::Pedigree;
use crate::utils::{wrap_names, Result};
use std::io::Write;

const ALLELE_COUNT_WIDTH: usize = 13;
const ALLELE_RANGE_WIDTH: usize = 7;
const LIST_WIDTH: usize = 79;

/// Formats like C's `%.*e`: the exponent carries a sign and at least two digits.
fn scientific(value: f64, precision: usize) -> String {
    let formatted = format!("{:.*e}", precision, value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => formatted,
    }
}

pub fn format_p_value(p: f64) -> String {
    if p > 1e-4 {
        format!("{:.4}", p)
    } else {
        scientific(p, if p < 9.9e-99 { 0 } else { 1 })
    }
}

pub struct HweWriter<W: Write> {
    writer: W,
    filter_note: Option<String>,
}

impl<W: Write> HweWriter<W> {
    pub fn new(writer: W, filter_note: Option<String>) -> Self {
        Self {
            writer,
            filter_note,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn text(&mut self, text: &str) -> Result<()> {
        write!(self.writer, "{}", text).map_err(|e| e.to_string())
    }

    /// Writes one section of the report for a single sample kind.
    pub fn write_run(&mut self, ped: &Pedigree, run: &HweRun, config: &HweConfig) -> Result<()> {
        let mut label = run.sample.label(config.chromosome_x);
        if self.filter_note.is_some() {
            label.push_str(" *");
        }
        self.text(&format!(
            "\n\n\nHARDY-WEINBERG CHECK {}\n{}\n",
            label.to_uppercase(),
            "=".repeat(label.len() + 21)
        ))?;

        let hom_width = if ped.len() > 9999 { 17 } else { 15 };
        let spacer = if hom_width == 17 { 1 } else { 2 };
        for (index, test) in run.reported(config).enumerate() {
            if index == 0 {
                self.text(&format!(
                    "{:>15} {:>hw$} {:>6} {:>6}{:sp$}{:>aw$} {:>rw$} {:>7}\n",
                    "",
                    "N_HOM",
                    "N_HET",
                    "E_HET",
                    "",
                    "N_ALLELES",
                    "ALLELES",
                    "P-VALUE",
                    hw = hom_width,
                    sp = spacer,
                    aw = ALLELE_COUNT_WIDTH,
                    rw = ALLELE_RANGE_WIDTH,
                ))?;
            }
            self.text(&format_row(ped, test, hom_width, spacer))?;
        }

        self.write_footer(run, config)?;
        self.writer.flush().map_err(|e| e.to_string())
    }

    fn write_footer(&mut self, run: &HweRun, config: &HweConfig) -> Result<()> {
        let summary = &run.summary;
        if summary.performed == 0 {
            self.text("No markers tested.\n\n")?;
        } else if summary.failed > 0 {
            self.text("\n")?;
        } else if summary.performed == 1 {
            self.text("All tested markers okay.\n\n")?;
        } else {
            self.text(&format!("All {} tested markers okay.\n\n", summary.performed))?;
        }

        let pooled_shown = if config.show_all {
            summary.pooled
        } else {
            summary.failed_pooled
        };
        if summary.performed > 0 && pooled_shown > 0 {
            self.text("*  Denotes pooled alleles\n")?;
        }
        if let Some(note) = self.filter_note.clone() {
            self.text(&format!("\n** NOTE:  Sample restricted to {}\n", note))?;
        }

        self.text(&format!(
            "\n{:>15} {:>15} {:>15} {:>15} {:>15}\n{:>15} {:>15} {:>15} {:>15} {:>15}\n",
            "",
            "Attempted",
            "Performed",
            "Failed [0.05]",
            "Failed [0.01]",
            "Total Tests",
            summary.attempted,
            summary.performed,
            summary.failed_05,
            summary.failed_01
        ))?;

        if !summary.sparse.is_empty() {
            self.text(
                "The following markers were not tested for Hardy-Weinberg due to a low \n\
                 number of genotyped individuals:\n",
            )?;
            self.write_names(&summary.sparse)?;
        }
        self.text("\n\n")?;

        if !summary.monomorphic.is_empty() {
            self.text(
                "The following markers could not be tested for Hardy-Weinberg \n\
                 because they were monomorphic.\n",
            )?;
            self.write_names(&summary.monomorphic)?;
        }
        self.text("\n\n")
    }

    fn write_names(&mut self, names: &[String]) -> Result<()> {
        for line in wrap_names(names, LIST_WIDTH) {
            self.text(&format!("\n{}", line))?;
        }
        Ok(())
    }
}

fn format_row(ped: &Pedigree, test: &MarkerTest, hom_width: usize, spacer: usize) -> String {
    let name = &ped.marker(test.marker).name;
    let allele_counts = if test.is_pooled() {
        format!("{:>2}, {:>2} pooled", test.allele_count(), test.pooled_count)
    } else {
        format!("{:>2}", test.allele_count())
    };
    let p_value = format_p_value(test.p_value);
    let total_hom = test.total_homozygotes();

    match test.method {
        TestMethod::Exact => {
            let display = |name: &str| if name == "* P" { "*".to_string() } else { name.to_string() };
            let first = display(&test.allele_names[0]);
            let second = display(&test.allele_names[1]);
            let reverse = test.observed[0][0] > test.observed[1][1];
            let rare_hom = if reverse {
                test.observed[1][1] as usize
            } else {
                test.observed[0][0] as usize
            };
            let (rare, common) = if reverse {
                (second, first)
            } else {
                (first, second)
            };
            let hom_counts = format!("{}, {} rare", total_hom, rare_hom);
            let range = format!("{:>2}/{:<2}", rare, common);
            format!(
                "{:>15.15} {:>hw$} {:>6} {:>6}{:sp$}{:>aw$} {:>rw$} {:>7} {}\n",
                name,
                hom_counts,
                test.observed[1][0] as usize,
                test.expected_hets,
                "",
                allele_counts,
                range.trim(),
                p_value,
                test.method.flag(),
                hw = hom_width,
                sp = spacer,
                aw = ALLELE_COUNT_WIDTH,
                rw = ALLELE_RANGE_WIDTH,
            )
        }
        TestMethod::Asymptotic => {
            let range = format!("{:>2}-{:<2}", test.smallest_allele, test.largest_allele);
            format!(
                "{:>15} {:>hw$} {:>6} {:>6}{:sp$}{:>aw$} {:>rw$} {:>7} {}\n",
                name,
                total_hom,
                test.genotyped - total_hom,
                test.expected_hets,
                "",
                allele_counts,
                range.trim(),
                p_value,
                test.method.flag(),
                hw = hom_width,
                sp = spacer,
                aw = ALLELE_COUNT_WIDTH,
                rw = ALLELE_RANGE_WIDTH,
            )
        }
    }
}

/// Lists the individuals chosen for the unrelated sample.
pub struct SelectionWriter<W: Write> {
    writer: W,
    filter_note: Option<String>,
}

impl<W: Write> SelectionWriter<W> {
    pub fn new(writer: W, filter_note: Option<String>) -> Self {
        Self {
            writer,
            filter_note,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn write(&mut self, ped: &Pedigree, sample: &SelectedSample) -> Result<()> {
        let extra = if self.filter_note.is_some() { " *" } else { "" };
        let mut out = format!(
            "\nINDIVIDUALS SELECTED FOR HARDY-WEINBERG TESTING{}\n{}\n\n",
            extra,
            "=".repeat(47 + extra.len())
        );
        out.push_str(&format!(
            "{:>15} {:>15} {:>15} {:>15}\n",
            "FAMILY", "PERSON", "STATUS", "GENOTYPE PROP"
        ));
        for (i, person) in ped.persons.iter().enumerate() {
            if !sample.is_selected(i) {
                continue;
            }
            let status = if person.is_founder() {
                "FOUNDER"
            } else {
                "NON-FOUNDER"
            };
            out.push_str(&format!(
                "{:>15} {:>15} {:>15} {:>15.5}\n",
                person.famid, person.pid, status, sample.genotyped_proportions[i]
            ));
        }
        match &self.filter_note {
            Some(note) => out.push_str(&format!("\n** NOTE:  Sample restricted to {}\n", note)),
            None => out.push_str("\n\n"),
        }
        self.writer
            .write_all(out.as_bytes())
            .and_then(|_| self.writer.flush())
            .map_err(|e| e.to_string())
    }
}
