//! Reader for Merlin-style data (`.dat`) and pedigree (`.ped`) files.
//!
//! The data file declares one column per line as `<TYPE> <NAME>`:
//! `M` marker, `T` quantitative trait, `C` covariate, `A` affection status,
//! `Z` zygosity (ignored), `S[n]` skip `n` columns, `E` end of declarations.
//! Each pedigree row starts with `famid pid father mother sex` followed by
//! the declared columns. Genotypes are written as `a b` or `a/b`.

use super::pedigree::{DataLayout, MarkerInfo, Pedigree, PersonRecord};
use super::person::{Affection, Genotype, Sex};
use crate::utils::{open_text_reader, Result};
use itertools::Itertools;
use std::{collections::HashMap, io::BufRead, path::Path};

pub const DEFAULT_MISSING_CODE: &str = "-99.999";

#[derive(Debug, Clone, PartialEq)]
enum Column {
    Marker,
    Trait,
    Covariate,
    Affection,
    Skip(usize),
}

#[derive(Debug, Clone, PartialEq)]
struct DataFile {
    columns: Vec<Column>,
    markers: Vec<String>,
    traits: Vec<String>,
    covariates: Vec<String>,
    affections: Vec<String>,
}

fn parse_data_file<R: BufRead>(reader: R) -> Result<DataFile> {
    let mut data = DataFile {
        columns: Vec::new(),
        markers: Vec::new(),
        traits: Vec::new(),
        covariates: Vec::new(),
        affections: Vec::new(),
    };
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| e.to_string())?;
        let mut fields = line.split_whitespace();
        let Some(kind) = fields.next() else {
            continue;
        };
        if kind.starts_with('#') {
            continue;
        }
        let name = fields.next().unwrap_or("").to_string();
        let kind = kind.to_ascii_uppercase();
        match kind.as_str() {
            "E" | "END" => break,
            "M" => {
                data.columns.push(Column::Marker);
                data.markers.push(name);
            }
            "T" => {
                data.columns.push(Column::Trait);
                data.traits.push(name);
            }
            "C" => {
                data.columns.push(Column::Covariate);
                data.covariates.push(name);
            }
            "A" => {
                data.columns.push(Column::Affection);
                data.affections.push(name);
            }
            "Z" => data.columns.push(Column::Skip(1)),
            skip if skip.starts_with('S') => {
                let count = match &skip[1..] {
                    "" => 1,
                    n => n.parse::<usize>().map_err(|_| {
                        format!("Invalid skip count {} on data line {}", skip, line_no + 1)
                    })?,
                };
                data.columns.push(Column::Skip(count));
            }
            other => {
                return Err(format!(
                    "Unknown column type {} on data line {}",
                    other,
                    line_no + 1
                ))
            }
        }
    }
    Ok(data)
}

/// A pedigree row whose allele labels have not been renumbered yet.
struct RawRow {
    record: PersonRecord,
    alleles: Vec<Option<(String, String)>>,
}

struct PedParser<'a> {
    data: &'a DataFile,
    missing: &'a str,
}

impl PedParser<'_> {
    fn is_missing(&self, token: &str) -> bool {
        token == self.missing || token.eq_ignore_ascii_case("x") || token == "."
    }

    fn is_missing_allele(&self, token: &str) -> bool {
        token == "0" || self.is_missing(token)
    }

    fn parse_quantitative(&self, token: &str, line_no: usize) -> Result<Option<f64>> {
        if self.is_missing(token) {
            return Ok(None);
        }
        token
            .parse::<f64>()
            .map(Some)
            .map_err(|_| format!("Invalid value {} on pedigree line {}", token, line_no))
    }

    fn parse_row(&self, line: &str, line_no: usize) -> Result<Option<RawRow>> {
        let mut tokens = line.split_whitespace();
        let Some(famid) = tokens.next() else {
            return Ok(None);
        };
        if famid.starts_with('#') {
            return Ok(None);
        }
        let mut next = |what: &str| {
            tokens
                .next()
                .ok_or_else(|| format!("Pedigree line {} ends before {}", line_no, what))
        };
        let pid = next("person id")?;
        let father = next("father id")?;
        let mother = next("mother id")?;
        let sex: Sex = next("sex")?.parse()?;

        let mut record = PersonRecord::new(famid, pid, father, mother, sex);
        let mut alleles = Vec::with_capacity(self.data.markers.len());
        for column in &self.data.columns {
            match column {
                Column::Marker => {
                    let first = next("genotype")?;
                    let (a, b) = match first.split_once('/') {
                        Some((a, b)) => (a, b),
                        None => (first, next("second allele")?),
                    };
                    if self.is_missing_allele(a) || self.is_missing_allele(b) {
                        alleles.push(None);
                    } else {
                        alleles.push(Some((a.to_string(), b.to_string())));
                    }
                }
                Column::Trait => {
                    let value = self.parse_quantitative(next("trait")?, line_no)?;
                    record.traits.push(value);
                }
                Column::Covariate => {
                    let value = self.parse_quantitative(next("covariate")?, line_no)?;
                    record.covariates.push(value);
                }
                Column::Affection => {
                    let token = next("affection status")?;
                    let status = if self.is_missing(token) {
                        Affection::Unknown
                    } else {
                        token
                            .parse()
                            .map_err(|e| format!("{} on pedigree line {}", e, line_no))?
                    };
                    record.affections.push(status);
                }
                Column::Skip(count) => {
                    for _ in 0..*count {
                        next("skipped column")?;
                    }
                }
            }
        }
        Ok(Some(RawRow { record, alleles }))
    }
}

/// Allele labels sorted numerically when every label is a number,
/// lexically otherwise. Codes are 1-based positions in the returned list.
fn sorted_labels(labels: Vec<String>) -> Vec<String> {
    let labels: Vec<String> = labels.into_iter().unique().collect();
    if labels.iter().all(|l| l.parse::<f64>().is_ok()) {
        labels
            .into_iter()
            .map(|l| (l.parse::<f64>().unwrap_or(0.0), l))
            .sorted_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
            .map(|(_, l)| l)
            .collect()
    } else {
        labels.into_iter().sorted().collect()
    }
}

fn encode_genotypes(data: &DataFile, rows: Vec<RawRow>) -> (Vec<MarkerInfo>, Vec<PersonRecord>) {
    let markers: Vec<MarkerInfo> = data
        .markers
        .iter()
        .enumerate()
        .map(|(m, name)| {
            let labels = rows
                .iter()
                .filter_map(|row| row.alleles[m].as_ref())
                .flat_map(|(a, b)| [a.clone(), b.clone()])
                .collect();
            MarkerInfo::new(name.clone(), sorted_labels(labels))
        })
        .collect();

    let codes: Vec<HashMap<&str, u32>> = markers
        .iter()
        .map(|marker| {
            marker
                .alleles
                .iter()
                .enumerate()
                .map(|(i, label)| (label.as_str(), i as u32 + 1))
                .collect()
        })
        .collect();

    let records = rows
        .into_iter()
        .map(|row| {
            let mut record = row.record;
            record.markers = row
                .alleles
                .iter()
                .zip(&codes)
                .map(|(alleles, lookup)| match alleles {
                    Some((a, b)) => Genotype::new(lookup[a.as_str()], lookup[b.as_str()]),
                    None => Genotype::MISSING,
                })
                .collect();
            record
        })
        .collect();
    (markers, records)
}

fn parse_pedigree<R: BufRead>(data: &DataFile, reader: R, missing: &str) -> Result<Pedigree> {
    let parser = PedParser { data, missing };
    let mut rows = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| e.to_string())?;
        if let Some(row) = parser.parse_row(&line, line_no + 1)? {
            rows.push(row);
        }
    }
    let (markers, records) = encode_genotypes(data, rows);
    let layout = DataLayout {
        markers,
        traits: data.traits.clone(),
        covariates: data.covariates.clone(),
        affections: data.affections.clone(),
    };
    Pedigree::from_records(layout, records)
}

pub fn load_pedigree(data_path: &Path, ped_path: &Path, missing: &str) -> Result<Pedigree> {
    log::debug!("Reading data file {}", data_path.display());
    let data = parse_data_file(open_text_reader(data_path)?)?;
    log::debug!(
        "Declared {} markers, {} traits, {} covariates, {} affections",
        data.markers.len(),
        data.traits.len(),
        data.covariates.len(),
        data.affections.len()
    );
    log::debug!("Reading pedigree file {}", ped_path.display());
    let ped = parse_pedigree(&data, open_text_reader(ped_path)?, missing)
        .map_err(|e| format!("{}: {}", ped_path.display(), e))?;
    log::info!(
        "Loaded {} individuals in {} families",
        ped.len(),
        ped.families.len()
    );
    Ok(ped)
}
