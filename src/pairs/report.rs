//! Plain-text pair statistics report.

use super::relationship::Relationship;
use super::store::{PedigreePairs, Variable};
use crate::pedigree::Pedigree;
use crate::utils::{plural, Result};
use std::io::Write;

/// Column order of the per-variable tables.
const TABLE_ORDER: [Relationship; 6] = [
    Relationship::Sib,
    Relationship::HalfSib,
    Relationship::Cousin,
    Relationship::Parent,
    Relationship::Grandparent,
    Relationship::Avuncular,
];

const DIRECTIONAL_ORDER: [Relationship; 3] = [
    Relationship::Parent,
    Relationship::Grandparent,
    Relationship::Avuncular,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    All,
    SameSex,
    Opposite,
}

pub struct PairsWriter<W: Write> {
    writer: W,
    by_sex: bool,
    filter_note: Option<String>,
}

impl<W: Write> PairsWriter<W> {
    /// `filter_note` describes the sample restriction, if any, and is printed as a footnote.
    pub fn new(writer: W, by_sex: bool, filter_note: Option<String>) -> Self {
        Self {
            writer,
            by_sex,
            filter_note,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn line(&mut self, text: &str) -> Result<()> {
        writeln!(self.writer, "{}", text).map_err(|e| e.to_string())
    }

    pub fn write(&mut self, ped: &Pedigree, pairs: &PedigreePairs) -> Result<()> {
        let extra = if self.filter_note.is_some() { " *" } else { "" };
        self.line(&format!("\n\nPAIR STATISTICS{}", extra))?;
        self.line(&"=".repeat(extra.len() + 15))?;

        self.write_section(ped, pairs, "ALL DATA:", Scope::All)?;
        if self.by_sex {
            let split = pairs.split_on_sex(ped);
            self.write_section(ped, &split.female, "SAME SEX PAIRS (FEMALE):", Scope::SameSex)?;
            self.write_section(ped, &split.male, "SAME SEX PAIRS (MALE):", Scope::SameSex)?;
            self.write_section(ped, &split.opposite, "OPPOSITE SEX PAIRS:", Scope::Opposite)?;
        }

        if let Some(note) = self.filter_note.clone() {
            self.line(&format!("\n* NOTE:  Sample restricted to {}", note))?;
        }
        self.writer.flush().map_err(|e| e.to_string())
    }

    fn write_section(
        &mut self,
        ped: &Pedigree,
        pairs: &PedigreePairs,
        label: &str,
        scope: Scope,
    ) -> Result<()> {
        let total = pairs.total();
        if self.by_sex {
            self.line(&format!("\n{:<15} {}", label, if total > 0 { "" } else { "NONE" }))?;
        } else if total == 0 {
            self.line("\n\nNO RELATIVE PAIRS")?;
        }
        if total == 0 {
            return Ok(());
        }

        self.write_counts(ped, pairs, scope)?;
        self.write_variables(ped, pairs, scope, false)?;
        self.write_variables(ped, pairs, scope, true)?;
        self.write_affection(ped, pairs, scope)
    }

    fn write_counts(&mut self, ped: &Pedigree, pairs: &PedigreePairs, scope: Scope) -> Result<()> {
        self.line("\nRelative Pair Counts:")?;
        let mut unordered = vec![Relationship::Sib, Relationship::HalfSib, Relationship::Cousin];
        if pairs.includes_other() {
            unordered.push(Relationship::Other);
        }
        for rel in unordered {
            let count = pairs.count(rel);
            if count > 0 {
                self.line(&count_line(rel, count))?;
            }
        }

        let order = (scope == Scope::Opposite).then(|| pairs.split_on_sex_order(ped));
        for rel in DIRECTIONAL_ORDER {
            let count = pairs.count(rel);
            if count == 0 {
                continue;
            }
            let mut text = count_line(rel, count);
            if let Some(order) = &order {
                let (male_tag, female_tag) = sex_order_tags(rel);
                text.push_str(&format!(
                    " ({} {}, {} {})",
                    order.male_first.count(rel),
                    male_tag,
                    order.female_first.count(rel),
                    female_tag
                ));
            }
            self.line(&text)?;
        }
        Ok(())
    }

    fn write_variables(
        &mut self,
        ped: &Pedigree,
        pairs: &PedigreePairs,
        scope: Scope,
        covariates: bool,
    ) -> Result<()> {
        let (kind, names) = if covariates {
            ("Covariate", &ped.layout.covariates)
        } else {
            ("Trait", &ped.layout.traits)
        };
        if names.is_empty() {
            return Ok(());
        }
        let variable = |i: usize| {
            if covariates {
                Variable::Covariate(i)
            } else {
                Variable::Trait(i)
            }
        };

        let rows: Vec<(String, Vec<(String, usize)>)> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let cells = table_cells(ped, pairs, &TABLE_ORDER, variable(i));
                (name.clone(), cells)
            })
            .collect();

        self.line(&format!("\nPair Correlations for Each {}:", kind))?;
        self.line(&table_header())?;
        for (name, cells) in &rows {
            let text: Vec<&str> = cells.iter().map(|(t, _)| t.as_str()).collect();
            self.line(&format!(
                "{:>15} {:>8} {:>8} {:>8} {:>12} {:>12} {:>9}",
                name, text[0], text[1], text[2], text[3], text[4], text[5]
            ))?;
        }

        self.line(&format!("\nPair Counts for Each {}:", kind))?;
        self.line(&table_header())?;
        for (name, cells) in &rows {
            let n: Vec<usize> = cells.iter().map(|(_, n)| *n).collect();
            self.line(&format!(
                "{:>15} {:>8} {:>8} {:>8} {:>12} {:>12} {:>9}",
                name, n[0], n[1], n[2], n[3], n[4], n[5]
            ))?;
        }

        if scope != Scope::Opposite || DIRECTIONAL_ORDER.iter().all(|r| pairs.count(*r) == 0) {
            return Ok(());
        }
        let order = pairs.split_on_sex_order(ped);
        let detail: Vec<(String, Vec<(String, usize)>)> = names
            .iter()
            .enumerate()
            .filter_map(|(i, name)| {
                let cells: Vec<(String, usize)> = DIRECTIONAL_ORDER
                    .iter()
                    .flat_map(|rel| {
                        [
                            table_cells(ped, &order.male_first, &[*rel], variable(i)),
                            table_cells(ped, &order.female_first, &[*rel], variable(i)),
                        ]
                    })
                    .flatten()
                    .collect();
                let observed: usize = cells.iter().map(|(_, n)| n).sum();
                (observed > 0).then(|| (name.clone(), cells))
            })
            .collect();
        if detail.is_empty() {
            return Ok(());
        }

        self.write_detail_header(" - Correlations")?;
        for (name, cells) in &detail {
            let text: Vec<&str> = cells.iter().map(|(t, _)| t.as_str()).collect();
            self.line(&format!("{:>15} {}", name, detail_row(&text)))?;
        }
        self.write_detail_header(" - Counts")?;
        for (name, cells) in &detail {
            let n: Vec<String> = cells.iter().map(|(_, n)| n.to_string()).collect();
            let n: Vec<&str> = n.iter().map(|s| s.as_str()).collect();
            self.line(&format!("{:>15} {}", name, detail_row(&n)))?;
        }
        Ok(())
    }

    fn write_affection(
        &mut self,
        ped: &Pedigree,
        pairs: &PedigreePairs,
        scope: Scope,
    ) -> Result<()> {
        let names = ped.layout.affections.clone();
        if names.is_empty() {
            return Ok(());
        }
        self.line("\n\nPair Counts by Affection Status:")?;
        self.line(&table_header())?;
        for (a, name) in names.iter().enumerate() {
            let counts: Vec<_> = TABLE_ORDER
                .iter()
                .map(|rel| pairs.count_affection_types(ped, a, *rel))
                .collect();
            self.line(&format!("{:>15.15}", name))?;
            let rows = [
                ("Unaffected", counts.iter().map(|c| c.unaffected).collect::<Vec<_>>()),
                ("Discordant", counts.iter().map(|c| c.discordant).collect()),
                ("Affected", counts.iter().map(|c| c.affected).collect()),
            ];
            for (label, n) in rows {
                self.line(&format!(
                    "{:>2}[{:>11}] {:>8} {:>8} {:>8} {:>12} {:>12} {:>9}",
                    " ", label, n[0], n[1], n[2], n[3], n[4], n[5]
                ))?;
            }
        }

        if scope == Scope::Opposite && DIRECTIONAL_ORDER.iter().any(|r| pairs.count(*r) > 0) {
            let order = pairs.split_on_sex_order(ped);
            let mut header_written = false;
            for (a, name) in names.iter().enumerate() {
                let mut rows: [(&str, Vec<usize>); 3] =
                    [("Unaffected", vec![]), ("Discordant", vec![]), ("Affected", vec![])];
                for rel in DIRECTIONAL_ORDER {
                    for side in [&order.male_first, &order.female_first] {
                        let c = side.count_affection_types(ped, a, rel);
                        rows[0].1.push(c.unaffected);
                        rows[1].1.push(c.discordant);
                        rows[2].1.push(c.affected);
                    }
                }
                if rows.iter().flat_map(|(_, n)| n).sum::<usize>() == 0 {
                    continue;
                }
                if !header_written {
                    self.write_detail_header("")?;
                    header_written = true;
                }
                self.line(&format!("{:>15.15}", name))?;
                for (label, n) in &rows {
                    let n: Vec<String> = n.iter().map(|v| v.to_string()).collect();
                    let n: Vec<&str> = n.iter().map(|s| s.as_str()).collect();
                    self.line(&format!("{:>2}[{:>11}] {}", " ", label, detail_row(&n)))?;
                }
            }
        }
        self.line("")
    }

    fn write_detail_header(&mut self, suffix: &str) -> Result<()> {
        self.line(&format!("\nOrdered Pair Detail{}:", suffix))?;
        self.line(&format!(
            "{:>15} {:>17} {:>17} {:>17}",
            " ", "ParentChild", "Grandparent", "Avuncular"
        ))?;
        self.line(&format!(
            "{:>15} {}",
            " ",
            detail_row(&["F/D", "M/S", "GF/GD", "GM/GS", "U/N", "A/N"])
        ))
    }
}

fn count_line(rel: Relationship, count: usize) -> String {
    format!(
        "{:>25}: {:>8} {}",
        rel.to_string(),
        count,
        plural(count, "pair", "pairs")
    )
}

/// Labels for (male ancestor, female ancestor) in opposite-sex directional pairs.
fn sex_order_tags(rel: Relationship) -> (&'static str, &'static str) {
    match rel {
        Relationship::Parent => ("F/D", "M/S"),
        Relationship::Grandparent => ("GF/GD", "GM/GS"),
        _ => ("U/N", "A/N"),
    }
}

fn table_header() -> String {
    format!(
        "{:>15} {:>8} {:>8} {:>8} {:>12} {:>12} {:>9}",
        " ", "Sib", "HalfSib", "Cousin", "ParentChild", "Grandparent", "Avuncular"
    )
}

fn detail_row(cells: &[&str]) -> String {
    cells
        .iter()
        .map(|c| format!("{:>8}", c))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Correlation text and pair count per relationship; symmetric relationships are mirrored.
fn table_cells(
    ped: &Pedigree,
    pairs: &PedigreePairs,
    rels: &[Relationship],
    variable: Variable,
) -> Vec<(String, usize)> {
    rels.iter()
        .map(|rel| {
            let corr = pairs.correlation(ped, *rel, variable, !rel.is_directional());
            let text = match corr.r {
                Some(r) if corr.pairs > 1 => format!("{:7.4}", r),
                _ => format!("{:>7}", "-"),
            };
            (text, corr.pairs)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pedigree::testing::{build, child, founder};
    use crate::pedigree::{Affection, DataLayout, PersonRecord, Sex};

    fn render(ped: &Pedigree, by_sex: bool, include_other: bool) -> String {
        let pairs = PedigreePairs::build(ped, include_other);
        let mut writer = PairsWriter::new(Vec::new(), by_sex, None);
        writer.write(ped, &pairs).unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn counts_use_singular_and_plural() {
        let ped = build(vec![
            founder("F", "gf", Sex::Male),
            founder("F", "gm", Sex::Female),
            child("F", "son", "gf", "gm", Sex::Male),
            child("F", "dau", "gf", "gm", Sex::Female),
            founder("F", "wife", Sex::Female),
            child("F", "kid", "son", "wife", Sex::Female),
        ]);
        let text = render(&ped, false, false);
        assert!(text.contains("PAIR STATISTICS\n==============="));
        assert!(text.contains(&format!("{:>25}: {:>8} pair\n", "Sib-pairs", 1)));
        assert!(text.contains(&format!("{:>25}: {:>8} pairs\n", "Grandparent-Grandchild", 2)));
        assert!(text.contains(&format!("{:>25}: {:>8} pair\n", "Avuncular", 1)));
        assert!(!text.contains("Cousins"));
    }

    #[test]
    fn no_pairs() {
        let ped = build(vec![founder("F", "a", Sex::Male), founder("G", "b", Sex::Female)]);
        assert!(render(&ped, false, false).contains("NO RELATIVE PAIRS"));
    }

    #[test]
    fn opposite_sex_detail() {
        let layout = DataLayout {
            traits: vec!["bmi".to_string()],
            affections: vec!["t2d".to_string()],
            ..Default::default()
        };
        let data = [
            ("dad", "0", "0", Sex::Male, 25.0, Affection::Affected),
            ("mom", "0", "0", Sex::Female, 22.0, Affection::Unaffected),
            ("k1", "dad", "mom", Sex::Male, 24.0, Affection::Affected),
            ("k2", "dad", "mom", Sex::Female, 21.5, Affection::Unaffected),
        ];
        let records: Vec<PersonRecord> = data
            .iter()
            .map(|&(pid, f, m, sex, bmi, aff)| {
                let mut r = PersonRecord::new("F", pid, f, m, sex);
                r.traits = vec![Some(bmi)];
                r.affections = vec![aff];
                r
            })
            .collect();
        let ped = Pedigree::from_records(layout, records).unwrap();
        let text = render(&ped, true, false);
        assert!(text.contains("SAME SEX PAIRS (FEMALE):"));
        assert!(text.contains("OPPOSITE SEX PAIRS:"));
        assert!(text.contains("(1 F/D, 1 M/S)"));
        assert!(text.contains("Pair Correlations for Each Trait:"));
        assert!(text.contains("Ordered Pair Detail - Counts:"));
        assert!(text.contains("Pair Counts by Affection Status:"));
        assert!(text.contains("            t2d"));
    }
}
