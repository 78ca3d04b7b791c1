use super::person::{Affection, Genotype, Person, Sex};
use crate::utils::Result;
use itertools::Itertools;
use std::{
    collections::{hash_map::Entry, HashMap},
    ops::{Index, RangeInclusive},
};

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerInfo {
    pub name: String,
    /// Label of allele code `i + 1` at index `i`.
    pub alleles: Vec<String>,
}

impl MarkerInfo {
    pub fn new(name: impl Into<String>, alleles: Vec<String>) -> Self {
        Self {
            name: name.into(),
            alleles,
        }
    }

    /// Marker whose alleles are labelled `1..=count`.
    pub fn numbered(name: impl Into<String>, count: usize) -> Self {
        Self::new(name, (1..=count).map(|a| a.to_string()).collect())
    }

    pub fn allele_label(&self, code: u32) -> &str {
        code.checked_sub(1)
            .and_then(|i| self.alleles.get(i as usize))
            .map_or("?", |s| s.as_str())
    }
}

/// Names of the per-person columns, in the order the data file declares them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataLayout {
    pub markers: Vec<MarkerInfo>,
    pub traits: Vec<String>,
    pub covariates: Vec<String>,
    pub affections: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Family {
    pub famid: String,
    pub first: usize,
    pub last: usize,
    pub founders: usize,
}

impl Family {
    pub fn count(&self) -> usize {
        self.last - self.first + 1
    }

    pub fn members(&self) -> RangeInclusive<usize> {
        self.first..=self.last
    }
}

/// One pedigree row before parent links are resolved.
#[derive(Debug, Clone)]
pub struct PersonRecord {
    pub famid: String,
    pub pid: String,
    pub father: Option<String>,
    pub mother: Option<String>,
    pub sex: Sex,
    pub markers: Vec<Genotype>,
    pub traits: Vec<Option<f64>>,
    pub covariates: Vec<Option<f64>>,
    pub affections: Vec<Affection>,
}

impl PersonRecord {
    pub fn new(famid: &str, pid: &str, father: &str, mother: &str, sex: Sex) -> Self {
        let parent = |id: &str| (id != "0").then(|| id.to_string());
        Self {
            famid: famid.to_string(),
            pid: pid.to_string(),
            father: parent(father),
            mother: parent(mother),
            sex,
            markers: Vec::new(),
            traits: Vec::new(),
            covariates: Vec::new(),
            affections: Vec::new(),
        }
    }
}

/// Individuals are excluded when they carry fewer observations than required.
#[derive(Debug, Clone, Copy, Default)]
pub struct PedigreeFilter {
    pub min_genotypes: usize,
    pub min_phenotypes: usize,
    pub min_covariates: usize,
}

impl PedigreeFilter {
    pub fn is_active(&self) -> bool {
        self.min_genotypes > 0 || self.min_phenotypes > 0 || self.min_covariates > 0
    }

    /// Footnote text naming the active criteria, e.g. "individuals genotyped
    /// on at least 2 markers and phenotyped for at least 1 trait".
    pub fn describe(&self) -> Option<String> {
        if !self.is_active() {
            return None;
        }
        let suffix = |n: usize| if n == 1 { "" } else { "s" };
        let mut criteria = Vec::new();
        if self.min_genotypes > 0 {
            criteria.push(format!(
                "genotyped on at least {} marker{}",
                self.min_genotypes,
                suffix(self.min_genotypes)
            ));
        }
        if self.min_phenotypes > 0 {
            criteria.push(format!(
                "phenotyped for at least {} trait{}",
                self.min_phenotypes,
                suffix(self.min_phenotypes)
            ));
        }
        if self.min_covariates > 0 {
            criteria.push(format!(
                "controlled for at least {} covariate{}",
                self.min_covariates,
                suffix(self.min_covariates)
            ));
        }
        let joined = match criteria.split_last() {
            Some((last, rest)) if !rest.is_empty() => {
                format!("{} and {}", rest.iter().join(", "), last)
            }
            _ => criteria.iter().join(""),
        };
        Some(format!("individuals {}", joined))
    }

    fn excludes(&self, person: &Person) -> bool {
        let phenotypes = person.traits.iter().filter(|t| t.is_some()).count();
        let covariates = person.covariates.iter().filter(|c| c.is_some()).count();
        person.genotyped_markers() < self.min_genotypes
            || phenotypes < self.min_phenotypes
            || covariates < self.min_covariates
    }
}

#[derive(Debug, Clone)]
pub struct Pedigree {
    pub persons: Vec<Person>,
    pub families: Vec<Family>,
    pub layout: DataLayout,
    excluded: Vec<bool>,
}

impl Index<usize> for Pedigree {
    type Output = Person;

    fn index(&self, index: usize) -> &Person {
        &self.persons[index]
    }
}

impl Pedigree {
    pub fn from_records(layout: DataLayout, records: Vec<PersonRecord>) -> Result<Self> {
        for record in &records {
            check_record_shape(&layout, record)?;
        }

        // Families are kept in order of first appearance, members in file order
        let mut family_order: Vec<String> = Vec::new();
        let mut family_rows: HashMap<String, Vec<PersonRecord>> = HashMap::new();
        for record in records {
            match family_rows.entry(record.famid.clone()) {
                Entry::Occupied(mut rows) => rows.get_mut().push(record),
                Entry::Vacant(slot) => {
                    family_order.push(record.famid.clone());
                    slot.insert(vec![record]);
                }
            }
        }

        let mut persons = Vec::new();
        let mut families = Vec::with_capacity(family_order.len());
        for famid in family_order {
            let rows = family_rows.remove(&famid).unwrap_or_default();
            let first = persons.len();
            let members = resolve_family(&famid, rows, first)?;
            let founders = members.iter().filter(|p| p.is_founder()).count();
            persons.extend(members);
            families.push(Family {
                famid,
                first,
                last: persons.len() - 1,
                founders,
            });
        }

        let excluded = vec![false; persons.len()];
        Ok(Pedigree {
            persons,
            families,
            layout,
            excluded,
        })
    }

    pub fn len(&self) -> usize {
        self.persons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }

    pub fn marker_count(&self) -> usize {
        self.layout.markers.len()
    }

    pub fn marker(&self, marker: usize) -> &MarkerInfo {
        &self.layout.markers[marker]
    }

    /// Number of alleles declared for a marker across the whole pedigree.
    pub fn count_alleles(&self, marker: usize) -> usize {
        self.layout.markers[marker].alleles.len()
    }

    pub fn is_excluded(&self, index: usize) -> bool {
        self.excluded[index]
    }

    pub fn remaining(&self) -> usize {
        self.excluded.iter().filter(|&&e| !e).count()
    }

    /// Marks individuals failing `filter` as excluded, returning how many were dropped.
    pub fn apply_filter(&mut self, filter: &PedigreeFilter) -> usize {
        let mut dropped = 0;
        for (person, excluded) in self.persons.iter().zip(self.excluded.iter_mut()) {
            if !*excluded && filter.excludes(person) {
                *excluded = true;
                dropped += 1;
            }
        }
        if dropped > 0 {
            log::info!(
                "Filter excluded {} of {} individuals",
                dropped,
                self.persons.len()
            );
        }
        dropped
    }

    pub fn exclude(&mut self, index: usize) {
        self.excluded[index] = true;
    }
}

fn check_record_shape(layout: &DataLayout, record: &PersonRecord) -> Result<()> {
    let shape_err = |what: &str, got: usize, expected: usize| {
        format!(
            "Person {} in family {} has {} {} values, expected {}",
            record.pid, record.famid, got, what, expected
        )
    };
    if record.markers.len() != layout.markers.len() {
        return Err(shape_err("marker", record.markers.len(), layout.markers.len()));
    }
    if record.traits.len() != layout.traits.len() {
        return Err(shape_err("trait", record.traits.len(), layout.traits.len()));
    }
    if record.covariates.len() != layout.covariates.len() {
        return Err(shape_err(
            "covariate",
            record.covariates.len(),
            layout.covariates.len(),
        ));
    }
    if record.affections.len() != layout.affections.len() {
        return Err(shape_err(
            "affection",
            record.affections.len(),
            layout.affections.len(),
        ));
    }
    for (marker, genotype) in layout.markers.iter().zip(&record.markers) {
        let max_code = marker.alleles.len() as u32;
        if genotype.one > max_code || genotype.two > max_code {
            return Err(format!(
                "Person {} in family {} carries an undeclared allele at marker {}",
                record.pid, record.famid, marker.name
            ));
        }
    }
    Ok(())
}

fn resolve_family(famid: &str, rows: Vec<PersonRecord>, offset: usize) -> Result<Vec<Person>> {
    let mut lookup = HashMap::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        if lookup.insert(row.pid.clone(), i).is_some() {
            return Err(format!(
                "Person {} appears more than once in family {}",
                row.pid, famid
            ));
        }
    }

    let mut links: Vec<Option<(usize, usize)>> = Vec::with_capacity(rows.len());
    for row in &rows {
        let link = match (&row.father, &row.mother) {
            (None, None) => None,
            (Some(father), Some(mother)) => {
                let find = |id: &str| {
                    lookup.get(id).copied().ok_or_else(|| {
                        format!(
                            "Parent {} of person {} is missing from family {}",
                            id, row.pid, famid
                        )
                    })
                };
                let (f, m) = (find(father)?, find(mother)?);
                if rows[f].sex == Sex::Female {
                    return Err(format!(
                        "Father {} of person {} in family {} is recorded as female",
                        father, row.pid, famid
                    ));
                }
                if rows[m].sex == Sex::Male {
                    return Err(format!(
                        "Mother {} of person {} in family {} is recorded as male",
                        mother, row.pid, famid
                    ));
                }
                Some((f, m))
            }
            _ => {
                return Err(format!(
                    "Person {} in family {} must have both parents or neither",
                    row.pid, famid
                ))
            }
        };
        links.push(link);
    }

    let traverse = order_parents_first(&links).ok_or_else(|| {
        format!(
            "Family {} contains a pedigree loop (a person is their own ancestor)",
            famid
        )
    })?;

    Ok(rows
        .into_iter()
        .zip(links)
        .zip(traverse)
        .map(|((row, link), traverse)| Person {
            famid: row.famid,
            pid: row.pid,
            sex: row.sex,
            father: link.map(|(f, _)| f + offset),
            mother: link.map(|(_, m)| m + offset),
            traverse,
            markers: row.markers,
            traits: row.traits,
            covariates: row.covariates,
            affections: row.affections,
        })
        .collect())
}

/// Assigns each member a rank such that both parents rank below their child.
/// Returns `None` when no such order exists.
fn order_parents_first(links: &[Option<(usize, usize)>]) -> Option<Vec<usize>> {
    let mut rank: Vec<Option<usize>> = vec![None; links.len()];
    let mut next = 0;
    while next < links.len() {
        let mut progressed = false;
        for (i, link) in links.iter().enumerate() {
            if rank[i].is_some() {
                continue;
            }
            let ready = match link {
                None => true,
                Some((f, m)) => rank[*f].is_some() && rank[*m].is_some(),
            };
            if ready {
                rank[i] = Some(next);
                next += 1;
                progressed = true;
            }
        }
        if !progressed {
            return None;
        }
    }
    rank.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pedigree::testing::{build, child, founder};

    #[test]
    fn families_are_contiguous_in_first_appearance_order() {
        let ped = build(vec![
            founder("B", "1", Sex::Male),
            founder("A", "1", Sex::Male),
            founder("B", "2", Sex::Female),
            child("B", "3", "1", "2", Sex::Female),
        ]);
        assert_eq!(ped.families.len(), 2);
        assert_eq!(ped.families[0].famid, "B");
        assert_eq!(ped.families[0].members(), 0..=2);
        assert_eq!(ped.families[0].founders, 2);
        assert_eq!(ped.families[1].famid, "A");
        assert_eq!(ped.families[1].count(), 1);
        assert_eq!(ped[2].father, Some(0));
        assert_eq!(ped[2].mother, Some(1));
    }

    #[test]
    fn parents_precede_children_in_traverse_order() {
        // Child listed before its parents
        let ped = build(vec![
            child("F", "kid", "dad", "mom", Sex::Male),
            founder("F", "dad", Sex::Male),
            founder("F", "mom", Sex::Female),
        ]);
        let kid = &ped[0];
        let (dad, mom) = kid.parents().unwrap();
        assert!(ped[dad].traverse < kid.traverse);
        assert!(ped[mom].traverse < kid.traverse);
    }

    #[test]
    fn missing_parent_err() {
        let result = Pedigree::from_records(
            DataLayout::default(),
            vec![child("F", "kid", "dad", "mom", Sex::Male), founder("F", "dad", Sex::Male)],
        );
        assert_eq!(
            result.unwrap_err(),
            "Parent mom of person kid is missing from family F"
        );
    }

    #[test]
    fn single_parent_err() {
        let mut record = founder("F", "kid", Sex::Male);
        record.father = Some("dad".to_string());
        let result = Pedigree::from_records(
            DataLayout::default(),
            vec![founder("F", "dad", Sex::Male), record],
        );
        assert!(result.is_err());
    }

    #[test]
    fn female_father_err() {
        let result = Pedigree::from_records(
            DataLayout::default(),
            vec![
                founder("F", "dad", Sex::Female),
                founder("F", "mom", Sex::Female),
                child("F", "kid", "dad", "mom", Sex::Male),
            ],
        );
        assert!(result.unwrap_err().contains("recorded as female"));
    }

    #[test]
    fn pedigree_loop_err() {
        let result = Pedigree::from_records(
            DataLayout::default(),
            vec![
                child("F", "a", "b", "m", Sex::Male),
                child("F", "b", "a", "m", Sex::Male),
                founder("F", "m", Sex::Female),
            ],
        );
        assert!(result.unwrap_err().contains("pedigree loop"));
    }

    #[test]
    fn duplicate_person_err() {
        let result = Pedigree::from_records(
            DataLayout::default(),
            vec![founder("F", "a", Sex::Male), founder("F", "a", Sex::Female)],
        );
        assert!(result.is_err());
    }

    #[test]
    fn filter_excludes_sparsely_genotyped() {
        let layout = DataLayout {
            markers: vec![MarkerInfo::numbered("m1", 2), MarkerInfo::numbered("m2", 2)],
            ..Default::default()
        };
        let mut well = founder("F", "1", Sex::Male);
        well.markers = vec![Genotype::new(1, 2), Genotype::new(2, 2)];
        let mut poor = founder("F", "2", Sex::Female);
        poor.markers = vec![Genotype::new(1, 1), Genotype::MISSING];
        let mut ped = Pedigree::from_records(layout, vec![well, poor]).unwrap();

        let filter = PedigreeFilter {
            min_genotypes: 2,
            ..Default::default()
        };
        assert!(filter.is_active());
        assert_eq!(ped.apply_filter(&filter), 1);
        assert!(!ped.is_excluded(0));
        assert!(ped.is_excluded(1));
        assert_eq!(ped.remaining(), 1);
    }

    #[test]
    fn filter_descriptions() {
        assert_eq!(PedigreeFilter::default().describe(), None);
        let one = PedigreeFilter {
            min_genotypes: 1,
            ..Default::default()
        };
        assert_eq!(one.describe().unwrap(), "individuals genotyped on at least 1 marker");
        let all = PedigreeFilter {
            min_genotypes: 5,
            min_phenotypes: 1,
            min_covariates: 2,
        };
        assert_eq!(
            all.describe().unwrap(),
            "individuals genotyped on at least 5 markers, phenotyped for at least 1 trait \
             and controlled for at least 2 covariates"
        );
    }

    #[test]
    fn undeclared_allele_err() {
        let layout = DataLayout {
            markers: vec![MarkerInfo::numbered("m1", 2)],
            ..Default::default()
        };
        let mut record = founder("F", "1", Sex::Male);
        record.markers = vec![Genotype::new(1, 3)];
        assert!(Pedigree::from_records(layout, vec![record]).is_err());
    }

    #[test]
    fn allele_labels() {
        let marker = MarkerInfo::new("m", vec!["120".into(), "124".into()]);
        assert_eq!(marker.allele_label(1), "120");
        assert_eq!(marker.allele_label(2), "124");
        assert_eq!(marker.allele_label(0), "?");
    }
}
