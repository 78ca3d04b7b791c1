use crate::pedigree::{Family, Pedigree};
use std::{collections::BTreeSet, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relationship {
    Sib,
    HalfSib,
    Cousin,
    Avuncular,
    Grandparent,
    Parent,
    Other,
}

impl Relationship {
    pub const ALL: [Relationship; 7] = [
        Relationship::Sib,
        Relationship::HalfSib,
        Relationship::Cousin,
        Relationship::Avuncular,
        Relationship::Grandparent,
        Relationship::Parent,
        Relationship::Other,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Directional pairs store the ancestor (or uncle/aunt) first.
    pub fn is_directional(&self) -> bool {
        matches!(
            self,
            Relationship::Avuncular | Relationship::Grandparent | Relationship::Parent
        )
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            Relationship::Sib => "Sib-pairs",
            Relationship::HalfSib => "Half-Sibs",
            Relationship::Cousin => "Cousins",
            Relationship::Avuncular => "Avuncular",
            Relationship::Grandparent => "Grandparent-Grandchild",
            Relationship::Parent => "Parent-Child",
            Relationship::Other => "Other Relatives",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelativePair {
    pub first: usize,
    pub second: usize,
}

impl RelativePair {
    pub fn new(first: usize, second: usize) -> Self {
        Self { first, second }
    }
}

pub fn is_sib(ped: &Pedigree, a: usize, b: usize) -> bool {
    a != b && ped[a].parents().is_some() && ped[a].parents() == ped[b].parents()
}

pub fn is_half_sib(ped: &Pedigree, a: usize, b: usize) -> bool {
    match (ped[a].parents(), ped[b].parents()) {
        (Some((fa, ma)), Some((fb, mb))) if a != b => (fa == fb) != (ma == mb),
        _ => false,
    }
}

/// True when `parent` is the father or mother of `child`.
pub fn is_ordered_parent(ped: &Pedigree, parent: usize, child: usize) -> bool {
    ped[child]
        .parents()
        .is_some_and(|(f, m)| f == parent || m == parent)
}

pub fn is_parent(ped: &Pedigree, a: usize, b: usize) -> bool {
    let (older, younger) = if ped[a].traverse < ped[b].traverse {
        (a, b)
    } else {
        (b, a)
    };
    is_ordered_parent(ped, older, younger)
}

/// True when `elder` is a full sib of one of `junior`'s parents.
pub fn is_ordered_avuncular(ped: &Pedigree, elder: usize, junior: usize) -> bool {
    match ped[junior].parents() {
        Some((f, m)) if !is_parent(ped, elder, junior) => {
            is_sib(ped, elder, f) || is_sib(ped, elder, m)
        }
        _ => false,
    }
}

pub fn is_cousin(ped: &Pedigree, a: usize, b: usize) -> bool {
    let (Some((fa, ma)), Some((fb, mb))) = (ped[a].parents(), ped[b].parents()) else {
        return false;
    };
    if is_sib(ped, a, b) || is_half_sib(ped, a, b) {
        return false;
    }
    [fa, ma]
        .into_iter()
        .any(|pa| [fb, mb].into_iter().any(|pb| is_sib(ped, pa, pb)))
}

/// True when `elder` is a parent of one of `junior`'s parents.
pub fn is_ordered_grandparent(ped: &Pedigree, elder: usize, junior: usize) -> bool {
    match ped[junior].parents() {
        Some((f, m)) => is_ordered_parent(ped, elder, f) || is_ordered_parent(ped, elder, m),
        None => false,
    }
}

/// Each member's ancestors (itself included), built parents-first without recursion.
pub struct AncestorSets {
    first: usize,
    sets: Vec<BTreeSet<usize>>,
}

impl AncestorSets {
    pub fn new(ped: &Pedigree, family: &Family) -> Self {
        let mut order: Vec<usize> = family.members().collect();
        order.sort_by_key(|&i| ped[i].traverse);

        let mut sets = vec![BTreeSet::new(); family.count()];
        for person in order {
            let mut ancestors = BTreeSet::from([person]);
            if let Some((f, m)) = ped[person].parents() {
                ancestors.extend(&sets[f - family.first]);
                ancestors.extend(&sets[m - family.first]);
            }
            sets[person - family.first] = ancestors;
        }
        Self {
            first: family.first,
            sets,
        }
    }

    pub fn of(&self, person: usize) -> &BTreeSet<usize> {
        &self.sets[person - self.first]
    }

    pub fn share_ancestor(&self, ped: &Pedigree, a: usize, b: usize) -> bool {
        if ped[a].is_founder() && ped[b].is_founder() {
            return false;
        }
        !self.of(a).is_disjoint(self.of(b))
    }
}

/// Labels every pair of non-excluded family members with the first matching
/// relationship. Pairs matching nothing are left out.
pub fn classify_family(
    ped: &Pedigree,
    family: &Family,
    include_other: bool,
) -> Vec<(Relationship, RelativePair)> {
    let ancestors = include_other.then(|| AncestorSets::new(ped, family));
    let mut pairs = Vec::new();
    for i in family.members() {
        if ped.is_excluded(i) {
            continue;
        }
        for j in (i + 1)..=family.last {
            if ped.is_excluded(j) {
                continue;
            }
            if let Some(labelled) = classify_pair(ped, i, j, ancestors.as_ref()) {
                pairs.push(labelled);
            }
        }
    }
    pairs
}

fn classify_pair(
    ped: &Pedigree,
    i: usize,
    j: usize,
    ancestors: Option<&AncestorSets>,
) -> Option<(Relationship, RelativePair)> {
    let pair = RelativePair::new;
    let labelled = if is_sib(ped, i, j) {
        (Relationship::Sib, pair(i, j))
    } else if is_ordered_parent(ped, i, j) {
        (Relationship::Parent, pair(i, j))
    } else if is_ordered_parent(ped, j, i) {
        (Relationship::Parent, pair(j, i))
    } else if is_half_sib(ped, i, j) {
        (Relationship::HalfSib, pair(i, j))
    } else if is_ordered_avuncular(ped, i, j) {
        (Relationship::Avuncular, pair(i, j))
    } else if is_ordered_avuncular(ped, j, i) {
        (Relationship::Avuncular, pair(j, i))
    } else if is_cousin(ped, i, j) {
        (Relationship::Cousin, pair(i, j))
    } else if is_ordered_grandparent(ped, i, j) {
        (Relationship::Grandparent, pair(i, j))
    } else if is_ordered_grandparent(ped, j, i) {
        (Relationship::Grandparent, pair(j, i))
    } else if ancestors.is_some_and(|a| a.share_ancestor(ped, i, j)) {
        (Relationship::Other, pair(i, j))
    } else {
        return None;
    };
    Some(labelled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pedigree::testing::{build, child, founder};
    use crate::pedigree::{PersonRecord, Sex};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn count(pairs: &[(Relationship, RelativePair)], rel: Relationship) -> usize {
        pairs.iter().filter(|(r, _)| *r == rel).count()
    }

    fn classify_all(ped: &Pedigree, include_other: bool) -> Vec<(Relationship, RelativePair)> {
        ped.families
            .iter()
            .flat_map(|f| classify_family(ped, f, include_other))
            .collect()
    }

    #[test]
    fn nuclear_family() {
        let ped = build(vec![
            founder("F", "dad", Sex::Male),
            founder("F", "mom", Sex::Female),
            child("F", "k1", "dad", "mom", Sex::Male),
            child("F", "k2", "dad", "mom", Sex::Female),
            child("F", "k3", "dad", "mom", Sex::Male),
        ]);
        let pairs = classify_all(&ped, false);
        assert_eq!(count(&pairs, Relationship::Sib), 3);
        assert_eq!(count(&pairs, Relationship::Parent), 6);
        assert_eq!(count(&pairs, Relationship::Avuncular), 0);
        assert_eq!(count(&pairs, Relationship::Cousin), 0);
        assert_eq!(count(&pairs, Relationship::Grandparent), 0);
        assert_eq!(pairs.len(), 9);
    }

    fn three_generations() -> Vec<PersonRecord> {
        vec![
            founder("F", "gf", Sex::Male),
            founder("F", "gm", Sex::Female),
            child("F", "son", "gf", "gm", Sex::Male),
            child("F", "dau", "gf", "gm", Sex::Female),
            founder("F", "wife", Sex::Female),
            child("F", "grandkid", "son", "wife", Sex::Female),
        ]
    }

    #[test]
    fn three_generation_pedigree() {
        let ped = build(three_generations());
        let pairs = classify_all(&ped, false);
        // One pair per grandparent
        assert_eq!(count(&pairs, Relationship::Grandparent), 2);
        assert_eq!(count(&pairs, Relationship::Avuncular), 1);
        assert_eq!(count(&pairs, Relationship::Cousin), 0);
        assert_eq!(count(&pairs, Relationship::Sib), 1);
        let (_, aunt) = pairs
            .iter()
            .find(|(r, _)| *r == Relationship::Avuncular)
            .unwrap();
        assert_eq!(*aunt, RelativePair::new(3, 5));
    }

    #[test]
    fn excluded_grandparent_is_skipped() {
        let mut ped = build(three_generations());
        ped.exclude(1);
        let pairs = classify_all(&ped, false);
        assert_eq!(count(&pairs, Relationship::Grandparent), 1);
        assert!(pairs.iter().all(|(_, p)| p.first != 1 && p.second != 1));
    }

    #[test]
    fn cousins_half_sibs_and_others() {
        let ped = build(vec![
            founder("F", "gf", Sex::Male),
            founder("F", "gm", Sex::Female),
            child("F", "a", "gf", "gm", Sex::Male),
            child("F", "b", "gf", "gm", Sex::Female),
            founder("F", "sa", Sex::Female),
            founder("F", "sb", Sex::Male),
            child("F", "ca", "a", "sa", Sex::Male),
            child("F", "cb", "sb", "b", Sex::Female),
            founder("F", "sa2", Sex::Female),
            child("F", "ha", "a", "sa2", Sex::Male),
            founder("F", "sc", Sex::Female),
            child("F", "gca", "ca", "sc", Sex::Male),
        ]);
        let pairs = classify_all(&ped, true);
        let label = |x: usize, y: usize| {
            pairs
                .iter()
                .find(|(_, p)| (p.first, p.second) == (x, y) || (p.first, p.second) == (y, x))
                .map(|(r, _)| *r)
        };
        assert_eq!(label(6, 7), Some(Relationship::Cousin));
        assert_eq!(label(6, 9), Some(Relationship::HalfSib));
        assert_eq!(label(7, 9), Some(Relationship::Cousin));
        assert_eq!(label(0, 11), Some(Relationship::Other));
        assert_eq!(label(7, 11), Some(Relationship::Other));
        assert_eq!(label(0, 1), None);
        assert_eq!(label(4, 5), None);

        let without_other = classify_all(&ped, false);
        assert_eq!(count(&without_other, Relationship::Other), 0);
        assert_eq!(pairs.len() - without_other.len(), count(&pairs, Relationship::Other));
    }

    fn random_pedigree(rng: &mut StdRng) -> Pedigree {
        let mut records = Vec::new();
        let mut males = Vec::new();
        let mut females = Vec::new();
        for i in 0..4 {
            let id = format!("f{}", i);
            let sex = if i % 2 == 0 { Sex::Male } else { Sex::Female };
            records.push(founder("R", &id, sex));
            if sex == Sex::Male {
                males.push(id);
            } else {
                females.push(id);
            }
        }
        for i in 0..rng.random_range(6..14) {
            let id = format!("n{}", i);
            let father = males[rng.random_range(0..males.len())].clone();
            let mother = females[rng.random_range(0..females.len())].clone();
            let sex = if rng.random_range(0..2) == 0 {
                Sex::Male
            } else {
                Sex::Female
            };
            records.push(child("R", &id, &father, &mother, sex));
            if sex == Sex::Male {
                males.push(id);
            } else {
                females.push(id);
            }
        }
        build(records)
    }

    #[test]
    fn random_pedigrees_label_each_pair_once_ancestor_first() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let ped = random_pedigree(&mut rng);
            let pairs = classify_all(&ped, true);
            let mut seen = BTreeSet::new();
            for (rel, pair) in &pairs {
                let key = (pair.first.min(pair.second), pair.first.max(pair.second));
                assert!(seen.insert(key), "pair {:?} labelled twice", key);
                match rel {
                    Relationship::Parent => {
                        assert!(is_ordered_parent(&ped, pair.first, pair.second))
                    }
                    Relationship::Grandparent => {
                        assert!(is_ordered_grandparent(&ped, pair.first, pair.second))
                    }
                    Relationship::Avuncular => {
                        assert!(is_ordered_avuncular(&ped, pair.first, pair.second))
                    }
                    _ => assert!(pair.first < pair.second),
                }
                if matches!(rel, Relationship::Parent | Relationship::Grandparent) {
                    assert!(ped[pair.first].traverse < ped[pair.second].traverse);
                }
            }
        }
    }

    #[test]
    fn ancestor_sets_include_self() {
        let ped = build(three_generations());
        let sets = AncestorSets::new(&ped, &ped.families[0]);
        assert_eq!(sets.of(5), &BTreeSet::from([0, 1, 2, 4, 5]));
        assert_eq!(sets.of(0), &BTreeSet::from([0]));
        assert!(!sets.share_ancestor(&ped, 0, 4));
        assert!(sets.share_ancestor(&ped, 3, 5));
    }
}
