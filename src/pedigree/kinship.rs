use super::pedigree::{Family, Pedigree};

/// Kinship coefficients between all members of one family.
#[derive(Debug, Clone)]
pub struct Kinship {
    first: usize,
    size: usize,
    matrix: Vec<f64>,
}

impl Kinship {
    pub fn new(ped: &Pedigree, family: &Family) -> Self {
        let size = family.count();
        let mut order: Vec<usize> = family.members().collect();
        order.sort_by_key(|&i| ped[i].traverse);

        let mut kinship = Kinship {
            first: family.first,
            size,
            matrix: vec![0.0; size * size],
        };
        let local = |i: usize| i - family.first;
        for (pos, &person) in order.iter().enumerate() {
            let i = local(person);
            match ped[person].parents() {
                None => kinship.set(i, i, 0.5),
                Some((father, mother)) => {
                    let (f, m) = (local(father), local(mother));
                    for &earlier in &order[..pos] {
                        let j = local(earlier);
                        let phi = 0.5 * (kinship.get(f, j) + kinship.get(m, j));
                        kinship.set(i, j, phi);
                        kinship.set(j, i, phi);
                    }
                    kinship.set(i, i, 0.5 * (1.0 + kinship.get(f, m)));
                }
            }
        }
        kinship
    }

    fn get(&self, i: usize, j: usize) -> f64 {
        self.matrix[i * self.size + j]
    }

    fn set(&mut self, i: usize, j: usize, value: f64) {
        self.matrix[i * self.size + j] = value;
    }

    /// Coefficient between two members, addressed by pedigree index.
    pub fn coefficient(&self, a: usize, b: usize) -> f64 {
        self.get(a - self.first, b - self.first)
    }
}
