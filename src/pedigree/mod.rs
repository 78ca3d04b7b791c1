mod kinship;
mod loader;
#[allow(clippy::module_inception)]
mod pedigree;
mod person;

pub use kinship::Kinship;
pub use loader::{load_pedigree, DEFAULT_MISSING_CODE};
pub use pedigree::{DataLayout, Family, MarkerInfo, Pedigree, PedigreeFilter, PersonRecord};
pub use person::{Affection, Genotype, Person, Sex};
