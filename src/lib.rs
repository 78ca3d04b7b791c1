pub mod cli;
pub mod commands;
pub mod hwe;
pub mod pairs;
pub mod pedigree;
pub mod utils;
