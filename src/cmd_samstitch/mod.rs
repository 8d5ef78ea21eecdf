//! Subcommand modules for the `samstitch` binary.

pub mod chain;
pub mod check;
pub mod splice;
pub mod to_cigar;
