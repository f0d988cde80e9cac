//! Splits a wide genotype matrix into a long per-allele table.
//!
//! Each input line is a site followed by one (call, confidence) pair per
//! sample. Calls are single-byte ambiguity codes. For every alternate allele
//! of a site one row is written naming the samples heterozygous, homozygous
//! and missing for that allele.

#[macro_use]
extern crate log;

pub mod alleles;
pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod genotype;
pub mod pipeline;
pub mod process;
pub mod site;

pub use alleles::{resolve, AltAlleleCache};
pub use classify::{classify, Classification};
pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::{run, Completion, RunSummary};
pub use process::{process_site, LineProcessor, LineResult, OutputRow, OUTPUT_HEADER};
pub use site::{is_accepted, Header, Rejection, SampleCall, Site};
