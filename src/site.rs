//! Input rows: the header naming samples, and one site per following line.

use thiserror::Error;

use crate::error::{Error as RunError, Result};

pub const CHROM_IDX: usize = 0;
pub const POS_IDX: usize = 1;
pub const REF_IDX: usize = 2;
pub const ALT_IDX: usize = 3;
pub const ALLELE_COUNTS_IDX: usize = 4;
pub const TYPE_IDX: usize = 5;
pub const FIRST_SAMPLE_IDX: usize = 6;

const FIELD_SEPARATOR: char = '\t';

const SNP: &str = "SNP";
const INS: &str = "INS";
const DEL: &str = "DEL";
const MULTI: &str = "MULTIALLELIC";
const DENOVO_SNP: &str = "DENOVO_SNP";
const DENOVO_INS: &str = "DENOVO_INS";
const DENOVO_DEL: &str = "DENOVO_DEL";
const DENOVO_MULTI: &str = "DENOVO_MULTIALLELIC";

pub const ACCEPTED_TYPES: [&str; 8] = [
    SNP,
    INS,
    DEL,
    MULTI,
    DENOVO_SNP,
    DENOVO_INS,
    DENOVO_DEL,
    DENOVO_MULTI,
];

/// Exact, case-sensitive membership in [`ACCEPTED_TYPES`].
#[inline]
pub fn is_accepted(site_type: &str) -> bool {
    ACCEPTED_TYPES.contains(&site_type)
}

/// Why a line went to the error sink instead of producing rows.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("line is not valid UTF-8")]
    NotUtf8,

    #[error("expected {expected} columns, found {found}")]
    ColumnCount { expected: usize, found: usize },

    #[error("unsupported site type {0:?}")]
    UnknownType(String),
}

/// Strips a trailing `\n` or `\r\n`.
#[inline]
pub fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[derive(Debug, Clone)]
pub struct Header {
    sample_names: Vec<String>,
    n_columns: usize,
}

impl Header {
    pub fn parse(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();

        if fields.len() < FIRST_SAMPLE_IDX {
            return Err(RunError::header(format!(
                "expected at least {} site columns, found {}",
                FIRST_SAMPLE_IDX,
                fields.len()
            )));
        }

        if (fields.len() - FIRST_SAMPLE_IDX) % 2 != 0 {
            return Err(RunError::header(format!(
                "sample columns must come in call/confidence pairs, found {}",
                fields.len() - FIRST_SAMPLE_IDX
            )));
        }

        // Confidence columns carry no name
        let sample_names = fields[FIRST_SAMPLE_IDX..]
            .iter()
            .step_by(2)
            .map(|name| name.to_string())
            .collect();

        Ok(Self {
            sample_names,
            n_columns: fields.len(),
        })
    }

    pub fn sample_names(&self) -> &[String] {
        &self.sample_names
    }

    pub fn n_samples(&self) -> usize {
        self.sample_names.len()
    }

    pub fn n_columns(&self) -> usize {
        self.n_columns
    }
}

/// One genotype call, paired with its header name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleCall<'a> {
    pub name: &'a str,
    pub code: &'a str,
    /// `None` when the column is not a number; such a call is never trusted.
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Site<'a> {
    pub chrom: &'a str,
    pub pos: &'a str,
    pub reference: &'a str,
    pub alleles: &'a str,
    pub allele_counts: &'a str,
    pub site_type: &'a str,
    calls: Vec<&'a str>,
}

impl<'a> Site<'a> {
    /// Splits a line already stripped of its line ending. The column count
    /// must match the header's.
    pub fn parse(line: &'a str, header: &Header) -> std::result::Result<Self, Rejection> {
        let fields: Vec<&'a str> = line.split(FIELD_SEPARATOR).collect();

        if fields.len() != header.n_columns() {
            return Err(Rejection::ColumnCount {
                expected: header.n_columns(),
                found: fields.len(),
            });
        }

        Ok(Self {
            chrom: fields[CHROM_IDX],
            pos: fields[POS_IDX],
            reference: fields[REF_IDX],
            alleles: fields[ALT_IDX],
            allele_counts: fields[ALLELE_COUNTS_IDX],
            site_type: fields[TYPE_IDX],
            calls: fields[FIRST_SAMPLE_IDX..].to_vec(),
        })
    }

    pub fn n_samples(&self) -> usize {
        self.calls.len() / 2
    }

    /// Calls in sample-column order.
    pub fn sample_calls<'h>(
        &'h self,
        sample_names: &'h [String],
    ) -> impl Iterator<Item = SampleCall<'h>> + 'h {
        self.calls
            .chunks_exact(2)
            .zip(sample_names)
            .map(|(pair, name)| SampleCall {
                name: name.as_str(),
                code: pair[0].trim(),
                confidence: pair[1].trim().parse::<f64>().ok(),
            })
    }
}
