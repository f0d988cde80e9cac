use crate::error::{Error, Result};

pub const DEFAULT_EMPTY_FIELD: &str = "!";
pub const DEFAULT_FIELD_DELIMITER: &str = ";";
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.95;

/// Settings for one conversion run.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Written in place of an empty sample list.
    pub empty_field: String,
    /// Joins sample names within one list.
    pub field_delimiter: String,
    /// Calls below this confidence are treated as missing.
    pub min_confidence: f64,
    pub threads: usize,
    /// Write the output column names before the first row.
    pub write_header: bool,
    /// Skip allele rows that no sample is heterozygous or homozygous for.
    pub drop_uncarried: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            empty_field: DEFAULT_EMPTY_FIELD.to_string(),
            field_delimiter: DEFAULT_FIELD_DELIMITER.to_string(),
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            threads: num_cpus::get(),
            write_header: false,
            drop_uncarried: false,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.empty_field.is_empty() {
            return Err(Error::config("empty field placeholder must not be empty"));
        }

        if self.field_delimiter.is_empty() {
            return Err(Error::config("field delimiter must not be empty"));
        }

        let breaks_row = |token: &str| token.contains(['\t', '\n']);
        if breaks_row(&self.empty_field) || breaks_row(&self.field_delimiter) {
            return Err(Error::config(
                "placeholder and delimiter may not contain tabs or newlines",
            ));
        }

        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(Error::config(format!(
                "minimum confidence must be within [0, 1], got {}",
                self.min_confidence
            )));
        }

        if self.threads == 0 {
            return Err(Error::config("at least one worker thread is required"));
        }

        Ok(())
    }
}
