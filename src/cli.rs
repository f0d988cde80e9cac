use std::path::PathBuf;

use clap::Parser;

use crate::config::{Config, DEFAULT_EMPTY_FIELD, DEFAULT_FIELD_DELIMITER, DEFAULT_MIN_CONFIDENCE};

#[derive(Parser, Debug)]
#[command(
    name = "allele-split",
    version,
    about = "Split a genotype matrix into one row per alternate allele",
    long_about = "Reads a tab-separated genotype matrix (site columns followed by call/confidence \
                  pairs per sample) and writes, for every alternate allele, the samples that are \
                  heterozygous, homozygous or missing for it."
)]
pub struct Cli {
    /// Input genotype matrix; stdin when omitted
    #[arg(long = "inPath")]
    pub in_path: Option<PathBuf>,

    /// Output allele table; stdout when omitted
    #[arg(long = "outPath")]
    pub out_path: Option<PathBuf>,

    /// Where rejected lines are written; discarded when omitted
    #[arg(long = "errPath")]
    pub err_path: Option<PathBuf>,

    /// Placeholder written for an empty sample list
    #[arg(long = "emptyField", default_value = DEFAULT_EMPTY_FIELD)]
    pub empty_field: String,

    /// Separator between sample names in one list
    #[arg(long = "fieldDelimiter", default_value = DEFAULT_FIELD_DELIMITER)]
    pub field_delimiter: String,

    /// Calls below this confidence are reported as missing
    #[arg(long = "minConfidence", default_value_t = DEFAULT_MIN_CONFIDENCE)]
    pub min_confidence: f64,

    /// Worker threads; defaults to the number of CPUs
    #[arg(long)]
    pub threads: Option<usize>,

    /// Write the column names as the first output line
    #[arg(long)]
    pub header: bool,

    /// Omit allele rows that no sample carries
    #[arg(long = "dropUncarried")]
    pub drop_uncarried: bool,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn config(&self) -> Config {
        Config {
            empty_field: self.empty_field.clone(),
            field_delimiter: self.field_delimiter.clone(),
            min_confidence: self.min_confidence,
            threads: self.threads.unwrap_or_else(num_cpus::get),
            write_header: self.header,
            drop_uncarried: self.drop_uncarried,
        }
    }

    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        }
    }
}
