use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};

use allele_split::cli::Cli;
use anyhow::{Context, Result};
use clap::Parser;

#[macro_use]
extern crate log;

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .init();

    let config = cli.config();
    info!(
        "Splitting alleles with {} threads, minimum confidence {}",
        config.threads, config.min_confidence
    );

    let mut out: Box<dyn Write> = match &cli.out_path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut err: Box<dyn Write> = match &cli.err_path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(io::sink()),
    };

    let summary = match &cli.in_path {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            allele_split::run(BufReader::new(file), &mut out, &mut err, &config)?
        }
        // StdinLock is not Send, so the reader thread gets Stdin itself.
        // Stdin has no BufRead impl; the BufReader supplies read_until.
        None => {
            let stdin = BufReader::new(io::stdin());
            allele_split::run(stdin, &mut out, &mut err, &config)?
        }
    };

    if summary.rejected > 0 && cli.err_path.is_none() {
        warn!(
            "Discarded {} rejected lines; pass --errPath to keep them",
            summary.rejected
        );
    }

    Ok(())
}
