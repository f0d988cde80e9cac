//! Turns one site into its per-allele rows.

use crate::alleles::AltAlleleCache;
use crate::classify::{classify, Classification};
use crate::config::Config;
use crate::error::Result;
use crate::site::{is_accepted, trim_line_end, Header, Rejection, Site};

/// Output columns, in order.
pub const OUTPUT_HEADER: [&str; 8] = [
    "Fragment",
    "Position",
    "Reference",
    "Alt",
    "Type",
    "Heterozygotes",
    "Homozygotes",
    "Missing",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    pub chrom: String,
    pub pos: String,
    pub reference: String,
    pub alt: String,
    pub site_type: String,
    pub heterozygotes: String,
    pub homozygotes: String,
    pub missing: String,
}

impl OutputRow {
    /// Appends the row, tab separated and newline terminated.
    pub fn write_tsv(&self, buffer: &mut Vec<u8>) {
        let fields = [
            &self.chrom,
            &self.pos,
            &self.reference,
            &self.alt,
            &self.site_type,
            &self.heterozygotes,
            &self.homozygotes,
            &self.missing,
        ];

        for (idx, field) in fields.iter().enumerate() {
            if idx > 0 {
                buffer.push(b'\t');
            }
            buffer.extend_from_slice(field.as_bytes());
        }

        buffer.push(b'\n');
    }
}

/// Writes the column names in the same layout as [`OutputRow::write_tsv`].
pub fn write_output_header(buffer: &mut Vec<u8>) {
    buffer.extend_from_slice(OUTPUT_HEADER.join("\t").as_bytes());
    buffer.push(b'\n');
}

fn write_samples(
    sample_names: &[String],
    samples: &[usize],
    empty_field: &str,
    delimiter: &str,
) -> String {
    if samples.is_empty() {
        return empty_field.to_string();
    }

    let mut buffer = String::new();
    for (idx, sample_idx) in samples.iter().enumerate() {
        if idx > 0 {
            buffer.push_str(delimiter);
        }
        buffer.push_str(&sample_names[*sample_idx]);
    }

    buffer
}

/// Builds one row per alternate allele, in `alts` order.
///
/// Samples are visited in column order, so names inside every list keep the
/// input order.
pub fn process_site(
    site: &Site,
    sample_names: &[String],
    alts: &[String],
    config: &Config,
) -> Vec<OutputRow> {
    if alts.is_empty() {
        return Vec::new();
    }

    let mut hets: Vec<Vec<usize>> = vec![Vec::new(); alts.len()];
    let mut homs: Vec<Vec<usize>> = vec![Vec::new(); alts.len()];

    // Even in the multiallelic case, missing in one means missing in all
    let mut missing: Vec<usize> = Vec::new();

    for (sample_idx, call) in site.sample_calls(sample_names).enumerate() {
        match classify(
            call.code,
            call.confidence,
            config.min_confidence,
            site.reference,
            alts,
        ) {
            Classification::Excluded => {}
            Classification::Missing => missing.push(sample_idx),
            Classification::Homozygous(idx) => homs[idx].push(sample_idx),
            Classification::Heterozygous(idx) => hets[idx].push(sample_idx),
            Classification::CompoundHeterozygous(first, second) => {
                hets[first].push(sample_idx);
                hets[second].push(sample_idx);
            }
        }
    }

    let missing = write_samples(
        sample_names,
        &missing,
        &config.empty_field,
        &config.field_delimiter,
    );

    let mut rows = Vec::with_capacity(alts.len());
    for (idx, alt) in alts.iter().enumerate() {
        if config.drop_uncarried && hets[idx].is_empty() && homs[idx].is_empty() {
            continue;
        }

        rows.push(OutputRow {
            chrom: site.chrom.to_string(),
            pos: site.pos.to_string(),
            reference: site.reference.to_string(),
            alt: alt.clone(),
            site_type: site.site_type.to_string(),
            heterozygotes: write_samples(
                sample_names,
                &hets[idx],
                &config.empty_field,
                &config.field_delimiter,
            ),
            homozygotes: write_samples(
                sample_names,
                &homs[idx],
                &config.empty_field,
                &config.field_delimiter,
            ),
            missing: missing.clone(),
        });
    }

    rows
}

/// The result of one input line. Rows of a line always travel together.
#[derive(Debug)]
pub enum LineResult {
    Rows(Vec<OutputRow>),
    /// The raw line, unmodified, and why it was refused.
    Rejected(Vec<u8>, Rejection),
}

/// Everything a worker needs to process lines; shared by reference.
pub struct LineProcessor {
    header: Header,
    config: Config,
    cache: AltAlleleCache,
}

impl LineProcessor {
    pub fn new(header: Header, config: Config) -> Self {
        Self {
            header,
            config,
            cache: AltAlleleCache::new(),
        }
    }

    pub fn cache(&self) -> &AltAlleleCache {
        &self.cache
    }

    /// Errors only when the shared allele cache is no longer usable.
    pub fn process_line(&self, raw: Vec<u8>) -> Result<LineResult> {
        match self.rows_for(&raw)? {
            Ok(rows) => Ok(LineResult::Rows(rows)),
            Err(rejection) => {
                debug!("Rejected line: {}", rejection);
                Ok(LineResult::Rejected(raw, rejection))
            }
        }
    }

    fn rows_for(&self, raw: &[u8]) -> Result<std::result::Result<Vec<OutputRow>, Rejection>> {
        let line = match std::str::from_utf8(trim_line_end(raw)) {
            Ok(line) => line,
            Err(_) => return Ok(Err(Rejection::NotUtf8)),
        };

        let site = match Site::parse(line, &self.header) {
            Ok(site) => site,
            Err(rejection) => return Ok(Err(rejection)),
        };

        if !is_accepted(site.site_type) {
            return Ok(Err(Rejection::UnknownType(site.site_type.to_string())));
        }

        let alts = self.cache.get_or_resolve(site.reference, site.alleles)?;

        Ok(Ok(process_site(
            &site,
            self.header.sample_names(),
            &alts,
            &self.config,
        )))
    }
}
