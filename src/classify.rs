use crate::genotype::{decode, Allele, Genotype};

/// What one sample's call means for the alleles of one site.
///
/// Allele indices point into the site's ordered alternate alleles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Homozygous reference: listed nowhere.
    Excluded,
    /// Untrusted or incompatible call: listed as missing on every allele row.
    Missing,
    Homozygous(usize),
    /// Reference plus one alternate allele.
    Heterozygous(usize),
    /// Two alternate alleles; listed as heterozygous on both rows.
    CompoundHeterozygous(usize, usize),
}

/// Classifies a call against a site. A confidence equal to `min_confidence`
/// passes; `None` never does.
pub fn classify(
    code: &str,
    confidence: Option<f64>,
    min_confidence: f64,
    reference: &str,
    alts: &[String],
) -> Classification {
    match confidence {
        Some(confidence) if confidence >= min_confidence => {}
        _ => return Classification::Missing,
    }

    let genotype = match decode(code) {
        Some(genotype) => genotype,
        None => return Classification::Missing,
    };

    match genotype {
        Genotype::Homozygous(slot) => match slot.resolve(reference, alts) {
            Some(Allele::Reference) => Classification::Excluded,
            Some(Allele::Alt(idx)) => Classification::Homozygous(idx),
            None => Classification::Missing,
        },
        Genotype::Heterozygous(first, second) => {
            match (first.resolve(reference, alts), second.resolve(reference, alts)) {
                (Some(first), Some(second)) => pair(first, second),
                _ => Classification::Missing,
            }
        }
    }
}

fn pair(first: Allele, second: Allele) -> Classification {
    match (first, second) {
        (Allele::Reference, Allele::Reference) => Classification::Excluded,
        (Allele::Reference, Allele::Alt(idx)) | (Allele::Alt(idx), Allele::Reference) => {
            Classification::Heterozygous(idx)
        }
        (Allele::Alt(a), Allele::Alt(b)) if a == b => Classification::Homozygous(a),
        (Allele::Alt(a), Allele::Alt(b)) => Classification::CompoundHeterozygous(a, b),
    }
}
