//! Ambiguity-coded genotype calls.
//!
//! A call is a single byte naming one allele slot (homozygous) or two distinct
//! slots (heterozygous). Slots are abstract: a nucleotide, the reference, an
//! insertion or a deletion. They only become concrete alleles once resolved
//! against a site's reference and alternate alleles.

const A: u8 = b'A';
const C: u8 = b'C';
const G: u8 = b'G';
const T: u8 = b'T';

const INSERTION_PREFIX: u8 = b'+';
const DELETION_PREFIX: u8 = b'-';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Base(u8),
    Reference,
    Insertion,
    Deletion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Genotype {
    Homozygous(Slot),
    Heterozygous(Slot, Slot),
}

/// A slot pinned to one allele of a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Allele {
    Reference,
    /// Index into the site's ordered alternate alleles.
    Alt(usize),
}

static GENOTYPES: [Option<Genotype>; 256] = {
    use Genotype::{Heterozygous, Homozygous};
    use Slot::{Base, Deletion, Insertion, Reference};

    let mut all: [Option<Genotype>; 256] = [None; 256];

    all[A as usize] = Some(Homozygous(Base(A)));
    all[C as usize] = Some(Homozygous(Base(C)));
    all[G as usize] = Some(Homozygous(Base(G)));
    all[T as usize] = Some(Homozygous(Base(T)));

    all[b'R' as usize] = Some(Heterozygous(Base(A), Base(G)));
    all[b'Y' as usize] = Some(Heterozygous(Base(C), Base(T)));
    all[b'S' as usize] = Some(Heterozygous(Base(G), Base(C)));
    all[b'W' as usize] = Some(Heterozygous(Base(A), Base(T)));
    all[b'K' as usize] = Some(Heterozygous(Base(G), Base(T)));
    all[b'M' as usize] = Some(Heterozygous(Base(A), Base(C)));

    all[b'D' as usize] = Some(Homozygous(Deletion));
    all[b'E' as usize] = Some(Heterozygous(Reference, Deletion));
    all[b'I' as usize] = Some(Homozygous(Insertion));
    all[b'H' as usize] = Some(Heterozygous(Reference, Insertion));

    all
};

/// Looks up a call code. Anything but a single known byte is `None`.
#[inline]
pub fn decode(code: &str) -> Option<Genotype> {
    match code.as_bytes() {
        [byt] => GENOTYPES[*byt as usize],
        _ => None,
    }
}

impl Slot {
    /// Pins the slot to the reference or to one of `alts`. `None` when the site
    /// carries no allele this slot could denote.
    pub fn resolve(self, reference: &str, alts: &[String]) -> Option<Allele> {
        match self {
            Slot::Reference => Some(Allele::Reference),
            Slot::Base(base) => {
                if reference.as_bytes() == [base] {
                    return Some(Allele::Reference);
                }

                alts.iter()
                    .position(|alt| alt.as_bytes() == [base])
                    .map(Allele::Alt)
            }
            Slot::Insertion => first_with_prefix(alts, INSERTION_PREFIX),
            Slot::Deletion => first_with_prefix(alts, DELETION_PREFIX),
        }
    }
}

fn first_with_prefix(alts: &[String], prefix: u8) -> Option<Allele> {
    alts.iter()
        .position(|alt| alt.as_bytes().first() == Some(&prefix))
        .map(Allele::Alt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alts(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn decodes_homozygous_bases() {
        for base in ["A", "C", "G", "T"] {
            let byt = base.as_bytes()[0];
            assert_eq!(decode(base), Some(Genotype::Homozygous(Slot::Base(byt))));
        }
    }

    #[test]
    fn heterozygous_codes_name_two_distinct_slots() {
        for code in ["R", "Y", "S", "W", "K", "M", "E", "H"] {
            match decode(code) {
                Some(Genotype::Heterozygous(a, b)) => assert_ne!(a, b, "code {}", code),
                other => panic!("{} decoded to {:?}", code, other),
            }
        }
    }

    #[test]
    fn unknown_codes_are_invalid() {
        assert_eq!(decode("N"), None);
        assert_eq!(decode("X"), None);
        assert_eq!(decode("a"), None);
        assert_eq!(decode(""), None);
        assert_eq!(decode("AA"), None);
    }

    #[test]
    fn base_slot_prefers_reference() {
        let alts = alts(&["T"]);
        assert_eq!(Slot::Base(C).resolve("C", &alts), Some(Allele::Reference));
        assert_eq!(Slot::Base(T).resolve("C", &alts), Some(Allele::Alt(0)));
        assert_eq!(Slot::Base(G).resolve("C", &alts), None);
    }

    #[test]
    fn indel_slots_match_marker_prefix() {
        let alts = alts(&["T", "+AATC", "-9"]);
        assert_eq!(Slot::Insertion.resolve("C", &alts), Some(Allele::Alt(1)));
        assert_eq!(Slot::Deletion.resolve("C", &alts), Some(Allele::Alt(2)));
        assert_eq!(Slot::Deletion.resolve("C", &alts[..2]), None);
        assert_eq!(Slot::Reference.resolve("C", &[]), Some(Allele::Reference));
    }
}
