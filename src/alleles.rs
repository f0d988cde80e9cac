//! Alternate allele resolution, memoized across sites.

use std::hash::BuildHasher;
use std::sync::{Arc, RwLock};

use hashbrown::hash_map::DefaultHashBuilder;
use hashbrown::HashMap;
use memchr::memchr;

use crate::error::{Error, Result};

const ALLELE_SEPARATOR: char = ',';
const DEFAULT_SHARDS: usize = 16;

pub type AltAlleles = Arc<[String]>;

/// Ordered, deduplicated alleles of `raw` that differ from `reference`,
/// in order of first appearance. Empty tokens (`T,,C`, a trailing comma)
/// name no allele and are skipped.
pub fn resolve(reference: &str, raw: &str) -> Vec<String> {
    if memchr(ALLELE_SEPARATOR as u8, raw.as_bytes()).is_none() {
        if raw == reference || raw.is_empty() {
            return Vec::new();
        }

        return vec![raw.to_string()];
    }

    let mut alts: Vec<String> = Vec::new();

    for allele in raw.split(ALLELE_SEPARATOR) {
        if allele.is_empty() || allele == reference || alts.iter().any(|a| a == allele) {
            continue;
        }

        alts.push(allele.to_string());
    }

    alts
}

type Shard = HashMap<String, HashMap<String, AltAlleles>>;

/// Concurrent memo of [`resolve`], keyed by reference then raw allele list.
///
/// Sharded by reference so that line workers resolving different references
/// rarely touch the same lock. Two workers missing on the same key both
/// compute and both insert; the results are identical so the last write
/// stands.
pub struct AltAlleleCache {
    shards: Box<[RwLock<Shard>]>,
    hasher: DefaultHashBuilder,
}

impl Default for AltAlleleCache {
    fn default() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }
}

impl AltAlleleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shards(n_shards: usize) -> Self {
        let shards = (0..n_shards.max(1))
            .map(|_| RwLock::new(Shard::new()))
            .collect();

        Self {
            shards,
            hasher: DefaultHashBuilder::default(),
        }
    }

    #[inline]
    fn shard(&self, reference: &str) -> &RwLock<Shard> {
        let idx = self.hasher.hash_one(reference) as usize % self.shards.len();
        &self.shards[idx]
    }

    pub fn get_or_resolve(&self, reference: &str, raw: &str) -> Result<AltAlleles> {
        let shard = self.shard(reference);

        {
            let cached = shard.read().map_err(|_| poisoned())?;
            if let Some(alts) = cached.get(reference).and_then(|by_raw| by_raw.get(raw)) {
                return Ok(Arc::clone(alts));
            }
        }

        let alts: AltAlleles = resolve(reference, raw).into();

        shard
            .write()
            .map_err(|_| poisoned())?
            .entry(reference.to_string())
            .or_default()
            .insert(raw.to_string(), Arc::clone(&alts));

        Ok(alts)
    }

    /// Number of distinct (reference, raw allele list) patterns seen.
    pub fn len(&self) -> Result<usize> {
        let mut total = 0;
        for shard in self.shards.iter() {
            let shard = shard.read().map_err(|_| poisoned())?;
            total += shard.values().map(|by_raw| by_raw.len()).sum::<usize>();
        }

        Ok(total)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Leaves every shard poisoned, as a worker panicking mid-insert would.
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        std::thread::scope(|s| {
            for shard in self.shards.iter() {
                let _ = s
                    .spawn(move || {
                        let _guard = shard.write();
                        panic!("worker died holding the allele cache");
                    })
                    .join();
            }
        });
    }
}

fn poisoned() -> Error {
    Error::coordination("allele cache lock poisoned by a panicked worker")
}
