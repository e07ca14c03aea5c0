//! Record file writer.
//!
//! Produces well-formed, sorted record files, mainly for fixtures and
//! benchmarks. Entries are sorted by hash on `build`; no index is built.

use std::fs;
use std::path::Path;

use super::format::{encode_record, DEFAULT_RECORD_WIDTH};
use crate::digest::Digest;
use crate::{Error, Result};

/// Collects `(hash, count)` pairs and emits them as fixed-width records.
#[derive(Debug, Clone)]
pub struct RecordWriter {
    width: usize,
    entries: Vec<(String, u64)>,
}

impl RecordWriter {
    /// Create a writer for the default record width.
    pub fn new() -> Self {
        Self::with_record_width(DEFAULT_RECORD_WIDTH)
    }

    /// Create a writer for a custom record width.
    pub fn with_record_width(width: usize) -> Self {
        Self {
            width,
            entries: Vec::new(),
        }
    }

    /// Add an entry by its hex hash. Lowercase hex is accepted and uppercased.
    pub fn add_hash(&mut self, hash: &str, count: u64) -> &mut Self {
        self.entries.push((hash.to_ascii_uppercase(), count));
        self
    }

    /// Add an entry for a cleartext, hashing it first.
    pub fn add_cleartext(&mut self, cleartext: &str, count: u64) -> &mut Self {
        self.entries
            .push((Digest::of(cleartext).as_str().to_string(), count));
        self
    }

    /// Number of entries added so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sort the entries and encode them.
    ///
    /// Fails with [`Error::DuplicateHash`] if a hash was added twice, since
    /// lookups and `verify` expect strictly ascending hashes.
    pub fn build(&mut self) -> Result<Vec<u8>> {
        self.entries.sort();

        if let Some(pair) = self.entries.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(Error::DuplicateHash(pair[0].0.clone()));
        }

        let mut data = Vec::with_capacity(self.entries.len() * self.width);
        for (hash, count) in &self.entries {
            let record = encode_record(hash, *count, self.width).ok_or_else(|| Error::Encode {
                hash: hash.clone(),
                count: *count,
                width: self.width,
            })?;
            data.extend_from_slice(&record);
        }

        Ok(data)
    }

    /// Sort, encode and write the entries to `path`.
    pub fn write_to(&mut self, path: &Path) -> Result<()> {
        let data = self.build()?;
        fs::write(path, &data)?;
        log::debug!("Wrote {} records to {:?}", self.entries.len(), path);
        Ok(())
    }
}

impl Default for RecordWriter {
    fn default() -> Self {
        Self::new()
    }
}
