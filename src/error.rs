//! Error types for pwdb.

use std::path::PathBuf;

use thiserror::Error;

use crate::record::DecodeError;

/// Error type for pwdb operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The store file could not be opened or its size determined
    #[error("cannot open password file {path:?}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File size is not a whole number of records
    #[error(
        "unexpected password file format: size {size} is not a multiple of {width} \
         (records must look like '<40 hex chars hash>:<count>' padded with ' ' or '\\r' \
         to exactly {width} bytes)"
    )]
    Format { size: u64, width: usize },

    /// A single on-disk record failed to decode
    #[error("cannot parse record #{index}: {reason}")]
    RecordFormat {
        index: usize,
        #[source]
        reason: DecodeError,
    },

    /// Record index past the end of the store
    #[error("record index {index} out of range (store holds {len} records)")]
    IndexOutOfRange { index: usize, len: usize },

    /// Record width too small to hold a hash, separator and one digit
    #[error("invalid record width {0}: must be at least 42")]
    InvalidRecordWidth(usize),

    /// A record could not be encoded at the configured width
    #[error("cannot encode record {hash}:{count} in {width} bytes")]
    Encode {
        hash: String,
        count: u64,
        width: usize,
    },

    /// The same hash was added to a writer more than once
    #[error("duplicate hash {0}: each hash may appear in only one record")]
    DuplicateHash(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error is local to one record rather than the whole store.
    pub fn is_record_format(&self) -> bool {
        matches!(self, Error::RecordFormat { .. })
    }
}

/// Result type alias for pwdb operations.
pub type Result<T> = std::result::Result<T, Error>;
