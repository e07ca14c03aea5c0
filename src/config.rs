//! Store configuration types.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::record::{DEFAULT_RECORD_WIDTH, MIN_RECORD_WIDTH};
use crate::{Error, Result};

/// How record bytes are fetched from the backing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Positioned reads (`pread`) against the open file handle
    #[default]
    Positioned,
    /// Read-only memory map of the whole file
    Mmap,
}

impl Backend {
    /// Get the internal name of this backend.
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Positioned => "positioned",
            Backend::Mmap => "mmap",
        }
    }
}

/// What a search does when it reads a record that does not decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    /// Stop this query and report the record as an error
    #[default]
    Abort,
    /// Treat malformed records as absent and keep searching
    Skip,
}

impl MalformedPolicy {
    /// Get the internal name of this policy.
    pub fn name(&self) -> &'static str {
        match self {
            MalformedPolicy::Abort => "abort",
            MalformedPolicy::Skip => "skip",
        }
    }
}

/// Configuration for a RecordStore and the searches run against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Size of one on-disk record in bytes
    pub record_width: usize,
    /// How records are read
    pub backend: Backend,
    /// Reaction to undecodable records during a search
    pub on_malformed: MalformedPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            record_width: DEFAULT_RECORD_WIDTH,
            backend: Backend::default(),
            on_malformed: MalformedPolicy::default(),
        }
    }
}

impl StoreConfig {
    /// Create a configuration with a custom record width.
    pub fn with_record_width(record_width: usize) -> Self {
        Self {
            record_width,
            ..Self::default()
        }
    }

    /// Use the given backend.
    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Use the given malformed-record policy.
    pub fn on_malformed(mut self, policy: MalformedPolicy) -> Self {
        self.on_malformed = policy;
        self
    }

    /// Check that the configuration describes a usable record layout.
    pub fn validate(&self) -> Result<()> {
        if self.record_width < MIN_RECORD_WIDTH {
            return Err(Error::InvalidRecordWidth(self.record_width));
        }
        Ok(())
    }

    /// Parse a configuration from YAML. Missing keys take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: StoreConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {:?}: {}", path, e)))?;
        Self::from_yaml_str(&content)
    }
}
