//! pwdb - Breach lookups against sorted fixed-width password hash dumps.
//!
//! This crate answers "has this password appeared in a breach, and how
//! often?" against the ordered-by-hash SHA-1 dumps, without loading the
//! file into memory.
//!
//! # Features
//!
//! - **Fixed-width records**: `<40 hex chars hash>:<count>` padded to 63 bytes
//! - **O(log n) lookups**: binary search with positioned reads, no index
//! - **Memory-mapped backend**: optional, via `memmap2`
//! - **Thread-safe**: a [`RecordStore`] can be searched from many threads
//! - **Explicit integrity errors**: malformed records are never reported as
//!   "not found"
//!
//! # Quick Start
//!
//! ```ignore
//! use pwdb::RecordStore;
//! use std::path::Path;
//!
//! let store = RecordStore::open(Path::new("pwned-passwords-sha1-ordered-by-hash.txt"))?;
//!
//! match store.search("password")? {
//!     Some(record) => println!("FOUND ({})", record.count),
//!     None => println!("not found"),
//! }
//! ```
//!
//! # Malformed Records
//!
//! A record that fails to decode makes the outcome of a query
//! indeterminate. With [`MalformedPolicy::Abort`] (the default) the query
//! returns [`Error::RecordFormat`]; with [`MalformedPolicy::Skip`] such
//! records are treated as absent and the search continues around them.

mod config;
mod digest;
mod error;

pub mod lookup;
pub mod record;
pub mod verify;

// Re-export core types
pub use config::{Backend, MalformedPolicy, StoreConfig};
pub use digest::{digest, Digest, DIGEST_HEX_LEN};
pub use error::{Error, Result};

// Re-export record types
pub use record::{Record, RecordStore, RecordWriter, Records, DEFAULT_RECORD_WIDTH};

// Re-export search functions
pub use lookup::{lower_bound, search, search_digest, search_many, search_with_policy};
pub use verify::{verify, VerifyReport};
