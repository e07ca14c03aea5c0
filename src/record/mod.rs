//! Fixed-width record file access.
//!
//! The file is a flat sequence of `N` records of `W` bytes each, sorted
//! ascending by hash:
//!
//! ```text
//! +------------------+
//! |    RECORD 0      |  W bytes: "<HASH>:<count>" + padding
//! +------------------+
//! |    RECORD 1      |
//! +------------------+
//! |      ...         |
//! +------------------+
//! |    RECORD N-1    |
//! +------------------+
//! ```

mod format;
mod store;
pub mod writer;

pub use format::*;
pub use store::{RecordStore, Records};
pub use writer::RecordWriter;
