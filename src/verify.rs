//! Full-file integrity scan.
//!
//! Binary search silently returns wrong answers on an unsorted file and
//! only notices malformed records it happens to visit. `verify` reads
//! every record once so operators can check a dataset before use.

use serde::Serialize;

use crate::record::Records;
use crate::Result;

/// Maximum number of offending indices kept per category.
pub const MAX_REPORTED: usize = 32;

/// Outcome of a full scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    /// Records scanned
    pub records: usize,
    /// Total malformed records
    pub malformed_count: usize,
    /// First malformed indices
    pub malformed: Vec<usize>,
    /// Total records whose hash is not greater than the previous decodable one
    pub unsorted_count: usize,
    /// First such indices
    pub unsorted: Vec<usize>,
    /// Records repeating the previous hash (counted in `unsorted_count`)
    pub duplicates: usize,
}

impl VerifyReport {
    /// Whether the file is fully searchable.
    pub fn is_ok(&self) -> bool {
        self.malformed_count == 0 && self.unsorted_count == 0
    }
}

/// Scan every record in `store`.
///
/// Malformed records are tallied and excluded from the ordering check.
/// Read errors abort the scan.
pub fn verify<S: Records + ?Sized>(store: &S) -> Result<VerifyReport> {
    let mut report = VerifyReport {
        records: store.len(),
        ..VerifyReport::default()
    };
    let mut previous: Option<String> = None;

    for index in 0..store.len() {
        let record = match store.record_at(index) {
            Ok(record) => record,
            Err(e) if e.is_record_format() => {
                log::warn!("{}", e);
                report.malformed_count += 1;
                if report.malformed.len() < MAX_REPORTED {
                    report.malformed.push(index);
                }
                continue;
            }
            Err(e) => return Err(e),
        };

        if let Some(prev) = &previous {
            if record.hash <= *prev {
                if record.hash == *prev {
                    report.duplicates += 1;
                }
                report.unsorted_count += 1;
                if report.unsorted.len() < MAX_REPORTED {
                    report.unsorted.push(index);
                }
            }
        }
        previous = Some(record.hash);
    }

    log::info!(
        "Verified {} records: {} malformed, {} out of order",
        report.records,
        report.malformed_count,
        report.unsorted_count
    );
    Ok(report)
}
