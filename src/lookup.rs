//! Binary search over a sorted record store.
//!
//! A query is digested once and then located with a lower-bound search:
//! the smallest index `i` in `[0, N]` whose record hash is `>= key`.
//! `i == N` means every stored hash is smaller than the key and is never
//! dereferenced. The query matches only if the record at `i` carries
//! exactly the key.

use crate::config::MalformedPolicy;
use crate::digest::Digest;
use crate::record::{Record, Records};
use crate::Result;

/// Search for `cleartext`, aborting the query on a malformed record.
pub fn search<S: Records + ?Sized>(store: &S, cleartext: &str) -> Result<Option<Record>> {
    search_digest(store, &Digest::of(cleartext))
}

/// Search for a precomputed digest, aborting the query on a malformed record.
pub fn search_digest<S: Records + ?Sized>(store: &S, key: &Digest) -> Result<Option<Record>> {
    search_with_policy(store, key, MalformedPolicy::Abort)
}

/// Search for a precomputed digest.
///
/// Returns `Ok(None)` when no record carries the key. An `Err` means the
/// outcome is indeterminate: under [`MalformedPolicy::Abort`] a visited
/// record failed to decode; read errors are reported under either policy.
pub fn search_with_policy<S: Records + ?Sized>(
    store: &S,
    key: &Digest,
    policy: MalformedPolicy,
) -> Result<Option<Record>> {
    let found = locate(store, key.as_str(), policy)?;
    Ok(found.candidate.filter(|record| record.hash == key.as_str()))
}

/// Search several cleartexts independently. Results keep the input order.
pub fn search_many<S, T>(
    store: &S,
    cleartexts: &[T],
    policy: MalformedPolicy,
) -> Vec<Result<Option<Record>>>
where
    S: Records + ?Sized,
    T: AsRef<str>,
{
    cleartexts
        .iter()
        .map(|cleartext| search_with_policy(store, &Digest::of(cleartext.as_ref()), policy))
        .collect()
}

/// Smallest index whose record hash is `>= key`, or `store.len()` if none.
pub fn lower_bound<S: Records + ?Sized>(store: &S, key: &Digest) -> Result<usize> {
    Ok(locate(store, key.as_str(), MalformedPolicy::Abort)?.index)
}

struct Located {
    /// Lower bound of the key
    index: usize,
    /// First decodable record at or after `index`
    candidate: Option<Record>,
}

fn locate<S: Records + ?Sized>(store: &S, key: &str, policy: MalformedPolicy) -> Result<Located> {
    let mut lo = 0;
    let mut hi = store.len();
    let mut candidate = None;
    let mut reads = 0usize;

    // Invariant: records below `lo` are < key; `candidate` is the first
    // decodable record at or after `hi` (None while hi == len).
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        match first_decodable(store, mid, hi, policy, &mut reads)? {
            Some((index, record)) => {
                if record.hash.as_str() >= key {
                    hi = mid;
                    candidate = Some(record);
                } else {
                    lo = index + 1;
                }
            }
            // Everything in [mid, hi) is malformed and skipped.
            None => hi = mid,
        }
    }

    log::debug!("Located {} at index {} after {} reads", key, lo, reads);
    Ok(Located {
        index: lo,
        candidate,
    })
}

/// Decode the record at `mid`. Under the skip policy, move forward to the
/// first decodable record below `hi`.
fn first_decodable<S: Records + ?Sized>(
    store: &S,
    mid: usize,
    hi: usize,
    policy: MalformedPolicy,
    reads: &mut usize,
) -> Result<Option<(usize, Record)>> {
    for index in mid..hi {
        *reads += 1;
        match store.record_at(index) {
            Ok(record) => return Ok(Some((index, record))),
            Err(e) if e.is_record_format() && policy == MalformedPolicy::Skip => {
                log::warn!("Skipping malformed record: {}", e);
            }
            Err(e) => {
                if e.is_record_format() {
                    log::error!("Search aborted: {}", e);
                }
                return Err(e);
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::digest;
    use crate::record::DecodeError;
    use crate::Error;
    use std::cell::RefCell;

    /// In-memory records; `None` slots fail to decode.
    struct ReadLog {
        slots: Vec<Option<Record>>,
        reads: RefCell<Vec<usize>>,
    }

    impl ReadLog {
        fn new(hashes: &[&str]) -> Self {
            let slots = hashes
                .iter()
                .enumerate()
                .map(|(i, h)| {
                    (!h.is_empty()).then(|| Record {
                        hash: h.to_string(),
                        count: i as u64 + 1,
                    })
                })
                .collect();
            Self {
                slots,
                reads: RefCell::new(Vec::new()),
            }
        }

        fn max_index(&self) -> Option<usize> {
            self.reads.borrow().iter().copied().max()
        }
    }

    impl Records for ReadLog {
        fn len(&self) -> usize {
            self.slots.len()
        }

        fn record_at(&self, index: usize) -> Result<Record> {
            assert!(index < self.slots.len(), "read of index {} past the end", index);
            self.reads.borrow_mut().push(index);
            self.slots[index].clone().ok_or(Error::RecordFormat {
                index,
                reason: DecodeError::EmptyCount,
            })
        }
    }

    fn key(fill: char) -> Digest {
        Digest::from_hex(&fill.to_string().repeat(40)).unwrap()
    }

    const H2: &str = "2222222222222222222222222222222222222222";
    const H5: &str = "5555555555555555555555555555555555555555";
    const H9: &str = "9999999999999999999999999999999999999999";

    #[test]
    fn test_finds_every_record() {
        let store = ReadLog::new(&[H2, H5, H9]);
        assert_eq!(search_digest(&store, &key('2')).unwrap().unwrap().count, 1);
        assert_eq!(search_digest(&store, &key('5')).unwrap().unwrap().count, 2);
        assert_eq!(search_digest(&store, &key('9')).unwrap().unwrap().count, 3);
    }

    #[test]
    fn test_key_above_all_never_reads_len() {
        let store = ReadLog::new(&[H2, H5, H9]);
        assert_eq!(search_digest(&store, &key('F')).unwrap(), None);
        assert_eq!(lower_bound(&store, &key('F')).unwrap(), 3);
        assert_eq!(store.max_index(), Some(2));
    }

    #[test]
    fn test_key_between_records() {
        let store = ReadLog::new(&[H2, H5, H9]);
        assert_eq!(search_digest(&store, &key('3')).unwrap(), None);
        assert_eq!(lower_bound(&store, &key('3')).unwrap(), 1);
        assert_eq!(search_digest(&store, &key('0')).unwrap(), None);
        assert_eq!(lower_bound(&store, &key('0')).unwrap(), 0);
    }

    #[test]
    fn test_prefix_is_not_a_match() {
        let store = ReadLog::new(&["2222222222222222222222222222222222222223"]);
        assert_eq!(search_digest(&store, &key('2')).unwrap(), None);
    }

    #[test]
    fn test_empty_store() {
        let store = ReadLog::new(&[]);
        assert_eq!(search(&store, "password").unwrap(), None);
        assert!(store.reads.borrow().is_empty());
    }

    #[test]
    fn test_logarithmic_reads() {
        let hashes: Vec<String> = (0..1000u32).map(|i| format!("{:040X}", i * 2)).collect();
        let refs: Vec<&str> = hashes.iter().map(String::as_str).collect();
        let store = ReadLog::new(&refs);

        let hit = Digest::from_hex(&format!("{:040X}", 1234)).unwrap();
        assert_eq!(search_digest(&store, &hit).unwrap().unwrap().count, 618);
        assert!(store.reads.borrow().len() <= 10);

        store.reads.borrow_mut().clear();
        let miss = Digest::from_hex(&format!("{:040X}", 1235)).unwrap();
        assert_eq!(search_digest(&store, &miss).unwrap(), None);
        assert!(store.reads.borrow().len() <= 10);
    }

    #[test]
    fn test_abort_on_malformed_record() {
        let store = ReadLog::new(&[H2, "", H9]);
        let err = search_digest(&store, &key('9')).unwrap_err();
        assert!(matches!(err, Error::RecordFormat { index: 1, .. }));
    }

    #[test]
    fn test_skip_malformed_records() {
        let store = ReadLog::new(&[H2, "", "", H9, ""]);
        let found = search_with_policy(&store, &key('9'), MalformedPolicy::Skip).unwrap();
        assert_eq!(found.unwrap().count, 4);
        let found = search_with_policy(&store, &key('2'), MalformedPolicy::Skip).unwrap();
        assert_eq!(found.unwrap().count, 1);
        let missing = search_with_policy(&store, &key('5'), MalformedPolicy::Skip).unwrap();
        assert_eq!(missing, None);
        let above = search_with_policy(&store, &key('F'), MalformedPolicy::Skip).unwrap();
        assert_eq!(above, None);
        assert!(store.max_index() < Some(5));
    }

    #[test]
    fn test_skip_all_malformed() {
        let store = ReadLog::new(&["", "", ""]);
        let result = search_with_policy(&store, &key('5'), MalformedPolicy::Skip).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_search_many_preserves_order() {
        let hit = digest("password");
        let store = ReadLog::new(&[H2, hit.as_str(), H9]);

        let results = search_many(&store, &["password", "hunter2"], MalformedPolicy::Abort);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().as_ref().unwrap().count, 2);
        assert!(matches!(results[1], Ok(None)));

        let results = search_many(&store, &["hunter2", "password"], MalformedPolicy::Abort);
        assert!(matches!(results[0], Ok(None)));
        assert_eq!(results[1].as_ref().unwrap().as_ref().unwrap().count, 2);
    }
}
