//! Read-only record store over a sorted fixed-width file.

use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

use super::format::{decode_record, Record};
use crate::config::{Backend, MalformedPolicy, StoreConfig};
use crate::digest::Digest;
use crate::{lookup, Error, Result};

/// Random access to a sorted sequence of records.
///
/// Implementations must be safe to read from several threads at once
/// when they are `Sync`; `record_at` takes `&self` and keeps no cursor.
pub trait Records {
    /// Number of records.
    fn len(&self) -> usize;

    /// Decode the record at `index`. `index` must be below `len()`.
    fn record_at(&self, index: usize) -> Result<Record>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
enum Backing {
    File(File),
    Mmap(Mmap),
}

/// Record store backed by a file on disk.
///
/// The file handle (or mapping) is owned exclusively by the store and
/// released when the store is dropped.
#[derive(Debug)]
pub struct RecordStore {
    backing: Backing,
    width: usize,
    len: usize,
    policy: MalformedPolicy,
}

impl RecordStore {
    /// Open a record file with the default configuration.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_config(path, &StoreConfig::default())
    }

    /// Open a record file.
    pub fn open_with_config(path: &Path, config: &StoreConfig) -> Result<Self> {
        config.validate()?;

        let file = File::open(path).map_err(|source| Error::File {
            path: path.to_path_buf(),
            source,
        })?;
        let size = file
            .metadata()
            .map_err(|source| Error::File {
                path: path.to_path_buf(),
                source,
            })?
            .len();

        let store = Self::from_file(file, size, config)?;
        log::debug!(
            "Opened {:?}: {} records of {} bytes ({})",
            path,
            store.len,
            store.width,
            store.backend().name()
        );
        Ok(store)
    }

    /// Open a record store from bytes.
    ///
    /// This writes the data to a temp file and then opens it.
    pub fn from_bytes(data: &[u8], config: &StoreConfig) -> Result<Self> {
        use std::io::Write;

        config.validate()?;

        let mut temp_file = tempfile::tempfile()?;
        temp_file.write_all(data)?;
        temp_file.flush()?;

        Self::from_file(temp_file, data.len() as u64, config)
    }

    fn from_file(file: File, size: u64, config: &StoreConfig) -> Result<Self> {
        let width = config.record_width;
        if size % width as u64 != 0 {
            return Err(Error::Format { size, width });
        }
        let len = usize::try_from(size / width as u64)
            .map_err(|_| Error::Format { size, width })?;

        // Empty files cannot be mapped.
        let backing = match config.backend {
            Backend::Mmap if size > 0 => Backing::Mmap(unsafe { Mmap::map(&file)? }),
            _ => Backing::File(file),
        };

        Ok(Self {
            backing,
            width,
            len,
            policy: config.on_malformed,
        })
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of one record in bytes.
    pub fn record_width(&self) -> usize {
        self.width
    }

    /// Backend actually in use.
    pub fn backend(&self) -> Backend {
        match self.backing {
            Backing::File(_) => Backend::Positioned,
            Backing::Mmap(_) => Backend::Mmap,
        }
    }

    /// Malformed-record policy used by [`RecordStore::search`].
    pub fn policy(&self) -> MalformedPolicy {
        self.policy
    }

    /// Look up `cleartext` using the store's malformed-record policy.
    pub fn search(&self, cleartext: &str) -> Result<Option<Record>> {
        lookup::search_with_policy(self, &Digest::of(cleartext), self.policy)
    }

    /// Look up several cleartexts in order.
    pub fn search_many<T: AsRef<str>>(&self, cleartexts: &[T]) -> Vec<Result<Option<Record>>> {
        lookup::search_many(self, cleartexts, self.policy)
    }

    /// Read and decode the record at `index`.
    pub fn record_at(&self, index: usize) -> Result<Record> {
        if index >= self.len {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.len,
            });
        }

        let offset = index * self.width;
        let record = match &self.backing {
            Backing::Mmap(mmap) => decode_record(&mmap[offset..offset + self.width]),
            Backing::File(file) => {
                let mut buf = vec![0u8; self.width];
                read_exact_at(file, &mut buf, offset as u64)?;
                decode_record(&buf)
            }
        };

        record.map_err(|reason| Error::RecordFormat { index, reason })
    }
}

impl Records for RecordStore {
    fn len(&self) -> usize {
        self.len
    }

    fn record_at(&self, index: usize) -> Result<Record> {
        RecordStore::record_at(self, index)
    }
}

impl<T: Records + ?Sized> Records for &T {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn record_at(&self, index: usize) -> Result<Record> {
        (**self).record_at(index)
    }
}

#[cfg(unix)]
fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> std::io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

#[cfg(windows)]
fn read_exact_at(file: &File, mut buf: &mut [u8], mut offset: u64) -> std::io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_read(buf, offset) {
            Ok(0) => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "failed to fill whole buffer",
                ))
            }
            Ok(n) => {
                buf = &mut buf[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{encode_record, DecodeError};

    const A: &str = "0000000000000000000000000000000000000001";
    const B: &str = "7777777777777777777777777777777777777777";

    fn two_records() -> Vec<u8> {
        let mut data = encode_record(A, 10, 63).unwrap();
        data.extend(encode_record(B, 20, 63).unwrap());
        data
    }

    #[test]
    fn test_open_from_bytes() {
        for backend in [Backend::Positioned, Backend::Mmap] {
            let config = StoreConfig::default().backend(backend);
            let store = RecordStore::from_bytes(&two_records(), &config).unwrap();

            assert_eq!(store.len(), 2);
            assert_eq!(store.record_width(), 63);
            assert_eq!(store.backend(), backend);
            assert_eq!(store.record_at(0).unwrap().hash, A);
            assert_eq!(store.record_at(1).unwrap().count, 20);
        }
    }

    #[test]
    fn test_empty_store() {
        let store =
            RecordStore::from_bytes(&[], &StoreConfig::default().backend(Backend::Mmap)).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.backend(), Backend::Positioned);
        assert!(matches!(
            store.record_at(0),
            Err(Error::IndexOutOfRange { index: 0, len: 0 })
        ));
    }

    #[test]
    fn test_size_not_multiple_of_width() {
        let mut data = two_records();
        data.pop();
        let err = RecordStore::from_bytes(&data, &StoreConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Format { size: 125, width: 63 }));
    }

    #[test]
    fn test_out_of_range() {
        let store = RecordStore::from_bytes(&two_records(), &StoreConfig::default()).unwrap();
        assert!(matches!(
            store.record_at(2),
            Err(Error::IndexOutOfRange { index: 2, len: 2 })
        ));
    }

    #[test]
    fn test_malformed_record_reports_index() {
        let mut data = two_records();
        data[63 + 40] = b'#';
        let store = RecordStore::from_bytes(&data, &StoreConfig::default()).unwrap();

        assert!(store.record_at(0).is_ok());
        match store.record_at(1) {
            Err(Error::RecordFormat { index, reason }) => {
                assert_eq!(index, 1);
                assert_eq!(reason, DecodeError::MissingSeparator(b'#'));
            }
            other => panic!("expected RecordFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");
        let err = RecordStore::open(&path).unwrap_err();
        assert!(matches!(err, Error::File { .. }));
    }

    #[test]
    fn test_open_custom_width() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("narrow.txt");
        let mut data = encode_record(A, 1, 48).unwrap();
        data.extend(encode_record(B, 2, 48).unwrap());
        std::fs::write(&path, &data).unwrap();

        assert!(matches!(
            RecordStore::open(&path),
            Err(Error::Format { size: 96, .. })
        ));

        let store = RecordStore::open_with_config(&path, &StoreConfig::with_record_width(48)).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.record_at(1).unwrap().count, 2);
    }

    #[test]
    fn test_rejects_invalid_width() {
        let err = RecordStore::from_bytes(&[], &StoreConfig::with_record_width(10)).unwrap_err();
        assert!(matches!(err, Error::InvalidRecordWidth(10)));
    }
}
