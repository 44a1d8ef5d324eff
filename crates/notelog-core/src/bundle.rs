//! Sync bundles: the zip unit a client uploads for bulk merge.
//!
//! ```text
//! bundle.zip
//!   index.txt        # index lines, same format as the store index
//!   data.bin         # content bytes addressed by offset/size
//!   files/<name>     # optional auxiliary files, never part of the log
//! ```
//!
//! Every record's `offset + size` is checked against `data.bin` when the
//! bundle is decoded, so a [`Bundle`] value is always safe to slice.

use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::ErrorCode;
use crate::filename::filenamify;
use crate::record::{IndexError, Record, WriteError, parse_index, write_index};
use crate::store::{RecordStore, StoreError};

pub const INDEX_ENTRY: &str = "index.txt";
pub const DATA_ENTRY: &str = "data.bin";
/// Entries under this prefix are auxiliary files.
pub const AUX_PREFIX: &str = "files/";

/// Errors produced while decoding or encoding a bundle.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("invalid zip archive: {0}")]
    Zip(#[from] ZipError),

    #[error("bundle is missing required entry '{0}'")]
    MissingEntry(&'static str),

    #[error("bundle entry '{0}' is not valid UTF-8")]
    NotUtf8(&'static str),

    #[error("bundle index: {0}")]
    Index(#[from] IndexError),

    #[error("record {index} [{record}] exceeds data length {data_len}")]
    RecordOutOfRange {
        index: usize,
        record: String,
        data_len: u64,
    },

    #[error("cannot encode bundle index: {0}")]
    Write(#[from] WriteError),

    #[error("bundle I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot read log for export: {0}")]
    Store(#[from] StoreError),
}

impl BundleError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io(_) => ErrorCode::StoreWriteFailed,
            Self::Store(err) => err.code(),
            _ => ErrorCode::MalformedBundle,
        }
    }
}

/// A file carried alongside the log in a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxFile {
    /// Entry name with the `files/` prefix stripped.
    pub name: String,
    pub bytes: Vec<u8>,
}

/// A decoded, range-checked bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bundle {
    pub records: Vec<Record>,
    pub data: Vec<u8>,
    pub aux_files: Vec<AuxFile>,
}

impl Bundle {
    /// Decode a zip archive.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError`] if the archive is unreadable, lacks
    /// `index.txt` or `data.bin`, has a malformed index line, or a record
    /// points past the end of `data.bin`.
    pub fn from_zip(bytes: &[u8]) -> Result<Self, BundleError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut index = None;
        let mut data = None;
        let mut aux_files = Vec::new();

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut buf = Vec::new();
            entry.read_to_end(&mut buf)?;
            match name.as_str() {
                INDEX_ENTRY => index = Some(buf),
                DATA_ENTRY => data = Some(buf),
                _ => {
                    if let Some(aux) = name.strip_prefix(AUX_PREFIX).filter(|n| !n.is_empty()) {
                        aux_files.push(AuxFile {
                            name: aux.to_string(),
                            bytes: buf,
                        });
                    } else {
                        debug!(entry = %name, "ignoring unrecognised bundle entry");
                    }
                }
            }
        }

        let index = index.ok_or(BundleError::MissingEntry(INDEX_ENTRY))?;
        let data = data.ok_or(BundleError::MissingEntry(DATA_ENTRY))?;
        let index = String::from_utf8(index).map_err(|_| BundleError::NotUtf8(INDEX_ENTRY))?;

        let mut bundle = Self::from_parts(&index, data)?;
        bundle.aux_files = aux_files;
        Ok(bundle)
    }

    /// Build a bundle from raw index text and data bytes.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::Index`] or [`BundleError::RecordOutOfRange`].
    pub fn from_parts(index: &str, data: Vec<u8>) -> Result<Self, BundleError> {
        let bundle = Self {
            records: parse_index(index)?,
            data,
            aux_files: Vec::new(),
        };
        bundle.check_ranges()?;
        Ok(bundle)
    }

    /// Check that every record's `offset + size` lies within `data`.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::RecordOutOfRange`] for the first violation.
    pub fn check_ranges(&self) -> Result<(), BundleError> {
        let data_len = self.data.len() as u64;
        for (index, rec) in self.records.iter().enumerate() {
            if rec.content_end().is_none_or(|end| end > data_len) {
                return Err(BundleError::RecordOutOfRange {
                    index,
                    record: rec.to_string(),
                    data_len,
                });
            }
        }
        Ok(())
    }

    /// Export every record of `store` with its content.
    ///
    /// Kinds, metas and timestamps are copied verbatim. Content is re-laid
    /// contiguously, so offsets change and `sizeInFile` is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::Store`] if a record cannot be read back.
    pub fn from_store<S: RecordStore + ?Sized>(store: &S) -> Result<Self, BundleError> {
        let mut data = Vec::new();
        let mut records = Vec::with_capacity(store.records().len());
        for rec in store.records() {
            let bytes = store.read_record(rec)?;
            let offset = if bytes.is_empty() { 0 } else { data.len() as u64 };
            data.extend_from_slice(&bytes);
            records.push(Record {
                offset,
                size: bytes.len() as u64,
                size_in_file: None,
                overwritten: false,
                ..rec.clone()
            });
        }
        Ok(Self {
            records,
            data,
            aux_files: Vec::new(),
        })
    }

    /// Content bytes of `rec`, which must come from this bundle.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::RecordOutOfRange`] if `rec` does not fit `data`.
    pub fn content(&self, rec: &Record) -> Result<&[u8], BundleError> {
        let out_of_range = || BundleError::RecordOutOfRange {
            index: 0,
            record: rec.to_string(),
            data_len: self.data.len() as u64,
        };
        let start = usize::try_from(rec.offset).map_err(|_| out_of_range())?;
        let len = usize::try_from(rec.size).map_err(|_| out_of_range())?;
        start
            .checked_add(len)
            .and_then(|end| self.data.get(start..end))
            .ok_or_else(out_of_range)
    }

    /// Encode as a zip archive.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError`] if a record cannot be written as an index
    /// line or the archive cannot be written.
    pub fn to_zip(&self) -> Result<Vec<u8>, BundleError> {
        let index = write_index(&self.records)?;
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        zip.start_file(INDEX_ENTRY, options)?;
        zip.write_all(index.as_bytes())?;
        zip.start_file(DATA_ENTRY, options)?;
        zip.write_all(&self.data)?;
        for aux in &self.aux_files {
            zip.start_file(format!("{AUX_PREFIX}{}", aux.name), options)?;
            zip.write_all(&aux.bytes)?;
        }
        Ok(zip.finish()?.into_inner())
    }

    /// Write auxiliary files under `dir`, one sanitized name each.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::Io`] on filesystem failure.
    pub fn materialize_aux_files(&self, dir: &Path) -> Result<Vec<PathBuf>, BundleError> {
        if self.aux_files.is_empty() {
            return Ok(Vec::new());
        }
        std::fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(self.aux_files.len());
        for aux in &self.aux_files {
            let path = dir.join(filenamify(&aux.name));
            std::fs::write(&path, &aux.bytes)?;
            debug!(path = %path.display(), bytes = aux.bytes.len(), "materialized aux file");
            written.push(path);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordKind;
    use crate::store::MemStore;

    fn sample_store() -> MemStore {
        let mut store = MemStore::new();
        store
            .append_record_with_timestamp(RecordKind::CreateNote, "n1:scratch", &[], 10)
            .expect("create");
        store
            .append_record_with_timestamp(RecordKind::PutContent, "n1:aaaaaa", b"hello", 11)
            .expect("put");
        store
            .overwrite_record_with_timestamp(
                RecordKind::WriteFile,
                r#"{"name":"s.json"}"#,
                b"{}",
                12,
            )
            .expect("file");
        store
    }

    fn zip_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, bytes) in entries {
            zip.start_file(*name, SimpleFileOptions::default())
                .expect("start");
            zip.write_all(bytes).expect("write");
        }
        zip.finish().expect("finish").into_inner()
    }

    #[test]
    fn export_then_decode_keeps_records_and_content() {
        let store = sample_store();
        let bundle = Bundle::from_store(&store).expect("export");
        let decoded = Bundle::from_zip(&bundle.to_zip().expect("zip")).expect("decode");

        assert_eq!(decoded.records.len(), 3);
        let put = &decoded.records[1];
        assert_eq!(put.timestamp_ms, 11);
        assert_eq!(decoded.content(put).expect("content"), b"hello");
        assert_eq!(decoded.records[2].size_in_file, None);
        assert_eq!(decoded.content(&decoded.records[2]).expect("file"), b"{}");
    }

    #[test]
    fn missing_entries_are_rejected() {
        let only_index = zip_of(&[(INDEX_ENTRY, b"")]);
        let err = Bundle::from_zip(&only_index).expect_err("must fail");
        assert!(matches!(err, BundleError::MissingEntry(DATA_ENTRY)));
        assert_eq!(err.code(), ErrorCode::MalformedBundle);

        let only_data = zip_of(&[(DATA_ENTRY, b"")]);
        assert!(matches!(
            Bundle::from_zip(&only_data),
            Err(BundleError::MissingEntry(INDEX_ENTRY))
        ));
    }

    #[test]
    fn not_a_zip() {
        assert!(matches!(
            Bundle::from_zip(b"definitely not a zip"),
            Err(BundleError::Zip(_))
        ));
    }

    #[test]
    fn record_past_data_end_rejects_whole_bundle() {
        let index = "0 0 1 note-create n1:a\n2 4 2 put n1:v1\n";
        let err = Bundle::from_parts(index, b"abc".to_vec()).expect_err("must fail");
        assert!(matches!(
            err,
            BundleError::RecordOutOfRange {
                index: 1,
                data_len: 3,
                ..
            }
        ));
    }

    #[test]
    fn malformed_index_line() {
        let err = Bundle::from_parts("not an index line\n", Vec::new()).expect_err("must fail");
        assert!(matches!(err, BundleError::Index(_)));
    }

    #[test]
    fn aux_files_are_collected_and_materialized() {
        let zip = zip_of(&[
            (INDEX_ENTRY, b""),
            (DATA_ENTRY, b""),
            ("files/a:b.txt", b"aux"),
            ("stray.bin", b"?"),
        ]);
        let bundle = Bundle::from_zip(&zip).expect("decode");
        assert_eq!(bundle.aux_files.len(), 1);
        assert_eq!(bundle.aux_files[0].name, "a:b.txt");

        let dir = tempfile::TempDir::new().expect("tempdir");
        let written = bundle.materialize_aux_files(dir.path()).expect("write");
        assert_eq!(written, vec![dir.path().join("a_b.txt")]);
        assert_eq!(std::fs::read(&written[0]).expect("read"), b"aux");
    }
}
