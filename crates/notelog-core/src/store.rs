//! Append-only record storage.
//!
//! A store is a pair of files: a text index (one [`Record`] per line, see
//! [`crate::record`]) and a binary data file holding the concatenated
//! content bytes addressed by each record's `offset`/`size`.
//!
//! ```text
//! <data_dir>/<tenant>/
//!   index.txt        # index lines
//!   data.bin         # content bytes
//!   index.txt.lock   # advisory writer lock
//! ```
//!
//! # Invariants
//!
//! - Records are only ever appended to the index.
//! - Content bytes are only ever appended to the data file, except for the
//!   in-place rewrite performed by `overwrite_record` on `write-file`
//!   records with enough reserved capacity.
//! - Each append is `write_all` + `flush` of the data bytes followed by one
//!   complete index line; a torn trailing index line is truncated on open.
//! - Empty content is recorded as `offset 0 size 0` and touches no data.
//!
//! # Several writers
//!
//! A [`FileStore`] caches the parsed index. Every append takes the lock
//! file and first loads index lines other handles wrote since the last
//! look. [`FileStore::with_lock`] holds the lock across a whole
//! read-then-append sequence.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::ErrorCode;
use crate::lock::{LockError, StoreLock};
use crate::record::{
    IndexError, Record, RecordKind, WriteError, check_kind_and_meta, format_index_line,
    mark_overwritten, parse_index,
};

/// Default capacity growth for overwritable records, in percent of the
/// content size.
pub const DEFAULT_OVERWRITE_EXPAND_PERCENT: u64 = 140;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("lock error: {0}")]
    Lock(#[from] LockError),

    #[error("failed to load index: {0}")]
    Index(#[from] IndexError),

    #[error("cannot write record: {0}")]
    Write(#[from] WriteError),

    #[error("only write-file records can be overwritten, got kind '{kind}'")]
    OverwriteNotAllowed { kind: String },

    #[error("record [{record}] lies outside the data file ({data_size} bytes)")]
    OutOfRange { record: String, data_size: u64 },
}

impl StoreError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io(_) | Self::Write(_) => ErrorCode::StoreWriteFailed,
            Self::Lock(err) => err.code(),
            Self::Index(_) => ErrorCode::MalformedIndex,
            Self::OverwriteNotAllowed { .. } => ErrorCode::InvalidMeta,
            Self::OutOfRange { .. } => ErrorCode::InconsistentLog,
        }
    }
}

/// Tunables shared by store implementations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Extra capacity reserved when an overwritable record is (re)appended.
    pub overwrite_expand_percent: u64,
    /// How long a writer waits for the advisory lock.
    pub lock_timeout: Duration,
    /// `sync_data` after every append.
    pub durable: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            overwrite_expand_percent: DEFAULT_OVERWRITE_EXPAND_PERCENT,
            lock_timeout: Duration::from_secs(5),
            durable: false,
        }
    }
}

/// Current wall-clock time in epoch milliseconds.
#[must_use]
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// The operations the projector, validator and merge engine need from a log.
pub trait RecordStore {
    /// Full history in insertion order.
    fn records(&self) -> &[Record];

    /// Current length of the data file in bytes.
    fn data_size(&self) -> u64;

    /// Append a record carrying `content`, stamped with `timestamp_ms`.
    fn append_record_with_timestamp(
        &mut self,
        kind: RecordKind,
        meta: &str,
        content: &[u8],
        timestamp_ms: i64,
    ) -> Result<Record, StoreError>;

    /// Replace the bytes of the latest record sharing `kind` + `meta`, in
    /// place when its capacity allows, and append a record describing the
    /// new bytes. The superseded record becomes `overwritten`.
    fn overwrite_record_with_timestamp(
        &mut self,
        kind: RecordKind,
        meta: &str,
        content: &[u8],
        timestamp_ms: i64,
    ) -> Result<Record, StoreError>;

    /// Read back the content bytes of `rec`.
    fn read_record(&self, rec: &Record) -> Result<Vec<u8>, StoreError>;

    /// [`Self::append_record_with_timestamp`] stamped with the current time.
    fn append_record(
        &mut self,
        kind: RecordKind,
        meta: &str,
        content: &[u8],
    ) -> Result<Record, StoreError> {
        self.append_record_with_timestamp(kind, meta, content, now_ms())
    }

    /// [`Self::overwrite_record_with_timestamp`] stamped with the current time.
    fn overwrite_record(
        &mut self,
        kind: RecordKind,
        meta: &str,
        content: &[u8],
    ) -> Result<Record, StoreError> {
        self.overwrite_record_with_timestamp(kind, meta, content, now_ms())
    }

    /// Monotonic change counter: the number of records in the log.
    fn change_id(&self) -> usize {
        self.records().len()
    }
}

/// Where the bytes of an overwrite go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OverwritePlan {
    /// Rewrite at `offset`, keeping the existing `capacity`.
    InPlace { offset: u64, capacity: u64 },
    /// Append with `padding` spare bytes.
    Append { padding: u64 },
}

fn plan_overwrite(
    records: &[Record],
    kind: &RecordKind,
    meta: &str,
    needed: u64,
    expand_percent: u64,
) -> Result<OverwritePlan, StoreError> {
    if *kind != RecordKind::WriteFile {
        return Err(StoreError::OverwriteNotAllowed {
            kind: kind.to_string(),
        });
    }
    let in_place = records
        .iter()
        .rev()
        .find(|r| !r.overwritten && r.kind == *kind && r.meta == meta)
        .and_then(|rec| rec.size_in_file.map(|capacity| (rec.offset, capacity)))
        .filter(|&(_, capacity)| capacity >= needed);
    if let Some((offset, capacity)) = in_place {
        return Ok(OverwritePlan::InPlace { offset, capacity });
    }
    Ok(OverwritePlan::Append {
        padding: needed.saturating_mul(expand_percent) / 100,
    })
}

fn mark_superseded(records: &mut [Record], kind: &RecordKind, meta: &str) {
    if let Some(prev) = records
        .iter_mut()
        .rev()
        .find(|r| !r.overwritten && r.kind == *kind && r.meta == meta)
    {
        prev.overwritten = true;
    }
}

fn content_len(content: &[u8]) -> u64 {
    content.len() as u64
}

// ---------------------------------------------------------------------------
// MemStore
// ---------------------------------------------------------------------------

/// In-memory store. Used by tests and to assemble bundles.
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    records: Vec<Record>,
    data: Vec<u8>,
    options: StoreOptions,
}

impl MemStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(options: StoreOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Build a store from raw parts, recomputing `overwritten` flags.
    #[must_use]
    pub fn from_parts(mut records: Vec<Record>, data: Vec<u8>) -> Self {
        mark_overwritten(&mut records);
        Self {
            records,
            data,
            options: StoreOptions::default(),
        }
    }

    /// The raw data bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the records, for tests that fabricate corruption.
    pub fn records_mut(&mut self) -> &mut Vec<Record> {
        &mut self.records
    }

    fn append_bytes(&mut self, content: &[u8], padding: u64) -> (u64, Option<u64>) {
        if content.is_empty() && padding == 0 {
            return (0, None);
        }
        let offset = content_len(&self.data);
        self.data.extend_from_slice(content);
        if padding == 0 {
            return (offset, None);
        }
        let pad = usize::try_from(padding).unwrap_or(usize::MAX);
        self.data.resize(self.data.len().saturating_add(pad), b' ');
        (offset, Some(content_len(content) + padding))
    }
}

impl RecordStore for MemStore {
    fn records(&self) -> &[Record] {
        &self.records
    }

    fn data_size(&self) -> u64 {
        content_len(&self.data)
    }

    fn append_record_with_timestamp(
        &mut self,
        kind: RecordKind,
        meta: &str,
        content: &[u8],
        timestamp_ms: i64,
    ) -> Result<Record, StoreError> {
        check_kind_and_meta(kind.as_str(), meta)?;
        let (offset, _) = self.append_bytes(content, 0);
        let rec = Record {
            offset,
            size: content_len(content),
            ..Record::new(kind, meta, timestamp_ms)
        };
        self.records.push(rec.clone());
        Ok(rec)
    }

    fn overwrite_record_with_timestamp(
        &mut self,
        kind: RecordKind,
        meta: &str,
        content: &[u8],
        timestamp_ms: i64,
    ) -> Result<Record, StoreError> {
        check_kind_and_meta(kind.as_str(), meta)?;
        let needed = content_len(content);
        let plan = plan_overwrite(
            &self.records,
            &kind,
            meta,
            needed,
            self.options.overwrite_expand_percent,
        )?;
        let (offset, size_in_file) = match plan {
            OverwritePlan::InPlace { offset, capacity } => {
                let start = usize::try_from(offset).unwrap_or(usize::MAX);
                let end = start.saturating_add(content.len());
                if end > self.data.len() {
                    return Err(StoreError::OutOfRange {
                        record: format!("offset={offset} size={needed}"),
                        data_size: self.data_size(),
                    });
                }
                self.data[start..end].copy_from_slice(content);
                (offset, Some(capacity))
            }
            OverwritePlan::Append { padding } => self.append_bytes(content, padding),
        };
        mark_superseded(&mut self.records, &kind, meta);
        let rec = Record {
            offset,
            size: needed,
            size_in_file,
            ..Record::new(kind, meta, timestamp_ms)
        };
        self.records.push(rec.clone());
        Ok(rec)
    }

    fn read_record(&self, rec: &Record) -> Result<Vec<u8>, StoreError> {
        if rec.size == 0 {
            return Ok(Vec::new());
        }
        let out_of_range = || StoreError::OutOfRange {
            record: rec.to_string(),
            data_size: self.data_size(),
        };
        let end = rec.content_end().ok_or_else(out_of_range)?;
        if end > self.data_size() {
            return Err(out_of_range());
        }
        let start = usize::try_from(rec.offset).map_err(|_| out_of_range())?;
        let end = usize::try_from(end).map_err(|_| out_of_range())?;
        Ok(self.data[start..end].to_vec())
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// File-backed store: an index text file plus a data file in one directory.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    index_path: PathBuf,
    data_path: PathBuf,
    lock_path: PathBuf,
    records: Vec<Record>,
    data_len: u64,
    /// Bytes of the index file already parsed into `records`.
    index_len: u64,
    lock_held: bool,
    options: StoreOptions,
}

impl FileStore {
    /// Open (creating if needed) the store `dir/index_file` + `dir/data_file`.
    ///
    /// Loads every index line, truncating a torn trailing line first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] on filesystem failure and
    /// [`StoreError::Index`] if a complete index line is malformed.
    pub fn open(
        dir: impl Into<PathBuf>,
        index_file: &str,
        data_file: &str,
        options: StoreOptions,
    ) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let index_path = dir.join(index_file);
        let data_path = dir.join(data_file);
        let lock_path = dir.join(format!("{index_file}.lock"));

        for path in [&index_path, &data_path] {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
        }

        if let Some(removed) = recover_torn_index(&index_path)? {
            warn!(
                path = %index_path.display(),
                removed,
                "truncated torn trailing index line"
            );
        }

        let text = fs::read_to_string(&index_path)?;
        let mut records = parse_index(&text)?;
        mark_overwritten(&mut records);
        let data_len = fs::metadata(&data_path)?.len();
        let index_len = content_len(text.as_bytes());

        debug!(
            dir = %dir.display(),
            records = records.len(),
            data_len,
            "opened record store"
        );

        Ok(Self {
            dir,
            index_path,
            data_path,
            lock_path,
            records,
            data_len,
            index_len,
            lock_held: false,
            options,
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    #[must_use]
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Load index lines appended by other handles since the last load.
    ///
    /// Only complete lines are taken; a line still being written is picked
    /// up by a later call. Returns the number of records added.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the files cannot be read and
    /// [`StoreError::Index`] if a new line is malformed.
    pub fn refresh(&mut self) -> Result<usize, StoreError> {
        let bytes = fs::read(&self.index_path)?;
        let start = if content_len(&bytes) < self.index_len {
            warn!(path = %self.index_path.display(), "index shrank under an open store; reloading");
            self.records.clear();
            0
        } else {
            usize::try_from(self.index_len).unwrap_or(bytes.len())
        };
        let tail = bytes.get(start..).unwrap_or_default();
        let complete = tail.iter().rposition(|&b| b == b'\n').map_or(0, |pos| pos + 1);
        let text = std::str::from_utf8(&tail[..complete])
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

        let fresh = parse_index(text)?;
        let added = fresh.len();
        if added > 0 {
            self.records.extend(fresh);
            mark_overwritten(&mut self.records);
            debug!(added, records = self.records.len(), "loaded records from another writer");
        }
        self.index_len = content_len(&bytes[..start + complete]);
        self.data_len = fs::metadata(&self.data_path)?.len();
        Ok(added)
    }

    /// Run `f` holding the writer lock, after loading what other writers
    /// appended. Appends made inside `f` reuse the held lock.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Lock`] if the lock is not acquired within the
    /// configured timeout, or any error from [`FileStore::refresh`].
    pub fn with_lock<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> Result<T, StoreError> {
        if self.lock_held {
            return Ok(f(self));
        }
        let lock = StoreLock::acquire(&self.lock_path, self.options.lock_timeout)?;
        self.refresh()?;
        self.lock_held = true;
        let out = f(self);
        self.lock_held = false;
        lock.release();
        Ok(out)
    }

    /// Lock for one append unless [`FileStore::with_lock`] already holds it.
    fn lock(&mut self) -> Result<Option<StoreLock>, StoreError> {
        if self.lock_held {
            return Ok(None);
        }
        let lock = StoreLock::acquire(&self.lock_path, self.options.lock_timeout)?;
        self.refresh()?;
        Ok(Some(lock))
    }

    /// Append `content` plus `padding` spaces to the data file.
    fn append_bytes(&mut self, content: &[u8], padding: u64) -> Result<(u64, Option<u64>), StoreError> {
        if content.is_empty() && padding == 0 {
            return Ok((0, None));
        }
        let mut file = OpenOptions::new().append(true).open(&self.data_path)?;
        let offset = file.metadata()?.len();
        file.write_all(content)?;
        if padding > 0 {
            let pad = usize::try_from(padding).unwrap_or(usize::MAX);
            file.write_all(&vec![b' '; pad])?;
        }
        file.flush()?;
        if self.options.durable {
            file.sync_data()?;
        }
        self.data_len = offset + content_len(content) + padding;
        let capacity = (padding > 0).then(|| content_len(content) + padding);
        Ok((offset, capacity))
    }

    fn write_bytes_at(&self, offset: u64, content: &[u8]) -> Result<(), StoreError> {
        let mut file = OpenOptions::new().write(true).open(&self.data_path)?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(content)?;
        file.flush()?;
        if self.options.durable {
            file.sync_data()?;
        }
        Ok(())
    }

    fn append_index_line(&mut self, rec: Record) -> Result<Record, StoreError> {
        let mut line = format_index_line(&rec)?;
        line.push('\n');
        let mut file = OpenOptions::new().append(true).open(&self.index_path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        if self.options.durable {
            file.sync_data()?;
        }
        self.index_len += content_len(line.as_bytes());
        self.records.push(rec.clone());
        Ok(rec)
    }
}

impl RecordStore for FileStore {
    fn records(&self) -> &[Record] {
        &self.records
    }

    fn data_size(&self) -> u64 {
        self.data_len
    }

    fn append_record_with_timestamp(
        &mut self,
        kind: RecordKind,
        meta: &str,
        content: &[u8],
        timestamp_ms: i64,
    ) -> Result<Record, StoreError> {
        check_kind_and_meta(kind.as_str(), meta)?;
        let _lock = self.lock()?;
        let (offset, _) = self.append_bytes(content, 0)?;
        let rec = Record {
            offset,
            size: content_len(content),
            ..Record::new(kind, meta, timestamp_ms)
        };
        self.append_index_line(rec)
    }

    fn overwrite_record_with_timestamp(
        &mut self,
        kind: RecordKind,
        meta: &str,
        content: &[u8],
        timestamp_ms: i64,
    ) -> Result<Record, StoreError> {
        check_kind_and_meta(kind.as_str(), meta)?;
        let _lock = self.lock()?;
        let needed = content_len(content);
        let plan = plan_overwrite(
            &self.records,
            &kind,
            meta,
            needed,
            self.options.overwrite_expand_percent,
        )?;
        let (offset, size_in_file) = match plan {
            OverwritePlan::InPlace { offset, capacity } => {
                self.write_bytes_at(offset, content)?;
                (offset, Some(capacity))
            }
            OverwritePlan::Append { padding } => self.append_bytes(content, padding)?,
        };
        mark_superseded(&mut self.records, &kind, meta);
        let rec = Record {
            offset,
            size: needed,
            size_in_file,
            ..Record::new(kind, meta, timestamp_ms)
        };
        self.append_index_line(rec)
    }

    fn read_record(&self, rec: &Record) -> Result<Vec<u8>, StoreError> {
        if rec.size == 0 {
            return Ok(Vec::new());
        }
        let out_of_range = || StoreError::OutOfRange {
            record: rec.to_string(),
            data_size: self.data_len,
        };
        let end = rec.content_end().ok_or_else(out_of_range)?;
        if end > self.data_len {
            return Err(out_of_range());
        }
        let len = usize::try_from(rec.size).map_err(|_| out_of_range())?;
        let mut file = File::open(&self.data_path)?;
        file.seek(SeekFrom::Start(rec.offset))?;
        let mut buf = vec![0u8; len];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }
}

/// Truncate an incomplete trailing line (no `\n`) from the index file.
///
/// Returns the number of bytes removed, or `None` if the file was intact.
fn recover_torn_index(path: &Path) -> Result<Option<u64>, StoreError> {
    let content = fs::read(path)?;
    if content.is_empty() || content.ends_with(b"\n") {
        return Ok(None);
    }
    let keep = content
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |pos| pos + 1);
    let removed = (content.len() - keep) as u64;
    let file = OpenOptions::new().write(true).open(path)?;
    file.set_len(keep as u64)?;
    file.sync_all()?;
    Ok(Some(removed))
}
