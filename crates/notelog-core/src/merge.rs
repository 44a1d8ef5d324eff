//! Merge/replay: reconcile an uploaded bundle into an existing log.
//!
//! A client keeps its own log and periodically uploads it (or a fragment
//! of it) as a [`Bundle`]. Merging appends the client's records to the
//! authoritative log without duplicating notes the server already has.
//!
//! # Algorithm
//!
//! 1. The bundle is range-checked before anything is written.
//! 2. The existing log is projected strictly (`old`).
//! 3. Reserved default names present in `old` are reported.
//! 4. The bundle is projected tolerantly (`new`). Every live incoming note
//!    whose id is not in `old` but whose name matches a live `old` note is
//!    a collision.
//! 5. Per collision, the current content bytes of both notes are compared:
//!    equal bytes mark the incoming id *ignored*, different bytes assign
//!    it a fresh name (`name-0`, `name-1`, ...).
//! 6. Incoming records are replayed in order with their original
//!    timestamps. Records already present in the log verbatim (same kind,
//!    meta and timestamp) are skipped, as are records of ignored ids and
//!    records targeting notes that are not live. A create or `note-meta`
//!    whose name belongs to another live note is rewritten: to the name
//!    planned in step 5, else to the note's current name, else to a fresh
//!    unique name. The rewritten record is checked against the log again,
//!    so uploading the same bundle twice appends nothing. `write-file`
//!    records are always applied through the store's overwrite path.
//! 7. The whole log is validated.
//!
//! Records appended in step 6 stay in the log when step 7 fails; the
//! store has no multi-record transaction.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::bundle::{Bundle, BundleError};
use crate::error::ErrorCode;
use crate::project::{
    NoteMap, ProjectError, ProjectionMode, apply_record, last_version_record, live_notes,
    notes_by_name, project,
};
use crate::record::{
    ContentMeta, CreateMeta, MetaError, NoteMeta, Record, RecordKind, new_note_id,
    rename_note_meta,
};
use crate::store::{RecordStore, StoreError};
use crate::validate::{ValidationError, validate};

/// Note names auto-created for new accounts.
pub const DEFAULT_RESERVED_NAMES: &[&str] = &["scratch", "inbox", "daily journal"];

/// Merge tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    /// Skip (rather than reject) `note-meta` records for unknown notes.
    pub tolerant: bool,
    /// Names of auto-provisioned notes, reported when present.
    pub reserved_names: Vec<String>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            tolerant: true,
            reserved_names: DEFAULT_RESERVED_NAMES
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// What a merge did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Records appended to the log (including `write-file` overwrites).
    pub appended: usize,
    /// Incoming records dropped during replay.
    pub skipped: usize,
    /// Incoming note ids judged identical to an existing note.
    pub ignored_ids: BTreeSet<String>,
    /// Incoming note id → the unique name it was stored under.
    pub renamed: BTreeMap<String, String>,
    /// Reserved default names already present in the existing log.
    pub reserved_present: Vec<String>,
    /// `write-file` records applied.
    pub files_written: usize,
}

/// Errors that abort a merge.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("malformed bundle: {0}")]
    Bundle(#[from] BundleError),

    #[error("existing log does not project: {0}")]
    ExistingLog(#[source] ProjectError),

    #[error("bundle log does not project: {0}")]
    IncomingLog(#[source] ProjectError),

    #[error("bundle record {index} [{record}]: {reason}")]
    InconsistentLog {
        index: usize,
        reason: String,
        record: String,
    },

    #[error("bundle record {index} [{record}]: unknown record kind '{kind}'")]
    UnknownKind {
        index: usize,
        kind: String,
        record: String,
    },

    #[error("bundle record {index} [{record}]: {source}")]
    Meta {
        index: usize,
        record: String,
        #[source]
        source: MetaError,
    },

    #[error("replay of bundle record {index} failed: {source}")]
    Replay {
        index: usize,
        #[source]
        source: ProjectError,
    },

    #[error("store error during merge: {0}")]
    Store(#[from] StoreError),

    #[error("log failed validation after merge: {0}")]
    Validation(#[source] ValidationError),
}

impl MergeError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Bundle(_) => ErrorCode::MalformedBundle,
            Self::ExistingLog(_)
            | Self::IncomingLog(_)
            | Self::InconsistentLog { .. }
            | Self::Replay { .. } => ErrorCode::InconsistentLog,
            Self::UnknownKind { .. } => ErrorCode::UnknownRecordKind,
            Self::Meta { .. } => ErrorCode::InvalidMeta,
            Self::Store(err) => err.code(),
            Self::Validation(_) => ErrorCode::MergeValidationFailure,
        }
    }
}

/// Decode `zip` and merge it into `store`.
///
/// # Errors
///
/// See [`merge`]. Decoding failures surface as [`MergeError::Bundle`]
/// before the store is touched.
pub fn merge_zip<S: RecordStore + ?Sized>(
    store: &mut S,
    zip: &[u8],
    opts: &MergeOptions,
) -> Result<MergeReport, MergeError> {
    let bundle = Bundle::from_zip(zip)?;
    merge(store, &bundle, opts)
}

/// Merge `bundle` into `store`.
///
/// # Errors
///
/// - [`MergeError::Bundle`]: a record exceeds the bundle data (nothing written).
/// - [`MergeError::ExistingLog`] / [`MergeError::IncomingLog`]: a log does
///   not project (nothing written).
/// - [`MergeError::InconsistentLog`], [`MergeError::UnknownKind`],
///   [`MergeError::Store`]: replay aborted; earlier appends remain.
/// - [`MergeError::Validation`]: the merged log is structurally invalid.
pub fn merge<S: RecordStore + ?Sized>(
    store: &mut S,
    bundle: &Bundle,
    opts: &MergeOptions,
) -> Result<MergeReport, MergeError> {
    bundle.check_ranges()?;

    let old_notes =
        project(store.records(), ProjectionMode::Strict).map_err(MergeError::ExistingLog)?;
    let new_notes =
        project(&bundle.records, ProjectionMode::Tolerant).map_err(MergeError::IncomingLog)?;

    let mut report = MergeReport {
        reserved_present: reserved_present(&old_notes, &opts.reserved_names),
        ..MergeReport::default()
    };
    if !report.reserved_present.is_empty() {
        debug!(names = ?report.reserved_present, "existing log holds reserved default notes");
    }

    let plan = plan_collisions(&*store, bundle, &old_notes, &new_notes)?;
    report.ignored_ids = plan.ignored;
    report.renamed = plan.renamed;

    replay(store, bundle, old_notes, plan.taken, opts, &mut report)?;

    validate(&*store).map_err(MergeError::Validation)?;

    info!(
        incoming = bundle.records.len(),
        appended = report.appended,
        skipped = report.skipped,
        ignored = report.ignored_ids.len(),
        renamed = report.renamed.len(),
        files = report.files_written,
        "merged bundle"
    );
    Ok(report)
}

fn reserved_present(old_notes: &NoteMap, reserved: &[String]) -> Vec<String> {
    let by_name = notes_by_name(old_notes);
    reserved
        .iter()
        .filter(|name| by_name.contains_key(name.as_str()))
        .cloned()
        .collect()
}

#[derive(Debug, Default)]
struct CollisionPlan {
    ignored: BTreeSet<String>,
    renamed: BTreeMap<String, String>,
    /// Live names of both logs plus every fresh name handed out.
    taken: HashSet<String>,
}

/// Steps 4 and 5: decide, per name collision, whether to ignore or rename.
fn plan_collisions<S: RecordStore + ?Sized>(
    store: &S,
    bundle: &Bundle,
    old_notes: &NoteMap,
    new_notes: &NoteMap,
) -> Result<CollisionPlan, MergeError> {
    let old_by_name = notes_by_name(old_notes);
    let mut plan = CollisionPlan {
        taken: live_notes(old_notes)
            .chain(live_notes(new_notes))
            .map(|n| n.name.clone())
            .collect(),
        ..CollisionPlan::default()
    };

    for new in live_notes(new_notes) {
        if old_notes.contains_key(&new.id) {
            continue;
        }
        let Some(old) = old_by_name.get(new.name.as_str()) else {
            continue;
        };

        let old_bytes = match old.current_version() {
            Some(ver) => match last_version_record(store.records(), ver) {
                Some(rec) => store.read_record(rec)?,
                None => Vec::new(),
            },
            None => Vec::new(),
        };
        let new_bytes: &[u8] = match new.current_version() {
            Some(ver) => match last_version_record(&bundle.records, ver) {
                Some(rec) => bundle.content(rec)?,
                None => &[],
            },
            None => &[],
        };

        if old_bytes == new_bytes {
            debug!(id = %new.id, existing = %old.id, name = %new.name, "incoming note duplicates existing note");
            plan.ignored.insert(new.id.clone());
        } else {
            let fresh = unique_name(&new.name, &plan.taken);
            info!(id = %new.id, from = %new.name, to = %fresh, "renaming colliding incoming note");
            plan.taken.insert(fresh.clone());
            plan.renamed.insert(new.id.clone(), fresh);
        }
    }
    Ok(plan)
}

/// First of `base-0`, `base-1`, ... not in `taken`.
fn unique_name(base: &str, taken: &HashSet<String>) -> String {
    (0u64..)
        .map(|i| format!("{base}-{i}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| format!("{base}-{}", new_note_id()))
}

/// The name an incoming create or `note-meta` for `id` is stored under.
///
/// A name still held by another live note in `running` never goes into
/// the log: the note keeps its planned or current name, or gets a fresh one.
fn replay_name(
    running: &NoteMap,
    id: &str,
    incoming: &str,
    taken: &mut HashSet<String>,
    report: &mut MergeReport,
) -> String {
    if let Some(name) = report.renamed.get(id) {
        return name.clone();
    }
    let clashes = |name: &str| live_notes(running).any(|n| n.name == name && n.id != id);
    if incoming.is_empty() || !clashes(incoming) {
        return incoming.to_string();
    }
    let current = running
        .get(id)
        .map(|n| n.name.as_str())
        .filter(|&name| !name.is_empty() && !clashes(name));
    if let Some(current) = current {
        debug!(id, incoming, kept = current, "incoming name is taken; keeping current name");
        return current.to_string();
    }

    taken.extend(live_notes(running).map(|n| n.name.clone()));
    let fresh = unique_name(incoming, taken);
    info!(id, from = incoming, to = %fresh, "renaming note whose name collides during replay");
    taken.insert(fresh.clone());
    report.renamed.insert(id.to_string(), fresh.clone());
    fresh
}

/// Why an incoming record was not appended.
#[derive(Debug, Clone, Copy)]
enum Skip {
    AlreadyInLog,
    Ignored,
    NoteExists,
    NoteNotLive,
}

/// Step 6: replay incoming records against a running projection.
fn replay<S: RecordStore + ?Sized>(
    store: &mut S,
    bundle: &Bundle,
    mut running: NoteMap,
    mut taken: HashSet<String>,
    opts: &MergeOptions,
    report: &mut MergeReport,
) -> Result<(), MergeError> {
    let existing: HashSet<(String, String, i64)> = store
        .records()
        .iter()
        .map(|r| (r.kind.to_string(), r.meta.clone(), r.timestamp_ms))
        .collect();
    let is_live = |notes: &NoteMap, id: &str| notes.get(id).is_some_and(|n| !n.is_deleted);

    for (index, rec) in bundle.records.iter().enumerate() {
        let meta_err = |source| MergeError::Meta {
            index,
            record: rec.to_string(),
            source,
        };

        if rec.kind != RecordKind::WriteFile
            && existing.contains(&(rec.kind.to_string(), rec.meta.clone(), rec.timestamp_ms))
        {
            skip(report, index, rec, Skip::AlreadyInLog);
            continue;
        }

        let meta = match &rec.kind {
            RecordKind::CreateNote => {
                let create = CreateMeta::parse(&rec.meta).map_err(meta_err)?;
                if report.ignored_ids.contains(&create.id) {
                    skip(report, index, rec, Skip::Ignored);
                    continue;
                }
                if running.contains_key(&create.id) {
                    skip(report, index, rec, Skip::NoteExists);
                    continue;
                }
                let name = replay_name(&running, &create.id, &create.name, &mut taken, report);
                if name == create.name {
                    rec.meta.clone()
                } else {
                    CreateMeta {
                        id: create.id,
                        name,
                    }
                    .encode()
                }
            }
            RecordKind::SetMeta => {
                let meta = NoteMeta::parse(&rec.meta).map_err(meta_err)?;
                if report.ignored_ids.contains(&meta.id) {
                    skip(report, index, rec, Skip::Ignored);
                    continue;
                }
                if !is_live(&running, &meta.id) {
                    if !opts.tolerant {
                        return Err(MergeError::InconsistentLog {
                            index,
                            reason: format!("note-meta for unknown or deleted note '{}'", meta.id),
                            record: rec.to_string(),
                        });
                    }
                    skip(report, index, rec, Skip::NoteNotLive);
                    continue;
                }
                let name = replay_name(&running, &meta.id, &meta.name, &mut taken, report);
                if name == meta.name {
                    rec.meta.clone()
                } else {
                    rename_note_meta(&rec.meta, &name).map_err(meta_err)?
                }
            }
            RecordKind::DeleteNote => {
                let id = rec.meta.trim();
                if report.ignored_ids.contains(id) {
                    skip(report, index, rec, Skip::Ignored);
                    continue;
                }
                if !is_live(&running, id) {
                    skip(report, index, rec, Skip::NoteNotLive);
                    continue;
                }
                rec.meta.clone()
            }
            RecordKind::PutContent | RecordKind::PutContentEncrypted => {
                let content = ContentMeta::parse(&rec.meta).map_err(meta_err)?;
                if report.ignored_ids.contains(&content.note_id) {
                    skip(report, index, rec, Skip::Ignored);
                    continue;
                }
                if !is_live(&running, &content.note_id) {
                    skip(report, index, rec, Skip::NoteNotLive);
                    continue;
                }
                rec.meta.clone()
            }
            RecordKind::WriteFile => {
                let bytes = bundle.content(rec)?;
                store.overwrite_record_with_timestamp(
                    rec.kind.clone(),
                    &rec.meta,
                    bytes,
                    rec.timestamp_ms,
                )?;
                report.appended += 1;
                report.files_written += 1;
                continue;
            }
            RecordKind::Unknown(token) => {
                warn!(index, kind = %token, "aborting merge on unknown record kind");
                return Err(MergeError::UnknownKind {
                    index,
                    kind: token.clone(),
                    record: rec.to_string(),
                });
            }
        };

        if meta != rec.meta
            && existing.contains(&(rec.kind.to_string(), meta.clone(), rec.timestamp_ms))
        {
            skip(report, index, rec, Skip::AlreadyInLog);
            continue;
        }

        let bytes = bundle.content(rec)?;
        let appended =
            store.append_record_with_timestamp(rec.kind.clone(), &meta, bytes, rec.timestamp_ms)?;
        report.appended += 1;
        running = apply_record(running, index, &appended, ProjectionMode::Strict)
            .map_err(|source| MergeError::Replay { index, source })?;
    }
    Ok(())
}

fn skip(report: &mut MergeReport, index: usize, rec: &Record, reason: Skip) {
    debug!(index, kind = %rec.kind, meta = %rec.meta, ?reason, "skipping bundle record");
    report.skipped += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;

    /// Build a bundle the way a client would: by appending to its own log.
    fn client_bundle(build: impl FnOnce(&mut MemStore)) -> Bundle {
        let mut client = MemStore::new();
        build(&mut client);
        Bundle::from_store(&client).expect("export")
    }

    fn create(store: &mut MemStore, id: &str, name: &str, ts: i64) {
        store
            .append_record_with_timestamp(RecordKind::CreateNote, &format!("{id}:{name}"), &[], ts)
            .expect("create");
    }

    fn put(store: &mut MemStore, ver: &str, content: &[u8], ts: i64) {
        store
            .append_record_with_timestamp(RecordKind::PutContent, ver, content, ts)
            .expect("put");
    }

    #[test]
    fn unique_name_skips_taken_suffixes() {
        let taken: HashSet<String> = ["a", "a-0", "a-1"].iter().map(ToString::to_string).collect();
        assert_eq!(unique_name("a", &taken), "a-2");
        assert_eq!(unique_name("b", &taken), "b-0");
    }

    #[test]
    fn merges_into_empty_log() {
        let bundle = client_bundle(|c| {
            create(c, "c1", "todo", 100);
            put(c, "c1:v00001", b"buy milk", 101);
        });
        let mut server = MemStore::new();
        let report = merge(&mut server, &bundle, &MergeOptions::default()).expect("merge");
        assert_eq!(report.appended, 2);
        assert_eq!(report.skipped, 0);

        let notes = project(server.records(), ProjectionMode::Strict).expect("project");
        assert_eq!(notes["c1"].name, "todo");
        let rec = &server.records()[1];
        assert_eq!(server.read_record(rec).expect("read"), b"buy milk");
    }

    #[test]
    fn rename_is_applied_to_later_set_meta() {
        let mut server = MemStore::new();
        create(&mut server, "s1", "inbox", 1);
        put(&mut server, "s1:aaaaaa", b"server", 2);

        let bundle = client_bundle(|c| {
            create(c, "c1", "inbox", 10);
            put(c, "c1:bbbbbb", b"client", 11);
            c.append_record_with_timestamp(
                RecordKind::SetMeta,
                r#"{"id":"c1","name":"inbox","isStarred":true}"#,
                &[],
                12,
            )
            .expect("meta");
        });

        let report = merge(&mut server, &bundle, &MergeOptions::default()).expect("merge");
        assert_eq!(report.renamed["c1"], "inbox-0");

        let notes = project(server.records(), ProjectionMode::Strict).expect("project");
        assert_eq!(notes["c1"].name, "inbox-0");
        assert!(notes["c1"].is_starred);
        assert_eq!(notes["s1"].name, "inbox");
    }

    #[test]
    fn renamed_note_stays_renamed_when_bundle_is_uploaded_again() {
        let mut server = MemStore::new();
        create(&mut server, "s1", "inbox", 1);
        put(&mut server, "s1:aaaaaa", b"server", 2);

        let bundle = client_bundle(|c| {
            create(c, "c1", "inbox", 10);
            put(c, "c1:bbbbbb", b"client", 11);
            c.append_record_with_timestamp(
                RecordKind::SetMeta,
                r#"{"id":"c1","name":"inbox","isStarred":true}"#,
                &[],
                12,
            )
            .expect("meta");
        });

        merge(&mut server, &bundle, &MergeOptions::default()).expect("first merge");
        let after_first = server.records().len();
        let again = merge(&mut server, &bundle, &MergeOptions::default()).expect("second merge");
        assert_eq!(again.appended, 0);
        assert_eq!(again.skipped, 3);
        assert_eq!(server.records().len(), after_first);

        let notes = project(server.records(), ProjectionMode::Strict).expect("project");
        assert_eq!(notes["c1"].name, "inbox-0");
        assert_eq!(notes["s1"].name, "inbox");
    }

    #[test]
    fn set_meta_onto_a_taken_name_keeps_current_name() {
        let mut server = MemStore::new();
        create(&mut server, "s1", "inbox", 1);
        create(&mut server, "s2", "notes", 2);

        let bundle = client_bundle(|c| {
            create(c, "s2", "notes", 2);
            c.append_record_with_timestamp(
                RecordKind::SetMeta,
                r#"{"id":"s2","name":"inbox"}"#,
                &[],
                20,
            )
            .expect("meta");
        });

        let report = merge(&mut server, &bundle, &MergeOptions::default()).expect("merge");
        assert_eq!(report.appended, 1);
        assert!(report.renamed.is_empty());
        let notes = project(server.records(), ProjectionMode::Strict).expect("project");
        assert_eq!(notes["s2"].name, "notes");
        assert_eq!(notes["s1"].name, "inbox");
    }

    #[test]
    fn rename_keeps_meta_fields_this_build_does_not_know() {
        let mut server = MemStore::new();
        create(&mut server, "s1", "inbox", 1);
        put(&mut server, "s1:aaaaaa", b"server", 2);

        let bundle = client_bundle(|c| {
            create(c, "c1", "inbox", 10);
            put(c, "c1:bbbbbb", b"client", 11);
            c.append_record_with_timestamp(
                RecordKind::SetMeta,
                r#"{"id":"c1","name":"inbox","pinned":true,"color":"teal"}"#,
                &[],
                12,
            )
            .expect("meta");
        });

        merge(&mut server, &bundle, &MergeOptions::default()).expect("merge");
        let rec = server
            .records()
            .iter()
            .find(|r| r.kind == RecordKind::SetMeta)
            .expect("meta record");
        let value: serde_json::Value = serde_json::from_str(&rec.meta).expect("json");
        assert_eq!(value["name"], "inbox-0");
        assert_eq!(value["pinned"], true);
        assert_eq!(value["color"], "teal");
    }

    #[test]
    fn strict_set_meta_for_unknown_note_fails_tolerant_skips() {
        let bundle = client_bundle(|c| {
            create(c, "c1", "x", 1);
        });
        let mut bundle = bundle;
        bundle.records.push(Record::new(
            RecordKind::SetMeta,
            r#"{"id":"ghost","name":"y"}"#,
            2,
        ));

        let mut strict_server = MemStore::new();
        let strict = MergeOptions {
            tolerant: false,
            ..MergeOptions::default()
        };
        let err = merge(&mut strict_server, &bundle, &strict).expect_err("must fail");
        assert!(matches!(err, MergeError::InconsistentLog { index: 1, .. }));
        // The create landed before the failure.
        assert_eq!(strict_server.records().len(), 1);

        let mut tolerant_server = MemStore::new();
        let report = merge(&mut tolerant_server, &bundle, &MergeOptions::default())
            .expect("tolerant merge");
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn unknown_kind_aborts_replay() {
        let mut bundle = client_bundle(|c| create(c, "c1", "x", 1));
        bundle
            .records
            .push(Record::new(RecordKind::Unknown("note-pin".into()), "c1", 2));
        let mut server = MemStore::new();
        let err = merge(&mut server, &bundle, &MergeOptions::default()).expect_err("must fail");
        assert_eq!(err.code(), ErrorCode::UnknownRecordKind);
    }

    #[test]
    fn out_of_range_bundle_writes_nothing() {
        let mut bundle = client_bundle(|c| {
            create(c, "c1", "x", 1);
            put(c, "c1:v1", b"abc", 2);
        });
        bundle.records[1].size = 99;
        let mut server = MemStore::new();
        let err = merge(&mut server, &bundle, &MergeOptions::default()).expect_err("must fail");
        assert_eq!(err.code(), ErrorCode::MalformedBundle);
        assert!(server.records().is_empty());
    }

    #[test]
    fn corrupt_existing_log_is_rejected() {
        let mut server = MemStore::new();
        put(&mut server, "ghost:v1", b"x", 1);
        let bundle = client_bundle(|c| create(c, "c1", "x", 2));
        let err = merge(&mut server, &bundle, &MergeOptions::default()).expect_err("must fail");
        assert!(matches!(err, MergeError::ExistingLog(_)));
    }

    #[test]
    fn write_file_is_always_applied() {
        let bundle = client_bundle(|c| {
            c.overwrite_record_with_timestamp(
                RecordKind::WriteFile,
                r#"{"name":"settings.json"}"#,
                b"{\"theme\":\"dark\"}",
                7,
            )
            .expect("file");
        });
        let mut server = MemStore::new();
        merge(&mut server, &bundle, &MergeOptions::default()).expect("first");
        let report = merge(&mut server, &bundle, &MergeOptions::default()).expect("second");
        assert_eq!(report.files_written, 1);
        assert!(server.records()[0].overwritten);
        let last = server.records().last().expect("record");
        assert_eq!(server.read_record(last).expect("read"), b"{\"theme\":\"dark\"}");
    }

    #[test]
    fn reserved_names_are_reported() {
        let mut server = MemStore::new();
        create(&mut server, "s1", "scratch", 1);
        create(&mut server, "s2", "daily journal", 2);
        let report = merge(&mut server, &Bundle::default(), &MergeOptions::default())
            .expect("merge");
        assert_eq!(report.reserved_present, vec!["scratch", "daily journal"]);
    }
}
