//! Note commands: listing, content reads, and single-record mutations.

use anyhow::{Context, bail};
use clap::Args;
use notelog_core::config::OutputFormat;
use notelog_core::project::Note;
use notelog_core::query::{
    QueryError, create_note, delete_note, get_content, get_contents, get_note, list_notes,
    put_content, set_note_meta,
};
use notelog_core::record::NoteMeta;
use notelog_core::tenant::Tenant;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

use super::read_input;
use crate::output::{pretty_kv, render, write_raw};

#[derive(Args, Debug)]
pub struct NotesArgs {
    /// Change id from a previous listing; prints nothing new if the log is unchanged.
    #[arg(long, default_value_t = 0)]
    pub since: usize,
}

#[derive(Args, Debug)]
pub struct ContentArgs {
    /// Version ids to fetch.
    #[arg(required = true, value_name = "VERSION_ID")]
    pub versions: Vec<String>,

    /// Write to this file instead of stdout.
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Name of the new note.
    pub name: String,
}

#[derive(Args, Debug)]
pub struct MetaArgs {
    /// Note id.
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub starred: Option<bool>,

    #[arg(long)]
    pub archived: Option<bool>,

    /// Alt shortcut key; an empty string clears it.
    #[arg(long)]
    pub shortcut: Option<String>,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Note id.
    pub id: String,
}

#[derive(Args, Debug)]
pub struct PutArgs {
    /// Note id.
    pub id: String,

    /// Read content from this file (default: stdin).
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,

    /// Mark the content as client-side encrypted.
    #[arg(long)]
    pub encrypted: bool,
}

#[derive(Serialize)]
struct Written<'a> {
    path: &'a PathBuf,
    bytes: usize,
}

fn render_note(output: OutputFormat, note: &Note) -> anyhow::Result<()> {
    render(output, note, |n, w| {
        pretty_kv(w, "ID", &n.id)?;
        pretty_kv(w, "Name", &n.name)?;
        if n.is_starred {
            pretty_kv(w, "Starred", "yes")?;
        }
        if n.is_archived {
            pretty_kv(w, "Archived", "yes")?;
        }
        if !n.alt_shortcut.is_empty() {
            pretty_kv(w, "Shortcut", &n.alt_shortcut)?;
        }
        pretty_kv(w, "Versions", n.version_ids.len().to_string())
    })
}

pub fn run_notes(args: &NotesArgs, tenant: &Tenant, output: OutputFormat) -> anyhow::Result<()> {
    let rsp = tenant.with_store(|store| list_notes(&*store, args.since))??;
    render(output, &rsp, |rsp, w| {
        let Some(rsp) = rsp else {
            return writeln!(w, "no changes since {}", args.since);
        };
        for note in &rsp.notes_compact {
            let field = |i: usize| note.get(i).and_then(|v| v.as_str()).unwrap_or_default();
            let versions = note.len().saturating_sub(6);
            writeln!(w, "{}  {}  ({versions} versions)", field(0), field(1))?;
        }
        writeln!(w, "change id: {}", rsp.last_change_id)
    })
}

pub fn run_content(args: &ContentArgs, tenant: &Tenant, output: OutputFormat) -> anyhow::Result<()> {
    let bytes = tenant.with_store(|store| match args.versions.as_slice() {
        [one] => get_content(&*store, one),
        many => get_contents(&*store, many),
    })??;

    match args.out {
        Some(ref path) => {
            std::fs::write(path, &bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            render(
                output,
                &Written {
                    path,
                    bytes: bytes.len(),
                },
                |o, w| writeln!(w, "wrote {} bytes to {}", o.bytes, o.path.display()),
            )
        }
        None => Ok(write_raw(&bytes)?),
    }
}

pub fn run_create(args: &CreateArgs, tenant: &Tenant, output: OutputFormat) -> anyhow::Result<()> {
    let note = tenant.with_store(|store| create_note(store, &args.name))??;
    render_note(output, &note)
}

pub fn run_meta(args: &MetaArgs, tenant: &Tenant, output: OutputFormat) -> anyhow::Result<()> {
    if args.name.is_none()
        && args.starred.is_none()
        && args.archived.is_none()
        && args.shortcut.is_none()
    {
        bail!("nothing to change; pass at least one of --name, --starred, --archived, --shortcut");
    }

    let note = tenant.with_store(|store| -> Result<Note, QueryError> {
        let current = get_note(&*store, &args.id)?;
        let meta = NoteMeta {
            id: current.id,
            name: args.name.clone().unwrap_or(current.name),
            is_archived: args.archived.unwrap_or(current.is_archived),
            is_starred: args.starred.unwrap_or(current.is_starred),
            alt_shortcut: args.shortcut.clone().unwrap_or(current.alt_shortcut),
        };
        set_note_meta(store, &meta)
    })??;
    render_note(output, &note)
}

pub fn run_delete(args: &DeleteArgs, tenant: &Tenant, output: OutputFormat) -> anyhow::Result<()> {
    tenant.with_store(|store| delete_note(store, &args.id))??;
    render(output, &serde_json::json!({ "deleted": args.id }), |_, w| {
        writeln!(w, "deleted {}", args.id)
    })
}

pub fn run_put(args: &PutArgs, tenant: &Tenant, output: OutputFormat) -> anyhow::Result<()> {
    let content = read_input(args.file.as_deref())?;
    let version_id =
        tenant.with_store(|store| put_content(store, &args.id, &content, args.encrypted))??;
    render(
        output,
        &serde_json::json!({ "id": args.id, "versionId": version_id, "bytes": content.len() }),
        |_, w| writeln!(w, "{version_id}"),
    )
}
