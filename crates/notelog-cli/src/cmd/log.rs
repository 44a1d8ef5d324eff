//! Whole-log commands: `validate`, `export`, `provision`.

use anyhow::Context;
use clap::Args;
use notelog_core::bundle::{AuxFile, Bundle};
use notelog_core::config::OutputFormat;
use notelog_core::query::ensure_default_notes;
use notelog_core::store::RecordStore;
use notelog_core::tenant::{Tenant, TenantRegistry};
use notelog_core::validate::validate;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::output::{pretty_kv, render};

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Destination zip file.
    pub out: PathBuf,
}

#[derive(Debug, Serialize)]
struct LogSummary {
    tenant: String,
    records: usize,
    data_bytes: u64,
}

pub fn run_validate(tenant: &Tenant, output: OutputFormat) -> anyhow::Result<()> {
    let summary = tenant.with_store(|store| {
        validate(&*store).map(|()| LogSummary {
            tenant: tenant.id().to_string(),
            records: store.records().len(),
            data_bytes: store.data_size(),
        })
    })??;
    render(output, &summary, |s, w| {
        writeln!(w, "ok: {} records, {} data bytes", s.records, s.data_bytes)
    })
}

#[derive(Debug, Serialize)]
struct Exported {
    path: PathBuf,
    records: usize,
    aux_files: usize,
    bytes: usize,
}

/// Files previously materialized from merged bundles, sorted by name.
fn collect_aux_files(dir: &Path) -> anyhow::Result<Vec<AuxFile>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let bytes = std::fs::read(entry.path())
            .with_context(|| format!("Failed to read {}", entry.path().display()))?;
        files.push(AuxFile {
            name: entry.file_name().to_string_lossy().into_owned(),
            bytes,
        });
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

pub fn run_export(args: &ExportArgs, tenant: &Tenant, output: OutputFormat) -> anyhow::Result<()> {
    let mut bundle = tenant.with_store(|store| Bundle::from_store(&*store))??;
    bundle.aux_files = collect_aux_files(&tenant.aux_files_dir())?;
    let zip = bundle.to_zip()?;
    std::fs::write(&args.out, &zip)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;
    info!(tenant = tenant.id(), records = bundle.records.len(), "exported bundle");

    let out = Exported {
        path: args.out.clone(),
        records: bundle.records.len(),
        aux_files: bundle.aux_files.len(),
        bytes: zip.len(),
    };
    render(output, &out, |o, w| {
        pretty_kv(w, "Bundle", o.path.display().to_string())?;
        pretty_kv(w, "Records", o.records.to_string())?;
        pretty_kv(w, "Size", format!("{} bytes", o.bytes))
    })
}

pub fn run_provision(
    registry: &TenantRegistry,
    tenant: &Tenant,
    output: OutputFormat,
) -> anyhow::Result<()> {
    let names = registry.config().reserved_note_names.as_slice();
    let created = tenant.with_store(|store| ensure_default_notes(store, names))??;
    render(output, &serde_json::json!({ "created": created }), |_, w| {
        writeln!(w, "created {created} default notes")
    })
}
