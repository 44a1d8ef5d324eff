//! `notelog merge`: replay an uploaded bundle into a tenant's log.

use anyhow::Context;
use clap::Args;
use notelog_core::bundle::Bundle;
use notelog_core::config::OutputFormat;
use notelog_core::merge::{MergeReport, merge};
use notelog_core::tenant::{Tenant, TenantRegistry};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

use crate::output::{pretty_kv, render};

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Zip bundle holding index.txt and data.bin.
    pub bundle: PathBuf,

    /// Reject metadata records for unknown notes instead of skipping them.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Serialize)]
struct MergeOutput {
    tenant: String,
    #[serde(flatten)]
    report: MergeReport,
    aux_files: Vec<PathBuf>,
}

pub fn run_merge(
    args: &MergeArgs,
    registry: &TenantRegistry,
    tenant: &Tenant,
    output: OutputFormat,
) -> anyhow::Result<()> {
    let zip = std::fs::read(&args.bundle)
        .with_context(|| format!("Failed to read bundle {}", args.bundle.display()))?;
    let bundle = Bundle::from_zip(&zip)?;

    let mut opts = registry.config().merge_options();
    if args.strict {
        opts.tolerant = false;
    }
    let report = tenant.with_store(|store| merge(store, &bundle, &opts))??;
    let aux_files = bundle.materialize_aux_files(&tenant.aux_files_dir())?;
    info!(
        tenant = tenant.id(),
        appended = report.appended,
        aux_files = aux_files.len(),
        "bundle merged"
    );

    let out = MergeOutput {
        tenant: tenant.id().to_string(),
        report,
        aux_files,
    };
    render(output, &out, |o, w| {
        pretty_kv(w, "Tenant", &o.tenant)?;
        pretty_kv(w, "Appended", o.report.appended.to_string())?;
        pretty_kv(w, "Skipped", o.report.skipped.to_string())?;
        pretty_kv(w, "Files", o.report.files_written.to_string())?;
        for id in &o.report.ignored_ids {
            writeln!(w, "ignored {id} (same name and content)")?;
        }
        for (id, name) in &o.report.renamed {
            writeln!(w, "renamed {id} -> {name}")?;
        }
        for path in &o.aux_files {
            writeln!(w, "wrote {}", path.display())?;
        }
        Ok(())
    })
}
