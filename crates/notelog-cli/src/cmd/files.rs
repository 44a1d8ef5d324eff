//! Auxiliary file commands (`write-file`, `read-file`, `files`).

use clap::Args;
use notelog_core::config::OutputFormat;
use notelog_core::query::{list_files, read_file, write_file};
use notelog_core::tenant::Tenant;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

use super::read_input;
use crate::output::{render, write_raw};

#[derive(Args, Debug)]
pub struct WriteFileArgs {
    /// File name within the tenant's log.
    pub name: String,

    /// Read content from this file (default: stdin).
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ReadFileArgs {
    /// File name within the tenant's log.
    pub name: String,
}

#[derive(Debug, Serialize)]
struct FileWritten<'a> {
    name: &'a str,
    bytes: u64,
    offset: u64,
}

pub fn run_write_file(
    args: &WriteFileArgs,
    tenant: &Tenant,
    output: OutputFormat,
) -> anyhow::Result<()> {
    let content = read_input(args.file.as_deref())?;
    let rec = tenant.with_store(|store| write_file(store, &args.name, &content))??;
    let out = FileWritten {
        name: &args.name,
        bytes: rec.size,
        offset: rec.offset,
    };
    render(output, &out, |o, w| {
        writeln!(w, "wrote {} ({} bytes)", o.name, o.bytes)
    })
}

pub fn run_read_file(args: &ReadFileArgs, tenant: &Tenant) -> anyhow::Result<()> {
    let bytes = tenant.with_store(|store| read_file(&*store, &args.name))??;
    Ok(write_raw(&bytes)?)
}

pub fn run_files(tenant: &Tenant, output: OutputFormat) -> anyhow::Result<()> {
    let names = tenant.with_store(|store| list_files(&*store))?;
    render(output, &names, |names, w| {
        for name in names {
            writeln!(w, "{name}")?;
        }
        Ok(())
    })
}
