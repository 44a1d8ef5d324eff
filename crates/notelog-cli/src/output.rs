//! Shared output layer: every command renders through [`render`] so that
//! `--json` output stays stable while human output can vary per command.

use notelog_core::bundle::BundleError;
use notelog_core::config::OutputFormat;
use notelog_core::error::ErrorCode;
use notelog_core::merge::MergeError;
use notelog_core::project::ProjectError;
use notelog_core::query::QueryError;
use notelog_core::store::StoreError;
use notelog_core::tenant::TenantError;
use notelog_core::validate::ValidationError;
use serde::Serialize;
use std::io::{self, Write};

/// Write a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<14} {}", format!("{key}:"), value.as_ref())
}

/// Render a serializable value to stdout in the requested format.
///
/// JSON mode serializes `value`; pretty and text modes call `human_fn`.
pub fn render<T: Serialize>(
    mode: OutputFormat,
    value: &T,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputFormat::Pretty | OutputFormat::Text => human_fn(value, &mut out)?,
    }
    Ok(())
}

/// Raw bytes to stdout, untouched by the output mode.
pub fn write_raw(bytes: &[u8]) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    out.write_all(bytes)?;
    out.flush()
}

/// A structured error with optional hint and error code.
#[derive(Debug, Serialize)]
pub struct CliError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl From<&anyhow::Error> for CliError {
    fn from(err: &anyhow::Error) -> Self {
        let code = error_code_of(err);
        Self {
            message: format!("{err:#}"),
            hint: code.and_then(ErrorCode::hint).map(ToString::to_string),
            error_code: code.map(|c| c.code().to_string()),
        }
    }
}

/// First library error code found in the cause chain.
pub fn error_code_of(err: &anyhow::Error) -> Option<ErrorCode> {
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<QueryError>() {
            return Some(e.code());
        }
        if let Some(e) = cause.downcast_ref::<MergeError>() {
            return Some(e.code());
        }
        if let Some(e) = cause.downcast_ref::<ValidationError>() {
            return Some(e.code());
        }
        if let Some(e) = cause.downcast_ref::<BundleError>() {
            return Some(e.code());
        }
        if let Some(e) = cause.downcast_ref::<ProjectError>() {
            return Some(e.code());
        }
        if let Some(e) = cause.downcast_ref::<StoreError>() {
            return Some(e.code());
        }
        cause.downcast_ref::<TenantError>().map(TenantError::code)
    })
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputFormat, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    if mode.is_json() {
        serde_json::to_writer_pretty(&mut out, &serde_json::json!({ "error": error }))?;
        writeln!(out)?;
    } else {
        match error.error_code {
            Some(ref code) => writeln!(out, "error[{code}]: {}", error.message)?,
            None => writeln!(out, "error: {}", error.message)?,
        }
        if let Some(ref hint) = error.hint {
            writeln!(out, "  hint: {hint}")?;
        }
    }
    Ok(())
}
