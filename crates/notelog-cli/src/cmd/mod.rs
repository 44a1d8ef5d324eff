pub mod files;
pub mod log;
pub mod merge;
pub mod notes;

use std::io::Read;
use std::path::Path;

use anyhow::Context;

/// Bytes of `path`, or all of stdin when `path` is `None`.
pub fn read_input(path: Option<&Path>) -> anyhow::Result<Vec<u8>> {
    match path {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
        }
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}
