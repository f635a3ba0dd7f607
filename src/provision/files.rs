//! File operations used by setup steps.
//!
//! Paths passed in are already resolved under the setup root. In dry-run
//! mode each operation is logged and skipped. Failures carry the target path.

use std::fs::{self, OpenOptions};
use std::io::Write;

use camino::Utf8Path;
use tracing::info;

use super::SetupContext;
use crate::error::NodestrapError;

/// Sets Unix file permissions on the given path.
#[cfg(unix)]
pub fn set_file_mode(path: &Utf8Path, mode: u32) -> Result<(), NodestrapError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|e| NodestrapError::io(format!("failed to set mode {:o} on {}", mode, path), e))
}

#[cfg(not(unix))]
pub fn set_file_mode(_path: &Utf8Path, _mode: u32) -> Result<(), NodestrapError> {
    Ok(())
}

/// Appends `content` to `path`, creating it if missing. Existing content is kept.
pub fn append(ctx: &SetupContext<'_>, path: &Utf8Path, content: &str) -> Result<(), NodestrapError> {
    if ctx.dry_run() {
        info!("dry run: append {} byte(s) to {}", content.len(), path);
        return Ok(());
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| NodestrapError::io(format!("failed to open {} for append", path), e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| NodestrapError::io(format!("failed to append to {}", path), e))?;
    info!("appended to {}", path);
    Ok(())
}

/// Replaces `path` with `content` and applies `mode`.
pub fn write(
    ctx: &SetupContext<'_>,
    path: &Utf8Path,
    content: &str,
    mode: u32,
) -> Result<(), NodestrapError> {
    if ctx.dry_run() {
        info!("dry run: write {} (mode {:o})", path, mode);
        return Ok(());
    }
    fs::write(path, content)
        .map_err(|e| NodestrapError::io(format!("failed to write {}", path), e))?;
    set_file_mode(path, mode)?;
    info!("wrote {}", path);
    Ok(())
}

/// Creates `path` (and parents) and applies `mode` to `path` itself.
pub fn create_dir(ctx: &SetupContext<'_>, path: &Utf8Path, mode: u32) -> Result<(), NodestrapError> {
    if ctx.dry_run() {
        info!("dry run: create directory {} (mode {:o})", path, mode);
        return Ok(());
    }
    fs::create_dir_all(path)
        .map_err(|e| NodestrapError::io(format!("failed to create directory {}", path), e))?;
    set_file_mode(path, mode)
}

/// Copies `from` to `to` and applies `mode` to the copy.
pub fn copy(
    ctx: &SetupContext<'_>,
    from: &Utf8Path,
    to: &Utf8Path,
    mode: u32,
) -> Result<(), NodestrapError> {
    if ctx.dry_run() {
        info!("dry run: copy {} to {} (mode {:o})", from, to, mode);
        return Ok(());
    }
    fs::copy(from, to)
        .map_err(|e| NodestrapError::io(format!("failed to copy {} to {}", from, to), e))?;
    set_file_mode(to, mode)
}
