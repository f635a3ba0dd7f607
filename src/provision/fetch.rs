//! Retrieval of remote artifacts into the staging directory.

use anyhow::Result;
use camino::Utf8Path;
use tracing::info;

use super::SetupContext;
use crate::executor::{CommandSpec, shell_quote};

/// Name the tools archive is saved under in the staging directory.
pub const TOOLS_ARCHIVE_NAME: &str = "s3sync.tar.gz";

/// Downloads `url` to `dest`.
pub fn download(ctx: &SetupContext<'_>, url: &str, dest: &Utf8Path) -> Result<()> {
    info!("downloading {} to {}", url, dest);
    ctx.run(&CommandSpec::new("wget", ["-q", "-O", dest.as_str(), url]))
}

/// Unpacks a gzipped tarball into `dir`.
pub fn untar(ctx: &SetupContext<'_>, archive: &Utf8Path, dir: &Utf8Path) -> Result<()> {
    ctx.run(&CommandSpec::new("tar", ["-xzf", archive.as_str(), "-C", dir.as_str()]))
}

/// Fetches `key` from `bucket` to `dest` with the installed s3sync tools.
pub fn bucket_get(ctx: &SetupContext<'_>, bucket: &str, key: &str, dest: &Utf8Path) -> Result<()> {
    info!("fetching {}:{} to {}", bucket, key, dest);
    let object = format!("{}:{}", bucket, key);
    ctx.run(&CommandSpec::new("s3cmd.rb", ["get", object.as_str(), dest.as_str()]))
}

/// Fetches and unpacks the artifact tools, then puts them on the PATH.
///
/// Re-running overwrites the previous copy.
pub fn install_artifact_tools(ctx: &SetupContext<'_>) -> Result<()> {
    let staging = ctx.staging_dir();
    ctx.run(&CommandSpec::new("mkdir", ["-p", staging.as_str()]))?;

    let archive = staging.join(TOOLS_ARCHIVE_NAME);
    download(ctx, &ctx.options().tools_url, &archive)?;
    untar(ctx, &archive, &staging)?;

    let scripts = staging.join("s3sync");
    let bin = ctx.path("/usr/bin");
    // The glob stays outside the quotes so the shell expands it.
    ctx.run(&CommandSpec::shell(format!(
        "cp {}/*.rb {}",
        shell_quote(scripts.as_str()),
        shell_quote(bin.as_str())
    )))
}
