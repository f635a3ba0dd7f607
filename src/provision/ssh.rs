//! SSH client configuration for unattended access between cluster nodes.

use camino::Utf8Path;

use super::{SetupContext, files};
use crate::error::NodestrapError;

/// Client config that never prompts: no host key checks, no password or
/// GSSAPI auth, keepalives on.
pub const SSH_CLIENT_CONFIG: &str = "
Host *
  StrictHostKeyChecking no
  PasswordAuthentication no
  GSSAPIAuthentication no
  NoHostAuthenticationForLocalhost yes
  ServerAliveInterval 60
  ServerAliveCountMax 60
";

/// Owner-only access for `~/.ssh`.
pub const SSH_DIR_MODE: u32 = 0o700;
/// Owner read/write for files inside `~/.ssh`.
pub const SSH_FILE_MODE: u32 = 0o600;

/// Writes `config` into `ssh_dir` (already resolved under the root),
/// creating the directory if needed.
pub fn write_client_config(ctx: &SetupContext<'_>, ssh_dir: &Utf8Path) -> Result<(), NodestrapError> {
    files::create_dir(ctx, ssh_dir, SSH_DIR_MODE)?;
    files::write(ctx, &ssh_dir.join("config"), SSH_CLIENT_CONFIG, SSH_FILE_MODE)
}
