//! Service accounts that run the cluster software.

use anyhow::Result;
use camino::Utf8PathBuf;
use serde::Deserialize;
use tracing::info;

use super::ensure::{Outcome, ensure};
use super::{SetupContext, files, ssh};
use crate::executor::CommandSpec;

/// Home directory: owner rwx, group and other r-x.
pub const HOME_DIR_MODE: u32 = 0o755;

/// Root's credentials copied into accounts that ask for them.
const ROOT_SSH_FILES: [&str; 2] = ["authorized_keys", "id_rsa"];

fn default_copy_root_keys() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceAccount {
    pub name: String,
    /// Copy root's `authorized_keys` and `id_rsa` into the account.
    #[serde(default = "default_copy_root_keys")]
    pub copy_root_keys: bool,
}

impl ServiceAccount {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            copy_root_keys: default_copy_root_keys(),
        }
    }

    #[must_use]
    pub fn without_root_keys(mut self) -> Self {
        self.copy_root_keys = false;
        self
    }

    /// Home directory on the node (not resolved under the setup root).
    pub fn home(&self) -> Utf8PathBuf {
        Utf8PathBuf::from("/home").join(&self.name)
    }

    fn owner(&self) -> String {
        format!("{0}:{0}", self.name)
    }
}

/// Creates `account` if needed and prepares its home and `.ssh` directory.
///
/// Existence is checked with `getent passwd` first, so an account that is
/// already there is left alone and this can be re-run. The directory
/// layout, ssh config and ownership are (re)applied either way.
pub fn provision_account(ctx: &SetupContext<'_>, account: &ServiceAccount) -> Result<Outcome> {
    let outcome = ensure(
        &format!("user {} exists", account.name),
        || ctx.succeeds(&CommandSpec::new("getent", ["passwd", account.name.as_str()])),
        || {
            info!("creating user {}", account.name);
            ctx.run(&CommandSpec::new("useradd", ["--create-home", account.name.as_str()]))
        },
    )?;

    let home = ctx.path(account.home());
    let ssh_dir = home.join(".ssh");
    files::create_dir(ctx, &home, HOME_DIR_MODE)?;
    files::create_dir(ctx, &ssh_dir, ssh::SSH_DIR_MODE)?;

    if account.copy_root_keys {
        let root_ssh = ctx.path("/root/.ssh");
        for name in ROOT_SSH_FILES {
            files::copy(ctx, &root_ssh.join(name), &ssh_dir.join(name), ssh::SSH_FILE_MODE)?;
        }
    }

    ssh::write_client_config(ctx, &ssh_dir)?;

    let owner = account.owner();
    ctx.run(&CommandSpec::new("chown", [owner.as_str(), home.as_str()]))?;
    ctx.run(&CommandSpec::new("chown", ["-R", owner.as_str(), ssh_dir.as_str()]))?;

    Ok(outcome)
}
