//! Primitive provisioning steps shared by platform implementations.
//!
//! Everything here runs through a [`SetupContext`], which carries the
//! command executor, the filesystem root the setup writes under, the
//! dry-run flag and the profile-supplied [`SetupOptions`]. Steps are
//! strictly sequential; any failure is returned immediately and the caller
//! aborts the remaining sequence.

pub mod account;
pub mod ensure;
pub mod environment;
pub mod fetch;
pub mod files;
pub mod package;
pub mod shadow;
pub mod ssh;

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use tracing::info;

pub use account::ServiceAccount;
pub use ensure::{Outcome, ensure};
pub use package::{PackageManager, Yum};

use crate::executor::{CommandExecutor, CommandSpec, run_checked};

/// Where the artifact tools archive is fetched from by default.
pub const TOOLS_URL_DEFAULT: &str = "http://s3.amazonaws.com/ServEdge_pub/s3sync/s3sync.tar.gz";
/// Local directory that fetched artifacts are staged in by default.
pub const STAGING_DIR_DEFAULT: &str = "/mnt/packages";

/// Environment variables preserved across `sudo` unless the profile says otherwise.
pub const ENV_KEEP_DEFAULT: &[&str] =
    &["JAVA_HOME", "HADOOPDIR", "HADOOP_HOME", "PIGDIR", "PIG_CLASSPATH"];

fn default_staging_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(STAGING_DIR_DEFAULT)
}

fn default_tools_url() -> String {
    TOOLS_URL_DEFAULT.to_string()
}

fn default_service_accounts() -> Vec<ServiceAccount> {
    vec![ServiceAccount::new("hadoop"), ServiceAccount::new("client")]
}

fn default_env_keep() -> Vec<String> {
    ENV_KEEP_DEFAULT.iter().map(|s| s.to_string()).collect()
}

/// Provisioning inputs declared in the profile's `setup` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetupOptions {
    #[serde(default = "default_staging_dir")]
    pub staging_dir: Utf8PathBuf,
    #[serde(default = "default_tools_url")]
    pub tools_url: String,
    #[serde(default = "default_service_accounts")]
    pub service_accounts: Vec<ServiceAccount>,
    /// Variables `sudo` must keep. `JAVA_HOME` is always added since the
    /// setup exports it itself.
    #[serde(default = "default_env_keep")]
    pub env_keep: Vec<String>,
}

impl Default for SetupOptions {
    fn default() -> Self {
        Self {
            staging_dir: default_staging_dir(),
            tools_url: default_tools_url(),
            service_accounts: default_service_accounts(),
            env_keep: default_env_keep(),
        }
    }
}

/// Everything a provisioning step needs to act on the node.
pub struct SetupContext<'a> {
    executor: &'a dyn CommandExecutor,
    root: Utf8PathBuf,
    dry_run: bool,
    options: SetupOptions,
}

impl std::fmt::Debug for SetupContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SetupContext")
            .field("root", &self.root)
            .field("dry_run", &self.dry_run)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<'a> SetupContext<'a> {
    pub fn new(executor: &'a dyn CommandExecutor, options: SetupOptions) -> Self {
        Self {
            executor,
            root: Utf8PathBuf::from("/"),
            dry_run: false,
            options,
        }
    }

    /// Resolves every absolute path the setup touches under `root`.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<Utf8PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn executor(&self) -> &'a dyn CommandExecutor {
        self.executor
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn options(&self) -> &SetupOptions {
        &self.options
    }

    /// Maps an absolute node path (e.g. `/etc/profile`) under the root.
    pub fn path(&self, absolute: impl AsRef<Utf8Path>) -> Utf8PathBuf {
        let absolute = absolute.as_ref();
        match absolute.strip_prefix("/") {
            Ok(relative) => self.root.join(relative),
            Err(_) => self.root.join(absolute),
        }
    }

    /// Staging directory for fetched artifacts, resolved under the root.
    pub fn staging_dir(&self) -> Utf8PathBuf {
        self.path(&self.options.staging_dir)
    }

    /// Runs a command; a non-zero exit is fatal.
    pub fn run(&self, spec: &CommandSpec) -> Result<()> {
        run_checked(self.executor, spec)
    }

    /// Runs a query command and reports whether it exited successfully.
    ///
    /// A non-zero exit is an answer, not an error. Only failing to run the
    /// command at all is returned as `Err`. A dry-run executor reports no
    /// status; the answer is then assumed to be yes and logged as such.
    pub fn succeeds(&self, spec: &CommandSpec) -> Result<bool> {
        let result = self.executor.execute(spec)?;
        if result.status.is_none() {
            info!("dry run: no result for `{}`, assuming it succeeds", spec);
        }
        Ok(result.success())
    }
}

/// Runs one numbered step of an ordered setup sequence.
pub fn step(index: usize, total: usize, name: &str, f: impl FnOnce() -> Result<()>) -> Result<()> {
    info!("step {}/{}: {}", index, total, name);
    f().with_context(|| format!("setup step {}/{} ({}) failed", index, total, name))
}
