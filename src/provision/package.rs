//! Package installation and removal through the node's package manager.

use anyhow::Result;
use tracing::info;

use super::ensure::{Outcome, ensure};
use super::SetupContext;
use crate::executor::{CommandSpec, shell_quote};

/// Builds the commands for one package manager.
///
/// Package names passed to `installed_query` and `remove` may be shell glob
/// patterns such as `java-*-icedtea`.
pub trait PackageManager {
    /// Returns the package manager's name (e.g., "yum").
    fn name(&self) -> &'static str;

    /// Non-interactive install of all `packages` in one transaction.
    fn install(&self, packages: &[&str]) -> CommandSpec;

    /// Non-interactive removal of `package`.
    fn remove(&self, package: &str) -> CommandSpec;

    /// A command that exits successfully iff a package matching `package` is installed.
    fn installed_query(&self, package: &str) -> CommandSpec;
}

/// yum on RPM-based systems.
#[derive(Debug, Default, Clone, Copy)]
pub struct Yum;

impl PackageManager for Yum {
    fn name(&self) -> &'static str {
        "yum"
    }

    fn install(&self, packages: &[&str]) -> CommandSpec {
        let mut args = vec!["-y".to_string(), "install".to_string()];
        args.extend(packages.iter().map(|p| p.to_string()));
        CommandSpec::new("yum", args)
    }

    fn remove(&self, package: &str) -> CommandSpec {
        CommandSpec::new("yum", ["-y", "remove", package])
    }

    fn installed_query(&self, package: &str) -> CommandSpec {
        CommandSpec::shell(format!("rpm -qa {} | grep -q .", shell_quote(package)))
    }
}

/// Installs `packages`. Any failure is fatal.
pub fn install_packages(
    ctx: &SetupContext<'_>,
    manager: &dyn PackageManager,
    packages: &[&str],
) -> Result<()> {
    if packages.is_empty() {
        return Ok(());
    }
    info!("installing with {}: {}", manager.name(), packages.join(" "));
    ctx.run(&manager.install(packages))
}

/// Removes each package in `packages` that is installed.
///
/// Packages that are not installed are skipped, so removal can be re-run.
pub fn remove_packages(
    ctx: &SetupContext<'_>,
    manager: &dyn PackageManager,
    packages: &[&str],
) -> Result<Vec<Outcome>> {
    packages
        .iter()
        .map(|package| {
            ensure(
                &format!("package {} absent", package),
                || Ok(!ctx.succeeds(&manager.installed_query(package))?),
                || {
                    info!("removing {}", package);
                    ctx.run(&manager.remove(package))
                },
            )
        })
        .collect()
}
