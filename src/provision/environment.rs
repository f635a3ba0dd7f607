//! System-wide environment: `JAVA_HOME` in the shell profile and the
//! variables `sudo` preserves.

use super::{SetupContext, files};
use crate::error::NodestrapError;

pub const PROFILE_PATH: &str = "/etc/profile";
pub const SUDOERS_PATH: &str = "/etc/sudoers";
pub const JAVA_HOME_VAR: &str = "JAVA_HOME";

/// The line appended to the shell profile.
pub fn java_home_export(java_home: &str) -> String {
    format!("\nexport {}={}\n", JAVA_HOME_VAR, java_home)
}

/// `JAVA_HOME` followed by `declared`, without duplicates, in order.
pub fn preserved_vars(declared: &[String]) -> Vec<String> {
    let mut vars = vec![JAVA_HOME_VAR.to_string()];
    for var in declared {
        if !vars.contains(var) {
            vars.push(var.clone());
        }
    }
    vars
}

/// The sudoers directive keeping `vars` across privilege escalation.
pub fn env_keep_directive(vars: &[String]) -> String {
    format!("\nDefaults  env_keep += \"{}\"\n", vars.join(" "))
}

/// Appends the `JAVA_HOME` export to the system profile.
pub fn export_java_home(ctx: &SetupContext<'_>, java_home: &str) -> Result<(), NodestrapError> {
    files::append(ctx, &ctx.path(PROFILE_PATH), &java_home_export(java_home))
}

/// Appends the env_keep directive built from the profile's `env_keep` list.
pub fn preserve_env_for_sudo(ctx: &SetupContext<'_>) -> Result<(), NodestrapError> {
    let vars = preserved_vars(&ctx.options().env_keep);
    tracing::info!("preserving across sudo: {}", vars.join(" "));
    files::append(ctx, &ctx.path(SUDOERS_PATH), &env_keep_directive(&vars))
}
