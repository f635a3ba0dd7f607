//! Profile and property-file loading.
//!
//! A profile describes one node: which platform it is, the seed of the
//! property store, and the `setup` options. A property file feeds the
//! `conf` command that writes a Hadoop XML configuration.

use std::collections::HashSet;
use std::fs;
use std::sync::LazyLock;

use camino::Utf8Path;
use regex::Regex;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::NodestrapError;
use crate::hadoop_conf::{self, FinalKeys, PropertyMapping};
use crate::platform::{OsFamily, PlatformDescriptor};
use crate::properties::Properties;
use crate::provision::SetupOptions;

static ACCOUNT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_][a-z0-9_-]*$").expect("valid account name regex"));

static ENV_VAR_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid env var regex"));

fn load_yaml<T: DeserializeOwned>(path: &Utf8Path) -> Result<T, NodestrapError> {
    let content = fs::read_to_string(path)
        .map_err(|e| NodestrapError::io(format!("failed to read {}", path), e))?;
    serde_yaml::from_str(&content)
        .map_err(|e| NodestrapError::Config(format!("failed to parse {}: {}", path, e)))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    pub platform: OsFamily,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub setup: SetupOptions,
}

impl Profile {
    /// Resolves the platform descriptor from `platform` and the `arch` property.
    pub fn descriptor(&self) -> Result<PlatformDescriptor, NodestrapError> {
        PlatformDescriptor::resolve(self.platform, &self.properties)
    }

    /// Checks everything that can be checked before touching the node.
    pub fn validate(&self) -> Result<(), NodestrapError> {
        self.descriptor()?;

        let setup = &self.setup;
        if !setup.staging_dir.is_absolute() {
            return Err(NodestrapError::Validation(format!(
                "setup.staging_dir must be an absolute path: {}",
                setup.staging_dir
            )));
        }

        Url::parse(&setup.tools_url).map_err(|e| {
            NodestrapError::Validation(format!("setup.tools_url '{}' is not a valid URL: {}", setup.tools_url, e))
        })?;

        let mut seen = HashSet::new();
        for account in &setup.service_accounts {
            if !ACCOUNT_NAME.is_match(&account.name) {
                return Err(NodestrapError::Validation(format!(
                    "invalid service account name '{}'",
                    account.name
                )));
            }
            if !seen.insert(account.name.as_str()) {
                return Err(NodestrapError::Validation(format!(
                    "duplicate service account name '{}'",
                    account.name
                )));
            }
        }

        if let Some(var) = setup.env_keep.iter().find(|v| !ENV_VAR_NAME.is_match(v)) {
            return Err(NodestrapError::Validation(format!(
                "invalid environment variable name in setup.env_keep: '{}'",
                var
            )));
        }

        Ok(())
    }
}

/// Loads a profile from a YAML file.
pub fn load_profile(path: &Utf8Path) -> Result<Profile, NodestrapError> {
    load_yaml(path)
}

/// Input of the `conf` command.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyFile {
    #[serde(default)]
    pub properties: PropertyMapping,
    #[serde(default, rename = "final")]
    pub final_keys: FinalKeys,
}

impl PropertyFile {
    /// Rejects final keys without a property. Every value must be written
    /// exactly as spelled and must not break the markup.
    pub fn validate(&self) -> Result<(), NodestrapError> {
        if let Some(key) = self
            .final_keys
            .iter()
            .find(|k| !self.properties.contains_key(*k))
        {
            return Err(NodestrapError::Validation(format!(
                "final key '{}' has no property",
                key
            )));
        }
        for (name, value) in &self.properties {
            if !value.is_verbatim() {
                return Err(NodestrapError::Validation(format!(
                    "property '{}' is a floating-point number ({}); quote it so it is written as typed",
                    name, value
                )));
            }
            if let Some(c) = hadoop_conf::unsafe_char(name).or_else(|| hadoop_conf::unsafe_char(&value.to_string())) {
                return Err(NodestrapError::Validation(format!(
                    "property '{}' contains '{}', which would corrupt the XML output",
                    name, c
                )));
            }
        }
        Ok(())
    }
}

/// Loads a property file from YAML.
pub fn load_property_file(path: &Utf8Path) -> Result<PropertyFile, NodestrapError> {
    load_yaml(path)
}
