//! Key/value property store shared by the driver and the platform setups.
//!
//! The profile seeds the store; platforms read their inputs from it
//! (architecture selector, package bucket) and record derived values back
//! into it (the JDK location) during `init_properties`.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::NodestrapError;
use crate::hadoop_conf::PropertyValue;

/// Architecture selector (`i386` or `x86_64`).
pub const ARCH_KEY: &str = "arch";
/// Bucket holding platform packages such as the JDK installer.
pub const PACKAGE_BUCKET_KEY: &str = "package.bucket";
/// Used when the profile does not name a bucket.
pub const PACKAGE_BUCKET_DEFAULT: &str = "hadoop-node-packages";
/// Home directory of the installed JDK, written by `init_properties`.
pub const JAVA_HOME_KEY: &str = "java.home";

/// String-valued store. Scalars in YAML (`dfs.port: 8020`) are coerced to
/// their text; unquoted floats are refused since their spelling is lost.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BTreeMap<String, PropertyValue>")]
pub struct Properties {
    values: BTreeMap<String, String>,
}

impl TryFrom<BTreeMap<String, PropertyValue>> for Properties {
    type Error = String;

    fn try_from(raw: BTreeMap<String, PropertyValue>) -> Result<Self, Self::Error> {
        let mut values = BTreeMap::new();
        for (key, value) in raw {
            if !value.is_verbatim() {
                return Err(format!(
                    "property '{}' is a floating-point number ({}); quote it so it is kept as typed",
                    key, value
                ));
            }
            values.insert(key, value.to_string());
        }
        Ok(Self { values })
    }
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Returns the value for `key` or [`NodestrapError::MissingProperty`].
    pub fn require(&self, key: &str) -> Result<&str, NodestrapError> {
        self.get(key)
            .ok_or_else(|| NodestrapError::MissingProperty(key.to_string()))
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

}

impl<K, V> FromIterator<(K, V)> for Properties
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
