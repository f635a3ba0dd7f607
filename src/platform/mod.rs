//! Platform setup capability.
//!
//! This module provides the [`PlatformSetup`] trait and one implementation
//! per supported OS family. A [`PlatformDescriptor`] (OS family plus
//! architecture) selects the implementation through [`Platform::select`].
//!
//! Adding a platform requires:
//! 1. A variant in [`OsFamily`] and in [`Platform`]
//! 2. A module with a type implementing [`PlatformSetup`]
//! 3. The match arms in [`Platform::select`] and [`Platform::as_setup`]

pub mod fedora8;

use std::fmt;

use anyhow::Result;
use serde::Deserialize;

pub use fedora8::Fedora8Setup;

use crate::error::NodestrapError;
use crate::properties::{ARCH_KEY, Properties};
use crate::provision::SetupContext;

/// CPU architecture of the node. Picks package versions and paths.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum Architecture {
    #[serde(rename = "i386")]
    #[strum(serialize = "i386")]
    I386,
    #[serde(rename = "x86_64")]
    #[strum(serialize = "x86_64")]
    X86_64,
}

impl Architecture {
    /// Reads and parses the architecture selector from the property store.
    pub fn from_properties(properties: &Properties) -> Result<Self, NodestrapError> {
        let raw = properties.require(ARCH_KEY)?;
        raw.parse()
            .map_err(|_| NodestrapError::UnknownArchitecture(raw.to_string()))
    }
}

/// Supported operating system families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OsFamily {
    /// Fedora Core 8
    Fedora8,
}

/// The (OS family, architecture) pair that selects a platform setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlatformDescriptor {
    pub os: OsFamily,
    pub arch: Architecture,
}

impl PlatformDescriptor {
    pub fn new(os: OsFamily, arch: Architecture) -> Self {
        Self { os, arch }
    }

    /// Builds the descriptor for `os` using the architecture in `properties`.
    ///
    /// Fails before anything touches the node when the selector is missing
    /// or not a supported architecture.
    pub fn resolve(os: OsFamily, properties: &Properties) -> Result<Self, NodestrapError> {
        Ok(Self::new(os, Architecture::from_properties(properties)?))
    }
}

impl fmt::Display for PlatformDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

/// Provisioning capability implemented once per platform.
pub trait PlatformSetup: fmt::Debug {
    /// Returns the platform name (e.g., "fedora8").
    fn name(&self) -> &'static str;

    /// Commands that prepare a pristine image for richer automation.
    ///
    /// They must work with only the OS's default package manager.
    fn remote_bootstrap(&self) -> Vec<String>;

    /// Records platform-derived values in the property store.
    ///
    /// Touches nothing outside `properties`.
    fn init_properties(&self, properties: &mut Properties);

    /// Runs the full ordered provisioning sequence against the node.
    ///
    /// The first failing step aborts the rest; nothing is rolled back.
    fn setup(&self, properties: &Properties, ctx: &SetupContext<'_>) -> Result<()>;
}

/// Platform setup selected for a descriptor.
#[derive(Debug)]
pub enum Platform {
    Fedora8(Fedora8Setup),
}

impl Platform {
    /// Picks the implementation for `descriptor`, reading its inputs from `properties`.
    pub fn select(descriptor: PlatformDescriptor, properties: &Properties) -> Self {
        match descriptor.os {
            OsFamily::Fedora8 => Platform::Fedora8(Fedora8Setup::new(descriptor.arch, properties)),
        }
    }

    /// Returns the selected implementation as a trait object.
    pub fn as_setup(&self) -> &dyn PlatformSetup {
        match self {
            Platform::Fedora8(setup) => setup,
        }
    }
}
