//! Domain-specific error types for nodestrap.
//!
//! This module defines `NodestrapError`, a `thiserror`-based enum that
//! provides typed error variants for the provisioning failure taxonomy:
//! command failures, I/O failures on the files the setup writes, and
//! malformed or missing properties. Public API functions return
//! `Result<T, NodestrapError>` where the failure is one of these, while
//! trait boundaries (`PlatformSetup`, `CommandExecutor`) use `anyhow::Result`.
//!
//! `NodestrapError` implements `Into<anyhow::Error>`, so the `?` operator
//! converts it automatically at those boundaries.

use std::io;

/// Formats an IO error kind into a human-readable message.
///
/// Provides consistent, user-friendly messages for common IO error kinds
/// (e.g., "I/O error: not found") instead of the OS-level messages
/// (e.g., "No such file or directory (os error 2)"). For unrecognized
/// error kinds, falls back to including the OS-level error message.
pub(crate) fn io_error_kind_message(err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::NotFound => "I/O error: not found".to_string(),
        io::ErrorKind::PermissionDenied => "I/O error: permission denied".to_string(),
        io::ErrorKind::IsADirectory => "I/O error: is a directory".to_string(),
        _ => format!("I/O error: {}", err),
    }
}

/// Domain-specific error type for nodestrap.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum NodestrapError {
    /// A validation constraint was violated.
    #[error("validation error: {0}")]
    Validation(String),

    /// A profile or property file could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// The architecture selector is not one of the supported values.
    #[error("unknown architecture: {0:?} (expected one of: i386, x86_64)")]
    UnknownArchitecture(String),

    /// A property required by a platform was not present in the store.
    #[error("missing required property: {0}")]
    MissingProperty(String),

    /// The executable could not be located, so the command never started.
    #[error("command not found in PATH: {command}")]
    CommandNotFound {
        /// The program name that was looked up.
        command: String,
    },

    /// A command ran but did not succeed (non-zero exit, killed by signal,
    /// or an internal failure while waiting for it).
    #[error("command execution failed: {command}: {status}")]
    Execution {
        /// The command line that was executed.
        command: String,
        /// Human-readable reason for the failure.
        status: String,
    },

    /// An I/O operation failed with contextual information.
    #[error("{context}: {message}")]
    Io {
        /// What was being done when the error occurred, usually naming the
        /// target path (e.g., `"failed to append to /etc/profile"`).
        context: String,
        /// Human-readable description derived from [`io_error_kind_message`].
        message: String,
        /// The underlying I/O error, preserved for programmatic inspection.
        #[source]
        source: std::io::Error,
    },
}

impl NodestrapError {
    /// Creates an `Io` variant with the `message` field derived from `source`.
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            message: io_error_kind_message(&source),
            source,
        }
    }
}
