//! Guarded actions: check the postcondition first, act only when it is missing.
//!
//! This is how the two idempotent steps of a setup are expressed (account
//! creation and package removal), so re-running a setup against a node where
//! those steps already happened is not an error.

use anyhow::Result;

/// What a guarded action did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The postcondition already held; the action was not run.
    Satisfied,
    /// The action ran.
    Applied,
}

/// Runs `action` only if `satisfied` reports the postcondition does not hold yet.
///
/// Errors from either closure propagate unchanged.
pub fn ensure<P, A>(what: &str, satisfied: P, action: A) -> Result<Outcome>
where
    P: FnOnce() -> Result<bool>,
    A: FnOnce() -> Result<()>,
{
    if satisfied()? {
        tracing::debug!("{}: already satisfied, skipping", what);
        return Ok(Outcome::Satisfied);
    }
    action()?;
    tracing::debug!("{}: applied", what);
    Ok(Outcome::Applied)
}
