//! Temporarily moving a program out of the way.
//!
//! Some vendor installers page their license through `more` and wait for
//! input. Moving the pager aside makes them fall back to plain output.
//! [`ShadowedProgram`] puts the program back when it is restored or dropped,
//! so the node is not left without it when the wrapped step fails.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};

use crate::executor::{CommandExecutor, CommandSpec, run_checked};

/// RAII guard for a program moved to a sibling `no.<name>` path.
pub struct ShadowedProgram<'a> {
    executor: &'a dyn CommandExecutor,
    original: Utf8PathBuf,
    shadow: Utf8PathBuf,
    restored: bool,
}

impl std::fmt::Debug for ShadowedProgram<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShadowedProgram")
            .field("original", &self.original)
            .field("shadow", &self.shadow)
            .field("restored", &self.restored)
            .finish_non_exhaustive()
    }
}

/// Sibling path a program is parked at: `/bin/more` becomes `/bin/no.more`.
pub fn shadow_path(program: &Utf8Path) -> Utf8PathBuf {
    let name = program.file_name().unwrap_or(program.as_str());
    program.with_file_name(format!("no.{}", name))
}

fn move_spec(from: &Utf8Path, to: &Utf8Path) -> CommandSpec {
    CommandSpec::new("mv", [from.as_str(), to.as_str()])
}

impl<'a> ShadowedProgram<'a> {
    /// Moves `program` aside.
    pub fn shadow(executor: &'a dyn CommandExecutor, program: &Utf8Path) -> Result<Self> {
        let shadow = shadow_path(program);
        run_checked(executor, &move_spec(program, &shadow))
            .with_context(|| format!("failed to move {} aside", program))?;
        tracing::debug!("shadowed {} as {}", program, shadow);
        Ok(Self {
            executor,
            original: program.to_path_buf(),
            shadow,
            restored: false,
        })
    }

    /// Puts the program back, reporting failure.
    pub fn restore(mut self) -> Result<()> {
        self.restored = true;
        self.move_back()
    }

    fn move_back(&self) -> Result<()> {
        run_checked(self.executor, &move_spec(&self.shadow, &self.original))
            .with_context(|| format!("failed to restore {}", self.original))?;
        tracing::debug!("restored {}", self.original);
        Ok(())
    }
}

impl Drop for ShadowedProgram<'_> {
    fn drop(&mut self) {
        if !self.restored
            && let Err(e) = self.move_back()
        {
            tracing::error!(program = %self.original, "failed to restore shadowed program: {:#}", e);
        }
    }
}

/// Runs `f` with `program` moved aside and always restores it afterwards.
///
/// An error from `f` takes precedence; a restore failure is attached to it.
pub fn with_program_shadowed<T>(
    executor: &dyn CommandExecutor,
    program: &Utf8Path,
    f: impl FnOnce() -> Result<T>,
) -> Result<T> {
    let guard = ShadowedProgram::shadow(executor, program)?;
    let run_result = f();
    let restore_result = guard.restore();

    match (run_result, restore_result) {
        (Ok(value), Ok(())) => Ok(value),
        (Err(e), Ok(())) => Err(e),
        (Ok(_), Err(e)) => Err(e),
        (Err(run_err), Err(restore_err)) => {
            Err(run_err.context(format!("additionally, restore failed: {:#}", restore_err)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadow_path_prefixes_file_name() {
        assert_eq!(shadow_path(Utf8Path::new("/bin/more")), Utf8PathBuf::from("/bin/no.more"));
        assert_eq!(
            shadow_path(Utf8Path::new("/tmp/root/bin/less")),
            Utf8PathBuf::from("/tmp/root/bin/no.less")
        );
    }
}
