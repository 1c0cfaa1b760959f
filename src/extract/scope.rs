//! Scoped configuration for the parse call.

use std::env;
use std::ffi::OsString;
use std::path::Path;

use tracing::subscriber::{NoSubscriber, with_default};

/// Environment variable holding the TeX include search path.
pub const INCLUDE_PATH_VAR: &str = "TEXINPUTS";

const PATH_LIST_SEPARATOR: &str = if cfg!(windows) { ";" } else { ":" };

/// Prepends a paper directory to the TeX include path until dropped.
///
/// While the guard lives, the variable reads `<dir>:<dir>//:<previous>`,
/// where the trailing `//` asks for a recursive search. Dropping the guard
/// restores the previous value, or removes the variable if it was unset,
/// including during unwinding.
///
/// The variable is process-wide, so callers must not run two scopes
/// concurrently in one process.
#[derive(Debug)]
pub struct IncludePathScope {
    variable: &'static str,
    previous: Option<OsString>,
}

impl IncludePathScope {
    /// Enters a scope for `paper_dir` on [`INCLUDE_PATH_VAR`].
    #[must_use]
    pub fn enter(paper_dir: &Path) -> Self {
        Self::enter_variable(INCLUDE_PATH_VAR, paper_dir)
    }

    pub(crate) fn enter_variable(variable: &'static str, paper_dir: &Path) -> Self {
        let previous = env::var_os(variable);
        let mut value = OsString::new();
        value.push(paper_dir);
        value.push(PATH_LIST_SEPARATOR);
        value.push(paper_dir);
        value.push("//");
        value.push(PATH_LIST_SEPARATOR);
        if let Some(old) = &previous {
            value.push(old);
        }
        // SAFETY: extraction is single-threaded and callers serialize scopes,
        // so no other thread reads the environment concurrently.
        unsafe { env::set_var(variable, &value) };
        Self { variable, previous }
    }
}

impl Drop for IncludePathScope {
    fn drop(&mut self) {
        match &self.previous {
            // SAFETY: as in `enter_variable`.
            Some(old) => unsafe { env::set_var(self.variable, old) },
            // SAFETY: as in `enter_variable`.
            None => unsafe { env::remove_var(self.variable) },
        }
    }
}

/// Runs `f` with every `tracing` event discarded.
///
/// Used around the parse call so the parser's own diagnostics stay out of
/// the extraction log.
pub fn quietly<T>(f: impl FnOnce() -> T) -> T {
    with_default(NoSubscriber::default(), f)
}

/// Serializes tests that write or read process environment variables.
///
/// Poisoning is ignored: a test that panicked while holding the lock has
/// already restored the variables through its scope guard.
#[cfg(test)]
pub(crate) fn environment_lock() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock, PoisonError};

    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}
