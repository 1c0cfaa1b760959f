//! Shared test helpers for integration tests.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

/// Returns the directory of a fixture paper under `tests/fixtures/papers/`.
///
/// # Panics
///
/// Panics if the fixture does not exist.
pub fn paper_fixture(name: &str) -> PathBuf {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/papers")
        .join(name);
    assert!(dir.is_dir(), "missing paper fixture {name}");
    dir
}

/// Serializes in-process extractions, which set the TeX include path.
pub fn pipeline_lock() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}
