use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::backend::{LoadOutcome, StateBackend, StateError, StateFile};

#[derive(Default)]
struct Inner {
    stored: Mutex<Option<StateFile>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
    fail_loads: AtomicBool,
}

/// In-process backend. Clones share the same storage, so a test can keep a
/// handle after moving one into a `StateStore`.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Inner>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: StateFile) -> Self {
        let backend = Self::default();
        *backend.lock() = Some(state);
        backend
    }

    /// Last successfully saved state.
    pub fn snapshot(&self) -> Option<StateFile> {
        self.lock().clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.inner.saves.load(Ordering::Relaxed)
    }

    /// Make subsequent saves fail (simulates a full disk).
    pub fn set_fail_saves(&self, fail: bool) {
        self.inner.fail_saves.store(fail, Ordering::Relaxed);
    }

    /// Make subsequent loads fail as if stored bytes couldn't be preserved.
    pub fn set_fail_loads(&self, fail: bool) {
        self.inner.fail_loads.store(fail, Ordering::Relaxed);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<StateFile>> {
        self.inner
            .stored
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StateBackend for MemoryBackend {
    fn load(&self) -> Result<LoadOutcome, StateError> {
        if self.inner.fail_loads.load(Ordering::Relaxed) {
            return Err(StateError::Backup {
                path: "memory".into(),
                source: std::io::Error::other("simulated backup failure"),
            });
        }
        Ok(match self.lock().clone() {
            Some(state) => LoadOutcome::Loaded(state),
            None => LoadOutcome::Missing,
        })
    }

    fn save(&self, state: &StateFile) -> Result<(), StateError> {
        if self.inner.fail_saves.load(Ordering::Relaxed) {
            return Err(StateError::Io {
                path: "memory".into(),
                source: std::io::Error::other("simulated save failure"),
            });
        }
        *self.lock() = Some(state.clone());
        self.inner.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
