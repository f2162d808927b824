use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Progress of the asynchronous resources placement depends on
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Loaded,
    /// Setup failed. Callers keep seeing "loading"; nothing here times out.
    Failed(String),
}

/// Shared readiness flag set by a loader thread and read by the placer.
/// Clones observe the same state.
#[derive(Clone)]
pub struct Readiness {
    inner: Arc<(Mutex<LoadState>, Condvar)>,
}

impl Readiness {
    /// A signal still waiting for its loader
    pub fn pending() -> Self {
        Self {
            inner: Arc::new((Mutex::new(LoadState::Loading), Condvar::new())),
        }
    }

    /// A signal that is already satisfied
    pub fn ready() -> Self {
        Self {
            inner: Arc::new((Mutex::new(LoadState::Loaded), Condvar::new())),
        }
    }

    pub fn state(&self) -> LoadState {
        self.inner.0.lock().clone()
    }

    pub fn is_loaded(&self) -> bool {
        *self.inner.0.lock() == LoadState::Loaded
    }

    pub fn mark_loaded(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock() = LoadState::Loaded;
        cvar.notify_all();
    }

    pub fn mark_failed(&self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::error!(%reason, "label resources failed to load");
        let (lock, cvar) = &*self.inner;
        *lock.lock() = LoadState::Failed(reason);
        cvar.notify_all();
    }

    /// Block until loaded or `timeout` elapses. Returns whether loaded.
    pub fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let (lock, cvar) = &*self.inner;
        let mut state = lock.lock();
        while *state == LoadState::Loading {
            if cvar.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        *state == LoadState::Loaded
    }
}

impl Default for Readiness {
    fn default() -> Self {
        Self::ready()
    }
}
