//! The persistence adapter: serializes the snapshot subset and writes
//! it behind the fixed storage key. Ordinary mutations are debounced
//! (trailing-edge, superseded by the next schedule); destructive ones
//! flush immediately.
//!
//! The debounce is a plain state machine driven by the host event loop
//! — no threads or timers live in the crate.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::io::storage::{StorageBackend, STORAGE_KEY};
use crate::model::AppState;

pub struct Persister {
    backend: Box<dyn StorageBackend>,
    debounce: Duration,
    deadline: Option<Instant>,
}

impl std::fmt::Debug for Persister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persister")
            .field("debounce", &self.debounce)
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl Persister {
    pub fn new(backend: Box<dyn StorageBackend>, debounce: Duration) -> Self {
        Persister {
            backend,
            debounce,
            deadline: None,
        }
    }

    pub fn backend(&self) -> &dyn StorageBackend {
        self.backend.as_ref()
    }

    /// Arm (or re-arm) the trailing debounce deadline. A scheduled
    /// write is simply superseded by the next one.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.debounce);
    }

    pub fn pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Write the armed snapshot if its deadline has passed. Returns
    /// whether a write was attempted and, if so, whether it succeeded.
    pub fn flush_if_due(&mut self, state: &AppState, now: Instant) -> Option<bool> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        Some(self.flush_now(state))
    }

    /// Write immediately, bypassing the debounce window. A write
    /// failure is recoverable: the in-memory mutation has already
    /// succeeded, only durability is at risk, so the failure is
    /// reported as `false` for the caller's storage-warning flag.
    pub fn flush_now(&mut self, state: &AppState) -> bool {
        self.deadline = None;
        let bytes = match serde_json::to_vec(&state.snapshot()) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "snapshot serialization failed");
                return false;
            }
        };
        match self.backend.write(STORAGE_KEY, &bytes) {
            Ok(()) => {
                debug!(bytes = bytes.len(), "persisted snapshot");
                true
            }
            Err(e) => {
                warn!(error = %e, "persist failed; state kept in memory only");
                false
            }
        }
    }

    /// Read the raw persisted snapshot, if any.
    pub fn load(&self) -> Option<Vec<u8>> {
        match self.backend.read(STORAGE_KEY) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "storage read failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::storage::{MemoryStorage, StorageError};

    fn persister(debounce_ms: u64) -> Persister {
        Persister::new(
            Box::new(MemoryStorage::new()),
            Duration::from_millis(debounce_ms),
        )
    }

    #[test]
    fn rapid_schedules_coalesce_into_one_trailing_write() {
        let mut p = persister(300);
        let state = AppState::default_data();
        let t0 = Instant::now();

        p.schedule(t0);
        p.schedule(t0 + Duration::from_millis(100));
        p.schedule(t0 + Duration::from_millis(200));

        // Only the last schedule's deadline counts.
        assert_eq!(p.flush_if_due(&state, t0 + Duration::from_millis(350)), None);
        assert_eq!(
            p.flush_if_due(&state, t0 + Duration::from_millis(500)),
            Some(true)
        );
        // Nothing left armed.
        assert_eq!(p.flush_if_due(&state, t0 + Duration::from_secs(10)), None);
        assert!(p.backend().read(STORAGE_KEY).unwrap().is_some());
    }

    #[test]
    fn flush_now_bypasses_the_window_and_disarms() {
        let mut p = persister(300);
        let state = AppState::default_data();
        p.schedule(Instant::now());
        assert!(p.flush_now(&state));
        assert!(!p.pending());
    }

    #[test]
    fn write_failure_is_reported_not_raised() {
        struct FailingStorage;
        impl StorageBackend for FailingStorage {
            fn read(&self, _key: &str) -> Result<Option<Vec<u8>>, StorageError> {
                Ok(None)
            }
            fn write(&mut self, _key: &str, _bytes: &[u8]) -> Result<(), StorageError> {
                Err(StorageError::Write(std::io::Error::other("quota exceeded")))
            }
        }

        let mut p = Persister::new(Box::new(FailingStorage), Duration::from_millis(1));
        let state = AppState::default_data();
        assert!(!p.flush_now(&state));
    }

    #[test]
    fn persisted_bytes_parse_back_as_the_snapshot() {
        let mut p = persister(0);
        let state = AppState::default_data();
        assert!(p.flush_now(&state));
        let bytes = p.load().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["appVersion"], serde_json::json!(crate::model::APP_VERSION));
        assert!(value["workspaces"].is_array());
    }
}
