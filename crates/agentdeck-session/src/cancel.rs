use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

/// Cloneable handle that cancels whatever run its session has in flight.
///
/// The session arms a fresh token when a run starts and clears it when the
/// run ends, so a handle fired after the run is over does nothing.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    slot: Arc<Mutex<Option<CancellationToken>>>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal the in-flight run. Returns false when no run was armed.
    pub fn cancel(&self) -> bool {
        match self.lock().take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Whether a run is currently armed
    pub fn is_armed(&self) -> bool {
        self.lock().is_some()
    }

    pub(crate) fn arm(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.lock() = Some(token.clone());
        token
    }

    pub(crate) fn disarm(&self) {
        self.lock().take();
    }

    fn lock(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_without_run_is_noop() {
        let handle = CancelHandle::new();
        assert!(!handle.is_armed());
        assert!(!handle.cancel());
    }

    #[test]
    fn test_cancel_fires_armed_token_once() {
        let handle = CancelHandle::new();
        let token = handle.arm();
        let remote = handle.clone();

        assert!(remote.is_armed());
        assert!(remote.cancel());
        assert!(token.is_cancelled());
        assert!(!handle.cancel());
    }

    #[test]
    fn test_disarm_invalidates_handle() {
        let handle = CancelHandle::new();
        let token = handle.arm();
        handle.disarm();

        assert!(!handle.cancel());
        assert!(!token.is_cancelled());
    }
}
