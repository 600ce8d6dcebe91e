use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag shared between the controller and the
/// decode worker.
///
/// The worker checks the token once per packet, never mid-decode: a blocking
/// read or decode call in progress when [`cancel`](CancelToken::cancel) is
/// requested completes first. Shutdown latency is therefore bounded by the
/// duration of one packet read + decode, not zero.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Re-arm the token for a fresh run.
    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::CancelToken;

    #[test]
    fn cancel_is_visible_through_clones() {
        let token = CancelToken::new();
        let seen_by_worker = token.clone();
        assert!(!seen_by_worker.is_cancelled());

        token.cancel();
        assert!(seen_by_worker.is_cancelled());

        token.clear();
        assert!(!seen_by_worker.is_cancelled());
    }
}
