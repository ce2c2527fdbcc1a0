use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation signal shared between a caller and one run.
///
/// The run only reads it, once per recognizer output line. Each run gets a fresh token, so
/// a token left over from an earlier run can never cancel a later one.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let token = CancelToken::new();
        let seen_by_worker = token.clone();
        assert!(!seen_by_worker.is_cancelled());

        token.cancel();
        token.cancel();
        assert!(seen_by_worker.is_cancelled());
    }

    #[test]
    fn fresh_tokens_start_clear() {
        let old = CancelToken::new();
        old.cancel();
        assert!(!CancelToken::new().is_cancelled());
    }
}
