//! Progress indicator hooks.

use std::sync::Arc;

/// Observer notified when an attempt starts and settles.
///
/// Purely observational: nothing it does affects the request.
pub trait ProgressIndicator: Send + Sync {
    /// Called once when an attempt is handed to the transport.
    fn show(&self);

    /// Called once when that attempt settles, including on cancellation.
    fn dismiss(&self);
}

/// Calls `dismiss` when dropped.
pub(crate) struct ProgressGuard(Option<Arc<dyn ProgressIndicator>>);

impl ProgressGuard {
    pub(crate) fn show(indicator: Option<&Arc<dyn ProgressIndicator>>) -> Self {
        let indicator = indicator.cloned();
        if let Some(indicator) = &indicator {
            indicator.show();
        }
        Self(indicator)
    }
}

impl Drop for ProgressGuard {
    fn drop(&mut self) {
        if let Some(indicator) = self.0.take() {
            indicator.dismiss();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter {
        shown: AtomicUsize,
        dismissed: AtomicUsize,
    }

    impl ProgressIndicator for Counter {
        fn show(&self) {
            self.shown.fetch_add(1, Ordering::SeqCst);
        }

        fn dismiss(&self) {
            self.dismissed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_guard_pairs_show_and_dismiss() {
        let counter = Arc::new(Counter::default());
        let indicator: Arc<dyn ProgressIndicator> = counter.clone();

        let guard = ProgressGuard::show(Some(&indicator));
        assert_eq!(counter.shown.load(Ordering::SeqCst), 1);
        assert_eq!(counter.dismissed.load(Ordering::SeqCst), 0);

        drop(guard);
        assert_eq!(counter.dismissed.load(Ordering::SeqCst), 1);
    }
}
