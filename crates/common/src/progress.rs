//! Generic progress callback trait and implementations.

use std::marker::PhantomData;

/// Generic progress callback trait.
///
/// Type parameter `T` is the progress snapshot type, so scans, deletions and
/// migrations can report different data through the same callback shape.
pub trait ProgressCallback<T>: Send + Sync {
    /// Called with progress updates.
    ///
    /// # Arguments
    /// * `progress` - Snapshot of the current operation
    ///
    /// # Returns
    /// - `true` to keep going
    /// - `false` to stop the operation early
    fn on_progress(&self, progress: &T) -> bool;
}

/// A progress callback backed by a closure.
pub struct FnProgress<F, T> {
    callback: F,
    _marker: PhantomData<fn(&T)>,
}

impl<F, T> FnProgress<F, T>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    /// Wrap a closure as a progress callback.
    pub fn new(callback: F) -> Self {
        Self {
            callback,
            _marker: PhantomData,
        }
    }
}

impl<F, T> ProgressCallback<T> for FnProgress<F, T>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn on_progress(&self, progress: &T) -> bool {
        (self.callback)(progress)
    }
}

/// Create a progress callback from a closure.
///
/// # Arguments
/// * `f` - Closure that receives each snapshot and returns whether to continue
pub fn progress_fn<F, T>(f: F) -> FnProgress<F, T>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    FnProgress::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    struct PagesSeen {
        pages: u64,
    }

    #[test]
    fn test_fn_progress_stops_on_false() {
        let callback = progress_fn(|p: &PagesSeen| p.pages < 3);
        assert!(callback.on_progress(&PagesSeen { pages: 2 }));
        assert!(!callback.on_progress(&PagesSeen { pages: 3 }));
    }

    #[test]
    fn test_fn_progress_counts_calls() {
        let calls: Arc<AtomicU64> = Arc::new(AtomicU64::new(0));
        let calls_clone: Arc<AtomicU64> = calls.clone();

        let callback = progress_fn(move |_: &PagesSeen| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            true
        });

        for pages in 0..4 {
            callback.on_progress(&PagesSeen { pages });
        }

        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
