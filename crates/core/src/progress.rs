//! Thread-safe progress tracking for batch runs.

use std::sync::Arc;
use tokio::sync::Mutex;

/// Callback invoked after every completed task with
/// `(completed_count, total_count, file_name)`.
pub type ProgressFn = dyn Fn(usize, usize, &str) + Send + Sync;

/// Shared completion counter for one batch run.
///
/// The counter is guarded by a mutex and incremented exactly once per task
/// completion, success or failure. The progress callback is invoked while the
/// lock is held, so two invocations never interleave even when completions
/// arrive from different workers.
#[derive(Debug)]
pub struct ProgressState {
    total: usize,
    completed: Mutex<usize>,
}

impl ProgressState {
    /// Create a progress state for a batch of `total` tasks.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: Mutex::new(0),
        }
    }

    /// Total number of tasks in the batch.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Current completed count.
    pub async fn completed(&self) -> usize {
        *self.completed.lock().await
    }

    /// Record one completion and report it, returning the new count.
    pub async fn complete(&self, file_name: &str, callback: Option<&Arc<ProgressFn>>) -> usize {
        let mut completed = self.completed.lock().await;
        *completed += 1;
        debug_assert!(*completed <= self.total);
        if let Some(callback) = callback {
            callback(*completed, self.total, file_name);
        }
        *completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    #[tokio::test]
    async fn test_progress_starts_at_zero() {
        let state = ProgressState::new(3);
        assert_eq!(state.total(), 3);
        assert_eq!(state.completed().await, 0);
    }

    #[tokio::test]
    async fn test_progress_increments_once_per_completion() {
        let state = ProgressState::new(2);
        assert_eq!(state.complete("a.docx", None).await, 1);
        assert_eq!(state.complete("b.docx", None).await, 2);
        assert_eq!(state.completed().await, 2);
    }

    #[tokio::test]
    async fn test_progress_callback_sees_monotone_counts() {
        let seen: Arc<StdMutex<Vec<(usize, usize, String)>>> =
            Arc::new(StdMutex::new(Vec::new()));
        let seen_cb = Arc::clone(&seen);
        let callback: Arc<ProgressFn> = Arc::new(move |done, total, name| {
            seen_cb.lock().unwrap().push((done, total, name.to_string()));
        });

        let state = ProgressState::new(3);
        for name in ["a.txt", "b.txt", "c.txt"] {
            state.complete(name, Some(&callback)).await;
        }

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0], (1, 3, "a.txt".to_string()));
        assert_eq!(seen[2], (3, 3, "c.txt".to_string()));
        assert!(seen.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[tokio::test]
    async fn test_progress_concurrent_completions_are_not_lost() {
        let state = Arc::new(ProgressState::new(64));
        let mut handles = Vec::new();
        for i in 0..64 {
            let state = Arc::clone(&state);
            handles.push(tokio::spawn(async move {
                state.complete(&format!("file{i}"), None).await
            }));
        }
        let mut counts = Vec::new();
        for handle in handles {
            counts.push(handle.await.unwrap());
        }
        counts.sort_unstable();
        // Every count from 1..=64 observed exactly once
        assert_eq!(counts, (1..=64).collect::<Vec<_>>());
        assert_eq!(state.completed().await, 64);
    }
}
