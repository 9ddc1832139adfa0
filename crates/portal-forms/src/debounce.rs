//! Debounced execution
//!
//! A [`Debouncer`] runs the most recent submitted future once input has been
//! quiet for its delay. Submitting again, calling [`Debouncer::cancel`], or
//! dropping the debouncer aborts whatever is pending, including a call that
//! already started and is awaiting a response.

use parking_lot::Mutex;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Cancelable delayed executor; at most one call pending at a time
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    /// Debouncer with a fixed quiescence delay
    #[inline]
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Quiescence delay
    #[inline]
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `task` after the delay, superseding any pending call
    ///
    /// Must be called from within a tokio runtime.
    pub fn call<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut pending = self.pending.lock();
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        let delay = self.delay;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));
    }

    /// Abort the pending call, if any
    pub fn cancel(&self) {
        if let Some(handle) = self.pending.lock().take() {
            handle.abort();
        }
    }

    /// A call is scheduled or running
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn only_last_call_runs() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let (tx, mut rx) = mpsc::unbounded_channel();

        for value in ["t", "te", "ten"] {
            let tx = tx.clone();
            debouncer.call(async move {
                let _ = tx.send(value);
            });
            tokio::time::advance(Duration::from_millis(100)).await;
        }
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(rx.recv().await, Some("ten"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_call() {
        let debouncer = Debouncer::new(Duration::from_millis(50));
        let fired = Arc::new(parking_lot::Mutex::new(false));
        let flag = Arc::clone(&fired);
        debouncer.call(async move {
            *flag.lock() = true;
        });
        assert!(debouncer.is_pending());
        debouncer.cancel();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!*fired.lock());
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels() {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();
        {
            let debouncer = Debouncer::new(Duration::from_millis(50));
            debouncer.call(async move {
                let _ = tx.send(());
            });
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(rx.recv().await.is_none());
    }
}
