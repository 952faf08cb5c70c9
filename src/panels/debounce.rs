//! Debounced input: the typed value updates at once, the settled value only
//! after the input has been quiet for the configured delay.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

pub struct Debouncer<T> {
    typed: T,
    delay: Duration,
    settled: Arc<watch::Sender<T>>,
    pending: Option<JoinHandle<()>>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: T, delay: Duration) -> Self {
        let (settled, _) = watch::channel(initial.clone());
        Self {
            typed: initial,
            delay,
            settled: Arc::new(settled),
            pending: None,
        }
    }

    /// Record a keystroke. Any timer still pending is restarted.
    pub fn set(&mut self, value: T) {
        self.typed = value.clone();
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }

        match Handle::try_current() {
            Ok(handle) => {
                let settled = Arc::clone(&self.settled);
                let delay = self.delay;
                self.pending = Some(handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    settled.send_replace(value);
                }));
            }
            Err(_) => {
                self.settled.send_replace(value);
            }
        }
    }

    pub fn typed(&self) -> &T {
        &self.typed
    }

    pub fn settled_value(&self) -> T {
        self.settled.borrow().clone()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|p| !p.is_finished())
    }

    /// Wait out the pending timer, if any, and return the settled value.
    pub async fn settled(&mut self) -> T {
        if let Some(pending) = self.pending.take() {
            // An aborted timer was replaced by a newer one; nothing to wait for.
            let _ = pending.await;
        }
        self.settled_value()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.settled.subscribe()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_only_last_value_settles() {
        let mut search = Debouncer::new(String::new(), Duration::from_millis(50));
        let mut rx = search.subscribe();

        for term in ["a", "ad", "ada"] {
            search.set(term.to_string());
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(search.typed(), "ada");
        assert_eq!(search.settled_value(), "");

        assert_eq!(search.settled().await, "ada");
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), "ada");
        // One settled update for three keystrokes.
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_drop_cancels_pending_timer() {
        let search = {
            let mut search = Debouncer::new(0u32, Duration::from_millis(20));
            search.set(7);
            search.subscribe()
        };
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(*search.borrow(), 0);
    }

    #[test]
    fn test_without_runtime_settles_immediately() {
        let mut search = Debouncer::new(String::new(), DEFAULT_DEBOUNCE);
        search.set("now".to_string());
        assert_eq!(search.settled_value(), "now");
        assert!(!search.is_pending());
    }
}
