//! Single-slot notifications with auto-dismiss timers.
//!
//! A new message replaces the current one and restarts the timer. Observers
//! follow the slot through a `watch` receiver.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Lifetime of a success toast.
pub const SUCCESS_TTL: Duration = Duration::from_secs(3);
/// Lifetime of an error banner.
pub const ERROR_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    /// Increases with every message shown.
    pub seq: u64,
}

struct Inner {
    slot: watch::Sender<Option<Notification>>,
    seq: AtomicU64,
    timer: Mutex<Option<JoinHandle<()>>>,
    success_ttl: Duration,
    error_ttl: Duration,
}

impl Inner {
    fn replace_timer(&self, next: Option<JoinHandle<()>>) {
        if let Ok(mut timer) = self.timer.lock() {
            if let Some(previous) = timer.take() {
                previous.abort();
            }
            *timer = next;
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Ok(timer) = self.timer.get_mut() {
            if let Some(handle) = timer.take() {
                handle.abort();
            }
        }
    }
}

/// Handle to one notification slot. Clones share the slot.
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<Inner>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        Self::with_ttls(SUCCESS_TTL, ERROR_TTL)
    }

    pub fn with_ttls(success_ttl: Duration, error_ttl: Duration) -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                slot,
                seq: AtomicU64::new(0),
                timer: Mutex::new(None),
                success_ttl,
                error_ttl,
            }),
        }
    }

    pub fn show_success(&self, message: impl Into<String>) {
        self.show(message.into(), NotificationKind::Success);
    }

    pub fn show_error(&self, message: impl Into<String>) {
        self.show(message.into(), NotificationKind::Error);
    }

    /// Clear the slot now and cancel its timer.
    pub fn dismiss(&self) {
        self.inner.seq.fetch_add(1, Ordering::SeqCst);
        self.inner.replace_timer(None);
        self.inner.slot.send_replace(None);
    }

    pub fn current(&self) -> Option<Notification> {
        self.inner.slot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Notification>> {
        self.inner.slot.subscribe()
    }

    fn show(&self, message: String, kind: NotificationKind) {
        let seq = self.inner.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let ttl = match kind {
            NotificationKind::Success => self.inner.success_ttl,
            NotificationKind::Error => self.inner.error_ttl,
        };

        match kind {
            NotificationKind::Success => tracing::debug!("Notify: {}", message),
            NotificationKind::Error => tracing::warn!("Notify error: {}", message),
        }

        self.inner
            .slot
            .send_replace(Some(Notification { message, kind, seq }));

        // Without a runtime the message stays until dismissed.
        let timer = Handle::try_current()
            .ok()
            .map(|handle| handle.spawn(expire(Arc::downgrade(&self.inner), seq, ttl)));
        self.inner.replace_timer(timer);
    }
}

async fn expire(inner: Weak<Inner>, seq: u64, ttl: Duration) {
    tokio::time::sleep(ttl).await;
    if let Some(inner) = inner.upgrade() {
        if inner.seq.load(Ordering::SeqCst) == seq {
            inner.slot.send_replace(None);
        }
    }
}
