//! Single-slot, auto-dismissing user notification.
//!
//! DESIGN
//! ======
//! At most one message is visible. Each `show` replaces it and re-arms the
//! dismiss timer: the previous timer task is aborted, and the new one is
//! tagged with an epoch so a timer that already fired cannot hide a newer
//! message.

#[cfg(test)]
#[path = "notification_test.rs"]
mod notification_test;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::DEFAULT_NOTIFICATION_DURATION_MS;

/// Visual weight of a notification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Severity {
    Success,
    #[default]
    Error,
    Info,
}

/// The message currently on screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

#[derive(Default)]
struct ChannelInner {
    current: Option<Notification>,
    timer: Option<JoinHandle<()>>,
    epoch: u64,
}

fn lock(inner: &Mutex<ChannelInner>) -> MutexGuard<'_, ChannelInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to the notification slot. Clones share the same slot.
#[derive(Clone)]
pub struct NotificationChannel {
    inner: Arc<Mutex<ChannelInner>>,
    default_duration: Duration,
}

impl Default for NotificationChannel {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_NOTIFICATION_DURATION_MS))
    }
}

impl NotificationChannel {
    #[must_use]
    pub fn new(default_duration: Duration) -> Self {
        Self { inner: Arc::new(Mutex::new(ChannelInner::default())), default_duration }
    }

    /// Display `message`, replacing whatever is visible, and dismiss it after
    /// `duration` (the channel default when `None`).
    ///
    /// Must be called from within a Tokio runtime; the dismiss timer is a task.
    pub fn show(&self, message: impl Into<String>, severity: Severity, duration: Option<Duration>) {
        let duration = duration.unwrap_or(self.default_duration);
        let deadline = Instant::now() + duration;

        let mut inner = lock(&self.inner);
        if let Some(timer) = inner.timer.take() {
            timer.abort();
        }
        inner.epoch += 1;
        let epoch = inner.epoch;
        inner.current = Some(Notification { message: message.into(), severity });

        let slot = Arc::downgrade(&self.inner);
        inner.timer = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let Some(slot) = slot.upgrade() else {
                return;
            };
            let mut inner = lock(&slot);
            if inner.epoch == epoch {
                inner.current = None;
                inner.timer = None;
            }
        }));
    }

    /// `show` with the default severity (`Error`) and duration.
    pub fn error(&self, message: impl Into<String>) {
        self.show(message, Severity::default(), None);
    }

    /// Hide the current message and cancel its timer.
    pub fn hide(&self) {
        let mut inner = lock(&self.inner);
        inner.current = None;
        if let Some(timer) = inner.timer.take() {
            timer.abort();
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<Notification> {
        lock(&self.inner).current.clone()
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        lock(&self.inner).current.is_some()
    }

    /// Whether a dismiss timer is armed and has not yet fired.
    #[must_use]
    pub fn has_pending_dismiss(&self) -> bool {
        lock(&self.inner)
            .timer
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }
}
