use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use shared_models::error::AppError;

use crate::models::{Toast, ToastKind};

/// What view-models see of the toast queue.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, kind: ToastKind) -> u64;

    fn success(&self, message: &str) -> u64 {
        self.notify(message, ToastKind::Success)
    }

    fn error(&self, message: &str) -> u64 {
        self.notify(message, ToastKind::Error)
    }

    fn info(&self, message: &str) -> u64 {
        self.notify(message, ToastKind::Info)
    }

    /// Toasts the user-facing part of `err` and hands it back.
    fn fail(&self, err: AppError) -> AppError {
        self.error(err.message());
        err
    }
}

struct Entry {
    toast: Toast,
    expires_at: Instant,
}

#[derive(Default)]
struct Queue {
    counter: u64,
    entries: Vec<Entry>,
}

impl Queue {
    fn prune(&mut self, now: Instant) {
        self.entries.retain(|e| e.expires_at > now);
    }
}

/// Transient feedback queue. Each toast lives for `ttl` unless removed first.
pub struct ToastService {
    ttl: Duration,
    queue: Mutex<Queue>,
}

impl ToastService {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            queue: Mutex::new(Queue::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn show(&self, message: &str, kind: ToastKind) -> u64 {
        let mut queue = self.lock();

        let now = Instant::now();
        queue.prune(now);

        let id = queue.counter;
        queue.counter += 1;
        queue.entries.push(Entry {
            toast: Toast {
                id,
                message: message.to_string(),
                kind,
            },
            expires_at: now + self.ttl,
        });

        debug!("Toast {} ({}): {}", id, kind, message);
        id
    }

    pub fn remove(&self, id: u64) -> bool {
        let mut queue = self.lock();
        let before = queue.entries.len();
        queue.entries.retain(|e| e.toast.id != id);
        queue.entries.len() != before
    }

    /// Unexpired toasts, oldest first.
    pub fn active(&self) -> Vec<Toast> {
        let mut queue = self.lock();
        queue.prune(Instant::now());
        queue.entries.iter().map(|e| e.toast.clone()).collect()
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }
}

impl Notifier for ToastService {
    fn notify(&self, message: &str, kind: ToastKind) -> u64 {
        self.show(message, kind)
    }
}
