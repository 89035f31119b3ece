use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A transient, auto-dismissed message for the user (toast/snackbar)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

/// Where user-facing notices go. The front end decides how to show them.
pub trait NoticeSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Queue of pending notices, drained by the front end after each action.
/// Every notice is also logged.
#[derive(Debug, Clone, Default)]
pub struct NoticeQueue {
    pending: Arc<Mutex<VecDeque<Notice>>>,
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Notice> {
        self.pending
            .lock()
            .map(|mut queue| queue.drain(..).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().map(|queue| queue.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the pending notices, left in place
    pub fn peek(&self) -> Vec<Notice> {
        self.pending
            .lock()
            .map(|queue| queue.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl NoticeSink for NoticeQueue {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => error!(notice = %notice.message, "User notice"),
            NoticeLevel::Warning => warn!(notice = %notice.message, "User notice"),
            NoticeLevel::Success | NoticeLevel::Info => info!(notice = %notice.message, "User notice"),
        }
        if let Ok(mut queue) = self.pending.lock() {
            queue.push_back(notice);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_drains_in_order() {
        let queue = NoticeQueue::new();
        queue.notify(Notice::success("first"));
        queue.notify(Notice::error("second"));
        assert_eq!(queue.len(), 2);

        let drained = queue.drain();
        assert_eq!(drained[0].message, "first");
        assert!(drained[1].is_error());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clones_share_the_queue() {
        let queue = NoticeQueue::new();
        let sink: Arc<dyn NoticeSink> = Arc::new(queue.clone());
        sink.notify(Notice::info("hello"));
        assert_eq!(queue.peek(), vec![Notice::info("hello")]);
    }
}
