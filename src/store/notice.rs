//! User-visible notifications.
//!
//! # Responsibilities
//! - Define the notification sink the store reports through
//! - Keep a bounded log of recent notices for editors to display
//! - Mirror every notice to structured logs

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Sink for user-visible notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, level: NoticeLevel);
}

/// A recorded notification.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Notice {
    /// Monotonic sequence number, unique within the log.
    pub id: u64,
    pub level: NoticeLevel,
    pub message: String,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
}

#[derive(Debug, Default)]
struct NoticeBuffer {
    next_id: u64,
    entries: VecDeque<Notice>,
}

/// Bounded in-memory notice log.
///
/// Survives in-process restarts when the same instance is handed to each
/// new store.
#[derive(Debug)]
pub struct NoticeLog {
    capacity: usize,
    inner: Mutex<NoticeBuffer>,
}

impl NoticeLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(NoticeBuffer::default()),
        }
    }

    /// All retained notices, oldest first.
    pub fn recent(&self) -> Vec<Notice> {
        let buffer = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        buffer.entries.iter().cloned().collect()
    }

    /// Retained notices with an id greater than `id`.
    pub fn since(&self, id: u64) -> Vec<Notice> {
        let buffer = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        buffer.entries.iter().filter(|n| n.id > id).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NoticeLog {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Notifier for NoticeLog {
    fn notify(&self, message: &str, level: NoticeLevel) {
        match level {
            NoticeLevel::Info | NoticeLevel::Success => tracing::info!(level = ?level, "{}", message),
            NoticeLevel::Warning => tracing::warn!("{}", message),
            NoticeLevel::Error => tracing::error!("{}", message),
        }

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let mut buffer = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        buffer.next_id += 1;
        let id = buffer.next_id;
        buffer.entries.push_back(Notice {
            id,
            level,
            message: message.to_string(),
            timestamp,
        });
        while buffer.entries.len() > self.capacity {
            buffer.entries.pop_front();
        }
    }
}
