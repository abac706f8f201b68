//! Blocking user notices raised by bulk operations.

use log::{error, info};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Surface for notices the user must acknowledge.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

/// Default notifier: writes notices to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &Notice) {
        match notice.level {
            NoticeLevel::Info => {
                info!("event=notice module=sync status=ok message={}", notice.message)
            }
            NoticeLevel::Error => {
                error!("event=notice module=sync status=error message={}", notice.message)
            }
        }
    }
}
