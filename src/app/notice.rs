use tracing::{
    error,
    info,
    warn,
};

use crate::core::errors::DokkaiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A dismissible message shown over the current screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }

    /// Duplicates and empty exports are informational, bad input is a
    /// warning, everything else is an error.
    pub fn from_error(e: &DokkaiError) -> Self {
        if e.is_notice() {
            info!(error = %e, "notice");
            return Self::info(e.to_string());
        }
        match e {
            DokkaiError::Validation(_) | DokkaiError::NotFound { .. } => {
                warn!(error = %e, "action rejected");
                Self::warning(e.to_string())
            }
            _ => {
                error!(error = %e, "action failed");
                Self::error(e.to_string())
            }
        }
    }
}
