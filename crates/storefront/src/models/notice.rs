//! Visitor-facing notices and one-shot flash messages.
//!
//! A [`Notice`] is either rendered directly by the handler that produced it
//! or stashed in the session with [`push_flash`] and shown on the next page
//! that calls [`take_flashes`] (the post/redirect/get pattern).

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::cart::{RemovalReason, RemovedLine};
use crate::catalog::{CatalogError, ErrorClass};

use super::session_keys;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A message shown to the visitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// Blocking notices render as a banner that cannot be dismissed.
    #[serde(default)]
    pub blocking: bool,
}

impl Notice {
    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            blocking: false,
        }
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    /// Notice for a failed catalog read: a blocking banner for
    /// configuration problems, a dismissible toast otherwise.
    #[must_use]
    pub fn from_catalog_error(err: &CatalogError) -> Self {
        match err.class() {
            ErrorClass::Configuration => Self {
                blocking: true,
                ..Self::error(err.user_message())
            },
            ErrorClass::Network => Self::warning(err.user_message()),
        }
    }

    /// Notice for a cart line dropped during revalidation.
    #[must_use]
    pub fn removed_from_cart(line: &RemovedLine) -> Self {
        let message = match line.reason {
            RemovalReason::Missing => format!(
                "\u{201c}{}\u{201d} is no longer available and was removed from your cart.",
                line.name
            ),
            RemovalReason::Inactive => format!(
                "\u{201c}{}\u{201d} is no longer for sale and was removed from your cart.",
                line.name
            ),
        };
        Self::warning(message)
    }

    /// CSS class for the notice container.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match (self.level, self.blocking) {
            (_, true) => "notice notice-banner",
            (NoticeLevel::Info, false) => "notice notice-info",
            (NoticeLevel::Success, false) => "notice notice-success",
            (NoticeLevel::Warning, false) => "notice notice-warning",
            (NoticeLevel::Error, false) => "notice notice-error",
        }
    }

    /// ARIA role: alerts interrupt, the rest are polite status updates.
    #[must_use]
    pub const fn role(&self) -> &'static str {
        match self.level {
            NoticeLevel::Error | NoticeLevel::Warning => "alert",
            NoticeLevel::Info | NoticeLevel::Success => "status",
        }
    }
}

/// Queue a notice for the next rendered page.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn push_flash(
    session: &Session,
    notice: Notice,
) -> Result<(), tower_sessions::session::Error> {
    let mut pending = peek_flashes(session).await?;
    pending.push(notice);
    session.insert(session_keys::FLASH, pending).await
}

/// Take every queued notice, leaving the queue empty.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn take_flashes(session: &Session) -> Result<Vec<Notice>, tower_sessions::session::Error> {
    if session.get_value(session_keys::FLASH).await?.is_none() {
        return Ok(Vec::new());
    }
    let notices = session
        .remove_value(session_keys::FLASH)
        .await?
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default();
    Ok(notices)
}

/// Queued notices; unreadable entries are dropped.
async fn peek_flashes(session: &Session) -> Result<Vec<Notice>, tower_sessions::session::Error> {
    let notices = session
        .get_value(session_keys::FLASH)
        .await?
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default();
    Ok(notices)
}
