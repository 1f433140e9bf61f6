//! Where the cart's serialized form lives between requests.

use tower_sessions::Session;

use crate::models::session_keys;

/// Key-value slot holding the serialized cart.
///
/// The payload is the cart's JSON text; implementations never interpret it.
pub trait CartStorage {
    /// Stored payload, if any.
    fn load(&self) -> Option<String>;

    /// Replace the stored payload.
    fn save(&mut self, payload: String);

    /// Remove the stored payload.
    fn clear(&mut self);
}

/// In-process storage, used by tests and previews.
#[derive(Debug, Clone, Default)]
pub struct MemoryCartStorage {
    payload: Option<String>,
}

impl MemoryCartStorage {
    #[must_use]
    pub const fn new() -> Self {
        Self { payload: None }
    }

    /// Storage pre-filled with `payload`.
    #[must_use]
    pub fn with_payload(payload: impl Into<String>) -> Self {
        Self {
            payload: Some(payload.into()),
        }
    }
}

impl CartStorage for MemoryCartStorage {
    fn load(&self) -> Option<String> {
        self.payload.clone()
    }

    fn save(&mut self, payload: String) {
        self.payload = Some(payload);
    }

    fn clear(&mut self) {
        self.payload = None;
    }
}

/// Pending change to write back to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PendingWrite {
    Save(String),
    Clear,
}

/// Cart storage backed by the visitor's session.
///
/// Session access is async while [`CartStorage`] is not, so the payload is
/// read up front with [`SessionCartStorage::read`] and changes are buffered
/// until [`SessionCartStorage::flush`].
#[derive(Debug, Clone, Default)]
pub struct SessionCartStorage {
    payload: Option<String>,
    pending: Option<PendingWrite>,
}

impl SessionCartStorage {
    /// Read the stored cart payload from the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn read(session: &Session) -> Result<Self, tower_sessions::session::Error> {
        let payload = session
            .get_value(session_keys::CART)
            .await?
            .map(|value| match value {
                serde_json::Value::String(text) => text,
                other => other.to_string(),
            });

        Ok(Self {
            payload,
            pending: None,
        })
    }

    /// Whether there are unsaved changes.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.pending.is_some()
    }

    /// Write buffered changes back to the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn flush(&mut self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        match self.pending.take() {
            Some(PendingWrite::Save(payload)) => {
                session.insert(session_keys::CART, payload).await?;
            }
            Some(PendingWrite::Clear) => {
                session.remove_value(session_keys::CART).await?;
            }
            None => {}
        }
        Ok(())
    }
}

impl CartStorage for SessionCartStorage {
    fn load(&self) -> Option<String> {
        self.payload.clone()
    }

    fn save(&mut self, payload: String) {
        self.payload = Some(payload.clone());
        self.pending = Some(PendingWrite::Save(payload));
    }

    fn clear(&mut self) {
        self.payload = None;
        self.pending = Some(PendingWrite::Clear);
    }
}
