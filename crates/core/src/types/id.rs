//! Product identifier newtype.
//!
//! Supabase tables may key products by `uuid`, `text` or `bigint`. The
//! identifier is kept as an opaque string so the storefront never has to care
//! which one the project uses.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a catalog product.
///
/// Also identifies cart lines: a cart holds at most one line per product.
///
/// ```
/// use pressmark_core::ProductId;
///
/// let id = ProductId::new("  a1b2 ");
/// assert_eq!(id.as_str(), "a1b2");
/// assert!(ProductId::parse("   ").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create an id, trimming surrounding whitespace.
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_string())
    }

    /// Create an id from user input, rejecting blank values.
    #[must_use]
    pub fn parse(id: &str) -> Option<Self> {
        let trimmed = id.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Get the underlying string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<i64> for ProductId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}
