//! Product categories.
//!
//! The backend stores categories as free-form text. They are mapped onto a
//! closed set of known categories once, at the boundary, so every lookup
//! downstream (labels, badge styling, filters) is a total `match`.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    Stationery,
    Prints,
    Stickers,
    Apparel,
    Accessories,
    /// A category the storefront does not know about, kept verbatim.
    Uncategorized(String),
}

impl Category {
    /// All known categories, in navigation order.
    pub const KNOWN: [Self; 5] = [
        Self::Stationery,
        Self::Prints,
        Self::Stickers,
        Self::Apparel,
        Self::Accessories,
    ];

    /// Map a backend category value onto a category.
    ///
    /// Matching ignores case and surrounding whitespace. Anything unknown
    /// becomes [`Category::Uncategorized`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_lowercase().as_str() {
            "stationery" => Self::Stationery,
            "prints" | "print" => Self::Prints,
            "stickers" | "sticker" => Self::Stickers,
            "apparel" => Self::Apparel,
            "accessories" | "accessory" => Self::Accessories,
            _ => Self::Uncategorized(trimmed.to_string()),
        }
    }

    /// Value used in URLs and stored in the backend.
    #[must_use]
    pub fn slug(&self) -> &str {
        match self {
            Self::Stationery => "stationery",
            Self::Prints => "prints",
            Self::Stickers => "stickers",
            Self::Apparel => "apparel",
            Self::Accessories => "accessories",
            Self::Uncategorized(raw) => raw,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Stationery => "Stationery",
            Self::Prints => "Prints",
            Self::Stickers => "Stickers",
            Self::Apparel => "Apparel",
            Self::Accessories => "Accessories",
            Self::Uncategorized(raw) if raw.is_empty() => "Other",
            Self::Uncategorized(raw) => raw,
        }
    }

    /// CSS class for the category badge.
    #[must_use]
    pub const fn badge_class(&self) -> &'static str {
        match self {
            Self::Stationery => "badge badge-blue",
            Self::Prints => "badge badge-purple",
            Self::Stickers => "badge badge-pink",
            Self::Apparel => "badge badge-green",
            Self::Accessories => "badge badge-amber",
            Self::Uncategorized(_) => "badge badge-gray",
        }
    }

    /// Whether this category is one of the known ones.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Uncategorized(_))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<&str> for Category {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.slug())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Category filter for the product listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// The "all" sentinel: no filtering.
    #[default]
    All,
    /// Only products in exactly this category.
    Only(Category),
}

impl CategoryFilter {
    /// Sentinel value meaning "all categories".
    pub const ALL: &'static str = "all";

    /// Parse a filter from a query parameter. Blank values and `all` mean
    /// no filtering.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(Self::ALL) {
            Self::All
        } else {
            Self::Only(Category::parse(trimmed))
        }
    }

    /// Whether a product in `category` passes the filter.
    #[must_use]
    pub fn matches(&self, category: &Category) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == category,
        }
    }

    /// Value used in URLs.
    #[must_use]
    pub fn slug(&self) -> &str {
        match self {
            Self::All => Self::ALL,
            Self::Only(category) => category.slug(),
        }
    }
}
