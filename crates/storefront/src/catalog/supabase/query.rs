//! PostgREST query building.
//!
//! Filters map onto PostgREST's horizontal filtering syntax:
//!
//! | Field          | Parameter                 |
//! |----------------|---------------------------|
//! | `id`           | `id=eq.{id}`              |
//! | `active_only`  | `is_active=eq.true`       |
//! | `featured_only`| `is_featured=eq.true`     |
//! | `limit`        | `limit={n}`               |
//!
//! Results are always ordered by `created_at.desc`.

use pressmark_core::ProductId;

/// A read against the products table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProductQuery {
    id: Option<ProductId>,
    active_only: bool,
    featured_only: bool,
    limit: Option<usize>,
}

impl ProductQuery {
    /// Active products only.
    #[must_use]
    pub fn active() -> Self {
        Self {
            active_only: true,
            ..Self::default()
        }
    }

    /// A single product by id, whatever its active flag.
    #[must_use]
    pub fn by_id(id: &ProductId) -> Self {
        Self {
            id: Some(id.clone()),
            limit: Some(1),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn featured(mut self) -> Self {
        self.featured_only = true;
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Query-string pairs for the PostgREST request.
    #[must_use]
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("select", "*".to_string())];

        if let Some(id) = &self.id {
            params.push(("id", format!("eq.{id}")));
        }
        if self.active_only {
            params.push(("is_active", "eq.true".to_string()));
        }
        if self.featured_only {
            params.push(("is_featured", "eq.true".to_string()));
        }

        params.push(("order", "created_at.desc".to_string()));

        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }

        params
    }
}
