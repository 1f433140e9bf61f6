//! Application state shared across handlers.

use std::sync::Arc;

use pressmark_core::CurrencyCode;

use crate::cart::Reconciler;
use crate::catalog::{CatalogError, SupabaseClient};
use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the catalog client, the cart reconciler and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: SupabaseClient,
    reconciler: Reconciler<SupabaseClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog client cannot be built from the
    /// Supabase configuration.
    pub fn new(config: StorefrontConfig) -> Result<Self, CatalogError> {
        let catalog = SupabaseClient::new(config.supabase.as_ref(), &config.catalog)?;
        let mut reconciler = Reconciler::new(catalog.clone(), config.catalog.revalidate_after);
        if let Some(supabase) = &config.supabase {
            reconciler = reconciler.with_check_timeout(supabase.timeout);
        }

        if !catalog.is_configured() {
            tracing::warn!("SUPABASE_URL not set, storefront will run without a catalog");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                reconciler,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the catalog client.
    #[must_use]
    pub fn catalog(&self) -> &SupabaseClient {
        &self.inner.catalog
    }

    /// Get a reference to the cart reconciler.
    #[must_use]
    pub fn reconciler(&self) -> &Reconciler<SupabaseClient> {
        &self.inner.reconciler
    }

    /// Display currency.
    #[must_use]
    pub fn currency(&self) -> CurrencyCode {
        self.inner.config.currency
    }
}
