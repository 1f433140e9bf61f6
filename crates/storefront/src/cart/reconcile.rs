//! Cart revalidation against the live catalog.
//!
//! Every line is checked independently and concurrently. A line whose
//! product no longer exists, or has been deactivated, is reported for
//! removal. A check that fails (timeout, network error, unconfigured
//! backend) leaves the line alone: revalidation is best-effort and never
//! empties a cart because the backend is unreachable.
//!
//! Verdicts are cached per product for `CART_REVALIDATE_SECS`, so a busy
//! visitor does not trigger a lookup per line on every click.

use std::collections::HashMap;
use std::time::Duration;

use moka::future::Cache;
use pressmark_core::{CartItem, Product, ProductId};
use tokio::task::JoinSet;
use tracing::instrument;

use crate::catalog::{CatalogError, ProductCatalog};

/// Upper bound for a single product lookup.
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of checking one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Available,
    Removed(RemovalReason),
}

impl Verdict {
    fn of(product: Option<&Product>) -> Self {
        match product {
            Some(product) if product.is_active => Self::Available,
            Some(_) => Self::Removed(RemovalReason::Inactive),
            None => Self::Removed(RemovalReason::Missing),
        }
    }
}

/// Why a line was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// The backend has no product with this id.
    Missing,
    /// The product exists but is no longer for sale.
    Inactive,
}

/// A line that must leave the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedLine {
    pub id: ProductId,
    pub name: String,
    pub reason: RemovalReason,
}

/// A line whose check could not be completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedCheck {
    pub id: ProductId,
    pub error: String,
}

/// Result of a reconciliation pass, in cart order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub removed: Vec<RemovedLine>,
    pub failed: Vec<FailedCheck>,
}

impl ReconcileReport {
    /// Whether any line must be removed.
    #[must_use]
    pub const fn has_removals(&self) -> bool {
        !self.removed.is_empty()
    }
}

/// Checks cart lines against a [`ProductCatalog`].
#[derive(Clone)]
pub struct Reconciler<C> {
    catalog: C,
    verdicts: Cache<ProductId, Verdict>,
    check_timeout: Duration,
}

impl<C: ProductCatalog> Reconciler<C> {
    /// Create a reconciler that reuses verdicts for `revalidate_after`.
    #[must_use]
    pub fn new(catalog: C, revalidate_after: Duration) -> Self {
        Self {
            catalog,
            verdicts: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(revalidate_after)
                .build(),
            check_timeout: DEFAULT_CHECK_TIMEOUT,
        }
    }

    /// Override the per-lookup timeout.
    #[must_use]
    pub const fn with_check_timeout(mut self, timeout: Duration) -> Self {
        self.check_timeout = timeout;
        self
    }

    /// Remember the result of a live lookup made outside a reconciliation
    /// pass, replacing any cached verdict for `id`.
    pub async fn record_lookup(&self, id: &ProductId, product: Option<&Product>) {
        self.verdicts.insert(id.clone(), Verdict::of(product)).await;
    }

    /// Check every line in `items`.
    #[instrument(skip(self, items), fields(lines = items.len()))]
    pub async fn reconcile(&self, items: &[CartItem]) -> ReconcileReport {
        let mut verdicts: HashMap<ProductId, Verdict> = HashMap::new();
        let mut checks = JoinSet::new();

        for item in items {
            if verdicts.contains_key(&item.id) {
                continue;
            }
            if let Some(verdict) = self.verdicts.get(&item.id).await {
                verdicts.insert(item.id.clone(), verdict);
                continue;
            }

            let catalog = self.catalog.clone();
            let id = item.id.clone();
            let timeout = self.check_timeout;
            checks.spawn(async move {
                let outcome = tokio::time::timeout(timeout, catalog.lookup_product(&id)).await;
                (id, outcome)
            });
        }

        let mut failures: HashMap<ProductId, String> = HashMap::new();

        while let Some(joined) = checks.join_next().await {
            let (id, outcome) = match joined {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(error = %e, "Cart line check task failed");
                    continue;
                }
            };

            match outcome.map_err(|_| "timed out".to_string()).and_then(
                |lookup: Result<_, CatalogError>| lookup.map_err(|e| e.to_string()),
            ) {
                Ok(product) => {
                    let verdict = Verdict::of(product.as_ref());
                    self.verdicts.insert(id.clone(), verdict).await;
                    verdicts.insert(id, verdict);
                }
                Err(error) => {
                    tracing::warn!(product_id = %id, %error, "Could not revalidate cart line");
                    failures.insert(id, error);
                }
            }
        }

        let mut report = ReconcileReport::default();
        for item in items {
            if let Some(Verdict::Removed(reason)) = verdicts.get(&item.id) {
                report.removed.push(RemovedLine {
                    id: item.id.clone(),
                    name: item.name.clone(),
                    reason: *reason,
                });
            } else if let Some(error) = failures.remove(&item.id) {
                report.failed.push(FailedCheck {
                    id: item.id.clone(),
                    error,
                });
            }
        }

        if report.has_removals() {
            tracing::info!(removed = report.removed.len(), "Cart lines no longer available");
        }

        report
    }
}
