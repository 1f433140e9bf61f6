//! Cart route handlers.
//!
//! The cart lives in the visitor's session. Each request opens its own
//! [`CartState`], mutates it, revalidates the lines against the catalog and
//! flushes the result back before responding. Mutations redirect back to the
//! page they came from with a flash notice.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use pressmark_core::selection::{ProductSelection, check_stock};
use pressmark_core::{CartItem, CurrencyCode, ItemKind, Price, PrintOptions, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::cart::{CartState, SessionCartStorage};
use crate::catalog::ProductCatalog;
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::models::Notice;
use crate::models::notice::push_flash;
use crate::routes::products::{PAPER_TYPES, PRINT_SIZES, product_href};
use crate::routes::{LayoutView, page_layout, safe_return_path};
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: String,
    pub href: String,
    pub name: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    /// Chosen options, e.g. "Color: black".
    pub details: Vec<String>,
    pub is_print_job: bool,
}

impl CartItemView {
    fn new(item: &CartItem, currency: CurrencyCode) -> Self {
        let mut details = Vec::new();
        if let Some(custom) = &item.customization {
            if let Some(color) = &custom.color {
                details.push(format!("Color: {color}"));
            }
            if let Some(size) = &custom.size {
                details.push(format!("Size: {size}"));
            }
            if let Some(text) = &custom.text {
                details.push(format!("Text: \u{201c}{text}\u{201d}"));
            }
            if let Some(font) = &custom.font {
                details.push(format!("Font: {font}"));
            }
        }
        if let Some(print) = &item.print_options {
            details.push(format!(
                "{} on {} paper, {}, {}",
                print.size,
                print.paper_type,
                if print.color { "color" } else { "black & white" },
                if print.duplex { "double-sided" } else { "single-sided" },
            ));
            details.push(format!("Copies: {}", print.copies));
        }

        Self {
            id: item.id.to_string(),
            href: product_href(&item.id),
            name: item.name.clone(),
            image: item.image.clone(),
            quantity: item.quantity,
            price: Price::new(item.price, currency).display(),
            line_price: Price::new(item.line_total(), currency).display(),
            details,
            is_print_job: item.kind == ItemKind::PrintJob,
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u64,
}

impl CartView {
    fn new(cart: &CartState<SessionCartStorage>, currency: CurrencyCode) -> Self {
        Self {
            items: cart
                .items()
                .iter()
                .map(|item| CartItemView::new(item, currency))
                .collect(),
            subtotal: Price::new(cart.subtotal(), currency).display(),
            item_count: cart.total_items(),
        }
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Open the visitor's cart.
///
/// A stored cart that cannot be read is reset and the visitor is told so on
/// the next rendered page.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub(crate) async fn open_cart(session: &Session) -> Result<CartState<SessionCartStorage>> {
    let cart = CartState::open(SessionCartStorage::read(session).await?);
    if cart.was_discarded() {
        push_flash(
            session,
            Notice::warning("Your saved cart could not be read and has been reset."),
        )
        .await?;
    }
    Ok(cart)
}

/// Write any pending cart changes back to the session.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub(crate) async fn save_cart(
    session: &Session,
    mut cart: CartState<SessionCartStorage>,
) -> Result<()> {
    cart.storage_mut().flush(session).await?;
    Ok(())
}

/// Check every line against the catalog and drop the ones that are gone.
async fn revalidate(
    state: &AppState,
    session: &Session,
    cart: &mut CartState<SessionCartStorage>,
) -> Result<()> {
    if cart.items().is_empty() {
        return Ok(());
    }

    let report = state.reconciler().reconcile(cart.items()).await;
    if !report.failed.is_empty() {
        tracing::warn!(
            failed = report.failed.len(),
            "Some cart lines could not be checked; keeping them"
        );
    }
    if !report.has_removals() {
        return Ok(());
    }

    cart.apply_reconciliation(&report);
    for line in &report.removed {
        tracing::info!(product_id = %line.id, reason = ?line.reason, "Removed unavailable cart line");
        push_flash(session, Notice::removed_from_cart(line)).await?;
    }
    Ok(())
}

/// Save the cart and redirect with a notice.
async fn finish(
    session: &Session,
    cart: CartState<SessionCartStorage>,
    notice: Option<Notice>,
    to: &str,
) -> Result<Response> {
    save_cart(session, cart).await?;
    if let Some(notice) = notice {
        push_flash(session, notice).await?;
    }
    Ok(Redirect::to(to).into_response())
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
///
/// Numbers and checkboxes arrive as raw strings so a malformed field falls
/// back to its default instead of rejecting the whole form.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub quantity: Option<String>,
    /// `product` (default) or `print_job`.
    pub kind: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub custom_text: Option<String>,
    pub font: Option<String>,
    pub duplex: Option<String>,
    pub color_print: Option<String>,
    pub paper_type: Option<String>,
    pub print_size: Option<String>,
    pub copies: Option<String>,
    pub return_to: Option<String>,
}

impl AddToCartForm {
    fn quantity(&self) -> i64 {
        self.quantity
            .as_deref()
            .map_or(Ok(1), |raw| raw.trim().parse())
            .unwrap_or(0)
    }

    fn is_print_job(&self) -> bool {
        self.kind.as_deref().map(str::trim) == Some("print_job")
    }

    fn print_options(&self) -> PrintOptions {
        let defaults = PrintOptions::default();
        let pick = |value: Option<&str>, allowed: &[&str], fallback: String| {
            value
                .map(str::trim)
                .filter(|v| allowed.contains(v))
                .map_or(fallback, str::to_string)
        };

        PrintOptions {
            duplex: checked(self.duplex.as_deref()),
            color: checked(self.color_print.as_deref()),
            paper_type: pick(self.paper_type.as_deref(), &PAPER_TYPES, defaults.paper_type),
            size: pick(self.print_size.as_deref(), &PRINT_SIZES, defaults.size),
            copies: self
                .copies
                .as_deref()
                .and_then(|raw| raw.trim().parse::<u32>().ok())
                .filter(|copies| *copies >= 1)
                .unwrap_or(defaults.copies),
        }
    }
}

fn checked(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("on" | "true" | "1" | "yes"))
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub id: String,
    pub quantity: String,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub id: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: LayoutView,
    pub cart: CartView,
}

/// Cart count badge fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u64,
}

/// Cart as returned by `/api/cart`.
#[derive(Debug, Serialize)]
pub struct CartJson {
    pub items: Vec<CartItem>,
    pub total_items: u64,
    #[serde(with = "rust_decimal::serde::str")]
    pub subtotal: Decimal,
    pub currency: &'static str,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse> {
    let mut cart = open_cart(&session).await?;
    revalidate(&state, &session, &mut cart).await?;
    let view = CartView::new(&cart, state.currency());
    save_cart(&session, cart).await?;

    Ok(CartShowTemplate {
        layout: page_layout(&session).await?,
        cart: view,
    })
}

/// Add a product (or print job) to the cart.
///
/// The product is looked up fresh so the stock guard sees the live level.
/// Rejections leave the cart untouched and send the visitor back with an
/// error notice.
#[instrument(skip(state, session, form), fields(product_id = %form.product_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let mut cart = open_cart(&session).await?;

    let Some(product_id) = ProductId::parse(&form.product_id) else {
        let back = safe_return_path(form.return_to.as_deref(), "/products");
        return finish(&session, cart, Some(Notice::error("Choose a product to add.")), &back).await;
    };
    let back = safe_return_path(form.return_to.as_deref(), &product_href(&product_id));

    let lookup = state.catalog().lookup_product(&product_id).await;
    if let Ok(product) = &lookup {
        state
            .reconciler()
            .record_lookup(&product_id, product.as_ref())
            .await;
    }
    let product = match lookup {
        Ok(Some(product)) if product.is_active => product,
        Ok(_) => {
            let notice = Notice::error("That product is no longer available.");
            return finish(&session, cart, Some(notice), &back).await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to look up product for add to cart");
            return finish(&session, cart, Some(Notice::from_catalog_error(&e)), &back).await;
        }
    };

    let mut selection = ProductSelection::for_product(&product);
    if let Some(color) = form.color.as_deref()
        && product.colors.iter().any(|c| c == color.trim())
    {
        selection.set_color(color);
    }
    if let Some(size) = form.size.as_deref()
        && product.sizes.iter().any(|s| s == size.trim())
    {
        selection.set_size(size);
    }
    if let Some(text) = form.custom_text.as_deref() {
        selection.set_custom_text(text);
    }

    let in_cart = cart.cart().get(&product_id).map_or(0, |line| line.quantity);
    let quantity = match selection.check_add(in_cart, form.quantity()) {
        Ok(quantity) => quantity,
        Err(e) => {
            tracing::info!(error = %e, "Rejected add to cart");
            let notice = Notice::error(format!("Could not add {}: {e}.", product.name));
            return finish(&session, cart, Some(notice), &back).await;
        }
    };

    let mut customization = selection.customization();
    customization.font = form
        .font
        .as_deref()
        .map(str::trim)
        .filter(|font| !font.is_empty())
        .map(str::to_string);

    let mut item = CartItem::from_product(&product).with_customization(customization);
    if form.is_print_job() {
        item = item.into_print_job(form.print_options());
    }

    let quantity_label = quantity.to_string();
    add_breadcrumb(
        "cart",
        "Added line",
        Some(&[
            ("product_id", product_id.as_str()),
            ("quantity", quantity_label.as_str()),
        ]),
    );
    cart.add(item, Some(quantity));
    revalidate(&state, &session, &mut cart).await?;

    let notice = Notice::success(format!("Added {} to your cart.", product.name));
    let to = safe_return_path(form.return_to.as_deref(), "/cart");
    finish(&session, cart, Some(notice), &to).await
}

/// Set the quantity of a cart line.
///
/// Raising a quantity checks the live stock level first; lowering it never
/// needs the backend.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let mut cart = open_cart(&session).await?;

    let quantity = form.quantity.trim().parse::<i64>().unwrap_or(0);
    let Some((id, current)) = ProductId::parse(&form.id).and_then(|id| {
        let current = cart.cart().get(&id)?.quantity;
        Some((id, current))
    }) else {
        return finish(&session, cart, None, "/cart").await;
    };

    if quantity > i64::from(current)
        && let Some(notice) = stock_notice(&state, &id, quantity).await
    {
        return finish(&session, cart, Some(notice), "/cart").await;
    }

    if cart.set_quantity(&id, quantity) {
        add_breadcrumb("cart", "Updated quantity", Some(&[("product_id", id.as_str())]));
        revalidate(&state, &session, &mut cart).await?;
    }

    finish(&session, cart, None, "/cart").await
}

/// Look `id` up live and explain why its line cannot hold `quantity` units.
async fn stock_notice(state: &AppState, id: &ProductId, quantity: i64) -> Option<Notice> {
    let product = match state.catalog().lookup_product(id).await {
        Ok(product) => product,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to look up product for quantity change");
            return Some(Notice::from_catalog_error(&e));
        }
    };
    state.reconciler().record_lookup(id, product.as_ref()).await;

    // Missing or inactive lines are left to revalidation
    let product = product.filter(|product| product.is_active)?;
    check_stock(product.stock, quantity.unsigned_abs())
        .err()
        .map(|e| Notice::error(format!("Could not update {}: {e}.", product.name)))
}

/// Remove a cart line.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let mut cart = open_cart(&session).await?;

    let removed = ProductId::parse(&form.id).and_then(|id| cart.remove(&id));
    let notice = match removed {
        Some(item) => {
            add_breadcrumb("cart", "Removed line", Some(&[("product_id", item.id.as_str())]));
            revalidate(&state, &session, &mut cart).await?;
            Some(Notice::info(format!("Removed {} from your cart.", item.name)))
        }
        None => None,
    };

    finish(&session, cart, notice, "/cart").await
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Response> {
    let mut cart = open_cart(&session).await?;
    let notice = cart.clear().then(|| {
        add_breadcrumb("cart", "Cleared cart", None);
        Notice::info("Your cart is now empty.")
    });
    finish(&session, cart, notice, "/cart").await
}

/// Cart count badge.
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<impl IntoResponse> {
    let cart = open_cart(&session).await?;
    let count = cart.total_items();
    save_cart(&session, cart).await?;
    Ok(CartCountTemplate { count })
}

/// Cart as JSON.
#[instrument(skip(state, session))]
pub async fn json(State(state): State<AppState>, session: Session) -> Result<Json<CartJson>> {
    let cart = open_cart(&session).await?;
    let body = CartJson {
        items: cart.items().to_vec(),
        total_items: cart.total_items(),
        subtotal: cart.subtotal(),
        currency: state.currency().code(),
    };
    save_cart(&session, cart).await?;
    Ok(Json(body))
}
