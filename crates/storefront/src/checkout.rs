//! Checkout orchestration.
//!
//! Turns the cart into a payment-provider order payload, creates a
//! hosted checkout session through the payments service, and hands the
//! order snapshot across the redirect so the thanks page can render it
//! and clear the cart exactly once.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::api::{ApiClient, ApiError};
use crate::cart::{CartLine, CartStore, CartStorage};
use crate::error::StoreError;

/// Supported payment providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    Stripe,
    PayPal,
}

impl PaymentMethod {
    /// Path of the provider's session endpoint on the payments service.
    #[must_use]
    pub const fn endpoint_path(self) -> &'static str {
        match self {
            Self::Stripe => "/api/stripe/create-checkout-session",
            Self::PayPal => "/api/paypal/create-checkout-session",
        }
    }
}

/// A shipping choice made during checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingOption {
    /// Display name, e.g. "Express".
    pub name: String,
    /// Cost added to the order. Zero means free shipping.
    pub price: Decimal,
}

/// One item in the payload sent to the payments service.
///
/// Prices travel as plain JSON numbers; the provider quantizes them on
/// its side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
    pub description: String,
}

/// Request body for a create-checkout-session call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionRequest {
    pub items: Vec<OrderItem>,
    pub success_url: String,
    pub cancel_url: String,
}

/// Response from a create-checkout-session call.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionResponse {
    pub success: bool,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Cart snapshot carried across the payment redirect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOrder {
    pub lines: Vec<CartLine>,
    pub shipping: Option<ShippingOption>,
    pub timestamp: DateTime<Utc>,
}

/// Single-slot handoff store for the pending order.
pub trait PendingOrderStore {
    /// Store the order, replacing any previous one.
    fn put(&mut self, order: PendingOrder);

    /// Remove and return the stored order, if any.
    fn take(&mut self) -> Option<PendingOrder>;
}

/// In-memory pending-order slot.
#[derive(Debug, Default)]
pub struct MemoryPendingOrders {
    slot: Option<PendingOrder>,
}

impl PendingOrderStore for MemoryPendingOrders {
    fn put(&mut self, order: PendingOrder) {
        self.slot = Some(order);
    }

    fn take(&mut self) -> Option<PendingOrder> {
        self.slot.take()
    }
}

/// Creates hosted checkout sessions, abstracted for testability.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Create a session and return the hosted checkout URL.
    async fn create_checkout_session(
        &self,
        method: PaymentMethod,
        request: &CheckoutSessionRequest,
    ) -> Result<String, ApiError>;
}

impl PaymentGateway for ApiClient {
    async fn create_checkout_session(
        &self,
        method: PaymentMethod,
        request: &CheckoutSessionRequest,
    ) -> Result<String, ApiError> {
        let response: CheckoutSessionResponse =
            self.post_payment(method.endpoint_path(), request).await?;

        match (response.success, response.url) {
            (true, Some(url)) => Ok(url),
            _ => Err(ApiError::Gateway(
                response
                    .error
                    .unwrap_or_else(|| "session creation refused".to_string()),
            )),
        }
    }
}

/// Result of a checkout submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// Nothing to pay for; no session was created.
    EmptyCart,
    /// Session created; send the customer to this URL.
    RedirectTo(String),
}

/// Orchestrates the checkout round trip.
pub struct CheckoutFlow<G, P> {
    gateway: G,
    pending: P,
    success_url: String,
    cancel_url: String,
}

impl<G: PaymentGateway, P: PendingOrderStore> CheckoutFlow<G, P> {
    pub fn new(gateway: G, pending: P, success_url: String, cancel_url: String) -> Self {
        Self {
            gateway,
            pending,
            success_url,
            cancel_url,
        }
    }

    /// Build the provider payload for the given cart lines.
    ///
    /// Shipping is appended as a synthetic one-quantity item only when
    /// it actually costs something.
    #[must_use]
    pub fn build_order_payload(
        lines: &[CartLine],
        shipping: Option<&ShippingOption>,
    ) -> Vec<OrderItem> {
        let mut items: Vec<OrderItem> = lines
            .iter()
            .map(|line| OrderItem {
                name: line.title.clone(),
                price: line.unit_price,
                quantity: line.quantity,
                description: line
                    .description
                    .clone()
                    .filter(|d| !d.is_empty())
                    .unwrap_or_else(|| line.variant.clone()),
            })
            .collect();

        if let Some(shipping) = shipping
            && shipping.price > Decimal::ZERO
        {
            items.push(OrderItem {
                name: shipping.name.clone(),
                price: shipping.price,
                quantity: 1,
                description: "Shipping".to_string(),
            });
        }

        items
    }

    /// Submit the cart for payment.
    ///
    /// Validates locally before any network call: a missing payment
    /// method is an error, an empty cart short-circuits to
    /// [`CheckoutOutcome::EmptyCart`]. On success the cart snapshot is
    /// parked as a [`PendingOrder`] and the hosted checkout URL is
    /// returned. The cart itself is left untouched until
    /// [`Self::complete`].
    #[instrument(skip(self, cart, shipping))]
    pub async fn submit<S: CartStorage>(
        &mut self,
        cart: &CartStore<S>,
        method: Option<PaymentMethod>,
        shipping: Option<ShippingOption>,
    ) -> Result<CheckoutOutcome, StoreError> {
        let Some(method) = method else {
            return Err(StoreError::Validation(
                "no payment method selected".to_string(),
            ));
        };

        if cart.is_empty() {
            return Ok(CheckoutOutcome::EmptyCart);
        }

        let request = CheckoutSessionRequest {
            items: Self::build_order_payload(cart.lines(), shipping.as_ref()),
            success_url: self.success_url.clone(),
            cancel_url: self.cancel_url.clone(),
        };

        let url = self
            .gateway
            .create_checkout_session(method, &request)
            .await?;

        self.pending.put(PendingOrder {
            lines: cart.lines().to_vec(),
            shipping,
            timestamp: Utc::now(),
        });
        info!(?method, items = request.items.len(), "checkout session created");

        Ok(CheckoutOutcome::RedirectTo(url))
    }

    /// Finish checkout after the provider redirected back.
    ///
    /// Consumes the pending order and clears the cart. Idempotent: a
    /// second call (reload of the thanks page) finds no pending order,
    /// leaves the cart alone, and returns `None`.
    pub fn complete<S: CartStorage>(
        &mut self,
        cart: &mut CartStore<S>,
    ) -> Option<PendingOrder> {
        let order = self.pending.take()?;
        cart.clear();
        info!(lines = order.lines.len(), "checkout completed");
        Some(order)
    }
}
