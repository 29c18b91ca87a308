//! Turning the cart into an order.

use freshcart_core::{CartId, PaymentMethodType};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::api::{ApiError, AuthToken, Order, ShippingAddress};
use crate::cart::{CartSynchronizer, SyncError};
use crate::forms::FieldErrors;
use crate::sync::SyncState;

/// How the shopper pays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentMethod {
    /// Order is placed immediately and paid on delivery.
    CashOnDelivery,
    /// Shopper is sent to a hosted payment page that returns to `return_url`.
    Online { return_url: Url },
}

impl PaymentMethod {
    /// Pick the variant for a validated form choice.
    #[must_use]
    pub fn from_choice(choice: PaymentMethodType, return_url: &Url) -> Self {
        match choice {
            PaymentMethodType::Cash => Self::CashOnDelivery,
            PaymentMethodType::Card => Self::Online {
                return_url: return_url.clone(),
            },
        }
    }
}

/// Result of a successful checkout.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutOutcome {
    /// Send the shopper here to pay.
    Redirect(Url),
    /// Cash order accepted.
    OrderPlaced(Order),
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("validation failed: {0}")]
    Validation(#[from] FieldErrors),

    #[error("not signed in")]
    NotAuthenticated,

    /// The user has no cart to check out.
    #[error("no cart to check out")]
    NoCart,

    #[error("payment failed: {0}")]
    Payment(#[source] ApiError),

    /// The payment session came back without a usable URL.
    #[error("payment session did not include a redirect URL")]
    MissingRedirect,
}

impl From<SyncError> for CheckoutError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::NotAuthenticated => Self::NotAuthenticated,
            SyncError::Api(e) => Self::Payment(e),
            SyncError::InvalidQuantity(_) => Self::NoCart,
        }
    }
}

const PAYMENT_FAILED: &str = "Payment failed. Please try again.";

impl CartSynchronizer {
    /// Place an order for a cart.
    ///
    /// `cart_id` is the cart named by the checkout page; without one the
    /// mirrored cart is used, read from the service if the mirror has no id.
    /// Other cart operations wait while the order call is in flight. A cash
    /// order is followed by a best-effort cart refresh, since the service
    /// empties the cart. One attempt only; failures are published.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no session or cart, the remote call
    /// fails, or an online session lacks a redirect URL.
    #[instrument(skip(self, address))]
    pub async fn checkout(
        &self,
        cart_id: Option<&CartId>,
        method: &PaymentMethod,
        address: &ShippingAddress,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let token = self.token()?;

        let guard = self.mirror.lock().await;
        let cart_id = self.cart_id_for_checkout(cart_id, &token).await?;
        let previous = self.mirror.snapshot();
        self.mirror.set_state(SyncState::Mutating);

        let result = self.place_order(&token, &cart_id, method, address).await;
        self.mirror.restore(previous);
        drop(guard);

        let outcome = result?;
        if matches!(outcome, CheckoutOutcome::OrderPlaced(_))
            && let Err(e) = self.fetch().await
        {
            debug!(error = %e, "Cart refresh after order failed");
        }
        Ok(outcome)
    }

    async fn place_order(
        &self,
        token: &AuthToken,
        cart_id: &CartId,
        method: &PaymentMethod,
        address: &ShippingAddress,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        match method {
            PaymentMethod::CashOnDelivery => {
                let order = self
                    .api
                    .create_cash_order(token, cart_id, address)
                    .await
                    .map_err(|e| self.payment_failed(e))?;
                info!(order_id = %order.id, "Cash order placed");
                Ok(CheckoutOutcome::OrderPlaced(order))
            }
            PaymentMethod::Online { return_url } => {
                let session = self
                    .api
                    .create_checkout_session(token, cart_id, address, return_url)
                    .await
                    .map_err(|e| self.payment_failed(e))?;

                let redirect = session
                    .url
                    .filter(|_| session.status.eq_ignore_ascii_case("success"))
                    .and_then(|url| Url::parse(&url).ok());
                let Some(redirect) = redirect else {
                    warn!(status = %session.status, "Payment session without redirect");
                    self.notifier.error(PAYMENT_FAILED);
                    return Err(CheckoutError::MissingRedirect);
                };
                info!(cart_id = %cart_id, "Payment session created");
                Ok(CheckoutOutcome::Redirect(redirect))
            }
        }
    }

    /// Called with the mirror lock held.
    async fn cart_id_for_checkout(
        &self,
        requested: Option<&CartId>,
        token: &AuthToken,
    ) -> Result<CartId, CheckoutError> {
        if let Some(id) = requested.cloned().or_else(|| self.mirror.data().id) {
            return Ok(id);
        }
        let cart = self
            .read_cart(token)
            .await
            .map_err(|e| self.payment_failed(e))?;
        self.mirror.ready(cart.clone());
        cart.id.ok_or(CheckoutError::NoCart)
    }

    fn payment_failed(&self, err: ApiError) -> CheckoutError {
        warn!(error = %err, "Checkout failed");
        self.notifier.error(PAYMENT_FAILED);
        CheckoutError::Payment(err)
    }
}
