//! Local mirror of the signed-in user's remote cart.
//!
//! The remote service owns the cart. Every mutation is sent, then followed by
//! a full reconciling fetch; item count and total always come from that
//! fetch and are never computed here. If the reconciling fetch fails the
//! mirror keeps its pre-mutation value.
//!
//! `clear()` is the exception: the mirror is reset to empty as soon as the
//! delete succeeds, without a confirming read.

use std::sync::Arc;

use freshcart_core::ProductId;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::api::{ApiError, AuthToken, Cart, CommerceApi};
use crate::notify::Notifier;
use crate::session::AuthSession;
use crate::sync::{Mirror, Snapshot, SyncState};

/// Errors from cart and wishlist synchronizers.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No session token; the caller should send the user to sign in.
    #[error("not signed in")]
    NotAuthenticated,

    /// Quantity below 1; rejected before any remote call.
    #[error("quantity must be at least 1, got {0}")]
    InvalidQuantity(u32),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Snapshot of the cart mirror.
pub type CartSnapshot = Snapshot<Cart>;

enum CartChange<'a> {
    Add(&'a ProductId),
    Remove(&'a ProductId),
    Update(&'a ProductId, u32),
}

impl CartChange<'_> {
    const fn success_message(&self) -> &'static str {
        match self {
            Self::Add(_) => "Added to cart successfully",
            Self::Remove(_) => "Item removed from cart",
            Self::Update(..) => "Quantity updated",
        }
    }

    const fn failure_message(&self) -> &'static str {
        match self {
            Self::Add(_) => "Failed to add to cart",
            Self::Remove(_) => "Failed to remove item",
            Self::Update(..) => "Failed to update quantity",
        }
    }
}

/// Keeps the local cart in step with the remote one.
pub struct CartSynchronizer {
    pub(crate) api: Arc<dyn CommerceApi>,
    pub(crate) session: AuthSession,
    pub(crate) notifier: Notifier,
    pub(crate) mirror: Mirror<Cart>,
}

impl CartSynchronizer {
    #[must_use]
    pub fn new(api: Arc<dyn CommerceApi>, session: AuthSession, notifier: Notifier) -> Self {
        Self {
            api,
            session,
            notifier,
            mirror: Mirror::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.mirror.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.mirror.snapshot()
    }

    /// The mirrored cart as of the last successful fetch.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.mirror.data()
    }

    pub(crate) fn token(&self) -> Result<AuthToken, SyncError> {
        self.session.token().ok_or(SyncError::NotAuthenticated)
    }

    /// Read the remote cart. A user with no cart yet has an empty one.
    pub(crate) async fn read_cart(&self, token: &AuthToken) -> Result<Cart, ApiError> {
        match self.api.get_cart(token).await {
            Err(ApiError::NotFound(message)) => {
                debug!(%message, "No remote cart, treating as empty");
                Ok(Cart::empty())
            }
            other => other,
        }
    }

    /// Replace the mirror with the remote cart.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no session or the fetch fails; the
    /// mirror moves to [`SyncState::Error`] in the latter case.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> Result<Cart, SyncError> {
        let _guard = self.mirror.lock().await;
        let token = self.token()?;
        self.mirror.set_state(SyncState::Loading);

        match self.read_cart(&token).await {
            Ok(cart) => {
                debug!(items = cart.item_count, "Cart fetched");
                self.mirror.ready(cart.clone());
                Ok(cart)
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch cart");
                self.mirror.set_state(SyncState::Error("Failed to load cart items".into()));
                self.notifier.error("Failed to load cart items");
                Err(e.into())
            }
        }
    }

    /// Add one unit of a product, then reconcile.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no session or either remote call fails.
    #[instrument(skip(self), fields(product_id = %product))]
    pub async fn add_item(&self, product: &ProductId) -> Result<Cart, SyncError> {
        self.mutate(CartChange::Add(product)).await
    }

    /// Remove a product line, then reconcile.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no session or either remote call fails.
    #[instrument(skip(self), fields(product_id = %product))]
    pub async fn remove_item(&self, product: &ProductId) -> Result<Cart, SyncError> {
        self.mutate(CartChange::Remove(product)).await
    }

    /// Set a line's quantity, then reconcile.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidQuantity`] for counts below 1 without
    /// contacting the service; otherwise as [`Self::add_item`].
    #[instrument(skip(self), fields(product_id = %product))]
    pub async fn update_quantity(&self, product: &ProductId, count: u32) -> Result<Cart, SyncError> {
        if count < 1 {
            return Err(SyncError::InvalidQuantity(count));
        }
        self.mutate(CartChange::Update(product, count)).await
    }

    async fn mutate(&self, change: CartChange<'_>) -> Result<Cart, SyncError> {
        let _guard = self.mirror.lock().await;
        let token = self.token()?;
        let previous = self.mirror.snapshot();
        self.mirror.set_state(SyncState::Mutating);

        let sent = match change {
            CartChange::Add(product) => self.api.add_to_cart(&token, product).await,
            CartChange::Remove(product) => self.api.remove_cart_item(&token, product).await,
            CartChange::Update(product, count) => {
                self.api.update_cart_item(&token, product, count).await
            }
        };
        if let Err(e) = sent {
            warn!(error = %e, "Cart mutation failed");
            self.mirror.restore(previous);
            self.notifier.error(change.failure_message());
            return Err(e.into());
        }

        match self.read_cart(&token).await {
            Ok(cart) => {
                self.mirror.ready(cart.clone());
                self.notifier.success(change.success_message());
                Ok(cart)
            }
            Err(e) => {
                warn!(error = %e, "Cart reconciliation failed, keeping previous state");
                self.mirror.restore(previous);
                self.notifier.error(change.failure_message());
                Err(e.into())
            }
        }
    }

    /// Delete the remote cart and reset the mirror to empty.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no session or the delete fails.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<(), SyncError> {
        let _guard = self.mirror.lock().await;
        let token = self.token()?;
        let previous = self.mirror.snapshot();
        self.mirror.set_state(SyncState::Mutating);

        match self.api.clear_cart(&token).await {
            Ok(()) => {
                self.mirror.ready(Cart::empty());
                self.notifier.success("Cart cleared successfully");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to clear cart");
                self.mirror.restore(previous);
                self.notifier.error("Failed to clear cart");
                Err(e.into())
            }
        }
    }

    /// Drop all local state (sign-out).
    pub fn reset(&self) {
        self.mirror.reset();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::notify::Level;
    use crate::testing::{FakeApi, signed_in_session};

    async fn synchronizer(api: &Arc<FakeApi>) -> (CartSynchronizer, Notifier) {
        let session = signed_in_session(api.clone()).await;
        let notifier = Notifier::new();
        (
            CartSynchronizer::new(api.clone(), session, notifier.clone()),
            notifier,
        )
    }

    #[tokio::test]
    async fn test_reconciled_count_matches_remote() {
        let api = Arc::new(FakeApi::with_catalog());
        let (cart, _) = synchronizer(&api).await;

        cart.add_item(&ProductId::new("p1")).await.unwrap();
        cart.add_item(&ProductId::new("p2")).await.unwrap();
        cart.add_item(&ProductId::new("p1")).await.unwrap();
        cart.remove_item(&ProductId::new("p2")).await.unwrap();
        let local = cart.add_item(&ProductId::new("p3")).await.unwrap();

        let remote = api.remote_cart();
        assert_eq!(local.item_count, remote.item_count);
        assert_eq!(local.total_price, remote.total_price);
        assert_eq!(cart.cart(), remote);
        assert_eq!(cart.snapshot().state, SyncState::Ready);
        assert_eq!(local.quantity_of(&ProductId::new("p1")), Some(2));
    }

    #[tokio::test]
    async fn test_zero_quantity_never_reaches_api() {
        let api = Arc::new(FakeApi::with_catalog());
        let (cart, _) = synchronizer(&api).await;
        cart.add_item(&ProductId::new("p1")).await.unwrap();
        let calls_before = api.calls().len();

        let err = cart
            .update_quantity(&ProductId::new("p1"), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::InvalidQuantity(0)));
        assert_eq!(api.calls().len(), calls_before);
        assert_eq!(cart.cart().quantity_of(&ProductId::new("p1")), Some(1));
    }

    #[tokio::test]
    async fn test_update_quantity_reconciles() {
        let api = Arc::new(FakeApi::with_catalog());
        let (cart, _) = synchronizer(&api).await;
        cart.add_item(&ProductId::new("p1")).await.unwrap();

        let updated = cart
            .update_quantity(&ProductId::new("p1"), 4)
            .await
            .unwrap();
        assert_eq!(updated.quantity_of(&ProductId::new("p1")), Some(4));
        assert_eq!(updated, api.remote_cart());
    }

    #[tokio::test]
    async fn test_clear_empties_without_refetch() {
        let api = Arc::new(FakeApi::with_catalog());
        let (cart, _) = synchronizer(&api).await;
        cart.add_item(&ProductId::new("p1")).await.unwrap();
        cart.add_item(&ProductId::new("p2")).await.unwrap();

        let calls_before = api.calls().len();
        cart.clear().await.unwrap();

        let local = cart.cart();
        assert_eq!(local.item_count, 0);
        assert!(local.lines.is_empty());
        assert!(local.total_price.is_zero());
        // Exactly one call: the delete, no confirming read.
        assert_eq!(api.calls()[calls_before..], ["clear_cart".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_reconciliation_keeps_previous_state() {
        let api = Arc::new(FakeApi::with_catalog());
        let (cart, notifier) = synchronizer(&api).await;
        cart.add_item(&ProductId::new("p1")).await.unwrap();
        let before = cart.snapshot();

        let mut notifications = notifier.subscribe();
        api.fail_get_cart(true);
        let err = cart.add_item(&ProductId::new("p2")).await.unwrap_err();
        assert!(matches!(err, SyncError::Api(_)));

        // The add went through remotely, but the mirror never saw it.
        assert_eq!(api.remote_cart().quantity_of(&ProductId::new("p2")), Some(1));
        assert_eq!(cart.snapshot(), before);

        let notification = notifications.try_recv().unwrap();
        assert_eq!(notification.level, Level::Error);
        assert_eq!(notification.message, "Failed to add to cart");
    }

    #[tokio::test]
    async fn test_missing_remote_cart_is_empty() {
        let api = Arc::new(FakeApi::with_catalog());
        let (cart, _) = synchronizer(&api).await;

        let fetched = cart.fetch().await.unwrap();
        assert!(fetched.is_empty());
        assert_eq!(cart.snapshot().state, SyncState::Ready);
    }

    #[tokio::test]
    async fn test_fetch_failure_moves_to_error() {
        let api = Arc::new(FakeApi::with_catalog());
        let (cart, _) = synchronizer(&api).await;
        api.fail_get_cart(true);

        assert!(cart.fetch().await.is_err());
        assert!(matches!(cart.snapshot().state, SyncState::Error(_)));
    }

    #[tokio::test]
    async fn test_signed_out_mutation_is_rejected() {
        let api = Arc::new(FakeApi::with_catalog());
        let session = AuthSession::new(
            api.clone(),
            Arc::new(crate::session::MemoryTokenStore::new()),
        );
        let cart = CartSynchronizer::new(api.clone(), session, Notifier::new());

        let err = cart.add_item(&ProductId::new("p1")).await.unwrap_err();
        assert!(matches!(err, SyncError::NotAuthenticated));
        assert!(api.calls().is_empty());
        assert_eq!(cart.snapshot().state, SyncState::Uninitialized);
    }
}
