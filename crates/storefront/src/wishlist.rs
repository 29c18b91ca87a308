//! Local mirror of the signed-in user's wishlist.
//!
//! An add is reconciled with a full read, since the service answers a
//! mutation with product ids only and the new item's summary is needed for
//! the page. A remove trims the cached items to the returned ids and
//! decrements the count optimistically; the next
//! [`WishlistSynchronizer::fetch`] supersedes both.

use std::sync::Arc;

use freshcart_core::ProductId;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::api::{AuthToken, CommerceApi, Wishlist};
use crate::cart::SyncError;
use crate::notify::Notifier;
use crate::session::AuthSession;
use crate::sync::{Mirror, Snapshot, SyncState};

/// Snapshot of the wishlist mirror.
pub type WishlistSnapshot = Snapshot<Wishlist>;

pub struct WishlistSynchronizer {
    api: Arc<dyn CommerceApi>,
    session: AuthSession,
    notifier: Notifier,
    mirror: Mirror<Wishlist>,
}

impl WishlistSynchronizer {
    #[must_use]
    pub fn new(api: Arc<dyn CommerceApi>, session: AuthSession, notifier: Notifier) -> Self {
        Self {
            api,
            session,
            notifier,
            mirror: Mirror::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<WishlistSnapshot> {
        self.mirror.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> WishlistSnapshot {
        self.mirror.snapshot()
    }

    #[must_use]
    pub fn wishlist(&self) -> Wishlist {
        self.mirror.data()
    }

    /// Whether a product is on the mirrored wishlist.
    #[must_use]
    pub fn contains(&self, product: &ProductId) -> bool {
        self.mirror.snapshot().data.contains(product)
    }

    fn token(&self) -> Result<AuthToken, SyncError> {
        self.session.token().ok_or(SyncError::NotAuthenticated)
    }

    /// Replace the mirror with the remote wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no session or the fetch fails.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> Result<Wishlist, SyncError> {
        let _guard = self.mirror.lock().await;
        let token = self.token()?;
        self.mirror.set_state(SyncState::Loading);

        match self.api.get_wishlist(&token).await {
            Ok(wishlist) => {
                debug!(items = wishlist.item_count, "Wishlist fetched");
                self.mirror.ready(wishlist.clone());
                Ok(wishlist)
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch wishlist");
                self.mirror
                    .set_state(SyncState::Error("Failed to load wishlist items".into()));
                self.notifier.error("Failed to load wishlist items");
                Err(e.into())
            }
        }
    }

    /// # Errors
    ///
    /// Returns an error if there is no session or the remote call fails.
    #[instrument(skip(self), fields(product_id = %product))]
    pub async fn add(&self, product: &ProductId) -> Result<Wishlist, SyncError> {
        self.mutate(product, true).await
    }

    /// # Errors
    ///
    /// Returns an error if there is no session or the remote call fails.
    #[instrument(skip(self), fields(product_id = %product))]
    pub async fn remove(&self, product: &ProductId) -> Result<Wishlist, SyncError> {
        self.mutate(product, false).await
    }

    /// Add when absent, remove when present. Returns the new membership.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no session or the remote call fails.
    pub async fn toggle(&self, product: &ProductId) -> Result<bool, SyncError> {
        if self.contains(product) {
            self.remove(product).await?;
            Ok(false)
        } else {
            self.add(product).await?;
            Ok(true)
        }
    }

    async fn mutate(&self, product: &ProductId, add: bool) -> Result<Wishlist, SyncError> {
        let _guard = self.mirror.lock().await;
        let token = self.token()?;
        let previous = self.mirror.snapshot();
        self.mirror.set_state(SyncState::Mutating);

        let result = if add {
            self.api.add_to_wishlist(&token, product).await
        } else {
            self.api.remove_from_wishlist(&token, product).await
        };

        let member_ids = match result {
            Ok(member_ids) => member_ids,
            Err(e) => {
                warn!(error = %e, "Wishlist mutation failed");
                self.mirror.restore(previous);
                self.notifier.error("Failed to update wishlist");
                return Err(e.into());
            }
        };

        if add {
            match self.api.get_wishlist(&token).await {
                Ok(wishlist) => self.mirror.ready(wishlist),
                Err(e) => {
                    warn!(error = %e, "Wishlist reconciliation failed, keeping local count");
                    self.mirror
                        .update(|wishlist| apply_change(wishlist, true, member_ids));
                }
            }
        } else {
            self.mirror
                .update(|wishlist| apply_change(wishlist, false, member_ids));
        }

        self.notifier.success(if add {
            "Added to wishlist"
        } else {
            "Removed from wishlist"
        });
        Ok(self.mirror.data())
    }

    /// Drop all local state (sign-out).
    pub fn reset(&self) {
        self.mirror.reset();
    }
}

/// Local view of a mutation the service accepted: membership from the
/// returned ids, count moved by one.
fn apply_change(wishlist: &mut Wishlist, add: bool, member_ids: Vec<ProductId>) {
    wishlist.item_count = if add {
        wishlist.item_count.saturating_add(1)
    } else {
        wishlist.item_count.saturating_sub(1)
    };
    wishlist.items.retain(|item| member_ids.contains(&item.id));
    wishlist.member_ids = member_ids;
}
