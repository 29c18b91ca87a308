//! Order history of the signed-in user.

use std::sync::Arc;

use tracing::{instrument, warn};

use crate::api::{CommerceApi, Order};
use crate::cart::SyncError;
use crate::notify::Notifier;
use crate::session::AuthSession;

/// Reads past orders. Nothing is mirrored; each call goes to the service.
pub struct OrderHistory {
    api: Arc<dyn CommerceApi>,
    session: AuthSession,
    notifier: Notifier,
}

impl OrderHistory {
    #[must_use]
    pub fn new(api: Arc<dyn CommerceApi>, session: AuthSession, notifier: Notifier) -> Self {
        Self {
            api,
            session,
            notifier,
        }
    }

    /// Orders placed by the session's user, as the service returns them.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no session or the request fails.
    #[instrument(skip(self))]
    pub async fn orders(&self) -> Result<Vec<Order>, SyncError> {
        let identity = self.session.current().ok_or(SyncError::NotAuthenticated)?;

        self.api
            .user_orders(&identity.token, identity.user_id())
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to load orders");
                self.notifier.error("Failed to load orders");
                e.into()
            })
    }
}
