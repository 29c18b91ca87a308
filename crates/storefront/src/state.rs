//! Process-wide storefront context.
//!
//! [`Storefront`] is built once at start and handed to every front-end
//! action by reference. It owns the session, the synchronizers and the
//! catalog, and resets the per-user parts on sign-out.

use std::sync::Arc;

use freshcart_core::{CartId, ProductId};
use tracing::{debug, info, instrument};

use crate::api::{CommerceApi, RestClient};
use crate::cart::CartSynchronizer;
use crate::catalog::Catalog;
use crate::checkout::{CheckoutOutcome, PaymentMethod};
use crate::config::StorefrontConfig;
use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::forms::{LoginForm, ShippingForm, SignupForm};
use crate::notify::Notifier;
use crate::orders::OrderHistory;
use crate::routes::{GuardDecision, Route, guard};
use crate::session::{AuthSession, FileTokenStore, Identity, TokenStore};
use crate::views::{CartPage, OrdersPage, ProductDetail, WishlistPage};
use crate::wishlist::WishlistSynchronizer;

/// Storefront context shared by all front-end actions.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: StorefrontConfig,
    session: AuthSession,
    catalog: Catalog,
    cart: CartSynchronizer,
    wishlist: WishlistSynchronizer,
    orders: OrderHistory,
    notifier: Notifier,
}

impl Storefront {
    /// Create the context against the configured remote API, persisting the
    /// session token to `config.token_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self> {
        let api: Arc<dyn CommerceApi> = Arc::new(RestClient::new(&config.api)?);
        let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(config.token_path.clone()));
        Ok(Self::with_parts(config, api, store))
    }

    /// Create the context from an explicit API and token store.
    #[must_use]
    pub fn with_parts(
        config: StorefrontConfig,
        api: Arc<dyn CommerceApi>,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        let notifier = Notifier::new();
        let session = AuthSession::new(api.clone(), store);
        let catalog = Catalog::new(api.clone(), config.catalog_cache_ttl);
        let cart = CartSynchronizer::new(api.clone(), session.clone(), notifier.clone());
        let wishlist = WishlistSynchronizer::new(api.clone(), session.clone(), notifier.clone());
        let orders = OrderHistory::new(api, session.clone(), notifier.clone());

        Self {
            inner: Arc::new(StorefrontInner {
                config,
                session,
                catalog,
                cart,
                wishlist,
                orders,
                notifier,
            }),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn session(&self) -> &AuthSession {
        &self.inner.session
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn cart(&self) -> &CartSynchronizer {
        &self.inner.cart
    }

    #[must_use]
    pub fn wishlist(&self) -> &WishlistSynchronizer {
        &self.inner.wishlist
    }

    #[must_use]
    pub fn orders(&self) -> &OrderHistory {
        &self.inner.orders
    }

    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Restore any persisted session and load the user's cart and wishlist.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Option<Identity> {
        let identity = self.inner.session.initialize().await?;
        set_sentry_user(identity.user_id(), identity.name());
        self.refresh().await;
        Some(identity)
    }

    /// # Errors
    ///
    /// Returns an error if validation or sign-in fails.
    #[instrument(skip(self, form))]
    pub async fn login(&self, form: &LoginForm) -> Result<Identity> {
        match self.inner.session.login(form).await {
            Ok(identity) => Ok(self.signed_in(identity, "Login successful!").await),
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// # Errors
    ///
    /// Returns an error if validation or sign-up fails.
    #[instrument(skip(self, form))]
    pub async fn signup(&self, form: &SignupForm) -> Result<Identity> {
        match self.inner.session.signup(form).await {
            Ok(identity) => Ok(self.signed_in(identity, "Account created").await),
            Err(e) => Err(self.fail(e.into())),
        }
    }

    async fn signed_in(&self, identity: Identity, message: &str) -> Identity {
        set_sentry_user(identity.user_id(), identity.name());
        self.inner.notifier.success(message);
        self.refresh().await;
        identity
    }

    /// Load cart and wishlist side by side. Failures are already logged and
    /// published by the synchronizers.
    async fn refresh(&self) {
        let (cart, wishlist) = tokio::join!(self.inner.cart.fetch(), self.inner.wishlist.fetch());
        if let Err(e) = cart {
            debug!(error = %e, "Initial cart load failed");
        }
        if let Err(e) = wishlist {
            debug!(error = %e, "Initial wishlist load failed");
        }
    }

    /// Forget the session and every per-user mirror.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted token could not be removed; all
    /// in-memory state is reset regardless.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<()> {
        let result = self.inner.session.logout().await;
        self.inner.cart.reset();
        self.inner.wishlist.reset();
        clear_sentry_user();
        info!("Storefront state reset");
        result.map_err(|e| AppError::from(e).report())
    }

    // =========================================================================
    // Pages and actions
    // =========================================================================

    /// Resolve a path and apply the sign-in guard.
    #[must_use]
    pub fn navigate(&self, path: &str) -> GuardDecision {
        add_breadcrumb("navigation", "Opened page", Some(&[("path", path)]));
        guard(Route::parse(path), &self.inner.session)
    }

    #[must_use]
    pub fn cart_page(&self) -> CartPage {
        CartPage::from(&self.inner.cart.snapshot())
    }

    #[must_use]
    pub fn wishlist_page(&self) -> WishlistPage {
        WishlistPage::from(&self.inner.wishlist.snapshot())
    }

    /// # Errors
    ///
    /// Returns an error if there is no session or the orders cannot be read.
    pub async fn orders_page(&self) -> Result<OrdersPage> {
        let orders = self
            .inner
            .orders
            .orders()
            .await
            .map_err(|e| AppError::from(e).report())?;
        Ok(OrdersPage::from(orders.as_slice()))
    }

    /// Product page data: the product, its wishlist flag and related products.
    ///
    /// # Errors
    ///
    /// Returns an error if the product cannot be loaded. Related products
    /// are best-effort.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product_detail(&self, id: &ProductId) -> Result<ProductDetail> {
        let product = self.inner.catalog.product(id).await.map_err(|e| {
            self.inner.notifier.error("Failed to load product details");
            AppError::from(e).report()
        })?;

        let related = match product.category_name() {
            Some(category) => self
                .inner
                .catalog
                .related_products(category, Some(id))
                .await
                .unwrap_or_else(|e| {
                    debug!(error = %e, "Related products unavailable");
                    Vec::new()
                }),
            None => Vec::new(),
        };

        Ok(ProductDetail::new(
            product,
            &self.inner.wishlist.wishlist(),
            &related,
        ))
    }

    /// Remove from the wishlist page, then re-read the wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal fails.
    pub async fn remove_from_wishlist_page(&self, id: &ProductId) -> Result<()> {
        self.inner
            .wishlist
            .remove(id)
            .await
            .map_err(|e| AppError::from(e).report())?;
        if let Err(e) = self.inner.wishlist.fetch().await {
            debug!(error = %e, "Wishlist refresh after remove failed");
        }
        Ok(())
    }

    /// Validate the checkout form and place the order.
    ///
    /// `cart_id` comes from the checkout route; `None` checks out the
    /// mirrored cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the form is invalid or the checkout fails.
    #[instrument(skip(self, form))]
    pub async fn checkout(
        &self,
        cart_id: Option<&CartId>,
        form: &ShippingForm,
    ) -> Result<CheckoutOutcome> {
        let details = form.validate()?;
        let method =
            PaymentMethod::from_choice(details.payment_method, &self.inner.config.checkout_return_url);
        add_breadcrumb("checkout", "Submitted checkout", None);

        self.inner
            .cart
            .checkout(cart_id, &method, &details.address)
            .await
            .map_err(|e| AppError::from(e).report())
    }

    fn fail(&self, err: AppError) -> AppError {
        let err = err.report();
        self.inner.notifier.error(err.user_message());
        err
    }
}
