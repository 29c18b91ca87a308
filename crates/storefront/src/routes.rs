//! Application routes and the sign-in guard.
//!
//! Every page except sign-in, registration and password recovery needs a
//! session. The guard is a capability check only: it looks for a token and
//! never validates it.

use std::borrow::Cow;
use std::fmt;

use freshcart_core::{CartId, ProductId};

use crate::session::AuthSession;

/// A page of the storefront.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Products,
    ProductDetails { category: String, id: ProductId },
    Categories,
    Brands,
    Cart,
    Wishlist,
    Checkout { cart_id: CartId },
    AllOrders,
    Login,
    Register,
    ForgetPassword,
    Verify,
    ResetPassword,
    /// Anything unrecognised; carries the requested path.
    NotFound(String),
}

impl Route {
    /// Resolve a path such as `/productdetails/Electronics/6428ebc6`.
    ///
    /// Query strings, fragments and a trailing slash are ignored.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let trimmed = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_matches('/');
        let segments: Vec<Cow<'_, str>> = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.split('/').map(decode).collect()
        };
        let segments: Vec<&str> = segments.iter().map(AsRef::as_ref).collect();

        match segments.as_slice() {
            [] => Self::Home,
            ["products"] => Self::Products,
            ["productdetails", category, id] if !id.is_empty() => Self::ProductDetails {
                category: (*category).to_string(),
                id: ProductId::new(*id),
            },
            ["categories"] => Self::Categories,
            ["brands"] => Self::Brands,
            ["cart"] => Self::Cart,
            ["wishlist"] => Self::Wishlist,
            ["checkout", cart_id] if !cart_id.is_empty() => Self::Checkout {
                cart_id: CartId::new(*cart_id),
            },
            ["allorders"] => Self::AllOrders,
            ["login"] => Self::Login,
            ["register"] => Self::Register,
            ["forget-password"] => Self::ForgetPassword,
            ["verify"] => Self::Verify,
            ["reset-password"] => Self::ResetPassword,
            _ => Self::NotFound(path.to_string()),
        }
    }

    /// Canonical path for this route.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Products => "/products".to_string(),
            Self::ProductDetails { category, id } => format!(
                "/productdetails/{}/{}",
                urlencoding::encode(category),
                urlencoding::encode(id.as_str())
            ),
            Self::Categories => "/categories".to_string(),
            Self::Brands => "/brands".to_string(),
            Self::Cart => "/cart".to_string(),
            Self::Wishlist => "/wishlist".to_string(),
            Self::Checkout { cart_id } => {
                format!("/checkout/{}", urlencoding::encode(cart_id.as_str()))
            }
            Self::AllOrders => "/allorders".to_string(),
            Self::Login => "/login".to_string(),
            Self::Register => "/register".to_string(),
            Self::ForgetPassword => "/forget-password".to_string(),
            Self::Verify => "/verify".to_string(),
            Self::ResetPassword => "/reset-password".to_string(),
            Self::NotFound(path) => path.clone(),
        }
    }

    /// Whether the page needs a signed-in user.
    #[must_use]
    pub const fn requires_auth(&self) -> bool {
        !matches!(
            self,
            Self::Login
                | Self::Register
                | Self::ForgetPassword
                | Self::Verify
                | Self::ResetPassword
                | Self::NotFound(_)
        )
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

fn decode(segment: &str) -> Cow<'_, str> {
    urlencoding::decode(segment).unwrap_or(Cow::Borrowed(segment))
}

/// What to do with a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Render(Route),
    RedirectToLogin,
}

/// Let the route through, or send a signed-out user to [`Route::Login`].
#[must_use]
pub fn guard(route: Route, session: &AuthSession) -> GuardDecision {
    if route.requires_auth() && !session.is_authenticated() {
        GuardDecision::RedirectToLogin
    } else {
        GuardDecision::Render(route)
    }
}
