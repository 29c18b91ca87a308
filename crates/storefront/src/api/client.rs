//! `reqwest` implementation of [`CommerceApi`].

use std::sync::Arc;

use async_trait::async_trait;
use freshcart_core::{CartId, CategoryId, Email, ProductId, UserId};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::conversions::{
    convert_auth, convert_brand, convert_cart, convert_category, convert_checkout_session,
    convert_member_ids, convert_order, convert_product, convert_subcategory, convert_wishlist,
};
use super::wire::{
    AuthResponse, CartResponse, CheckoutSessionResponse, CountBody, DataEnvelope, EmailBody,
    ErrorBody, ListEnvelope, ProductIdBody, ResetCodeBody, ResetPasswordBody, ShippingBody,
    StatusResponse, WireBrand, WireCategory, WireOrder, WireProduct, WireSubcategory,
    WishlistMutationResponse, WishlistResponse,
};
use super::{
    ApiError, AuthGrant, AuthToken, Brand, Cart, Category, CheckoutSession, CommerceApi,
    Credentials, Order, Product, ShippingAddress, SignUpRequest, Subcategory, Wishlist,
};
use crate::config::ApiConfig;

/// Longest slice of a response body copied into logs and errors.
const BODY_SNIPPET_LEN: usize = 500;

// =============================================================================
// RestClient
// =============================================================================

/// Client for the remote commerce REST API.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct RestClient {
    inner: Arc<RestClientInner>,
}

struct RestClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl RestClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("FreshCart/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(RestClientInner {
                client: builder.build()?,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// The API root all endpoints are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Start a request, attaching the session token header when given.
    fn request(&self, method: Method, url: Url, token: Option<&AuthToken>) -> RequestBuilder {
        let builder = self.inner.client.request(method, url);
        match token {
            Some(token) => builder.header("token", token.expose()),
            None => builder,
        }
    }

    /// Send a request and decode a success body.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(status_error(status, &response_text));
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %snippet(&response_text),
                "Failed to parse commerce API response"
            );
            ApiError::Parse(e)
        })
    }
}

/// Map a non-success response to an [`ApiError`], keeping the server's message.
fn status_error(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

    match status {
        StatusCode::UNAUTHORIZED => {
            debug!(%status, %message, "Commerce API rejected credentials");
            ApiError::Unauthorized(message)
        }
        StatusCode::NOT_FOUND => {
            debug!(%status, %message, "Commerce API resource not found");
            ApiError::NotFound(message)
        }
        _ => {
            tracing::error!(
                status = %status,
                body = %snippet(body),
                "Commerce API returned non-success status"
            );
            ApiError::Status {
                status: status.as_u16(),
                message,
            }
        }
    }
}

fn snippet(body: &str) -> String {
    body.chars().take(BODY_SNIPPET_LEN).collect()
}

fn segment(id: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(id)
}

#[async_trait]
impl CommerceApi for RestClient {
    // =========================================================================
    // Auth
    // =========================================================================

    #[instrument(skip(self, request), fields(email = %request.email))]
    async fn sign_up(&self, request: &SignUpRequest) -> Result<AuthGrant, ApiError> {
        let url = self.endpoint("auth/signup")?;
        let response: AuthResponse = self
            .execute(self.request(Method::POST, url, None).json(request))
            .await?;
        Ok(convert_auth(response))
    }

    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthGrant, ApiError> {
        let url = self.endpoint("auth/signin")?;
        let response: AuthResponse = self
            .execute(self.request(Method::POST, url, None).json(credentials))
            .await?;
        Ok(convert_auth(response))
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn forgot_password(&self, email: &Email) -> Result<String, ApiError> {
        let url = self.endpoint("auth/forgotPasswords")?;
        let body = EmailBody {
            email: email.as_str(),
        };
        let response: StatusResponse = self
            .execute(self.request(Method::POST, url, None).json(&body))
            .await?;
        Ok(response
            .message
            .unwrap_or_else(|| "Reset code sent to your email".to_string()))
    }

    #[instrument(skip(self, code))]
    async fn verify_reset_code(&self, code: &str) -> Result<(), ApiError> {
        let url = self.endpoint("auth/verifyResetCode")?;
        let body = ResetCodeBody { reset_code: code };
        let response: StatusResponse = self
            .execute(self.request(Method::POST, url, None).json(&body))
            .await?;
        let accepted = response
            .status
            .or(response.status_msg)
            .is_some_and(|s| s.eq_ignore_ascii_case("success"));
        if accepted {
            Ok(())
        } else {
            Err(ApiError::UnexpectedResponse(
                response
                    .message
                    .unwrap_or_else(|| "reset code was not accepted".to_string()),
            ))
        }
    }

    #[instrument(skip(self, new_password), fields(email = %email))]
    async fn reset_password(&self, email: &Email, new_password: &str) -> Result<(), ApiError> {
        let url = self.endpoint("auth/resetPassword")?;
        let body = ResetPasswordBody {
            email: email.as_str(),
            new_password,
        };
        // The response carries a fresh token; the caller signs in again instead.
        let _: serde_json::Value = self
            .execute(self.request(Method::PUT, url, None).json(&body))
            .await?;
        Ok(())
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    #[instrument(skip(self))]
    async fn products(&self) -> Result<Vec<Product>, ApiError> {
        let url = self.endpoint("products")?;
        let envelope: ListEnvelope<WireProduct> =
            self.execute(self.request(Method::GET, url, None)).await?;
        Ok(envelope.data.into_iter().map(convert_product).collect())
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let url = self.endpoint(&format!("products/{}", segment(id.as_str())))?;
        let envelope: DataEnvelope<WireProduct> =
            self.execute(self.request(Method::GET, url, None)).await?;
        Ok(convert_product(envelope.data))
    }

    #[instrument(skip(self))]
    async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        let url = self.endpoint("categories")?;
        let envelope: ListEnvelope<WireCategory> =
            self.execute(self.request(Method::GET, url, None)).await?;
        Ok(envelope.data.into_iter().map(convert_category).collect())
    }

    #[instrument(skip(self), fields(category_id = %category))]
    async fn subcategories(&self, category: &CategoryId) -> Result<Vec<Subcategory>, ApiError> {
        let url = self.endpoint(&format!(
            "categories/{}/subcategories",
            segment(category.as_str())
        ))?;
        let envelope: ListEnvelope<WireSubcategory> =
            self.execute(self.request(Method::GET, url, None)).await?;
        Ok(envelope.data.into_iter().map(convert_subcategory).collect())
    }

    #[instrument(skip(self))]
    async fn brands(&self) -> Result<Vec<Brand>, ApiError> {
        let url = self.endpoint("brands")?;
        let envelope: ListEnvelope<WireBrand> =
            self.execute(self.request(Method::GET, url, None)).await?;
        Ok(envelope.data.into_iter().map(convert_brand).collect())
    }

    // =========================================================================
    // Cart
    // =========================================================================

    #[instrument(skip(self, token))]
    async fn get_cart(&self, token: &AuthToken) -> Result<Cart, ApiError> {
        let url = self.endpoint("cart")?;
        let response: CartResponse = self
            .execute(self.request(Method::GET, url, Some(token)))
            .await?;
        Ok(convert_cart(response))
    }

    #[instrument(skip(self, token), fields(product_id = %product))]
    async fn add_to_cart(&self, token: &AuthToken, product: &ProductId) -> Result<(), ApiError> {
        let url = self.endpoint("cart")?;
        let body = ProductIdBody {
            product_id: product.as_str(),
        };
        let _: serde_json::Value = self
            .execute(self.request(Method::POST, url, Some(token)).json(&body))
            .await?;
        Ok(())
    }

    #[instrument(skip(self, token), fields(product_id = %product, count))]
    async fn update_cart_item(
        &self,
        token: &AuthToken,
        product: &ProductId,
        count: u32,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("cart/{}", segment(product.as_str())))?;
        let _: serde_json::Value = self
            .execute(
                self.request(Method::PUT, url, Some(token))
                    .json(&CountBody { count }),
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self, token), fields(product_id = %product))]
    async fn remove_cart_item(
        &self,
        token: &AuthToken,
        product: &ProductId,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("cart/{}", segment(product.as_str())))?;
        let _: serde_json::Value = self
            .execute(self.request(Method::DELETE, url, Some(token)))
            .await?;
        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn clear_cart(&self, token: &AuthToken) -> Result<(), ApiError> {
        let url = self.endpoint("cart")?;
        let _: serde_json::Value = self
            .execute(self.request(Method::DELETE, url, Some(token)))
            .await?;
        Ok(())
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    #[instrument(skip(self, token))]
    async fn get_wishlist(&self, token: &AuthToken) -> Result<Wishlist, ApiError> {
        let url = self.endpoint("wishlist")?;
        let response: WishlistResponse = self
            .execute(self.request(Method::GET, url, Some(token)))
            .await?;
        Ok(convert_wishlist(response))
    }

    #[instrument(skip(self, token), fields(product_id = %product))]
    async fn add_to_wishlist(
        &self,
        token: &AuthToken,
        product: &ProductId,
    ) -> Result<Vec<ProductId>, ApiError> {
        let url = self.endpoint("wishlist")?;
        let body = ProductIdBody {
            product_id: product.as_str(),
        };
        let response: WishlistMutationResponse = self
            .execute(self.request(Method::POST, url, Some(token)).json(&body))
            .await?;
        Ok(convert_member_ids(response.data))
    }

    #[instrument(skip(self, token), fields(product_id = %product))]
    async fn remove_from_wishlist(
        &self,
        token: &AuthToken,
        product: &ProductId,
    ) -> Result<Vec<ProductId>, ApiError> {
        let url = self.endpoint(&format!("wishlist/{}", segment(product.as_str())))?;
        let response: WishlistMutationResponse = self
            .execute(self.request(Method::DELETE, url, Some(token)))
            .await?;
        Ok(convert_member_ids(response.data))
    }

    // =========================================================================
    // Orders
    // =========================================================================

    #[instrument(skip(self, token), fields(user_id = %user))]
    async fn user_orders(&self, token: &AuthToken, user: &UserId) -> Result<Vec<Order>, ApiError> {
        let url = self.endpoint(&format!("orders/user/{}", segment(user.as_str())))?;
        // This endpoint returns a bare array rather than an envelope.
        let orders: Vec<WireOrder> = self
            .execute(self.request(Method::GET, url, Some(token)))
            .await?;
        Ok(orders.into_iter().map(convert_order).collect())
    }

    #[instrument(skip(self, token, address), fields(cart_id = %cart))]
    async fn create_checkout_session(
        &self,
        token: &AuthToken,
        cart: &CartId,
        address: &ShippingAddress,
        return_url: &Url,
    ) -> Result<CheckoutSession, ApiError> {
        let mut url = self.endpoint(&format!(
            "orders/checkout-session/{}",
            segment(cart.as_str())
        ))?;
        // The service appends its own paths to this value.
        url.query_pairs_mut()
            .append_pair("url", return_url.as_str().trim_end_matches('/'));

        let body = ShippingBody {
            shipping_address: address,
        };
        let response: CheckoutSessionResponse = self
            .execute(self.request(Method::POST, url, Some(token)).json(&body))
            .await?;
        Ok(convert_checkout_session(response))
    }

    #[instrument(skip(self, token, address), fields(cart_id = %cart))]
    async fn create_cash_order(
        &self,
        token: &AuthToken,
        cart: &CartId,
        address: &ShippingAddress,
    ) -> Result<Order, ApiError> {
        let url = self.endpoint(&format!("orders/{}", segment(cart.as_str())))?;
        let body = ShippingBody {
            shipping_address: address,
        };
        let envelope: DataEnvelope<WireOrder> = self
            .execute(self.request(Method::POST, url, Some(token)).json(&body))
            .await?;
        Ok(convert_order(envelope.data))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> RestClient {
        let base = Url::parse("https://ecommerce.routemisr.com/api/v1").unwrap();
        RestClient::new(&ApiConfig::new(base)).unwrap()
    }

    #[test]
    fn test_endpoints_resolve_under_base() {
        let client = client();
        assert_eq!(
            client.endpoint("cart").unwrap().as_str(),
            "https://ecommerce.routemisr.com/api/v1/cart"
        );
        assert_eq!(
            client
                .endpoint(&format!("products/{}", segment("6428ebc6dc1175abc65ca0b9")))
                .unwrap()
                .as_str(),
            "https://ecommerce.routemisr.com/api/v1/products/6428ebc6dc1175abc65ca0b9"
        );
    }

    #[test]
    fn test_path_segments_are_encoded() {
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
    }

    #[test]
    fn test_status_error_mapping() {
        let err = status_error(
            StatusCode::UNAUTHORIZED,
            r#"{"statusMsg":"fail","message":"Invalid Token. please login again"}"#,
        );
        assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "Invalid Token. please login again"));

        let err = status_error(
            StatusCode::NOT_FOUND,
            r#"{"status":"fail","message":"No cart exist for this user"}"#,
        );
        assert!(matches!(err, ApiError::NotFound(_)));

        let err = status_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert!(matches!(
            err,
            ApiError::Status { status: 502, ref message } if message == "Bad Gateway"
        ));
    }
}
