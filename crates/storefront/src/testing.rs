//! In-memory [`CommerceApi`] for unit tests.
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use freshcart_core::{
    BrandId, CartId, CategoryId, Email, OrderId, PaymentMethodType, Price, ProductId, UserId,
};
use rust_decimal::Decimal;
use url::Url;

use crate::api::{
    AccountUser, ApiError, AuthGrant, AuthToken, Brand, Cart, CartLine, Category,
    CheckoutSession, CommerceApi, Credentials, Order, Product, ProductSummary, ShippingAddress,
    SignUpRequest, Subcategory, Wishlist,
};
use crate::session::{AuthSession, MemoryTokenStore};

/// An unsigned JWT-shaped token carrying the given claims.
pub fn fake_token(user_id: &str, name: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = serde_json::json!({
        "id": user_id,
        "name": name,
        "role": "user",
        "iat": 1_700_000_000,
        "exp": 1_707_776_000,
    });
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}

/// A session for `user-1` restored from a stored token, without remote calls.
pub async fn signed_in_session(api: Arc<FakeApi>) -> AuthSession {
    let store = Arc::new(MemoryTokenStore::with_token(fake_token("user-1", "Mona")));
    let session = AuthSession::new(api, store);
    session.initialize().await.unwrap();
    session
}

struct RemoteCart {
    id: CartId,
    lines: Vec<(ProductId, u32)>,
}

struct FakeState {
    products: Vec<Product>,
    categories: Vec<Category>,
    brands: Vec<Brand>,
    cart: Option<RemoteCart>,
    carts_created: u32,
    wishlist: Vec<ProductId>,
    orders: Vec<Order>,
    calls: Vec<String>,
    sign_in_token: Option<String>,
    sign_in_error: Option<ApiError>,
    fail_get_cart: bool,
    fail_get_wishlist: bool,
    recovery_error: Option<ApiError>,
    fail_mutations: bool,
    checkout_url: Option<String>,
}

pub struct FakeApi {
    state: Mutex<FakeState>,
}

fn egp(amount: i64) -> Price {
    Price::store(Decimal::new(amount, 0))
}

fn product(id: &str, title: &str, category: &Category, price: i64) -> Product {
    Product {
        id: ProductId::new(id),
        title: title.to_string(),
        slug: title.to_lowercase().replace(' ', "-"),
        description: format!("{title} description"),
        price: egp(price),
        price_after_discount: None,
        image_cover: Some(format!("https://images.example.com/{id}.jpeg")),
        images: Vec::new(),
        category: Some(category.clone()),
        brand: None,
        subcategories: Vec::new(),
        ratings_average: 4.5,
        ratings_quantity: 10,
        quantity: 100,
        sold: 5,
    }
}

impl FakeApi {
    /// Empty catalog, no cart, sign-in succeeds for `user-1`.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                products: Vec::new(),
                categories: Vec::new(),
                brands: Vec::new(),
                cart: None,
                carts_created: 0,
                wishlist: Vec::new(),
                orders: Vec::new(),
                calls: Vec::new(),
                sign_in_token: Some(fake_token("user-1", "Mona")),
                sign_in_error: None,
                fail_get_cart: false,
                fail_get_wishlist: false,
                recovery_error: None,
                fail_mutations: false,
                checkout_url: Some("https://checkout.stripe.com/c/pay/cs_test_123".to_string()),
            }),
        }
    }

    /// Three products across two categories.
    pub fn with_catalog() -> Self {
        let api = Self::new();
        {
            let mut state = api.state();
            let fashion = Category {
                id: CategoryId::new("c1"),
                name: "Women's Fashion".to_string(),
                slug: "women's-fashion".to_string(),
                image: Some("https://images.example.com/c1.jpeg".to_string()),
            };
            let electronics = Category {
                id: CategoryId::new("c2"),
                name: "Electronics".to_string(),
                slug: "electronics".to_string(),
                image: None,
            };
            let mut earbuds = product("p3", "Wireless Earbuds", &electronics, 450);
            earbuds.price_after_discount = Some(egp(399));

            state.products = vec![
                product("p1", "Woman Shawl", &fashion, 149),
                product("p2", "Leather Handbag", &fashion, 300),
                earbuds,
            ];
            state.categories = vec![fashion, electronics];
            state.brands = vec![Brand {
                id: BrandId::new("b1"),
                name: "DeFacto".to_string(),
                slug: "defacto".to_string(),
                image: None,
            }];
        }
        api
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn record(&self, call: impl Into<String>) -> MutexGuard<'_, FakeState> {
        let mut state = self.state();
        state.calls.push(call.into());
        state
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn set_sign_in_token(&self, token: Option<String>) {
        self.state().sign_in_token = token;
    }

    pub fn fail_next_sign_in(&self, err: ApiError) {
        self.state().sign_in_error = Some(err);
    }

    pub fn fail_get_cart(&self, fail: bool) {
        self.state().fail_get_cart = fail;
    }

    pub fn fail_get_wishlist(&self, fail: bool) {
        self.state().fail_get_wishlist = fail;
    }

    /// The next forgot-password or verify-code call fails with `err`.
    pub fn fail_next_recovery(&self, err: ApiError) {
        self.state().recovery_error = Some(err);
    }

    pub fn fail_mutations(&self, fail: bool) {
        self.state().fail_mutations = fail;
    }

    pub fn set_checkout_url(&self, url: Option<String>) {
        self.state().checkout_url = url;
    }

    pub fn seed_wishlist(&self, ids: &[&str]) {
        self.state().wishlist = ids.iter().map(|id| ProductId::new(*id)).collect();
    }

    /// The cart as the service would report it right now.
    pub fn remote_cart(&self) -> Cart {
        build_cart(&self.state())
    }
}

fn server_error() -> ApiError {
    ApiError::Status {
        status: 500,
        message: "Internal Server Error".to_string(),
    }
}

fn find_product<'a>(state: &'a FakeState, id: &ProductId) -> Result<&'a Product, ApiError> {
    state
        .products
        .iter()
        .find(|p| &p.id == id)
        .ok_or_else(|| ApiError::NotFound(format!("No product for this id {id}")))
}

fn build_lines(state: &FakeState, lines: &[(ProductId, u32)]) -> Vec<CartLine> {
    lines
        .iter()
        .filter_map(|(id, count)| {
            let product = find_product(state, id).ok()?;
            Some(CartLine {
                product: ProductSummary::from(product),
                quantity: *count,
                unit_price: product.effective_price(),
            })
        })
        .collect()
}

fn total(lines: &[CartLine]) -> Price {
    let amount = lines
        .iter()
        .map(|line| line.unit_price.amount * Decimal::from(line.quantity))
        .sum::<Decimal>();
    Price::store(amount)
}

fn build_cart(state: &FakeState) -> Cart {
    let Some(cart) = &state.cart else {
        return Cart::empty();
    };
    let lines = build_lines(state, &cart.lines);
    Cart {
        id: Some(cart.id.clone()),
        item_count: u32::try_from(lines.len()).unwrap(),
        total_price: total(&lines),
        lines,
    }
}

fn grant(state: &mut FakeState) -> Result<AuthGrant, ApiError> {
    if let Some(err) = state.sign_in_error.take() {
        return Err(err);
    }
    Ok(AuthGrant {
        message: "success".to_string(),
        token: state.sign_in_token.clone(),
        user: Some(AccountUser {
            name: "Mona".to_string(),
            email: "shopper@example.com".to_string(),
            role: Some("user".to_string()),
        }),
    })
}

#[async_trait]
impl CommerceApi for FakeApi {
    async fn sign_up(&self, _request: &SignUpRequest) -> Result<AuthGrant, ApiError> {
        grant(&mut self.record("sign_up"))
    }

    async fn sign_in(&self, _credentials: &Credentials) -> Result<AuthGrant, ApiError> {
        grant(&mut self.record("sign_in"))
    }

    async fn forgot_password(&self, _email: &Email) -> Result<String, ApiError> {
        if let Some(err) = self.record("forgot_password").recovery_error.take() {
            return Err(err);
        }
        Ok("Reset code sent to your email".to_string())
    }

    async fn verify_reset_code(&self, _code: &str) -> Result<(), ApiError> {
        match self.record("verify_reset_code").recovery_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn reset_password(&self, _email: &Email, _new_password: &str) -> Result<(), ApiError> {
        self.record("reset_password");
        Ok(())
    }

    async fn products(&self) -> Result<Vec<Product>, ApiError> {
        Ok(self.record("products").products.clone())
    }

    async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let state = self.record("product");
        find_product(&state, id).cloned()
    }

    async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        Ok(self.record("categories").categories.clone())
    }

    async fn subcategories(&self, category: &CategoryId) -> Result<Vec<Subcategory>, ApiError> {
        self.record(format!("subcategories:{category}"));
        Ok(Vec::new())
    }

    async fn brands(&self) -> Result<Vec<Brand>, ApiError> {
        Ok(self.record("brands").brands.clone())
    }

    async fn get_cart(&self, _token: &AuthToken) -> Result<Cart, ApiError> {
        let state = self.record("get_cart");
        if state.fail_get_cart {
            return Err(server_error());
        }
        if state.cart.is_none() {
            return Err(ApiError::NotFound(
                "No cart exist for this user".to_string(),
            ));
        }
        Ok(build_cart(&state))
    }

    async fn add_to_cart(&self, _token: &AuthToken, product: &ProductId) -> Result<(), ApiError> {
        let mut state = self.record(format!("add_to_cart:{product}"));
        if state.fail_mutations {
            return Err(server_error());
        }
        find_product(&state, product)?;

        if state.cart.is_none() {
            state.carts_created += 1;
            let id = CartId::new(format!("cart-{}", state.carts_created));
            state.cart = Some(RemoteCart {
                id,
                lines: Vec::new(),
            });
        }
        if let Some(cart) = state.cart.as_mut() {
            match cart.lines.iter_mut().find(|(id, _)| id == product) {
                Some((_, count)) => *count += 1,
                None => cart.lines.push((product.clone(), 1)),
            }
        }
        Ok(())
    }

    async fn update_cart_item(
        &self,
        _token: &AuthToken,
        product: &ProductId,
        count: u32,
    ) -> Result<(), ApiError> {
        let mut state = self.record(format!("update_cart_item:{product}:{count}"));
        if state.fail_mutations {
            return Err(server_error());
        }
        state
            .cart
            .as_mut()
            .and_then(|cart| cart.lines.iter_mut().find(|(id, _)| id == product))
            .map(|(_, current)| *current = count)
            .ok_or_else(|| ApiError::NotFound("product not in cart".to_string()))
    }

    async fn remove_cart_item(
        &self,
        _token: &AuthToken,
        product: &ProductId,
    ) -> Result<(), ApiError> {
        let mut state = self.record(format!("remove_cart_item:{product}"));
        if state.fail_mutations {
            return Err(server_error());
        }
        if let Some(cart) = state.cart.as_mut() {
            cart.lines.retain(|(id, _)| id != product);
        }
        Ok(())
    }

    async fn clear_cart(&self, _token: &AuthToken) -> Result<(), ApiError> {
        let mut state = self.record("clear_cart");
        if state.fail_mutations {
            return Err(server_error());
        }
        state.cart = None;
        Ok(())
    }

    async fn get_wishlist(&self, _token: &AuthToken) -> Result<Wishlist, ApiError> {
        let state = self.record("get_wishlist");
        if state.fail_get_wishlist {
            return Err(server_error());
        }
        let items: Vec<ProductSummary> = state
            .wishlist
            .iter()
            .filter_map(|id| find_product(&state, id).ok())
            .map(ProductSummary::from)
            .collect();
        let count = u32::try_from(items.len()).unwrap();
        Ok(Wishlist::from_items(count, items))
    }

    async fn add_to_wishlist(
        &self,
        _token: &AuthToken,
        product: &ProductId,
    ) -> Result<Vec<ProductId>, ApiError> {
        let mut state = self.record(format!("add_to_wishlist:{product}"));
        if state.fail_mutations {
            return Err(server_error());
        }
        if !state.wishlist.contains(product) {
            state.wishlist.push(product.clone());
        }
        Ok(state.wishlist.clone())
    }

    async fn remove_from_wishlist(
        &self,
        _token: &AuthToken,
        product: &ProductId,
    ) -> Result<Vec<ProductId>, ApiError> {
        let mut state = self.record(format!("remove_from_wishlist:{product}"));
        if state.fail_mutations {
            return Err(server_error());
        }
        state.wishlist.retain(|id| id != product);
        Ok(state.wishlist.clone())
    }

    async fn user_orders(&self, _token: &AuthToken, user: &UserId) -> Result<Vec<Order>, ApiError> {
        Ok(self.record(format!("user_orders:{user}")).orders.clone())
    }

    async fn create_checkout_session(
        &self,
        _token: &AuthToken,
        cart: &CartId,
        _address: &ShippingAddress,
        _return_url: &Url,
    ) -> Result<CheckoutSession, ApiError> {
        let state = self.record(format!("create_checkout_session:{cart}"));
        if state.fail_mutations {
            return Err(server_error());
        }
        Ok(CheckoutSession {
            status: "success".to_string(),
            url: state.checkout_url.clone(),
        })
    }

    async fn create_cash_order(
        &self,
        _token: &AuthToken,
        cart: &CartId,
        address: &ShippingAddress,
    ) -> Result<Order, ApiError> {
        let mut state = self.record(format!("create_cash_order:{cart}"));
        let lines = match &state.cart {
            Some(remote) if &remote.id == cart => build_lines(&state, &remote.lines),
            _ => return Err(ApiError::NotFound(format!("No cart with id {cart}"))),
        };

        let order = Order {
            id: OrderId::new(format!("order-{}", state.orders.len() + 1)),
            total: total(&lines),
            lines,
            payment_method: PaymentMethodType::Cash,
            payment_status: false.into(),
            delivery_status: false.into(),
            created_at: Some(chrono::Utc::now()),
            shipping_address: Some(address.clone()),
        };
        state.orders.push(order.clone());
        state.cart = None;
        Ok(order)
    }
}
