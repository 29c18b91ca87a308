//! Authenticated session: token persistence and decoded identity.
//!
//! The session token is the only piece of local state that survives a
//! restart. It is kept behind a [`TokenStore`] and decoded into [`Claims`]
//! on start, login and sign-up. The user id is always derived from the
//! token held; it is never set on its own.
//!
//! Token expiry is not checked here. The remote service rejects stale tokens
//! and the caller signs in again.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use freshcart_core::UserId;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiError, AuthGrant, AuthToken, CommerceApi};
use crate::forms::{
    FieldErrors, ForgotPasswordForm, LoginForm, ResetPasswordForm, SignupForm, VerifyCodeForm,
};

// =============================================================================
// Errors
// =============================================================================

/// Why a token could not be decoded.
#[derive(Debug, Error)]
pub enum TokenDecodeError {
    #[error("token is not a three-part JWT")]
    Malformed,

    #[error("token payload is not base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("token claims are not valid JSON: {0}")]
    Claims(#[from] serde_json::Error),
}

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Form input failed validation; nothing was sent.
    #[error("validation failed: {0}")]
    Validation(#[from] FieldErrors),

    /// Wrong email or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The service answered without success.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The service reported success but sent no token.
    #[error("response did not include a token")]
    MissingToken,

    /// The token could not be decoded.
    #[error("invalid token: {0}")]
    Decode(#[from] TokenDecodeError),

    /// Reading or writing the persisted token failed.
    #[error("token store error: {0}")]
    Store(#[from] io::Error),

    /// Remote call failed.
    #[error("API error: {0}")]
    Api(#[source] ApiError),
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized(_) => Self::InvalidCredentials,
            other => Self::Api(other),
        }
    }
}

// =============================================================================
// Claims
// =============================================================================

/// Claims carried in the token payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Claims {
    pub id: UserId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub iat: Option<i64>,
    /// Expiry as a Unix timestamp. Informational only.
    #[serde(default)]
    pub exp: Option<i64>,
}

/// Decode the payload segment of a JWT without verifying its signature.
///
/// # Errors
///
/// Returns an error if the token does not have three segments or the
/// payload is not base64url-encoded JSON claims.
pub fn decode_claims(token: &str) -> Result<Claims, TokenDecodeError> {
    let mut parts = token.trim().split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenDecodeError::Malformed);
    };

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
    Ok(serde_json::from_slice(&bytes)?)
}

// =============================================================================
// Token persistence
// =============================================================================

/// Where the session token is kept between runs.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// The stored token, if any.
    async fn load(&self) -> io::Result<Option<String>>;

    async fn save(&self, token: &str) -> io::Result<()>;

    /// Remove the stored token. Succeeds when nothing was stored.
    async fn clear(&self) -> io::Result<()>;
}

/// Token kept in a single file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> io::Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn save(&self, token: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, token).await
    }

    async fn clear(&self) -> io::Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Token kept in memory for the life of the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `token`.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> io::Result<Option<String>> {
        Ok(self.token.lock().await.clone())
    }

    async fn save(&self, token: &str) -> io::Result<()> {
        *self.token.lock().await = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> io::Result<()> {
        *self.token.lock().await = None;
        Ok(())
    }
}

// =============================================================================
// AuthSession
// =============================================================================

/// A signed-in user: the raw token plus what it says about them.
#[derive(Debug, Clone)]
pub struct Identity {
    pub token: AuthToken,
    pub claims: Claims,
}

impl Identity {
    /// Decode `token` into an identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be decoded.
    pub fn from_token(token: &str) -> Result<Self, TokenDecodeError> {
        let claims = decode_claims(token)?;
        Ok(Self {
            token: AuthToken::new(token.trim()),
            claims,
        })
    }

    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.claims.id
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.claims.name.as_deref()
    }
}

/// Holder of the current session.
///
/// Cheap to clone; clones share state. Identity changes are published on a
/// `watch` channel.
#[derive(Clone)]
pub struct AuthSession {
    inner: Arc<AuthSessionInner>,
}

struct AuthSessionInner {
    api: Arc<dyn CommerceApi>,
    store: Arc<dyn TokenStore>,
    identity: watch::Sender<Option<Identity>>,
}

impl AuthSession {
    #[must_use]
    pub fn new(api: Arc<dyn CommerceApi>, store: Arc<dyn TokenStore>) -> Self {
        let (identity, _) = watch::channel(None);
        Self {
            inner: Arc::new(AuthSessionInner {
                api,
                store,
                identity,
            }),
        }
    }

    /// Restore the session from the persisted token.
    ///
    /// Never fails: an unreadable or undecodable token leaves the session
    /// signed out, and an undecodable one is removed from the store.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Option<Identity> {
        let token = match self.inner.store.load().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("No persisted session token");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read persisted session token");
                return None;
            }
        };

        match Identity::from_token(&token) {
            Ok(identity) => {
                debug!(user_id = %identity.user_id(), "Restored session");
                self.inner.identity.send_replace(Some(identity.clone()));
                Some(identity)
            }
            Err(e) => {
                warn!(error = %e, "Discarding undecodable session token");
                if let Err(e) = self.inner.store.clear().await {
                    warn!(error = %e, "Failed to remove undecodable session token");
                }
                self.inner.identity.send_replace(None);
                None
            }
        }
    }

    /// Sign in and persist the new token.
    ///
    /// # Errors
    ///
    /// Returns an error if the form is invalid, the credentials are
    /// rejected, the response lacks a token or the token cannot be stored.
    #[instrument(skip(self, form))]
    pub async fn login(&self, form: &LoginForm) -> Result<Identity, AuthError> {
        let credentials = form.validate()?;
        let grant = self.inner.api.sign_in(&credentials).await?;
        let identity = self.adopt(grant).await?;
        info!(user_id = %identity.user_id(), "Signed in");
        Ok(identity)
    }

    /// Register, then adopt the returned token exactly as [`Self::login`] does.
    ///
    /// # Errors
    ///
    /// Same as [`Self::login`].
    #[instrument(skip(self, form))]
    pub async fn signup(&self, form: &SignupForm) -> Result<Identity, AuthError> {
        let request = form.validate()?;
        let grant = self.inner.api.sign_up(&request).await?;
        let identity = self.adopt(grant).await?;
        info!(user_id = %identity.user_id(), "Signed up");
        Ok(identity)
    }

    async fn adopt(&self, grant: AuthGrant) -> Result<Identity, AuthError> {
        if !grant.is_success() {
            return Err(AuthError::Rejected(grant.message));
        }
        let token = grant.token.ok_or(AuthError::MissingToken)?;
        let identity = Identity::from_token(&token)?;

        self.inner.store.save(identity.token.expose()).await?;
        self.inner.identity.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    /// Forget the token locally. No remote call.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted token could not be removed; the
    /// in-memory session is cleared regardless.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.inner.identity.send_replace(None);
        self.inner.store.clear().await?;
        info!("Signed out");
        Ok(())
    }

    /// Ask for a reset code by email. Returns the service's message.
    ///
    /// # Errors
    ///
    /// Returns an error if the form is invalid or the remote call fails.
    #[instrument(skip(self, form))]
    pub async fn forgot_password(&self, form: &ForgotPasswordForm) -> Result<String, AuthError> {
        let email = form.validate()?;
        Ok(self.inner.api.forgot_password(&email).await?)
    }

    /// # Errors
    ///
    /// Returns an error if the form is invalid or the code is rejected.
    #[instrument(skip(self, form))]
    pub async fn verify_reset_code(&self, form: &VerifyCodeForm) -> Result<(), AuthError> {
        let code = form.validate()?;
        self.inner
            .api
            .verify_reset_code(&code)
            .await
            .map_err(AuthError::Api)
    }

    /// Set a new password. The session is left unchanged; sign in afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the form is invalid or the remote call fails.
    #[instrument(skip(self, form))]
    pub async fn reset_password(&self, form: &ResetPasswordForm) -> Result<(), AuthError> {
        let reset = form.validate()?;
        self.inner
            .api
            .reset_password(&reset.email, &reset.new_password)
            .await
            .map_err(AuthError::Api)
    }

    #[must_use]
    pub fn current(&self) -> Option<Identity> {
        self.inner.identity.borrow().clone()
    }

    #[must_use]
    pub fn token(&self) -> Option<AuthToken> {
        self.inner
            .identity
            .borrow()
            .as_ref()
            .map(|identity| identity.token.clone())
    }

    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.inner
            .identity
            .borrow()
            .as_ref()
            .map(|identity| identity.user_id().clone())
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.identity.borrow().is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.inner.identity.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{FakeApi, fake_token};

    fn session(api: &Arc<FakeApi>, store: &Arc<MemoryTokenStore>) -> AuthSession {
        AuthSession::new(api.clone(), store.clone())
    }

    fn login_form() -> LoginForm {
        LoginForm {
            email: "shopper@example.com".into(),
            password: "password1".into(),
        }
    }

    #[test]
    fn test_decode_claims() {
        let claims = decode_claims(&fake_token("user-1", "Mona")).unwrap();
        assert_eq!(claims.id, UserId::new("user-1"));
        assert_eq!(claims.name.as_deref(), Some("Mona"));
        assert_eq!(claims.role.as_deref(), Some("user"));
    }

    #[test]
    fn test_decode_claims_tolerates_padding() {
        let token = fake_token("user-1", "Mona");
        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        parts[1].push_str("==");
        assert!(decode_claims(&parts.join(".")).is_ok());
    }

    #[test]
    fn test_decode_claims_rejects_garbage() {
        assert!(matches!(
            decode_claims("not-a-token"),
            Err(TokenDecodeError::Malformed)
        ));
        assert!(matches!(
            decode_claims("a.!!!.c"),
            Err(TokenDecodeError::Base64(_))
        ));
        let not_json = format!("h.{}.s", URL_SAFE_NO_PAD.encode("hello"));
        assert!(matches!(
            decode_claims(&not_json),
            Err(TokenDecodeError::Claims(_))
        ));
    }

    #[tokio::test]
    async fn test_login_then_reload_restores_identity() {
        let api = Arc::new(FakeApi::new());
        let store = Arc::new(MemoryTokenStore::new());

        let identity = session(&api, &store).login(&login_form()).await.unwrap();
        assert_eq!(identity.user_id(), &UserId::new("user-1"));

        // Simulated reload: a fresh holder over the same store.
        let reloaded = session(&api, &store);
        assert!(!reloaded.is_authenticated());
        let restored = reloaded.initialize().await.unwrap();
        assert_eq!(restored.claims, identity.claims);
        assert_eq!(restored.token.expose(), identity.token.expose());
        assert_eq!(reloaded.user_id(), Some(UserId::new("user-1")));
    }

    #[tokio::test]
    async fn test_login_validation_skips_remote_call() {
        let api = Arc::new(FakeApi::new());
        let store = Arc::new(MemoryTokenStore::new());
        let form = LoginForm {
            email: "bad".into(),
            password: "x".into(),
        };

        let err = session(&api, &store).login(&form).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_login_success_without_token_fails() {
        let api = Arc::new(FakeApi::new());
        api.set_sign_in_token(None);
        let store = Arc::new(MemoryTokenStore::new());

        let err = session(&api, &store).login(&login_form()).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingToken));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_rejected_credentials() {
        let api = Arc::new(FakeApi::new());
        api.fail_next_sign_in(ApiError::Unauthorized("Incorrect email or password".into()));
        let store = Arc::new(MemoryTokenStore::new());

        let holder = session(&api, &store);
        let err = holder.login(&login_form()).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert!(!holder.is_authenticated());
    }

    #[tokio::test]
    async fn test_initialize_discards_undecodable_token() {
        let api = Arc::new(FakeApi::new());
        let store = Arc::new(MemoryTokenStore::with_token("garbage"));

        let holder = session(&api, &store);
        assert!(holder.initialize().await.is_none());
        assert!(!holder.is_authenticated());
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_identity_and_store() {
        let api = Arc::new(FakeApi::new());
        let store = Arc::new(MemoryTokenStore::new());
        let holder = session(&api, &store);
        holder.login(&login_form()).await.unwrap();

        let mut rx = holder.subscribe();
        holder.logout().await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_none());
        assert!(holder.token().is_none());
        assert!(store.load().await.unwrap().is_none());
        assert!(!api.calls().iter().any(|call| call.starts_with("sign_out")));
    }

    #[tokio::test]
    async fn test_file_token_store_round_trip() {
        let dir = std::env::temp_dir().join(format!("freshcart-token-{}", std::process::id()));
        let store = FileTokenStore::new(dir.join("nested").join("token"));

        assert!(store.load().await.unwrap().is_none());
        store.save("abc.def.ghi").await.unwrap();
        assert_eq!(store.load().await.unwrap().as_deref(), Some("abc.def.ghi"));
        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_signup_adopts_token_and_survives_reload() {
        let api = Arc::new(FakeApi::new());
        api.set_sign_in_token(Some(fake_token("user-7", "Nour")));
        let store = Arc::new(MemoryTokenStore::new());
        let form = SignupForm {
            name: "Nour Hassan".into(),
            email: "nour@example.com".into(),
            phone: "01112345678".into(),
            password: "password1".into(),
            re_password: "password1".into(),
        };

        let holder = session(&api, &store);
        let identity = holder.signup(&form).await.unwrap();
        assert_eq!(identity.user_id(), &UserId::new("user-7"));
        assert!(holder.is_authenticated());
        assert_eq!(api.calls(), vec!["sign_up".to_string()]);
        assert_eq!(
            store.load().await.unwrap().as_deref(),
            Some(identity.token.expose())
        );

        let reloaded = session(&api, &store);
        let restored = reloaded.initialize().await.unwrap();
        assert_eq!(restored.claims, identity.claims);
        assert_eq!(restored.name(), Some("Nour"));
    }

    #[tokio::test]
    async fn test_signup_mismatched_passwords_skip_remote_call() {
        let api = Arc::new(FakeApi::new());
        let store = Arc::new(MemoryTokenStore::new());
        let form = SignupForm {
            name: "Nour Hassan".into(),
            email: "nour@example.com".into(),
            phone: "01112345678".into(),
            password: "password1".into(),
            re_password: "password2".into(),
        };

        let err = session(&api, &store).signup(&form).await.unwrap_err();
        let AuthError::Validation(errors) = err else {
            panic!("expected validation errors");
        };
        assert_eq!(errors.get("rePassword"), Some("Passwords do not match"));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_forgot_password_returns_service_message() {
        let api = Arc::new(FakeApi::new());
        let store = Arc::new(MemoryTokenStore::new());
        let holder = session(&api, &store);
        let form = ForgotPasswordForm {
            email: "shopper@example.com".into(),
        };

        let message = holder.forgot_password(&form).await.unwrap();
        assert_eq!(message, "Reset code sent to your email");

        api.fail_next_recovery(ApiError::NotFound(
            "There is no user with this email address".into(),
        ));
        let err = holder.forgot_password(&form).await.unwrap_err();
        assert!(matches!(err, AuthError::Api(ApiError::NotFound(_))));
        assert!(!holder.is_authenticated());
    }

    #[tokio::test]
    async fn test_rejected_reset_code() {
        let api = Arc::new(FakeApi::new());
        let store = Arc::new(MemoryTokenStore::new());
        let holder = session(&api, &store);
        let form = VerifyCodeForm {
            reset_code: "123456".into(),
        };

        api.fail_next_recovery(ApiError::UnexpectedResponse(
            "Reset code is invalid or has expired".into(),
        ));
        let err = holder.verify_reset_code(&form).await.unwrap_err();
        assert!(matches!(err, AuthError::Api(ApiError::UnexpectedResponse(_))));
        assert_eq!(api.calls(), vec!["verify_reset_code".to_string()]);

        holder.verify_reset_code(&form).await.unwrap();
        assert!(!holder.is_authenticated());
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reset_password_keeps_session_unchanged() {
        let api = Arc::new(FakeApi::new());
        let store = Arc::new(MemoryTokenStore::new());
        let holder = session(&api, &store);

        holder
            .reset_password(&ResetPasswordForm {
                email: "shopper@example.com".into(),
                new_password: "newpassword".into(),
            })
            .await
            .unwrap();
        assert!(!holder.is_authenticated());
        assert!(store.load().await.unwrap().is_none());
    }
}
