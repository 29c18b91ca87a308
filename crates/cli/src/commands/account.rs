//! Sign-in, sign-up and password recovery.

use freshcart_storefront::Storefront;
use freshcart_storefront::error::AppError;
use freshcart_storefront::forms::{
    ForgotPasswordForm, LoginForm, ResetPasswordForm, SignupForm, VerifyCodeForm,
};

use super::reported;
use crate::render;

pub async fn login(
    storefront: &Storefront,
    email: String,
    password: String,
) -> Result<String, AppError> {
    let identity = storefront.login(&LoginForm { email, password }).await?;
    Ok(format!("Signed in as {}", render::identity(Some(&identity))))
}

pub async fn signup(
    storefront: &Storefront,
    name: String,
    email: String,
    phone: String,
    password: String,
    re_password: String,
) -> Result<String, AppError> {
    let form = SignupForm {
        name,
        email,
        phone,
        password,
        re_password,
    };
    let identity = storefront.signup(&form).await?;
    Ok(format!("Signed in as {}", render::identity(Some(&identity))))
}

pub async fn logout(storefront: &Storefront) -> Result<String, AppError> {
    storefront.sign_out().await?;
    Ok("Signed out".to_string())
}

pub fn whoami(storefront: &Storefront) -> String {
    render::identity(storefront.session().current().as_ref())
}

pub async fn forgot_password(storefront: &Storefront, email: String) -> Result<String, AppError> {
    storefront
        .session()
        .forgot_password(&ForgotPasswordForm { email })
        .await
        .map_err(reported)
}

pub async fn verify_reset_code(
    storefront: &Storefront,
    reset_code: String,
) -> Result<String, AppError> {
    storefront
        .session()
        .verify_reset_code(&VerifyCodeForm { reset_code })
        .await
        .map_err(reported)?;
    Ok("Code accepted; set a new password with `freshcart password reset`".to_string())
}

pub async fn reset_password(
    storefront: &Storefront,
    email: String,
    new_password: String,
) -> Result<String, AppError> {
    storefront
        .session()
        .reset_password(&ResetPasswordForm {
            email,
            new_password,
        })
        .await
        .map_err(reported)?;
    Ok("Password updated; sign in with `freshcart login`".to_string())
}
