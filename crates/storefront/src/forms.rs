//! Client-side form validation.
//!
//! Every form is checked before any remote call. Failures come back as
//! [`FieldErrors`], one message per offending field in form order, so a
//! front-end can render them next to the inputs.

use std::fmt;
use std::sync::LazyLock;

use freshcart_core::{Email, EmailError, PaymentMethodType, Phone, PhoneError};
use regex::Regex;

use crate::api::{Credentials, ShippingAddress, SignUpRequest};

/// Minimum password length accepted by every password field.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Display names: a capital letter followed by at least two letters or spaces.
static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][a-zA-Z\s]{2,}$").expect("Invalid regex"));

// =============================================================================
// FieldErrors
// =============================================================================

/// Validation failures keyed by form field, in the order they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<(&'static str, String)>);

impl FieldErrors {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Record a failure for `field`. Only the first message per field is kept.
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        if self.get(field).is_none() {
            self.0.push((field, message.into()));
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Message for a field, if it failed.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, message)| message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    /// `Ok(value)` when nothing failed.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed.
    pub fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, message)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

// =============================================================================
// Field checks
// =============================================================================

fn check_email(
    errors: &mut FieldErrors,
    field: &'static str,
    raw: &str,
    required: &str,
    invalid: &str,
) -> Option<Email> {
    match Email::parse(raw) {
        Ok(email) => Some(email),
        Err(EmailError::Empty) => {
            errors.push(field, required);
            None
        }
        Err(_) => {
            errors.push(field, invalid);
            None
        }
    }
}

fn check_phone(errors: &mut FieldErrors, raw: &str) -> Option<Phone> {
    match Phone::parse(raw) {
        Ok(phone) => Some(phone),
        Err(PhoneError::Empty) => {
            errors.push("phone", "Phone is required");
            None
        }
        Err(PhoneError::Invalid) => {
            errors.push("phone", "Phone is invalid");
            None
        }
    }
}

fn check_password(
    errors: &mut FieldErrors,
    field: &'static str,
    raw: &str,
    required: &str,
    too_short: &str,
) {
    if raw.is_empty() {
        errors.push(field, required);
    } else if raw.chars().count() < MIN_PASSWORD_LEN {
        errors.push(field, too_short);
    }
}

fn check_required(errors: &mut FieldErrors, field: &'static str, raw: &str, message: &str) {
    if raw.trim().is_empty() {
        errors.push(field, message);
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Sign-in form.
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    /// Validate into sign-in credentials.
    ///
    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(&self) -> Result<Credentials, FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = check_email(&mut errors, "email", &self.email, "Required", "Invalid email");
        check_password(
            &mut errors,
            "password",
            &self.password,
            "Required",
            "Password is too short - should be 8 chars minimum.",
        );

        match email {
            Some(email) if errors.is_empty() => Ok(Credentials {
                email,
                password: self.password.clone(),
            }),
            _ => Err(errors),
        }
    }
}

/// Account registration form.
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub re_password: String,
}

impl SignupForm {
    /// Validate into a sign-up request.
    ///
    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(&self) -> Result<SignUpRequest, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push("name", "Name is required");
        } else if !NAME_PATTERN.is_match(name) {
            errors.push(
                "name",
                "Name must start with a capital letter and be at least 3 characters",
            );
        }

        let email = check_email(
            &mut errors,
            "email",
            &self.email,
            "Email is required",
            "Email is invalid",
        );
        let phone = check_phone(&mut errors, &self.phone);
        check_password(
            &mut errors,
            "password",
            &self.password,
            "Password is required",
            "Password must be at least 8 characters",
        );

        if self.re_password.is_empty() {
            errors.push("rePassword", "Confirm password is required");
        } else if self.re_password != self.password {
            errors.push("rePassword", "Passwords do not match");
        }

        match (email, phone) {
            (Some(email), Some(phone)) if errors.is_empty() => Ok(SignUpRequest {
                name: name.to_string(),
                email,
                password: self.password.clone(),
                re_password: self.re_password.clone(),
                phone: phone.as_str().to_string(),
            }),
            _ => Err(errors),
        }
    }
}

/// "Forgot password" form.
#[derive(Debug, Clone, Default)]
pub struct ForgotPasswordForm {
    pub email: String,
}

impl ForgotPasswordForm {
    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(&self) -> Result<Email, FieldErrors> {
        let mut errors = FieldErrors::new();
        check_email(&mut errors, "email", &self.email, "Required", "Invalid email")
            .ok_or(errors)
    }
}

/// Emailed reset code entry.
#[derive(Debug, Clone, Default)]
pub struct VerifyCodeForm {
    pub reset_code: String,
}

impl VerifyCodeForm {
    /// Validate into the trimmed numeric code.
    ///
    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(&self) -> Result<String, FieldErrors> {
        let mut errors = FieldErrors::new();
        let code = self.reset_code.trim();

        if code.is_empty() {
            errors.push("resetCode", "Required");
        } else if !code.chars().all(|c| c.is_ascii_digit()) {
            errors.push("resetCode", "Must be a numeric code");
        } else if code.len() < 4 {
            errors.push("resetCode", "Code must be at least 4 characters");
        } else if code.len() > 10 {
            errors.push("resetCode", "Code must be at most 10 characters");
        }

        errors.finish(|| code.to_string())
    }
}

/// A validated password reset.
#[derive(Debug, Clone)]
pub struct PasswordReset {
    pub email: Email,
    pub new_password: String,
}

/// New password entry after a verified reset code.
#[derive(Debug, Clone, Default)]
pub struct ResetPasswordForm {
    pub email: String,
    pub new_password: String,
}

impl ResetPasswordForm {
    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(&self) -> Result<PasswordReset, FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = check_email(&mut errors, "email", &self.email, "Required", "Invalid email");
        check_password(
            &mut errors,
            "newPassword",
            &self.new_password,
            "Required",
            "Password must be at least 8 characters",
        );

        match email {
            Some(email) if errors.is_empty() => Ok(PasswordReset {
                email,
                new_password: self.new_password.clone(),
            }),
            _ => Err(errors),
        }
    }
}

/// A validated checkout submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingDetails {
    pub address: ShippingAddress,
    pub payment_method: PaymentMethodType,
}

/// Checkout form: where to ship and how to pay.
///
/// `payment_method` takes the form values `cod` or `online`.
#[derive(Debug, Clone, Default)]
pub struct ShippingForm {
    pub details: String,
    pub phone: String,
    pub city: String,
    pub payment_method: String,
}

impl ShippingForm {
    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(&self) -> Result<ShippingDetails, FieldErrors> {
        let mut errors = FieldErrors::new();
        check_required(&mut errors, "details", &self.details, "Details are required");
        let phone = check_phone(&mut errors, &self.phone);
        check_required(&mut errors, "city", &self.city, "City is required");

        let payment_method = match self.payment_method.trim() {
            "" => {
                errors.push("paymentMethod", "Payment method is required");
                None
            }
            m if m.eq_ignore_ascii_case("cod") => Some(PaymentMethodType::Cash),
            m if m.eq_ignore_ascii_case("online") => Some(PaymentMethodType::Card),
            _ => {
                errors.push("paymentMethod", "Payment method is invalid");
                None
            }
        };

        match (phone, payment_method) {
            (Some(phone), Some(payment_method)) if errors.is_empty() => Ok(ShippingDetails {
                address: ShippingAddress {
                    details: self.details.trim().to_string(),
                    phone: phone.as_str().to_string(),
                    city: self.city.trim().to_string(),
                },
                payment_method,
            }),
            _ => Err(errors),
        }
    }
}
