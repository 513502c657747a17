//! Client-side form validation
//!
//! Every form is checked before it is submitted; all failing fields are
//! reported together so they can be shown next to their inputs.

use crate::error::{ApiError, ApiResult, FieldError};
use crate::models::{
    ForgotPasswordRequest, LoginRequest, Position, ResetPasswordRequest, SignupRequest,
};

/// Required length of a sponsor code (`AL` + 8 digits by convention)
pub const SPONSOR_CODE_LEN: usize = 10;

/// Check a sponsor code.
///
/// Only the length is enforced; the `AL` prefix convention is not.
pub fn validate_sponsor_code(code: &str) -> Result<(), FieldError> {
    if code.chars().count() == SPONSOR_CODE_LEN {
        Ok(())
    } else {
        Err(FieldError::new(
            "sponsor",
            format!("Sponsor code must be exactly {} characters", SPONSOR_CODE_LEN),
        ))
    }
}

/// Check an email address has text on both sides of an `@`.
fn validate_email(email: &str) -> Result<(), FieldError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(FieldError::new("email", "Email is required"));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(FieldError::new("email", "Enter a valid email address")),
    }
}

fn require(errors: &mut Vec<FieldError>, field: &str, label: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, format!("{} is required", label)));
    }
}

fn finish<T>(errors: Vec<FieldError>, value: T) -> ApiResult<T> {
    if errors.is_empty() {
        Ok(value)
    } else {
        Err(ApiError::Validation(errors))
    }
}

/// Login form input
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub id: String,
    pub password: String,
}

impl LoginForm {
    /// Validate and convert into the request body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` listing every empty field.
    pub fn validate(&self) -> ApiResult<LoginRequest> {
        let mut errors = Vec::new();
        require(&mut errors, "id", "User ID", &self.id);
        require(&mut errors, "password", "Password", &self.password);
        finish(
            errors,
            LoginRequest {
                id: self.id.trim().to_string(),
                password: self.password.clone(),
            },
        )
    }
}

/// Registration form input, including the confirmation field
#[derive(Debug, Clone)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub dial_code: String,
    pub country: Option<String>,
    pub position: Position,
    pub sponsor: String,
    pub password: String,
    pub confirm_password: String,
    pub otp: Option<String>,
    pub referral_code: Option<String>,
}

impl SignupForm {
    /// Validate and convert into the request body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` listing every failing field.
    pub fn validate(&self) -> ApiResult<SignupRequest> {
        let mut errors = Vec::new();

        require(&mut errors, "name", "Full name", &self.name);
        if let Err(e) = validate_email(&self.email) {
            errors.push(e);
        }

        let mobile = self.mobile.trim();
        if mobile.is_empty() {
            errors.push(FieldError::new("mobile", "Mobile number is required"));
        } else if !mobile.chars().all(|c| c.is_ascii_digit()) {
            errors.push(FieldError::new(
                "mobile",
                "Mobile number must contain digits only",
            ));
        }

        require(&mut errors, "dialCode", "Dial code", &self.dial_code);

        if let Err(e) = validate_sponsor_code(self.sponsor.trim()) {
            errors.push(e);
        }

        require(&mut errors, "password", "Password", &self.password);
        if self.password != self.confirm_password {
            errors.push(FieldError::new("confirmPassword", "Passwords do not match"));
        }

        finish(
            errors,
            SignupRequest {
                name: self.name.trim().to_string(),
                mobile: mobile.to_string(),
                email: self.email.trim().to_string(),
                password: self.password.clone(),
                country: non_empty(&self.country),
                dial_code: self.dial_code.trim().trim_start_matches('+').to_string(),
                position: self.position,
                sponsor: self.sponsor.trim().to_string(),
                otp: non_empty(&self.otp),
                referral_code: non_empty(&self.referral_code),
            },
        )
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Forgot-password form input
#[derive(Debug, Clone, Default)]
pub struct ForgotPasswordForm {
    pub email: String,
}

impl ForgotPasswordForm {
    /// Validate and convert into the request body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the email is missing or malformed.
    pub fn validate(&self) -> ApiResult<ForgotPasswordRequest> {
        let errors = validate_email(&self.email).err().into_iter().collect();
        finish(
            errors,
            ForgotPasswordRequest {
                email: self.email.trim().to_string(),
            },
        )
    }
}

/// Reset-password form input
#[derive(Debug, Clone, Default)]
pub struct ResetPasswordForm {
    pub token: String,
    pub password: String,
    pub confirm_password: String,
}

impl ResetPasswordForm {
    /// Validate and convert into the request body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` listing every failing field.
    pub fn validate(&self) -> ApiResult<ResetPasswordRequest> {
        let mut errors = Vec::new();
        require(&mut errors, "token", "Reset token", &self.token);
        require(&mut errors, "password", "Password", &self.password);
        if self.password != self.confirm_password {
            errors.push(FieldError::new("confirmPassword", "Passwords do not match"));
        }
        finish(
            errors,
            ResetPasswordRequest {
                token: self.token.trim().to_string(),
                password: self.password.clone(),
            },
        )
    }
}
