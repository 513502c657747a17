//! User-triggered operations
//!
//! Each action validates its input locally, calls the API, updates the cache
//! and reports the outcome through the context's notifier. Validation
//! failures return before any request is made and notify nothing.

use tracing::{debug, warn};

use crate::cache::{ResourceKey, Versioned};
use crate::context::AppContext;
use crate::error::ApiResult;
use crate::models::{Ack, CreatedReferral, Node, Position, ReferralLink, SessionUser};
use crate::validation::{ForgotPasswordForm, LoginForm, ResetPasswordForm, SignupForm};

/// Title and description of a success notification
type Message = (&'static str, &'static str);

const LOGIN_OK: Message = ("Login successful", "You have been logged in successfully");
const LOGIN_FAILED: &str = "Login failed";
const REGISTER_OK: Message = (
    "Registration successful",
    "Please activate your account to continue",
);
const REGISTER_FAILED: &str = "Registration failed";
const OTP_OK: Message = ("OTP sent", "Check your email for the verification code");
const OTP_FAILED: &str = "OTP request failed";
const FORGOT_OK: Message = (
    "Email sent",
    "Check your email for password reset instructions",
);
const FORGOT_FAILED: &str = "Request failed";
const RESET_OK: Message = (
    "Password reset successful",
    "You can now login with your new password",
);
const RESET_FAILED: &str = "Reset failed";
const LOGOUT_OK: Message = ("Logout successful", "You have been logged out successfully");
const REFERRAL_OK: Message = (
    "Referral link created",
    "Your referral link has been created successfully",
);
const REFERRAL_FAILED: &str = "Failed to create referral link";

/// Notify success or failure and pass the result through.
fn report<T>(ctx: &AppContext, result: ApiResult<T>, ok: Message, failed: &str) -> ApiResult<T> {
    match &result {
        Ok(_) => ctx.notifier().info(ok.0, ok.1),
        Err(e) => ctx.notifier().error(failed, &e.notification_message()),
    }
    result
}

/// Log in and persist the session cookie.
pub async fn login(ctx: &AppContext, form: &LoginForm) -> ApiResult<Ack> {
    let request = form.validate()?;
    debug!("Logging in as {}", request.id);

    let result = match ctx.client().login(&request).await {
        Ok(ack) => ctx.persist_session().map(|()| ack),
        Err(e) => Err(e),
    };
    if result.is_ok() {
        ctx.cache().invalidate(ResourceKey::User).await;
    }
    report(ctx, result, LOGIN_OK, LOGIN_FAILED)
}

/// Register a new user under a sponsor.
pub async fn register(ctx: &AppContext, form: &SignupForm) -> ApiResult<Ack> {
    let request = form.validate()?;
    let result = ctx.client().signup(&request).await;
    report(ctx, result, REGISTER_OK, REGISTER_FAILED)
}

/// Ask the server to email a signup verification code.
pub async fn request_otp(ctx: &AppContext, email: &str) -> ApiResult<Ack> {
    let request = ForgotPasswordForm {
        email: email.to_string(),
    }
    .validate()?;
    let result = ctx.client().request_otp(&request.email).await;
    report(ctx, result, OTP_OK, OTP_FAILED)
}

/// Start the password reset flow.
pub async fn forgot_password(ctx: &AppContext, form: &ForgotPasswordForm) -> ApiResult<Ack> {
    let request = form.validate()?;
    let result = ctx.client().forgot_password(&request).await;
    report(ctx, result, FORGOT_OK, FORGOT_FAILED)
}

/// Complete a password reset with the emailed token.
pub async fn reset_password(ctx: &AppContext, form: &ResetPasswordForm) -> ApiResult<Ack> {
    let request = form.validate()?;
    let result = ctx.client().reset_password(&request).await;
    report(ctx, result, RESET_OK, RESET_FAILED)
}

/// Log out. Local session state is torn down even if the server call fails;
/// only a failure to remove the local session is returned.
pub async fn logout(ctx: &AppContext) -> ApiResult<()> {
    let result = ctx.client().logout().await;
    ctx.teardown().await?;

    match result {
        Ok(_) => ctx.notifier().info(LOGOUT_OK.0, LOGOUT_OK.1),
        Err(e) => warn!("Server logout failed, local session cleared anyway: {}", e),
    }
    Ok(())
}

/// Create a referral link for the given placement side.
pub async fn create_referral_link(
    ctx: &AppContext,
    position: Position,
) -> ApiResult<CreatedReferral> {
    let result = ctx.client().create_referral_link(position).await;
    if result.is_ok() {
        ctx.cache().invalidate(ResourceKey::ReferralLinks).await;
    }
    report(ctx, result, REFERRAL_OK, REFERRAL_FAILED)
}

/// The logged-in user (cached, never retried).
pub async fn current_user(ctx: &AppContext) -> ApiResult<Versioned<SessionUser>> {
    ctx.cache().user(ctx.client()).await
}

/// The placement tree snapshot (cached); its version identifies the dataset.
pub async fn tree(ctx: &AppContext) -> ApiResult<Versioned<Vec<Node>>> {
    ctx.cache().tree(ctx.client()).await
}

/// Force the next tree read to refetch, then read it.
pub async fn refresh_tree(ctx: &AppContext) -> ApiResult<Versioned<Vec<Node>>> {
    ctx.cache().invalidate(ResourceKey::Tree).await;
    tree(ctx).await
}

/// Referral links of the current user (cached).
pub async fn referral_links(ctx: &AppContext) -> ApiResult<Versioned<Vec<ReferralLink>>> {
    ctx.cache().referral_links(ctx.client()).await
}

/// One referral link by code (not cached).
pub async fn referral_link(ctx: &AppContext, code: &str) -> ApiResult<ReferralLink> {
    ctx.client().referral_link(code).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::ApiError;
    use crate::notify::{Notifier, QueueSink};
    use std::sync::Arc;

    // Port 9 (discard) is never an HTTP server, so any request would fail.
    // These tests only exercise paths that return before the network.
    fn offline_context() -> (AppContext, Arc<QueueSink>) {
        let sink = Arc::new(QueueSink::new());
        let path = std::env::temp_dir()
            .join(format!("canopy-actions-test-{}", std::process::id()))
            .join("session");
        let ctx = AppContext::init(
            Config::for_api("http://127.0.0.1:9/api/v1", path),
            Notifier::new(sink.clone()),
        )
        .unwrap();
        (ctx, sink)
    }

    #[tokio::test]
    async fn test_short_sponsor_blocks_register_without_notification() {
        let (ctx, sink) = offline_context();
        let form = SignupForm {
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            mobile: "5551234567".to_string(),
            dial_code: "+1".to_string(),
            country: None,
            position: Position::Left,
            sponsor: "AL123".to_string(),
            password: "secret123".to_string(),
            confirm_password: "secret123".to_string(),
            otp: None,
            referral_code: None,
        };

        let err = register(&ctx, &form).await.unwrap_err();

        assert!(matches!(err, ApiError::Validation(_)));
        assert!(err.field_errors().iter().any(|f| f.field == "sponsor"));
        assert!(sink.drain().is_empty(), "validation must not notify");
    }

    #[tokio::test]
    async fn test_empty_login_is_rejected_locally() {
        let (ctx, sink) = offline_context();
        let err = login(&ctx, &LoginForm::default()).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(sink.drain().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_otp_email_is_rejected_locally() {
        let (ctx, _sink) = offline_context();
        let err = request_otp(&ctx, "not-an-email").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_report_notifies_failure_with_server_message() {
        let (ctx, sink) = offline_context();
        let result: ApiResult<()> = Err(ApiError::Status {
            status: 400,
            message: "Sponsor not found".to_string(),
        });

        let _ = report(&ctx, result, REGISTER_OK, REGISTER_FAILED);

        let drained = sink.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].title, "Registration failed");
        assert_eq!(drained[0].description, "Sponsor not found");
        assert!(drained[0].is_error());
    }

    #[tokio::test]
    async fn test_logout_clears_local_session_when_server_unreachable() {
        let sink = Arc::new(QueueSink::new());
        let path = std::env::temp_dir()
            .join(format!("canopy-actions-logout-{}", std::process::id()))
            .join("session");
        crate::session::SessionStore::new(path.clone())
            .save("token=abc")
            .unwrap();
        let ctx = AppContext::init(
            Config::for_api("http://127.0.0.1:9/api/v1", path.clone()),
            Notifier::new(sink.clone()),
        )
        .unwrap();
        assert!(ctx.has_session());

        logout(&ctx).await.unwrap();

        assert!(!ctx.has_session());
        assert_eq!(ctx.store().load().unwrap(), None);
        assert!(sink.drain().is_empty());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
