//! Session commands
//!
//! Implements `cnp login`, `cnp otp`, `cnp forgot-password`,
//! `cnp reset-password`, `cnp logout` and `cnp whoami`.

use canopy_core::{
    AppContext, ForgotPasswordForm, LoginForm, ResetPasswordForm, SessionUser, actions,
};
use clap::Args;

use super::{ack_text, prompt_line};
use crate::error::CliResult;

/// Log in and save the session
#[derive(Debug, Args)]
pub struct LoginCommand {
    /// User ID (e.g. AL00000001)
    #[arg(long)]
    pub id: String,

    /// Password (prompted on stdin when omitted)
    #[arg(long)]
    pub password: Option<String>,
}

impl LoginCommand {
    /// Execute the login command.
    ///
    /// On success the session cookie is written to the session file so later
    /// commands are authenticated.
    pub async fn execute(&self, ctx: &AppContext) -> CliResult<String> {
        let password = match &self.password {
            Some(password) => password.clone(),
            None => prompt_line("Password")?,
        };
        let form = LoginForm {
            id: self.id.clone(),
            password,
        };
        actions::login(ctx, &form).await?;
        Ok(format!("Logged in as {}", self.id.trim()))
    }
}

/// Request a signup verification code by email
#[derive(Debug, Args)]
pub struct OtpCommand {
    /// Email address to send the code to
    #[arg(long)]
    pub email: String,
}

impl OtpCommand {
    pub async fn execute(&self, ctx: &AppContext) -> CliResult<String> {
        let ack = actions::request_otp(ctx, &self.email).await?;
        Ok(ack_text(&ack, "Verification code sent"))
    }
}

/// Send password reset instructions
#[derive(Debug, Args)]
pub struct ForgotPasswordCommand {
    /// Account email address
    #[arg(long)]
    pub email: String,
}

impl ForgotPasswordCommand {
    pub async fn execute(&self, ctx: &AppContext) -> CliResult<String> {
        let form = ForgotPasswordForm {
            email: self.email.clone(),
        };
        let ack = actions::forgot_password(ctx, &form).await?;
        Ok(ack_text(&ack, "Password reset instructions sent"))
    }
}

/// Set a new password using an emailed reset token
#[derive(Debug, Args)]
pub struct ResetPasswordCommand {
    /// Token from the reset email
    #[arg(long)]
    pub token: String,

    /// New password (prompted when omitted)
    #[arg(long)]
    pub password: Option<String>,

    /// Repeat of the new password (prompted when omitted)
    #[arg(long)]
    pub confirm_password: Option<String>,
}

impl ResetPasswordCommand {
    pub async fn execute(&self, ctx: &AppContext) -> CliResult<String> {
        let password = match &self.password {
            Some(password) => password.clone(),
            None => prompt_line("New password")?,
        };
        let confirm_password = match &self.confirm_password {
            Some(confirm) => confirm.clone(),
            None if self.password.is_some() => password.clone(),
            None => prompt_line("Confirm password")?,
        };
        let form = ResetPasswordForm {
            token: self.token.clone(),
            password,
            confirm_password,
        };
        let ack = actions::reset_password(ctx, &form).await?;
        Ok(ack_text(&ack, "Password has been reset"))
    }
}

/// Log out and forget the saved session
#[derive(Debug, Args)]
pub struct LogoutCommand {}

impl LogoutCommand {
    /// Execute the logout command.
    ///
    /// The saved session is removed even when the server call fails.
    pub async fn execute(&self, ctx: &AppContext) -> CliResult<String> {
        actions::logout(ctx).await?;
        Ok("Logged out".to_string())
    }
}

/// Show the logged-in user
#[derive(Debug, Args)]
pub struct WhoamiCommand {}

/// Result of the whoami command
#[derive(Debug)]
pub struct WhoamiResult {
    pub user: SessionUser,
}

impl std::fmt::Display for WhoamiResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let user = &self.user;
        writeln!(f, "ID:       {}", user.id)?;
        writeln!(f, "Name:     {}", user.name)?;
        write!(f, "Role:     {}", user.role)?;
        if let Some(email) = &user.email {
            write!(f, "\nEmail:    {}", email)?;
        }
        if let Some(mobile) = &user.mobile {
            write!(f, "\nMobile:   {}", mobile)?;
        }
        if let Some(position) = user.position {
            write!(f, "\nPosition: {}", position)?;
        }
        if let Some(active) = user.is_active {
            write!(f, "\nStatus:   {}", if active { "Active" } else { "Inactive" })?;
        }
        if user.is_blocked == Some(true) {
            write!(f, "\nBlocked:  yes")?;
        }
        Ok(())
    }
}

impl WhoamiCommand {
    pub async fn execute(&self, ctx: &AppContext) -> CliResult<WhoamiResult> {
        let user = actions::current_user(ctx).await?;
        Ok(WhoamiResult {
            user: (*user.value).clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_core::{Position, Role};

    fn user() -> SessionUser {
        SessionUser {
            id: "AL00000001".to_string(),
            name: "Root Admin".to_string(),
            role: Role::Admin,
            email: Some("admin@example.com".to_string()),
            mobile: None,
            position: Some(Position::Left),
            is_active: Some(true),
            is_blocked: None,
        }
    }

    #[test]
    fn test_whoami_display() {
        let text = WhoamiResult { user: user() }.to_string();
        assert!(text.starts_with("ID:       AL00000001\n"));
        assert!(text.contains("Role:     ADMIN"));
        assert!(text.contains("Email:    admin@example.com"));
        assert!(text.contains("Position: LEFT"));
        assert!(text.contains("Status:   Active"));
        assert!(!text.contains("Mobile"));
        assert!(!text.contains("Blocked"));
    }

    #[test]
    fn test_whoami_display_blocked() {
        let mut blocked = user();
        blocked.is_blocked = Some(true);
        let text = WhoamiResult { user: blocked }.to_string();
        assert!(text.ends_with("Blocked:  yes"));
    }
}
