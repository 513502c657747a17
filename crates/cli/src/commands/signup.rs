//! Signup command for registering under a sponsor
//!
//! Implements `cnp signup`. The sponsor code is given directly with
//! `--sponsor` or taken from a registration link passed with `--link`.

use canopy_core::{
    ApiError, AppContext, FieldError, Position, SignupForm, actions, sponsor_from_link,
};
use clap::{ArgGroup, Args};

use super::{ack_text, parse_position, prompt_line};
use crate::error::CliResult;

/// Register a new account
#[derive(Debug, Args)]
#[command(group(ArgGroup::new("sponsor_source").required(true).args(["sponsor", "link"])))]
pub struct SignupCommand {
    /// Full name
    #[arg(long)]
    pub name: String,

    /// Email address
    #[arg(long)]
    pub email: String,

    /// Mobile number (digits only)
    #[arg(long)]
    pub mobile: String,

    /// Country dial code (e.g. +91)
    #[arg(long)]
    pub dial_code: String,

    /// Country name or code
    #[arg(long)]
    pub country: Option<String>,

    /// Placement side under the sponsor (left, right)
    #[arg(long, value_parser = parse_position)]
    pub position: Position,

    /// Sponsor code (10 characters, e.g. AL00000001)
    #[arg(long)]
    pub sponsor: Option<String>,

    /// Registration link containing the sponsor code
    #[arg(long)]
    pub link: Option<String>,

    /// Password (prompted when omitted)
    #[arg(long)]
    pub password: Option<String>,

    /// Repeat of the password (defaults to --password)
    #[arg(long)]
    pub confirm_password: Option<String>,

    /// Verification code from `cnp otp`
    #[arg(long)]
    pub otp: Option<String>,

    /// Referral code, if different from the sponsor
    #[arg(long)]
    pub referral_code: Option<String>,
}

impl SignupCommand {
    /// Resolve the sponsor code from `--sponsor` or `--link`.
    fn sponsor(&self) -> Result<String, ApiError> {
        if let Some(sponsor) = &self.sponsor {
            return Ok(sponsor.clone());
        }
        let link = self.link.as_deref().unwrap_or_default();
        sponsor_from_link(link).ok_or_else(|| {
            ApiError::Validation(vec![FieldError::new(
                "sponsor",
                format!("No sponsor code found in link '{}'", link),
            )])
        })
    }

    /// Execute the signup command.
    ///
    /// All fields are validated locally first; nothing is sent if any fails.
    pub async fn execute(&self, ctx: &AppContext) -> CliResult<String> {
        let sponsor = self.sponsor()?;
        let password = match &self.password {
            Some(password) => password.clone(),
            None => prompt_line("Password")?,
        };
        let confirm_password = match &self.confirm_password {
            Some(confirm) => confirm.clone(),
            None if self.password.is_some() => password.clone(),
            None => prompt_line("Confirm password")?,
        };

        let form = SignupForm {
            name: self.name.clone(),
            email: self.email.clone(),
            mobile: self.mobile.clone(),
            dial_code: self.dial_code.clone(),
            country: self.country.clone(),
            position: self.position,
            sponsor,
            password,
            confirm_password,
            otp: self.otp.clone(),
            referral_code: self.referral_code.clone(),
        };

        let ack = actions::register(ctx, &form).await?;
        Ok(ack_text(
            &ack,
            "Registration complete. Please activate your account to continue",
        ))
    }
}
