//! CLI commands
//!
//! Each command is a clap `Args` struct with an `execute` method that runs it
//! against an [`AppContext`] and returns printable output.

pub mod auth;
pub mod dashboard;
pub mod referral;
pub mod signup;
pub mod tree;

use std::io::{BufRead, Write};

use canopy_core::{Ack, AppContext, Position};
use clap::Subcommand;

pub use auth::{
    ForgotPasswordCommand, LoginCommand, LogoutCommand, OtpCommand, ResetPasswordCommand,
    WhoamiCommand,
};
pub use dashboard::DashboardCommand;
pub use referral::{CreateRefCommand, ListRefCommand, RefCommand, ShowRefCommand};
pub use signup::SignupCommand;
pub use tree::TreeCommand;

use crate::error::{CliError, CliResult};

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in with your user ID
    Login(LoginCommand),
    /// Request a signup verification code
    Otp(OtpCommand),
    /// Register a new account under a sponsor
    Signup(SignupCommand),
    /// Send password reset instructions
    ForgotPassword(ForgotPasswordCommand),
    /// Set a new password with a reset token
    ResetPassword(ResetPasswordCommand),
    /// Log out
    Logout(LogoutCommand),
    /// Show the logged-in user
    Whoami(WhoamiCommand),
    /// Show your account overview
    Dashboard(DashboardCommand),
    /// Print your placement tree
    Tree(TreeCommand),
    /// Manage referral links
    #[command(subcommand)]
    Ref(RefCommand),
}

impl Command {
    /// Execute the command and return its printable output.
    pub async fn execute(&self, ctx: &AppContext) -> CliResult<String> {
        match self {
            Command::Login(cmd) => cmd.execute(ctx).await,
            Command::Otp(cmd) => cmd.execute(ctx).await,
            Command::Signup(cmd) => cmd.execute(ctx).await,
            Command::ForgotPassword(cmd) => cmd.execute(ctx).await,
            Command::ResetPassword(cmd) => cmd.execute(ctx).await,
            Command::Logout(cmd) => cmd.execute(ctx).await,
            Command::Whoami(cmd) => Ok(cmd.execute(ctx).await?.to_string()),
            Command::Dashboard(cmd) => Ok(cmd.execute(ctx).await?.to_string()),
            Command::Tree(cmd) => cmd.execute(ctx).await,
            Command::Ref(cmd) => cmd.execute(ctx).await,
        }
    }
}

/// Parse a position string into a Position enum
pub(crate) fn parse_position(s: &str) -> Result<Position, String> {
    Position::parse(s.trim())
        .ok_or_else(|| format!("invalid position '{}'. Valid values: left, right", s))
}

/// The server's message, or a fallback when it sent none.
pub(crate) fn ack_text(ack: &Ack, default: &str) -> String {
    ack.message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Prompt on stderr and read one line from stdin.
///
/// Input is echoed by the terminal; pass `--password` or pipe stdin to avoid
/// showing it.
pub(crate) fn prompt_line(what: &'static str) -> CliResult<String> {
    prompt_line_from(what, &mut std::io::stdin().lock(), &mut std::io::stderr())
}

fn prompt_line_from(
    what: &'static str,
    input: &mut impl BufRead,
    prompt: &mut impl Write,
) -> CliResult<String> {
    let input_error = |source: std::io::Error| CliError::Input { what, source };
    write!(prompt, "{}: ", what).map_err(input_error)?;
    prompt.flush().map_err(input_error)?;

    let mut line = String::new();
    let read = input.read_line(&mut line).map_err(input_error)?;
    if read == 0 {
        return Err(input_error(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "no input",
        )));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
