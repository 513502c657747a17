//! Referral link commands
//!
//! Implements `cnp ref create`, `cnp ref list` and `cnp ref show`. Every link
//! is printed together with the registration URL that carries its code.

use canopy_core::{AppContext, Position, ReferralLink, actions, registration_link};
use clap::{Args, Subcommand};

use super::parse_position;
use crate::error::CliResult;
use crate::output::format_referral_table;

/// Manage referral links
#[derive(Debug, Subcommand)]
pub enum RefCommand {
    /// Create a referral link for a placement side
    Create(CreateRefCommand),
    /// List your referral links
    List(ListRefCommand),
    /// Show one referral link
    Show(ShowRefCommand),
}

impl RefCommand {
    pub async fn execute(&self, ctx: &AppContext) -> CliResult<String> {
        match self {
            RefCommand::Create(cmd) => cmd.execute(ctx).await,
            RefCommand::List(cmd) => cmd.execute(ctx).await,
            RefCommand::Show(cmd) => Ok(cmd.execute(ctx).await?.to_string()),
        }
    }
}

/// Create a referral link
#[derive(Debug, Args)]
pub struct CreateRefCommand {
    /// Placement side for users registering through the link (left, right)
    #[arg(long, value_parser = parse_position)]
    pub position: Position,
}

impl CreateRefCommand {
    pub async fn execute(&self, ctx: &AppContext) -> CliResult<String> {
        let created = actions::create_referral_link(ctx, self.position).await?;
        Ok(format!(
            "Created referral link {} ({})\n{}",
            created.code,
            created.position,
            registration_link(&ctx.config().site_url, &created.code)
        ))
    }
}

/// List referral links
#[derive(Debug, Args)]
pub struct ListRefCommand {}

impl ListRefCommand {
    pub async fn execute(&self, ctx: &AppContext) -> CliResult<String> {
        let links = actions::referral_links(ctx).await?;
        Ok(format_referral_table(&links.value, &ctx.config().site_url))
    }
}

/// Show a referral link by code
#[derive(Debug, Args)]
pub struct ShowRefCommand {
    /// Referral code
    pub code: String,
}

/// Result of `cnp ref show`
#[derive(Debug)]
pub struct ShowRefResult {
    pub link: ReferralLink,
    pub url: String,
}

impl std::fmt::Display for ShowRefResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Code:     {}", self.link.code)?;
        writeln!(f, "Position: {}", self.link.position)?;
        writeln!(
            f,
            "Created:  {}",
            self.link.created_at.format("%Y-%m-%d %H:%M UTC")
        )?;
        writeln!(
            f,
            "Used by:  {}",
            self.link.used_by.as_deref().unwrap_or("(unused)")
        )?;
        write!(f, "Link:     {}", self.url)
    }
}

impl ShowRefCommand {
    pub async fn execute(&self, ctx: &AppContext) -> CliResult<ShowRefResult> {
        let link = actions::referral_link(ctx, self.code.trim()).await?;
        let url = registration_link(&ctx.config().site_url, &link.code);
        Ok(ShowRefResult { link, url })
    }
}
