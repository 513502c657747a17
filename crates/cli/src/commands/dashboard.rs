//! Dashboard command
//!
//! Implements `cnp dashboard`: the logged-in user, their direct left and
//! right placements, and a summary of their referral links.

use canopy_core::{AppContext, Node, Position, SessionUser, actions};
use clap::Args;

use crate::error::CliResult;
use crate::output::status_text;

/// Show the account overview
#[derive(Debug, Args)]
pub struct DashboardCommand {}

/// A direct placement under the user
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    /// Slot not filled
    Empty,
    /// Slot references a user missing from the tree
    Missing(String),
    Filled(Node),
}

/// Result of the dashboard command
#[derive(Debug)]
pub struct DashboardResult {
    pub user: SessionUser,
    /// The user's own node, if present in the tree
    pub node: Option<Node>,
    pub left: Placement,
    pub right: Placement,
    pub links_total: usize,
    pub links_used: usize,
}

impl DashboardResult {
    /// Build the overview from a tree snapshot.
    pub fn from_tree(user: SessionUser, nodes: &[Node], links_total: usize, links_used: usize) -> Self {
        let node = nodes.iter().find(|n| n.id == user.id).cloned();
        let placement = |slot: Position| match node.as_ref().and_then(|n| n.child(slot)) {
            None => Placement::Empty,
            Some(id) => nodes
                .iter()
                .find(|n| n.id == id)
                .cloned()
                .map_or_else(|| Placement::Missing(id.to_string()), Placement::Filled),
        };
        let left = placement(Position::Left);
        let right = placement(Position::Right);

        Self {
            user,
            node,
            left,
            right,
            links_total,
            links_used,
        }
    }
}

fn write_placement(
    f: &mut std::fmt::Formatter<'_>,
    label: &str,
    placement: &Placement,
) -> std::fmt::Result {
    match placement {
        Placement::Empty => writeln!(f, "  {:<7} (empty)", label),
        Placement::Missing(id) => writeln!(f, "  {:<7} {} (not in tree)", label, id),
        Placement::Filled(node) => writeln!(
            f,
            "  {:<7} {} ({})  {}",
            label,
            node.name,
            node.id,
            status_text(node)
        ),
    }
}

impl std::fmt::Display for DashboardResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Welcome back, {} ({})", self.user.name, self.user.id)?;
        writeln!(f)?;
        writeln!(f, "Network status")?;
        write_placement(f, "Left:", &self.left)?;
        write_placement(f, "Right:", &self.right)?;
        if let Some(node) = &self.node {
            writeln!(
                f,
                "  Team:   {} users, {} active",
                node.associated_users_count, node.associated_active_users_count
            )?;
            writeln!(f, "  Redeemed: {}", node.redeemed_times)?;
        }
        writeln!(f)?;
        write!(
            f,
            "Referral links: {} ({} used)",
            self.links_total, self.links_used
        )
    }
}

impl DashboardCommand {
    /// Execute the dashboard command.
    ///
    /// Reads the session user, the tree and the referral links concurrently.
    pub async fn execute(&self, ctx: &AppContext) -> CliResult<DashboardResult> {
        let (user, tree, links) = tokio::join!(
            actions::current_user(ctx),
            actions::tree(ctx),
            actions::referral_links(ctx)
        );
        let user = user?;
        let tree = tree?;
        let links = links?;

        let used = links.value.iter().filter(|l| l.used_by.is_some()).count();
        Ok(DashboardResult::from_tree(
            (*user.value).clone(),
            &tree.value,
            links.value.len(),
            used,
        ))
    }
}
