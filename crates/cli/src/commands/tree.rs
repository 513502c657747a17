//! Tree command for printing the placement tree
//!
//! Implements `cnp tree`. By default only the root is expanded, matching the
//! initial state of the interactive view; `--expand-all` and `--expand ID`
//! open more of it.

use canopy_core::tree::{self, TreeState};
use canopy_core::{AppContext, Node, actions};
use clap::Args;
use tracing::{debug, warn};

use crate::error::CliResult;
use crate::output::format_tree;

/// Print the placement tree
#[derive(Debug, Args)]
pub struct TreeCommand {
    /// Expand every node
    #[arg(long)]
    pub expand_all: bool,

    /// Expand a node (can be specified multiple times)
    #[arg(long = "expand", value_name = "ID")]
    pub expand: Vec<String>,

    /// Print the raw node list as JSON
    #[arg(long)]
    pub json: bool,
}

impl TreeCommand {
    /// Render a snapshot to text with this command's expansion options.
    pub fn render_text(&self, version: u64, nodes: &[Node]) -> String {
        let mut state = TreeState::new();
        state.load_dataset(version, nodes);
        if self.expand_all {
            state.expand_all(nodes);
        }
        for id in &self.expand {
            if !nodes.iter().any(|n| &n.id == id) {
                warn!("--expand {} does not match any user in the tree", id);
            }
            state.set_expanded(id, true);
        }

        match tree::render(nodes, &state) {
            Some(rendered) => {
                debug!(
                    "Rendered {} of {} users, {} missing references",
                    rendered.card_count(),
                    nodes.len(),
                    rendered.dangling.len()
                );
                format_tree(&rendered)
            }
            None => "No users in your network yet.".to_string(),
        }
    }

    /// Execute the tree command.
    pub async fn execute(&self, ctx: &AppContext) -> CliResult<String> {
        let snapshot = actions::tree(ctx).await?;
        if self.json {
            return Ok(serde_json::to_string_pretty(&*snapshot.value)?);
        }
        Ok(self.render_text(snapshot.version, &snapshot.value))
    }
}
