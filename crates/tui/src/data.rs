//! Data loading for the TUI.
//!
//! Everything goes through the shared actions, so reads hit the resource
//! cache and failures reach the notification queue the same way the command
//! line sees them.

use std::sync::Arc;

use canopy_core::{AppContext, Node, SessionUser, Versioned, actions};
use tracing::debug;

use crate::error::TuiResult;

/// One fetched tree dataset
#[derive(Debug, Clone)]
pub struct TreeSnapshot {
    pub version: u64,
    pub nodes: Arc<Vec<Node>>,
}

impl From<Versioned<Vec<Node>>> for TreeSnapshot {
    fn from(fetched: Versioned<Vec<Node>>) -> Self {
        Self {
            version: fetched.version,
            nodes: fetched.value,
        }
    }
}

/// Load the session user and the tree.
///
/// The user is fetched first so an expired session fails before the tree
/// request is made.
pub async fn load_initial(ctx: &AppContext) -> TuiResult<(Arc<SessionUser>, TreeSnapshot)> {
    let user = actions::current_user(ctx).await?;
    let tree = load_tree(ctx).await?;
    Ok((user.value, tree))
}

/// Load the tree, from the cache when present.
pub async fn load_tree(ctx: &AppContext) -> TuiResult<TreeSnapshot> {
    let tree = TreeSnapshot::from(actions::tree(ctx).await?);
    debug!("Tree dataset {} with {} nodes", tree.version, tree.nodes.len());
    Ok(tree)
}

/// Drop the cached tree and fetch it again.
pub async fn reload_tree(ctx: &AppContext) -> TuiResult<TreeSnapshot> {
    let tree = TreeSnapshot::from(actions::refresh_tree(ctx).await?);
    debug!("Reloaded tree dataset {}", tree.version);
    Ok(tree)
}
