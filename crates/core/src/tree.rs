//! Placement tree rendering
//!
//! Turns the flat node list returned by `GET /tree` into a nested render
//! structure rooted at the ADMIN node. Which subtrees are shown is decided by
//! a per-node expand map held in [`TreeState`], together with a zoom factor
//! that surfaces apply as a uniform scale.
//!
//! Rendering is pure: it never mutates the nodes or the state.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::models::{Node, Position, Role};

/// Smallest zoom, in tenths
pub const ZOOM_MIN: u8 = 5;

/// Largest zoom, in tenths
pub const ZOOM_MAX: u8 = 20;

/// Initial zoom, in tenths
pub const ZOOM_DEFAULT: u8 = 10;

/// Pick the tree root: the ADMIN node, or the first node if there is none.
pub fn find_root(nodes: &[Node]) -> Option<&Node> {
    nodes
        .iter()
        .find(|n| n.role == Role::Admin)
        .or_else(|| nodes.first())
}

/// Identifier to node lookup, built once per render pass.
pub fn index(nodes: &[Node]) -> HashMap<&str, &Node> {
    nodes.iter().map(|n| (n.id.as_str(), n)).collect()
}

/// Interactive view state: expand flags and zoom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeState {
    expanded: HashMap<String, bool>,
    zoom_tenths: u8,
    dataset_version: Option<u64>,
}

impl Default for TreeState {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeState {
    /// Empty state at 100% zoom with no dataset loaded
    pub fn new() -> Self {
        Self {
            expanded: HashMap::new(),
            zoom_tenths: ZOOM_DEFAULT,
            dataset_version: None,
        }
    }

    /// Attach a fetched snapshot.
    ///
    /// A version different from the current one drops every expand flag and
    /// expands the root. Reloading the same version keeps the state as is.
    /// Zoom is never touched. Returns whether the flags were reset.
    pub fn load_dataset(&mut self, version: u64, nodes: &[Node]) -> bool {
        if self.dataset_version == Some(version) {
            return false;
        }
        self.expanded.clear();
        if let Some(root) = find_root(nodes) {
            self.expanded.insert(root.id.clone(), true);
        }
        self.dataset_version = Some(version);
        debug!("Loaded tree dataset version {} ({} nodes)", version, nodes.len());
        true
    }

    /// Version of the loaded snapshot, if any
    pub fn dataset_version(&self) -> Option<u64> {
        self.dataset_version
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.get(id).copied().unwrap_or(false)
    }

    pub fn set_expanded(&mut self, id: &str, expanded: bool) {
        self.expanded.insert(id.to_string(), expanded);
    }

    /// Flip one node's flag. Descendants keep their own flags.
    ///
    /// Returns the new value.
    pub fn toggle(&mut self, id: &str) -> bool {
        let flag = self.expanded.entry(id.to_string()).or_insert(false);
        *flag = !*flag;
        *flag
    }

    /// Expand every node that has a child reference.
    pub fn expand_all(&mut self, nodes: &[Node]) {
        for node in nodes.iter().filter(|n| n.has_children()) {
            self.expanded.insert(node.id.clone(), true);
        }
    }

    pub fn zoom_in(&mut self) {
        self.zoom_tenths = (self.zoom_tenths + 1).min(ZOOM_MAX);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_tenths = self.zoom_tenths.saturating_sub(1).max(ZOOM_MIN);
    }

    pub fn reset_zoom(&mut self) {
        self.zoom_tenths = ZOOM_DEFAULT;
    }

    /// Zoom in tenths (5..=20)
    pub fn zoom_tenths(&self) -> u8 {
        self.zoom_tenths
    }

    /// Zoom as a scale factor (0.5..=2.0)
    pub fn zoom(&self) -> f32 {
        f32::from(self.zoom_tenths) / 10.0
    }

    /// Zoom as a whole percentage, for display
    pub fn zoom_percent(&self) -> u16 {
        u16::from(self.zoom_tenths) * 10
    }
}

/// What a card offers for expanding its subtree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affordance {
    /// Leaf: nothing to expand
    None,
    /// Has children, currently collapsed
    Expand,
    /// Has children, currently expanded
    Collapse,
}

impl Affordance {
    /// Marker shown next to the card title
    pub fn marker(&self) -> &'static str {
        match self {
            Affordance::None => " ",
            Affordance::Expand => "+",
            Affordance::Collapse => "-",
        }
    }
}

/// A child reference that did not resolve to a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingRef {
    pub parent: String,
    pub slot: Position,
    pub missing: String,
}

/// One rendered card and its shown subtrees
#[derive(Debug, Clone)]
pub struct RenderedNode<'a> {
    pub node: &'a Node,
    /// Slot under the parent; `None` for the root
    pub slot: Option<Position>,
    pub depth: usize,
    pub affordance: Affordance,
    pub left: Option<Box<RenderedNode<'a>>>,
    pub right: Option<Box<RenderedNode<'a>>>,
}

impl<'a> RenderedNode<'a> {
    /// Rendered child in the given slot
    pub fn child(&self, slot: Position) -> Option<&RenderedNode<'a>> {
        match slot {
            Position::Left => self.left.as_deref(),
            Position::Right => self.right.as_deref(),
        }
    }

    /// Number of cards in this subtree, including this one
    pub fn card_count(&self) -> usize {
        1 + self.left.as_ref().map_or(0, |n| n.card_count())
            + self.right.as_ref().map_or(0, |n| n.card_count())
    }

    /// Depth of the deepest card below (0 for a lone card)
    pub fn height(&self) -> usize {
        let left = self.left.as_ref().map_or(0, |n| n.height() + 1);
        let right = self.right.as_ref().map_or(0, |n| n.height() + 1);
        left.max(right)
    }

    fn collect_ids(&self, out: &mut Vec<&'a str>) {
        out.push(self.node.id.as_str());
        if let Some(left) = &self.left {
            left.collect_ids(out);
        }
        if let Some(right) = &self.right {
            right.collect_ids(out);
        }
    }
}

/// Result of one render pass
#[derive(Debug, Clone)]
pub struct RenderedTree<'a> {
    pub root: RenderedNode<'a>,
    /// References met during traversal that resolved to nothing
    pub dangling: Vec<DanglingRef>,
}

impl<'a> RenderedTree<'a> {
    /// Identifiers of every rendered card in pre-order (node, left, right)
    pub fn visible_ids(&self) -> Vec<&'a str> {
        let mut ids = Vec::new();
        self.root.collect_ids(&mut ids);
        ids
    }

    /// Find a rendered card by identifier
    pub fn find(&self, id: &str) -> Option<&RenderedNode<'a>> {
        fn walk<'n, 'a>(node: &'n RenderedNode<'a>, id: &str) -> Option<&'n RenderedNode<'a>> {
            if node.node.id == id {
                return Some(node);
            }
            node.left
                .as_deref()
                .and_then(|n| walk(n, id))
                .or_else(|| node.right.as_deref().and_then(|n| walk(n, id)))
        }
        walk(&self.root, id)
    }

    pub fn card_count(&self) -> usize {
        self.root.card_count()
    }
}

/// Render the shown part of the tree.
///
/// Returns `None` for an empty collection.
pub fn render<'a>(nodes: &'a [Node], state: &TreeState) -> Option<RenderedTree<'a>> {
    let root = find_root(nodes)?;
    let mut walker = Walker {
        lookup: index(nodes),
        state,
        path: HashSet::new(),
        dangling: Vec::new(),
    };
    let root = walker.visit(root, None, 0);
    Some(RenderedTree {
        root,
        dangling: walker.dangling,
    })
}

struct Walker<'a, 's> {
    lookup: HashMap<&'a str, &'a Node>,
    state: &'s TreeState,
    /// Identifiers on the path from the root to the current card
    path: HashSet<&'a str>,
    dangling: Vec<DanglingRef>,
}

impl<'a> Walker<'a, '_> {
    fn visit(&mut self, node: &'a Node, slot: Option<Position>, depth: usize) -> RenderedNode<'a> {
        let affordance = match (node.has_children(), self.state.is_expanded(&node.id)) {
            (false, _) => Affordance::None,
            (true, false) => Affordance::Expand,
            (true, true) => Affordance::Collapse,
        };

        let mut rendered = RenderedNode {
            node,
            slot,
            depth,
            affordance,
            left: None,
            right: None,
        };
        if affordance != Affordance::Collapse {
            return rendered;
        }

        self.path.insert(node.id.as_str());
        rendered.left = self.child(node, Position::Left, depth);
        rendered.right = self.child(node, Position::Right, depth);
        self.path.remove(node.id.as_str());
        rendered
    }

    fn child(&mut self, parent: &'a Node, slot: Position, depth: usize) -> Option<Box<RenderedNode<'a>>> {
        let id = parent.child(slot)?;
        let Some(&child) = self.lookup.get(id) else {
            debug!("{} slot of {} references missing node {}", slot, parent.id, id);
            self.dangling.push(DanglingRef {
                parent: parent.id.clone(),
                slot,
                missing: id.to_string(),
            });
            return None;
        };
        if self.path.contains(id) {
            debug!("{} slot of {} points back to ancestor {}", slot, parent.id, id);
            return None;
        }
        Some(Box::new(self.visit(child, Some(slot), depth + 1)))
    }
}
