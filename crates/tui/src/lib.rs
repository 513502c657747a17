//! Terminal UI for Canopy
//!
//! An interactive view of the placement tree using ratatui and crossterm:
//! boxed cards per user, per-card expand and collapse, zoom, and a details
//! panel for the selected user.

pub mod app;
pub mod data;
pub mod details;
pub mod error;
pub mod event;
pub mod tree_view;
pub mod ui;

pub use app::App;
pub use data::{TreeSnapshot, load_initial, load_tree, reload_tree};
pub use error::{TuiError, TuiResult};
pub use tree_view::{CardMetrics, TreeLayout, layout};
