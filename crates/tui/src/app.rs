//! Main application state and event loop.

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use canopy_core::{
    AppContext, Node, Notification, Position, QueueSink, RenderedTree, SessionUser, TreeState,
    tree,
};
use crossterm::{
    event::KeyEvent,
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{debug, warn};

use crate::data::{TreeSnapshot, load_initial, reload_tree};
use crate::error::TuiResult;
use crate::event::{
    is_down, is_expand_all, is_left, is_parent, is_quit, is_refresh, is_right, is_toggle, is_up,
    is_zoom_in, is_zoom_out, is_zoom_reset, poll_key,
};
use crate::ui;

/// Main application state.
pub struct App {
    /// Client, cache and session shared with the actions.
    ctx: AppContext,
    /// Queue the context's notifier writes to; drained into the status bar.
    sink: Arc<QueueSink>,
    /// The logged-in user.
    user: Arc<SessionUser>,
    /// The tree dataset being shown.
    tree: TreeSnapshot,
    /// Expand flags and zoom.
    tree_state: TreeState,
    /// Index of the selected card in pre-order.
    selected_index: usize,
    /// Latest notification, shown until the next key press.
    status: Option<Notification>,
    /// Whether the application is still running.
    running: bool,
    /// Set by the refresh key, served between loop iterations.
    reload_requested: bool,
}

impl App {
    /// Load the user and tree and build the initial state.
    ///
    /// # Errors
    ///
    /// Returns `TuiError::Api` if either request fails, including
    /// `ApiError::Unauthenticated` when there is no valid session.
    pub async fn new(ctx: AppContext, sink: Arc<QueueSink>) -> TuiResult<Self> {
        let (user, tree) = load_initial(&ctx).await?;
        Ok(Self::with_data(ctx, sink, user, tree))
    }

    /// Build the state from already loaded data.
    pub fn with_data(
        ctx: AppContext,
        sink: Arc<QueueSink>,
        user: Arc<SessionUser>,
        tree: TreeSnapshot,
    ) -> Self {
        let mut tree_state = TreeState::new();
        tree_state.load_dataset(tree.version, &tree.nodes);
        Self {
            ctx,
            sink,
            user,
            tree,
            tree_state,
            selected_index: 0,
            status: None,
            running: true,
            reload_requested: false,
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub fn user(&self) -> &SessionUser {
        &self.user
    }

    pub fn nodes(&self) -> &[Node] {
        &self.tree.nodes
    }

    pub fn dataset_version(&self) -> u64 {
        self.tree.version
    }

    pub fn tree_state(&self) -> &TreeState {
        &self.tree_state
    }

    /// Get the currently selected card index.
    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    pub fn status(&self) -> Option<&Notification> {
        self.status.as_ref()
    }

    /// Check if the application is still running.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Render the shown part of the tree for the current state.
    pub fn rendered(&self) -> Option<RenderedTree<'_>> {
        tree::render(&self.tree.nodes, &self.tree_state)
    }

    /// Identifier of the selected card.
    pub fn selected_id(&self) -> Option<&str> {
        self.rendered()
            .and_then(|t| t.visible_ids().get(self.selected_index).copied())
    }

    /// Request the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Move selection to the next card in pre-order.
    ///
    /// Clamps to the last card (does not wrap).
    pub fn select_next(&mut self) {
        let count = self.rendered().map_or(0, |t| t.card_count());
        if count > 0 && self.selected_index < count - 1 {
            self.selected_index += 1;
        }
    }

    /// Move selection to the previous card in pre-order.
    ///
    /// Clamps to the first card (does not wrap).
    pub fn select_previous(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    /// Select a card by identifier. Returns false if it is not shown.
    pub fn select_id(&mut self, id: &str) -> bool {
        let position = self
            .rendered()
            .and_then(|t| t.visible_ids().iter().position(|v| *v == id));
        match position {
            Some(index) => {
                self.selected_index = index;
                true
            }
            None => false,
        }
    }

    /// Select the shown child in `slot` of the selected card, if any.
    pub fn select_child(&mut self, slot: Position) {
        let child = self.rendered().and_then(|t| {
            let selected = t.visible_ids().get(self.selected_index).copied()?;
            let child = t.find(selected)?.child(slot)?;
            Some(child.node.id.clone())
        });
        if let Some(id) = child {
            self.select_id(&id);
        }
    }

    /// Select the card the selected card hangs under.
    pub fn select_parent(&mut self) {
        let parent = self.rendered().and_then(|t| {
            let selected = t.visible_ids().get(self.selected_index).copied()?;
            t.visible_ids()
                .into_iter()
                .find(|id| {
                    t.find(id).is_some_and(|card| {
                        [Position::Left, Position::Right]
                            .into_iter()
                            .any(|slot| card.child(slot).is_some_and(|c| c.node.id == selected))
                    })
                })
                .map(str::to_string)
        });
        if let Some(id) = parent {
            self.select_id(&id);
        }
    }

    /// Expand or collapse the selected card.
    ///
    /// Leaves have nothing to toggle. Cards before the selection in pre-order
    /// are unaffected, so the selection keeps its index.
    pub fn toggle_selected(&mut self) {
        let target = self.rendered().and_then(|t| {
            let id = t.visible_ids().get(self.selected_index).copied()?;
            t.find(id)
                .filter(|card| card.node.has_children())
                .map(|card| card.node.id.clone())
        });
        if let Some(id) = target {
            let expanded = self.tree_state.toggle(&id);
            debug!("{} {}", if expanded { "Expanded" } else { "Collapsed" }, id);
        }
    }

    /// Expand every card, keeping the selected one selected.
    pub fn expand_all(&mut self) {
        let selected = self.selected_id().map(str::to_string);
        self.tree_state.expand_all(&self.tree.nodes);
        if let Some(id) = selected {
            self.select_id(&id);
        }
    }

    pub fn zoom_in(&mut self) {
        self.tree_state.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.tree_state.zoom_out();
    }

    pub fn reset_zoom(&mut self) {
        self.tree_state.reset_zoom();
    }

    /// Show a newly fetched dataset.
    ///
    /// A new version resets the expand flags; the selection follows its card
    /// when still shown and falls back to the root otherwise.
    pub fn apply_snapshot(&mut self, snapshot: TreeSnapshot) {
        let selected = self.selected_id().map(str::to_string);
        self.tree = snapshot;
        let reset = self.tree_state.load_dataset(self.tree.version, &self.tree.nodes);

        let kept = selected.is_some_and(|id| self.select_id(&id));
        if !kept {
            self.selected_index = 0;
        }
        if reset {
            debug!("Expand state reset for dataset {}", self.tree.version);
        }
    }

    /// Ask for a tree refetch before the next draw.
    pub fn request_reload(&mut self) {
        self.reload_requested = true;
        self.status = Some(Notification::info("Refreshing", "Fetching the latest tree"));
    }

    /// Refetch the tree if a reload was requested.
    ///
    /// Failures are shown in the status bar and keep the current dataset.
    pub async fn reload_if_requested(&mut self) {
        if !self.reload_requested {
            return;
        }
        self.reload_requested = false;

        match reload_tree(&self.ctx).await {
            Ok(snapshot) => {
                let count = snapshot.nodes.len();
                self.apply_snapshot(snapshot);
                self.status = Some(Notification::info(
                    "Tree refreshed",
                    format!("{} users loaded", count),
                ));
            }
            Err(e) => {
                warn!("Tree refresh failed: {}", e.full_message());
                self.status = Some(Notification::error("Refresh failed", e.full_message()));
            }
        }
    }

    /// Move queued notifications into the status bar, newest wins.
    pub fn drain_notifications(&mut self) {
        if let Some(latest) = self.sink.drain().pop() {
            self.status = Some(latest);
        }
    }

    /// Run the main application loop.
    ///
    /// This initializes the terminal, runs the event loop, and ensures
    /// the terminal is restored on exit (even on panic).
    pub async fn run(&mut self) -> TuiResult<()> {
        let mut terminal = init_terminal()?;

        // The guard runs restore_terminal() even if we panic
        let _guard = scopeguard::guard((), |()| {
            let _ = restore_terminal();
        });

        let result = self.event_loop(&mut terminal).await;

        drop(_guard);

        result
    }

    /// The main event loop.
    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> TuiResult<()> {
        while self.running {
            self.drain_notifications();
            terminal.draw(|frame| ui::draw(frame, self))?;

            if let Some(key) = poll_key(Duration::from_millis(100))? {
                self.handle_key(&key);
            }

            if self.reload_requested {
                // Show the pending status before blocking on the network
                terminal.draw(|frame| ui::draw(frame, self))?;
                self.reload_if_requested().await;
            }
        }
        Ok(())
    }

    /// Handle a keyboard event.
    pub fn handle_key(&mut self, key: &KeyEvent) {
        if is_quit(key) {
            self.quit();
            return;
        }

        self.status = None;

        if is_down(key) {
            self.select_next();
        } else if is_up(key) {
            self.select_previous();
        } else if is_left(key) {
            self.select_child(Position::Left);
        } else if is_right(key) {
            self.select_child(Position::Right);
        } else if is_parent(key) {
            self.select_parent();
        } else if is_toggle(key) {
            self.toggle_selected();
        } else if is_expand_all(key) {
            self.expand_all();
        } else if is_zoom_in(key) {
            self.zoom_in();
        } else if is_zoom_out(key) {
            self.zoom_out();
        } else if is_zoom_reset(key) {
            self.reset_zoom();
        } else if is_refresh(key) {
            self.request_reload();
        }
    }
}

/// Initialize the terminal for TUI rendering.
fn init_terminal() -> TuiResult<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to its original state.
fn restore_terminal() -> TuiResult<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}
