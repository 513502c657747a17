//! UI rendering for the TUI.
//!
//! Provides layout and widget rendering using ratatui.

use canopy_core::{Notification, tree};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::app::App;
use crate::details::{NodeDetails, render_details_view};
use crate::tree_view::render_tree_view;

/// Legend text for keyboard shortcuts.
const LEGEND: &str = " [j/k] Navigate  [h/l] Left/Right child  [p] Parent  [Enter] Expand  [e] Expand all  [+/-/0] Zoom  [r] Refresh  [q] Quit ";

/// Draw the entire UI.
pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = create_main_layout(frame.area());
    let rendered = app.rendered();
    let selected = app.selected_id();

    draw_header(frame, chunks[0], app, rendered.as_ref().map_or(0, |t| t.card_count()));

    render_tree_view(
        frame,
        chunks[1],
        rendered.as_ref(),
        app.tree_state().zoom_tenths(),
        selected,
    );

    let lookup = tree::index(app.nodes());
    let details = selected
        .and_then(|id| lookup.get(id).copied())
        .map(|node| NodeDetails::new(node, &lookup));
    render_details_view(frame, chunks[2], details.as_ref());

    let dangling = rendered.as_ref().map_or(0, |t| t.dangling.len());
    frame.render_widget(
        Paragraph::new(status_line(app.status(), dangling)),
        chunks[3],
    );

    draw_legend(frame, chunks[4]);
}

/// Split the screen into header, tree, details, status and legend.
fn create_main_layout(area: Rect) -> Vec<Rect> {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(0),    // Tree and details
            Constraint::Length(1), // Status
            Constraint::Length(1), // Legend
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(70), // Tree canvas
            Constraint::Percentage(30), // Details
        ])
        .split(rows[1]);

    vec![rows[0], columns[0], columns[1], rows[2], rows[3]]
}

/// Header text: who is logged in and what is shown.
pub fn header_text(app: &App, shown: usize) -> String {
    let user = app.user();
    format!(
        " Canopy  {} ({})  dataset v{}  {}/{} users shown  zoom {}% ",
        user.name,
        user.id,
        app.dataset_version(),
        shown,
        app.nodes().len(),
        app.tree_state().zoom_percent()
    )
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App, shown: usize) {
    let header = Paragraph::new(header_text(app, shown)).style(
        Style::default()
            .fg(Color::White)
            .bg(Color::Blue)
            .add_modifier(Modifier::BOLD),
    );
    frame.render_widget(header, area);
}

/// Status bar: the latest notification, then a dim count of child
/// references that are missing from the tree.
pub fn status_line(status: Option<&Notification>, dangling: usize) -> Line<'static> {
    let mut spans = Vec::new();

    if let Some(note) = status {
        let style = if note.is_error() {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Green)
        };
        spans.push(Span::styled(format!(" {} ", note.title), style));
        spans.push(Span::raw(note.description.clone()));
    }

    if dangling > 0 {
        let noun = if dangling == 1 { "reference" } else { "references" };
        spans.push(Span::styled(
            format!("  {} missing {}", dangling, noun),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::DIM),
        ));
    }

    Line::from(spans)
}

/// Draw the legend bar at the bottom.
fn draw_legend(frame: &mut Frame, area: Rect) {
    let legend = Paragraph::new(LEGEND).style(Style::default().fg(Color::Black).bg(Color::Cyan));

    frame.render_widget(legend, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use canopy_core::{
        AppContext, Config, Node, Notifier, Position, QueueSink, Role, SessionUser,
    };
    use ratatui::{Terminal, backend::TestBackend, buffer::Buffer};

    use crate::data::TreeSnapshot;

    fn test_app() -> App {
        let sink = Arc::new(QueueSink::new());
        let ctx = AppContext::init(
            Config::for_api(
                "http://127.0.0.1:9/api/v1",
                std::env::temp_dir().join("cnp-tui-ui-test"),
            ),
            Notifier::new(sink.clone()),
        )
        .unwrap();
        let user = Arc::new(SessionUser {
            id: "AL00000001".to_string(),
            name: "Root Admin".to_string(),
            role: Role::Admin,
            email: None,
            mobile: None,
            position: None,
            is_active: Some(true),
            is_blocked: None,
        });
        let nodes = vec![
            Node::new("AL00000001", "Root Admin", Position::Left)
                .with_role(Role::Admin)
                .with_left("AL00000002")
                .with_right("AL00000404")
                .with_active(true),
            Node::new("AL00000002", "Bob", Position::Left),
        ];
        App::with_data(
            ctx,
            sink,
            user,
            TreeSnapshot {
                version: 3,
                nodes: Arc::new(nodes),
            },
        )
    }

    fn buffer_text(buf: &Buffer) -> String {
        let mut text = String::new();
        for y in buf.area.top()..buf.area.bottom() {
            for x in buf.area.left()..buf.area.right() {
                text.push_str(buf[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_legend_not_empty() {
        assert!(!LEGEND.is_empty());
    }

    #[test]
    fn test_create_main_layout_produces_five_chunks() {
        let chunks = create_main_layout(Rect::new(0, 0, 100, 30));
        assert_eq!(chunks.len(), 5);
        assert_eq!(chunks[0].height, 1);
        assert_eq!(chunks[1].height, 27);
        assert_eq!(chunks[1].width, 70);
        assert_eq!(chunks[4].y, 29);
    }

    #[test]
    fn test_create_main_layout_small_terminal() {
        let chunks = create_main_layout(Rect::new(0, 0, 20, 3));
        assert_eq!(chunks.len(), 5);
    }

    #[test]
    fn test_header_text() {
        let app = test_app();
        assert_eq!(
            header_text(&app, 2),
            " Canopy  Root Admin (AL00000001)  dataset v3  2/2 users shown  zoom 100% "
        );
    }

    #[test]
    fn test_status_line_with_notification_and_missing() {
        let note = Notification::error("Refresh failed", "Something went wrong");
        let line = status_line(Some(&note), 2);
        assert_eq!(
            line.to_string(),
            " Refresh failed Something went wrong  2 missing references"
        );
    }

    #[test]
    fn test_status_line_single_missing_only() {
        assert_eq!(status_line(None, 1).to_string(), "  1 missing reference");
        assert_eq!(status_line(None, 0).to_string(), "");
    }

    #[test]
    fn test_draw_full_screen() {
        let app = test_app();
        let mut terminal = Terminal::new(TestBackend::new(160, 30)).unwrap();

        terminal.draw(|frame| draw(frame, &app)).unwrap();

        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("Canopy  Root Admin (AL00000001)"));
        assert!(text.contains("[-] Root Admin"));
        assert!(text.contains("Bob"));
        assert!(text.contains("Sponsor:"));
        assert!(text.contains("AL00000404 (not in tree)"));
        assert!(text.contains("1 missing reference"));
        assert!(text.contains("[q] Quit"));
    }
}
