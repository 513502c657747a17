//! Details panel for the selected card.
//!
//! Shows everything the web tooltip shows for a user, plus what sits in each
//! placement slot.

use std::collections::HashMap;

use canopy_core::{Node, Position};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

/// What a placement slot of the selected user holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot<'a> {
    Empty,
    /// Referenced but absent from the fetched tree
    Missing(&'a str),
    Filled(&'a Node),
}

impl<'a> Slot<'a> {
    /// Resolve one child slot of `node` against the node index.
    pub fn resolve(node: &'a Node, slot: Position, lookup: &HashMap<&str, &'a Node>) -> Self {
        match node.child(slot) {
            None => Slot::Empty,
            Some(id) => lookup
                .get(id)
                .map_or(Slot::Missing(id), |child| Slot::Filled(*child)),
        }
    }
}

/// The selected user and their slots
#[derive(Debug, Clone)]
pub struct NodeDetails<'a> {
    pub node: &'a Node,
    pub left: Slot<'a>,
    pub right: Slot<'a>,
}

impl<'a> NodeDetails<'a> {
    pub fn new(node: &'a Node, lookup: &HashMap<&str, &'a Node>) -> Self {
        Self {
            node,
            left: Slot::resolve(node, Position::Left, lookup),
            right: Slot::resolve(node, Position::Right, lookup),
        }
    }
}

/// Render the details panel.
///
/// If `details` is `None`, displays a placeholder message.
pub fn render_details_view(frame: &mut Frame, area: Rect, details: Option<&NodeDetails<'_>>) {
    let block = Block::default()
        .title(" Details ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    match details {
        Some(details) => {
            let paragraph = Paragraph::new(build_details_lines(details))
                .block(block)
                .wrap(Wrap { trim: false });
            frame.render_widget(paragraph, area);
        }
        None => {
            let paragraph = Paragraph::new("No user selected")
                .block(block)
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(paragraph, area);
        }
    }
}

fn label(text: &str) -> Span<'static> {
    Span::styled(
        format!("{:<16}", text),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )
}

fn field(name: &str, value: impl Into<String>) -> Line<'static> {
    Line::from(vec![label(name), Span::raw(value.into())])
}

fn slot_line(name: &str, slot: &Slot<'_>) -> Line<'static> {
    let value = match slot {
        Slot::Empty => Span::styled("(empty)", Style::default().fg(Color::DarkGray)),
        Slot::Missing(id) => Span::styled(
            format!("{} (not in tree)", id),
            Style::default().fg(Color::Red),
        ),
        Slot::Filled(node) => Span::raw(format!("{} ({})", node.name, node.id)),
    };
    Line::from(vec![label(name), value])
}

/// Build all the lines for the details panel.
pub fn build_details_lines(details: &NodeDetails<'_>) -> Vec<Line<'static>> {
    let node = details.node;
    let status_style = if node.is_active {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let mut lines = vec![
        Line::from(Span::styled(
            node.name.clone(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        field("ID:", node.id.clone()),
        field("Role:", node.role.as_str()),
        field("Sponsor:", node.sponsor.clone()),
        field("Position:", node.position.as_str()),
        Line::from(vec![
            label("Status:"),
            Span::styled(node.status_label(), status_style),
        ]),
    ];
    if node.is_blocked {
        lines.push(Line::from(vec![
            label("Blocked:"),
            Span::styled("yes", Style::default().fg(Color::Red)),
        ]));
    }
    lines.extend([
        field("Redeemed times:", node.redeemed_times.to_string()),
        field("Team:", node.associated_users_count.to_string()),
        field("Active team:", node.associated_active_users_count.to_string()),
        Line::from(""),
        slot_line("Left:", &details.left),
        slot_line("Right:", &details.right),
    ]);
    lines
}
