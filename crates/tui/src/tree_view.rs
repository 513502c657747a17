//! Card canvas for the placement tree.
//!
//! Lays the rendered tree out as boxed cards on a virtual canvas, the way the
//! web dashboard stacks them: every subtree is a column with its card centered
//! above a row holding the left and right subtrees. Card size and gaps follow
//! the zoom factor. The canvas is drawn top-center in the view, shifted only as
//! far as needed to keep the selected card on screen.
//!
//! Layout is pure so it can be tested without a terminal.

use std::collections::HashMap;

use canopy_core::{Affordance, Node, RenderedNode, RenderedTree, Role};
use ratatui::{
    Frame,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

/// Card width at 100% zoom
const BASE_CARD_WIDTH: u32 = 24;
/// Card height at 100% zoom: borders plus five content lines
const BASE_CARD_HEIGHT: u32 = 7;
/// Space between sibling subtrees at 100% zoom
const BASE_H_GAP: u32 = 4;
/// Rows between a card and its children at 100% zoom
const BASE_V_GAP: u32 = 2;

/// Sizes in terminal cells for one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardMetrics {
    pub card_width: i32,
    pub card_height: i32,
    pub h_gap: i32,
    pub v_gap: i32,
}

impl CardMetrics {
    /// Scale the base sizes by a zoom given in tenths, rounding to the
    /// nearest cell.
    pub fn for_zoom(tenths: u8) -> Self {
        let scale = |base: u32, min: u32| -> i32 {
            let cells = (base * u32::from(tenths) + 5) / 10;
            cells.max(min) as i32
        };
        Self {
            card_width: scale(BASE_CARD_WIDTH, 10),
            card_height: scale(BASE_CARD_HEIGHT, 3),
            h_gap: scale(BASE_H_GAP, 1),
            v_gap: scale(BASE_V_GAP, 1),
        }
    }
}

/// A card placed on the canvas.
#[derive(Debug, Clone)]
pub struct PlacedCard<'a> {
    pub node: &'a Node,
    pub affordance: Affordance,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PlacedCard<'_> {
    fn center_x(&self) -> i32 {
        self.x + self.width / 2
    }
}

/// Parent-to-child connection, from the cell below the parent card to the
/// cell above the child card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub from: (i32, i32),
    pub to: (i32, i32),
}

/// Whole-tree layout on an origin-anchored canvas.
#[derive(Debug, Clone)]
pub struct TreeLayout<'a> {
    pub cards: Vec<PlacedCard<'a>>,
    pub links: Vec<Link>,
    pub width: i32,
    pub height: i32,
}

impl<'a> TreeLayout<'a> {
    pub fn card(&self, id: &str) -> Option<&PlacedCard<'a>> {
        self.cards.iter().find(|c| c.node.id == id)
    }
}

/// Lay out every rendered card.
pub fn layout<'a>(tree: &RenderedTree<'a>, metrics: CardMetrics) -> TreeLayout<'a> {
    let mut builder = LayoutBuilder {
        metrics,
        widths: HashMap::new(),
        cards: Vec::new(),
        links: Vec::new(),
    };
    let width = builder.measure(&tree.root);
    builder.place(&tree.root, 0, 0);

    let height = builder
        .cards
        .iter()
        .map(|c| c.y + c.height)
        .max()
        .unwrap_or(0);

    TreeLayout {
        cards: builder.cards,
        links: builder.links,
        width,
        height,
    }
}

struct LayoutBuilder<'a> {
    metrics: CardMetrics,
    /// Column width per card id, filled by `measure`
    widths: HashMap<&'a str, i32>,
    cards: Vec<PlacedCard<'a>>,
    links: Vec<Link>,
}

impl<'a> LayoutBuilder<'a> {
    /// Width of the row holding the shown children, if any are shown.
    ///
    /// A missing side takes no room but the gap between the sides stays.
    fn row_width(&self, node: &RenderedNode<'a>) -> Option<i32> {
        if node.left.is_none() && node.right.is_none() {
            return None;
        }
        let side = |child: &Option<Box<RenderedNode<'a>>>| {
            child
                .as_ref()
                .and_then(|c| self.widths.get(c.node.id.as_str()).copied())
                .unwrap_or(0)
        };
        Some(side(&node.left) + self.metrics.h_gap + side(&node.right))
    }

    fn measure(&mut self, node: &RenderedNode<'a>) -> i32 {
        if let Some(left) = &node.left {
            self.measure(left);
        }
        if let Some(right) = &node.right {
            self.measure(right);
        }
        let width = self
            .row_width(node)
            .map_or(self.metrics.card_width, |row| row.max(self.metrics.card_width));
        self.widths.insert(node.node.id.as_str(), width);
        width
    }

    fn column_width(&self, node: &RenderedNode<'a>) -> i32 {
        self.widths
            .get(node.node.id.as_str())
            .copied()
            .unwrap_or(self.metrics.card_width)
    }

    fn place(&mut self, node: &RenderedNode<'a>, x: i32, y: i32) {
        let m = self.metrics;
        let column = self.column_width(node);
        let card = PlacedCard {
            node: node.node,
            affordance: node.affordance,
            x: x + (column - m.card_width) / 2,
            y,
            width: m.card_width,
            height: m.card_height,
        };
        let from = (card.center_x(), y + m.card_height);
        self.cards.push(card);

        let Some(row) = self.row_width(node) else {
            return;
        };
        let row_x = x + (column - row) / 2;
        let child_y = y + m.card_height + m.v_gap;

        if let Some(left) = &node.left {
            self.place_child(left, row_x, child_y, from);
        }
        if let Some(right) = &node.right {
            let left_width = node.left.as_ref().map_or(0, |l| self.column_width(l));
            self.place_child(right, row_x + left_width + m.h_gap, child_y, from);
        }
    }

    fn place_child(&mut self, child: &RenderedNode<'a>, x: i32, y: i32, from: (i32, i32)) {
        let column = self.column_width(child);
        let center = x + (column - self.metrics.card_width) / 2 + self.metrics.card_width / 2;
        self.links.push(Link {
            from,
            to: (center, y - 1),
        });
        self.place(child, x, y);
    }
}

// Connector directions, merged per cell so shared trunks join cleanly.
const UP: u8 = 1;
const DOWN: u8 = 2;
const LEFT: u8 = 4;
const RIGHT: u8 = 8;

fn connector_symbol(dirs: u8) -> &'static str {
    match dirs {
        d if d == UP | DOWN | LEFT | RIGHT => "┼",
        d if d == UP | LEFT | RIGHT => "┴",
        d if d == DOWN | LEFT | RIGHT => "┬",
        d if d == UP | DOWN | LEFT => "┤",
        d if d == UP | DOWN | RIGHT => "├",
        d if d == UP | LEFT => "┘",
        d if d == UP | RIGHT => "└",
        d if d == DOWN | LEFT => "┐",
        d if d == DOWN | RIGHT => "┌",
        d if d & (LEFT | RIGHT) != 0 && d & (UP | DOWN) == 0 => "─",
        _ => "│",
    }
}

/// Box-drawing cells for every link, keyed by canvas position.
///
/// Each link drops from the parent, runs along the first gap row and drops
/// again into the child.
pub fn connector_cells(links: &[Link]) -> HashMap<(i32, i32), &'static str> {
    let mut dirs: HashMap<(i32, i32), u8> = HashMap::new();
    let mut mark = |x: i32, y: i32, d: u8| *dirs.entry((x, y)).or_insert(0) |= d;

    for link in links {
        let (px, py) = link.from;
        let (cx, cy) = link.to;
        let mid = py;

        mark(px, mid, UP);
        if cx == px {
            mark(px, mid, DOWN);
        } else {
            let (toward_child, toward_parent) = if cx < px { (LEFT, RIGHT) } else { (RIGHT, LEFT) };
            mark(px, mid, toward_child);
            for x in (px.min(cx) + 1)..px.max(cx) {
                mark(x, mid, LEFT | RIGHT);
            }
            mark(cx, mid, toward_parent | DOWN);
        }
        for y in (mid + 1)..=cy {
            mark(cx, y, UP | DOWN);
        }
    }

    dirs.into_iter()
        .map(|(pos, d)| (pos, connector_symbol(d)))
        .collect()
}

/// Canvas offset that places the layout top-center in a view of the given
/// size, shifted so the focused card is fully visible when it fits.
pub fn viewport(layout: &TreeLayout<'_>, view_width: i32, view_height: i32, focus: Option<&str>) -> (i32, i32) {
    let mut x = (view_width - layout.width) / 2;
    let mut y = 0;

    if let Some(card) = focus.and_then(|id| layout.card(id)) {
        let right = x + card.x + card.width;
        if right > view_width {
            x -= right - view_width;
        }
        if x + card.x < 0 {
            x = -card.x;
        }
        let bottom = y + card.y + card.height;
        if bottom > view_height {
            y -= bottom - view_height;
        }
        if y + card.y < 0 {
            y = -card.y;
        }
    }

    (x, y)
}

/// Text lines inside one card.
pub fn card_lines(card: &PlacedCard<'_>) -> Vec<Line<'static>> {
    let node = card.node;
    let marker = match card.affordance {
        Affordance::None => String::new(),
        other => format!("[{}] ", other.marker()),
    };
    let status_color = if node.is_blocked {
        Color::Red
    } else if node.is_active {
        Color::Green
    } else {
        Color::DarkGray
    };
    let status = if node.is_blocked {
        "Blocked"
    } else {
        node.status_label()
    };

    vec![
        Line::from(vec![
            Span::styled(marker, Style::default().fg(Color::Yellow)),
            Span::styled(node.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from(Span::styled(node.id.clone(), Style::default().fg(Color::Gray))),
        Line::from(vec![
            Span::styled(node.position.as_str(), Style::default().fg(Color::Cyan)),
            Span::raw("  "),
            Span::styled(status, Style::default().fg(status_color)),
        ]),
        Line::from(format!(
            "team {}/{}",
            node.associated_active_users_count, node.associated_users_count
        )),
        Line::from(format!("redeemed {}", node.redeemed_times)),
    ]
}

fn card_block(card: &PlacedCard<'_>, selected: bool) -> Block<'static> {
    let node = card.node;
    let border = if selected {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else if node.is_active {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let title_style = if node.role == Role::Admin {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(Span::styled(format!(" {} ", node.role.as_str()), title_style));
    if node.is_blocked {
        block = block.style(Style::default().bg(Color::Rgb(60, 0, 0)));
    }
    block
}

/// Screen rectangle for a canvas card, if it lies entirely inside `area`.
fn screen_rect(area: Rect, offset: (i32, i32), card: &PlacedCard<'_>) -> Option<Rect> {
    let x = i32::from(area.x) + offset.0 + card.x;
    let y = i32::from(area.y) + offset.1 + card.y;
    let inside = x >= i32::from(area.x)
        && y >= i32::from(area.y)
        && x + card.width <= i32::from(area.right())
        && y + card.height <= i32::from(area.bottom());
    inside.then(|| Rect::new(x as u16, y as u16, card.width as u16, card.height as u16))
}

fn draw_connectors(buf: &mut Buffer, area: Rect, offset: (i32, i32), links: &[Link]) {
    let style = Style::default().fg(Color::DarkGray);
    for ((cx, cy), symbol) in connector_cells(links) {
        let x = i32::from(area.x) + offset.0 + cx;
        let y = i32::from(area.y) + offset.1 + cy;
        if x < i32::from(area.x)
            || y < i32::from(area.y)
            || x >= i32::from(area.right())
            || y >= i32::from(area.bottom())
        {
            continue;
        }
        if let Some(cell) = buf.cell_mut((x as u16, y as u16)) {
            cell.set_symbol(symbol).set_style(style);
        }
    }
}

/// Render the tree panel.
///
/// # Arguments
///
/// * `frame` - The frame to render to
/// * `area` - The area to render within
/// * `tree` - The rendered tree, or `None` when there is nothing to show
/// * `zoom_tenths` - Current zoom, in tenths
/// * `selected` - Identifier of the selected card
pub fn render_tree_view(
    frame: &mut Frame,
    area: Rect,
    tree: Option<&RenderedTree<'_>>,
    zoom_tenths: u8,
    selected: Option<&str>,
) {
    let block = Block::default()
        .title(" Network ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let Some(tree) = tree else {
        let paragraph = Paragraph::new("No users in your network yet")
            .block(block)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(paragraph, area);
        return;
    };

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let layout = layout(tree, CardMetrics::for_zoom(zoom_tenths));
    let offset = viewport(
        &layout,
        i32::from(inner.width),
        i32::from(inner.height),
        selected,
    );

    draw_connectors(frame.buffer_mut(), inner, offset, &layout.links);

    for card in &layout.cards {
        let Some(rect) = screen_rect(inner, offset, card) else {
            continue;
        };
        let is_selected = selected == Some(card.node.id.as_str());
        let paragraph = Paragraph::new(card_lines(card)).block(card_block(card, is_selected));
        frame.render_widget(paragraph, rect);
    }
}
