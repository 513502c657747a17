//! Output formatting module for Canopy
//!
//! Provides the text renderings printed by the CLI: the placement tree drawn
//! with box characters and the referral link table.

use canopy_core::tree::{Affordance, DanglingRef, RenderedNode, RenderedTree};
use canopy_core::{Node, Position, ReferralLink, registration_link};

/// Visual prefix characters for tree structure.
mod tree_chars {
    /// Branch connector for intermediate items.
    pub const BRANCH: &str = "\u{251C}\u{2500}\u{2500}"; // ├──
    /// Last item connector.
    pub const LAST_BRANCH: &str = "\u{2514}\u{2500}\u{2500}"; // └──
    /// Vertical line for continuing structure.
    pub const VERTICAL: &str = "\u{2502}   "; // │
    /// Empty space for alignment.
    pub const SPACE: &str = "    ";
}

/// Format a rendered tree as indented text.
///
/// Produces output in the format:
/// ```text
/// [-] Root Admin (A)  ADMIN  Active  team 2/1  redeemed 0
/// ├── L     Bob (B)  USER  Active  team 0/0  redeemed 0
/// └── R [+] Carol (C)  USER  Inactive  team 0/0  redeemed 0
/// ```
///
/// Missing child references are listed after the tree.
pub fn format_tree(tree: &RenderedTree) -> String {
    let mut lines = vec![card_line(&tree.root)];
    push_children(&mut lines, &tree.root, "");

    if !tree.dangling.is_empty() {
        lines.push(String::new());
        lines.push(format_dangling(&tree.dangling));
    }
    lines.join("\n")
}

fn push_children(lines: &mut Vec<String>, node: &RenderedNode, prefix: &str) {
    let children: Vec<&RenderedNode> = [node.left.as_deref(), node.right.as_deref()]
        .into_iter()
        .flatten()
        .collect();

    for (i, child) in children.iter().enumerate() {
        let is_last = i == children.len() - 1;
        let connector = if is_last {
            tree_chars::LAST_BRANCH
        } else {
            tree_chars::BRANCH
        };
        lines.push(format!("{}{} {}", prefix, connector, card_line(child)));

        let continuation = if is_last {
            tree_chars::SPACE
        } else {
            tree_chars::VERTICAL
        };
        push_children(lines, child, &format!("{}{}", prefix, continuation));
    }
}

/// One card: affordance, slot, identity, role, status and counts.
fn card_line(rendered: &RenderedNode) -> String {
    let node = rendered.node;
    let slot = match rendered.slot {
        Some(Position::Left) => "L ",
        Some(Position::Right) => "R ",
        None => "",
    };
    format!(
        "{}{} {} ({})  {}  {}  team {}/{}  redeemed {}",
        slot,
        affordance_marker(rendered.affordance),
        node.name,
        node.id,
        node.role,
        status_text(node),
        node.associated_users_count,
        node.associated_active_users_count,
        node.redeemed_times
    )
}

fn affordance_marker(affordance: Affordance) -> &'static str {
    match affordance {
        Affordance::None => "   ",
        Affordance::Expand => "[+]",
        Affordance::Collapse => "[-]",
    }
}

/// "Active", "Inactive", with ", blocked" appended for blocked users
pub fn status_text(node: &Node) -> String {
    if node.is_blocked {
        format!("{}, blocked", node.status_label())
    } else {
        node.status_label().to_string()
    }
}

/// List missing child references.
pub fn format_dangling(dangling: &[DanglingRef]) -> String {
    let mut out = format!("{} missing node reference(s):", dangling.len());
    for d in dangling {
        out.push_str(&format!(
            "\n  {} {} slot -> {}",
            d.parent,
            d.slot.as_str().to_lowercase(),
            d.missing
        ));
    }
    out
}

/// Format referral links into an aligned table string.
///
/// Produces output in the format:
/// ```text
/// Code        Position  Created     Used by   Link
/// ----------  --------  ----------  --------  ----------------------------------------
/// AL00000001  LEFT      2025-05-01  Jane Doe  https://asilocloud.ink/register?sponsor=AL00000001
/// ```
pub fn format_referral_table(links: &[ReferralLink], site_url: &str) -> String {
    if links.is_empty() {
        return "No referral links yet.".to_string();
    }

    let headers = ["Code", "Position", "Created", "Used by", "Link"];

    let rows: Vec<[String; 5]> = links
        .iter()
        .map(|l| {
            [
                l.code.clone(),
                l.position.to_string(),
                l.created_at.format("%Y-%m-%d").to_string(),
                l.used_by.clone().unwrap_or_else(|| "-".to_string()),
                registration_link(site_url, &l.code),
            ]
        })
        .collect();

    // Calculate column widths based on content
    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    output.push_str(&format_row(&headers.map(String::from), &widths));
    output.push('\n');
    output.push_str(&format_row(&widths.map(|w| "-".repeat(w)), &widths));
    for row in &rows {
        output.push('\n');
        output.push_str(&format_row(row, &widths));
    }
    output
}

fn format_row(cells: &[String; 5], widths: &[usize; 5]) -> String {
    let mut line = String::new();
    for (i, (cell, width)) in cells.iter().zip(widths.iter()).enumerate() {
        if i > 0 {
            line.push_str("  ");
        }
        // The last column is not padded
        if i == cells.len() - 1 {
            line.push_str(cell);
        } else {
            line.push_str(&format!("{:<width$}", cell, width = width));
        }
    }
    line
}
