//! Help overlay, a scrollable keybinding table.
//!
//! Renders a centered overlay listing all keybindings grouped by tab.

use crate::app::App;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table},
    Frame,
};

use super::helpers::centered_rect;

/// Key bindings grouped by section, in help display order.
const SECTIONS: [(&str, &[(&str, &str)]); 5] = [
    (
        "General",
        &[
            ("Tab / Shift+Tab", "Next / previous tab"),
            ("1-4", "Jump to tab"),
            ("t", "Toggle dark/light theme"),
            ("?", "Toggle this help"),
            ("q", "Quit"),
        ],
    ),
    (
        "Menu",
        &[
            ("j/k", "Move between items"),
            ("Enter / a", "Add item to cart"),
            ("h/l", "Switch between items and cart"),
            ("+/-", "Change quantity (cart)"),
            ("x", "Remove entry (cart)"),
            ("c", "Clear cart"),
            ("r", "Refresh menu from server"),
            ("p", "Upload a menu photo"),
            ("X", "Reset the daily menu"),
        ],
    ),
    (
        "Recommend",
        &[
            ("r", "Request a recommendation"),
            ("n", "Request a revision with your ratings"),
            ("j/k", "Move between recommended meals"),
            ("l / d", "Rate a meal up / down"),
            ("Space", "Toggle a meal for saving"),
            ("s", "Save selected meals to history"),
            ("e", "Edit additional notes"),
        ],
    ),
    (
        "History",
        &[
            ("j/k", "Scroll"),
            ("r", "Reload from the database"),
            ("c", "Clear all saved history"),
        ],
    ),
    (
        "Settings",
        &[
            ("j/k", "Move between rows"),
            ("Enter", "Cycle a choice or edit a value"),
            ("Esc", "Cancel an edit"),
        ],
    ),
];

/// Render the help overlay on top of the current view.
///
/// Draws a centered, bordered table of keybindings grouped by section.
/// Supports vertical scrolling for short terminals.
pub fn render(f: &mut Frame, app: &App) {
    let area = f.area();

    // Leave a margin around the overlay
    let overlay = centered_rect(80, 80, area);
    if overlay.width < 20 || overlay.height < 6 {
        return;
    }

    // Clear the background behind the overlay
    f.render_widget(Clear, overlay);

    // Build rows grouped by section
    let mut rows: Vec<Row> = Vec::new();
    for (label, bindings) in &SECTIONS {
        rows.push(
            Row::new(vec![
                Line::from(Span::styled(
                    format!("-- {} --", label),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
            ])
            .style(app.palette.category_header),
        );
        for (key, description) in *bindings {
            rows.push(Row::new(vec![
                format!("  {}", key),
                (*description).to_string(),
            ]));
        }
        // Blank separator between groups
        rows.push(Row::new(vec![String::new(), String::new()]));
    }
    // Remove trailing blank row
    rows.pop();

    let total_rows = rows.len();

    // Apply scroll offset
    let visible_height = overlay.height.saturating_sub(3) as usize; // -2 border -1 header
    let max_scroll = total_rows.saturating_sub(visible_height);
    let scroll = app.help_scroll_offset.min(max_scroll);
    let visible_rows: Vec<Row> = rows.into_iter().skip(scroll).take(visible_height).collect();

    // Scroll indicator in title
    let title = if max_scroll > 0 {
        format!(
            " Help ({}/{}) ",
            scroll.saturating_add(1),
            max_scroll.saturating_add(1)
        )
    } else {
        " Help (? to close) ".to_string()
    };

    let widths = [Constraint::Length(18), Constraint::Min(20)];

    let table = Table::new(visible_rows, widths)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.palette.panel_border_focused)
                .title(title),
        )
        .header(
            Row::new(vec!["Key", "Action"])
                .style(
                    Style::default()
                        .add_modifier(Modifier::BOLD)
                        .add_modifier(Modifier::UNDERLINED),
                )
                .bottom_margin(1),
        )
        .style(app.palette.item_normal);

    f.render_widget(table, overlay);

    // Scroll hint at bottom if content overflows
    if max_scroll > 0 && scroll < max_scroll {
        let hint = Line::from(vec![Span::styled(
            " j/k to scroll, ? or Esc to close ",
            app.palette.setting_value,
        )]);
        let hint_area = Rect {
            x: overlay.x + 1,
            y: overlay.y + overlay.height.saturating_sub(1),
            width: overlay.width.saturating_sub(2),
            height: 1,
        };
        f.render_widget(Paragraph::new(hint), hint_area);
    }
}
