//! Render functions for the TUI.
//!
//! This module handles all rendering logic, dispatching to the active tab
//! and drawing any open overlay on top.

use crate::app::{App, ConfirmAction, Tab, UploadState};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use super::helpers::{centered_fixed, format_price};
use super::{help, history, menu, recommend, settings, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 60;
pub(super) const MIN_HEIGHT: u16 = 10;

/// Main render dispatch function.
///
/// Draws the tab bar, the active tab's body, and the status bar, then any
/// overlay. Handles terminal size validation before rendering.
pub(super) fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();

    // Guard against zero-width/height to prevent panics
    if area.width < 1 || area.height < 1 {
        return;
    }

    // Minimum terminal size check for a usable UI
    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        // For very small terminals, just show a minimal message
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_tab_bar(f, app, chunks[0]);
    match app.tab {
        Tab::Menu => menu::render(f, app, chunks[1]),
        Tab::Recommend => recommend::render(f, app, chunks[1]),
        Tab::History => history::render(f, app, chunks[1]),
        Tab::Settings => settings::render(f, app, chunks[1]),
    }
    status::render(f, app, chunks[2]);

    // Overlays, lowest priority first so the input-routing order wins on top
    if let Some(picker) = &app.variant_picker {
        render_variant_picker_overlay(f, app, picker);
    }
    if let Some(state) = &app.upload_state {
        render_upload_overlay(f, app, state);
    }
    if let Some(input) = &app.notes_edit {
        render_notes_overlay(f, app, input);
    }
    if let Some(confirm) = &app.pending_confirm {
        render_confirm_overlay(f, app, confirm);
    }
    if app.show_help {
        help::render(f, app);
    }
}

fn render_tab_bar(f: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| Line::from(format!(" {} {} ", i + 1, tab.title())))
        .collect();
    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .style(app.palette.tab_inactive)
        .highlight_style(app.palette.tab_active)
        .divider("|");
    f.render_widget(tabs, area);
}

/// Render a confirmation dialog overlay centered on screen.
fn render_confirm_overlay(f: &mut Frame, app: &App, confirm: &ConfirmAction) {
    let text = match confirm {
        ConfirmAction::ClearHistory => {
            "Clear all saved history?\n\nEvery recorded meal will be removed.\n\n(y) Confirm  (n/Esc) Cancel"
        }
        ConfirmAction::ResetMenu => {
            "Reset the daily menu?\n\nThe server menu and the local cache will be cleared.\n\n(y) Confirm  (n/Esc) Cancel"
        }
    };

    let overlay = centered_fixed(50, 7, f.area());
    if overlay.width < 10 || overlay.height < 5 {
        return;
    }

    f.render_widget(Clear, overlay);

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.palette.panel_border_focused)
                .title(" Confirm "),
        )
        .alignment(Alignment::Center)
        .style(app.palette.item_normal);

    f.render_widget(paragraph, overlay);
}

/// Render the variant picker overlay for a multi-variant item.
fn render_variant_picker_overlay(f: &mut Frame, app: &App, picker: &crate::app::VariantPicker) {
    let Some(item) = app
        .menu
        .get(picker.category)
        .and_then(|c| c.items.get(picker.item))
    else {
        return;
    };

    let mut body = String::new();
    for (i, variant) in item.variants.iter().enumerate() {
        let marker = if i == picker.selected { "> " } else { "  " };
        body.push_str(&format!(
            "{}{}  {}  {} kcal\n",
            marker,
            variant.variant_name,
            format_price(variant.price),
            variant.calories
        ));
    }
    body.push_str("\n(Enter) Add to cart  (Esc) Cancel");

    let height = item.variants.len() as u16 + 4;
    let overlay = centered_fixed(45, height, f.area());
    if overlay.width < 20 || overlay.height < 5 {
        return;
    }

    f.render_widget(Clear, overlay);

    let paragraph = Paragraph::new(body)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.palette.panel_border_focused)
                .title(format!(" {} ", item.name)),
        )
        .style(app.palette.item_normal);

    f.render_widget(paragraph, overlay);
}

/// Render the photo upload dialog overlay.
fn render_upload_overlay(f: &mut Frame, app: &App, state: &UploadState) {
    let (title, text) = match state {
        UploadState::InputPath { input } => (
            " Upload Menu Photo ",
            format!(
                "Path to the photo:\n\n> {}_\n\n(Enter) Upload  (Esc) Cancel",
                input
            ),
        ),
        UploadState::Uploading { path } => (
            " Uploading ",
            format!("Uploading {}...\n\nPlease wait.\n\n(Esc) Dismiss", path),
        ),
    };

    let overlay = centered_fixed(60, 8, f.area());
    if overlay.width < 20 || overlay.height < 6 {
        return;
    }

    f.render_widget(Clear, overlay);

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.palette.panel_border_focused)
                .title(title),
        )
        .style(app.palette.item_normal);

    f.render_widget(paragraph, overlay);
}

/// Render the notes editor overlay for the recommendation request.
fn render_notes_overlay(f: &mut Frame, app: &App, input: &str) {
    let overlay = centered_fixed(60, 8, f.area());
    if overlay.width < 20 || overlay.height < 6 {
        return;
    }

    f.render_widget(Clear, overlay);

    let text = format!(
        "Notes sent with the next request:\n\n> {}_\n\n(Enter) Save  (Esc) Cancel",
        input
    );
    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.palette.panel_border_focused)
                .title(" Additional Notes "),
        )
        .style(app.palette.item_normal);

    f.render_widget(paragraph, overlay);
}
