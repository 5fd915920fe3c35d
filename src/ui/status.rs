use crate::app::{App, MenuFocus, RecommendState, Tab, UploadState};
use ratatui::{layout::Rect, widgets::Paragraph, Frame};
use std::borrow::Cow;

use super::helpers::SPINNER_GLYPHS;

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    // Guard against zero-width/height areas
    if area.width < 1 || area.height < 1 {
        return;
    }

    // Use Cow to avoid allocations for static strings and borrowed status messages
    let text: Cow<'_, str> = if let Some(progress) = loading_text(app) {
        let glyph = SPINNER_GLYPHS[app.spinner_frame % SPINNER_GLYPHS.len()];
        Cow::Owned(format!("{} {}", glyph, progress))
    } else if let Some((msg, _)) = &app.status_message {
        // Borrow existing status message instead of cloning
        Cow::Borrowed(msg.as_ref())
    } else if app.offline() {
        Cow::Owned(format!("[offline] {}", hints(app)))
    } else {
        Cow::Borrowed(hints(app))
    };

    let paragraph = Paragraph::new(text).style(app.palette.status_bar);
    f.render_widget(paragraph, area);
}

/// Label for whichever background request is in flight, if any.
fn loading_text(app: &App) -> Option<&'static str> {
    if let RecommendState::Loading { revision } = app.recommend {
        return Some(if revision {
            "Requesting revised recommendation..."
        } else {
            "Requesting recommendation..."
        });
    }
    if matches!(app.upload_state, Some(UploadState::Uploading { .. })) {
        return Some("Uploading menu photo...");
    }
    if app.menu_loading {
        return Some("Refreshing menu...");
    }
    if app.history_loading {
        return Some("Loading history...");
    }
    None
}

/// Static keybinding hints for the active tab - zero allocation.
fn hints(app: &App) -> &'static str {
    match app.tab {
        Tab::Menu => match app.menu_focus {
            MenuFocus::Items => {
                "[j/k]move [Enter]add [l]cart [r]efresh [p]hoto [X]reset [?]help [q]uit"
            }
            MenuFocus::Cart => "[j/k]move [+/-]qty [x]remove [c]lear [h]menu [?]help [q]uit",
        },
        Tab::Recommend => {
            "[r]ecommend [n]revise [l/d]rate [Space]select [s]ave [e]notes [?]help [q]uit"
        }
        Tab::History => "[j/k]scroll [r]eload [c]lear [?]help [q]uit",
        Tab::Settings => "[j/k]move [Enter]change [?]help [q]uit",
    }
}
