//! Input handling for the TUI.
//!
//! This module processes keyboard input and dispatches to the appropriate
//! handler based on the active overlay or tab.

use crate::app::{
    App, AppEvent, ConfirmAction, MenuFocus, MenuRow, Rating, SettingEdit, SettingRow, Tab,
    UploadState, VariantPicker,
};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::events::{
    maybe_load_history, spawn_history_load, spawn_menu_fetch, spawn_photo_upload,
    spawn_profile_save, spawn_recommendation, spawn_save_meals, spawn_theme_save,
};
use super::loop_runner::Action;

/// Cap typed input length to prevent memory abuse from held keys.
const MAX_INPUT_LENGTH: usize = 256;
/// Filesystem paths legitimately run longer than other typed input.
const MAX_PATH_LENGTH: usize = 1024;

/// Main input dispatch.
///
/// Overlays capture all keys first, in the same order they stack visually;
/// global keys come next, and whatever remains goes to the active tab.
pub(super) async fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    if app.show_help {
        return handle_help_input(app, code);
    }
    if app.pending_confirm.is_some() {
        return handle_confirm_input(app, code, event_tx);
    }
    if app.setting_edit.is_some() {
        return handle_setting_edit_input(app, code, event_tx);
    }
    if app.notes_edit.is_some() {
        return handle_notes_input(app, code);
    }
    if app.upload_state.is_some() {
        return handle_upload_input(app, code, event_tx);
    }
    if app.variant_picker.is_some() {
        return handle_picker_input(app, code);
    }

    // Ctrl+C quits from anywhere outside an overlay
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Ok(Action::Quit);
    }

    match code {
        KeyCode::Char('q') => return Ok(Action::Quit),
        KeyCode::Char('?') => {
            app.show_help = true;
            app.help_scroll_offset = 0;
            return Ok(Action::Continue);
        }
        KeyCode::Tab => {
            app.next_tab();
            maybe_load_history(app, event_tx);
            return Ok(Action::Continue);
        }
        KeyCode::BackTab => {
            app.prev_tab();
            maybe_load_history(app, event_tx);
            return Ok(Action::Continue);
        }
        KeyCode::Char(c @ '1'..='4') => {
            let idx = (c as usize) - ('1' as usize);
            app.set_tab(Tab::ALL[idx]);
            maybe_load_history(app, event_tx);
            return Ok(Action::Continue);
        }
        KeyCode::Char('t') => {
            let name = app.cycle_theme();
            spawn_theme_save(app, event_tx);
            app.set_status(format!("Theme: {}", name));
            return Ok(Action::Continue);
        }
        _ => {}
    }

    match app.tab {
        Tab::Menu => match app.menu_focus {
            MenuFocus::Items => handle_menu_items_input(app, code, event_tx),
            MenuFocus::Cart => handle_menu_cart_input(app, code),
        },
        Tab::Recommend => handle_recommend_input(app, code, event_tx),
        Tab::History => handle_history_input(app, code, event_tx),
        Tab::Settings => handle_settings_input(app, code, event_tx),
    }
}

/// Handle input while the help overlay is visible.
fn handle_help_input(app: &mut App, code: KeyCode) -> Result<Action> {
    match code {
        KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::Esc => {
            app.show_help = false;
            app.help_scroll_offset = 0;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_sub(1);
        }
        _ => {}
    }
    Ok(Action::Continue)
}

/// Handle input while the confirmation dialog is visible.
///
/// y/Y confirms the action, n/N/Esc cancels.
fn handle_confirm_input(
    app: &mut App,
    code: KeyCode,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    match code {
        KeyCode::Char('y') | KeyCode::Char('Y') => match app.pending_confirm.take() {
            Some(ConfirmAction::ClearHistory) => {
                super::events::spawn_clear_history(app, event_tx);
            }
            Some(ConfirmAction::ResetMenu) => {
                super::events::spawn_menu_reset(app, event_tx);
            }
            None => {}
        },
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.pending_confirm = None;
            app.set_status("Cancelled");
        }
        _ => {} // Ignore other keys
    }
    Ok(Action::Continue)
}

/// Handle input while a typed settings value is being edited.
fn handle_setting_edit_input(
    app: &mut App,
    code: KeyCode,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    // Take ownership temporarily to mutate the buffer
    let Some(mut edit) = app.setting_edit.take() else {
        return Ok(Action::Continue);
    };
    match code {
        KeyCode::Char(c) => {
            if edit.input.len() < MAX_INPUT_LENGTH {
                edit.input.push(c);
            }
            app.setting_edit = Some(edit);
        }
        KeyCode::Backspace => {
            edit.input.pop();
            app.setting_edit = Some(edit);
        }
        KeyCode::Enter => match app.apply_setting_input(edit.row, &edit.input) {
            Ok(()) => {
                // setting_edit stays None from take()
                spawn_profile_save(app, event_tx);
            }
            Err(msg) => {
                app.set_status(msg);
                app.setting_edit = Some(edit);
            }
        },
        KeyCode::Esc => {
            // Cancel; setting_edit is already None from take()
        }
        _ => {
            app.setting_edit = Some(edit);
        }
    }
    Ok(Action::Continue)
}

/// Handle input while the notes overlay is open.
fn handle_notes_input(app: &mut App, code: KeyCode) -> Result<Action> {
    let Some(mut input) = app.notes_edit.take() else {
        return Ok(Action::Continue);
    };
    match code {
        KeyCode::Char(c) => {
            if input.len() < MAX_INPUT_LENGTH {
                input.push(c);
            }
            app.notes_edit = Some(input);
        }
        KeyCode::Backspace => {
            input.pop();
            app.notes_edit = Some(input);
        }
        KeyCode::Enter => {
            app.notes = input.trim().to_string();
            app.set_status("Notes updated");
        }
        KeyCode::Esc => {
            // Cancel; notes_edit is already None from take()
        }
        _ => {
            app.notes_edit = Some(input);
        }
    }
    Ok(Action::Continue)
}

/// Handle input while the photo upload dialog is visible.
fn handle_upload_input(
    app: &mut App,
    code: KeyCode,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    let state = app.upload_state.take();
    match state {
        Some(UploadState::InputPath { mut input }) => match code {
            KeyCode::Char(c) => {
                if input.len() < MAX_PATH_LENGTH {
                    input.push(c);
                }
                app.upload_state = Some(UploadState::InputPath { input });
            }
            KeyCode::Backspace => {
                input.pop();
                app.upload_state = Some(UploadState::InputPath { input });
            }
            KeyCode::Enter => {
                let path = input.trim().to_owned();
                if path.is_empty() {
                    app.upload_state = Some(UploadState::InputPath { input });
                    return Ok(Action::Continue);
                }
                spawn_photo_upload(app, path, event_tx);
            }
            KeyCode::Esc => {
                // Cancel; upload_state is already None from take()
            }
            _ => {
                app.upload_state = Some(UploadState::InputPath { input });
            }
        },
        Some(UploadState::Uploading { path }) => {
            if code == KeyCode::Esc {
                // Dismiss the dialog; the upload finishes in the background
                app.set_status("Upload continues in the background");
            } else {
                app.upload_state = Some(UploadState::Uploading { path });
            }
        }
        None => {}
    }
    Ok(Action::Continue)
}

/// Handle input while the variant picker is open.
///
/// Adds through the picker's own indices rather than the menu cursor, so a
/// menu refresh underneath the popup cannot add the wrong item.
fn handle_picker_input(app: &mut App, code: KeyCode) -> Result<Action> {
    let Some(mut picker) = app.variant_picker.take() else {
        return Ok(Action::Continue);
    };
    let variant_count = app
        .menu
        .get(picker.category)
        .and_then(|c| c.items.get(picker.item))
        .map(|i| i.variants.len())
        .unwrap_or(0);

    match code {
        KeyCode::Char('k') | KeyCode::Up => {
            picker.selected = picker.selected.saturating_sub(1);
            app.variant_picker = Some(picker);
        }
        KeyCode::Char('j') | KeyCode::Down => {
            picker.selected = (picker.selected + 1).min(variant_count.saturating_sub(1));
            app.variant_picker = Some(picker);
        }
        KeyCode::Enter => {
            let picked = app
                .menu
                .get(picker.category)
                .and_then(|c| c.items.get(picker.item))
                .and_then(|item| {
                    item.variants
                        .get(picker.selected)
                        .map(|v| (v.clone(), Arc::clone(&item.name)))
                });
            match picked {
                Some((variant, name)) => {
                    let variant_name = Arc::clone(&variant.variant_name);
                    app.cart.add(variant, Arc::clone(&name));
                    app.clamp_selections();
                    app.set_status(format!("Added {} ({})", name, variant_name));
                }
                None => app.set_status("Item is no longer on the menu"),
            }
        }
        KeyCode::Esc => {
            // Cancel; variant_picker is already None from take()
        }
        _ => {
            app.variant_picker = Some(picker);
        }
    }
    Ok(Action::Continue)
}

/// Menu tab input with the item list focused.
fn handle_menu_items_input(
    app: &mut App,
    code: KeyCode,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    match code {
        KeyCode::Char('j') | KeyCode::Down => app.nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.nav_up(),
        KeyCode::Char('l') | KeyCode::Right => {
            if app.cart.is_empty() {
                app.set_status("Cart is empty");
            } else {
                app.menu_focus = MenuFocus::Cart;
                app.needs_redraw = true;
            }
        }
        KeyCode::Enter | KeyCode::Char('a') => add_under_cursor(app),
        KeyCode::Char('r') => {
            if app.offline() {
                app.set_status("Offline: using the cached menu");
            } else {
                spawn_menu_fetch(app, event_tx);
            }
        }
        KeyCode::Char('p') => {
            if app.offline() {
                app.set_status("Offline: uploads need the server");
            } else {
                app.upload_state = Some(UploadState::InputPath {
                    input: String::new(),
                });
                app.needs_redraw = true;
            }
        }
        KeyCode::Char('X') => {
            if app.offline() {
                app.set_status("Offline: reset needs the server");
            } else {
                app.pending_confirm = Some(ConfirmAction::ResetMenu);
                app.needs_redraw = true;
            }
        }
        _ => {}
    }
    Ok(Action::Continue)
}

/// Add the item under the menu cursor, via the picker when it has sizes.
fn add_under_cursor(app: &mut App) {
    let Some(MenuRow::Item { category, item }) = app.menu_rows.get(app.menu_cursor).copied()
    else {
        return;
    };
    let variant_count = app
        .menu
        .get(category)
        .and_then(|c| c.items.get(item))
        .map(|f| f.variants.len())
        .unwrap_or(0);

    match variant_count {
        0 => app.set_status("No purchasable variant for this item"),
        1 => {
            if let Some((food, variant)) = app.add_selected_to_cart(0) {
                app.set_status(format!("Added {} ({})", food, variant));
            }
        }
        _ => {
            app.variant_picker = Some(VariantPicker {
                category,
                item,
                selected: 0,
            });
            app.needs_redraw = true;
        }
    }
}

/// Menu tab input with the cart focused.
fn handle_menu_cart_input(app: &mut App, code: KeyCode) -> Result<Action> {
    match code {
        KeyCode::Char('j') | KeyCode::Down => app.nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.nav_up(),
        KeyCode::Char('h') | KeyCode::Left => {
            app.menu_focus = MenuFocus::Items;
            app.needs_redraw = true;
        }
        KeyCode::Char('+') | KeyCode::Char('=') => adjust_cart_quantity(app, 1),
        KeyCode::Char('-') => adjust_cart_quantity(app, -1),
        KeyCode::Char('x') | KeyCode::Delete => remove_cart_entry(app),
        KeyCode::Char('c') => {
            if !app.cart.is_empty() {
                app.cart.clear();
                app.cart_cursor = 0;
                app.menu_focus = MenuFocus::Items;
                app.set_status("Cart cleared");
            }
        }
        _ => {}
    }
    Ok(Action::Continue)
}

fn adjust_cart_quantity(app: &mut App, delta: i32) {
    let Some(variant_id) = app.selected_cart_entry().map(|e| e.variant.variant_id) else {
        return;
    };
    // Dropping to zero removes the entry
    app.cart.adjust_quantity(variant_id, delta);
    app.clamp_selections();
    if app.cart.is_empty() {
        app.menu_focus = MenuFocus::Items;
    }
    app.needs_redraw = true;
}

fn remove_cart_entry(app: &mut App) {
    let Some((variant_id, name)) = app
        .selected_cart_entry()
        .map(|e| (e.variant.variant_id, Arc::clone(&e.food_name)))
    else {
        return;
    };
    app.cart.remove(variant_id);
    app.clamp_selections();
    if app.cart.is_empty() {
        app.menu_focus = MenuFocus::Items;
    }
    app.set_status(format!("Removed {}", name));
}

/// Recommend tab input.
fn handle_recommend_input(
    app: &mut App,
    code: KeyCode,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    match code {
        KeyCode::Char('j') | KeyCode::Down => app.nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.nav_up(),
        KeyCode::Char('r') => {
            if app.offline() {
                app.set_status("Offline: recommendations need the server");
            } else {
                spawn_recommendation(app, false, event_tx);
            }
        }
        KeyCode::Char('n') => {
            if app.offline() {
                app.set_status("Offline: recommendations need the server");
            } else if app.recommend_result().is_none() {
                app.set_status("Request a recommendation first");
            } else {
                spawn_recommendation(app, true, event_tx);
            }
        }
        KeyCode::Char('l') => rate_under_cursor(app, Rating::Like),
        KeyCode::Char('d') => rate_under_cursor(app, Rating::Dislike),
        KeyCode::Char(' ') => toggle_selected_under_cursor(app),
        KeyCode::Char('s') => save_selected(app, event_tx),
        KeyCode::Char('e') => {
            app.notes_edit = Some(app.notes.clone());
            app.needs_redraw = true;
        }
        _ => {}
    }
    Ok(Action::Continue)
}

/// Rate the meal under the cursor. Unresolved meals carry no rating.
fn rate_under_cursor(app: &mut App, rating: Rating) {
    let variant_id = match app.selected_recommend_meal() {
        Some(meal) if meal.food.is_some() => meal.variant_id,
        _ => return,
    };
    if let Some(result) = app.recommend_result_mut() {
        result.toggle_rating(variant_id, rating);
        app.needs_redraw = true;
    }
}

fn toggle_selected_under_cursor(app: &mut App) {
    let Some(variant_id) = app.selected_recommend_meal().map(|m| m.variant_id) else {
        return;
    };
    if let Some(result) = app.recommend_result_mut() {
        result.toggle_selected(variant_id);
        app.needs_redraw = true;
    }
}

/// Save the checked meals of the current result to history.
fn save_selected(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let Some(result) = app.recommend_result() else {
        app.set_status("Nothing to save yet");
        return;
    };
    let ids = result.selected_variant_ids();
    if ids.is_empty() {
        app.set_status("No meals selected");
        return;
    }
    spawn_save_meals(app, ids, event_tx);
}

/// History tab input.
fn handle_history_input(
    app: &mut App,
    code: KeyCode,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    match code {
        KeyCode::Char('j') | KeyCode::Down => app.nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.nav_up(),
        KeyCode::Char('r') => {
            app.history_dirty = true;
            spawn_history_load(app, event_tx);
        }
        KeyCode::Char('c') => {
            if app.history.is_empty() && !app.history_dirty {
                app.set_status("History is already empty");
            } else {
                app.pending_confirm = Some(ConfirmAction::ClearHistory);
                app.needs_redraw = true;
            }
        }
        _ => {}
    }
    Ok(Action::Continue)
}

/// Settings tab input.
fn handle_settings_input(
    app: &mut App,
    code: KeyCode,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    match code {
        KeyCode::Char('j') | KeyCode::Down => app.nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.nav_up(),
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => {
            let row = app.selected_setting();
            if app.cycle_setting(row) {
                if row == SettingRow::Theme {
                    spawn_theme_save(app, event_tx);
                } else {
                    spawn_profile_save(app, event_tx);
                }
            } else {
                app.setting_edit = Some(SettingEdit {
                    row,
                    input: app.setting_input_seed(row),
                });
                app.needs_redraw = true;
            }
        }
        _ => {}
    }
    Ok(Action::Continue)
}
