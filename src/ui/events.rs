//! Background tasks and their completion events.
//!
//! Every network or database operation runs in a spawned task and reports
//! back through the `AppEvent` channel; `handle_app_event` folds the
//! results into application state on the UI loop.

use crate::api::ApiClient;
use crate::app::{App, AppEvent, RecommendState, Tab};
use crate::history::group_history;
use crate::menu::{categories_from_payload, flatten_for_cache, FoodCategory, MealPeriod};
use crate::storage::Database;
use chrono::Timelike;
use std::path::Path;
use tokio::sync::mpsc;

use super::helpers::catch_task_panic;

/// OCR backend the service runs on uploaded menu photos.
const OCR_METHOD: &str = "GoogleOCR";

// ----------------------------------------------------------------------
// Task spawners
// ----------------------------------------------------------------------

/// Spawn a menu fetch, aborting any fetch still in flight.
///
/// The task replaces the local cache before reporting, so a `MenuLoaded`
/// event always means cache and screen agree.
pub(super) fn spawn_menu_fetch(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let Some(client) = app.client.clone() else {
        return;
    };

    if let Some(handle) = app.menu_task.take() {
        handle.abort();
        tracing::debug!("Aborted previous menu fetch");
    }
    app.menu_generation = app.menu_generation.wrapping_add(1);
    let generation = app.menu_generation;
    app.menu_loading = true;
    app.needs_redraw = true;

    let db = app.db.clone();
    let tx = event_tx.clone();
    tracing::debug!(generation, "Spawning menu fetch");

    app.menu_task = Some(tokio::spawn(async move {
        let event = match fetch_and_cache_menu(&client, &db).await {
            Ok(categories) => AppEvent::MenuLoaded {
                generation,
                categories,
            },
            Err(error) => AppEvent::MenuLoadFailed { generation, error },
        };
        if let Err(e) = tx.send(event).await {
            tracing::warn!(error = %e, "Failed to send menu result (receiver dropped)");
        }
    }));
}

/// Fetch the menu, swap it into the local cache, and return the domain tree.
async fn fetch_and_cache_menu(
    client: &ApiClient,
    db: &Database,
) -> Result<Vec<FoodCategory>, String> {
    let payload = client.fetch_menu().await.map_err(|e| e.to_string())?;
    let categories = categories_from_payload(&payload, client.base_url());
    let rows = flatten_for_cache(&categories);
    db.replace_menu(&rows).await.map_err(|e| e.to_string())?;
    Ok(categories)
}

/// Spawn a recommendation request, or a revision of the current result.
///
/// The response's variant ids are resolved against the food cache inside
/// the task, so the UI receives display-ready records.
pub(super) fn spawn_recommendation(
    app: &mut App,
    revision: bool,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let Some(client) = app.client.clone() else {
        app.set_status("Offline: recommendations need the server");
        return;
    };
    let ratings = if revision {
        match app.recommend_result() {
            Some(result) => result.wire_ratings(),
            None => {
                app.set_status("Nothing to revise yet");
                return;
            }
        }
    } else {
        Vec::new()
    };
    let query = app
        .profile
        .recommendation_query(app.cart.variant_ids(), &app.notes);

    if let Some(handle) = app.recommend_task.take() {
        handle.abort();
        tracing::debug!("Aborted previous recommendation request");
    }
    app.recommend_generation = app.recommend_generation.wrapping_add(1);
    let generation = app.recommend_generation;
    app.recommend = RecommendState::Loading { revision };
    app.needs_redraw = true;

    let db = app.db.clone();
    let tx = event_tx.clone();
    tracing::info!(
        generation,
        revision,
        cart_items = query.cart_items.len(),
        "Spawning recommendation request"
    );

    app.recommend_task = Some(tokio::spawn(async move {
        let response = if revision {
            client.request_revision(&query, &ratings).await
        } else {
            client.request_recommendation(&query).await
        };
        let event = match response {
            Ok(payload) => match db.foods_by_variants(&payload.recommended_meals).await {
                Ok(foods) => AppEvent::RecommendationReady {
                    generation,
                    payload,
                    foods,
                },
                Err(e) => AppEvent::RecommendationFailed {
                    generation,
                    error: e.to_string(),
                },
            },
            Err(e) => AppEvent::RecommendationFailed {
                generation,
                error: e.to_string(),
            },
        };
        if let Err(e) = tx.send(event).await {
            tracing::warn!(error = %e, "Failed to send recommendation result (receiver dropped)");
        }
    }));
}

/// Spawn a history reload. No-op while one is already running.
pub(super) fn spawn_history_load(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    if app.history_loading {
        return;
    }
    app.history_loading = true;
    app.needs_redraw = true;

    let db = app.db.clone();
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let event = match db.history_with_food().await {
            Ok(rows) => AppEvent::HistoryLoaded(group_history(rows, &chrono::Local)),
            Err(e) => AppEvent::HistoryLoadFailed {
                error: e.to_string(),
            },
        };
        if let Err(e) = tx.send(event).await {
            tracing::warn!(error = %e, "Failed to send history (receiver dropped)");
        }
    });
}

/// Load history on first visit to the tab and after anything marked it stale.
pub(super) fn maybe_load_history(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    if app.tab == Tab::History && app.history_dirty && !app.history_loading {
        spawn_history_load(app, event_tx);
    }
}

/// Spawn a write of the given variants into the history table.
///
/// All rows share one timestamp and the meal period of the local wall
/// clock, so they group as a single sitting.
pub(super) fn spawn_save_meals(
    app: &mut App,
    variant_ids: Vec<i64>,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let timestamp = chrono::Utc::now().timestamp_millis();
    let meal_option = MealPeriod::from_hour(chrono::Local::now().hour()).label();
    let count = variant_ids.len();
    app.set_status("Saving meals...");

    let db = app.db.clone();
    let tx = event_tx.clone();
    tracing::info!(count, meal_option, "Spawning history save");

    tokio::spawn(async move {
        let event = match db
            .insert_meal_entries(&variant_ids, timestamp, meal_option)
            .await
        {
            Ok(()) => AppEvent::MealsSaved { count },
            Err(e) => AppEvent::MealsSaveFailed {
                error: e.to_string(),
            },
        };
        if let Err(e) = tx.send(event).await {
            tracing::warn!(error = %e, "Failed to send save result (receiver dropped)");
        }
    });
}

/// Spawn deletion of every history row. Panics in the task are caught and
/// surfaced as `TaskPanicked`.
pub(super) fn spawn_clear_history(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    app.set_status("Clearing history...");

    let db = app.db.clone();
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let tx_panic = tx.clone();
        match catch_task_panic(async {
            let event = match db.clear_history().await {
                Ok(removed) => AppEvent::HistoryCleared { removed },
                Err(e) => AppEvent::HistoryClearFailed {
                    error: e.to_string(),
                },
            };
            if let Err(e) = tx.send(event).await {
                tracing::warn!(error = %e, "Failed to send clear result (receiver dropped)");
            }
        })
        .await
        {
            Ok(()) => {}
            Err(panic_msg) => {
                tracing::error!(task = "clear_history", error = %panic_msg, "Background task panicked");
                let _ = tx_panic
                    .send(AppEvent::TaskPanicked {
                        task: "clear_history",
                        error: panic_msg,
                    })
                    .await;
            }
        }
    });
}

/// Spawn a menu photo upload. The dialog flips to its uploading state here.
pub(super) fn spawn_photo_upload(app: &mut App, path: String, event_tx: &mpsc::Sender<AppEvent>) {
    let Some(client) = app.client.clone() else {
        app.upload_state = None;
        app.set_status("Offline: uploads need the server");
        return;
    };
    app.upload_state = Some(crate::app::UploadState::Uploading { path: path.clone() });
    app.needs_redraw = true;

    let tx = event_tx.clone();
    tokio::spawn(async move {
        let event = match client.upload_menu_photo(Path::new(&path), OCR_METHOD).await {
            Ok(payload) => AppEvent::PhotoUploaded {
                detections: payload.response.len(),
            },
            Err(e) => AppEvent::PhotoUploadFailed {
                error: e.to_string(),
            },
        };
        if let Err(e) = tx.send(event).await {
            tracing::warn!(error = %e, "Failed to send upload result (receiver dropped)");
        }
    });
}

/// Spawn a server-side menu reset followed by a local cache clear. Panics
/// in the task are caught and surfaced as `TaskPanicked`.
pub(super) fn spawn_menu_reset(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let Some(client) = app.client.clone() else {
        app.set_status("Offline: reset needs the server");
        return;
    };
    app.set_status("Resetting menu...");

    let db = app.db.clone();
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let tx_panic = tx.clone();
        match catch_task_panic(async {
            let result = async {
                client.reset_menu().await.map_err(|e| e.to_string())?;
                db.clear_menu().await.map_err(|e| e.to_string())
            }
            .await;
            let event = match result {
                Ok(()) => AppEvent::MenuResetDone,
                Err(error) => AppEvent::MenuResetFailed { error },
            };
            if let Err(e) = tx.send(event).await {
                tracing::warn!(error = %e, "Failed to send reset result (receiver dropped)");
            }
        })
        .await
        {
            Ok(()) => {}
            Err(panic_msg) => {
                tracing::error!(task = "menu_reset", error = %panic_msg, "Background task panicked");
                let _ = tx_panic
                    .send(AppEvent::TaskPanicked {
                        task: "menu_reset",
                        error: panic_msg,
                    })
                    .await;
            }
        }
    });
}

/// Spawn a write of the whole nutrition profile to the preference store.
pub(super) fn spawn_profile_save(app: &App, event_tx: &mpsc::Sender<AppEvent>) {
    let pairs: Vec<(String, String)> = app
        .profile
        .to_pairs()
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

    let db = app.db.clone();
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let event = match db.set_preferences(&pairs).await {
            Ok(()) => AppEvent::ProfileSaved,
            Err(e) => AppEvent::ProfileSaveFailed {
                error: e.to_string(),
            },
        };
        if let Err(e) = tx.send(event).await {
            tracing::warn!(error = %e, "Failed to send profile result (receiver dropped)");
        }
    });
}

/// Persist the current theme choice. Only failures report back; the
/// in-memory switch has already happened.
pub(super) fn spawn_theme_save(app: &App, event_tx: &mpsc::Sender<AppEvent>) {
    let value = app.theme_variant.as_str();
    let db = app.db.clone();
    let tx = event_tx.clone();
    tokio::spawn(async move {
        if let Err(e) = db.set_preference("theme", value).await {
            let event = AppEvent::ThemeSaveFailed {
                error: e.to_string(),
            };
            if let Err(send_err) = tx.send(event).await {
                tracing::warn!(error = %send_err, "Failed to send theme result (receiver dropped)");
            }
        }
    });
}

// ----------------------------------------------------------------------
// Event handling
// ----------------------------------------------------------------------

/// Handle application events from background tasks.
///
/// Stale menu and recommendation completions are dropped by comparing the
/// event's generation against the current counter.
pub(super) async fn handle_app_event(
    app: &mut App,
    event: AppEvent,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    match event {
        AppEvent::MenuLoaded {
            generation,
            categories,
        } => {
            if generation != app.menu_generation {
                tracing::debug!(
                    generation,
                    current = app.menu_generation,
                    "Ignoring stale menu response (generation mismatch)"
                );
                return;
            }
            app.menu_loading = false;
            let items: usize = categories.iter().map(|c| c.items.len()).sum();
            app.set_menu(categories);
            tracing::info!(items, "Menu refreshed");
            app.set_status(format!("Menu updated: {} items", items));
        }
        AppEvent::MenuLoadFailed { generation, error } => {
            if generation != app.menu_generation {
                tracing::debug!(
                    generation,
                    current = app.menu_generation,
                    "Ignoring stale menu failure (generation mismatch)"
                );
                return;
            }
            app.menu_loading = false;
            tracing::error!(error = %error, "Menu refresh failed");
            app.set_status(format!("Menu refresh failed: {}", error));
        }
        AppEvent::RecommendationReady {
            generation,
            payload,
            foods,
        } => {
            if generation != app.recommend_generation {
                tracing::debug!(
                    generation,
                    current = app.recommend_generation,
                    "Ignoring stale recommendation (generation mismatch)"
                );
                return;
            }
            let requested = payload.recommended_meals.len();
            let resolved = foods.len();
            app.apply_recommendation(payload, foods);
            app.set_tab(Tab::Recommend);
            tracing::info!(requested, resolved, "Recommendation ready");
            if resolved < requested {
                app.set_status(format!(
                    "Recommendation ready ({} of {} meals on the current menu)",
                    resolved, requested
                ));
            } else {
                app.set_status("Recommendation ready");
            }
        }
        AppEvent::RecommendationFailed { generation, error } => {
            if generation != app.recommend_generation {
                tracing::debug!(
                    generation,
                    current = app.recommend_generation,
                    "Ignoring stale recommendation failure (generation mismatch)"
                );
                return;
            }
            tracing::error!(error = %error, "Recommendation request failed");
            app.set_status(format!("Recommendation failed: {}", error));
            app.recommend = RecommendState::Failed { error };
        }
        AppEvent::HistoryLoaded(days) => {
            app.history_loading = false;
            app.history_dirty = false;
            app.history = days;
            app.history_scroll = 0;
        }
        AppEvent::HistoryLoadFailed { error } => {
            app.history_loading = false;
            tracing::error!(error = %error, "History load failed");
            app.set_status(format!("History load failed: {}", error));
        }
        AppEvent::MealsSaved { count } => {
            // The order flow is done: clear the cart and the result screen,
            // then land on the history the save just extended
            app.cart.clear();
            app.cart_cursor = 0;
            app.recommend = RecommendState::Idle;
            app.recommend_cursor = 0;
            app.history_dirty = true;
            app.clamp_selections();
            app.tab = Tab::History;
            tracing::info!(count, "Meals saved to history");
            app.set_status(format!("Saved {} meals to history", count));
            maybe_load_history(app, event_tx);
        }
        AppEvent::MealsSaveFailed { error } => {
            tracing::error!(error = %error, "History save failed");
            app.set_status(format!("Save failed: {}", error));
        }
        AppEvent::HistoryCleared { removed } => {
            app.history.clear();
            app.history_scroll = 0;
            app.history_dirty = false;
            tracing::info!(removed, "History cleared");
            app.set_status(format!("Cleared {} history entries", removed));
        }
        AppEvent::HistoryClearFailed { error } => {
            tracing::error!(error = %error, "History clear failed");
            app.set_status(format!("Clear failed: {}", error));
        }
        AppEvent::PhotoUploaded { detections } => {
            app.upload_state = None;
            tracing::info!(detections, "Menu photo accepted");
            app.set_status(format!("Photo accepted: {} dishes detected", detections));
            // The server replaced its menu; pull the new one
            spawn_menu_fetch(app, event_tx);
        }
        AppEvent::PhotoUploadFailed { error } => {
            app.upload_state = None;
            tracing::error!(error = %error, "Menu photo upload failed");
            app.set_status(format!("Upload failed: {}", error));
        }
        AppEvent::MenuResetDone => {
            app.set_menu(Vec::new());
            tracing::info!("Menu reset");
            app.set_status("Menu reset, local cache cleared");
        }
        AppEvent::MenuResetFailed { error } => {
            tracing::error!(error = %error, "Menu reset failed");
            app.set_status(format!("Reset failed: {}", error));
        }
        AppEvent::ProfileSaved => {
            app.set_status("Profile saved");
        }
        AppEvent::ProfileSaveFailed { error } => {
            tracing::error!(error = %error, "Profile save failed");
            app.set_status(format!("Profile save failed: {}", error));
        }
        AppEvent::ThemeSaveFailed { error } => {
            tracing::warn!(error = %error, "Theme preference not persisted");
            app.set_status(format!("Theme not saved: {}", error));
        }
        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error, "Background task panicked");
            app.set_status(format!("Internal error in {} task", task));
        }
    }
}
