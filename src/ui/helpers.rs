//! Shared helpers for the UI layer.

use futures::FutureExt;
use ratatui::layout::Rect;
use std::panic::AssertUnwindSafe;

/// Frames of the loading spinner, advanced by the periodic tick.
pub(super) const SPINNER_GLYPHS: [char; 10] =
    ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Wraps a future to catch panics and convert them to errors.
///
/// Instead of a spawned task silently disappearing (caught by Tokio's
/// runtime but not handled), panics are converted to `Err(String)` with the
/// panic message, which the caller forwards as `AppEvent::TaskPanicked`.
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                format!("Unknown panic: {:?}", (*panic).type_id())
            }
        })
}

/// Create a centered rectangle with the given percentage of the parent area.
pub(super) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let width = area.width * percent_x / 100;
    let height = area.height * percent_y / 100;
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

/// Create a centered rectangle with fixed dimensions, clamped to the parent.
pub(super) fn centered_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

/// Format a price in yen for display.
pub(super) fn format_price(price: i64) -> String {
    format!("¥{}", price)
}

/// First index of a scrolled window that keeps `cursor` visible.
pub(super) fn window_start(cursor: usize, visible: usize) -> usize {
    if visible == 0 {
        return cursor;
    }
    cursor.saturating_sub(visible - 1)
}
