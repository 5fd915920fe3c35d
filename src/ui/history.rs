use chrono::TimeZone;
use ratatui::{
    layout::Rect,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;

use super::helpers::format_price;

/// Wall-clock `HH:MM` for a history timestamp, in the same local zone the
/// day grouping uses.
fn entry_time(timestamp_ms: i64) -> String {
    chrono::Local
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

/// Render the History tab: saved meals grouped by day and meal period.
///
/// Records the flattened line count and viewport height on the app so
/// scroll clamping can work outside the render pass.
pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    let visible = area.height.saturating_sub(2) as usize;

    if app.history.is_empty() {
        let text = if app.history_loading {
            "Loading history..."
        } else {
            "No saved meals yet.\n\nSave a recommendation with s on the Recommend tab."
        };
        app.history_total_lines = 0;
        app.history_visible_lines = visible;
        let paragraph = Paragraph::new(text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.palette.panel_border)
                .title(" History "),
        );
        f.render_widget(paragraph, area);
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    for day in &app.history {
        lines.push(Line::from(Span::styled(
            day.date_key.clone(),
            app.palette.history_date,
        )));
        for group in &day.meals {
            lines.push(Line::from(Span::styled(
                format!("  {}", group.label),
                app.palette.history_meal,
            )));
            for entry in &group.entries {
                let time = entry_time(entry.record.timestamp);
                let line = match &entry.food {
                    Some(food) => Line::from(Span::styled(
                        format!(
                            "    {}  {} ({})  {}  {} kcal",
                            time,
                            food.food_name,
                            food.variant_name,
                            format_price(food.price),
                            food.calories
                        ),
                        app.palette.history_entry,
                    )),
                    None => Line::from(Span::styled(
                        format!(
                            "    {}  variant #{} (no longer on the menu)",
                            time, entry.record.variant_id
                        ),
                        app.palette.setting_value,
                    )),
                };
                lines.push(line);
            }
        }
        lines.push(Line::from(""));
    }
    // Drop the trailing blank separator
    lines.pop();

    app.history_total_lines = lines.len();
    app.history_visible_lines = visible;
    app.clamp_history_scroll();

    let title = format!(" History ({} days) ", app.history.len());
    let scroll = app.history_scroll.min(u16::MAX as usize) as u16;
    let paragraph = Paragraph::new(Text::from(lines))
        .scroll((scroll, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.palette.panel_border)
                .title(title),
        );
    f.render_widget(paragraph, area);
}
