use crate::app::{App, SettingRow};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

/// Render the Settings tab: editable profile rows plus an energy summary.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(area);

    render_rows(f, app, chunks[0]);
    render_summary(f, app, chunks[1]);
}

/// Display text for a settings row's current value.
fn row_value(app: &App, row: SettingRow) -> String {
    match row {
        SettingRow::Theme => app.theme_variant.name().to_string(),
        SettingRow::Gender => if app.profile.is_male { "Male" } else { "Female" }.to_string(),
        SettingRow::Age => app.profile.age.to_string(),
        SettingRow::Height => format!("{} cm", app.profile.height_cm),
        SettingRow::Weight => format!("{} kg", app.profile.weight_kg),
        SettingRow::BmrMethod => app.profile.bmr_method.label().to_string(),
        SettingRow::CustomBmr => format!("{} kcal", app.profile.custom_bmr),
        SettingRow::ActivityLevel => app.profile.activity_level.label().to_string(),
        SettingRow::FoodPreferences => {
            if app.profile.food_preferences.is_empty() {
                "(none)".to_string()
            } else {
                app.profile.food_preferences.clone()
            }
        }
        SettingRow::FoodAllergies => {
            if app.profile.food_allergies.is_empty() {
                "(none)".to_string()
            } else {
                app.profile.food_allergies.clone()
            }
        }
    }
}

fn render_rows(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = SettingRow::ALL
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let selected = i == app.settings_cursor;
            let editing = app
                .setting_edit
                .as_ref()
                .is_some_and(|edit| edit.row == *row);

            let label = format!("  {:<18}", row.label());
            if editing {
                // Show the live edit buffer with a cursor in place of the value
                let input = app
                    .setting_edit
                    .as_ref()
                    .map(|edit| edit.input.as_str())
                    .unwrap_or("");
                ListItem::new(Line::from(vec![
                    Span::styled(label, app.palette.setting_label),
                    Span::styled(format!("{}_", input), app.palette.setting_editing),
                ]))
            } else if selected {
                ListItem::new(Line::from(Span::styled(
                    format!("{}{}", label, row_value(app, *row)),
                    app.palette.item_selected,
                )))
            } else {
                ListItem::new(Line::from(vec![
                    Span::styled(label, app.palette.setting_label),
                    Span::styled(row_value(app, *row), app.palette.setting_value),
                ]))
            }
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(app.palette.panel_border_focused)
            .title(" Settings "),
    );

    f.render_widget(list, area);
}

fn render_summary(f: &mut Frame, app: &App, area: Rect) {
    let source = match app.profile.bmr_method {
        crate::profile::BmrMethod::Custom => "custom BMR",
        crate::profile::BmrMethod::FromProfile => "Mifflin-St Jeor x activity",
        crate::profile::BmrMethod::Default => "local estimate; service applies its default",
    };
    let text = format!(
        "Daily energy target: {} kcal ({})",
        app.profile.energy_summary(),
        source
    );
    let paragraph = Paragraph::new(Line::from(Span::styled(text, app.palette.nutrition))).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(app.palette.panel_border)
            .title(" Energy "),
    );
    f.render_widget(paragraph, area);
}
