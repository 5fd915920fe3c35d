use crate::app::{App, Rating, RecommendState, RecommendationResult};
use crate::util::{sanitize_display, truncate_to_width};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use super::helpers::{format_price, window_start};

/// Render the Recommend tab for whatever state the request is in.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    match &app.recommend {
        RecommendState::Idle => render_message(
            f,
            app,
            area,
            "No recommendation yet.\n\n\
             Add items to your cart on the Menu tab, then press r.\n\
             Your nutrition profile and notes travel with the request.",
            false,
        ),
        RecommendState::Loading { revision } => {
            let text = if *revision {
                "Asking the service to revise its answer..."
            } else {
                "Asking the service for a recommendation..."
            };
            render_message(f, app, area, text, false);
        }
        RecommendState::Failed { error } => render_message(
            f,
            app,
            area,
            &format!("Recommendation failed:\n\n{}\n\nPress r to try again.", error),
            true,
        ),
        RecommendState::Ready(result) => render_result(f, app, area, result),
    }
}

fn render_message(f: &mut Frame, app: &App, area: Rect, text: &str, is_error: bool) {
    let style = if is_error {
        app.palette.status_error
    } else {
        app.palette.item_normal
    };
    let paragraph = Paragraph::new(text.to_string())
        .style(style)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.palette.panel_border)
                .title(" Recommendation "),
        );
    f.render_widget(paragraph, area);
}

fn render_result(f: &mut Frame, app: &App, area: Rect, result: &RecommendationResult) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Min(0),
            Constraint::Length(4),
        ])
        .split(area);

    render_advice(f, app, chunks[0], result);
    render_meals(f, app, chunks[1], result);
    render_footer(f, app, chunks[2], result);
}

fn render_advice(f: &mut Frame, app: &App, area: Rect, result: &RecommendationResult) {
    // Advice prose comes straight off the wire; it skips the menu cache
    // and therefore its sanitizing pass.
    let advice = sanitize_display(&result.payload.recommended_meal_detail).into_owned();
    let paragraph = Paragraph::new(advice)
        .style(app.palette.recommend_detail)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.palette.panel_border)
                .title(" Advice "),
        );
    f.render_widget(paragraph, area);
}

fn render_meals(f: &mut Frame, app: &App, area: Rect, result: &RecommendationResult) {
    let visible = area.height.saturating_sub(2) as usize;
    let start = window_start(app.recommend_cursor, visible.max(1));

    let items: Vec<ListItem> = if result.meals.is_empty() {
        vec![ListItem::new("The service recommended no meals")]
    } else {
        result
            .meals
            .iter()
            .enumerate()
            .skip(start)
            .take(visible.max(1))
            .map(|(i, meal)| {
                let selected = i == app.recommend_cursor;
                let rating = result
                    .ratings
                    .get(&meal.variant_id)
                    .copied()
                    .unwrap_or(Rating::None);
                let (mark, mark_style) = match rating {
                    Rating::Like => ("▲", app.palette.rating_like),
                    Rating::Dislike => ("▼", app.palette.rating_dislike),
                    Rating::None => (" ", app.palette.item_normal),
                };

                match &meal.food {
                    Some(food) => {
                        let checkbox = if result
                            .selected
                            .get(&meal.variant_id)
                            .copied()
                            .unwrap_or(false)
                        {
                            "[x]"
                        } else {
                            "[ ]"
                        };
                        let name_budget = (area.width as usize).saturating_sub(24);
                        let name = truncate_to_width(&food.food_name, name_budget);
                        let detail = format!(
                            "{} ({})  {}  {} kcal",
                            name,
                            food.variant_name,
                            format_price(food.price),
                            food.calories
                        );
                        if selected {
                            ListItem::new(Line::from(Span::styled(
                                format!("{} {} {}", checkbox, mark, detail),
                                app.palette.item_selected,
                            )))
                        } else {
                            ListItem::new(Line::from(vec![
                                Span::styled(format!("{} ", checkbox), app.palette.item_normal),
                                Span::styled(format!("{} ", mark), mark_style),
                                Span::styled(detail, app.palette.item_normal),
                            ]))
                        }
                    }
                    None => {
                        // Stale id from the service; keep the row so the
                        // advice stays legible, but it cannot be saved.
                        let text = format!(
                            "    variant #{} (not on the current menu)",
                            meal.variant_id
                        );
                        let style = if selected {
                            app.palette.item_selected
                        } else {
                            app.palette.setting_value
                        };
                        ListItem::new(Line::from(Span::styled(text, style)))
                    }
                }
            })
            .collect()
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(app.palette.panel_border_focused)
            .title(format!(" Recommended meals ({}) ", result.meals.len())),
    );

    f.render_widget(list, area);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect, result: &RecommendationResult) {
    let mut lines = Vec::with_capacity(2);

    let mut summary = format!("Total {}", format_price(result.total_price()));
    let targets = &result.payload.min_nutritions;
    if targets.len() >= 4 {
        summary.push_str(&format!(
            "   Targets: {} kcal  P {}g  F {}g  C {}g",
            targets[0], targets[1], targets[2], targets[3]
        ));
    }
    lines.push(Line::from(Span::styled(summary, app.palette.nutrition)));

    if !result.payload.additional_notes.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("Notes: {}", sanitize_display(&result.payload.additional_notes)),
            app.palette.setting_value,
        )));
    }

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(app.palette.panel_border)
            .title(" Summary "),
    );
    f.render_widget(paragraph, area);
}
