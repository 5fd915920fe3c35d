use crate::app::{App, MenuFocus, MenuRow};
use crate::menu::FoodItem;
use crate::util::{display_width, truncate_to_width};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

use super::helpers::{format_price, window_start};

/// Render the Menu tab: item list on the left, cart on the right.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    render_items(f, app, chunks[0]);
    render_cart(f, app, chunks[1]);
}

/// One-line summary of an item's variants for the list row.
fn variant_summary(item: &FoodItem) -> String {
    match item.variants.as_slice() {
        [] => String::new(),
        [only] => format!("{}  {} kcal", format_price(only.price), only.calories),
        many => {
            let min = many.iter().map(|v| v.price).min().unwrap_or(0);
            format!("{} sizes from {}", many.len(), format_price(min))
        }
    }
}

fn render_items(f: &mut Frame, app: &App, area: Rect) {
    let is_focused = app.menu_focus == MenuFocus::Items;
    let visible = area.height.saturating_sub(2) as usize;

    let items: Vec<ListItem> = if app.menu_rows.is_empty() {
        vec![ListItem::new(
            "Menu is empty. Press r to fetch it from the server.",
        )]
    } else {
        let start = window_start(app.menu_cursor, visible);
        app.menu_rows
            .iter()
            .enumerate()
            .skip(start)
            .take(visible)
            .map(|(i, row)| match row {
                MenuRow::Header { category } => {
                    let name = app
                        .menu
                        .get(*category)
                        .map(|c| c.name.as_ref())
                        .unwrap_or("?");
                    ListItem::new(Line::from(Span::styled(
                        name.to_string(),
                        app.palette.category_header,
                    )))
                }
                MenuRow::Item { category, item } => {
                    let Some(food) = app
                        .menu
                        .get(*category)
                        .and_then(|c| c.items.get(*item))
                    else {
                        return ListItem::new("");
                    };
                    let summary = variant_summary(food);
                    // Keep the summary visible even for long dish names
                    let name_budget =
                        (area.width as usize).saturating_sub(display_width(&summary) + 6);
                    let name = truncate_to_width(&food.name, name_budget);

                    if i == app.menu_cursor {
                        ListItem::new(Line::from(Span::styled(
                            format!("  {}  {}", name, summary),
                            app.palette.item_selected,
                        )))
                    } else {
                        ListItem::new(Line::from(vec![
                            Span::styled(format!("  {}", name), app.palette.item_normal),
                            Span::styled(format!("  {}", summary), app.palette.price),
                        ]))
                    }
                }
            })
            .collect()
    };

    let border_style = if is_focused {
        app.palette.panel_border_focused
    } else {
        app.palette.panel_border
    };

    let count: usize = app.menu.iter().map(|c| c.items.len()).sum();
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(format!(" Menu ({} items) ", count)),
    );

    f.render_widget(list, area);
}

fn render_cart(f: &mut Frame, app: &App, area: Rect) {
    let is_focused = app.menu_focus == MenuFocus::Cart;
    // Three footer rows: separator, total, nutrition
    let visible = (area.height.saturating_sub(2) as usize).saturating_sub(3);

    let mut items: Vec<ListItem> = if app.cart.is_empty() {
        vec![ListItem::new("Cart is empty")]
    } else {
        let start = window_start(app.cart_cursor, visible.max(1));
        app.cart
            .entries()
            .iter()
            .enumerate()
            .skip(start)
            .take(visible.max(1))
            .map(|(i, entry)| {
                let name_budget = (area.width as usize).saturating_sub(18);
                let name = truncate_to_width(&entry.food_name, name_budget);
                let text = format!(
                    "{}x {} ({})  {}",
                    entry.quantity,
                    name,
                    entry.variant.variant_name,
                    format_price(entry.line_price()),
                );
                let style = if is_focused && i == app.cart_cursor {
                    app.palette.item_selected
                } else {
                    app.palette.cart_quantity
                };
                ListItem::new(Line::from(Span::styled(text, style)))
            })
            .collect()
    };

    if !app.cart.is_empty() {
        let totals = app.cart.nutrition_totals();
        items.push(ListItem::new(""));
        items.push(ListItem::new(Line::from(Span::styled(
            format!("Total  {}", format_price(app.cart.total_price())),
            app.palette.cart_total,
        ))));
        items.push(ListItem::new(Line::from(Span::styled(
            format!(
                "{} kcal  P {}g  F {}g  C {}g",
                totals.calories, totals.protein, totals.fat, totals.carbohydrates
            ),
            app.palette.nutrition,
        ))));
    }

    let border_style = if is_focused {
        app.palette.panel_border_focused
    } else {
        app.palette.panel_border
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(format!(" Cart ({}) ", app.cart.len())),
    );

    f.render_widget(list, area);
}
