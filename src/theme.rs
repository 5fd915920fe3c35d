//! Theme system for the TUI.
//!
//! Provides semantic color roles that map to ratatui `Style` values.
//! The `ThemeVariant` enum selects between Dark and Light palettes; the
//! active variant comes from user preferences, falling back to the config
//! file's `theme` key.

use ratatui::style::{Color, Modifier, Style};

// ============================================================================
// Theme Variant
// ============================================================================

/// Available theme variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeVariant {
    Dark,
    Light,
}

impl ThemeVariant {
    /// Parse a variant name from a string (case-insensitive).
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    /// Build the `ColorPalette` for this variant.
    pub fn palette(self) -> ColorPalette {
        match self {
            Self::Dark => ColorPalette::dark(),
            Self::Light => ColorPalette::light(),
        }
    }

    /// Cycle to the next variant: Dark → Light → Dark.
    pub fn next(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    /// Human-readable name for status display.
    pub fn name(self) -> &'static str {
        match self {
            Self::Dark => "Dark",
            Self::Light => "Light",
        }
    }

    /// Lowercase form persisted in user preferences.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }
}

// ============================================================================
// Color Palette
// ============================================================================

/// A complete color palette mapping every semantic UI role to a `Style`.
///
/// Each field corresponds to a specific visual element in the TUI.
#[derive(Debug, Clone)]
pub struct ColorPalette {
    // -- Tab bar --
    pub tab_active: Style,
    pub tab_inactive: Style,

    // -- Menu tab --
    pub category_header: Style,
    pub item_normal: Style,
    pub item_selected: Style,
    pub price: Style,
    pub nutrition: Style,

    // -- Cart pane --
    pub cart_quantity: Style,
    pub cart_total: Style,

    // -- Recommend tab --
    pub recommend_detail: Style,
    pub rating_like: Style,
    pub rating_dislike: Style,

    // -- History tab --
    pub history_date: Style,
    pub history_meal: Style,
    pub history_entry: Style,

    // -- Settings tab --
    pub setting_label: Style,
    pub setting_value: Style,
    pub setting_editing: Style,

    // -- Chrome --
    pub status_bar: Style,
    pub status_error: Style,
    pub panel_border: Style,
    pub panel_border_focused: Style,
}

impl ColorPalette {
    /// Dark palette for dark terminal backgrounds.
    fn dark() -> Self {
        Self {
            // Tab bar
            tab_active: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),

            // Menu tab
            category_header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            item_normal: Style::default(),
            item_selected: Style::default().bg(Color::DarkGray).fg(Color::White),
            price: Style::default().fg(Color::Yellow),
            nutrition: Style::default().fg(Color::DarkGray),

            // Cart pane
            cart_quantity: Style::default().fg(Color::Cyan),
            cart_total: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),

            // Recommend tab
            recommend_detail: Style::default(),
            rating_like: Style::default().fg(Color::Green),
            rating_dislike: Style::default().fg(Color::Red),

            // History tab
            history_date: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            history_meal: Style::default().add_modifier(Modifier::BOLD),
            history_entry: Style::default(),

            // Settings tab
            setting_label: Style::default(),
            setting_value: Style::default().fg(Color::Cyan),
            setting_editing: Style::default().bg(Color::DarkGray).fg(Color::Yellow),

            // Chrome
            status_bar: Style::default().bg(Color::DarkGray).fg(Color::White),
            status_error: Style::default().bg(Color::DarkGray).fg(Color::Red),
            panel_border: Style::default(),
            panel_border_focused: Style::default().fg(Color::Cyan),
        }
    }

    /// Light palette for light terminal backgrounds.
    fn light() -> Self {
        Self {
            // Tab bar
            tab_active: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),

            // Menu tab
            category_header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            item_normal: Style::default().fg(Color::Black),
            item_selected: Style::default().bg(Color::Blue).fg(Color::White),
            price: Style::default().fg(Color::Magenta),
            nutrition: Style::default().fg(Color::DarkGray),

            // Cart pane
            cart_quantity: Style::default().fg(Color::Blue),
            cart_total: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),

            // Recommend tab
            recommend_detail: Style::default().fg(Color::Black),
            rating_like: Style::default().fg(Color::Green),
            rating_dislike: Style::default().fg(Color::Red),

            // History tab
            history_date: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            history_meal: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            history_entry: Style::default().fg(Color::Black),

            // Settings tab
            setting_label: Style::default().fg(Color::Black),
            setting_value: Style::default().fg(Color::Blue),
            setting_editing: Style::default().bg(Color::White).fg(Color::Magenta),

            // Chrome
            status_bar: Style::default().bg(Color::White).fg(Color::Black),
            status_error: Style::default().bg(Color::White).fg(Color::Red),
            panel_border: Style::default().fg(Color::DarkGray),
            panel_border_focused: Style::default().fg(Color::Blue),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
