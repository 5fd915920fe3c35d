use crate::api::{ApiClient, MealRating, RecommendationPayload};
use crate::cart::Cart;
use crate::history::HistoryDay;
use crate::menu::{FoodCategory, FoodItem};
use crate::profile::NutritionProfile;
use crate::storage::{Database, FoodRecord};
use crate::theme::{ColorPalette, ThemeVariant};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::Instant;

// ============================================================================
// Tabs and Focus
// ============================================================================

/// Top-level tab of the main layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Menu,
    Recommend,
    History,
    Settings,
}

impl Tab {
    /// Display order in the tab bar.
    pub const ALL: [Tab; 4] = [Tab::Menu, Tab::Recommend, Tab::History, Tab::Settings];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Menu => "Menu",
            Tab::Recommend => "Recommend",
            Tab::History => "History",
            Tab::Settings => "Settings",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Tab::Menu => 0,
            Tab::Recommend => 1,
            Tab::History => 2,
            Tab::Settings => 3,
        }
    }

    pub fn next(self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    pub fn prev(self) -> Tab {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

/// Which pane has focus on the Menu tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuFocus {
    Items,
    Cart,
}

// ============================================================================
// Menu Rows
// ============================================================================

/// A single row in the flattened menu list.
///
/// Header rows are rendered but never selected; navigation skips over them
/// so the cursor always rests on an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuRow {
    Header { category: usize },
    Item { category: usize, item: usize },
}

impl MenuRow {
    pub fn is_item(self) -> bool {
        matches!(self, MenuRow::Item { .. })
    }
}

/// Flatten the category tree into display rows.
fn build_menu_rows(categories: &[FoodCategory]) -> Vec<MenuRow> {
    let mut rows = Vec::new();
    for (ci, category) in categories.iter().enumerate() {
        rows.push(MenuRow::Header { category: ci });
        for ii in 0..category.items.len() {
            rows.push(MenuRow::Item {
                category: ci,
                item: ii,
            });
        }
    }
    rows
}

// ============================================================================
// Recommendation State
// ============================================================================

/// Thumb rating for a recommended meal.
///
/// `None` entries stay in the map once a meal has been shown, so a revision
/// request reports every meal the user looked at, rated or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    Like,
    Dislike,
    None,
}

impl Rating {
    /// Wire value sent with a revision request.
    pub fn as_wire(self) -> &'static str {
        match self {
            Rating::Like => "like",
            Rating::Dislike => "dislike",
            Rating::None => "none",
        }
    }
}

/// A recommended meal resolved against the local food cache.
#[derive(Clone)]
pub struct RecommendedMeal {
    pub variant_id: i64,
    /// Cached food details. `None` when the current menu no longer carries
    /// this variant; the row still renders so the advice stays legible.
    pub food: Option<FoodRecord>,
}

/// Lifecycle of the recommendation request on the Recommend tab.
pub enum RecommendState {
    Idle,
    Loading {
        /// True when this request is a revision of an earlier result.
        revision: bool,
    },
    Ready(RecommendationResult),
    Failed {
        error: String,
    },
}

/// A recommendation response paired with per-meal UI state.
pub struct RecommendationResult {
    pub payload: RecommendationPayload,
    /// Meals in the order the service recommended them.
    pub meals: Vec<RecommendedMeal>,
    /// Thumb ratings keyed by variant id. Seeded to `Rating::None` for every
    /// resolved meal when the result arrives.
    pub ratings: HashMap<i64, Rating>,
    /// History-save checkboxes keyed by variant id. Resolved meals start
    /// selected; unresolved meals cannot be saved.
    pub selected: HashMap<i64, bool>,
}

impl RecommendationResult {
    /// Pair a response with the food records the cache could resolve.
    ///
    /// `foods` may be a subset of `payload.recommended_meals` when the menu
    /// changed since the recommendation was computed.
    pub fn new(payload: RecommendationPayload, foods: Vec<FoodRecord>) -> Self {
        let by_id: HashMap<i64, FoodRecord> =
            foods.into_iter().map(|f| (f.variant_id, f)).collect();
        let mut ratings = HashMap::new();
        let mut selected = HashMap::new();
        let meals = payload
            .recommended_meals
            .iter()
            .map(|&variant_id| {
                let food = by_id.get(&variant_id).cloned();
                if food.is_some() {
                    ratings.entry(variant_id).or_insert(Rating::None);
                    selected.entry(variant_id).or_insert(true);
                }
                RecommendedMeal { variant_id, food }
            })
            .collect();
        Self {
            payload,
            meals,
            ratings,
            selected,
        }
    }

    /// Toggle a thumb: rating an already-rated meal the same way clears it.
    pub fn toggle_rating(&mut self, variant_id: i64, rating: Rating) {
        let current = self
            .ratings
            .get(&variant_id)
            .copied()
            .unwrap_or(Rating::None);
        let next = if current == rating {
            Rating::None
        } else {
            rating
        };
        self.ratings.insert(variant_id, next);
    }

    /// Flip the history-save checkbox for a resolved meal.
    pub fn toggle_selected(&mut self, variant_id: i64) {
        if let Some(flag) = self.selected.get_mut(&variant_id) {
            *flag = !*flag;
        }
    }

    /// Ratings in wire form, ordered by variant id for a stable request body.
    pub fn wire_ratings(&self) -> Vec<MealRating> {
        let mut out: Vec<MealRating> = self
            .ratings
            .iter()
            .map(|(&variant_id, rating)| MealRating {
                variant_id,
                rating: rating.as_wire().to_string(),
            })
            .collect();
        out.sort_by_key(|r| r.variant_id);
        out
    }

    /// Variant ids currently checked for saving to history.
    pub fn selected_variant_ids(&self) -> Vec<i64> {
        self.meals
            .iter()
            .filter(|m| self.selected.get(&m.variant_id).copied().unwrap_or(false))
            .map(|m| m.variant_id)
            .collect()
    }

    /// Total price of the resolved meals, in yen.
    pub fn total_price(&self) -> i64 {
        self.meals
            .iter()
            .filter_map(|m| m.food.as_ref())
            .map(|f| f.price)
            .sum()
    }
}

// ============================================================================
// Overlays
// ============================================================================

/// Pending confirmation for destructive operations.
pub enum ConfirmAction {
    /// Delete every saved meal from the history table.
    ClearHistory,
    /// Ask the server to rebuild the daily menu, then drop the local cache.
    ResetMenu,
}

/// State machine for the menu photo upload dialog.
pub enum UploadState {
    /// User is typing a filesystem path to the photo.
    InputPath { input: String },
    /// Upload in flight for the given path.
    Uploading { path: String },
}

/// State for the variant picker popup opened from the menu list.
///
/// Only shown for items with more than one variant; single-variant items go
/// straight into the cart.
pub struct VariantPicker {
    pub category: usize,
    pub item: usize,
    pub selected: usize,
}

// ============================================================================
// Settings Rows
// ============================================================================

/// Editable rows on the Settings tab, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingRow {
    Theme,
    Gender,
    Age,
    Height,
    Weight,
    BmrMethod,
    CustomBmr,
    ActivityLevel,
    FoodPreferences,
    FoodAllergies,
}

impl SettingRow {
    pub const ALL: [SettingRow; 10] = [
        SettingRow::Theme,
        SettingRow::Gender,
        SettingRow::Age,
        SettingRow::Height,
        SettingRow::Weight,
        SettingRow::BmrMethod,
        SettingRow::CustomBmr,
        SettingRow::ActivityLevel,
        SettingRow::FoodPreferences,
        SettingRow::FoodAllergies,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SettingRow::Theme => "Theme",
            SettingRow::Gender => "Gender",
            SettingRow::Age => "Age",
            SettingRow::Height => "Height (cm)",
            SettingRow::Weight => "Weight (kg)",
            SettingRow::BmrMethod => "BMR calculation",
            SettingRow::CustomBmr => "Custom BMR (kcal)",
            SettingRow::ActivityLevel => "Activity level",
            SettingRow::FoodPreferences => "Food preferences",
            SettingRow::FoodAllergies => "Food allergies",
        }
    }

    /// Rows that cycle through fixed values instead of taking typed input.
    pub fn is_cycle(self) -> bool {
        matches!(
            self,
            SettingRow::Theme
                | SettingRow::Gender
                | SettingRow::BmrMethod
                | SettingRow::ActivityLevel
        )
    }
}

/// In-progress edit of a typed settings value.
pub struct SettingEdit {
    pub row: SettingRow,
    pub input: String,
}

// ============================================================================
// Background Task Events
// ============================================================================

/// Events from background tasks.
pub enum AppEvent {
    /// Menu fetch finished and the local cache was replaced.
    ///
    /// `generation` is the menu fetch generation at spawn time; stale
    /// completions are dropped when the counters disagree.
    MenuLoaded {
        generation: u64,
        categories: Vec<FoodCategory>,
    },
    MenuLoadFailed {
        generation: u64,
        error: String,
    },
    /// Recommendation response arrived, with the food records the cache
    /// could resolve for it.
    RecommendationReady {
        generation: u64,
        payload: RecommendationPayload,
        foods: Vec<FoodRecord>,
    },
    RecommendationFailed {
        generation: u64,
        error: String,
    },
    /// History rows loaded and grouped by day and meal period.
    HistoryLoaded(Vec<HistoryDay>),
    HistoryLoadFailed {
        error: String,
    },
    /// Selected meals written to the history table.
    MealsSaved {
        count: usize,
    },
    MealsSaveFailed {
        error: String,
    },
    HistoryCleared {
        removed: u64,
    },
    HistoryClearFailed {
        error: String,
    },
    /// Photo accepted by the server; `detections` counts recognized dishes.
    PhotoUploaded {
        detections: usize,
    },
    PhotoUploadFailed {
        error: String,
    },
    MenuResetDone,
    MenuResetFailed {
        error: String,
    },
    ProfileSaved,
    ProfileSaveFailed {
        error: String,
    },
    /// Theme persistence failed. The in-memory switch already happened, so
    /// this only surfaces a warning.
    ThemeSaveFailed {
        error: String,
    },
    /// A background task panicked.
    TaskPanicked {
        task: &'static str,
        error: String,
    },
}

// ============================================================================
// Application State
// ============================================================================

/// Central application state.
pub struct App {
    pub db: Database,
    /// API client, or `None` when running offline.
    pub client: Option<ApiClient>,

    // Theme
    pub theme_variant: ThemeVariant,
    pub palette: ColorPalette,

    // Data
    /// Menu tree wrapped in Arc for O(1) cloning into render and tasks.
    pub menu: Arc<Vec<FoodCategory>>,
    /// Flattened display rows for the menu list. Rebuilt by `set_menu`.
    pub menu_rows: Vec<MenuRow>,
    pub cart: Cart,
    /// Working copy of the nutrition profile, edited on the Settings tab.
    pub profile: NutritionProfile,
    pub recommend: RecommendState,
    /// Free-form notes sent with every recommendation request.
    pub notes: String,
    /// History grouped by day, newest first.
    pub history: Vec<HistoryDay>,
    /// True when the history list may be stale and should be reloaded on
    /// the next visit to the History tab.
    pub history_dirty: bool,
    pub history_loading: bool,

    // UI state
    pub tab: Tab,
    pub menu_focus: MenuFocus,
    /// Cursor into `menu_rows`; rests on an `Item` row whenever one exists.
    pub menu_cursor: usize,
    pub cart_cursor: usize,
    pub recommend_cursor: usize,
    pub history_scroll: usize,
    pub settings_cursor: usize,

    /// Typed-input edit on the Settings tab, when open.
    pub setting_edit: Option<SettingEdit>,
    /// Notes overlay buffer on the Recommend tab, when open.
    pub notes_edit: Option<String>,
    /// Variant picker popup, when open.
    pub variant_picker: Option<VariantPicker>,
    /// Photo upload dialog, when open.
    pub upload_state: Option<UploadState>,
    /// Pending confirmation dialog for destructive operations.
    pub pending_confirm: Option<ConfirmAction>,

    pub show_help: bool,
    pub help_scroll_offset: usize,

    pub menu_loading: bool,
    /// Status message with expiry. Cow avoids allocation for static literals.
    pub status_message: Option<(Cow<'static, str>, Instant)>,
    /// Current frame of the loading spinner animation.
    pub spinner_frame: usize,
    /// Dirty flag to skip unnecessary frame renders.
    pub needs_redraw: bool,

    // History viewport, updated during render for scroll clamping.
    pub history_total_lines: usize,
    pub history_visible_lines: usize,

    /// Generation counter for menu fetches, incremented per spawn.
    pub menu_generation: u64,
    /// Handle to the in-flight menu fetch for cancellation.
    pub menu_task: Option<tokio::task::JoinHandle<()>>,

    /// Generation counter for recommendation requests.
    pub recommend_generation: u64,
    /// Handle to the in-flight recommendation request for cancellation.
    pub recommend_task: Option<tokio::task::JoinHandle<()>>,
}

impl App {
    pub fn new(
        db: Database,
        client: Option<ApiClient>,
        profile: NutritionProfile,
        theme_variant: ThemeVariant,
    ) -> Self {
        Self {
            db,
            client,
            theme_variant,
            palette: theme_variant.palette(),
            menu: Arc::new(Vec::new()),
            menu_rows: Vec::new(),
            cart: Cart::new(),
            profile,
            recommend: RecommendState::Idle,
            notes: String::new(),
            history: Vec::new(),
            history_dirty: true,
            history_loading: false,
            tab: Tab::Menu,
            menu_focus: MenuFocus::Items,
            menu_cursor: 0,
            cart_cursor: 0,
            recommend_cursor: 0,
            history_scroll: 0,
            settings_cursor: 0,
            setting_edit: None,
            notes_edit: None,
            variant_picker: None,
            upload_state: None,
            pending_confirm: None,
            show_help: false,
            help_scroll_offset: 0,
            menu_loading: false,
            status_message: None,
            spinner_frame: 0,
            needs_redraw: true,
            history_total_lines: 0,
            history_visible_lines: 0,
            menu_generation: 0,
            menu_task: None,
            recommend_generation: 0,
            recommend_task: None,
        }
    }

    pub fn offline(&self) -> bool {
        self.client.is_none()
    }

    // ------------------------------------------------------------------
    // Status messages
    // ------------------------------------------------------------------

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
        self.needs_redraw = true;
    }

    /// Clear status message if expired (older than 3 seconds)
    /// Returns true if a message was actually cleared
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= 3 {
                self.status_message = None;
                return true;
            }
        }
        false
    }

    // ------------------------------------------------------------------
    // Theme
    // ------------------------------------------------------------------

    /// Switch to a different theme variant at runtime.
    ///
    /// Rebuilds the palette and marks the UI as needing a full redraw.
    pub fn set_theme(&mut self, variant: ThemeVariant) {
        self.theme_variant = variant;
        self.palette = variant.palette();
        self.needs_redraw = true;
    }

    /// Cycle to the next theme variant (Dark → Light → Dark).
    ///
    /// Returns the name of the new theme for status display.
    pub fn cycle_theme(&mut self) -> &'static str {
        let next = self.theme_variant.next();
        self.set_theme(next);
        next.name()
    }

    // ------------------------------------------------------------------
    // Tabs
    // ------------------------------------------------------------------

    pub fn set_tab(&mut self, tab: Tab) {
        if self.tab != tab {
            self.tab = tab;
            self.needs_redraw = true;
        }
    }

    pub fn next_tab(&mut self) {
        self.set_tab(self.tab.next());
    }

    pub fn prev_tab(&mut self) {
        self.set_tab(self.tab.prev());
    }

    // ------------------------------------------------------------------
    // Menu
    // ------------------------------------------------------------------

    /// Replace the menu tree and rebuild the flattened row list.
    ///
    /// The cursor is re-clamped and snapped onto an item row. The cart is
    /// left alone so a refresh never silently empties it.
    pub fn set_menu(&mut self, categories: Vec<FoodCategory>) {
        self.menu = Arc::new(categories);
        self.menu_rows = build_menu_rows(&self.menu);
        self.clamp_selections();
        self.snap_to_item_row();
        self.needs_redraw = true;
    }

    /// Move the menu cursor onto the nearest item row, searching forward
    /// first and then backward. No-op when the menu has no items.
    fn snap_to_item_row(&mut self) {
        let at = self.menu_cursor.min(self.menu_rows.len());
        if self.menu_rows.get(self.menu_cursor).map(|r| r.is_item()) == Some(true) {
            return;
        }
        let forward = self.menu_rows[at..]
            .iter()
            .position(|r| r.is_item())
            .map(|off| at + off);
        let backward = self.menu_rows[..at].iter().rposition(|r| r.is_item());
        if let Some(idx) = forward.or(backward) {
            self.menu_cursor = idx;
        }
    }

    /// The menu item under the cursor, with its category index.
    pub fn selected_menu_item(&self) -> Option<(usize, &FoodItem)> {
        match self.menu_rows.get(self.menu_cursor)? {
            MenuRow::Item { category, item } => {
                let food = self.menu.get(*category)?.items.get(*item)?;
                Some((*category, food))
            }
            MenuRow::Header { .. } => None,
        }
    }

    fn menu_nav(&mut self, down: bool) {
        let next = if down {
            let from = self.menu_cursor.saturating_add(1).min(self.menu_rows.len());
            self.menu_rows[from..]
                .iter()
                .position(|r| r.is_item())
                .map(|off| from + off)
        } else {
            self.menu_rows[..self.menu_cursor]
                .iter()
                .rposition(|r| r.is_item())
        };
        if let Some(idx) = next {
            self.menu_cursor = idx;
            self.needs_redraw = true;
        }
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Move the active cursor up, honoring the current tab and focus.
    pub fn nav_up(&mut self) {
        match self.tab {
            Tab::Menu => match self.menu_focus {
                MenuFocus::Items => self.menu_nav(false),
                MenuFocus::Cart => {
                    if self.cart_cursor > 0 {
                        self.cart_cursor -= 1;
                        self.needs_redraw = true;
                    }
                }
            },
            Tab::Recommend => {
                if self.recommend_cursor > 0 {
                    self.recommend_cursor -= 1;
                    self.needs_redraw = true;
                }
            }
            Tab::History => {
                if self.history_scroll > 0 {
                    self.history_scroll -= 1;
                    self.needs_redraw = true;
                }
            }
            Tab::Settings => {
                if self.settings_cursor > 0 {
                    self.settings_cursor -= 1;
                    self.needs_redraw = true;
                }
            }
        }
    }

    /// Move the active cursor down, honoring the current tab and focus.
    pub fn nav_down(&mut self) {
        match self.tab {
            Tab::Menu => match self.menu_focus {
                MenuFocus::Items => self.menu_nav(true),
                MenuFocus::Cart => {
                    if self.cart_cursor + 1 < self.cart.len() {
                        self.cart_cursor += 1;
                        self.needs_redraw = true;
                    }
                }
            },
            Tab::Recommend => {
                let meals = match &self.recommend {
                    RecommendState::Ready(result) => result.meals.len(),
                    _ => 0,
                };
                if self.recommend_cursor + 1 < meals {
                    self.recommend_cursor += 1;
                    self.needs_redraw = true;
                }
            }
            Tab::History => {
                self.history_scroll += 1;
                self.clamp_history_scroll();
                self.needs_redraw = true;
            }
            Tab::Settings => {
                if self.settings_cursor + 1 < SettingRow::ALL.len() {
                    self.settings_cursor += 1;
                    self.needs_redraw = true;
                }
            }
        }
    }

    /// Clamp the history scroll to the viewport recorded by the last render.
    pub fn clamp_history_scroll(&mut self) {
        let max = self
            .history_total_lines
            .saturating_sub(self.history_visible_lines);
        if self.history_scroll > max {
            self.history_scroll = max;
        }
    }

    /// Clamp all cursors to valid ranges.
    ///
    /// Call after any operation that shrinks a list the cursors point into,
    /// such as a menu refresh, cart removal, or a new recommendation.
    pub fn clamp_selections(&mut self) {
        self.menu_cursor = if self.menu_rows.is_empty() {
            0
        } else {
            self.menu_cursor.min(self.menu_rows.len() - 1)
        };
        self.cart_cursor = if self.cart.is_empty() {
            0
        } else {
            self.cart_cursor.min(self.cart.len() - 1)
        };
        let meals = match &self.recommend {
            RecommendState::Ready(result) => result.meals.len(),
            _ => 0,
        };
        self.recommend_cursor = if meals == 0 {
            0
        } else {
            self.recommend_cursor.min(meals - 1)
        };
        self.settings_cursor = self.settings_cursor.min(SettingRow::ALL.len() - 1);

        debug_assert!(
            self.menu_rows.is_empty() || self.menu_cursor < self.menu_rows.len(),
            "menu_cursor {} out of bounds for rows len {}",
            self.menu_cursor,
            self.menu_rows.len()
        );
        debug_assert!(
            self.cart.is_empty() || self.cart_cursor < self.cart.len(),
            "cart_cursor {} out of bounds for cart len {}",
            self.cart_cursor,
            self.cart.len()
        );
    }

    // ------------------------------------------------------------------
    // Cart
    // ------------------------------------------------------------------

    /// Add one unit of a variant of the item under the menu cursor.
    ///
    /// Returns the item and variant names for status display, or `None`
    /// when the cursor is not on an item or the variant index is stale.
    pub fn add_selected_to_cart(&mut self, variant_index: usize) -> Option<(Arc<str>, Arc<str>)> {
        let (_, item) = self.selected_menu_item()?;
        let variant = item.variants.get(variant_index)?.clone();
        let names = (Arc::clone(&item.name), Arc::clone(&variant.variant_name));
        let food_name = Arc::clone(&item.name);
        self.cart.add(variant, food_name);
        self.clamp_selections();
        self.needs_redraw = true;
        Some(names)
    }

    /// The cart entry under the cart cursor.
    pub fn selected_cart_entry(&self) -> Option<&crate::cart::CartEntry> {
        self.cart.entries().get(self.cart_cursor)
    }

    // ------------------------------------------------------------------
    // Recommendation
    // ------------------------------------------------------------------

    pub fn recommend_result(&self) -> Option<&RecommendationResult> {
        match &self.recommend {
            RecommendState::Ready(result) => Some(result),
            _ => None,
        }
    }

    pub fn recommend_result_mut(&mut self) -> Option<&mut RecommendationResult> {
        match &mut self.recommend {
            RecommendState::Ready(result) => Some(result),
            _ => None,
        }
    }

    /// The recommended meal under the cursor.
    pub fn selected_recommend_meal(&self) -> Option<&RecommendedMeal> {
        self.recommend_result()?.meals.get(self.recommend_cursor)
    }

    /// Install a fresh recommendation result and reset the cursor.
    pub fn apply_recommendation(&mut self, payload: RecommendationPayload, foods: Vec<FoodRecord>) {
        self.recommend = RecommendState::Ready(RecommendationResult::new(payload, foods));
        self.recommend_cursor = 0;
        self.needs_redraw = true;
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    /// The settings row under the cursor.
    pub fn selected_setting(&self) -> SettingRow {
        SettingRow::ALL[self.settings_cursor.min(SettingRow::ALL.len() - 1)]
    }

    /// Cycle a fixed-choice settings row to its next value.
    ///
    /// Returns false for typed rows, which open an input overlay instead.
    /// Theme changes apply immediately; profile rows only touch the working
    /// copy until the caller persists it.
    pub fn cycle_setting(&mut self, row: SettingRow) -> bool {
        match row {
            SettingRow::Theme => {
                self.cycle_theme();
            }
            SettingRow::Gender => {
                self.profile.is_male = !self.profile.is_male;
            }
            SettingRow::BmrMethod => {
                self.profile.bmr_method = self.profile.bmr_method.next();
            }
            SettingRow::ActivityLevel => {
                self.profile.activity_level = self.profile.activity_level.next();
            }
            _ => return false,
        }
        self.needs_redraw = true;
        true
    }

    /// Current text for a typed settings row, used to seed the edit buffer.
    pub fn setting_input_seed(&self, row: SettingRow) -> String {
        match row {
            SettingRow::Age => self.profile.age.to_string(),
            SettingRow::Height => self.profile.height_cm.to_string(),
            SettingRow::Weight => self.profile.weight_kg.to_string(),
            SettingRow::CustomBmr => self.profile.custom_bmr.to_string(),
            SettingRow::FoodPreferences => self.profile.food_preferences.clone(),
            SettingRow::FoodAllergies => self.profile.food_allergies.clone(),
            _ => String::new(),
        }
    }

    /// Apply a committed edit to the profile working copy.
    ///
    /// Numeric rows are parsed and range-checked; the error string is ready
    /// for status display.
    pub fn apply_setting_input(&mut self, row: SettingRow, input: &str) -> Result<(), String> {
        let text = input.trim();
        match row {
            SettingRow::Age => {
                self.profile.age = parse_bounded(text, 1, 120, "age")?;
            }
            SettingRow::Height => {
                self.profile.height_cm = parse_bounded(text, 50, 280, "height")?;
            }
            SettingRow::Weight => {
                self.profile.weight_kg = parse_bounded(text, 20, 400, "weight")?;
            }
            SettingRow::CustomBmr => {
                self.profile.custom_bmr = parse_bounded(text, 500, 10_000, "BMR")?;
            }
            SettingRow::FoodPreferences => {
                self.profile.food_preferences = text.to_string();
            }
            SettingRow::FoodAllergies => {
                self.profile.food_allergies = text.to_string();
            }
            _ => {}
        }
        self.needs_redraw = true;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Loading indicator
    // ------------------------------------------------------------------

    /// True while any background request should animate the spinner.
    pub fn is_loading(&self) -> bool {
        self.menu_loading
            || self.history_loading
            || matches!(self.recommend, RecommendState::Loading { .. })
            || matches!(self.upload_state, Some(UploadState::Uploading { .. }))
    }
}

fn parse_bounded(text: &str, min: i64, max: i64, what: &str) -> Result<i64, String> {
    let value: i64 = text
        .parse()
        .map_err(|_| format!("Enter a whole number for {what}"))?;
    if value < min || value > max {
        return Err(format!("{what} must be between {min} and {max}"));
    }
    Ok(value)
}

// ============================================================================
// Resource Cleanup
// ============================================================================

/// Abort in-flight async tasks on App drop so nothing outlives the event
/// loop.
impl Drop for App {
    fn drop(&mut self) {
        if let Some(handle) = self.menu_task.take() {
            handle.abort();
            tracing::debug!("Aborted menu fetch task on App drop");
        }
        if let Some(handle) = self.recommend_task.take() {
            handle.abort();
            tracing::debug!("Aborted recommendation task on App drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock;
    use crate::menu::categories_from_payload;
    use crate::storage::Database;
    use tokio::time::{self, Duration};

    async fn test_app() -> App {
        let db = Database::open(":memory:").await.unwrap();
        App::new(db, None, NutritionProfile::default(), ThemeVariant::Dark)
    }

    fn sample_menu() -> Vec<FoodCategory> {
        categories_from_payload(&mock::sample_menu(), "http://cafeteria.test")
    }

    fn sample_record(variant_id: i64, price: i64) -> FoodRecord {
        FoodRecord {
            variant_id,
            food_id: 1,
            variant_name: Arc::from("M"),
            food_name: Arc::from("Sample Burger"),
            price,
            calories: 600,
            protein: 30,
            fat: 25,
            carbohydrates: 60,
            category: Arc::from("Burgers"),
            image_url: Arc::from("http://cafeteria.test/images/burger.png"),
            order_index: 0,
        }
    }

    fn sample_payload(meals: Vec<i64>) -> RecommendationPayload {
        mock::canned_payload(meals)
    }

    // Tab cycling

    #[tokio::test]
    async fn test_tab_cycle_wraps() {
        let mut app = test_app().await;
        assert_eq!(app.tab, Tab::Menu);
        app.next_tab();
        app.next_tab();
        app.next_tab();
        app.next_tab();
        assert_eq!(app.tab, Tab::Menu);
        app.prev_tab();
        assert_eq!(app.tab, Tab::Settings);
    }

    // Menu navigation

    #[tokio::test]
    async fn test_empty_menu_has_no_selection() {
        let app = test_app().await;
        assert!(app.selected_menu_item().is_none());
    }

    #[tokio::test]
    async fn test_set_menu_lands_on_first_item() {
        let mut app = test_app().await;
        app.set_menu(sample_menu());
        // Row 0 is the first category header; the cursor must sit below it.
        let (_, item) = app.selected_menu_item().unwrap();
        assert_eq!(&*item.name, "Sample Burger");
    }

    #[tokio::test]
    async fn test_menu_nav_skips_headers() {
        let mut app = test_app().await;
        app.set_menu(sample_menu());
        let first = app.menu_cursor;
        // Walk to the end: every visited row must be an item.
        loop {
            let before = app.menu_cursor;
            app.nav_down();
            if app.menu_cursor == before {
                break;
            }
            assert!(app.menu_rows[app.menu_cursor].is_item());
        }
        // And back up to the start.
        loop {
            let before = app.menu_cursor;
            app.nav_up();
            if app.menu_cursor == before {
                break;
            }
            assert!(app.menu_rows[app.menu_cursor].is_item());
        }
        assert_eq!(app.menu_cursor, first);
    }

    #[tokio::test]
    async fn test_menu_shrink_clamps_cursor() {
        let mut app = test_app().await;
        app.set_menu(sample_menu());
        // Drive the cursor to the last item, then shrink the menu.
        for _ in 0..20 {
            app.nav_down();
        }
        app.set_menu(vec![FoodCategory {
            name: Arc::from("Burgers"),
            items: vec![],
        }]);
        assert!(app.menu_cursor < app.menu_rows.len());
        assert!(app.selected_menu_item().is_none());
    }

    // Cart

    #[tokio::test]
    async fn test_add_selected_to_cart() {
        let mut app = test_app().await;
        app.set_menu(sample_menu());
        let names = app.add_selected_to_cart(1).unwrap();
        assert_eq!(&*names.0, "Sample Burger");
        assert_eq!(&*names.1, "M");
        assert_eq!(app.cart.len(), 1);
        assert!(app.add_selected_to_cart(9).is_none()); // stale variant index
    }

    #[tokio::test]
    async fn test_cart_cursor_clamps_after_removal() {
        let mut app = test_app().await;
        app.set_menu(sample_menu());
        app.add_selected_to_cart(0);
        app.add_selected_to_cart(1);
        app.cart_cursor = 1;
        let id = app.selected_cart_entry().unwrap().variant.variant_id;
        app.cart.remove(id);
        app.clamp_selections();
        assert_eq!(app.cart_cursor, 0);
        assert!(app.selected_cart_entry().is_some());
    }

    // Status message expiry with time control

    #[tokio::test]
    async fn test_status_expires_after_3_seconds() {
        // Create app before pausing time to avoid DB connection timeout
        let mut app = test_app().await;
        time::pause();
        app.set_status("Test message");

        assert!(app.status_message.is_some());

        time::advance(Duration::from_secs(2)).await;
        app.clear_expired_status();
        assert!(app.status_message.is_some()); // Still present at 2s

        time::advance(Duration::from_secs(2)).await;
        app.clear_expired_status();
        assert!(app.status_message.is_none()); // Expired after 3s
    }

    #[tokio::test]
    async fn test_status_not_expired_before_3_seconds() {
        // Create app before pausing time to avoid DB connection timeout
        let mut app = test_app().await;
        time::pause();
        app.set_status("Test");

        time::advance(Duration::from_millis(2999)).await;
        app.clear_expired_status();
        assert!(app.status_message.is_some());
    }

    // Theme

    #[tokio::test]
    async fn test_cycle_theme_round_trip() {
        let mut app = test_app().await;
        assert_eq!(app.cycle_theme(), "Light");
        assert_eq!(app.theme_variant, ThemeVariant::Light);
        assert_eq!(app.cycle_theme(), "Dark");
        assert_eq!(app.theme_variant, ThemeVariant::Dark);
    }

    // Recommendation result state

    #[tokio::test]
    async fn test_recommendation_seeds_ratings_and_selection() {
        let result = RecommendationResult::new(
            sample_payload(vec![101, 102, 999]),
            vec![sample_record(101, 500), sample_record(102, 600)],
        );
        assert_eq!(result.meals.len(), 3);
        assert_eq!(result.ratings.get(&101), Some(&Rating::None));
        assert_eq!(result.ratings.get(&102), Some(&Rating::None));
        // 999 is not in the cache: no rating, not selectable.
        assert!(result.ratings.get(&999).is_none());
        assert_eq!(result.selected_variant_ids(), vec![101, 102]);
        assert_eq!(result.total_price(), 1100);
    }

    #[tokio::test]
    async fn test_rating_toggle_clears_on_repeat() {
        let mut result =
            RecommendationResult::new(sample_payload(vec![101]), vec![sample_record(101, 500)]);
        result.toggle_rating(101, Rating::Like);
        assert_eq!(result.ratings.get(&101), Some(&Rating::Like));
        result.toggle_rating(101, Rating::Like);
        assert_eq!(result.ratings.get(&101), Some(&Rating::None));
        result.toggle_rating(101, Rating::Dislike);
        assert_eq!(result.ratings.get(&101), Some(&Rating::Dislike));
        result.toggle_rating(101, Rating::Like);
        assert_eq!(result.ratings.get(&101), Some(&Rating::Like));
    }

    #[tokio::test]
    async fn test_wire_ratings_sorted_by_variant() {
        let mut result = RecommendationResult::new(
            sample_payload(vec![103, 101, 102]),
            vec![
                sample_record(101, 500),
                sample_record(102, 600),
                sample_record(103, 700),
            ],
        );
        result.toggle_rating(103, Rating::Dislike);
        result.toggle_rating(101, Rating::Like);
        let wire = result.wire_ratings();
        let ids: Vec<i64> = wire.iter().map(|r| r.variant_id).collect();
        assert_eq!(ids, vec![101, 102, 103]);
        assert_eq!(wire[0].rating, "like");
        assert_eq!(wire[1].rating, "none");
        assert_eq!(wire[2].rating, "dislike");
    }

    #[tokio::test]
    async fn test_selection_toggle_only_for_resolved() {
        let mut result = RecommendationResult::new(
            sample_payload(vec![101, 999]),
            vec![sample_record(101, 500)],
        );
        result.toggle_selected(101);
        assert!(result.selected_variant_ids().is_empty());
        result.toggle_selected(101);
        assert_eq!(result.selected_variant_ids(), vec![101]);
        // Unresolved meals have no checkbox to flip.
        result.toggle_selected(999);
        assert_eq!(result.selected_variant_ids(), vec![101]);
    }

    #[tokio::test]
    async fn test_apply_recommendation_resets_cursor() {
        let mut app = test_app().await;
        app.recommend_cursor = 5;
        app.apply_recommendation(sample_payload(vec![101]), vec![sample_record(101, 500)]);
        assert_eq!(app.recommend_cursor, 0);
        assert!(app.recommend_result().is_some());
        assert!(app.selected_recommend_meal().is_some());
    }

    // Settings

    #[tokio::test]
    async fn test_cycle_setting_rows() {
        let mut app = test_app().await;
        assert!(app.cycle_setting(SettingRow::Gender));
        assert!(!app.profile.is_male);
        assert!(app.cycle_setting(SettingRow::BmrMethod));
        assert_ne!(
            app.profile.bmr_method,
            NutritionProfile::default().bmr_method
        );
        assert!(!app.cycle_setting(SettingRow::Age)); // typed row
    }

    #[tokio::test]
    async fn test_apply_setting_input_bounds() {
        let mut app = test_app().await;
        app.apply_setting_input(SettingRow::Age, "33").unwrap();
        assert_eq!(app.profile.age, 33);
        assert!(app.apply_setting_input(SettingRow::Age, "0").is_err());
        assert!(app.apply_setting_input(SettingRow::Age, "abc").is_err());
        assert!(app.apply_setting_input(SettingRow::Weight, "  72 ").is_ok());
        assert_eq!(app.profile.weight_kg, 72);
        app.apply_setting_input(SettingRow::FoodAllergies, " milk, eggs ")
            .unwrap();
        assert_eq!(app.profile.food_allergies, "milk, eggs");
    }

    #[tokio::test]
    async fn test_setting_input_seed_matches_profile() {
        let mut app = test_app().await;
        app.profile.age = 47;
        assert_eq!(app.setting_input_seed(SettingRow::Age), "47");
        app.profile.food_preferences = "spicy".to_string();
        assert_eq!(app.setting_input_seed(SettingRow::FoodPreferences), "spicy");
    }
}
