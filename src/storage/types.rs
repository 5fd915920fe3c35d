use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another instance of the application has locked the database
    #[error("Another instance of mensa appears to be running. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let error_string = err.to_string().to_lowercase();

        // Check for SQLite lock-related error messages
        // SQLITE_BUSY (5): database is locked
        // SQLITE_LOCKED (6): database table is locked
        // SQLITE_CANTOPEN (14): unable to open database file
        if error_string.contains("database is locked")
            || error_string.contains("database table is locked")
            || error_string.contains("sqlite_busy")
            || error_string.contains("sqlite_locked")
            || error_string.contains("unable to open database file")
        {
            return DatabaseError::InstanceLocked;
        }

        DatabaseError::Other(err)
    }
}

// ============================================================================
// Food Cache Types
// ============================================================================

/// One cached menu variant, as read from the `food` table.
///
/// `variant_id` is the primary key and the unit of identity across the
/// cart, recommendations, and meal history. `order_index` preserves the
/// service's presentation order across restarts.
///
/// String fields use `Arc<str>` for cheap cloning into cart entries,
/// history views, and list widgets.
#[derive(Debug, Clone)]
pub struct FoodRecord {
    pub variant_id: i64,
    pub food_id: i64,
    pub variant_name: Arc<str>,
    pub food_name: Arc<str>,
    pub price: i64,
    pub calories: i64,
    pub protein: i64,
    pub fat: i64,
    pub carbohydrates: i64,
    pub category: Arc<str>,
    pub image_url: Arc<str>,
    pub order_index: i64,
}

/// A menu variant prepared for insertion, produced by flattening the
/// fetched menu tree. Plain `String` fields because sqlx binds them
/// directly.
#[derive(Debug, Clone)]
pub struct NewFoodRow {
    pub variant_id: i64,
    pub food_id: i64,
    pub variant_name: String,
    pub food_name: String,
    pub price: i64,
    pub calories: i64,
    pub protein: i64,
    pub fat: i64,
    pub carbohydrates: i64,
    pub category: String,
    pub image_url: String,
    pub order_index: i64,
}

impl NewFoodRow {
    pub fn into_record(self) -> FoodRecord {
        FoodRecord {
            variant_id: self.variant_id,
            food_id: self.food_id,
            variant_name: Arc::from(self.variant_name),
            food_name: Arc::from(self.food_name),
            price: self.price,
            calories: self.calories,
            protein: self.protein,
            fat: self.fat,
            carbohydrates: self.carbohydrates,
            category: Arc::from(self.category),
            image_url: Arc::from(self.image_url),
            order_index: self.order_index,
        }
    }
}

/// Internal row type for food queries (used by sqlx FromRow)
/// Converts to FoodRecord via into_record() with Arc wrapping
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct FoodDbRow {
    pub variant_id: i64,
    pub food_id: i64,
    pub variant_name: String,
    pub food_name: String,
    pub price: i64,
    pub calories: i64,
    pub protein: i64,
    pub fat: i64,
    pub carbohydrates: i64,
    pub category: String,
    pub image_url: String,
    pub order_index: i64,
}

impl FoodDbRow {
    pub(crate) fn into_record(self) -> FoodRecord {
        FoodRecord {
            variant_id: self.variant_id,
            food_id: self.food_id,
            variant_name: Arc::from(self.variant_name),
            food_name: Arc::from(self.food_name),
            price: self.price,
            calories: self.calories,
            protein: self.protein,
            fat: self.fat,
            carbohydrates: self.carbohydrates,
            category: Arc::from(self.category),
            image_url: Arc::from(self.image_url),
            order_index: self.order_index,
        }
    }
}

// ============================================================================
// Meal History Types
// ============================================================================

/// One saved meal entry from the `food_history` table.
///
/// `timestamp` is Unix milliseconds. `meal_option` is the Breakfast/Lunch/
/// Dinner label stamped at save time from the local clock, persisted so
/// grouping stays stable even if the bucketing rules ever change.
#[derive(Debug, Clone)]
pub struct HistoryRecord {
    pub id: i64,
    pub timestamp: i64,
    pub variant_id: i64,
    pub meal_option: Arc<str>,
}

/// History entry joined with its cached food row.
///
/// `food` is `None` when the variant has since dropped off the menu and
/// out of the cache; the History tab still shows the entry, with the
/// variant id standing in for the name.
#[derive(Debug, Clone)]
pub struct HistoryWithFood {
    pub record: HistoryRecord,
    pub food: Option<FoodRecord>,
}
