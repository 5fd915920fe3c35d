//! Domain model for the cafeteria menu.
//!
//! The wire payload (`api::types`) maps into these types for display and
//! caching:
//!
//! - **Mapping**: nutrition floats truncate to whole numbers, relative image
//!   paths join against the configured server URL
//! - **Flattening**: nested category → item → variant trees flatten to one
//!   cache row per variant for SQLite
//! - **Rebuilding**: cached rows reassemble into the nested tree for offline
//!   browsing, preserving the service's presentation order

use std::sync::Arc;

use crate::api::CategoryPayload;
use crate::storage::{FoodRecord, NewFoodRow};
use crate::util::sanitize_display;

// ============================================================================
// Menu Tree
// ============================================================================

/// A menu category with its food items, in service presentation order.
#[derive(Debug, Clone)]
pub struct FoodCategory {
    pub name: Arc<str>,
    pub items: Vec<FoodItem>,
}

/// A food item with its purchasable variants.
///
/// `image_url` is absolute (server base joined with the payload's relative
/// path). It rides along in the cache; the terminal UI does not render
/// photos.
#[derive(Debug, Clone)]
pub struct FoodItem {
    pub food_id: i64,
    pub name: Arc<str>,
    pub image_url: Arc<str>,
    pub variants: Vec<FoodVariant>,
}

/// A purchasable size/option of a food item.
///
/// `variant_id` is the unit of identity across cart, recommendation, and
/// history. Nutrition figures are whole numbers (truncated from the wire).
#[derive(Debug, Clone)]
pub struct FoodVariant {
    pub variant_id: i64,
    pub variant_name: Arc<str>,
    pub price: i64,
    pub calories: i64,
    pub protein: i64,
    pub fat: i64,
    pub carbohydrates: i64,
}

/// Map the wire menu payload into the domain tree.
///
/// `base_url` supplies the host for the payload's relative image paths.
/// Nutrition floats truncate toward zero, matching how the service's own
/// clients have always displayed them. Names pass through
/// [`sanitize_display`] here, so everything downstream (cache included) is
/// safe to print.
pub fn categories_from_payload(payload: &[CategoryPayload], base_url: &str) -> Vec<FoodCategory> {
    payload
        .iter()
        .map(|cat| FoodCategory {
            name: Arc::from(sanitize_display(&cat.category).as_ref()),
            items: cat
                .items
                .iter()
                .map(|item| FoodItem {
                    food_id: item.food_id,
                    name: Arc::from(sanitize_display(&item.name).as_ref()),
                    image_url: Arc::from(join_image_url(base_url, &item.url)),
                    variants: item
                        .variants
                        .iter()
                        .map(|v| FoodVariant {
                            variant_id: v.variant_id,
                            variant_name: Arc::from(sanitize_display(&v.variant_name).as_ref()),
                            price: v.price,
                            calories: v.calories.trunc() as i64,
                            protein: v.protein.trunc() as i64,
                            fat: v.fat.trunc() as i64,
                            carbohydrates: v.carbohydrates.trunc() as i64,
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect()
}

/// Join the server base URL with a relative image path.
///
/// Absolute URLs in the payload pass through untouched; relative paths get
/// the base prepended with exactly one slash between the two.
fn join_image_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

// ============================================================================
// Cache Flattening
// ============================================================================

/// Flatten the menu tree into one cache row per variant.
///
/// `order_index` numbers variants in presentation order so the cached menu
/// renders in the same order as a live fetch.
pub fn flatten_for_cache(categories: &[FoodCategory]) -> Vec<NewFoodRow> {
    let mut rows = Vec::new();
    let mut order_index: i64 = 0;
    for category in categories {
        for item in &category.items {
            for variant in &item.variants {
                rows.push(NewFoodRow {
                    variant_id: variant.variant_id,
                    food_id: item.food_id,
                    variant_name: variant.variant_name.to_string(),
                    food_name: item.name.to_string(),
                    price: variant.price,
                    calories: variant.calories,
                    protein: variant.protein,
                    fat: variant.fat,
                    carbohydrates: variant.carbohydrates,
                    category: category.name.to_string(),
                    image_url: item.image_url.to_string(),
                    order_index,
                });
                order_index += 1;
            }
        }
    }
    rows
}

/// Rebuild the nested menu tree from cached rows.
///
/// Rows arrive in `(category, order_index)` order from the store. Categories
/// and items regroup in first-seen order, so the rebuilt tree matches the
/// order the service last sent.
pub fn categories_from_records(records: &[FoodRecord]) -> Vec<FoodCategory> {
    let mut categories: Vec<FoodCategory> = Vec::new();
    for record in records {
        let cat_idx = match categories.iter().position(|c| *c.name == *record.category) {
            Some(i) => i,
            None => {
                categories.push(FoodCategory {
                    name: record.category.clone(),
                    items: Vec::new(),
                });
                categories.len() - 1
            }
        };
        let category = &mut categories[cat_idx];

        let item_idx = match category
            .items
            .iter()
            .position(|i| i.food_id == record.food_id)
        {
            Some(i) => i,
            None => {
                category.items.push(FoodItem {
                    food_id: record.food_id,
                    name: record.food_name.clone(),
                    image_url: record.image_url.clone(),
                    variants: Vec::new(),
                });
                category.items.len() - 1
            }
        };
        let item = &mut category.items[item_idx];

        item.variants.push(FoodVariant {
            variant_id: record.variant_id,
            variant_name: record.variant_name.clone(),
            price: record.price,
            calories: record.calories,
            protein: record.protein,
            fat: record.fat,
            carbohydrates: record.carbohydrates,
        });
    }
    categories
}

// ============================================================================
// Meal Period
// ============================================================================

/// Breakfast/Lunch/Dinner bucket derived from the local hour-of-day.
///
/// History entries are stamped with the period in effect when they were
/// saved; the History tab groups by it within each day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MealPeriod {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealPeriod {
    /// Bucket an hour-of-day (0-23): 0-10 Breakfast, 11-16 Lunch, rest Dinner.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=10 => Self::Breakfast,
            11..=16 => Self::Lunch,
            _ => Self::Dinner,
        }
    }

    /// Storage/display label. History rows persist this string.
    pub fn label(self) -> &'static str {
        match self {
            Self::Breakfast => "Breakfast",
            Self::Lunch => "Lunch",
            Self::Dinner => "Dinner",
        }
    }

    /// Fixed display rank within a day: Breakfast, Lunch, Dinner.
    pub fn rank(self) -> u8 {
        match self {
            Self::Breakfast => 0,
            Self::Lunch => 1,
            Self::Dinner => 2,
        }
    }

    /// Parse a persisted label back to a period. Unknown labels return `None`
    /// and sort after the known periods in history grouping.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Breakfast" => Some(Self::Breakfast),
            "Lunch" => Some(Self::Lunch),
            "Dinner" => Some(Self::Dinner),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ItemPayload, VariantPayload};

    fn sample_payload() -> Vec<CategoryPayload> {
        vec![CategoryPayload {
            category: "Burgers".to_string(),
            items: vec![ItemPayload {
                food_id: 1,
                name: "Sample Burger".to_string(),
                url: "/static/sample.jpg".to_string(),
                variants: vec![
                    VariantPayload {
                        variant_name: "S".to_string(),
                        variant_id: 101,
                        price: 500,
                        calories: 500.9,
                        protein: 25.5,
                        fat: 20.1,
                        carbohydrates: 50.0,
                    },
                    VariantPayload {
                        variant_name: "M".to_string(),
                        variant_id: 102,
                        price: 600,
                        calories: 600.0,
                        protein: 30.0,
                        fat: 25.0,
                        carbohydrates: 60.0,
                    },
                ],
            }],
        }]
    }

    #[test]
    fn nutrition_floats_truncate() {
        let categories = categories_from_payload(&sample_payload(), "http://example.com");
        let variant = &categories[0].items[0].variants[0];
        // 500.9 kcal truncates to 500, never rounds to 501
        assert_eq!(variant.calories, 500);
        assert_eq!(variant.protein, 25);
        assert_eq!(variant.fat, 20);
        assert_eq!(variant.carbohydrates, 50);
    }

    #[test]
    fn names_are_sanitized_on_ingest() {
        let mut payload = sample_payload();
        payload[0].category = "Burg\x1b[31mers".to_string();
        payload[0].items[0].name = "Sam\x07ple Burger".to_string();
        let categories = categories_from_payload(&payload, "http://example.com");
        assert_eq!(&*categories[0].name, "Burgers");
        assert_eq!(&*categories[0].items[0].name, "Sample Burger");
    }

    #[test]
    fn image_url_joins_base() {
        let categories = categories_from_payload(&sample_payload(), "http://example.com");
        assert_eq!(
            &*categories[0].items[0].image_url,
            "http://example.com/static/sample.jpg"
        );
    }

    #[test]
    fn image_url_join_handles_slashes() {
        assert_eq!(
            join_image_url("http://h:8000/", "/a.jpg"),
            "http://h:8000/a.jpg"
        );
        assert_eq!(
            join_image_url("http://h:8000", "a.jpg"),
            "http://h:8000/a.jpg"
        );
        assert_eq!(
            join_image_url("http://h:8000", "https://cdn/a.jpg"),
            "https://cdn/a.jpg"
        );
    }

    #[test]
    fn flatten_assigns_presentation_order() {
        let categories = categories_from_payload(&sample_payload(), "http://example.com");
        let rows = flatten_for_cache(&categories);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].variant_id, 101);
        assert_eq!(rows[0].order_index, 0);
        assert_eq!(rows[1].variant_id, 102);
        assert_eq!(rows[1].order_index, 1);
        assert_eq!(rows[0].category, "Burgers");
        assert_eq!(rows[0].food_name, "Sample Burger");
    }

    #[test]
    fn rebuild_round_trips_structure() {
        let categories = categories_from_payload(&sample_payload(), "http://example.com");
        let rows = flatten_for_cache(&categories);
        let records: Vec<FoodRecord> = rows.iter().map(|r| r.clone().into_record()).collect();

        let rebuilt = categories_from_records(&records);
        assert_eq!(rebuilt.len(), 1);
        assert_eq!(&*rebuilt[0].name, "Burgers");
        assert_eq!(rebuilt[0].items.len(), 1);
        assert_eq!(rebuilt[0].items[0].variants.len(), 2);
        assert_eq!(rebuilt[0].items[0].variants[0].variant_id, 101);
        assert_eq!(rebuilt[0].items[0].variants[1].variant_id, 102);
    }

    #[test]
    fn meal_period_hour_boundaries() {
        assert_eq!(MealPeriod::from_hour(0), MealPeriod::Breakfast);
        assert_eq!(MealPeriod::from_hour(10), MealPeriod::Breakfast);
        assert_eq!(MealPeriod::from_hour(11), MealPeriod::Lunch);
        assert_eq!(MealPeriod::from_hour(16), MealPeriod::Lunch);
        assert_eq!(MealPeriod::from_hour(17), MealPeriod::Dinner);
        assert_eq!(MealPeriod::from_hour(23), MealPeriod::Dinner);
    }

    #[test]
    fn meal_period_labels_round_trip() {
        for period in [MealPeriod::Breakfast, MealPeriod::Lunch, MealPeriod::Dinner] {
            assert_eq!(MealPeriod::from_label(period.label()), Some(period));
        }
        assert_eq!(MealPeriod::from_label("Brunch"), None);
    }

    #[test]
    fn meal_period_rank_orders_day() {
        assert!(MealPeriod::Breakfast.rank() < MealPeriod::Lunch.rank());
        assert!(MealPeriod::Lunch.rank() < MealPeriod::Dinner.rank());
    }
}
