//! Wire types for the cafeteria service.
//!
//! Field names must match the service's JSON exactly: the menu payload is
//! camelCase, the recommendation request/response are snake_case. Keep serde
//! attributes in sync with the service; nothing here is for local use only.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ============================================================================
// Menu Payload
// ============================================================================

/// One category of the current menu, `GET /api/request_current_menu`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategoryPayload {
    pub category: String,
    pub items: Vec<ItemPayload>,
}

/// A food item within a category. `url` is a server-relative image path.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPayload {
    pub food_id: i64,
    pub name: String,
    pub url: String,
    pub variants: Vec<VariantPayload>,
}

/// A size/option of an item. Nutrition figures arrive as floats; the domain
/// layer truncates them to whole numbers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantPayload {
    pub variant_name: String,
    pub variant_id: i64,
    pub price: i64,
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbohydrates: f64,
}

// ============================================================================
// Recommendation Request
// ============================================================================

/// Body of `POST /api/request_recommendation/`.
///
/// `bmr` always carries the user's custom value; the service consults it only
/// when `bmr_calculation_method` is `"custom"`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RecommendationQuery {
    pub gender: String,
    pub age: i64,
    pub height: i64,
    pub weight: i64,
    pub cart_items: Vec<i64>,
    pub bmr_calculation_method: String,
    pub bmr: i64,
    pub activity_level: String,
    pub food_preferences: String,
    pub food_allergies: String,
    pub additional_notes: String,
}

/// A thumbs-up/down on one previously recommended variant.
/// `rating` is `"like"`, `"dislike"`, or `"none"`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MealRating {
    pub variant_id: i64,
    pub rating: String,
}

/// Body of `POST /api/request_new_recommendation/`: the original query plus
/// the user's ratings of the first answer.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RevisionRequest {
    pub query: RecommendationQuery,
    pub ratings: Vec<MealRating>,
}

// ============================================================================
// Recommendation Response
// ============================================================================

/// Response of the recommendation endpoints.
///
/// `min_nutritions` pairs index-wise with `detail_nutritions` (a target
/// figure and the service's reasoning for it). `recommended_meals` holds
/// variant ids resolvable against the cached menu.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecommendationPayload {
    pub additional_notes: String,
    pub detail_nutritions: Vec<String>,
    pub min_nutritions: Vec<i64>,
    pub recommended_meal_detail: String,
    pub list_meals: Vec<String>,
    pub verbose_in_function: bool,
    pub recommended_meals: Vec<i64>,
    pub id: String,
}

// ============================================================================
// Menu Detection
// ============================================================================

/// Response of `POST /api/detect_and_set_current_menu/`: per-label detection
/// confidences from the OCR pass.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectPayload {
    pub response: HashMap<String, f64>,
}

// ============================================================================
// Tests
// ============================================================================
