//! Personal nutrition profile and settings state.
//!
//! Holds everything the recommendation query derives from the user: gender,
//! age, body measurements, how to compute the basal metabolic rate, activity
//! level, and free-text food preferences/allergies. The profile round-trips
//! to the `user_preferences` table as dotted `profile.*` keys.

use crate::api::RecommendationQuery;

// ============================================================================
// BMR Method
// ============================================================================

/// How the service should obtain the user's basal metabolic rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BmrMethod {
    /// Let the service assume its own default.
    #[default]
    Default,
    /// Compute from the personal info fields (Mifflin-St Jeor).
    FromProfile,
    /// Use the hand-entered `custom_bmr` value.
    Custom,
}

impl BmrMethod {
    /// Wire and storage name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::FromProfile => "personal_info",
            Self::Custom => "custom",
        }
    }

    pub fn from_str_name(s: &str) -> Option<Self> {
        match s {
            "default" => Some(Self::Default),
            "personal_info" => Some(Self::FromProfile),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }

    /// Settings-row label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Default => "Service default",
            Self::FromProfile => "From personal info",
            Self::Custom => "Custom value",
        }
    }

    /// Cycle for the settings row: Default → FromProfile → Custom → Default.
    pub fn next(self) -> Self {
        match self {
            Self::Default => Self::FromProfile,
            Self::FromProfile => Self::Custom,
            Self::Custom => Self::Default,
        }
    }
}

// ============================================================================
// Activity Level
// ============================================================================

/// Weekly exercise level, scaling the BMR into a daily energy target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivityLevel {
    Sedentary,
    Light,
    #[default]
    Moderate,
    Active,
    ExtraActive,
}

impl ActivityLevel {
    /// TDEE multiplier applied to the basal rate.
    pub fn multiplier(self) -> f64 {
        match self {
            Self::Sedentary => 1.2,
            Self::Light => 1.375,
            Self::Moderate => 1.55,
            Self::Active => 1.725,
            Self::ExtraActive => 1.9,
        }
    }

    /// Wire and storage name. "extra active" carries a space on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sedentary => "sedentary",
            Self::Light => "light",
            Self::Moderate => "moderate",
            Self::Active => "active",
            Self::ExtraActive => "extra active",
        }
    }

    pub fn from_str_name(s: &str) -> Option<Self> {
        match s {
            "sedentary" => Some(Self::Sedentary),
            "light" => Some(Self::Light),
            "moderate" => Some(Self::Moderate),
            "active" => Some(Self::Active),
            "extra active" => Some(Self::ExtraActive),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Sedentary => "Sedentary",
            Self::Light => "Light exercise",
            Self::Moderate => "Moderate exercise",
            Self::Active => "Active",
            Self::ExtraActive => "Extra active",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Sedentary => Self::Light,
            Self::Light => Self::Moderate,
            Self::Moderate => Self::Active,
            Self::Active => Self::ExtraActive,
            Self::ExtraActive => Self::Sedentary,
        }
    }
}

// ============================================================================
// Nutrition Profile
// ============================================================================

/// Preference keys for profile persistence (dotted, `profile.` namespace).
pub mod keys {
    pub const BMR_METHOD: &str = "profile.bmr_method";
    pub const CUSTOM_BMR: &str = "profile.custom_bmr";
    pub const IS_MALE: &str = "profile.is_male";
    pub const AGE: &str = "profile.age";
    pub const WEIGHT_KG: &str = "profile.weight_kg";
    pub const HEIGHT_CM: &str = "profile.height_cm";
    pub const ACTIVITY_LEVEL: &str = "profile.activity_level";
    pub const FOOD_PREFERENCES: &str = "profile.food_preferences";
    pub const FOOD_ALLERGIES: &str = "profile.food_allergies";
}

/// The user's nutrition settings, as edited on the Settings tab.
#[derive(Debug, Clone, PartialEq)]
pub struct NutritionProfile {
    pub bmr_method: BmrMethod,
    pub custom_bmr: i64,
    pub is_male: bool,
    pub age: i64,
    pub weight_kg: i64,
    pub height_cm: i64,
    pub activity_level: ActivityLevel,
    pub food_preferences: String,
    pub food_allergies: String,
}

impl Default for NutritionProfile {
    fn default() -> Self {
        Self {
            bmr_method: BmrMethod::Default,
            custom_bmr: 2000,
            is_male: true,
            age: 20,
            weight_kg: 60,
            height_cm: 170,
            activity_level: ActivityLevel::Moderate,
            food_preferences: String::new(),
            food_allergies: String::new(),
        }
    }
}

impl NutritionProfile {
    /// Basal metabolic rate from the personal info fields (Mifflin-St Jeor).
    pub fn resting_bmr(&self) -> f64 {
        let (w, h, a) = (
            self.weight_kg as f64,
            self.height_cm as f64,
            self.age as f64,
        );
        if self.is_male {
            10.0 * w + 6.25 * h - 5.0 * a + 5.0
        } else {
            10.0 * w + 6.25 * h - 5.0 * a - 161.0
        }
    }

    /// Daily energy target: resting rate scaled by activity, truncated to
    /// whole kilocalories.
    pub fn daily_energy(&self) -> i64 {
        (self.resting_bmr() * self.activity_level.multiplier()).trunc() as i64
    }

    /// The energy figure the Settings and Recommend tabs display for the
    /// selected method.
    pub fn energy_summary(&self) -> i64 {
        match self.bmr_method {
            BmrMethod::Custom => self.custom_bmr,
            _ => self.daily_energy(),
        }
    }

    /// Assemble the wire query for a recommendation request.
    ///
    /// The custom BMR value rides along regardless of method; the service
    /// consults it only when `bmr_calculation_method` is "custom".
    pub fn recommendation_query(&self, cart_items: Vec<i64>, notes: &str) -> RecommendationQuery {
        RecommendationQuery {
            gender: if self.is_male { "male" } else { "female" }.to_string(),
            age: self.age,
            height: self.height_cm,
            weight: self.weight_kg,
            cart_items,
            bmr_calculation_method: self.bmr_method.as_str().to_string(),
            bmr: self.custom_bmr,
            activity_level: self.activity_level.as_str().to_string(),
            food_preferences: self.food_preferences.clone(),
            food_allergies: self.food_allergies.clone(),
            additional_notes: notes.to_string(),
        }
    }

    /// Flatten to `(key, value)` pairs for the preference store.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            (keys::BMR_METHOD, self.bmr_method.as_str().to_string()),
            (keys::CUSTOM_BMR, self.custom_bmr.to_string()),
            (keys::IS_MALE, self.is_male.to_string()),
            (keys::AGE, self.age.to_string()),
            (keys::WEIGHT_KG, self.weight_kg.to_string()),
            (keys::HEIGHT_CM, self.height_cm.to_string()),
            (
                keys::ACTIVITY_LEVEL,
                self.activity_level.as_str().to_string(),
            ),
            (keys::FOOD_PREFERENCES, self.food_preferences.clone()),
            (keys::FOOD_ALLERGIES, self.food_allergies.clone()),
        ]
    }

    /// Rebuild from the preference store. Missing or unparseable keys keep
    /// their defaults, so a fresh database yields `Self::default()`.
    pub fn from_lookup<'a, F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        let defaults = Self::default();
        Self {
            bmr_method: get(keys::BMR_METHOD)
                .and_then(BmrMethod::from_str_name)
                .unwrap_or(defaults.bmr_method),
            custom_bmr: get(keys::CUSTOM_BMR)
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.custom_bmr),
            is_male: get(keys::IS_MALE)
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.is_male),
            age: get(keys::AGE)
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.age),
            weight_kg: get(keys::WEIGHT_KG)
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.weight_kg),
            height_cm: get(keys::HEIGHT_CM)
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.height_cm),
            activity_level: get(keys::ACTIVITY_LEVEL)
                .and_then(ActivityLevel::from_str_name)
                .unwrap_or(defaults.activity_level),
            food_preferences: get(keys::FOOD_PREFERENCES)
                .unwrap_or(&defaults.food_preferences)
                .to_string(),
            food_allergies: get(keys::FOOD_ALLERGIES)
                .unwrap_or(&defaults.food_allergies)
                .to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
