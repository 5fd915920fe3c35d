//! Canned sample data matching the service's JSON shapes.
//!
//! Offline mode browses [`sample_menu`] when nothing is cached; the HTTP
//! client tests and the integration tests build on the same fixtures. The
//! advice text and nutrition breakdowns are captured from real service
//! responses.

use std::collections::HashMap;

use crate::api::types::{
    CategoryPayload, DetectPayload, ItemPayload, RecommendationPayload, VariantPayload,
};

fn burger_variant(
    name: &str,
    variant_id: i64,
    price: i64,
    nutrition: [f64; 4],
) -> VariantPayload {
    let [calories, protein, fat, carbohydrates] = nutrition;
    VariantPayload {
        variant_name: name.to_string(),
        variant_id,
        price,
        calories,
        protein,
        fat,
        carbohydrates,
    }
}

/// A two-category menu with distinct variant ids, so it can round-trip
/// through the local cache.
pub fn sample_menu() -> Vec<CategoryPayload> {
    vec![
        CategoryPayload {
            category: "Burgers".to_string(),
            items: vec![ItemPayload {
                food_id: 1,
                name: "Sample Burger".to_string(),
                url: "/images/sample_burger.png".to_string(),
                variants: vec![
                    burger_variant("S", 101, 500, [500.0, 25.0, 20.0, 50.0]),
                    burger_variant("M", 102, 600, [600.0, 30.0, 25.0, 60.0]),
                    burger_variant("L", 103, 700, [700.0, 35.0, 30.0, 70.0]),
                ],
            }],
        },
        CategoryPayload {
            category: "Drinks".to_string(),
            items: vec![
                ItemPayload {
                    food_id: 2,
                    name: "Sample Coffee".to_string(),
                    url: "/images/sample_coffee.png".to_string(),
                    variants: vec![
                        VariantPayload {
                            variant_name: "S".to_string(),
                            variant_id: 201,
                            price: 200,
                            calories: 30.0,
                            protein: 1.5,
                            fat: 0.5,
                            carbohydrates: 5.0,
                        },
                        VariantPayload {
                            variant_name: "M".to_string(),
                            variant_id: 202,
                            price: 250,
                            calories: 45.0,
                            protein: 2.0,
                            fat: 1.0,
                            carbohydrates: 8.0,
                        },
                    ],
                },
                ItemPayload {
                    food_id: 3,
                    name: "Sample Juice".to_string(),
                    url: "/images/sample_juice.png".to_string(),
                    variants: vec![VariantPayload {
                        variant_name: "S".to_string(),
                        variant_id: 301,
                        price: 180,
                        calories: 90.0,
                        protein: 0.5,
                        fat: 0.0,
                        carbohydrates: 22.0,
                    }],
                },
            ],
        },
    ]
}

/// The canned advice text paired with an arbitrary meal list.
pub fn canned_payload(recommended_meals: Vec<i64>) -> RecommendationPayload {
    RecommendationPayload {
        additional_notes: "24 years old, 50 kg, 165 cm, lactose intolerant.".to_string(),
        detail_nutritions: vec![
            "Minimum energy intake estimated with the Harris-Benedict equation for a sedentary lifestyle.".to_string(),
            "Minimum protein intake for adults is 0.8 grams per kilogram of body weight.".to_string(),
            "Recommended minimum fat intake is approximately 0.8-1.0 grams per kilogram of body weight.".to_string(),
            "A minimum carbohydrate intake of 130 grams per day supports basic metabolic functions.".to_string(),
            "Recommended minimum daily fiber intake is approximately 25 grams.".to_string(),
            "Adults aged 19-50 need 1000 mg of calcium daily to maintain bone health.".to_string(),
            "Minimum vegetable intake of 400 grams per day per general dietary guidelines.".to_string(),
        ],
        min_nutritions: vec![1320, 40, 40, 130, 25, 1000, 400],
        recommended_meal_detail: "Enjoy a balanced meal featuring \"Hamburger steak with grated \
            Japanese radish sauce\" and \"Rice (small)\". This combination provides approximately \
            460 kcal of energy, 17.6g of protein, and 15.2g of fat. Note that this meal is \
            somewhat low in fiber, calcium, and veggies compared to your targets."
            .to_string(),
        list_meals: vec![
            "hamburger steak with grated japanese radish sauce".to_string(),
            "rice (small)".to_string(),
        ],
        verbose_in_function: true,
        recommended_meals,
        id: "f64299e3-2985-44f6-a6ce-eedaec54c502".to_string(),
    }
}

/// Canned first recommendation: points at the small Sample Burger.
pub fn sample_recommendation() -> RecommendationPayload {
    canned_payload(vec![101])
}

/// Canned revised recommendation: swaps to the M and L variants.
pub fn sample_revision() -> RecommendationPayload {
    canned_payload(vec![102, 103])
}

/// Canned OCR detection result.
pub fn sample_detection() -> DetectPayload {
    let mut response = HashMap::new();
    response.insert("a".to_string(), 0.1);
    response.insert("b".to_string(), 0.2);
    DetectPayload { response }
}

#[cfg(test)]
pub fn sample_menu_json() -> String {
    serde_json::to_string(&sample_menu()).unwrap()
}

#[cfg(test)]
pub fn sample_recommendation_json() -> String {
    serde_json::to_string(&sample_recommendation()).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_menu_variant_ids_are_unique() {
        let menu = sample_menu();
        let mut ids: Vec<i64> = menu
            .iter()
            .flat_map(|c| c.items.iter())
            .flat_map(|i| i.variants.iter())
            .map(|v| v.variant_id)
            .collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn canned_recommendations_reference_sample_variants() {
        let menu = sample_menu();
        let ids: Vec<i64> = menu
            .iter()
            .flat_map(|c| c.items.iter())
            .flat_map(|i| i.variants.iter())
            .map(|v| v.variant_id)
            .collect();
        for id in sample_recommendation()
            .recommended_meals
            .iter()
            .chain(sample_revision().recommended_meals.iter())
        {
            assert!(ids.contains(id), "variant {} missing from sample menu", id);
        }
    }

    #[test]
    fn menu_json_round_trips() {
        let parsed: Vec<CategoryPayload> = serde_json::from_str(&sample_menu_json()).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].items[1].name, "Sample Juice");
    }
}
