//! Grouping of the eating history for display.
//!
//! The store returns a flat, newest-first list of history rows joined with
//! their cached food details. The History tab wants them bucketed by day and
//! meal period:
//!
//! 1. group rows by local calendar date, key `YYYY/MM/DD`
//! 2. within a day, group by meal period, ordered Breakfast, Lunch, Dinner
//!    (labels the current build does not know sort last)
//! 3. within a meal group, rows sort newest first
//! 4. days sort newest first

use chrono::{Datelike, TimeZone};

use crate::menu::MealPeriod;
use crate::storage::HistoryWithFood;

// ============================================================================
// Group Types
// ============================================================================

/// One calendar day of history.
#[derive(Debug)]
pub struct HistoryDay {
    /// Display key, `YYYY/MM/DD` in the grouping timezone.
    pub date_key: String,
    pub meals: Vec<HistoryMealGroup>,
}

impl HistoryDay {
    /// Total rows across the day's meal groups.
    pub fn len(&self) -> usize {
        self.meals.iter().map(|m| m.entries.len()).sum()
    }
}

/// One meal period within a day.
#[derive(Debug)]
pub struct HistoryMealGroup {
    /// Persisted label, e.g. "Breakfast".
    pub label: String,
    pub entries: Vec<HistoryWithFood>,
}

// ============================================================================
// Grouping
// ============================================================================

/// Bucket joined history rows into day and meal-period groups.
///
/// `tz` fixes which wall clock the day boundaries follow; the app passes
/// `chrono::Local`, tests pass `Utc` or a fixed offset. Rows whose
/// timestamps fall outside chrono's representable range are dropped.
pub fn group_history<Tz: TimeZone>(rows: Vec<HistoryWithFood>, tz: &Tz) -> Vec<HistoryDay> {
    // (day ordinal, date_key, [(meal rank, label, rows)])
    let mut days: Vec<(i32, String, Vec<(u8, String, Vec<HistoryWithFood>)>)> = Vec::new();

    for row in rows {
        let Some(local) = tz.timestamp_millis_opt(row.record.timestamp).single() else {
            continue;
        };
        let date = local.date_naive();
        let date_key = date.format("%Y/%m/%d").to_string();
        let ordinal = date.num_days_from_ce();
        let rank = MealPeriod::from_label(&row.record.meal_option)
            .map(MealPeriod::rank)
            .unwrap_or(3);

        let day_idx = match days.iter().position(|(_, key, _)| *key == date_key) {
            Some(i) => i,
            None => {
                days.push((ordinal, date_key, Vec::new()));
                days.len() - 1
            }
        };
        let meals = &mut days[day_idx].2;

        let meal_idx = match meals
            .iter()
            .position(|(_, label, _)| *label == *row.record.meal_option)
        {
            Some(i) => i,
            None => {
                meals.push((rank, row.record.meal_option.to_string(), Vec::new()));
                meals.len() - 1
            }
        };
        meals[meal_idx].2.push(row);
    }

    // Newest day first
    days.sort_by(|a, b| b.0.cmp(&a.0));

    days.into_iter()
        .map(|(_, date_key, mut meals)| {
            meals.sort_by_key(|(rank, _, _)| *rank);
            HistoryDay {
                date_key,
                meals: meals
                    .into_iter()
                    .map(|(_, label, mut entries)| {
                        entries.sort_by(|a, b| b.record.timestamp.cmp(&a.record.timestamp));
                        HistoryMealGroup { label, entries }
                    })
                    .collect(),
            }
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FoodRecord, HistoryRecord};
    use chrono::Utc;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn row(id: i64, timestamp: i64, meal: &str) -> HistoryWithFood {
        HistoryWithFood {
            record: HistoryRecord {
                id,
                timestamp,
                variant_id: 100 + id,
                meal_option: Arc::from(meal),
            },
            food: None,
        }
    }

    fn row_with_food(id: i64, timestamp: i64, meal: &str, name: &str) -> HistoryWithFood {
        HistoryWithFood {
            food: Some(FoodRecord {
                variant_id: 100 + id,
                food_id: 1,
                variant_name: Arc::from("M"),
                food_name: Arc::from(name),
                price: 600,
                calories: 600,
                protein: 30,
                fat: 25,
                carbohydrates: 60,
                category: Arc::from("Burgers"),
                image_url: Arc::from("url"),
                order_index: 0,
            }),
            ..row(id, timestamp, meal)
        }
    }

    // Millis for 2024-03-<day> at <hour>:00 UTC
    fn ts(day: i64, hour: i64) -> i64 {
        // 2024-03-01T00:00:00Z
        let base = 1_709_251_200_000;
        base + (day - 1) * 86_400_000 + hour * 3_600_000
    }

    #[test]
    fn groups_by_day_newest_first() {
        let rows = vec![
            row(1, ts(1, 8), "Breakfast"),
            row(2, ts(3, 12), "Lunch"),
            row(3, ts(2, 19), "Dinner"),
        ];
        let days = group_history(rows, &Utc);
        assert_eq!(days.len(), 3);
        assert_eq!(days[0].date_key, "2024/03/03");
        assert_eq!(days[1].date_key, "2024/03/02");
        assert_eq!(days[2].date_key, "2024/03/01");
    }

    #[test]
    fn meal_groups_order_breakfast_lunch_dinner() {
        // Insert out of order within one day
        let rows = vec![
            row(1, ts(1, 19), "Dinner"),
            row(2, ts(1, 8), "Breakfast"),
            row(3, ts(1, 12), "Lunch"),
        ];
        let days = group_history(rows, &Utc);
        assert_eq!(days.len(), 1);
        let labels: Vec<&str> = days[0].meals.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["Breakfast", "Lunch", "Dinner"]);
    }

    #[test]
    fn unknown_meal_option_sorts_last() {
        let rows = vec![
            row(1, ts(1, 15), "Brunch"),
            row(2, ts(1, 8), "Breakfast"),
        ];
        let days = group_history(rows, &Utc);
        let labels: Vec<&str> = days[0].meals.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["Breakfast", "Brunch"]);
    }

    #[test]
    fn entries_within_meal_sort_newest_first() {
        let rows = vec![
            row(1, ts(1, 7), "Breakfast"),
            row(2, ts(1, 9), "Breakfast"),
            row(3, ts(1, 8), "Breakfast"),
        ];
        let days = group_history(rows, &Utc);
        let stamps: Vec<i64> = days[0].meals[0]
            .entries
            .iter()
            .map(|e| e.record.timestamp)
            .collect();
        assert_eq!(stamps, vec![ts(1, 9), ts(1, 8), ts(1, 7)]);
    }

    #[test]
    fn joined_food_survives_grouping() {
        let rows = vec![row_with_food(1, ts(1, 8), "Breakfast", "Sample Burger")];
        let days = group_history(rows, &Utc);
        let entry = &days[0].meals[0].entries[0];
        assert_eq!(
            entry.food.as_ref().map(|f| &*f.food_name),
            Some("Sample Burger")
        );
    }

    #[test]
    fn empty_input_yields_no_days() {
        let days = group_history(Vec::new(), &Utc);
        assert!(days.is_empty());
    }

    #[test]
    fn day_len_counts_all_meals() {
        let rows = vec![
            row(1, ts(1, 8), "Breakfast"),
            row(2, ts(1, 12), "Lunch"),
            row(3, ts(1, 12), "Lunch"),
        ];
        let days = group_history(rows, &Utc);
        assert_eq!(days[0].len(), 3);
    }

    fn meal_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("Breakfast".to_string()),
            Just("Lunch".to_string()),
            Just("Dinner".to_string()),
            Just("Snack".to_string()),
        ]
    }

    proptest! {
        #[test]
        fn grouping_partitions_and_orders(
            specs in prop::collection::vec((0i64..6, 0i64..24, meal_strategy()), 0..60)
        ) {
            let rows: Vec<HistoryWithFood> = specs
                .iter()
                .enumerate()
                .map(|(i, (day, hour, meal))| row(i as i64, ts(day + 1, *hour), meal))
                .collect();
            let total = rows.len();

            let days = group_history(rows, &Utc);

            // Partition completeness: every row lands in exactly one group
            let mut seen: Vec<i64> = days
                .iter()
                .flat_map(|d| d.meals.iter())
                .flat_map(|m| m.entries.iter())
                .map(|e| e.record.id)
                .collect();
            prop_assert_eq!(seen.len(), total);
            seen.sort_unstable();
            seen.dedup();
            prop_assert_eq!(seen.len(), total);

            // Days strictly descending by key (zero-padded keys compare as dates)
            for pair in days.windows(2) {
                prop_assert!(pair[0].date_key > pair[1].date_key);
            }

            for day in &days {
                // Meal ranks non-decreasing, one group per label
                let ranks: Vec<u8> = day
                    .meals
                    .iter()
                    .map(|m| {
                        MealPeriod::from_label(&m.label)
                            .map(MealPeriod::rank)
                            .unwrap_or(3)
                    })
                    .collect();
                for pair in ranks.windows(2) {
                    prop_assert!(pair[0] <= pair[1]);
                }
                let mut labels: Vec<&str> = day.meals.iter().map(|m| m.label.as_str()).collect();
                labels.sort_unstable();
                let before = labels.len();
                labels.dedup();
                prop_assert_eq!(labels.len(), before);

                // Entries newest first within each meal
                for meal in &day.meals {
                    for pair in meal.entries.windows(2) {
                        prop_assert!(pair[0].record.timestamp >= pair[1].record.timestamp);
                    }
                }
            }
        }
    }
}
