use anyhow::Result;
use sqlx::QueryBuilder;
use std::sync::Arc;

use super::schema::Database;
use super::types::{FoodRecord, HistoryRecord, HistoryWithFood};

/// Joined row for the history view (used by sqlx FromRow). Food columns are
/// nullable because the LEFT JOIN misses variants that have dropped out of
/// the menu cache.
#[derive(sqlx::FromRow)]
struct HistoryJoinRow {
    id: i64,
    timestamp: i64,
    variant_id: i64,
    meal_option: String,
    food_variant_id: Option<i64>,
    food_id: Option<i64>,
    variant_name: Option<String>,
    food_name: Option<String>,
    price: Option<i64>,
    calories: Option<i64>,
    protein: Option<i64>,
    fat: Option<i64>,
    carbohydrates: Option<i64>,
    category: Option<String>,
    image_url: Option<String>,
    order_index: Option<i64>,
}

impl HistoryJoinRow {
    fn into_history(self) -> HistoryWithFood {
        let food = (|| {
            Some(FoodRecord {
                variant_id: self.food_variant_id?,
                food_id: self.food_id?,
                variant_name: Arc::from(self.variant_name?),
                food_name: Arc::from(self.food_name?),
                price: self.price?,
                calories: self.calories?,
                protein: self.protein?,
                fat: self.fat?,
                carbohydrates: self.carbohydrates?,
                category: Arc::from(self.category?),
                image_url: Arc::from(self.image_url?),
                order_index: self.order_index?,
            })
        })();

        HistoryWithFood {
            record: HistoryRecord {
                id: self.id,
                timestamp: self.timestamp,
                variant_id: self.variant_id,
                meal_option: Arc::from(self.meal_option),
            },
            food,
        }
    }
}

impl Database {
    // ========================================================================
    // Meal History Operations
    // ========================================================================

    /// Record a saved meal: one history row per cart variant, all stamped
    /// with the same timestamp and meal label so they group as one sitting.
    pub async fn insert_meal_entries(
        &self,
        variant_ids: &[i64],
        timestamp: i64,
        meal_option: &str,
    ) -> Result<()> {
        if variant_ids.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("INSERT INTO food_history (timestamp, variant_id, meal_option) ");
        builder.push_values(variant_ids, |mut b, variant_id| {
            b.push_bind(timestamp)
                .push_bind(*variant_id)
                .push_bind(meal_option);
        });
        builder.build().execute(&self.pool).await?;
        Ok(())
    }

    /// All history entries newest-first, each joined with its cached food
    /// row when the variant is still in the cache.
    pub async fn history_with_food(&self) -> Result<Vec<HistoryWithFood>> {
        let rows: Vec<HistoryJoinRow> = sqlx::query_as(
            r#"
                SELECT
                    h.id, h.timestamp, h.variant_id, h.meal_option,
                    f.variant_id AS food_variant_id, f.food_id, f.variant_name,
                    f.food_name, f.price, f.calories, f.protein, f.fat,
                    f.carbohydrates, f.category, f.image_url, f.order_index
                FROM food_history h
                LEFT JOIN food f ON h.variant_id = f.variant_id
                ORDER BY h.timestamp DESC, h.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(HistoryJoinRow::into_history).collect())
    }

    /// Delete all history entries. Returns the number of rows removed.
    pub async fn clear_history(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM food_history")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
