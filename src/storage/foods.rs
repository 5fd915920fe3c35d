use anyhow::Result;
use sqlx::QueryBuilder;

use super::schema::Database;
use super::types::{FoodDbRow, FoodRecord, NewFoodRow};

const FOOD_COLUMNS: &str = "variant_id, food_id, variant_name, food_name, price, calories, \
     protein, fat, carbohydrates, category, image_url, order_index";

impl Database {
    // ========================================================================
    // Menu Cache Operations
    // ========================================================================

    /// Replace the cached menu wholesale with freshly fetched rows.
    ///
    /// Delete and insert run in one transaction: a failure partway leaves
    /// the previous menu intact rather than an empty cache. Batched in
    /// chunks of 50 rows (12 binds each) to stay under SQLite's bound
    /// variable limit. REPLACE keys on `variant_id`, so a payload that
    /// repeats a variant keeps its last row instead of aborting the
    /// refresh.
    pub async fn replace_menu(&self, rows: &[NewFoodRow]) -> Result<()> {
        const BATCH_SIZE: usize = 50;
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM food").execute(&mut *tx).await?;

        for chunk in rows.chunks(BATCH_SIZE) {
            let mut builder: QueryBuilder<sqlx::Sqlite> =
                QueryBuilder::new(format!("INSERT OR REPLACE INTO food ({}) ", FOOD_COLUMNS));

            builder.push_values(chunk, |mut b, row| {
                b.push_bind(row.variant_id)
                    .push_bind(row.food_id)
                    .push_bind(&row.variant_name)
                    .push_bind(&row.food_name)
                    .push_bind(row.price)
                    .push_bind(row.calories)
                    .push_bind(row.protein)
                    .push_bind(row.fat)
                    .push_bind(row.carbohydrates)
                    .push_bind(&row.category)
                    .push_bind(&row.image_url)
                    .push_bind(row.order_index);
            });

            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// All cached menu rows in service presentation order.
    pub async fn all_foods(&self) -> Result<Vec<FoodRecord>> {
        let rows: Vec<FoodDbRow> = sqlx::query_as(&format!(
            "SELECT {} FROM food ORDER BY order_index",
            FOOD_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(FoodDbRow::into_record).collect())
    }

    /// Look up a single cached variant.
    pub async fn food_by_variant(&self, variant_id: i64) -> Result<Option<FoodRecord>> {
        let row: Option<FoodDbRow> = sqlx::query_as(&format!(
            "SELECT {} FROM food WHERE variant_id = ?",
            FOOD_COLUMNS
        ))
        .bind(variant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(FoodDbRow::into_record))
    }

    /// Look up cached variants for a recommendation, preserving the order of
    /// `variant_ids`. Ids with no cached row are silently skipped; the
    /// caller decides how to show the gap.
    pub async fn foods_by_variants(&self, variant_ids: &[i64]) -> Result<Vec<FoodRecord>> {
        if variant_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM food WHERE variant_id IN (", FOOD_COLUMNS));
        let mut separated = builder.separated(", ");
        for id in variant_ids {
            separated.push_bind(*id);
        }
        builder.push(")");

        let rows: Vec<FoodDbRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        let mut records: Vec<FoodRecord> =
            rows.into_iter().map(FoodDbRow::into_record).collect();

        // IN returns arbitrary order; put results back in request order
        records.sort_by_key(|r| {
            variant_ids
                .iter()
                .position(|id| *id == r.variant_id)
                .unwrap_or(usize::MAX)
        });
        Ok(records)
    }

    /// Drop the cached menu, mirroring a server-side reset.
    pub async fn clear_menu(&self) -> Result<()> {
        sqlx::query("DELETE FROM food").execute(&self.pool).await?;
        Ok(())
    }
}
