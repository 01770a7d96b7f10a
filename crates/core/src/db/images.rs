use crate::error::CoreResult;
use crate::models::ImageRow;

use super::Store;

impl Store {
    /// Picks a uniformly random image excluding `exclude_image_ids`. The
    /// caller (C6) handles resetting exclusion when the catalog is
    /// exhausted; this just reports `None` when nothing matches.
    pub async fn pick_random_image(&self, exclude_image_ids: &[String]) -> CoreResult<Option<ImageRow>> {
        let row = sqlx::query_as::<_, ImageRow>(
            r#"
            SELECT id, image_id, image_url, width, height, object_count, difficulty
            FROM images
            WHERE NOT (image_id = ANY($1))
            ORDER BY random()
            LIMIT 1
            "#,
        )
        .bind(exclude_image_ids)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    pub async fn count_images(&self) -> CoreResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM images").fetch_one(self.pool()).await?;
        Ok(count)
    }

    pub async fn get_image_by_business_id(&self, image_id: &str) -> CoreResult<Option<ImageRow>> {
        let row = sqlx::query_as::<_, ImageRow>(
            "SELECT id, image_id, image_url, width, height, object_count, difficulty FROM images WHERE image_id = $1",
        )
        .bind(image_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    /// Inserts the catalog row if it doesn't already exist (§4.6 "Unknown-image
    /// policy"), returning the surrogate key either way.
    pub async fn ensure_image_exists(&self, image_id: &str, image_url: &str) -> CoreResult<i64> {
        let (fk,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO images (image_id, image_url) VALUES ($1, $2)
            ON CONFLICT (image_id) DO UPDATE SET image_id = EXCLUDED.image_id
            RETURNING id
            "#,
        )
        .bind(image_id)
        .bind(image_url)
        .fetch_one(self.pool())
        .await?;
        Ok(fk)
    }

    /// The expected keyword for an active attention check on this image, if
    /// any (§3 "Attention check").
    pub async fn attention_expected_keyword(&self, image_fk: i64) -> CoreResult<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT expected_keyword FROM attention_checks WHERE image_fk = $1 AND is_active = true LIMIT 1",
        )
        .bind(image_fk)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(|(kw,)| kw))
    }
}
