use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};

use super::Store;

impl Store {
    /// Inserts a consent history row and mirrors the latest state onto the
    /// participant in the same transaction (§4.1, §5 "Consent mirrors the
    /// latest insert because the mirroring happens in the same transaction
    /// as the insert").
    pub async fn record_consent(
        &self,
        business_id: &str,
        consent_given: bool,
        ip_hash: &str,
        user_agent: &str,
    ) -> CoreResult<DateTime<Utc>> {
        let mut tx = self.pool().begin().await?;

        let participant_fk: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM participants WHERE participant_id = $1")
                .bind(business_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((participant_fk,)) = participant_fk else {
            return Err(CoreError::NotFound("participant"));
        };

        sqlx::query(
            "INSERT INTO consent_records (participant_fk, consent_given, ip_hash, user_agent) VALUES ($1, $2, $3, $4)",
        )
        .bind(participant_fk)
        .bind(consent_given)
        .bind(ip_hash)
        .bind(user_agent)
        .execute(&mut *tx)
        .await?;

        let (timestamp,): (DateTime<Utc>,) = sqlx::query_as(
            r#"
            UPDATE participants
            SET consent_given = $2, consent_timestamp = now()
            WHERE id = $1
            RETURNING consent_timestamp
            "#,
        )
        .bind(participant_fk)
        .bind(consent_given)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(timestamp)
    }

    /// `None` means the participant itself doesn't exist; `Some((given, ts))`
    /// is returned whenever the participant row exists, even if consent has
    /// never been recorded (`given = false`, `ts = None`) — a never-consented
    /// participant is a 403 `ConsentRequired`, not a 404 (§4.7 precondition 2).
    pub async fn latest_consent(&self, business_id: &str) -> CoreResult<Option<(bool, Option<DateTime<Utc>>)>> {
        let row: Option<(bool, Option<DateTime<Utc>>)> = sqlx::query_as(
            "SELECT consent_given, consent_timestamp FROM participants WHERE participant_id = $1",
        )
        .bind(business_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row)
    }
}
