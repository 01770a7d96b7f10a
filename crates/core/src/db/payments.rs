use crate::error::{CoreError, CoreResult};
use crate::identity::new_id;

use super::Store;

pub enum ConfirmOutcome {
    Confirmed,
    AlreadyConfirmed,
}

impl Store {
    pub async fn create_payment_order(
        &self,
        business_id: &str,
        amount: i64,
        currency: &str,
    ) -> CoreResult<String> {
        let participant_fk: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM participants WHERE participant_id = $1")
                .bind(business_id)
                .fetch_optional(self.pool())
                .await?;
        let Some((participant_fk,)) = participant_fk else {
            return Err(CoreError::NotFound("participant"));
        };

        let order_id = new_id();
        sqlx::query(
            "INSERT INTO payments (participant_fk, order_id, amount, currency) VALUES ($1, $2, $3, $4)",
        )
        .bind(participant_fk)
        .bind(&order_id)
        .bind(amount)
        .bind(currency)
        .execute(self.pool())
        .await?;

        Ok(order_id)
    }

    pub async fn confirm_payment(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> CoreResult<ConfirmOutcome> {
        let mut tx = self.pool().begin().await?;

        let existing: Option<(i64, String)> =
            sqlx::query_as("SELECT participant_fk, status FROM payments WHERE order_id = $1")
                .bind(order_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((participant_fk, status)) = existing else {
            return Err(CoreError::NotFound("payment order"));
        };
        if status == "paid" {
            return Ok(ConfirmOutcome::AlreadyConfirmed);
        }

        sqlx::query(
            r#"
            UPDATE payments
            SET status = 'paid', payment_id = $2, signature = $3, confirmed_at = now()
            WHERE order_id = $1
            "#,
        )
        .bind(order_id)
        .bind(payment_id)
        .bind(signature)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE participants SET payment_status = 'paid' WHERE id = $1")
            .bind(participant_fk)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(ConfirmOutcome::Confirmed)
    }

    pub async fn has_paid_payment(&self, business_id: &str) -> CoreResult<bool> {
        let row: Option<(i64,)> = sqlx::query_as(
            r#"
            SELECT 1 FROM payments p
            JOIN participants pt ON pt.id = p.participant_fk
            WHERE pt.participant_id = $1 AND p.status = 'paid'
            LIMIT 1
            "#,
        )
        .bind(business_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.is_some())
    }
}
