use chrono::{DateTime, Utc};

use crate::error::CoreResult;
use crate::models::RewardWinnerRow;

use super::Store;

#[derive(Debug)]
pub enum SelectOutcome {
    Selected { amount: i64 },
    AlreadyDecided { status: String },
    Cooldown,
    NoActivity,
    NotSelected,
}

impl Store {
    /// Runs the full selection procedure of §4.8 inside one transaction: a
    /// row lock on `participant_stats` is the serialization point for the
    /// cooldown/already-decided checks, and the `reward_winners` UNIQUE
    /// constraint is the serialization point for the actual payout (the
    /// exactly-once guarantee under concurrency holds even if two callers
    /// both read a stale "not yet decided" state and both pass `won_flip`).
    pub async fn reward_select(
        &self,
        participant_fk: i64,
        amount: i64,
        cooldown_secs: i64,
        won_flip: bool,
    ) -> CoreResult<SelectOutcome> {
        let mut tx = self.pool().begin().await?;

        let stats: Option<(Option<DateTime<Utc>>,)> = sqlx::query_as(
            "SELECT last_reward_attempt_at FROM participant_stats WHERE participant_fk = $1 FOR UPDATE",
        )
        .bind(participant_fk)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((last_attempt,)) = stats else {
            tx.commit().await?;
            return Ok(SelectOutcome::NoActivity);
        };

        if let Some(existing) = sqlx::query_as::<_, (String,)>(
            "SELECT status FROM reward_winners WHERE participant_fk = $1",
        )
        .bind(participant_fk)
        .fetch_optional(&mut *tx)
        .await?
        {
            tx.commit().await?;
            return Ok(SelectOutcome::AlreadyDecided { status: existing.0 });
        }

        if let Some(last_attempt) = last_attempt {
            let elapsed = (Utc::now() - last_attempt).num_seconds();
            if elapsed < cooldown_secs {
                tx.commit().await?;
                return Ok(SelectOutcome::Cooldown);
            }
        }

        sqlx::query("UPDATE participant_stats SET last_reward_attempt_at = now() WHERE participant_fk = $1")
            .bind(participant_fk)
            .execute(&mut *tx)
            .await?;

        if !won_flip {
            tx.commit().await?;
            return Ok(SelectOutcome::NotSelected);
        }

        let inserted: Option<(i64,)> = sqlx::query_as(
            r#"
            INSERT INTO reward_winners (participant_fk, amount) VALUES ($1, $2)
            ON CONFLICT (participant_fk) DO NOTHING
            RETURNING amount
            "#,
        )
        .bind(participant_fk)
        .bind(amount)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        match inserted {
            Some((amount,)) => Ok(SelectOutcome::Selected { amount }),
            None => Ok(SelectOutcome::AlreadyDecided { status: "pending".to_string() }),
        }
    }

    pub async fn get_reward_winner(&self, participant_fk: i64) -> CoreResult<Option<RewardWinnerRow>> {
        let row = sqlx::query_as::<_, RewardWinnerRow>(
            "SELECT participant_fk, amount, status, selected_at, paid_at FROM reward_winners WHERE participant_fk = $1",
        )
        .bind(participant_fk)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }
}
