//! Reward service (SPEC_FULL.md §4.8, component C8).

use rand::Rng;

use crate::db::SelectOutcome;
use crate::error::{CoreError, CoreResult};
use crate::models::{AuditEvent, RewardSelectResponse, RewardStateResponse};
use crate::Core;

const BASE_PROBABILITY: f64 = 0.05;
const PRIORITY_BONUS_PROBABILITY: f64 = 0.10;

pub async fn get_state(core: &Core, business_id: &str) -> CoreResult<RewardStateResponse> {
    let participant = core
        .store()
        .get_participant_row(business_id)
        .await?
        .ok_or(CoreError::NotFound("participant"))?;

    let stats = core.store().get_participant_stats(participant.id).await?;
    let winner = core.store().get_reward_winner(participant.id).await?;

    Ok(RewardStateResponse {
        is_winner: winner.is_some(),
        reward_amount: winner.as_ref().map(|w| w.amount),
        status: winner.map(|w| w.status),
        total_words: stats.as_ref().map(|s| s.total_words).unwrap_or(0),
        survey_rounds: stats.as_ref().map(|s| s.survey_rounds).unwrap_or(0),
        priority_eligible: stats.as_ref().map(|s| s.priority_eligible).unwrap_or(false),
        last_reward_attempt_at: stats.and_then(|s| s.last_reward_attempt_at),
    })
}

/// Runs the probabilistic selection procedure (§4.8). The coin flip happens
/// here, in the caller's process; [`crate::db::Store::reward_select`] only
/// decides whether this caller's flip is the one that gets recorded.
pub async fn select(core: &Core, business_id: &str) -> CoreResult<RewardSelectResponse> {
    let participant = core
        .store()
        .get_participant_row(business_id)
        .await?
        .ok_or(CoreError::NotFound("participant"))?;

    let stats = core.store().get_participant_stats(participant.id).await?;
    let priority_eligible = stats.map(|s| s.priority_eligible).unwrap_or(false);
    let probability = BASE_PROBABILITY + if priority_eligible { PRIORITY_BONUS_PROBABILITY } else { 0.0 };
    let won_flip = core.rng().lock().expect("rng mutex poisoned").gen_bool(probability);

    let outcome = core
        .store()
        .reward_select(
            participant.id,
            core.config().reward_amount,
            core.config().reward_cooldown.as_secs() as i64,
            won_flip,
        )
        .await?;

    let (event_type, details) = match &outcome {
        SelectOutcome::Selected { amount } => ("reward_selected".to_string(), Some(amount.to_string())),
        SelectOutcome::AlreadyDecided { status } => ("reward_skipped".to_string(), Some(format!("already_decided:{status}"))),
        SelectOutcome::Cooldown => ("reward_skipped".to_string(), Some("cooldown".to_string())),
        SelectOutcome::NoActivity => ("reward_skipped".to_string(), Some("no_activity".to_string())),
        SelectOutcome::NotSelected => ("reward_skipped".to_string(), Some("not_selected".to_string())),
    };
    core.store()
        .append_audit(&AuditEvent {
            event_type,
            participant_fk: Some(participant.id),
            endpoint: "/api/reward/select".to_string(),
            method: "POST".to_string(),
            status_code: 200,
            ip_hash: String::new(),
            user_agent: String::new(),
            details,
        })
        .await;

    Ok(match outcome {
        SelectOutcome::Selected { amount } => RewardSelectResponse::selected(amount),
        SelectOutcome::AlreadyDecided { .. } => RewardSelectResponse::not_selected("already_decided"),
        SelectOutcome::Cooldown => RewardSelectResponse::not_selected("cooldown"),
        SelectOutcome::NoActivity => RewardSelectResponse::not_selected("no_activity"),
        SelectOutcome::NotSelected => RewardSelectResponse::not_selected("not_selected"),
    })
}
