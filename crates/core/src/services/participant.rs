//! Participant & consent service (SPEC_FULL.md §4.5, component C5).

use crate::db::CreateOutcome;
use crate::error::{CoreError, CoreResult};
use crate::identity::{hash_ip, truncate_ua};
use crate::models::{
    ConsentRequest, ConsentResponse, ConsentStateResponse, Demographics, ParticipantPublic,
    ParticipantRow, RegisterParticipantRequest, RegisterParticipantResponse,
};
use crate::validation;
use crate::Core;

/// Registers a participant, or — if the business id is already taken —
/// treats an identical re-submission as idempotent and a diverging one as a
/// conflict (§4.5, §8 "Idempotent registration").
pub async fn register(
    core: &Core,
    req: RegisterParticipantRequest,
    raw_ip: &str,
    raw_user_agent: &str,
) -> CoreResult<RegisterParticipantResponse> {
    let demographics = validation::validate_registration(req)?;
    let ip_hash = hash_ip(raw_ip, &core.config().ip_hash_salt);
    let user_agent = truncate_ua(raw_user_agent);

    let outcome = core.store().create_participant(&demographics, &ip_hash, &user_agent).await?;

    let row = match outcome {
        CreateOutcome::Created(row) => row,
        CreateOutcome::AlreadyExists(row) => {
            if !matches_demographics(&row, &demographics) {
                return Err(CoreError::conflict(
                    "participant_id already registered with different details",
                ));
            }
            row
        }
    };

    Ok(RegisterParticipantResponse { status: "success", participant_id: row.participant_id })
}

fn matches_demographics(row: &ParticipantRow, demographics: &Demographics) -> bool {
    row.session_id == demographics.session_id
        && row.username == demographics.username
        && row.email == demographics.email
        && row.phone == demographics.phone
        && row.gender == demographics.gender
        && row.age == demographics.age
        && row.place == demographics.place
        && row.native_language == demographics.native_language
        && row.prior_experience == demographics.prior_experience
}

pub async fn get_public(core: &Core, business_id: &str) -> CoreResult<ParticipantPublic> {
    core.store().get_participant_public(business_id).await?.ok_or(CoreError::NotFound("participant"))
}

/// Records consent; withdrawing consent is a normal write, not an error
/// (§4.5 — the *next* submission is what gets refused).
pub async fn record_consent(
    core: &Core,
    req: ConsentRequest,
    raw_ip: &str,
    raw_user_agent: &str,
) -> CoreResult<ConsentResponse> {
    let ip_hash = hash_ip(raw_ip, &core.config().ip_hash_salt);
    let user_agent = truncate_ua(raw_user_agent);
    core.store().record_consent(&req.participant_id, req.consent_given, &ip_hash, &user_agent).await?;
    Ok(ConsentResponse { status: "success" })
}

pub async fn get_consent_state(core: &Core, business_id: &str) -> CoreResult<ConsentStateResponse> {
    match core.store().latest_consent(business_id).await? {
        Some((consent_given, consent_timestamp)) => Ok(ConsentStateResponse { consent_given, consent_timestamp }),
        None => Err(CoreError::NotFound("participant")),
    }
}
