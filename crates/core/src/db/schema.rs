//! Migrations (SPEC_FULL.md §4.1 "Migration", §3 "Schema metadata").
//!
//! Startup applies a numbered sequence of idempotent DDL statements and
//! records the resulting version in `schema_meta`. A stored version ahead of
//! what this binary knows about is refused rather than silently downgraded.

use sqlx::PgPool;
use tracing::{info, warn};

use crate::error::CoreResult;

/// Bump when a new migration step is appended. Never decreases.
pub const SCHEMA_VERSION: i32 = 1;

const MIGRATION_STEPS: &[&str] = &[STEP_1_CORE_TABLES, STEP_1_TRIGGERS, STEP_1_INDEXES];

pub async fn migrate(pool: &PgPool) -> CoreResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_meta (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    let stored: Option<(i32,)> = sqlx::query_as("SELECT version FROM schema_meta WHERE id = 1")
        .fetch_optional(pool)
        .await?;

    match stored {
        Some((version,)) if version > SCHEMA_VERSION => {
            return Err(crate::error::CoreError::ServiceUnavailable);
        }
        Some((version,)) if version == SCHEMA_VERSION => {
            info!(version, "schema already at target version");
            return Ok(());
        }
        _ => {}
    }

    for step in MIGRATION_STEPS {
        sqlx::query(step).execute(pool).await?;
    }

    sqlx::query(
        r#"
        INSERT INTO schema_meta (id, version, applied_at) VALUES (1, $1, now())
        ON CONFLICT (id) DO UPDATE SET version = EXCLUDED.version, applied_at = now()
        "#,
    )
    .bind(SCHEMA_VERSION)
    .execute(pool)
    .await?;

    warn!(version = SCHEMA_VERSION, "schema migrated");
    Ok(())
}

const STEP_1_CORE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS participants (
    id BIGSERIAL PRIMARY KEY,
    participant_id TEXT NOT NULL UNIQUE,
    session_id TEXT NOT NULL,
    username TEXT NOT NULL CHECK (char_length(username) BETWEEN 2 AND 100),
    email TEXT NOT NULL CHECK (email ~ '^[^\s@]+@[^\s@]+\.[^\s@]+$'),
    phone TEXT,
    gender TEXT,
    age INTEGER NOT NULL CHECK (age BETWEEN 1 AND 120),
    place TEXT,
    native_language TEXT,
    prior_experience TEXT,
    payment_status TEXT NOT NULL DEFAULT 'pending'
        CHECK (payment_status IN ('pending', 'paid', 'refunded', 'failed')),
    ip_hash TEXT NOT NULL,
    user_agent TEXT NOT NULL,
    consent_given BOOLEAN NOT NULL DEFAULT false,
    consent_timestamp TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS consent_records (
    id BIGSERIAL PRIMARY KEY,
    participant_fk BIGINT NOT NULL REFERENCES participants(id) ON DELETE CASCADE,
    consent_given BOOLEAN NOT NULL,
    ip_hash TEXT NOT NULL,
    user_agent TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS payments (
    id BIGSERIAL PRIMARY KEY,
    participant_fk BIGINT NOT NULL REFERENCES participants(id) ON DELETE CASCADE,
    order_id TEXT NOT NULL UNIQUE,
    payment_id TEXT UNIQUE,
    signature TEXT,
    amount BIGINT NOT NULL CHECK (amount > 0),
    currency TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'created'
        CHECK (status IN ('created', 'paid', 'failed', 'refunded')),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    confirmed_at TIMESTAMPTZ
);

CREATE TABLE IF NOT EXISTS images (
    id BIGSERIAL PRIMARY KEY,
    image_id TEXT NOT NULL UNIQUE CHECK (char_length(image_id) <= 200),
    image_url TEXT NOT NULL,
    width INTEGER,
    height INTEGER,
    object_count INTEGER,
    difficulty TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS attention_checks (
    id BIGSERIAL PRIMARY KEY,
    image_fk BIGINT NOT NULL REFERENCES images(id) ON DELETE CASCADE,
    expected_keyword TEXT NOT NULL CHECK (char_length(expected_keyword) <= 100),
    strict BOOLEAN NOT NULL DEFAULT false,
    is_active BOOLEAN NOT NULL DEFAULT true
);

CREATE TABLE IF NOT EXISTS submissions (
    id BIGSERIAL PRIMARY KEY,
    participant_fk BIGINT NOT NULL REFERENCES participants(id) ON DELETE CASCADE,
    image_fk BIGINT NOT NULL REFERENCES images(id) ON DELETE CASCADE,
    session_id TEXT NOT NULL,
    survey_index BIGINT NOT NULL,
    description TEXT NOT NULL CHECK (char_length(description) BETWEEN 1 AND 10000),
    description_hash TEXT NOT NULL,
    word_count INTEGER NOT NULL CHECK (word_count BETWEEN 0 AND 10000),
    rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 10),
    feedback TEXT CHECK (feedback IS NULL OR char_length(feedback) <= 2000),
    elapsed_seconds BIGINT NOT NULL CHECK (elapsed_seconds >= 0),
    is_survey BOOLEAN NOT NULL,
    is_attention BOOLEAN NOT NULL,
    attention_passed BOOLEAN,
    too_fast_flag BOOLEAN NOT NULL,
    attention_score_snapshot DOUBLE PRECISION NOT NULL CHECK (attention_score_snapshot BETWEEN 0 AND 1),
    quality_score DOUBLE PRECISION CHECK (quality_score IS NULL OR quality_score BETWEEN 0 AND 1),
    ai_suspected BOOLEAN NOT NULL DEFAULT false,
    ip_hash TEXT NOT NULL,
    user_agent TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT submissions_attention_passed_set
        CHECK (NOT is_attention OR attention_passed IS NOT NULL),
    CONSTRAINT submissions_ai_suspected_has_score
        CHECK (NOT ai_suspected OR quality_score IS NOT NULL),
    CONSTRAINT submissions_participant_survey_index_unique UNIQUE (participant_fk, survey_index)
);

CREATE TABLE IF NOT EXISTS attention_stats (
    participant_fk BIGINT PRIMARY KEY REFERENCES participants(id) ON DELETE CASCADE,
    total_checks BIGINT NOT NULL DEFAULT 0,
    passed_checks BIGINT NOT NULL DEFAULT 0,
    failed_checks BIGINT NOT NULL DEFAULT 0,
    attention_score DOUBLE PRECISION NOT NULL DEFAULT 0,
    is_flagged BOOLEAN NOT NULL DEFAULT false,
    CONSTRAINT attention_stats_total_matches_sum CHECK (total_checks = passed_checks + failed_checks)
);

CREATE TABLE IF NOT EXISTS participant_stats (
    participant_fk BIGINT PRIMARY KEY REFERENCES participants(id) ON DELETE CASCADE,
    total_words BIGINT NOT NULL DEFAULT 0,
    total_submissions BIGINT NOT NULL DEFAULT 0,
    survey_rounds BIGINT NOT NULL DEFAULT 0,
    attention_score DOUBLE PRECISION NOT NULL DEFAULT 0,
    priority_eligible BOOLEAN NOT NULL DEFAULT false,
    last_reward_attempt_at TIMESTAMPTZ
);

CREATE TABLE IF NOT EXISTS reward_winners (
    participant_fk BIGINT PRIMARY KEY REFERENCES participants(id) ON DELETE CASCADE,
    amount BIGINT NOT NULL CHECK (amount > 0),
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'paid', 'cancelled')),
    selected_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    paid_at TIMESTAMPTZ
);

CREATE TABLE IF NOT EXISTS audit_log (
    id BIGSERIAL PRIMARY KEY,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    event_type TEXT NOT NULL,
    participant_fk BIGINT REFERENCES participants(id) ON DELETE CASCADE,
    endpoint TEXT NOT NULL,
    method TEXT NOT NULL,
    status_code INTEGER NOT NULL,
    ip_hash TEXT NOT NULL,
    user_agent TEXT NOT NULL,
    details TEXT CHECK (details IS NULL OR char_length(details) <= 2000)
);

CREATE TABLE IF NOT EXISTS performance_metrics (
    id BIGSERIAL PRIMARY KEY,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    endpoint TEXT NOT NULL,
    response_time_ms BIGINT NOT NULL CHECK (response_time_ms >= 0),
    status_code INTEGER NOT NULL,
    request_size BIGINT NOT NULL,
    response_size BIGINT NOT NULL
);
"#;

// Triggers guarantee audit-write atomicity with their parent insert (§4.1,
// §9 "Triggers as part of the schema") — these three events never vanish if
// the write they describe succeeded, independent of the best-effort
// application-level audit path in db::audit.
const STEP_1_TRIGGERS: &str = r#"
CREATE OR REPLACE FUNCTION trg_audit_participant_created() RETURNS TRIGGER AS $$
BEGIN
    INSERT INTO audit_log (event_type, participant_fk, endpoint, method, status_code, ip_hash, user_agent, details)
    VALUES ('participant_created', NEW.id, '/api/participants', 'POST', 200, NEW.ip_hash, NEW.user_agent, NEW.participant_id);
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

DROP TRIGGER IF EXISTS participants_audit_created ON participants;
CREATE TRIGGER participants_audit_created
    AFTER INSERT ON participants
    FOR EACH ROW EXECUTE FUNCTION trg_audit_participant_created();

CREATE OR REPLACE FUNCTION trg_audit_consent_recorded() RETURNS TRIGGER AS $$
BEGIN
    INSERT INTO audit_log (event_type, participant_fk, endpoint, method, status_code, ip_hash, user_agent, details)
    VALUES ('consent_recorded', NEW.participant_fk, '/api/consent', 'POST', 200, NEW.ip_hash, NEW.user_agent,
            CASE WHEN NEW.consent_given THEN 'given' ELSE 'withdrawn' END);
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

DROP TRIGGER IF EXISTS consent_records_audit_created ON consent_records;
CREATE TRIGGER consent_records_audit_created
    AFTER INSERT ON consent_records
    FOR EACH ROW EXECUTE FUNCTION trg_audit_consent_recorded();

CREATE OR REPLACE FUNCTION trg_audit_submission_created() RETURNS TRIGGER AS $$
BEGIN
    INSERT INTO audit_log (event_type, participant_fk, endpoint, method, status_code, ip_hash, user_agent, details)
    VALUES ('submission_created', NEW.participant_fk, '/api/submit', 'POST', 200, NEW.ip_hash, NEW.user_agent,
            'survey_index=' || NEW.survey_index);
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

DROP TRIGGER IF EXISTS submissions_audit_created ON submissions;
CREATE TRIGGER submissions_audit_created
    AFTER INSERT ON submissions
    FOR EACH ROW EXECUTE FUNCTION trg_audit_submission_created();
"#;

const STEP_1_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_submissions_participant_fk ON submissions(participant_fk);
CREATE UNIQUE INDEX IF NOT EXISTS idx_submissions_participant_survey_index
    ON submissions(participant_fk, survey_index);
CREATE UNIQUE INDEX IF NOT EXISTS idx_reward_winners_participant_fk ON reward_winners(participant_fk);
CREATE INDEX IF NOT EXISTS idx_audit_log_created_at ON audit_log(created_at);
CREATE INDEX IF NOT EXISTS idx_performance_metrics_created_at ON performance_metrics(created_at);
"#;
