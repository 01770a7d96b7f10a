use imagedesc_core::db::{CreateOutcome, Store};
use imagedesc_core::models::Demographics;

/// Connects to `TEST_DATABASE_URL` and runs the production migration
/// routine against it. Returns `None` (skipping the calling test) when the
/// variable isn't set, since these tests need a real Postgres instance
/// (SPEC_FULL.md §4.14 "the identical migration routine the production
/// binary runs at startup").
pub async fn test_store() -> Option<Store> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let store = Store::connect(&url).await.expect("connect to test database");
    store.migrate().await.expect("run migrations");
    Some(store)
}

pub async fn test_participant(store: &Store, business_id: &str) -> i64 {
    let demographics = Demographics {
        participant_id: business_id.to_string(),
        session_id: format!("{business_id}-session"),
        username: "tester_01".to_string(),
        email: "tester@example.com".to_string(),
        phone: None,
        gender: None,
        age: 30,
        place: None,
        native_language: None,
        prior_experience: None,
    };

    let outcome =
        store.create_participant(&demographics, "ip-hash-stub", "test-agent").await.expect("create participant");
    let row = match outcome {
        CreateOutcome::Created(row) => row,
        CreateOutcome::AlreadyExists(row) => row,
    };

    store.record_consent(business_id, true, "ip-hash-stub", "test-agent").await.expect("record consent");
    row.id
}

pub async fn test_image(store: &Store, image_id: &str) -> i64 {
    store.ensure_image_exists(image_id, &format!("/api/images/{image_id}")).await.expect("ensure image exists")
}

pub fn sample_submission(participant_fk: i64, image_fk: i64, description: &str) -> imagedesc_core::models::NewSubmission {
    imagedesc_core::models::NewSubmission {
        participant_fk,
        image_fk,
        session_id: "s-1".to_string(),
        description: description.to_string(),
        description_hash: imagedesc_core::identity::hash_text(description),
        word_count: description.split_whitespace().count() as i32,
        rating: 7,
        feedback: None,
        elapsed_seconds: 60,
        is_survey: true,
        is_attention: false,
        attention_passed: None,
        too_fast_flag: false,
        attention_score_snapshot: 0.0,
        quality_score: Some(0.5),
        ai_suspected: false,
        ip_hash: "ip-hash-stub".to_string(),
        user_agent: "test-agent".to_string(),
    }
}
