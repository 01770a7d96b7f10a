//! §4.7 failure semantics: "a violation of the per-participant submission
//! uniqueness (e.g., client replay) is treated as idempotent: the stored
//! submission is fetched and returned instead of an error, provided the
//! description hash matches."

mod common;

use imagedesc_core::db::RecordOutcome;

#[tokio::test]
async fn identical_resubmission_replays_instead_of_creating_a_second_row() {
    let Some(store) = common::test_store().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return;
    };

    let participant_fk = common::test_participant(&store, "p-replay").await;
    let image_fk = common::test_image(&store, "survey/replay-test.svg").await;
    let submission = common::sample_submission(participant_fk, image_fk, "the exact same description twice");

    let first = store.record_submission(&submission).await.expect("record submission");
    let (first_id, first_index) = match first {
        RecordOutcome::Created { submission_id, survey_index } => (submission_id, survey_index),
        RecordOutcome::Replayed { .. } => panic!("first submission must not be a replay"),
    };

    let second = store.record_submission(&submission).await.expect("record submission");
    match second {
        RecordOutcome::Replayed { submission_id, survey_index } => {
            assert_eq!(submission_id, first_id, "replay must return the original submission id");
            assert_eq!(survey_index, first_index, "replay must not consume a new survey_index");
        }
        RecordOutcome::Created { .. } => panic!("identical resubmission must be idempotent, not duplicated"),
    }

    let stats = store.get_participant_stats(participant_fk).await.expect("get stats").expect("stats row exists");
    assert_eq!(stats.total_submissions, 1, "a replay must not double-count stats");
}

#[tokio::test]
async fn diverging_resubmission_after_a_replay_gets_the_next_index() {
    let Some(store) = common::test_store().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return;
    };

    let participant_fk = common::test_participant(&store, "p-replay-divergent").await;
    let image_fk = common::test_image(&store, "survey/replay-test.svg").await;
    let first = common::sample_submission(participant_fk, image_fk, "the first distinct description here");
    let second = common::sample_submission(participant_fk, image_fk, "a completely different second description");

    let first_outcome = store.record_submission(&first).await.expect("record submission");
    let RecordOutcome::Created { survey_index: first_index, .. } = first_outcome else {
        panic!("first submission must not be a replay");
    };

    let second_outcome = store.record_submission(&second).await.expect("record submission");
    let RecordOutcome::Created { survey_index: second_index, .. } = second_outcome else {
        panic!("a genuinely different description must not be treated as a replay");
    };

    assert_eq!(second_index, first_index + 1);
}
