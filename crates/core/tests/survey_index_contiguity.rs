//! §8: "For all participants P ... S.survey_index values form a contiguous
//! 0..N-1 sequence with no gaps or duplicates, under arbitrary concurrent
//! submits for P."

mod common;

use std::collections::HashSet;

use imagedesc_core::db::RecordOutcome;

const CONCURRENT_SUBMITS: i64 = 25;

#[tokio::test]
async fn survey_index_is_dense_under_concurrency() {
    let Some(store) = common::test_store().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return;
    };

    let participant_fk = common::test_participant(&store, "p-contiguity").await;
    let image_fk = common::test_image(&store, "survey/contiguity-test.svg").await;

    let mut handles = Vec::new();
    for i in 0..CONCURRENT_SUBMITS {
        let store = store.clone();
        let description = format!("description number {i} with enough distinct words to be unique here");
        handles.push(tokio::spawn(async move {
            let submission = common::sample_submission(participant_fk, image_fk, &description);
            store.record_submission(&submission).await.expect("record submission")
        }));
    }

    let mut indexes = HashSet::new();
    for handle in handles {
        match handle.await.expect("task panicked") {
            RecordOutcome::Created { survey_index, .. } => {
                assert!(indexes.insert(survey_index), "duplicate survey_index {survey_index}");
            }
            RecordOutcome::Replayed { .. } => panic!("unexpected replay with distinct descriptions"),
        }
    }

    let expected: HashSet<i64> = (0..CONCURRENT_SUBMITS).collect();
    assert_eq!(indexes, expected);
}
