//! §8: "at most one reward_winners row exists ... under ≥50 concurrent
//! selection calls on a newly eligible participant — exactly one
//! selected:true response, the rest already_decided."

mod common;

use imagedesc_core::db::SelectOutcome;

const CONCURRENT_CALLS: usize = 50;
const REWARD_AMOUNT: i64 = 10;
const COOLDOWN_SECS: i64 = 86_400;

#[tokio::test]
async fn exactly_one_winner_under_concurrent_selection() {
    let Some(store) = common::test_store().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return;
    };

    let participant_fk = common::test_participant(&store, "p-reward-race").await;
    // increment_stats creates the participant_stats row reward_select requires.
    store.increment_stats(participant_fk, 10, true, None).await.expect("seed participant_stats");

    let mut handles = Vec::new();
    for _ in 0..CONCURRENT_CALLS {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.reward_select(participant_fk, REWARD_AMOUNT, COOLDOWN_SECS, true).await.expect("reward_select")
        }));
    }

    let mut selected = 0;
    let mut already_decided = 0;
    for handle in handles {
        match handle.await.expect("task panicked") {
            SelectOutcome::Selected { amount } => {
                assert_eq!(amount, REWARD_AMOUNT);
                selected += 1;
            }
            SelectOutcome::AlreadyDecided { .. } => already_decided += 1,
            other => panic!("unexpected outcome for a newly eligible participant: {other:?}"),
        }
    }

    assert_eq!(selected, 1);
    assert_eq!(already_decided, CONCURRENT_CALLS - 1);

    let winner = store.get_reward_winner(participant_fk).await.expect("query winner");
    assert!(winner.is_some());
}
