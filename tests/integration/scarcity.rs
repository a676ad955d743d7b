//! Scarcity auto-assignment at the whole-round level.

use draftroom::{EngineEvent, LotId, LotStatus, ParticipantId, Phase};

use crate::common::{test_config, EngineHarness};

#[tokio::test]
async fn test_last_category_lot_auto_assigns_at_zero_cost() {
    let mut harness = EngineHarness::standard();
    harness.join_and_ready(3).await;

    // P2 and P3 win the first two mid lots.
    harness.bid(1, 10).await;
    harness.bid(2, 20).await;
    harness.run_out_window().await;
    harness.run_transition().await;

    harness.bid(1, 10).await;
    harness.bid(3, 20).await;
    harness.run_out_window().await;

    // The third mid lot went to P1 without a bidding window.
    let lot = harness.engine.working().by_id(LotId(3)).unwrap();
    assert_eq!(lot.status, LotStatus::Acquired);
    assert_eq!(lot.final_price, 0);
    assert_eq!(lot.winner, Some(ParticipantId(1)));

    let p1 = harness.engine.roster().get(ParticipantId(1)).unwrap();
    assert_eq!(p1.holding_count(&"mid".into()), 1);
    assert_eq!(p1.acquisitions()[0].price, 0);
    assert_eq!(harness.points(1), 1_000);

    let assigned = harness.events().await.iter().any(|event| {
        matches!(
            event,
            EngineEvent::AutoAssigned { lot, winner }
                if lot.id == LotId(3) && winner == "P1"
        )
    });
    assert!(assigned);

    assert_eq!(harness.engine.state().wins(&"mid".into()), 3);
}

#[tokio::test]
async fn test_resolver_noops_when_category_supply_is_exhausted() {
    // Two lots per category for a three-seat roster: the threshold fires
    // with nothing left to assign.
    let rows = [
        (1, "mid", 10),
        (2, "mid", 10),
        (3, "top", 10),
        (4, "top", 10),
    ];
    let mut harness = EngineHarness::new(test_config(), &rows);
    harness.join_and_ready(3).await;

    // Lot "A": P1 opens at 10, P2 takes it at 20.
    harness.bid(1, 10).await;
    harness.bid(2, 20).await;
    harness.run_out_window().await;
    harness.run_transition().await;

    // Lot "B": P1 opens at 10, P3 takes it at 20.
    harness.bid(1, 10).await;
    harness.bid(3, 20).await;
    harness.run_out_window().await;

    // Both mid seats-but-one are filled, but supply ran out: no
    // auto-assignment happens and P1 holds no mid lot.
    assert_eq!(harness.engine.state().wins(&"mid".into()), 2);
    let p1 = harness.engine.roster().get(ParticipantId(1)).unwrap();
    assert_eq!(p1.holding_count(&"mid".into()), 0);

    let assigned = harness
        .events()
        .await
        .iter()
        .any(|event| matches!(event, EngineEvent::AutoAssigned { .. }));
    assert!(!assigned);

    // The round carries on into the top lots.
    harness.run_transition().await;
    assert_eq!(harness.phase(), Phase::PrimaryBidding);
    assert_eq!(harness.current_lot(), Some(LotId(3)));
}

#[tokio::test]
async fn test_auto_assignment_can_resolve_a_previously_failed_lot() {
    // First mid lot fails, the other two sell. The failed lot is the
    // remaining one when the threshold fires, so it auto-assigns instead
    // of reaching the re-offer pass.
    let mut harness = EngineHarness::standard();
    harness.join_and_ready(3).await;

    harness.run_out_window().await;
    assert_eq!(harness.lot_status(1), LotStatus::Failed);
    harness.run_transition().await;

    harness.bid(2, 10).await;
    harness.run_out_window().await;
    harness.run_transition().await;

    harness.bid(3, 10).await;
    harness.run_out_window().await;

    assert_eq!(harness.lot_status(1), LotStatus::Acquired);
    let lot = harness.engine.working().by_id(LotId(1)).unwrap();
    assert_eq!(lot.final_price, 0);
    assert_eq!(lot.winner, Some(ParticipantId(1)));
}
