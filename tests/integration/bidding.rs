//! Bid legality, rejection reporting, and the anti-snipe extension.

use draftroom::{DirectEvent, EngineConfig, EngineEvent, ParticipantId, Phase};

use crate::common::{standard_rows, test_config, EngineHarness};

#[tokio::test]
async fn test_accepted_bids_are_strictly_increasing_multiples() {
    let mut harness = EngineHarness::standard();
    harness.join_and_ready(3).await;

    harness.bid(1, 10).await;
    harness.bid(2, 20).await;
    harness.bid(1, 40).await;
    harness.bid(3, 50).await;

    let amounts: Vec<u32> = harness
        .events()
        .await
        .iter()
        .filter_map(|event| match event {
            EngineEvent::BidUpdate { amount, .. } => Some(*amount),
            _ => None,
        })
        .collect();

    assert_eq!(amounts, vec![10, 20, 40, 50]);
    for window in amounts.windows(2) {
        assert!(window[1] > window[0]);
    }
    for amount in amounts {
        assert_eq!(amount % 10, 0);
    }
}

#[tokio::test]
async fn test_no_two_consecutive_bids_by_one_participant() {
    let mut harness = EngineHarness::standard();
    harness.join_and_ready(3).await;

    harness.bid(1, 10).await;
    harness.bid(1, 20).await;

    let bidders: Vec<ParticipantId> = harness
        .events()
        .await
        .iter()
        .filter_map(|event| match event {
            EngineEvent::BidUpdate { bidder, .. } => Some(*bidder),
            _ => None,
        })
        .collect();
    assert_eq!(bidders, vec![ParticipantId(1)]);

    let reasons = harness.rejections_for(1).await;
    assert_eq!(reasons.len(), 1);
    assert!(reasons[0].contains("top bidder"));
}

#[tokio::test]
async fn test_each_rejection_names_its_rule_and_leaves_state_alone() {
    let mut harness = EngineHarness::standard();
    harness.join_and_ready(3).await;

    harness.bid(1, 10).await;

    // Not a multiple of the increment.
    harness.bid(2, 25).await;
    // Not above the standing bid.
    harness.bid(2, 10).await;
    // More than the bidder can spend.
    harness.bid(2, 2_000).await;

    let reasons = harness.rejections_for(2).await;
    assert_eq!(reasons.len(), 3);
    assert!(reasons[0].contains("steps of 10"));
    assert!(reasons[1].contains("minimum bid is 20"));
    assert!(reasons[2].contains("exceeds your balance"));

    // Three distinct reasons, no state change.
    assert_ne!(reasons[0], reasons[1]);
    assert_ne!(reasons[1], reasons[2]);
    assert_eq!(harness.engine.state().top_bid, 10);
    assert_eq!(harness.engine.state().top_bidder, Some(ParticipantId(1)));
}

#[tokio::test]
async fn test_category_cap_blocks_a_second_win() {
    let mut harness = EngineHarness::standard();
    harness.join_and_ready(3).await;

    // P1 wins the first mid lot.
    harness.bid(1, 10).await;
    harness.run_out_window().await;
    harness.run_transition().await;

    // P1 may not bid on another mid lot.
    harness.bid(1, 10).await;
    let reasons = harness.rejections_for(1).await;
    assert_eq!(reasons.len(), 1);
    assert!(reasons[0].contains("mid"));
    assert_eq!(harness.engine.state().top_bid, 0);
}

#[tokio::test]
async fn test_bid_outside_bidding_phase_is_silently_ignored() {
    let mut harness = EngineHarness::standard();
    harness.join(3).await;
    harness.clear_events().await;

    harness.bid(1, 50).await;

    assert!(harness.events().await.is_empty());
    assert!(harness.notifier.unicasts().await.is_empty());
}

#[tokio::test]
async fn test_bid_during_transition_is_silently_ignored() {
    let mut harness = EngineHarness::standard();
    harness.join_and_ready(3).await;

    harness.bid(1, 10).await;
    harness.run_out_window().await;
    assert_eq!(harness.phase(), Phase::Transition);
    harness.clear_events().await;

    harness.bid(2, 20).await;

    assert!(harness.events().await.is_empty());
    assert!(harness.notifier.unicasts().await.is_empty());
}

#[tokio::test]
async fn test_snipe_extension_fires_inside_the_window() {
    let config = EngineConfig {
        opening_seconds: 10,
        snipe_window_seconds: 3,
        snipe_reset_seconds: 7,
        ..test_config()
    };
    let mut harness = EngineHarness::new(config, &standard_rows());
    harness.join_and_ready(3).await;

    // A bid with plenty of time left does not move the clock.
    harness.ticks(5).await;
    harness.bid(1, 10).await;
    assert_eq!(harness.remaining(), Some(5));

    // Down to two seconds: the next bid jumps the clock to seven, and
    // the broadcast reflects it before the bid update.
    harness.ticks(3).await;
    assert_eq!(harness.remaining(), Some(2));
    harness.clear_events().await;

    harness.bid(2, 20).await;
    assert_eq!(harness.remaining(), Some(7));

    let events = harness.events().await;
    assert!(matches!(
        events[0],
        EngineEvent::TimerUpdate { remaining: 7, .. }
    ));
    assert!(matches!(events[1], EngineEvent::BidUpdate { amount: 20, .. }));
}

#[tokio::test]
async fn test_unconditional_snipe_reset_never_shortens() {
    let config = EngineConfig {
        opening_seconds: 10,
        snipe_window_seconds: 3,
        snipe_reset_seconds: 7,
        snipe_reset_always: true,
        ..test_config()
    };
    let mut harness = EngineHarness::new(config, &standard_rows());
    harness.join_and_ready(3).await;

    // Eight seconds left: above the reset value, so the clock stays put.
    harness.ticks(2).await;
    harness.bid(1, 10).await;
    assert_eq!(harness.remaining(), Some(8));

    // Six seconds left: below the reset value, so the clock is raised
    // even though the snipe window was never entered.
    harness.ticks(2).await;
    harness.bid(2, 20).await;
    assert_eq!(harness.remaining(), Some(7));
}

#[tokio::test]
async fn test_eligibility_flags_follow_the_top_bid() {
    let mut harness = EngineHarness::standard();
    harness.join_and_ready(3).await;
    harness.clear_events().await;

    harness.bid(1, 10).await;

    let events = harness.events().await;
    let snapshot = events
        .iter()
        .rev()
        .find_map(|event| match event {
            EngineEvent::ParticipantStatus { players } => Some(players.clone()),
            _ => None,
        })
        .expect("a status snapshot follows every accepted bid");

    let p1 = snapshot.iter().find(|p| p.id == ParticipantId(1)).unwrap();
    let p2 = snapshot.iter().find(|p| p.id == ParticipantId(2)).unwrap();
    assert!(p1.is_top_bidder);
    assert!(!p1.can_bid);
    assert!(!p2.is_top_bidder);
    assert!(p2.can_bid);
}

#[tokio::test]
async fn test_rejected_bid_is_unicast_not_broadcast() {
    let mut harness = EngineHarness::standard();
    harness.join_and_ready(3).await;
    harness.clear_events().await;

    harness.bid(1, 15).await;

    assert!(harness.events().await.is_empty());
    let to_bidder = harness.notifier.sent_to(ParticipantId(1)).await;
    assert_eq!(to_bidder.len(), 1);
    assert!(matches!(to_bidder[0], DirectEvent::BidRejected { .. }));
    assert!(harness.notifier.sent_to(ParticipantId(2)).await.is_empty());
}
