//! Test harness that drives the engine with mock dependencies.
//!
//! The mock random source keeps the catalog in file order, so tests can
//! reason about which lot opens when. Ticks are delivered by hand; one
//! call to `tick` is one engine second.

use draftroom::engine::CountdownKind;
use draftroom::mocks::{make_test_catalog, MockNotifier, MockRandom};
use draftroom::{
    AuctionEngine, DirectEvent, EngineConfig, EngineEvent, LotId, LotStatus, ParticipantId, Phase,
};

/// Config with windows small enough to hand-tick comfortably.
pub fn test_config() -> EngineConfig {
    EngineConfig {
        roster_capacity: 3,
        category_cap: 1,
        starting_points: 1_000,
        bid_increment: 10,
        opening_seconds: 4,
        reoffer_seconds: 6,
        transition_seconds: 1,
        reset_seconds: 3,
        snipe_window_seconds: 2,
        snipe_reset_seconds: 5,
        snipe_reset_always: false,
        repeat_failed_pass: false,
    }
}

/// Six lots, two categories, enough supply for a three-seat roster.
pub fn standard_rows() -> Vec<(u32, &'static str, u32)> {
    vec![
        (1, "mid", 10),
        (2, "mid", 10),
        (3, "mid", 10),
        (4, "top", 10),
        (5, "top", 10),
        (6, "top", 10),
    ]
}

pub struct EngineHarness {
    pub engine: AuctionEngine<MockNotifier, MockRandom>,
    pub notifier: MockNotifier,
}

impl EngineHarness {
    pub fn new(config: EngineConfig, rows: &[(u32, &str, u32)]) -> Self {
        let catalog = make_test_catalog(rows);
        let notifier = MockNotifier::new();
        let engine = AuctionEngine::new(config, catalog, notifier.clone(), MockRandom::identity());
        Self { engine, notifier }
    }

    pub fn standard() -> Self {
        Self::new(test_config(), &standard_rows())
    }

    /// Seat participants 1..=n.
    pub async fn join(&mut self, n: u64) {
        for id in 1..=n {
            self.engine.handle_join(ParticipantId(id)).await;
        }
    }

    /// Seat and ready participants 1..=n. With n equal to the roster
    /// capacity this starts the round.
    pub async fn join_and_ready(&mut self, n: u64) {
        self.join(n).await;
        for id in 1..=n {
            self.engine.handle_ready(ParticipantId(id)).await;
        }
    }

    pub async fn bid(&mut self, participant: u64, amount: u32) {
        self.engine
            .handle_bid(ParticipantId(participant), amount)
            .await;
    }

    pub async fn tick(&mut self) {
        self.engine.tick().await;
    }

    pub async fn ticks(&mut self, n: u32) {
        for _ in 0..n {
            self.engine.tick().await;
        }
    }

    /// Tick the open bidding window down to expiry, closing the lot.
    pub async fn run_out_window(&mut self) {
        let remaining = self
            .engine
            .state()
            .countdown()
            .filter(|c| c.kind == CountdownKind::Bidding)
            .map(|c| c.remaining)
            .expect("a bidding window must be open");
        self.ticks(remaining).await;
    }

    /// Tick through the pause between two lots.
    pub async fn run_transition(&mut self) {
        assert_eq!(self.engine.phase(), Phase::Transition);
        let remaining = self
            .engine
            .state()
            .countdown()
            .map(|c| c.remaining)
            .expect("a transition countdown must be armed");
        self.ticks(remaining).await;
    }

    pub fn phase(&self) -> Phase {
        self.engine.phase()
    }

    pub fn current_lot(&self) -> Option<LotId> {
        self.engine.state().current_lot
    }

    pub fn remaining(&self) -> Option<u32> {
        self.engine.state().countdown().map(|c| c.remaining)
    }

    pub fn lot_status(&self, id: u32) -> LotStatus {
        self.engine
            .working()
            .status_of(LotId(id))
            .expect("lot must exist")
    }

    pub fn points(&self, participant: u64) -> u32 {
        self.engine
            .roster()
            .get(ParticipantId(participant))
            .expect("participant must be seated")
            .points
    }

    pub async fn events(&self) -> Vec<EngineEvent> {
        self.notifier.broadcasts().await
    }

    pub async fn clear_events(&self) {
        self.notifier.clear().await;
    }

    /// Rejection reasons unicast to one participant, in order.
    pub async fn rejections_for(&self, participant: u64) -> Vec<String> {
        self.notifier
            .sent_to(ParticipantId(participant))
            .await
            .into_iter()
            .filter_map(|event| match event {
                DirectEvent::BidRejected { reason } => Some(reason),
                _ => None,
            })
            .collect()
    }
}
