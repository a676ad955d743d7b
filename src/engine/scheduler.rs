//! The auction engine: the top-level phase state machine.
//!
//! This struct owns the working catalog, the roster, and the single
//! auction state record, abstracted over the notification and randomness
//! dependencies. All mutation enters through the `handle_*` methods and
//! `tick`, which the runtime calls from one task, so no two state
//! transitions ever interleave.

use tracing::{debug, info, warn};

use crate::catalog::{Catalog, Category, LotId, LotStatus, LotSummary, WorkingCatalog};
use crate::config::EngineConfig;
use crate::engine::scarcity::{self, Resolution};
use crate::engine::sequencer::{self, SequencerStep};
use crate::engine::state::{AuctionState, CountdownKind, Pass, Phase};
use crate::engine::validator;
use crate::events::{DirectEvent, EngineEvent, LobbyPlayer, ParticipantSnapshot};
use crate::roster::{ParticipantId, Roster};
use crate::traits::{shuffle, Notifier, RandomSource};

/// The auction engine core.
///
/// Generic over the notifier and random source so the same code path
/// tested with mocks runs in production.
pub struct AuctionEngine<N, R>
where
    N: Notifier,
    R: RandomSource,
{
    config: EngineConfig,
    catalog: Catalog,
    working: WorkingCatalog,
    /// Offering order for the primary pass; reshuffled every round.
    primary_order: Vec<LotId>,
    /// Frozen snapshot of failed lots, set when the primary pass ends.
    failed_order: Vec<LotId>,
    roster: Roster,
    state: AuctionState,
    notifier: N,
    random: R,
}

impl<N, R> AuctionEngine<N, R>
where
    N: Notifier,
    R: RandomSource,
{
    pub fn new(config: EngineConfig, catalog: Catalog, notifier: N, random: R) -> Self {
        let working = catalog.working_copy();
        let primary_order = working.ids();
        let roster = Roster::new(config.roster_capacity);
        Self {
            config,
            catalog,
            working,
            primary_order,
            failed_order: Vec::new(),
            roster,
            state: AuctionState::new(),
            notifier,
            random,
        }
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn state(&self) -> &AuctionState {
        &self.state
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn working(&self) -> &WorkingCatalog {
        &self.working
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether the runtime should be delivering ticks right now.
    pub fn timer_armed(&self) -> bool {
        self.state.countdown().is_some()
    }

    // ── Session commands ────────────────────────────────────────────────

    /// Seat a new participant, or refuse with a "full" signal.
    pub async fn handle_join(&mut self, id: ParticipantId) {
        if self.roster.get(id).is_some() {
            debug!("join from already-seated {id} ignored");
            return;
        }
        let Some(participant) = self.roster.join(id, self.config.starting_points) else {
            info!("join refused, roster is full");
            self.notifier.unicast(id, DirectEvent::ServerFull).await;
            return;
        };
        let display_name = participant.display_name.clone();
        info!("{id} joined as {display_name}");
        self.notifier
            .unicast(id, DirectEvent::Welcome { id, display_name })
            .await;
        self.broadcast_lobby().await;
        self.broadcast_participant_status().await;
        self.broadcast_catalog_status().await;
    }

    /// Remove a participant. A standing top bid by the leaver is left in
    /// place; the close handler re-marks the lot failed if the window
    /// expires with no seated winner.
    pub async fn handle_leave(&mut self, id: ParticipantId) {
        if !self.roster.leave(id) {
            return;
        }
        if self.state.top_bidder == Some(id) {
            debug!("current top bidder {id} left mid-window");
        }
        self.broadcast_lobby().await;
        self.broadcast_participant_status().await;
    }

    /// Update a participant's display name and starting balance.
    /// Accepted only in the lobby, before that participant is ready.
    pub async fn handle_configure(
        &mut self,
        id: ParticipantId,
        display_name: String,
        starting_points: u32,
    ) {
        if self.state.phase != Phase::Lobby {
            debug!("configure from {id} outside lobby ignored");
            return;
        }
        let Some(participant) = self.roster.get(id) else {
            debug!("configure from unseated {id} ignored");
            return;
        };
        if participant.ready {
            self.reject_config(id, "configuration is locked once you are ready")
                .await;
            return;
        }
        let display_name = display_name.trim().to_string();
        if display_name.is_empty() {
            self.reject_config(id, "display name must not be empty").await;
            return;
        }
        if starting_points == 0 {
            self.reject_config(id, "starting points must be positive").await;
            return;
        }

        if let Some(participant) = self.roster.get_mut(id) {
            info!("{id} configured as {display_name} with {starting_points} points");
            participant.display_name = display_name;
            participant.starting_points = starting_points;
            participant.points = starting_points;
        }
        self.broadcast_lobby().await;
        self.broadcast_participant_status().await;
    }

    /// Mark a participant ready; starts the round once every seat is
    /// filled and ready.
    pub async fn handle_ready(&mut self, id: ParticipantId) {
        if self.state.phase != Phase::Lobby {
            debug!("ready from {id} outside lobby ignored");
            return;
        }
        let Some(participant) = self.roster.get_mut(id) else {
            debug!("ready from unseated {id} ignored");
            return;
        };
        if participant.ready {
            return;
        }
        participant.ready = true;
        info!(
            "{id} is ready ({}/{})",
            self.roster.ready_count(),
            self.roster.capacity()
        );
        self.broadcast_lobby().await;

        if self.roster.all_ready() {
            self.start_round().await;
        }
    }

    /// Gate a bid through the validator and apply it if legal.
    pub async fn handle_bid(&mut self, id: ParticipantId, amount: u32) {
        let bidding_phase = matches!(
            self.state.phase,
            Phase::PrimaryBidding | Phase::FailedBidding
        );
        let Some(lot_id) = self.state.current_lot else {
            debug!("bid from {id} with no open lot ignored");
            return;
        };
        if !bidding_phase {
            debug!("bid from {id} outside bidding phase ignored");
            return;
        }
        let Some(bidder) = self.roster.get(id) else {
            debug!("bid from unseated {id} ignored");
            return;
        };
        let Some(lot) = self.working.by_id(lot_id) else {
            warn!("open lot {lot_id} missing from working catalog");
            return;
        };

        if let Err(rejection) = validator::validate(amount, bidder, lot, &self.state, &self.config)
        {
            debug!("bid of {amount} from {id} rejected: {rejection}");
            self.notifier
                .unicast(
                    id,
                    DirectEvent::BidRejected {
                        reason: rejection.to_string(),
                    },
                )
                .await;
            return;
        }

        let bidder_name = bidder.display_name.clone();
        self.state.top_bid = amount;
        self.state.top_bidder = Some(id);
        info!("bid of {amount} on {lot_id} accepted from {bidder_name}");

        self.apply_anti_snipe(lot_id).await;

        self.notifier
            .broadcast(EngineEvent::BidUpdate {
                lot_id,
                amount,
                bidder: id,
                bidder_name,
            })
            .await;
        self.broadcast_participant_status().await;
    }

    /// Raise the window after a bid near expiry so the lot cannot close
    /// within an instant of a new high bid.
    async fn apply_anti_snipe(&mut self, lot_id: LotId) {
        let remaining = self
            .state
            .countdown()
            .filter(|c| c.kind == CountdownKind::Bidding)
            .map(|c| c.remaining);
        let Some(remaining) = remaining else { return };

        let within_window = remaining <= self.config.snipe_window_seconds;
        if !(within_window || self.config.snipe_reset_always) {
            return;
        }
        if let Some(new_remaining) = self.state.extend_bidding(self.config.snipe_reset_seconds) {
            info!("window on {lot_id} extended to {new_remaining}s after late bid");
            self.notifier
                .broadcast(EngineEvent::TimerUpdate {
                    lot_id,
                    remaining: new_remaining,
                })
                .await;
        }
    }

    // ── Timer ───────────────────────────────────────────────────────────

    /// Advance the armed countdown by one second.
    ///
    /// Ticks that do not match the armed countdown (a trailing tick after
    /// a reset, for example) are discarded.
    pub async fn tick(&mut self) {
        match self.state.phase {
            Phase::PrimaryBidding | Phase::FailedBidding => {
                let Some(remaining) = self.state.tick_down(CountdownKind::Bidding) else {
                    debug!("stale bidding tick discarded");
                    return;
                };
                if let Some(lot_id) = self.state.current_lot {
                    self.notifier
                        .broadcast(EngineEvent::TimerUpdate { lot_id, remaining })
                        .await;
                }
                if remaining == 0 {
                    self.close_window().await;
                }
            }
            Phase::Transition => {
                let Some(remaining) = self.state.tick_down(CountdownKind::Transition) else {
                    debug!("stale transition tick discarded");
                    return;
                };
                self.notifier
                    .broadcast(EngineEvent::TransitionTick { remaining })
                    .await;
                if remaining == 0 {
                    self.open_after_transition().await;
                }
            }
            Phase::Finished => {
                let Some(remaining) = self.state.tick_down(CountdownKind::Reset) else {
                    debug!("stale reset tick discarded");
                    return;
                };
                self.notifier
                    .broadcast(EngineEvent::ResetTick { remaining })
                    .await;
                if remaining == 0 {
                    self.reset_round().await;
                }
            }
            Phase::Lobby => {
                debug!("tick in lobby discarded");
            }
        }
    }

    // ── Round lifecycle ─────────────────────────────────────────────────

    /// Fresh working catalog, fresh shuffle, balances restored, and the
    /// first lot on the block.
    async fn start_round(&mut self) {
        self.working = self.catalog.working_copy();
        self.primary_order = self.working.ids();
        shuffle(&self.random, &mut self.primary_order);
        self.failed_order.clear();
        self.state.reset_round();
        info!(
            "all seats ready; round starting over {} lots",
            self.primary_order.len()
        );
        self.notifier.broadcast(EngineEvent::RoundStarted).await;
        self.broadcast_catalog_status().await;

        match sequencer::next_step(&self.primary_order, 0, &self.working) {
            SequencerStep::Open { index, lot } => self.open_lot(index, lot).await,
            SequencerStep::Exhausted => self.finish_round().await,
        }
    }

    /// Open the bidding window for the lot at `index` in the active pass.
    async fn open_lot(&mut self, index: usize, lot_id: LotId) {
        let Some(lot) = self.working.by_id(lot_id) else {
            warn!("cannot open missing lot {lot_id}");
            return;
        };
        let lot_snapshot = lot.clone();

        self.state.cursor = index;
        self.state.current_lot = Some(lot_id);
        self.state.pending_lot = None;
        self.state.clear_bidding();
        self.state.phase = self.state.pass.bidding_phase();

        let seconds = match self.state.pass {
            Pass::Primary => self.config.opening_seconds,
            Pass::Failed => self.config.reoffer_seconds,
        };
        self.state.arm(CountdownKind::Bidding, seconds);

        info!(
            "offering {} ({}) at {} for {seconds}s",
            lot_snapshot.name, lot_snapshot.category, lot_snapshot.starting_price
        );
        self.notifier
            .broadcast(EngineEvent::AuctionOpened {
                lot: lot_snapshot,
                phase: self.state.phase,
            })
            .await;
        self.notifier
            .broadcast(EngineEvent::TimerUpdate {
                lot_id,
                remaining: seconds,
            })
            .await;
        self.broadcast_catalog_status().await;
    }

    /// Close the current bidding window: sale or failure, then advance.
    async fn close_window(&mut self) {
        self.state.disarm();
        let Some(lot_id) = self.state.current_lot.take() else {
            warn!("window close with no open lot");
            return;
        };

        let winner = self
            .state
            .top_bidder
            .filter(|_| self.state.top_bid > 0)
            .filter(|id| self.roster.get(*id).is_some());

        if let Some(winner_id) = winner {
            let hammer_price = self.state.top_bid;
            let Some(lot) = self.working.by_id_mut(lot_id) else {
                warn!("closed lot {lot_id} missing from working catalog");
                return;
            };
            lot.status = LotStatus::Acquired;
            lot.final_price = hammer_price;
            lot.winner = Some(winner_id);
            let lot_snapshot = lot.clone();
            let category = lot_snapshot.category.clone();

            let mut winner_name = String::new();
            if let Some(participant) = self.roster.get_mut(winner_id) {
                participant.points = participant.points.saturating_sub(hammer_price);
                participant.record_acquisition(&lot_snapshot.name, hammer_price, &category);
                winner_name = participant.display_name.clone();
            }
            self.state.record_win(&category);

            info!(
                "{} sold to {winner_name} at {hammer_price}",
                lot_snapshot.name
            );
            self.notifier
                .broadcast(EngineEvent::LotClosed {
                    lot: lot_snapshot,
                    winner: Some(winner_name),
                })
                .await;
            self.broadcast_participant_status().await;
            self.broadcast_catalog_status().await;

            self.resolve_scarcity(&category).await;
        } else {
            if self.state.top_bid > 0 {
                warn!("winning bidder left before {lot_id} closed; lot fails");
            }
            let Some(lot) = self.working.by_id_mut(lot_id) else {
                warn!("closed lot {lot_id} missing from working catalog");
                return;
            };
            lot.status = LotStatus::Failed;
            let lot_snapshot = lot.clone();

            info!("{} closed with no sale", lot_snapshot.name);
            self.notifier
                .broadcast(EngineEvent::LotClosed {
                    lot: lot_snapshot,
                    winner: None,
                })
                .await;
            self.broadcast_catalog_status().await;
        }

        self.state.clear_bidding();
        self.advance().await;
    }

    /// Auto-assign the last lot of a category once all but one seat for
    /// it has been filled.
    async fn resolve_scarcity(&mut self, category: &Category) {
        let wins = self.state.wins(category);
        let capacity = self.roster.capacity() as u32;
        match scarcity::resolve(category, wins, capacity, &self.working, &self.roster) {
            Resolution::NotAtThreshold => {}
            Resolution::NoLotRemaining => {
                debug!("no {category} lot left to auto-assign");
            }
            Resolution::NoEligibleParticipant => {
                warn!("{category} reached its threshold with no eligible participant");
            }
            Resolution::Assign { lot, winner } => {
                let Some(lot) = self.working.by_id_mut(lot) else {
                    warn!("auto-assign target missing from working catalog");
                    return;
                };
                lot.status = LotStatus::Acquired;
                lot.final_price = 0;
                lot.winner = Some(winner);
                let lot_snapshot = lot.clone();

                let mut winner_name = String::new();
                if let Some(participant) = self.roster.get_mut(winner) {
                    participant.record_acquisition(&lot_snapshot.name, 0, category);
                    winner_name = participant.display_name.clone();
                }
                self.state.record_win(category);

                info!(
                    "{} auto-assigned to {winner_name} at no cost",
                    lot_snapshot.name
                );
                self.notifier
                    .broadcast(EngineEvent::AutoAssigned {
                        lot: lot_snapshot,
                        winner: winner_name,
                    })
                    .await;
                self.broadcast_participant_status().await;
                self.broadcast_catalog_status().await;
            }
        }
    }

    /// After a close: pause before the next lot, or end the pass.
    async fn advance(&mut self) {
        let order = self.active_order();
        match sequencer::next_step(&order, self.state.cursor + 1, &self.working) {
            SequencerStep::Open { index, lot } => {
                if self.config.transition_seconds == 0 {
                    self.open_lot(index, lot).await;
                    return;
                }
                self.state.cursor = index;
                self.state.pending_lot = Some(lot);
                self.state.phase = Phase::Transition;
                self.state
                    .arm(CountdownKind::Transition, self.config.transition_seconds);

                let next = self
                    .working
                    .by_id(lot)
                    .map(LotSummary::from);
                if let Some(next) = next {
                    self.notifier
                        .broadcast(EngineEvent::TransitionStarted {
                            next,
                            seconds: self.config.transition_seconds,
                        })
                        .await;
                }
            }
            SequencerStep::Exhausted => self.end_pass().await,
        }
    }

    /// The pause is over; re-select in case the pending lot resolved in
    /// the meantime, then open.
    async fn open_after_transition(&mut self) {
        self.state.pending_lot = None;
        let order = self.active_order();
        match sequencer::next_step(&order, self.state.cursor, &self.working) {
            SequencerStep::Open { index, lot } => self.open_lot(index, lot).await,
            SequencerStep::Exhausted => self.end_pass().await,
        }
    }

    async fn end_pass(&mut self) {
        match self.state.pass {
            Pass::Primary => {
                let failed = self.working.failed_ids();
                if failed.is_empty() {
                    self.finish_round().await;
                } else {
                    self.start_failed_pass(failed).await;
                }
            }
            Pass::Failed => {
                if self.config.repeat_failed_pass {
                    let failed = self.working.failed_ids();
                    if !failed.is_empty() {
                        self.start_failed_pass(failed).await;
                        return;
                    }
                }
                self.finish_round().await;
            }
        }
    }

    /// Re-offer the lots that failed to sell, in catalog order.
    async fn start_failed_pass(&mut self, failed: Vec<LotId>) {
        info!("re-offering {} unsold lots", failed.len());
        self.state.pass = Pass::Failed;
        self.failed_order = failed;
        self.state.cursor = 0;
        self.notifier
            .broadcast(EngineEvent::FailedPassStarted {
                count: self.failed_order.len(),
            })
            .await;

        let order = self.active_order();
        match sequencer::next_step(&order, 0, &self.working) {
            SequencerStep::Open { index, lot } => self.open_lot(index, lot).await,
            SequencerStep::Exhausted => self.finish_round().await,
        }
    }

    /// Every lot resolved; start the countdown back to the lobby.
    async fn finish_round(&mut self) {
        info!("round complete; resetting in {}s", self.config.reset_seconds);
        self.state.phase = Phase::Finished;
        self.state.current_lot = None;
        self.state.pending_lot = None;
        self.state.clear_bidding();
        self.state.arm(CountdownKind::Reset, self.config.reset_seconds);

        self.notifier.broadcast(EngineEvent::RoundFinished).await;
        self.broadcast_participant_status().await;
        self.broadcast_catalog_status().await;
    }

    /// Back to the lobby: fresh lots, restored balances, cleared flags.
    async fn reset_round(&mut self) {
        info!("resetting contest to the lobby");
        self.working = self.catalog.working_copy();
        self.primary_order = self.working.ids();
        self.failed_order.clear();
        self.roster.reset_for_round();
        self.state.reset_round();

        self.notifier.broadcast(EngineEvent::RoundReset).await;
        self.broadcast_lobby().await;
        self.broadcast_participant_status().await;
        self.broadcast_catalog_status().await;
    }

    // ── Broadcast helpers ───────────────────────────────────────────────

    fn active_order(&self) -> Vec<LotId> {
        match self.state.pass {
            Pass::Primary => self.primary_order.clone(),
            Pass::Failed => self.failed_order.clone(),
        }
    }

    async fn reject_config(&self, id: ParticipantId, reason: &str) {
        debug!("configure from {id} rejected: {reason}");
        self.notifier
            .unicast(
                id,
                DirectEvent::ConfigRejected {
                    reason: reason.to_string(),
                },
            )
            .await;
    }

    async fn broadcast_lobby(&self) {
        let players = self
            .roster
            .iter()
            .map(|p| LobbyPlayer {
                display_name: p.display_name.clone(),
                ready: p.ready,
            })
            .collect();
        self.notifier
            .broadcast(EngineEvent::LobbyUpdate { players })
            .await;
    }

    async fn broadcast_participant_status(&self) {
        let open_lot = self.state.current_lot.and_then(|id| self.working.by_id(id));
        let players = self
            .roster
            .iter()
            .map(|p| ParticipantSnapshot {
                id: p.id,
                display_name: p.display_name.clone(),
                points: p.points,
                acquisitions: p.acquisitions().to_vec(),
                is_top_bidder: self.state.top_bidder == Some(p.id),
                can_bid: open_lot
                    .map(|lot| validator::can_bid(p, lot, &self.state, &self.config))
                    .unwrap_or(false),
            })
            .collect();
        self.notifier
            .broadcast(EngineEvent::ParticipantStatus { players })
            .await;
    }

    /// Full catalog snapshot in this round's offering order.
    async fn broadcast_catalog_status(&self) {
        let lots = self
            .primary_order
            .iter()
            .filter_map(|&id| self.working.by_id(id))
            .map(LotSummary::from)
            .collect();
        self.notifier
            .broadcast(EngineEvent::CatalogStatus { lots })
            .await;
    }
}
