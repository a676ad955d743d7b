//! The single mutable auction state record and its countdown discipline.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{Category, LotId};
use crate::roster::ParticipantId;

/// Phase of the contest. Exactly one phase is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Waiting for a full, ready roster.
    Lobby,
    /// Sweeping the shuffled catalog.
    PrimaryBidding,
    /// Fixed pause between two lots.
    Transition,
    /// Re-offering the lots that failed to sell.
    FailedBidding,
    /// Round over; reset countdown running.
    Finished,
}

/// Which ordered lot sequence the round is currently iterating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Primary,
    Failed,
}

impl Pass {
    /// The bidding phase that runs this pass.
    pub fn bidding_phase(self) -> Phase {
        match self {
            Self::Primary => Phase::PrimaryBidding,
            Self::Failed => Phase::FailedBidding,
        }
    }
}

/// What an armed countdown is counting toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownKind {
    /// A bidding window on the current lot.
    Bidding,
    /// The pause before the next lot opens.
    Transition,
    /// The end-of-round reset.
    Reset,
}

/// The single armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub kind: CountdownKind,
    pub remaining: u32,
}

/// The one mutable record the engine owns.
///
/// All mutation happens through the engine's serialized command handling;
/// nothing outside the engine holds a mutable reference.
#[derive(Debug)]
pub struct AuctionState {
    pub phase: Phase,
    pub pass: Pass,
    /// Cursor into the active pass's ordered lot sequence.
    pub cursor: usize,
    /// Lot currently open for bidding.
    pub current_lot: Option<LotId>,
    /// Lot announced during a transition, opened when the pause ends.
    pub pending_lot: Option<LotId>,
    pub top_bid: u32,
    pub top_bidder: Option<ParticipantId>,
    countdown: Option<Countdown>,
    category_wins: HashMap<Category, u32>,
}

impl AuctionState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Lobby,
            pass: Pass::Primary,
            cursor: 0,
            current_lot: None,
            pending_lot: None,
            top_bid: 0,
            top_bidder: None,
            countdown: None,
            category_wins: HashMap::new(),
        }
    }

    /// Arm the single countdown, disarming any previous one first.
    pub fn arm(&mut self, kind: CountdownKind, seconds: u32) {
        if let Some(previous) = self.countdown.take() {
            debug!(kind = ?previous.kind, "disarming countdown before re-arm");
        }
        self.countdown = Some(Countdown {
            kind,
            remaining: seconds,
        });
    }

    pub fn disarm(&mut self) {
        self.countdown = None;
    }

    pub fn countdown(&self) -> Option<Countdown> {
        self.countdown
    }

    /// Decrement the countdown if one of `expected` kind is armed.
    ///
    /// Returns the new remaining value, or `None` for a stale tick (no
    /// countdown armed, or armed for something else).
    pub fn tick_down(&mut self, expected: CountdownKind) -> Option<u32> {
        match &mut self.countdown {
            Some(countdown) if countdown.kind == expected => {
                countdown.remaining = countdown.remaining.saturating_sub(1);
                Some(countdown.remaining)
            }
            _ => None,
        }
    }

    /// Raise the armed bidding window to `seconds`, never shortening it.
    ///
    /// Returns the new remaining value if the window actually grew.
    pub fn extend_bidding(&mut self, seconds: u32) -> Option<u32> {
        match &mut self.countdown {
            Some(countdown)
                if countdown.kind == CountdownKind::Bidding && countdown.remaining < seconds =>
            {
                countdown.remaining = seconds;
                Some(seconds)
            }
            _ => None,
        }
    }

    /// Clear the per-lot bidding fields when a new lot opens.
    pub fn clear_bidding(&mut self) {
        self.top_bid = 0;
        self.top_bidder = None;
    }

    pub fn wins(&self, category: &Category) -> u32 {
        self.category_wins.get(category).copied().unwrap_or(0)
    }

    /// Count one resolved lot (sold or auto-assigned) for `category`.
    pub fn record_win(&mut self, category: &Category) {
        *self.category_wins.entry(category.clone()).or_insert(0) += 1;
    }

    /// Back to the lobby baseline for a fresh round.
    pub fn reset_round(&mut self) {
        self.phase = Phase::Lobby;
        self.pass = Pass::Primary;
        self.cursor = 0;
        self.current_lot = None;
        self.pending_lot = None;
        self.clear_bidding();
        self.countdown = None;
        self.category_wins.clear();
    }
}

impl Default for AuctionState {
    fn default() -> Self {
        Self::new()
    }
}
