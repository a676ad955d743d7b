//! Event types flowing from the engine to participants.
//!
//! Everything here is fire-and-forget from the engine's perspective; the
//! notifier seam decides how an event reaches a client. Events are plain
//! serde types so the session layer can ship them as JSON lines.

use serde::{Deserialize, Serialize};

use crate::catalog::{Lot, LotId, LotSummary};
use crate::engine::Phase;
use crate::roster::{Acquisition, ParticipantId};

/// One row of the lobby roster broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyPlayer {
    pub display_name: String,
    pub ready: bool,
}

/// Per-participant status snapshot, sent after any balance, holding, or
/// top-bidder change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantSnapshot {
    pub id: ParticipantId,
    pub display_name: String,
    pub points: u32,
    pub acquisitions: Vec<Acquisition>,
    pub is_top_bidder: bool,
    /// Whether this participant could legally bid on the open lot right
    /// now (alternation and category-cap rules against the latest state).
    pub can_bid: bool,
}

/// Events broadcast to every connected participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Roster composition or readiness changed.
    LobbyUpdate { players: Vec<LobbyPlayer> },
    /// All seats ready; the round is starting.
    RoundStarted,
    /// A lot is open for bidding.
    AuctionOpened { lot: Lot, phase: Phase },
    /// One-second countdown update for the open lot.
    TimerUpdate { lot_id: LotId, remaining: u32 },
    /// A bid was accepted.
    BidUpdate {
        lot_id: LotId,
        amount: u32,
        bidder: ParticipantId,
        bidder_name: String,
    },
    /// The bidding window closed; `winner` is the display name on a sale.
    LotClosed { lot: Lot, winner: Option<String> },
    /// A lot was auto-assigned at zero cost.
    AutoAssigned { lot: Lot, winner: String },
    /// Balances, holdings, and eligibility for everyone.
    ParticipantStatus { players: Vec<ParticipantSnapshot> },
    /// Status of every lot in the working catalog.
    CatalogStatus { lots: Vec<LotSummary> },
    /// Pause before the next lot; `next` is the upcoming lot.
    TransitionStarted { next: LotSummary, seconds: u32 },
    /// One-second countdown update during the pause.
    TransitionTick { remaining: u32 },
    /// The primary pass ended with unsold lots; the re-offer pass begins.
    FailedPassStarted { count: usize },
    /// Every lot has resolved; the reset countdown begins.
    RoundFinished,
    /// One-second countdown update before the lobby reset.
    ResetTick { remaining: u32 },
    /// The contest is back in the lobby.
    RoundReset,
}

/// Events sent to exactly one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DirectEvent {
    /// Post-join confirmation with the assigned identity.
    Welcome {
        id: ParticipantId,
        display_name: String,
    },
    /// The roster was full; no seat was created.
    ServerFull,
    /// A bid was rejected; `reason` names the failed rule.
    BidRejected { reason: String },
    /// A lobby configuration change was rejected.
    ConfigRejected { reason: String },
}
