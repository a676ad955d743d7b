//! Bid legality rules.
//!
//! Validation is pure: it inspects the auction state and the bidder's
//! roster entry and never mutates either. The engine applies the
//! mutations only after a bid passes every rule.

use crate::catalog::{Category, Lot};
use crate::config::EngineConfig;
use crate::engine::state::{AuctionState, Phase};
use crate::roster::Participant;

/// Why a bid was refused. `Display` is the user-visible reason.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BidRejection {
    #[error("no lot is open for bidding")]
    AuctionClosed,

    #[error("your {0} slot is already filled")]
    CategoryFull(Category),

    #[error("you are already the top bidder; another participant must bid first")]
    AlreadyTopBidder,

    #[error("bids must be placed in steps of {increment} points")]
    NotIncrementMultiple { increment: u32 },

    #[error("the minimum bid is {required} points")]
    BelowRequiredPrice { required: u32 },

    #[error("a bid of {amount} exceeds your balance of {points} points")]
    InsufficientPoints { amount: u32, points: u32 },
}

/// The smallest amount the next bid must reach: the lot's starting price
/// while no bid stands, otherwise one increment above the top bid.
pub fn required_price(top_bid: u32, starting_price: u32, increment: u32) -> u32 {
    if top_bid == 0 {
        starting_price
    } else {
        top_bid + increment
    }
}

/// Check every bid rule in order, returning the first violation.
pub fn validate(
    amount: u32,
    bidder: &Participant,
    lot: &Lot,
    state: &AuctionState,
    config: &EngineConfig,
) -> Result<(), BidRejection> {
    let bidding_phase = matches!(state.phase, Phase::PrimaryBidding | Phase::FailedBidding);
    if !bidding_phase || state.current_lot != Some(lot.id) {
        return Err(BidRejection::AuctionClosed);
    }

    if bidder.holding_count(&lot.category) >= config.category_cap {
        return Err(BidRejection::CategoryFull(lot.category.clone()));
    }

    if state.top_bidder == Some(bidder.id) {
        return Err(BidRejection::AlreadyTopBidder);
    }

    if amount % config.bid_increment != 0 {
        return Err(BidRejection::NotIncrementMultiple {
            increment: config.bid_increment,
        });
    }

    let required = required_price(state.top_bid, lot.starting_price, config.bid_increment);
    if amount < required {
        return Err(BidRejection::BelowRequiredPrice { required });
    }

    if amount > bidder.points {
        return Err(BidRejection::InsufficientPoints {
            amount,
            points: bidder.points,
        });
    }

    Ok(())
}

/// Whether a participant could legally bid on the open lot right now,
/// considering only the alternation and category-cap rules. Used for the
/// eligibility flags in status broadcasts.
pub fn can_bid(
    participant: &Participant,
    lot: &Lot,
    state: &AuctionState,
    config: &EngineConfig,
) -> bool {
    state.top_bidder != Some(participant.id)
        && participant.holding_count(&lot.category) < config.category_cap
}
