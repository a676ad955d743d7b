//! End-game shortcut for a nearly-exhausted category.
//!
//! Once all but one roster seat for a category has been filled, only one
//! participant can still legally take the remaining lot, so it is awarded
//! at zero cost instead of running a bidding window with a single
//! possible holder.

use crate::catalog::{Category, LotId, WorkingCatalog};
use crate::roster::{ParticipantId, Roster};

/// Outcome of a scarcity check after a win in some category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Fewer than capacity-minus-one seats filled; nothing to do.
    NotAtThreshold,
    /// Award `lot` to `winner` at zero cost.
    Assign { lot: LotId, winner: ParticipantId },
    /// Threshold reached but no unresolved lot remains in the category.
    /// Normal when catalog supply is below roster capacity.
    NoLotRemaining,
    /// Threshold reached with a lot available but no participant whose
    /// category slot is still empty. Indicates a bookkeeping defect.
    NoEligibleParticipant,
}

/// Decide whether the last lot of `category` should be auto-assigned.
///
/// Pure decision; the scheduler applies the mutations and broadcasts.
pub fn resolve(
    category: &Category,
    wins: u32,
    capacity: u32,
    catalog: &WorkingCatalog,
    roster: &Roster,
) -> Resolution {
    if wins != capacity.saturating_sub(1) {
        return Resolution::NotAtThreshold;
    }

    let Some(lot) = catalog.first_unresolved_in(category) else {
        return Resolution::NoLotRemaining;
    };

    match roster.first_without_holding(category) {
        Some(winner) => Resolution::Assign {
            lot: lot.id,
            winner,
        },
        None => Resolution::NoEligibleParticipant,
    }
}
