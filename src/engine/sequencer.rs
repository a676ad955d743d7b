//! Lot selection within a pass.
//!
//! Pure functions over an ordered id sequence, a cursor, and the working
//! catalog's statuses. Keeping selection out of the scheduler means
//! "skip an already-resolved lot" has exactly one implementation.

use crate::catalog::{LotId, LotStatus, WorkingCatalog};

/// What the scheduler should do next within the active pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerStep {
    /// Offer the lot at `index` in the pass order.
    Open { index: usize, lot: LotId },
    /// Nothing left to offer in this pass.
    Exhausted,
}

/// Find the first offerable lot at or after `cursor` in `order`.
///
/// Lots already `Acquired` (scarcity resolution reaching ahead of the
/// cursor) are skipped. Terminates after at most `order.len() - cursor`
/// probes; statuses only ever move toward `Acquired` within a pass.
pub fn next_step(order: &[LotId], cursor: usize, catalog: &WorkingCatalog) -> SequencerStep {
    for (offset, &lot) in order.iter().enumerate().skip(cursor) {
        match catalog.status_of(lot) {
            Some(LotStatus::Acquired) | None => continue,
            Some(_) => {
                return SequencerStep::Open {
                    index: offset,
                    lot,
                }
            }
        }
    }
    SequencerStep::Exhausted
}
