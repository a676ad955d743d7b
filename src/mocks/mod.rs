//! Mock implementations for testing.
//!
//! This module provides mock implementations of the trait abstractions
//! that allow unit testing without timers or network connections, plus a
//! few fixture helpers shared across the test suites.

pub mod notifier;
pub mod random;

pub use notifier::MockNotifier;
pub use random::MockRandom;

use crate::catalog::{Catalog, Lot, LotId, LotStatus};

/// Build a lot fixture with a derived name.
pub fn make_test_lot(id: u32, category: &str, starting_price: u32) -> Lot {
    Lot {
        id: LotId(id),
        name: format!("Lot {id}"),
        category: category.into(),
        starting_price,
        status: LotStatus::Unsold,
        final_price: 0,
        winner: None,
    }
}

/// Build a catalog fixture from `(id, category, starting_price)` triples.
#[allow(clippy::expect_used)]
pub fn make_test_catalog(rows: &[(u32, &str, u32)]) -> Catalog {
    let lots = rows
        .iter()
        .map(|&(id, category, price)| make_test_lot(id, category, price))
        .collect();
    Catalog::new(lots).expect("test catalog rows must be valid")
}
