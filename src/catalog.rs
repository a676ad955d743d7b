//! The item catalog: lots, their categories, and CSV loading.
//!
//! The catalog is loaded once at startup and its order is immutable for
//! the lifetime of the process. Every round works on a deep copy so the
//! master order can be reshuffled fresh each time.

use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::roster::ParticipantId;

/// Identifier of a lot, taken from the catalog file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LotId(pub u32);

impl fmt::Display for LotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lot#{}", self.0)
    }
}

/// A scarce classification of lots. Each participant may hold at most a
/// configured number of lots per category, and at most roster-capacity
/// lots of one category resolve per round.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(pub String);

impl Category {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Status of a lot within the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LotStatus {
    /// Not yet offered, or offered and still open.
    Unsold,
    /// Offered and closed without a winning bid.
    Failed,
    /// Sold to a winning bidder or auto-assigned.
    Acquired,
}

/// One auctionable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    pub id: LotId,
    pub name: String,
    pub category: Category,
    /// Minimum opening bid when no bid has been placed yet.
    pub starting_price: u32,
    pub status: LotStatus,
    /// Hammer price; zero for an auto-assigned lot.
    pub final_price: u32,
    pub winner: Option<ParticipantId>,
}

impl Lot {
    fn new(id: LotId, name: String, category: Category, starting_price: u32) -> Self {
        Self {
            id,
            name,
            category,
            starting_price,
            status: LotStatus::Unsold,
            final_price: 0,
            winner: None,
        }
    }
}

/// Compact per-lot view for status broadcasts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotSummary {
    pub id: LotId,
    pub name: String,
    pub category: Category,
    pub status: LotStatus,
}

impl From<&Lot> for LotSummary {
    fn from(lot: &Lot) -> Self {
        Self {
            id: lot.id,
            name: lot.name.clone(),
            category: lot.category.clone(),
            status: lot.status,
        }
    }
}

/// Shape of one catalog CSV row.
#[derive(Debug, Deserialize)]
struct CatalogRow {
    id: u32,
    name: String,
    category: String,
    starting_price: u32,
}

/// The immutable master catalog, in file order.
#[derive(Debug, Clone)]
pub struct Catalog {
    lots: Vec<Lot>,
}

impl Catalog {
    /// Build a catalog from already-constructed lots.
    ///
    /// Rejects an empty list and duplicate ids; both indicate a broken
    /// catalog file rather than a runtime condition.
    pub fn new(lots: Vec<Lot>) -> EngineResult<Self> {
        if lots.is_empty() {
            return Err(EngineError::Catalog("catalog contains no lots".into()));
        }
        let mut seen = HashSet::new();
        for lot in &lots {
            if !seen.insert(lot.id) {
                return Err(EngineError::Catalog(format!("duplicate lot id {}", lot.id)));
            }
        }
        Ok(Self { lots })
    }

    /// Load the catalog from a CSV file at `path`.
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            EngineError::Catalog(format!("cannot open {}: {e}", path.display()))
        })?;
        Self::from_reader(file)
    }

    /// Load the catalog from CSV data with `id,name,category,starting_price`
    /// columns.
    pub fn from_reader<R: Read>(reader: R) -> EngineResult<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut lots = Vec::new();
        for row in csv_reader.deserialize() {
            let row: CatalogRow =
                row.map_err(|e| EngineError::Catalog(format!("bad catalog row: {e}")))?;
            lots.push(Lot::new(
                LotId(row.id),
                row.name,
                Category(row.category),
                row.starting_price,
            ));
        }
        Self::new(lots)
    }

    pub fn len(&self) -> usize {
        self.lots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    pub fn lots(&self) -> &[Lot] {
        &self.lots
    }

    /// Deep copy for a new round, every lot back to `Unsold`.
    pub fn working_copy(&self) -> WorkingCatalog {
        let lots = self
            .lots
            .iter()
            .map(|lot| Lot::new(lot.id, lot.name.clone(), lot.category.clone(), lot.starting_price))
            .collect();
        WorkingCatalog { lots }
    }
}

/// The per-round mutable copy of the catalog.
///
/// Lot order here matches the master; the round's offering order is a
/// separate shuffled id list owned by the engine, so status lookups stay
/// stable regardless of how the round iterates.
#[derive(Debug, Clone)]
pub struct WorkingCatalog {
    lots: Vec<Lot>,
}

impl WorkingCatalog {
    pub fn lots(&self) -> &[Lot] {
        &self.lots
    }

    pub fn ids(&self) -> Vec<LotId> {
        self.lots.iter().map(|lot| lot.id).collect()
    }

    pub fn by_id(&self, id: LotId) -> Option<&Lot> {
        self.lots.iter().find(|lot| lot.id == id)
    }

    pub fn by_id_mut(&mut self, id: LotId) -> Option<&mut Lot> {
        self.lots.iter_mut().find(|lot| lot.id == id)
    }

    pub fn status_of(&self, id: LotId) -> Option<LotStatus> {
        self.by_id(id).map(|lot| lot.status)
    }

    /// Ids of lots currently marked `Failed`, in catalog order.
    pub fn failed_ids(&self) -> Vec<LotId> {
        self.lots
            .iter()
            .filter(|lot| lot.status == LotStatus::Failed)
            .map(|lot| lot.id)
            .collect()
    }

    /// The first lot of `category` not yet acquired, in catalog order.
    pub fn first_unresolved_in(&self, category: &Category) -> Option<&Lot> {
        self.lots
            .iter()
            .find(|lot| &lot.category == category && lot.status != LotStatus::Acquired)
    }

    /// Per-lot summaries for the catalog status broadcast.
    pub fn summaries(&self) -> Vec<LotSummary> {
        self.lots.iter().map(LotSummary::from).collect()
    }
}
