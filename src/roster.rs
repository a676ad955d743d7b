//! Participant roster: identities, balances, and per-category holdings.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::Category;

/// Identifier for a connected participant, assigned by the session layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// One lot a participant has won, in acquisition order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acquisition {
    pub lot_name: String,
    /// Hammer price; zero for an auto-assigned lot.
    pub price: u32,
    pub category: Category,
}

/// A participant in the contest.
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: ParticipantId,
    pub display_name: String,
    /// Current spendable balance.
    pub points: u32,
    /// Balance restored at every round reset.
    pub starting_points: u32,
    pub ready: bool,
    holdings: HashMap<Category, u32>,
    acquired: Vec<Acquisition>,
}

impl Participant {
    fn new(id: ParticipantId, display_name: String, starting_points: u32) -> Self {
        Self {
            id,
            display_name,
            points: starting_points,
            starting_points,
            ready: false,
            holdings: HashMap::new(),
            acquired: Vec::new(),
        }
    }

    /// Lots of `category` this participant currently holds.
    pub fn holding_count(&self, category: &Category) -> u32 {
        self.holdings.get(category).copied().unwrap_or(0)
    }

    pub fn acquisitions(&self) -> &[Acquisition] {
        &self.acquired
    }

    /// Record a won or auto-assigned lot. The caller debits `points`
    /// separately since auto-assignments are free.
    pub fn record_acquisition(&mut self, lot_name: &str, price: u32, category: &Category) {
        *self.holdings.entry(category.clone()).or_insert(0) += 1;
        self.acquired.push(Acquisition {
            lot_name: lot_name.to_string(),
            price,
            category: category.clone(),
        });
    }

    /// Restore the participant to its pre-round state.
    fn reset_for_round(&mut self) {
        self.points = self.starting_points;
        self.ready = false;
        self.holdings.clear();
        self.acquired.clear();
    }
}

/// The fixed-capacity set of participants.
///
/// Join order is preserved; eligibility scans and default display names
/// both depend on it.
#[derive(Debug)]
pub struct Roster {
    capacity: usize,
    participants: Vec<Participant>,
}

impl Roster {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            participants: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() >= self.capacity
    }

    /// Register a new participant with a default display name.
    ///
    /// Returns `None` when the roster is full or the id is already seated;
    /// no state changes in either case.
    pub fn join(&mut self, id: ParticipantId, starting_points: u32) -> Option<&Participant> {
        if self.is_full() || self.get(id).is_some() {
            return None;
        }
        let display_name = format!("P{}", self.participants.len() + 1);
        self.participants
            .push(Participant::new(id, display_name, starting_points));
        self.participants.last()
    }

    /// Remove a participant. Returns whether anything was removed.
    pub fn leave(&mut self, id: ParticipantId) -> bool {
        let before = self.participants.len();
        self.participants.retain(|p| p.id != id);
        let removed = self.participants.len() != before;
        if removed {
            debug!("participant {id} left the roster");
        }
        removed
    }

    pub fn get(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: ParticipantId) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter()
    }

    pub fn ready_count(&self) -> usize {
        self.participants.iter().filter(|p| p.ready).count()
    }

    /// True when every seat is filled and every participant is ready.
    pub fn all_ready(&self) -> bool {
        self.is_full() && self.participants.iter().all(|p| p.ready)
    }

    /// First participant (join order) holding no lot of `category`.
    pub fn first_without_holding(&self, category: &Category) -> Option<ParticipantId> {
        self.participants
            .iter()
            .find(|p| p.holding_count(category) == 0)
            .map(|p| p.id)
    }

    /// Restore every participant to its pre-round state.
    pub fn reset_for_round(&mut self) {
        for participant in &mut self.participants {
            participant.reset_for_round();
        }
    }
}
