pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod roster;
pub mod runtime;
pub mod session;
pub mod traits;

#[cfg(any(test, feature = "test-support"))]
pub mod mocks;

pub use catalog::{Catalog, Category, Lot, LotId, LotStatus, LotSummary, WorkingCatalog};
pub use config::EngineConfig;
pub use engine::{AuctionEngine, AuctionState, BidRejection, Phase};
pub use error::{EngineError, EngineResult};
pub use events::{DirectEvent, EngineEvent, LobbyPlayer, ParticipantSnapshot};
pub use roster::{Acquisition, Participant, ParticipantId, Roster};
pub use runtime::{Command, EngineHandle, EngineRuntime};
pub use session::{ChannelNotifier, ClientCommand, SessionServer};
pub use traits::{Notifier, RandomSource, ThreadRngSource};
