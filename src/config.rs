//! Configuration constants and tunables for the auction engine.
//!
//! This module centralizes magic numbers and configuration values
//! to improve maintainability and enable easier tuning.

use serde::Deserialize;

use crate::error::{EngineError, EngineResult};

/// Number of seats in the roster. A round starts only once this many
/// participants have joined and all of them are ready.
pub const ROSTER_CAPACITY: usize = 3;

/// How many lots of one category a single participant may hold.
pub const CATEGORY_CAP: u32 = 1;

/// Point balance granted to a participant that has not configured its own.
pub const STARTING_POINTS: u32 = 1_000;

/// Bids must be exact multiples of this step.
pub const BID_INCREMENT: u32 = 10;

/// Initial bidding window for a lot offered in the primary pass.
pub const OPENING_SECONDS: u32 = 15;

/// Initial bidding window for a lot re-offered in the failed-lot pass.
/// Re-offers get a longer window than the primary pass.
pub const REOFFER_SECONDS: u32 = 30;

/// Pause between the close of one lot and the opening of the next.
pub const TRANSITION_SECONDS: u32 = 5;

/// Countdown broadcast after the last lot resolves, before the contest
/// resets to the lobby.
pub const RESET_SECONDS: u32 = 60;

/// A bid accepted with at most this many seconds left triggers the
/// anti-snipe extension.
pub const SNIPE_WINDOW_SECONDS: u32 = 3;

/// Value the window is raised to when the anti-snipe extension fires.
pub const SNIPE_RESET_SECONDS: u32 = 8;

/// Environment variable for the session listen address.
pub const LISTEN_ADDR_ENV: &str = "DRAFTROOM_ADDR";

/// Environment variable for the catalog CSV path.
pub const CATALOG_PATH_ENV: &str = "DRAFTROOM_CATALOG";

/// Default session listen address.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:4500";

/// Default catalog CSV path.
pub const DEFAULT_CATALOG_PATH: &str = "data/items.csv";

/// Tunable knobs of the auction engine.
///
/// `Default` mirrors the constants above. Most deployments only override
/// a couple of fields; tests routinely shrink the windows to keep tick
/// counts small.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Roster seats; readiness arity equals this.
    pub roster_capacity: usize,
    /// Per-participant cap on lots held in one category.
    pub category_cap: u32,
    /// Default starting point balance.
    pub starting_points: u32,
    /// Bid step; bids must be exact multiples.
    pub bid_increment: u32,
    /// Bidding window for primary-pass lots.
    pub opening_seconds: u32,
    /// Bidding window for failed-pass re-offers.
    pub reoffer_seconds: u32,
    /// Pause between lots. Zero disables the pause entirely.
    pub transition_seconds: u32,
    /// Countdown from the end of a round back to the lobby.
    pub reset_seconds: u32,
    /// Remaining-seconds threshold that arms the anti-snipe extension.
    pub snipe_window_seconds: u32,
    /// Window value after an anti-snipe extension. Never shortens the window.
    pub snipe_reset_seconds: u32,
    /// Apply the anti-snipe extension on every accepted bid instead of
    /// only when the window is nearly closed.
    pub snipe_reset_always: bool,
    /// Re-run the failed-lot pass until no failed lots remain instead of
    /// sweeping it once.
    pub repeat_failed_pass: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            roster_capacity: ROSTER_CAPACITY,
            category_cap: CATEGORY_CAP,
            starting_points: STARTING_POINTS,
            bid_increment: BID_INCREMENT,
            opening_seconds: OPENING_SECONDS,
            reoffer_seconds: REOFFER_SECONDS,
            transition_seconds: TRANSITION_SECONDS,
            reset_seconds: RESET_SECONDS,
            snipe_window_seconds: SNIPE_WINDOW_SECONDS,
            snipe_reset_seconds: SNIPE_RESET_SECONDS,
            snipe_reset_always: false,
            repeat_failed_pass: false,
        }
    }
}

impl EngineConfig {
    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> EngineResult<()> {
        if self.roster_capacity == 0 {
            return Err(EngineError::Config("roster_capacity must be non-zero".into()));
        }
        if self.category_cap == 0 {
            return Err(EngineError::Config("category_cap must be non-zero".into()));
        }
        if self.bid_increment == 0 {
            return Err(EngineError::Config("bid_increment must be non-zero".into()));
        }
        if self.opening_seconds == 0 || self.reoffer_seconds == 0 {
            return Err(EngineError::Config(
                "bidding windows must be at least one second".into(),
            ));
        }
        Ok(())
    }

    /// Build a config from the process environment, starting from defaults.
    ///
    /// Recognized variables: `DRAFTROOM_ROSTER_CAPACITY`,
    /// `DRAFTROOM_CATEGORY_CAP`, `DRAFTROOM_STARTING_POINTS`,
    /// `DRAFTROOM_OPENING_SECONDS`, `DRAFTROOM_REOFFER_SECONDS`,
    /// `DRAFTROOM_TRANSITION_SECONDS`, `DRAFTROOM_RESET_SECONDS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_parse("DRAFTROOM_ROSTER_CAPACITY") {
            config.roster_capacity = v;
        }
        if let Some(v) = env_parse("DRAFTROOM_CATEGORY_CAP") {
            config.category_cap = v;
        }
        if let Some(v) = env_parse("DRAFTROOM_STARTING_POINTS") {
            config.starting_points = v;
        }
        if let Some(v) = env_parse("DRAFTROOM_OPENING_SECONDS") {
            config.opening_seconds = v;
        }
        if let Some(v) = env_parse("DRAFTROOM_REOFFER_SECONDS") {
            config.reoffer_seconds = v;
        }
        if let Some(v) = env_parse("DRAFTROOM_TRANSITION_SECONDS") {
            config.transition_seconds = v;
        }
        if let Some(v) = env_parse("DRAFTROOM_RESET_SECONDS") {
            config.reset_seconds = v;
        }
        config
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}
