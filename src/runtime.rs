//! The single-writer runtime around the engine.
//!
//! One task owns the [`AuctionEngine`] and drains a command queue and a
//! one-second interval from the same `select!` loop, so timer ticks and
//! participant commands are applied in a total order and can never
//! interleave.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::engine::AuctionEngine;
use crate::roster::ParticipantId;
use crate::traits::{Notifier, RandomSource};

/// Commands accepted by the engine runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Join { id: ParticipantId },
    Leave { id: ParticipantId },
    Configure {
        id: ParticipantId,
        display_name: String,
        starting_points: u32,
    },
    Ready { id: ParticipantId },
    Bid { id: ParticipantId, amount: u32 },
}

/// Cloneable handle for submitting commands to the runtime.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<Command>,
}

impl EngineHandle {
    /// Enqueue a command. Dropped silently if the runtime has shut down;
    /// by then there is nobody left to answer.
    pub async fn send(&self, command: Command) {
        if self.tx.send(command).await.is_err() {
            debug!("engine runtime is gone; command dropped");
        }
    }

    pub async fn join(&self, id: ParticipantId) {
        self.send(Command::Join { id }).await;
    }

    pub async fn leave(&self, id: ParticipantId) {
        self.send(Command::Leave { id }).await;
    }

    pub async fn configure(&self, id: ParticipantId, display_name: String, starting_points: u32) {
        self.send(Command::Configure {
            id,
            display_name,
            starting_points,
        })
        .await;
    }

    pub async fn ready(&self, id: ParticipantId) {
        self.send(Command::Ready { id }).await;
    }

    pub async fn bid(&self, id: ParticipantId, amount: u32) {
        self.send(Command::Bid { id, amount }).await;
    }
}

/// Owns the engine and serializes everything that mutates it.
pub struct EngineRuntime<N, R>
where
    N: Notifier,
    R: RandomSource,
{
    engine: AuctionEngine<N, R>,
    rx: mpsc::Receiver<Command>,
    shutdown: CancellationToken,
}

impl<N, R> EngineRuntime<N, R>
where
    N: Notifier,
    R: RandomSource,
{
    pub fn new(
        engine: AuctionEngine<N, R>,
        shutdown: CancellationToken,
    ) -> (Self, EngineHandle) {
        let (tx, rx) = mpsc::channel(64);
        (
            Self {
                engine,
                rx,
                shutdown,
            },
            EngineHandle { tx },
        )
    }

    /// Drive the engine until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first interval tick completes immediately; skip it so the
        // first real tick lands a full second after arming.
        ticker.tick().await;

        info!("engine runtime started");
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("engine runtime shutting down");
                    break;
                }
                command = self.rx.recv() => {
                    match command {
                        Some(command) => self.dispatch(command).await,
                        None => {
                            info!("all engine handles dropped; runtime stopping");
                            break;
                        }
                    }
                }
                _ = ticker.tick(), if self.engine.timer_armed() => {
                    self.engine.tick().await;
                }
            }
        }
    }

    async fn dispatch(&mut self, command: Command) {
        match command {
            Command::Join { id } => self.engine.handle_join(id).await,
            Command::Leave { id } => self.engine.handle_leave(id).await,
            Command::Configure {
                id,
                display_name,
                starting_points,
            } => {
                self.engine
                    .handle_configure(id, display_name, starting_points)
                    .await;
            }
            Command::Ready { id } => self.engine.handle_ready(id).await,
            Command::Bid { id, amount } => self.engine.handle_bid(id, amount).await,
        }
    }
}
