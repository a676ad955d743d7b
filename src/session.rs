//! TCP session layer: assigns participant identities and relays JSON
//! lines between clients and the engine runtime.
//!
//! Each connection gets one read loop (client commands in) and one write
//! task (engine events out). The protocol is one JSON object per line in
//! both directions; outbound objects are the `events` types verbatim.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::EngineResult;
use crate::events::{DirectEvent, EngineEvent};
use crate::roster::ParticipantId;
use crate::runtime::EngineHandle;
use crate::traits::Notifier;

/// Commands a client may send, one JSON object per line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    Configure {
        display_name: String,
        starting_points: u32,
    },
    Ready,
    Bid { amount: u32 },
}

/// Notifier that fans events out over in-process channels.
///
/// Broadcasts go through a `tokio::sync::broadcast` channel every
/// connection subscribes to; unicasts go to a per-participant queue.
/// Delivery is fire-and-forget: a lagging or vanished client never blocks
/// the engine.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    events: broadcast::Sender<EngineEvent>,
    directs: Arc<RwLock<HashMap<ParticipantId, mpsc::UnboundedSender<DirectEvent>>>>,
}

impl ChannelNotifier {
    pub fn new(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity);
        Self {
            events,
            directs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Open the unicast queue for a participant.
    pub fn register(&self, id: ParticipantId) -> mpsc::UnboundedReceiver<DirectEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.directs.write().insert(id, tx);
        rx
    }

    pub fn unregister(&self, id: ParticipantId) {
        self.directs.write().remove(&id);
    }
}

impl Default for ChannelNotifier {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn broadcast(&self, event: EngineEvent) {
        // Err means no subscriber is connected right now; nothing to do.
        let _ = self.events.send(event);
    }

    async fn unicast(&self, to: ParticipantId, event: DirectEvent) {
        let tx = self.directs.read().get(&to).cloned();
        match tx {
            Some(tx) => {
                let _ = tx.send(event);
            }
            None => debug!("unicast to unknown participant {to} dropped"),
        }
    }
}

/// Accept loop: one task per connection, identities assigned in accept
/// order.
pub struct SessionServer {
    handle: EngineHandle,
    notifier: ChannelNotifier,
    shutdown: CancellationToken,
}

impl SessionServer {
    pub fn new(handle: EngineHandle, notifier: ChannelNotifier, shutdown: CancellationToken) -> Self {
        Self {
            handle,
            notifier,
            shutdown,
        }
    }

    pub async fn run(self, listener: TcpListener) -> EngineResult<()> {
        let local_addr = listener.local_addr()?;
        info!("session server listening on {local_addr}");
        let mut next_id: u64 = 1;

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("session server shutting down");
                    return Ok(());
                }
                accepted = listener.accept() => {
                    let (stream, peer) = accepted?;
                    let id = ParticipantId(next_id);
                    next_id += 1;
                    info!("connection from {peer} seated as {id}");
                    tokio::spawn(serve_connection(
                        stream,
                        id,
                        self.handle.clone(),
                        self.notifier.clone(),
                        self.shutdown.clone(),
                    ));
                }
            }
        }
    }
}

async fn serve_connection(
    stream: TcpStream,
    id: ParticipantId,
    handle: EngineHandle,
    notifier: ChannelNotifier,
    shutdown: CancellationToken,
) {
    let (read_half, write_half) = stream.into_split();
    let directs = notifier.register(id);
    let events = notifier.subscribe();
    // The engine answers with either a welcome or a server-full refusal
    // on the unicast queue just opened.
    handle.join(id).await;

    let writer = tokio::spawn(write_events(write_half, events, directs, shutdown.clone()));

    let mut lines = BufReader::new(read_half).lines();
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => dispatch_line(&handle, id, &line).await,
                    Ok(None) => break,
                    Err(e) => {
                        debug!("read error from {id}: {e}");
                        break;
                    }
                }
            }
        }
    }

    info!("{id} disconnected");
    handle.leave(id).await;
    notifier.unregister(id);
    writer.abort();
}

async fn dispatch_line(handle: &EngineHandle, id: ParticipantId, line: &str) {
    if line.trim().is_empty() {
        return;
    }
    match serde_json::from_str::<ClientCommand>(line) {
        Ok(ClientCommand::Configure {
            display_name,
            starting_points,
        }) => handle.configure(id, display_name, starting_points).await,
        Ok(ClientCommand::Ready) => handle.ready(id).await,
        Ok(ClientCommand::Bid { amount }) => handle.bid(id, amount).await,
        Err(e) => debug!("unparseable line from {id} ignored: {e}"),
    }
}

async fn write_events(
    mut write_half: OwnedWriteHalf,
    mut events: broadcast::Receiver<EngineEvent>,
    mut directs: mpsc::UnboundedReceiver<DirectEvent>,
    shutdown: CancellationToken,
) {
    loop {
        let serialized = tokio::select! {
            _ = shutdown.cancelled() => break,
            direct = directs.recv() => {
                match direct {
                    Some(event) => serde_json::to_string(&event),
                    None => break,
                }
            }
            event = events.recv() => {
                match event {
                    Ok(event) => serde_json::to_string(&event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("slow client skipped {skipped} events");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        };
        match serialized {
            Ok(mut line) => {
                line.push('\n');
                if write_half.write_all(line.as_bytes()).await.is_err() {
                    break;
                }
            }
            Err(e) => warn!("event serialization failed: {e}"),
        }
    }
}
