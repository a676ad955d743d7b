//! End-to-end session test over a loopback socket: connect, ready up,
//! and watch the round open.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use draftroom::mocks::{make_test_catalog, MockRandom};
use draftroom::{
    AuctionEngine, ChannelNotifier, EngineConfig, EngineRuntime, SessionServer,
};

async fn read_until_type(
    lines: &mut tokio::io::Lines<BufReader<tokio::net::tcp::OwnedReadHalf>>,
    wanted: &str,
) -> serde_json::Value {
    timeout(Duration::from_secs(5), async {
        loop {
            let line = lines
                .next_line()
                .await
                .expect("read from server")
                .expect("server closed the connection");
            let value: serde_json::Value =
                serde_json::from_str(&line).expect("server lines are JSON");
            if value["type"] == wanted {
                return value;
            }
        }
    })
    .await
    .expect("expected event did not arrive in time")
}

#[tokio::test]
async fn test_session_roundtrip_over_loopback() {
    let shutdown = CancellationToken::new();
    let notifier = ChannelNotifier::default();

    let config = EngineConfig {
        roster_capacity: 1,
        ..EngineConfig::default()
    };
    let catalog = make_test_catalog(&[(1, "mid", 50)]);
    let engine = AuctionEngine::new(config, catalog, notifier.clone(), MockRandom::identity());
    let (runtime, handle) = EngineRuntime::new(engine, shutdown.clone());
    tokio::spawn(runtime.run());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(SessionServer::new(handle, notifier, shutdown.clone()).run(listener));

    let stream = TcpStream::connect(addr).await.unwrap();
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    let welcome = read_until_type(&mut lines, "welcome").await;
    assert_eq!(welcome["display_name"], "P1");

    write_half.write_all(b"{\"type\":\"ready\"}\n").await.unwrap();

    let opened = read_until_type(&mut lines, "auction_opened").await;
    assert_eq!(opened["lot"]["name"], "Lot 1");
    assert_eq!(opened["phase"], "primary_bidding");

    shutdown.cancel();
}
