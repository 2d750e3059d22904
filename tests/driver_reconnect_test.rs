/*!
 * Integration tests for the tokio driver against real sockets
 *
 * A local `TcpListener` plays the remote peer. The shutdown future passed to
 * `run_until` doubles as the peer's script, so the driver runs exactly as
 * long as the scenario needs.
 */

use std::time::Duration;
use tether::config::TetherConfig;
use tether::driver::{Driver, LineLogger};
use tether::ConnectionState;
use tether_core_reconnect::{ConnectionEvent, RecordingLogger, ScriptedJitter};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::{sleep, timeout};

const SCENARIO_LIMIT: Duration = Duration::from_secs(10);

/// Tight timings so a full backoff cycle takes well under a second
fn fast_config(port: u16) -> TetherConfig {
    let mut config = TetherConfig {
        host: "127.0.0.1".to_string(),
        port,
        heartbeat_interval_ms: 10,
        ..Default::default()
    };
    config.reconnect.reconnect_interval = 0.1;
    config.reconnect.reconnect_jitter = 0.0;
    config.reconnect.min_reconnect_delay = 0.05;
    config.reconnect.address_fallback_delay = 0.01;
    config
}

#[tokio::test]
async fn test_reconnects_after_peer_closes() {
    tether::logging::init_test_logging();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handler = LineLogger::new().keep_lines();
    let mut driver = Driver::new(&fast_config(port), handler)
        .unwrap()
        .with_jitter(ScriptedJitter::zero());

    let peer = async move {
        for session in 0..2 {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket
                .write_all(format!("session {}\n", session).as_bytes())
                .await
                .unwrap();
            // give the driver time to read before the close
            sleep(Duration::from_millis(100)).await;
        }
        // refuse the retry that follows the second close
        drop(listener);
        sleep(Duration::from_millis(100)).await;
    };

    timeout(SCENARIO_LIMIT, driver.run_until(peer))
        .await
        .expect("scenario timed out");

    let handler = driver.connection().handler();
    assert_eq!(handler.sessions(), 2);
    assert_eq!(handler.lines(), ["session 0", "session 1"]);
    assert_eq!(driver.connection().state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_greeting_sent_on_every_session() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handler = LineLogger::new().with_greeting("HELLO");
    let mut driver = Driver::new(&fast_config(port), handler).unwrap();

    let peer = async {
        for _ in 0..2 {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 6];
            socket.read_exact(&mut buf).await.unwrap();
            assert_eq!(&buf, b"HELLO\n");
        }
    };

    timeout(SCENARIO_LIMIT, driver.run_until(peer))
        .await
        .expect("scenario timed out");

    assert!(driver.connection().handler().sessions() >= 2);
}

#[tokio::test]
async fn test_keeps_retrying_while_nothing_listens() {
    // bind then drop to find a port with nothing behind it
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };

    let logger = RecordingLogger::new();
    let mut driver = Driver::new(&fast_config(port), LineLogger::new())
        .unwrap()
        .with_logger(logger.clone());

    timeout(
        SCENARIO_LIMIT,
        driver.run_until(sleep(Duration::from_millis(500))),
    )
    .await
    .expect("scenario timed out");

    assert!(driver.connection().connector().attempts() >= 3);
    assert_eq!(driver.connection().handler().sessions(), 0);
    // the first refusal is reported; later ones may be suppressed
    assert!(logger
        .events()
        .iter()
        .any(|e| matches!(e, ConnectionEvent::ConnectionLost { .. })));
}

#[tokio::test]
async fn test_shutdown_disconnects_live_session() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let logger = RecordingLogger::new();
    let mut driver = Driver::new(&fast_config(port), LineLogger::new())
        .unwrap()
        .with_logger(logger.clone());

    let (accepted_tx, accepted_rx) = tokio::sync::oneshot::channel();
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let _ = accepted_tx.send(());
        // reads EOF once the driver closes its side
        let mut buf = Vec::new();
        let _ = socket.read_to_end(&mut buf).await;
    });

    let shutdown = async {
        let _ = accepted_rx.await;
        sleep(Duration::from_millis(100)).await;
    };
    timeout(SCENARIO_LIMIT, driver.run_until(shutdown))
        .await
        .expect("scenario timed out");

    assert_eq!(driver.connection().state(), ConnectionState::Disconnected);
    assert_eq!(driver.connection().reconnect_at(), None);
    assert!(logger.events().contains(&ConnectionEvent::Disconnecting {
        reason: "Shutting down".to_string(),
    }));

    timeout(SCENARIO_LIMIT, server)
        .await
        .expect("peer never saw the close")
        .unwrap();
}
