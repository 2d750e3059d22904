//! Scenario tests for the reconnect life cycle
//!
//! These drive a `ReconnectingConnection` the way an event loop would, with a
//! manual clock and scripted jitter so every timestamp is exact.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tether_core_reconnect::{
    Candidate, Clock, ConnectionEvent, ConnectionState, Connector, ManualClock, NoopHandler, RandJitter,
    ReconnectingConnection, RecordingLogger, ResolveError, ScriptedJitter, Transport,
    TransportError, TransportFault,
};

struct MockSocket;

impl Transport for MockSocket {
    fn connect(&mut self, _addr: SocketAddr) -> Result<(), TransportError> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

#[derive(Default)]
struct MockConnector {
    attempts: Vec<SocketAddr>,
}

impl Connector for MockConnector {
    type Transport = MockSocket;

    fn create(&mut self, candidate: &Candidate) -> Result<MockSocket, TransportError> {
        self.attempts.push(candidate.addr);
        Ok(MockSocket)
    }
}

type Conn = ReconnectingConnection<MockConnector, NoopHandler>;

fn secs(value: f64) -> Duration {
    Duration::from_secs_f64(value)
}

fn candidate(last: u8) -> SocketAddr {
    SocketAddr::from(([198, 51, 100, last], 1234))
}

fn build(
    addrs: Vec<SocketAddr>,
    jitter: impl tether_core_reconnect::JitterSource + Send + 'static,
) -> (Conn, ManualClock, RecordingLogger, Arc<AtomicUsize>) {
    let clock = ManualClock::starting_at(secs(1000.0));
    let logger = RecordingLogger::new();
    let resolves = Arc::new(AtomicUsize::new(0));
    let counter = resolves.clone();

    let conn = ReconnectingConnection::new("test.example", 1234, MockConnector::default(), NoopHandler)
        .with_resolver(move |_host: &str, _port: u16| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ResolveError>(addrs.iter().copied().map(Candidate::stream).collect::<Vec<_>>())
        })
        .with_jitter(jitter)
        .with_clock(clock.clone())
        .with_logger(logger.clone());

    (conn, clock, logger, resolves)
}

/// Fire the pending reconnect, with the clock moved to its due time
fn fire(conn: &mut Conn, clock: &ManualClock) {
    let due = conn.reconnect_at().expect("reconnect should be scheduled");
    if clock.now() < due {
        clock.set(due);
    }
    conn.heartbeat(clock.now());
}

#[test]
fn test_three_short_sessions_arm_suppression() {
    let (mut conn, clock, logger, _) = build(vec![candidate(1)], ScriptedJitter::zero());

    conn.reconnect();
    for round in 0..3 {
        if round > 0 {
            fire(&mut conn, &clock);
        }
        assert_eq!(conn.state(), ConnectionState::Connecting);
        conn.handle_connect();
        clock.advance(secs(60.0));
        conn.handle_close();
    }

    let last_close = clock.now();
    assert_eq!(conn.failures(), 3);
    assert!(conn.is_suppressing());
    assert_eq!(conn.suppress_until(), last_close + secs(900.0));

    assert_eq!(
        logger.events(),
        vec![
            ConnectionEvent::LostConnection,
            ConnectionEvent::LostConnection,
            ConnectionEvent::SuppressionEnabled {
                window: secs(900.0)
            },
        ]
    );
}

#[test]
fn test_suppression_window_silences_but_keeps_retrying() {
    let (mut conn, clock, logger, _) = build(vec![candidate(1)], ScriptedJitter::zero());

    conn.reconnect();
    conn.set_error_suppression();
    logger.take();

    for _ in 0..10 {
        conn.handle_error(TransportFault::network("connection refused"));
        assert!(conn.reconnect_at().is_some());
        fire(&mut conn, &clock);
        assert_eq!(conn.state(), ConnectionState::Connecting);
    }
    conn.disconnect("operator request");

    assert!(conn.is_suppressing());
    // the threshold crossing re-announces the window; nothing else gets through
    let events = logger.events();
    assert!(
        events
            .iter()
            .all(|e| matches!(e, ConnectionEvent::SuppressionEnabled { .. })),
        "unexpected events: {:?}",
        events
    );
}

#[test]
fn test_suppression_expires_and_rearms_after_one_failure() {
    let (mut conn, clock, logger, _) = build(vec![candidate(1)], ScriptedJitter::zero());

    conn.reconnect();
    conn.set_error_suppression();
    let until = conn.suppress_until();
    logger.take();

    conn.handle_close();
    clock.set(until + secs(1.0));
    fire(&mut conn, &clock);

    // window over: cleared at the start of the reconnect
    assert!(!conn.is_suppressing());
    assert_eq!(conn.failures(), 2);
    assert_eq!(conn.suppress_until(), Duration::ZERO);

    // a single further short session re-arms it
    conn.handle_close();
    assert_eq!(conn.failures(), 3);
    assert!(conn.is_suppressing());
    assert_eq!(conn.suppress_until(), clock.now() + secs(900.0));
    assert!(logger
        .events()
        .contains(&ConnectionEvent::SuppressionEnabled { window: secs(900.0) }));
}

#[test]
fn test_reset_error_suppression_restores_two_failures() {
    let (mut conn, _clock, _logger, _) = build(vec![candidate(1)], ScriptedJitter::zero());

    conn.reset_error_suppression();
    assert_eq!(conn.failures(), 2);
    assert!(!conn.is_suppressing());

    for _ in 0..6 {
        conn.reconnect();
        conn.handle_close();
    }
    conn.set_error_suppression();
    conn.reset_error_suppression();
    assert_eq!(conn.failures(), 2);
    assert!(!conn.is_suppressing());
    assert_eq!(conn.suppress_until(), Duration::ZERO);
}

#[test]
fn test_address_fallback_then_full_backoff() {
    // second draw is the exhausted-list jitter: 0.5 * 4.0 = 2.0
    let (mut conn, clock, _logger, resolves) =
        build(vec![candidate(1), candidate(2)], ScriptedJitter::new([0.5]));

    conn.reconnect();
    assert_eq!(conn.pending_candidates().count(), 1);

    conn.handle_error(TransportFault::network("connection refused"));
    assert_eq!(conn.reconnect_at(), Some(secs(1000.5)));

    fire(&mut conn, &clock);
    assert_eq!(conn.state(), ConnectionState::Connecting);
    assert_eq!(conn.pending_candidates().count(), 0);
    assert_eq!(resolves.load(Ordering::SeqCst), 1);

    clock.advance(secs(0.5));
    conn.handle_close();
    // raw = 1000.5 + 10 - 1001 + 2 = 11.5
    assert_eq!(conn.reconnect_at(), Some(secs(1001.0 + 11.5)));

    fire(&mut conn, &clock);
    assert_eq!(resolves.load(Ordering::SeqCst), 2);
    assert_eq!(
        conn.connector().attempts,
        vec![candidate(1), candidate(2), candidate(1)]
    );
}

#[test]
fn test_candidates_used_in_resolver_order() {
    let addrs = vec![candidate(3), candidate(1), candidate(2)];
    let (mut conn, clock, _logger, resolves) = build(addrs.clone(), ScriptedJitter::zero());

    conn.reconnect();
    for _ in 0..2 {
        conn.handle_close();
        assert_eq!(
            conn.reconnect_at(),
            Some(clock.now() + secs(0.5)),
            "fallback delay while candidates remain"
        );
        fire(&mut conn, &clock);
    }

    assert_eq!(conn.connector().attempts, addrs);
    assert_eq!(resolves.load(Ordering::SeqCst), 1);
}

#[test]
fn test_schedule_reconnect_is_idempotent() {
    let (mut conn, clock, _logger, _) =
        build(vec![candidate(1)], ScriptedJitter::new([0.1, 0.9, 0.9]));

    conn.schedule_reconnect();
    let first = conn.reconnect_at();
    assert!(first.is_some());

    clock.advance(secs(1.0));
    conn.schedule_reconnect();
    assert_eq!(conn.reconnect_at(), first);
}

#[test]
fn test_liveness_under_repeated_failures() {
    let (mut conn, clock, _logger, _) =
        build(vec![candidate(1), candidate(2)], RandJitter::seeded(2024));

    conn.reconnect();
    for step in 0..200 {
        match step % 3 {
            0 => conn.handle_close(),
            1 => conn.handle_error(TransportFault::network("timed out")),
            _ => conn.handle_error(TransportFault::unexpected("invariant broken")),
        }

        let now = clock.now();
        let due = conn.reconnect_at().expect("every failure schedules a retry");
        let delay = due - now;
        if conn.pending_candidates().count() > 0 {
            assert_eq!(delay, secs(0.5));
        } else {
            assert!(delay >= secs(2.0), "delay {:?} below floor", delay);
        }

        fire(&mut conn, &clock);
        assert_eq!(conn.state(), ConnectionState::Connecting);
    }
}

#[test]
fn test_suppression_does_not_change_scheduling() {
    let fractions = [0.3, 0.7, 0.1, 0.9, 0.5, 0.2, 0.8, 0.4];
    let (mut quiet, quiet_clock, _, _) =
        build(vec![candidate(1)], ScriptedJitter::new(fractions));
    let (mut loud, loud_clock, _, _) = build(vec![candidate(1)], ScriptedJitter::new(fractions));

    quiet.set_error_suppression();
    quiet.reconnect();
    loud.reconnect();

    for _ in 0..4 {
        quiet_clock.advance(secs(3.0));
        loud_clock.advance(secs(3.0));
        quiet.handle_close();
        loud.handle_close();
        assert_eq!(quiet.reconnect_at(), loud.reconnect_at());
        fire(&mut quiet, &quiet_clock);
        fire(&mut loud, &loud_clock);
        assert_eq!(quiet.state(), loud.state());
    }
}

#[test]
fn test_manual_close_counts_like_automatic_close() {
    let (mut manual, manual_clock, manual_log, _) = build(vec![candidate(1)], ScriptedJitter::zero());
    let (mut auto, auto_clock, _, _) = build(vec![candidate(1)], ScriptedJitter::zero());

    manual.reconnect();
    auto.reconnect();
    manual.handle_connect();
    auto.handle_connect();
    manual_clock.advance(secs(120.0));
    auto_clock.advance(secs(120.0));

    manual.close(true);
    auto.close(false);

    assert_eq!(manual.failures(), auto.failures());
    assert!(manual_log.is_empty());
    assert_eq!(manual.reconnect_at(), None);
    assert!(auto.reconnect_at().is_some());
}
