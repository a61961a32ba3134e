use rask_log_sink::app::tail;
use rask_log_sink::appender::broadcast::wire::EventReader;
use rask_log_sink::{Appender, AppenderError, AppenderState, BroadcastAppender, BroadcastHub, Level, LoggingEvent};
use std::io::BufReader;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

const WAIT: Duration = Duration::from_secs(5);

type Client = EventReader<BufReader<TcpStream>>;

fn hub_with(engine: BroadcastHub) -> BroadcastAppender {
    let appender = BroadcastAppender::new(
        "hub",
        engine.with_bind_address(IpAddr::V4(Ipv4Addr::LOCALHOST)),
    );
    appender.activate_options().unwrap();
    appender
}

fn hub() -> BroadcastAppender {
    hub_with(BroadcastHub::new(0))
}

fn connect(appender: &BroadcastAppender) -> Client {
    let stream = TcpStream::connect(appender.local_addr().unwrap()).unwrap();
    stream.set_read_timeout(Some(WAIT)).unwrap();
    EventReader::new(BufReader::new(stream))
}

fn wait_for_clients(appender: &BroadcastAppender, expected: usize) {
    let deadline = Instant::now() + WAIT;
    while appender.connected_clients() != expected {
        assert!(
            Instant::now() < deadline,
            "expected {expected} clients, hub has {}",
            appender.connected_clients()
        );
        std::thread::sleep(Duration::from_millis(10));
    }
}

fn event(message: impl Into<String>) -> LoggingEvent {
    LoggingEvent::new("broadcast", Level::Info, message)
}

fn receive(client: &mut Client, count: usize) -> Vec<String> {
    (0..count)
        .map(|_| client.next().unwrap().unwrap().message)
        .collect()
}

#[test]
fn test_no_clients_drops_events() {
    let appender = hub();
    for i in 0..100 {
        appender.do_append(&event(format!("unheard {i}"))).unwrap();
    }
    assert_eq!(appender.connected_clients(), 0);
}

#[test]
fn test_every_client_receives_every_event_in_order() {
    let appender = hub();
    let mut clients: Vec<Client> = (0..3).map(|_| connect(&appender)).collect();
    wait_for_clients(&appender, 3);

    let sent: Vec<String> = (0..50).map(|i| format!("event {i}")).collect();
    for message in &sent {
        appender.do_append(&event(message.clone())).unwrap();
    }

    for client in &mut clients {
        assert_eq!(receive(client, sent.len()), sent);
    }
}

#[test]
fn test_late_client_misses_earlier_events() {
    let appender = hub();
    appender.do_append(&event("before")).unwrap();

    let mut client = connect(&appender);
    wait_for_clients(&appender, 1);
    appender.do_append(&event("after")).unwrap();

    assert_eq!(receive(&mut client, 1), vec!["after"]);
}

#[test]
fn test_disconnected_client_is_removed_and_others_keep_receiving() {
    let appender = hub();
    let mut staying = connect(&appender);
    let leaving = connect(&appender);
    wait_for_clients(&appender, 2);

    drop(leaving);

    let mut sent = Vec::new();
    let deadline = Instant::now() + WAIT;
    while appender.connected_clients() == 2 {
        assert!(Instant::now() < deadline, "closed client was never removed");
        let message = format!("event {}", sent.len());
        appender.do_append(&event(message.clone())).unwrap();
        sent.push(message);
        std::thread::sleep(Duration::from_millis(5));
    }

    appender.do_append(&event("after removal")).unwrap();
    sent.push("after removal".to_string());

    assert_eq!(appender.connected_clients(), 1);
    assert_eq!(receive(&mut staying, sent.len()), sent);
}

#[test]
fn test_client_that_stops_reading_is_evicted() {
    let appender = hub_with(BroadcastHub::new(0).with_client_queue_capacity(4));
    let _stalled = connect(&appender);
    wait_for_clients(&appender, 1);

    let payload = "x".repeat(16 * 1024);
    let deadline = Instant::now() + WAIT;
    while appender.connected_clients() == 1 {
        assert!(Instant::now() < deadline, "stalled client was never evicted");
        appender.do_append(&event(payload.clone())).unwrap();
    }

    // Dispatch is unaffected once the client is gone.
    appender.do_append(&event("still fine")).unwrap();
    assert_eq!(appender.connected_clients(), 0);
}

#[test]
fn test_stalled_client_does_not_hold_back_healthy_client() {
    let appender = hub_with(BroadcastHub::new(0).with_client_queue_capacity(8));
    let stalled = connect(&appender);
    let healthy = connect(&appender);
    wait_for_clients(&appender, 2);

    let reader = std::thread::spawn(move || {
        let mut received = Vec::new();
        for event in healthy {
            received.push(event.unwrap().message);
        }
        received
    });

    let payload = "x".repeat(64 * 1024);
    let mut sent = Vec::new();
    let deadline = Instant::now() + WAIT;
    while appender.connected_clients() == 2 {
        assert!(Instant::now() < deadline, "stalled client was never evicted");
        let message = format!("{}:{payload}", sent.len());
        appender.do_append(&event(message.clone())).unwrap();
        sent.push(message);
        // Pace dispatch so only the client that never reads can fall behind.
        std::thread::sleep(Duration::from_millis(1));
    }
    for i in 0..20 {
        let message = format!("after {i}");
        appender.do_append(&event(message.clone())).unwrap();
        sent.push(message);
    }
    assert_eq!(appender.connected_clients(), 1);

    // Closing ends the healthy stream once its queue is drained.
    appender.close();
    let received = reader.join().unwrap();
    drop(stalled);

    assert_eq!(received.len(), sent.len());
    assert!(received == sent, "healthy client must see every event in order");
}

#[test]
fn test_close_flushes_queued_events_then_ends_stream() {
    let appender = hub();
    let mut client = connect(&appender);
    wait_for_clients(&appender, 1);

    for i in 0..3 {
        appender.do_append(&event(format!("last {i}"))).unwrap();
    }
    appender.close();

    assert_eq!(receive(&mut client, 3), vec!["last 0", "last 1", "last 2"]);
    assert!(client.next().is_none(), "stream should end after close");
}

#[test]
fn test_close_is_idempotent_and_releases_port() {
    let appender = hub();
    let addr = appender.local_addr().unwrap();

    appender.close();
    appender.close();

    assert_eq!(appender.state(), AppenderState::Closed);
    assert!(appender.local_addr().is_none());
    assert!(matches!(
        appender.do_append(&event("late")),
        Err(AppenderError::Closed(_))
    ));
    TcpListener::bind(addr).expect("port should be free after close");
}

#[test]
fn test_bind_conflict_fails_activation() {
    let occupied = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = occupied.local_addr().unwrap().port();

    let appender = BroadcastAppender::new(
        "hub",
        BroadcastHub::new(port).with_bind_address(IpAddr::V4(Ipv4Addr::LOCALHOST)),
    );

    assert!(matches!(
        appender.activate_options(),
        Err(AppenderError::Bind { .. })
    ));
    assert_eq!(appender.state(), AppenderState::Inactive);
    assert!(matches!(
        appender.do_append(&event("nowhere")),
        Err(AppenderError::Inactive(_))
    ));
}

#[test]
fn test_options_configure_hub() {
    let appender = BroadcastAppender::new("hub", BroadcastHub::default());
    appender.set_option("Port", "0").unwrap();
    appender.set_option("BindAddress", "127.0.0.1").unwrap();
    appender.set_option("LocationInfo", "true").unwrap();
    appender.activate_options().unwrap();

    let addr: SocketAddr = appender.local_addr().unwrap();
    assert!(addr.ip().is_loopback());

    let mut client = connect(&appender);
    wait_for_clients(&appender, 1);
    appender
        .do_append(&event("located").with_location("src/lib.rs", 7, "sink"))
        .unwrap();

    let received = client.next().unwrap().unwrap();
    let location = received.location.expect("location requested");
    assert_eq!(location.line, 7);
}

#[test]
fn test_location_stripped_by_default() {
    let appender = hub();
    let mut client = connect(&appender);
    wait_for_clients(&appender, 1);

    appender
        .do_append(&event("located").with_location("src/lib.rs", 7, "sink").with_ndc("req-1"))
        .unwrap();

    let received = client.next().unwrap().unwrap();
    assert!(received.location.is_none());
    assert_eq!(received.ndc.as_deref(), Some("req-1"));
}

#[test]
fn test_threshold_applies_before_broadcast() {
    let appender = hub();
    appender.set_option("Threshold", "WARN").unwrap();
    let mut client = connect(&appender);
    wait_for_clients(&appender, 1);

    appender.do_append(&event("quiet")).unwrap();
    appender
        .do_append(&LoggingEvent::new("broadcast", Level::Error, "loud"))
        .unwrap();

    let received = client.next().unwrap().unwrap();
    assert_eq!(received.message, "loud");
    assert_eq!(received.level, Level::Error);
}

#[test]
fn test_concurrent_producers_keep_per_thread_order() {
    let appender = Arc::new(hub());
    let mut client = connect(&appender);
    wait_for_clients(&appender, 1);

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let appender = appender.clone();
            std::thread::spawn(move || {
                for i in 0..50 {
                    appender.do_append(&event(format!("{t}:{i}"))).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut next = [0u32; 4];
    for message in receive(&mut client, 200) {
        let (thread, index) = message.split_once(':').unwrap();
        let thread: usize = thread.parse().unwrap();
        assert_eq!(index.parse::<u32>().unwrap(), next[thread]);
        next[thread] += 1;
    }
    assert_eq!(next, [50; 4]);
}

#[tokio::test]
async fn test_tail_follows_hub_until_close() {
    let appender = Arc::new(hub());
    let stream = tokio::net::TcpStream::connect(appender.local_addr().unwrap())
        .await
        .unwrap();

    let deadline = Instant::now() + WAIT;
    while appender.connected_clients() == 0 {
        assert!(Instant::now() < deadline);
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    appender.do_append(&event("one")).unwrap();
    appender
        .do_append(&LoggingEvent::new("broadcast", Level::Warn, "two"))
        .unwrap();

    let closer = appender.clone();
    tokio::task::spawn_blocking(move || closer.close()).await.unwrap();

    let mut out = Vec::new();
    let printed = tail::follow(
        tokio::io::BufReader::new(stream),
        &mut out,
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(printed, 2);
    assert_eq!(String::from_utf8(out).unwrap(), "INFO - one\nWARN - two\n");
}
