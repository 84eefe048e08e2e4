//! Session behavior against an in-memory link, on the paused clock.
//!
//! The far end of the link plays the control endpoint: `sent` receives
//! every frame the session puts on the wire, `push` injects inbound
//! frames. `settle()` yields long enough for the session task to run.

use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time;

use desklink::session::Session;
use desklink::transport::Link;
use desklink::{CommandRequest, Config, ConnectionStatus, DispatchError, FeedbackStatus, Level};

fn test_session() -> (
    Session,
    mpsc::UnboundedReceiver<String>,
    mpsc::UnboundedSender<String>,
) {
    let (link, sent, push) = Link::in_memory();
    (Session::attach(Config::default(), link), sent, push)
}

async fn settle() {
    time::sleep(Duration::from_millis(1)).await;
}

fn pc_info_frame(cpu: f64) -> String {
    json!({
        "type": "pc_info",
        "cpu_percent": cpu,
        "memory": 2_000_000_000u64,
        "memory_total": 8_000_000_000u64,
        "disk_usage": 100_000_000_000u64,
        "disk_total": 500_000_000_000u64,
        "system": "Linux",
        "node_name": "desk-01",
        "user": "alice",
        "ip_local": "192.168.0.20",
        "uptime": 3600.0,
    })
    .to_string()
}

fn log_frame(n: usize) -> String {
    json!({
        "type": "log",
        "level": "info",
        "message": format!("entry {n}"),
        "timestamp": n as f64,
    })
    .to_string()
}

#[tokio::test(start_paused = true)]
async fn hello_is_the_first_frame() {
    let (_session, mut sent, _push) = test_session();
    settle().await;

    let first: Value = serde_json::from_str(&sent.recv().await.unwrap()).unwrap();
    assert_eq!(first, json!({ "type": "hello", "role": "app" }));
}

#[tokio::test(start_paused = true)]
async fn shutdown_with_time_produces_exact_frame() {
    let (session, mut sent, _push) = test_session();
    settle().await;
    let _hello = sent.recv().await.unwrap();

    session
        .dispatch(
            CommandRequest::new("shutdown_with_time")
                .with("minutes", 15)
                .ungated(),
        )
        .await
        .unwrap();

    let frame: Value = serde_json::from_str(&sent.recv().await.unwrap()).unwrap();
    assert_eq!(
        frame,
        json!({
            "type": "command",
            "role": "app",
            "action": "shutdown_with_time",
            "minutes": 15,
        })
    );
}

#[tokio::test(start_paused = true)]
async fn cooldown_blocks_repeat_dispatch_and_sends_once() {
    let (session, mut sent, _push) = test_session();
    settle().await;
    let _hello = sent.recv().await.unwrap();

    // t=0: ping with a 3 s window goes through
    session.dispatch(CommandRequest::new("ping")).await.unwrap();

    // t=1: blocked, with roughly two seconds left
    time::sleep(Duration::from_millis(1100)).await;
    let err = session
        .dispatch(CommandRequest::new("ping"))
        .await
        .unwrap_err();
    assert_eq!(err, DispatchError::Cooldown { remaining_secs: 2 });
    assert_eq!(err.to_string(), "cooldown:2");

    // Exactly one ping frame reached the wire
    let frame: Value = serde_json::from_str(&sent.try_recv().unwrap()).unwrap();
    assert_eq!(frame["action"], "ping");
    assert!(sent.try_recv().is_err());

    // After the window elapses the next call succeeds
    time::sleep(Duration::from_millis(2100)).await;
    session.dispatch(CommandRequest::new("ping")).await.unwrap();
    assert!(sent.try_recv().is_ok());
}

#[tokio::test(start_paused = true)]
async fn cooldown_snapshot_tracks_countdown() {
    let (session, _sent, _push) = test_session();
    settle().await;

    session.dispatch(CommandRequest::new("reboot")).await.unwrap();
    settle().await;
    let cd = session.snapshot().cooldown;
    assert!(cd.active);
    assert_eq!(cd.remaining_secs, 3);

    time::sleep(Duration::from_millis(3100)).await;
    let cd = session.snapshot().cooldown;
    assert!(!cd.active);
    assert_eq!(cd.remaining_secs, 0);
}

#[tokio::test(start_paused = true)]
async fn heartbeat_keeps_host_online_until_threshold() {
    let (session, _sent, push) = test_session();
    settle().await;
    assert_eq!(session.snapshot().status, ConnectionStatus::Unknown);

    push.send(json!({ "type": "status" }).to_string()).unwrap();
    settle().await;
    assert_eq!(session.snapshot().status, ConnectionStatus::Online);
    assert!(session.snapshot().last_seen.is_some());

    // Silence: still online through t=9
    for _ in 0..9 {
        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(session.snapshot().status, ConnectionStatus::Online);
    }

    // First poll past the 10 s threshold flips it
    time::sleep(Duration::from_secs(2)).await;
    assert_eq!(session.snapshot().status, ConnectionStatus::Offline);

    // A fresh heartbeat recovers
    push.send(json!({ "type": "status" }).to_string()).unwrap();
    settle().await;
    assert_eq!(session.snapshot().status, ConnectionStatus::Online);
}

#[tokio::test(start_paused = true)]
async fn going_offline_clears_metrics_but_keeps_host_card() {
    let (session, _sent, push) = test_session();
    settle().await;

    for cpu in [10.0, 20.0, 30.0] {
        push.send(pc_info_frame(cpu)).unwrap();
    }
    settle().await;

    let snap = session.snapshot();
    assert_eq!(snap.status, ConnectionStatus::Online);
    assert_eq!(snap.metrics.cpu, vec![10.0, 20.0, 30.0]);
    assert_eq!(snap.metrics.ram.len(), 3);
    assert_eq!(snap.host.as_ref().unwrap().node_name, "desk-01");

    time::sleep(Duration::from_secs(12)).await;

    let snap = session.snapshot();
    assert_eq!(snap.status, ConnectionStatus::Offline);
    assert!(snap.metrics.cpu.is_empty());
    assert!(snap.metrics.ram.is_empty());
    // Last report stays; the status already marks it stale
    assert!(snap.host.is_some());
}

#[tokio::test(start_paused = true)]
async fn partial_pc_info_counts_as_heartbeat_only() {
    let (session, _sent, push) = test_session();
    settle().await;

    push.send(json!({ "type": "pc_info", "cpu_percent": 42.0 }).to_string())
        .unwrap();
    settle().await;

    let snap = session.snapshot();
    assert_eq!(snap.status, ConnectionStatus::Online);
    assert!(snap.metrics.cpu.is_empty());
    assert!(snap.host.is_none());
}

#[tokio::test(start_paused = true)]
async fn malformed_frames_change_nothing() {
    let (session, _sent, push) = test_session();
    settle().await;

    push.send(pc_info_frame(33.0)).unwrap();
    push.send(log_frame(1)).unwrap();
    settle().await;
    let before = session.snapshot();

    for bad in [
        "{not json",
        r#""just a string""#,
        r#"{"message":"no type"}"#,
        r#"{"type":"telemetry","value":1}"#,
        r#"{"type":"feedback","message":"missing status"}"#,
        r#"{"type":"log","level":"info"}"#,
    ] {
        push.send(bad.to_string()).unwrap();
    }
    settle().await;

    let after = session.snapshot();
    assert_eq!(after.status, before.status);
    assert_eq!(after.logs, before.logs);
    assert_eq!(after.metrics.cpu, before.metrics.cpu);
    assert_eq!(after.metrics.ram, before.metrics.ram);
    assert_eq!(after.feedback, before.feedback);
}

#[tokio::test(start_paused = true)]
async fn log_ring_caps_at_fifty_newest_first() {
    let (session, _sent, push) = test_session();
    settle().await;

    for n in 0..51 {
        push.send(log_frame(n)).unwrap();
    }
    settle().await;

    let logs = session.snapshot().logs;
    assert_eq!(logs.len(), 50);
    assert_eq!(logs[0].message, "entry 50");
    assert_eq!(logs[0].level, Level::Info);
    // "entry 0" was evicted
    assert_eq!(logs.last().unwrap().message, "entry 1");
}

#[tokio::test(start_paused = true)]
async fn clear_logs_empties_the_ring() {
    let (session, _sent, push) = test_session();
    settle().await;

    push.send(log_frame(1)).unwrap();
    settle().await;
    assert_eq!(session.snapshot().logs.len(), 1);

    session.clear_logs();
    settle().await;
    assert!(session.snapshot().logs.is_empty());
}

#[tokio::test(start_paused = true)]
async fn feedback_expires_after_three_seconds() {
    let (session, _sent, push) = test_session();
    settle().await;

    push.send(json!({ "type": "feedback", "status": "success", "message": "done" }).to_string())
        .unwrap();
    settle().await;

    let fb = session.snapshot().feedback.unwrap();
    assert_eq!(fb.status, FeedbackStatus::Success);
    assert_eq!(fb.message, "done");

    time::sleep(Duration::from_millis(3100)).await;
    assert!(session.snapshot().feedback.is_none());
}

#[tokio::test(start_paused = true)]
async fn newer_feedback_resets_the_expiry() {
    let (session, _sent, push) = test_session();
    settle().await;

    push.send(json!({ "type": "feedback", "status": "info", "message": "first" }).to_string())
        .unwrap();
    settle().await;

    time::sleep(Duration::from_secs(2)).await;
    push.send(json!({ "type": "feedback", "status": "error", "message": "second" }).to_string())
        .unwrap();
    settle().await;

    // t=4 from the first message: it would have expired, the second has not
    time::sleep(Duration::from_secs(2)).await;
    let fb = session.snapshot().feedback.unwrap();
    assert_eq!(fb.message, "second");

    time::sleep(Duration::from_millis(1200)).await;
    assert!(session.snapshot().feedback.is_none());
}

#[tokio::test(start_paused = true)]
async fn losing_the_link_goes_offline_and_rejects_dispatch() {
    let (session, _sent, push) = test_session();

    push.send(pc_info_frame(50.0)).unwrap();
    settle().await;
    assert_eq!(session.snapshot().status, ConnectionStatus::Online);

    drop(push);
    settle().await;

    let snap = session.snapshot();
    assert_eq!(snap.status, ConnectionStatus::Offline);
    assert!(snap.metrics.cpu.is_empty());
    let fb = snap.feedback.unwrap();
    assert_eq!(fb.status, FeedbackStatus::Error);
    assert_eq!(fb.message, "connection lost");

    let err = session
        .dispatch(CommandRequest::new("ping"))
        .await
        .unwrap_err();
    assert_eq!(err, DispatchError::NotConnected);
    assert_eq!(err.to_string(), "not-connected");

    // A rejected dispatch must not arm the cooldown
    settle().await;
    assert!(!session.snapshot().cooldown.active);
}

#[tokio::test(start_paused = true)]
async fn attached_session_cannot_reconnect() {
    let (session, _sent, _push) = test_session();
    settle().await;
    assert!(session.reconnect().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn close_releases_the_link() {
    let (session, mut sent, _push) = test_session();
    settle().await;
    let _hello = sent.recv().await.unwrap();

    session.close().await;

    // Outbound side dropped with the actor — the wire is closed
    assert!(sent.recv().await.is_none());
}
