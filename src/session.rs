// ─────────────────────────────────────────────────────────────────
//  session.rs — the control session actor
//
//  One task owns every piece of mutable state (liveness, cooldown,
//  logs, metrics, feedback) and serializes all mutations through a
//  single select loop: inbound frames, control messages, the liveness
//  poll, the cooldown countdown, the feedback expiry. The handle only
//  sends messages and reads immutable snapshots.
// ─────────────────────────────────────────────────────────────────

use std::pin::Pin;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Sleep};
use url::Url;

use crate::config::Config;
use crate::cooldown::CooldownGate;
use crate::error::{DispatchError, TransportError};
use crate::history::{LogRing, MetricHistory};
use crate::liveness::LivenessMonitor;
use crate::models::{
    CommandRequest, ConnectionStatus, CooldownState, Feedback, FeedbackStatus, LogEntry, PcInfo,
};
use crate::protocol::{self, Event};
use crate::transport::{self, Link};

/// Immutable read of the session's derived state, published on every
/// mutation. The presentation layer renders from this and nothing else.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub status: ConnectionStatus,
    pub last_seen: Option<DateTime<Utc>>,
    pub cooldown: CooldownState,
    /// Newest first, at most 50.
    pub logs: Vec<LogEntry>,
    pub metrics: MetricsSnapshot,
    /// Last full report from the host. Kept across offline transitions;
    /// `status` already says whether it is current.
    pub host: Option<PcInfo>,
    pub feedback: Option<Feedback>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Oldest first, at most 60 samples per stream.
    pub cpu: Vec<f64>,
    pub ram: Vec<f64>,
}

enum Control {
    Dispatch {
        cmd: CommandRequest,
        reply: oneshot::Sender<Result<(), DispatchError>>,
    },
    ClearLogs,
    Reconnect {
        reply: oneshot::Sender<Result<(), TransportError>>,
    },
    Close,
}

/// Handle to a running session. Getters are non-blocking snapshot reads;
/// `dispatch`/`reconnect` are round-trips into the actor task.
pub struct Session {
    control: mpsc::UnboundedSender<Control>,
    snapshot_rx: watch::Receiver<Snapshot>,
    task: JoinHandle<()>,
}

impl Session {
    /// Connect to the configured endpoint and start the session. The
    /// hello handshake is the first frame on the wire.
    pub async fn connect(cfg: Config) -> Result<Session, TransportError> {
        let url = Url::parse(&cfg.ws_url)?;
        let link = transport::connect(&url).await?;
        Ok(Session::start(cfg, link, Some(url)))
    }

    /// Run a session over an already-established link. Such a session
    /// cannot `reconnect` — it does not own an endpoint address.
    pub fn attach(cfg: Config, link: Link) -> Session {
        Session::start(cfg, link, None)
    }

    fn start(cfg: Config, link: Link, url: Option<Url>) -> Session {
        let (control_tx, control_rx) = mpsc::unbounded_channel();

        let actor = Actor {
            liveness: LivenessMonitor::new(Duration::from_millis(cfg.heartbeat_threshold_ms)),
            gate: CooldownGate::new(),
            logs: LogRing::new(),
            metrics: MetricHistory::new(),
            host: None,
            feedback: None,
            outbound: link.tx,
            inbound: link.rx,
            connected: true,
            url,
            cfg,
            control_rx,
        };

        let (snapshot_tx, snapshot_rx) = watch::channel(actor.snapshot());
        let task = tokio::spawn(actor.run(snapshot_tx));

        Session {
            control: control_tx,
            snapshot_rx,
            task,
        }
    }

    /// Send a command, subject to the cooldown gate and connection state.
    /// A rejection is synchronous and final; nothing is queued or retried.
    pub async fn dispatch(&self, cmd: CommandRequest) -> Result<(), DispatchError> {
        let (reply, rx) = oneshot::channel();
        self.control
            .send(Control::Dispatch { cmd, reply })
            .map_err(|_| DispatchError::Closed)?;
        rx.await.map_err(|_| DispatchError::Closed)?
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Change feed for consumers that would rather wait than poll.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_rx.clone()
    }

    pub fn clear_logs(&self) {
        let _ = self.control.send(Control::ClearLogs);
    }

    /// Explicit manual reconnect. Never happens automatically: a dead
    /// connection stays dead (and the status offline) until this is
    /// called or the session is rebuilt.
    pub async fn reconnect(&self) -> Result<(), TransportError> {
        let (reply, rx) = oneshot::channel();
        self.control
            .send(Control::Reconnect { reply })
            .map_err(|_| TransportError::NotConnected)?;
        rx.await.map_err(|_| TransportError::NotConnected)?
    }

    /// Tear everything down: the actor exits, dropping its poll interval,
    /// any cooldown countdown, any feedback timer, and the link (which
    /// closes the socket). One path for every shutdown.
    pub async fn close(self) {
        let _ = self.control.send(Control::Close);
        let _ = self.task.await;
    }
}

struct Actor {
    cfg: Config,
    liveness: LivenessMonitor,
    gate: CooldownGate,
    logs: LogRing,
    metrics: MetricHistory,
    host: Option<PcInfo>,
    feedback: Option<Feedback>,
    outbound: mpsc::UnboundedSender<String>,
    inbound: mpsc::UnboundedReceiver<String>,
    connected: bool,
    url: Option<Url>,
    control_rx: mpsc::UnboundedReceiver<Control>,
}

impl Actor {
    async fn run(mut self, snapshot_tx: watch::Sender<Snapshot>) {
        self.send_hello();

        let mut poll = time::interval(Duration::from_millis(self.cfg.liveness_poll_ms));
        poll.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        // Live only while a cooldown window is counting down
        let mut countdown: Option<time::Interval> = None;
        // One-shot, re-armed by every new feedback
        let mut feedback_expiry: Option<Pin<Box<Sleep>>> = None;

        loop {
            tokio::select! {
                frame = self.inbound.recv(), if self.connected => {
                    match frame {
                        Some(text) => self.on_frame(&text, &mut feedback_expiry),
                        None => self.on_disconnect(&mut feedback_expiry),
                    }
                }

                ctrl = self.control_rx.recv() => {
                    match ctrl {
                        Some(Control::Dispatch { cmd, reply }) => {
                            let _ = reply.send(self.on_dispatch(&cmd, &mut countdown));
                        }
                        Some(Control::ClearLogs) => self.logs.clear(),
                        Some(Control::Reconnect { reply }) => {
                            let _ = reply.send(self.on_reconnect().await);
                        }
                        // Channel gone = every handle dropped; same teardown
                        Some(Control::Close) | None => break,
                    }
                }

                _ = poll.tick() => self.on_poll(),

                _ = async { countdown.as_mut().unwrap().tick().await },
                    if countdown.is_some() =>
                {
                    if self.gate.tick() {
                        countdown = None;
                    }
                }

                _ = async { feedback_expiry.as_mut().unwrap().await },
                    if feedback_expiry.is_some() =>
                {
                    self.feedback = None;
                    feedback_expiry = None;
                }
            }

            snapshot_tx.send_replace(self.snapshot());
        }

        tracing::debug!("Session task exiting");
    }

    fn send_hello(&mut self) {
        if self.outbound.send(protocol::hello_frame()).is_err() {
            self.connected = false;
        }
    }

    fn on_frame(&mut self, raw: &str, feedback_expiry: &mut Option<Pin<Box<Sleep>>>) {
        match protocol::decode(raw) {
            Ok(Event::Heartbeat) => self.liveness.mark_alive(Instant::now()),
            Ok(Event::PcInfo(info)) => {
                self.liveness.mark_alive(Instant::now());
                self.metrics.record(&info);
                self.host = Some(info);
            }
            Ok(Event::Log(entry)) => self.logs.push(entry),
            Ok(Event::Feedback(fb)) => self.set_feedback(fb, feedback_expiry),
            // A bad frame is dropped without touching any state
            Err(e) => tracing::warn!("Dropping inbound frame: {e}"),
        }
    }

    fn on_disconnect(&mut self, feedback_expiry: &mut Option<Pin<Box<Sleep>>>) {
        tracing::warn!("Lost connection to control endpoint");
        self.connected = false;
        self.liveness.force_offline();
        self.metrics.clear();
        self.set_feedback(
            Feedback {
                message: "connection lost".to_string(),
                status: FeedbackStatus::Error,
            },
            feedback_expiry,
        );
    }

    /// A new feedback replaces the old one and restarts the expiry clock.
    fn set_feedback(&mut self, fb: Feedback, expiry: &mut Option<Pin<Box<Sleep>>>) {
        self.feedback = Some(fb);
        *expiry = Some(Box::pin(time::sleep(Duration::from_millis(
            self.cfg.feedback_ttl_ms,
        ))));
    }

    fn on_poll(&mut self) {
        let was = self.liveness.status();
        let now = self.liveness.check(Instant::now());
        if now == ConnectionStatus::Offline && was != ConnectionStatus::Offline {
            tracing::warn!("Host went offline (no heartbeat within threshold)");
            self.metrics.clear();
        }
    }

    fn on_dispatch(
        &mut self,
        cmd: &CommandRequest,
        countdown: &mut Option<time::Interval>,
    ) -> Result<(), DispatchError> {
        self.gate
            .try_acquire(cmd.window_secs)
            .map_err(|remaining_secs| DispatchError::Cooldown { remaining_secs })?;

        if !self.connected {
            self.gate.reset();
            return Err(DispatchError::NotConnected);
        }
        if self.outbound.send(protocol::command_frame(cmd)).is_err() {
            self.connected = false;
            self.gate.reset();
            return Err(DispatchError::NotConnected);
        }

        if self.gate.is_active() {
            // First decrement lands a full second after the send
            *countdown = Some(time::interval_at(
                Instant::now() + Duration::from_secs(1),
                Duration::from_secs(1),
            ));
        }

        tracing::info!("Dispatched '{}'", cmd.action);
        Ok(())
    }

    async fn on_reconnect(&mut self) -> Result<(), TransportError> {
        let url = self.url.as_ref().ok_or(TransportError::NotConnected)?;
        let link = transport::connect(url).await?;
        self.outbound = link.tx;
        self.inbound = link.rx;
        self.connected = true;
        self.send_hello();
        tracing::info!("Reconnected to control endpoint");
        Ok(())
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            status: self.liveness.status(),
            last_seen: self.liveness.last_seen_at(),
            cooldown: self.gate.state(),
            logs: self.logs.to_vec(),
            metrics: MetricsSnapshot {
                cpu: self.metrics.cpu.to_vec(),
                ram: self.metrics.ram.to_vec(),
            },
            host: self.host.clone(),
            feedback: self.feedback.clone(),
        }
    }
}
