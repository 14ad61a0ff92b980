//! Realtime change channel with auto-reconnect.
//!
//! Connects to the backend's Phoenix-style realtime websocket, joins the
//! `postgres_changes` topic for one table, and turns every insert, update,
//! or delete notification into a payload-free [`ChangeSignal`] on a
//! [`tokio::sync::broadcast`] channel. Reconnects with exponential backoff
//! until cancelled.
//!
//! # Example
//!
//! ```rust,ignore
//! use trafficdeck_api::realtime::{RealtimeHandle, ReconnectConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let handle = RealtimeHandle::connect(
//!     &base_url,
//!     &api_key,
//!     "intersections",
//!     ReconnectConfig::default(),
//!     CancellationToken::new(),
//! )?;
//! let mut rx = handle.subscribe();
//! while rx.recv().await.is_ok() {
//!     // re-fetch
//! }
//! handle.shutdown();
//! ```

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;

// ── Channel / protocol constants ─────────────────────────────────────

const SIGNAL_CHANNEL_CAPACITY: usize = 64;
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const PROTOCOL_VSN: &str = "1.0.0";

// ── ChangeSignal ─────────────────────────────────────────────────────

/// "Something in the table changed, re-fetch." Carries no row data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeSignal;

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for realtime reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── RealtimeHandle ───────────────────────────────────────────────────

/// Handle to a running realtime subscription for one table.
///
/// Call [`shutdown`](Self::shutdown) to tear down the background task;
/// receivers then observe a closed channel.
pub struct RealtimeHandle {
    signal_tx: broadcast::Sender<ChangeSignal>,
    cancel: CancellationToken,
}

impl RealtimeHandle {
    /// Spawn the connect/read/reconnect loop for `table`.
    ///
    /// Returns as soon as the task is spawned; the first connection attempt
    /// happens asynchronously. Must be called inside a Tokio runtime.
    pub fn connect(
        base_url: &Url,
        api_key: &SecretString,
        table: &str,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
    ) -> Result<Self, Error> {
        let ws_url = realtime_url(base_url, api_key)?;
        let topic = format!("realtime:public:{table}");
        let (signal_tx, _) = broadcast::channel(SIGNAL_CHANNEL_CAPACITY);

        let task_tx = signal_tx.clone();
        let task_cancel = cancel.clone();
        let table = table.to_owned();
        tokio::spawn(async move {
            ws_loop(ws_url, table, topic, task_tx, reconnect, task_cancel).await;
        });

        Ok(Self { signal_tx, cancel })
    }

    /// Get a new receiver for change signals.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeSignal> {
        self.signal_tx.subscribe()
    }

    /// Signal the background task to shut down.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// `https://host/...` → `wss://host/realtime/v1/websocket?apikey=..&vsn=1.0.0`
pub(crate) fn realtime_url(base_url: &Url, api_key: &SecretString) -> Result<Url, Error> {
    let scheme = if base_url.scheme() == "https" { "wss" } else { "ws" };
    let host = base_url.host_str().unwrap_or("localhost");
    let authority = match base_url.port() {
        Some(p) => format!("{host}:{p}"),
        None => host.to_owned(),
    };
    let mut url = Url::parse(&format!("{scheme}://{authority}/realtime/v1/websocket"))?;
    url.query_pairs_mut()
        .append_pair("apikey", api_key.expose_secret())
        .append_pair("vsn", PROTOCOL_VSN);
    Ok(url)
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → join → read → on error, backoff → reconnect.
async fn ws_loop(
    ws_url: Url,
    table: String,
    topic: String,
    signal_tx: broadcast::Sender<ChangeSignal>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&ws_url, &table, &topic, &signal_tx, &cancel) => {
                match result {
                    Ok(()) => {
                        tracing::info!(%table, "realtime socket closed cleanly, reconnecting");
                        attempt = 0;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, attempt, %table, "realtime socket error");

                        if let Some(max) = reconnect.max_retries {
                            if attempt >= max {
                                tracing::error!(
                                    max_retries = max,
                                    "realtime reconnection limit reached, giving up"
                                );
                                break;
                            }
                        }

                        let delay = calculate_backoff(attempt, &reconnect);
                        tracing::info!(
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            attempt,
                            "waiting before realtime reconnect"
                        );

                        tokio::select! {
                            biased;
                            () = cancel.cancelled() => break,
                            () = tokio::time::sleep(delay) => {}
                        }

                        attempt += 1;
                    }
                }
            }
        }
    }

    tracing::debug!(%table, "realtime loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish one socket, join the table topic, read until it drops.
async fn connect_and_read(
    url: &Url,
    table: &str,
    topic: &str,
    signal_tx: &broadcast::Sender<ChangeSignal>,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    tracing::info!(%table, "connecting realtime socket");

    let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    let (mut write, mut read) = ws_stream.split();
    let mut msg_ref: u64 = 1;

    write
        .send(Message::text(join_message(topic, table, msg_ref).to_string()))
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;
    tracing::debug!(%topic, "realtime join sent");

    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            _ = heartbeat.tick() => {
                msg_ref += 1;
                write
                    .send(Message::text(heartbeat_message(msg_ref).to_string()))
                    .await
                    .map_err(|e| Error::WebSocketConnect(e.to_string()))?;
                tracing::trace!("realtime heartbeat");
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => match classify(&text, topic) {
                        Inbound::Change => {
                            tracing::debug!(%table, "realtime change");
                            // No receivers just means nobody is listening right now.
                            let _ = signal_tx.send(ChangeSignal);
                        }
                        Inbound::Closed(reason) => {
                            return Err(Error::WebSocketClosed { code: 0, reason });
                        }
                        Inbound::Ignored => {}
                    },
                    Some(Ok(Message::Close(frame))) => {
                        return match frame {
                            Some(cf) => Err(Error::WebSocketClosed {
                                code: cf.code.into(),
                                reason: cf.reason.to_string(),
                            }),
                            None => Ok(()),
                        };
                    }
                    Some(Err(e)) => return Err(Error::WebSocketConnect(e.to_string())),
                    None => {
                        tracing::info!("realtime stream ended");
                        return Ok(());
                    }
                    // Ping is answered by tungstenite; Binary/Pong/Frame are unused.
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

// ── Message construction / parsing ───────────────────────────────────

/// Phoenix channel frame.
#[derive(Debug, Serialize, Deserialize)]
struct PhxMessage {
    topic: String,
    event: String,
    #[serde(default)]
    payload: serde_json::Value,
}

fn join_message(topic: &str, table: &str, msg_ref: u64) -> serde_json::Value {
    json!({
        "topic": topic,
        "event": "phx_join",
        "payload": {
            "config": {
                "postgres_changes": [
                    { "event": "*", "schema": "public", "table": table }
                ]
            }
        },
        "ref": msg_ref.to_string(),
    })
}

fn heartbeat_message(msg_ref: u64) -> serde_json::Value {
    json!({
        "topic": "phoenix",
        "event": "heartbeat",
        "payload": {},
        "ref": msg_ref.to_string(),
    })
}

#[derive(Debug, PartialEq, Eq)]
enum Inbound {
    Change,
    Closed(String),
    Ignored,
}

fn classify(text: &str, topic: &str) -> Inbound {
    let msg: PhxMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            tracing::debug!(error = %e, "unparseable realtime frame");
            return Inbound::Ignored;
        }
    };

    if msg.topic != topic {
        return Inbound::Ignored;
    }

    match msg.event.as_str() {
        "postgres_changes" | "INSERT" | "UPDATE" | "DELETE" => Inbound::Change,
        "phx_error" | "phx_close" => Inbound::Closed(msg.event),
        "phx_reply" => {
            if msg.payload["status"].as_str() == Some("error") {
                tracing::warn!(payload = %msg.payload, "realtime join rejected");
                return Inbound::Closed("join rejected".into());
            }
            Inbound::Ignored
        }
        _ => Inbound::Ignored,
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) + jitter`, jitter within ±25%.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exp);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic "jitter" seeded from the attempt number.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const TOPIC: &str = "realtime:public:intersections";

    #[test]
    fn default_reconnect_config() {
        let config = ReconnectConfig::default();
        assert_eq!(config.initial_delay, Duration::from_secs(1));
        assert_eq!(config.max_delay, Duration::from_secs(30));
        assert!(config.max_retries.is_none());
    }

    #[test]
    fn backoff_increases_then_caps() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            max_retries: None,
        };

        let d0 = calculate_backoff(0, &config);
        let d1 = calculate_backoff(1, &config);
        let d2 = calculate_backoff(2, &config);
        assert!(d1 > d0, "d1 ({d1:?}) should be greater than d0 ({d0:?})");
        assert!(d2 > d1, "d2 ({d2:?}) should be greater than d1 ({d1:?})");

        // Jitter factor tops out at 1.25.
        let d10 = calculate_backoff(10, &config);
        assert!(d10 <= Duration::from_millis(12_500));
    }

    #[test]
    fn realtime_url_switches_scheme_and_carries_key() {
        let base = Url::parse("https://abc.backend.example").unwrap();
        let url = realtime_url(&base, &SecretString::from("anon".to_string())).unwrap();
        assert_eq!(url.scheme(), "wss");
        assert_eq!(url.path(), "/realtime/v1/websocket");
        assert_eq!(url.query(), Some("apikey=anon&vsn=1.0.0"));

        let local = Url::parse("http://127.0.0.1:54321").unwrap();
        let url = realtime_url(&local, &SecretString::from("k".to_string())).unwrap();
        assert_eq!(url.as_str(), "ws://127.0.0.1:54321/realtime/v1/websocket?apikey=k&vsn=1.0.0");
    }

    #[test]
    fn join_message_targets_table_changes() {
        let msg = join_message(TOPIC, "intersections", 1);
        assert_eq!(msg["event"], "phx_join");
        assert_eq!(msg["topic"], TOPIC);
        let change = &msg["payload"]["config"]["postgres_changes"][0];
        assert_eq!(change["event"], "*");
        assert_eq!(change["table"], "intersections");
    }

    #[test]
    fn postgres_change_on_topic_is_a_signal() {
        let frame = json!({
            "topic": TOPIC,
            "event": "postgres_changes",
            "payload": { "data": { "type": "UPDATE", "record": { "id": "INT-001" } } },
            "ref": null
        });
        assert_eq!(classify(&frame.to_string(), TOPIC), Inbound::Change);
    }

    #[test]
    fn other_topics_and_replies_are_ignored() {
        let other = json!({ "topic": "realtime:public:alerts", "event": "INSERT", "payload": {} });
        assert_eq!(classify(&other.to_string(), TOPIC), Inbound::Ignored);

        let ok_reply = json!({ "topic": TOPIC, "event": "phx_reply", "payload": { "status": "ok" } });
        assert_eq!(classify(&ok_reply.to_string(), TOPIC), Inbound::Ignored);

        assert_eq!(classify("not json at all", TOPIC), Inbound::Ignored);
    }

    #[test]
    fn rejected_join_closes_connection() {
        let reply = json!({ "topic": TOPIC, "event": "phx_reply", "payload": { "status": "error" } });
        assert_eq!(
            classify(&reply.to_string(), TOPIC),
            Inbound::Closed("join rejected".into())
        );
    }

    #[tokio::test]
    async fn shutdown_cancels_the_loop() {
        let base = Url::parse("http://127.0.0.1:9").unwrap();
        let handle = RealtimeHandle::connect(
            &base,
            &SecretString::from("k".to_string()),
            "intersections",
            ReconnectConfig::default(),
            CancellationToken::new(),
        )
        .unwrap();
        assert!(!handle.is_shut_down());
        handle.shutdown();
        assert!(handle.is_shut_down());
    }
}
