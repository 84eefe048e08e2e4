// ─────────────────────────────────────────────────────────────────
//  transport.rs — one WebSocket connection to the control endpoint
//
//  The socket is owned by two pump tasks; the session only ever sees a
//  pair of channels. Dropping the Link tears the whole thing down:
//  the writer closes the sink when the outbound channel ends, and the
//  inbound channel ends when the socket closes or errors.
// ─────────────────────────────────────────────────────────────────

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use crate::error::TransportError;

/// Channel ends of a live connection. Text frames only.
pub struct Link {
    pub tx: mpsc::UnboundedSender<String>,
    pub rx: mpsc::UnboundedReceiver<String>,
}

impl Link {
    /// In-memory link for exercising a session without a socket: returns
    /// the link plus the far ends (frames the session sent, sender for
    /// frames the session will receive).
    pub fn in_memory() -> (
        Link,
        mpsc::UnboundedReceiver<String>,
        mpsc::UnboundedSender<String>,
    ) {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        (
            Link {
                tx: out_tx,
                rx: in_rx,
            },
            out_rx,
            in_tx,
        )
    }
}

/// Open one connection. Unreachable endpoints fail here; anything after
/// that surfaces as the inbound channel ending.
pub async fn connect(url: &Url) -> Result<Link, TransportError> {
    let (socket, _) = connect_async(url.as_str()).await?;
    tracing::info!("Connected to control endpoint {url}");

    let (mut sink, mut stream) = socket.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
    let (in_tx, in_rx) = mpsc::unbounded_channel::<String>();

    // Outbound: channel → socket
    tokio::spawn(async move {
        while let Some(text) = out_rx.recv().await {
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    // Inbound: socket → channel; exits on close or error, ending `rx`
    tokio::spawn(async move {
        while let Some(msg) = stream.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if in_tx.send(text).is_err() {
                        break;
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("WebSocket read error: {e}");
                    break;
                }
            }
        }
        tracing::info!("Control connection closed");
    });

    Ok(Link {
        tx: out_tx,
        rx: in_rx,
    })
}
