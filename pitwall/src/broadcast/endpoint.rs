//! WebSocket accept loop.
//!
//! Each accepted connection is upgraded, profiled from its query string and
//! registered with the broadcaster. The per-connection task only drains the
//! read side to notice the close; all outbound traffic goes through the
//! broadcaster.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, StreamExt};
use futures_util::SinkExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{Broadcaster, PayloadProfile, SinkError, SubscriberSink};

struct WsSink {
    writer: Mutex<SplitSink<WebSocketStream<TcpStream>, Message>>,
}

#[async_trait]
impl SubscriberSink for WsSink {
    async fn send_text(&self, text: &str) -> Result<(), SinkError> {
        self.writer
            .lock()
            .await
            .send(Message::Text(text.to_string()))
            .await
            .map_err(|err| SinkError(err.to_string()))
    }

    async fn close(&self) {
        let _ = self.writer.lock().await.send(Message::Close(None)).await;
    }
}

/// `overlay=inputs` selects the reduced payload; anything else gets the full
/// snapshot.
fn profile_from_query(query: Option<&str>) -> PayloadProfile {
    let wants_inputs = query
        .unwrap_or("")
        .split('&')
        .any(|pair| pair == "overlay=inputs");
    if wants_inputs {
        PayloadProfile::Inputs
    } else {
        PayloadProfile::Full
    }
}

/// Accept connections until the token is cancelled.
pub async fn serve(
    listener: TcpListener,
    broadcaster: Arc<Broadcaster>,
    shutdown: CancellationToken,
) {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "websocket endpoint listening");
    }
    loop {
        let (stream, peer) = tokio::select! {
            _ = shutdown.cancelled() => {
                info!("websocket endpoint shutting down");
                return;
            }
            accepted = listener.accept() => match accepted {
                Ok(pair) => pair,
                Err(err) => {
                    warn!(error = %err, "accept failed");
                    continue;
                }
            },
        };
        let broadcaster = Arc::clone(&broadcaster);
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_connection(stream, peer, broadcaster, shutdown).await {
                debug!(%peer, error = %err, "connection ended with error");
            }
        });
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    broadcaster: Arc<Broadcaster>,
    shutdown: CancellationToken,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    let mut profile = PayloadProfile::Full;
    let ws = tokio_tungstenite::accept_hdr_async(stream, |req: &Request, resp: Response| {
        profile = profile_from_query(req.uri().query());
        Ok(resp)
    })
    .await?;
    info!(%peer, ?profile, "subscriber connected");

    let (writer, mut reader) = ws.split();
    let sink = Arc::new(WsSink {
        writer: Mutex::new(writer),
    });
    let id = broadcaster.add(sink, profile);

    // Drain inbound frames so close handshakes and pings are serviced.
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            frame = reader.next() => match frame {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => continue,
                Some(Err(err)) => {
                    debug!(%peer, error = %err, "subscriber read error");
                    break;
                }
            },
        }
    }

    broadcaster.remove(id);
    info!(%peer, "subscriber disconnected");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_from_query() {
        assert_eq!(profile_from_query(None), PayloadProfile::Full);
        assert_eq!(profile_from_query(Some("")), PayloadProfile::Full);
        assert_eq!(
            profile_from_query(Some("overlay=inputs")),
            PayloadProfile::Inputs
        );
        assert_eq!(
            profile_from_query(Some("foo=bar&overlay=inputs")),
            PayloadProfile::Inputs
        );
        assert_eq!(
            profile_from_query(Some("overlay=full")),
            PayloadProfile::Full
        );
    }

    #[tokio::test]
    async fn test_end_to_end_upgrade_and_receive() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let broadcaster = Arc::new(Broadcaster::new());
        let shutdown = CancellationToken::new();
        tokio::spawn(serve(
            listener,
            Arc::clone(&broadcaster),
            shutdown.clone(),
        ));

        let (mut client, _) =
            tokio_tungstenite::connect_async(format!("ws://{addr}/?overlay=inputs"))
                .await
                .unwrap();

        // Registration happens inside the spawned task; poll for it.
        for _ in 0..50 {
            if broadcaster.subscriber_count() == 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(broadcaster.subscriber_count(), 1);

        broadcaster.broadcast("{\"full\":true}", "{\"gear\":3}").await;
        let frame = client.next().await.unwrap().unwrap();
        assert_eq!(frame.into_text().unwrap(), "{\"gear\":3}");

        client.close(None).await.unwrap();
        for _ in 0..50 {
            if broadcaster.subscriber_count() == 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(broadcaster.subscriber_count(), 0);
        shutdown.cancel();
    }
}
