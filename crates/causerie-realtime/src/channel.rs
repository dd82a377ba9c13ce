//! Channel task with the command/event mpsc pattern.
//!
//! [`spawn_channel`] owns the websocket for the whole process lifetime.
//! Commands flow in, decoded events flow out; an undecodable inbound frame
//! is logged and dropped, never an error path.

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

use crate::error::ChannelError;
use crate::wire::{self, Inbound, Outbound};

/// Commands sent *into* the channel task.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelCommand {
    /// Emit an intent to the backend.
    Emit(Outbound),
    /// Close the connection; part of session teardown.
    Shutdown,
}

/// Events sent *from* the channel task to the application.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// The connection is up and commands will be delivered.
    Connected,
    /// A decoded remote event.
    Inbound(Inbound),
    /// The connection closed; no further events will arrive.
    Disconnected,
}

/// Connect to the realtime endpoint and spawn the channel task.
///
/// Returns the command sender and event receiver. Dropping the sender (or
/// sending [`ChannelCommand::Shutdown`]) closes the connection.
pub async fn spawn_channel(
    url: &str,
) -> Result<(mpsc::Sender<ChannelCommand>, mpsc::Receiver<ChannelEvent>), ChannelError> {
    let (ws, _) = connect_async(url).await?;
    info!(%url, "Realtime channel connected");

    let (cmd_tx, mut cmd_rx) = mpsc::channel::<ChannelCommand>(64);
    let (event_tx, event_rx) = mpsc::channel::<ChannelEvent>(256);

    tokio::spawn(async move {
        let (mut sink, mut stream) = ws.split();

        if event_tx.send(ChannelEvent::Connected).await.is_err() {
            return;
        }

        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(ChannelCommand::Emit(outbound)) => {
                        let frame = match wire::encode(&outbound) {
                            Ok(f) => f,
                            Err(e) => {
                                warn!(error = %e, "Failed to encode outbound frame");
                                continue;
                            }
                        };
                        if let Err(e) = sink.send(WsMessage::Text(frame)).await {
                            warn!(error = %e, "Realtime send failed");
                            let _ = event_tx.send(ChannelEvent::Disconnected).await;
                            break;
                        }
                    }
                    Some(ChannelCommand::Shutdown) | None => {
                        debug!("Realtime channel shutting down");
                        let _ = sink.send(WsMessage::Close(None)).await;
                        break;
                    }
                },

                frame = stream.next() => match frame {
                    Some(Ok(WsMessage::Text(text))) => match wire::decode(&text) {
                        Ok(event) => {
                            if event_tx.send(ChannelEvent::Inbound(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => debug!(error = %e, "Dropping undecodable frame"),
                    },
                    Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_))) => {}
                    Some(Ok(WsMessage::Binary(data))) => {
                        debug!(len = data.len(), "Ignoring binary frame");
                    }
                    Some(Ok(WsMessage::Frame(_))) => {}
                    Some(Ok(WsMessage::Close(_))) | None => {
                        info!("Realtime channel closed by server");
                        let _ = event_tx.send(ChannelEvent::Disconnected).await;
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "Realtime channel error");
                        let _ = event_tx.send(ChannelEvent::Disconnected).await;
                        break;
                    }
                },
            }
        }
    });

    Ok((cmd_tx, event_rx))
}
