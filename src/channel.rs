//! Transport between the engine and the game server.

use crate::events::{
    Inbound,
    Outbound,
};
use futures::{
    SinkExt,
    StreamExt,
};
use thiserror::Error;
use tokio::{
    io::{
        AsyncRead,
        AsyncWrite,
    },
    sync::mpsc,
    task::JoinHandle,
};
use tokio_tungstenite::{
    WebSocketStream,
    connect_async,
    tungstenite::{
        self,
        Message,
    },
};
use tracing::{
    debug,
    error,
    warn,
};

const INBOUND_CAPACITY: usize = 1024;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("websocket error: {0}")]
    Transport(#[from] tungstenite::Error),
    #[error("failed to encode intent: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("connection closed")]
    Closed,
}

/// Source of server-pushed events.
pub trait EventSource {
    async fn next_event(&mut self) -> Result<Inbound, ChannelError>;
}

/// Destination for user intents.
pub trait IntentSink {
    fn send(&self, intent: Outbound) -> Result<(), ChannelError>;
}

/// JSON-over-WebSocket channel. Reading and writing run as background tasks
/// that only talk to the owner through queues.
pub struct WsChannel {
    inbound: mpsc::Receiver<Result<Inbound, ChannelError>>,
    outbound: mpsc::UnboundedSender<Outbound>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl WsChannel {
    pub async fn connect(url: &str) -> Result<Self, ChannelError> {
        let (ws, response) = connect_async(url).await?;
        debug!(status = %response.status(), "websocket handshake complete");
        Ok(Self::from_stream(ws))
    }

    pub fn from_stream<S>(ws: WebSocketStream<S>) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (mut sink, mut stream) = ws.split();
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Outbound>();

        let reader = tokio::spawn(async move {
            while let Some(msg) = stream.next().await {
                match msg {
                    Ok(Message::Text(text)) => match Inbound::decode(&text) {
                        Ok(event) => {
                            if inbound_tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(err) => warn!(%err, frame = %text, "skipping undecodable frame"),
                    },
                    Ok(Message::Close(_)) => {
                        debug!("websocket closed by server");
                        let _ = inbound_tx.send(Err(ChannelError::Closed)).await;
                        break;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        error!(%err, "websocket read failed");
                        let _ = inbound_tx.send(Err(err.into())).await;
                        break;
                    }
                }
            }
        });

        let writer = tokio::spawn(async move {
            while let Some(intent) = outbound_rx.recv().await {
                let text = match intent.encode() {
                    Ok(text) => text,
                    Err(err) => {
                        warn!(%err, ?intent, "dropping unencodable intent");
                        continue;
                    }
                };
                if let Err(err) = sink.send(Message::Text(text)).await {
                    error!(%err, "websocket write failed");
                    break;
                }
            }
            let _ = sink.close().await;
        });

        Self {
            inbound: inbound_rx,
            outbound: outbound_tx,
            reader,
            writer,
        }
    }
}

impl EventSource for WsChannel {
    async fn next_event(&mut self) -> Result<Inbound, ChannelError> {
        self.inbound.recv().await.unwrap_or(Err(ChannelError::Closed))
    }
}

impl IntentSink for WsChannel {
    fn send(&self, intent: Outbound) -> Result<(), ChannelError> {
        self.outbound.send(intent).map_err(|_| ChannelError::Closed)
    }
}

impl Drop for WsChannel {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crate::events::SessionId;
    use tokio_tungstenite::tungstenite::protocol::Role;

    async fn pair() -> (WsChannel, WebSocketStream<tokio::io::DuplexStream>) {
        let (client_io, server_io) = tokio::io::duplex(16 * 1024);
        let client = WebSocketStream::from_raw_socket(client_io, Role::Client, None).await;
        let server = WebSocketStream::from_raw_socket(server_io, Role::Server, None).await;
        (WsChannel::from_stream(client), server)
    }

    #[tokio::test]
    async fn next_event__skips_undecodable_frames() {
        // given
        let (mut channel, mut server) = pair().await;
        server
            .send(Message::Text("not json".to_string()))
            .await
            .unwrap();
        server
            .send(Message::Text(
                r#"{"event":"connect","data":{"sid":"abc"}}"#.to_string(),
            ))
            .await
            .unwrap();

        // when
        let event = channel.next_event().await.unwrap();

        // then
        assert_eq!(
            event,
            Inbound::ConnectionEstablished {
                sid: SessionId::from("abc")
            }
        );
    }

    #[tokio::test]
    async fn next_event__reports_close() {
        // given
        let (mut channel, mut server) = pair().await;

        // when
        server.close(None).await.unwrap();

        // then
        assert!(matches!(
            channel.next_event().await,
            Err(ChannelError::Closed)
        ));
    }

    #[tokio::test]
    async fn send__writes_intents_as_text_frames() {
        // given
        let (channel, mut server) = pair().await;

        // when
        channel.send(Outbound::CashOut).unwrap();

        // then
        let frame = server.next().await.unwrap().unwrap();
        assert_eq!(frame, Message::Text(r#"{"event":"cashOut"}"#.to_string()));
    }
}
