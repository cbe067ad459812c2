//! Physical socket factory.
//!
//! The transport driver only ever sees a [`PhysicalSocket`]: a text sink and a
//! text stream. Production opens them with tokio-tungstenite.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::{future, Sink, SinkExt, Stream, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::error::TransportError;

pub type TextSink = Pin<Box<dyn Sink<String, Error = TransportError> + Send>>;
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, TransportError>> + Send>>;

/// One open connection, split into its write and read halves.
///
/// The stream ending (`None`) means the peer closed the socket.
pub struct PhysicalSocket {
    pub sink: TextSink,
    pub stream: TextStream,
}

/// Opens physical sockets for the transport driver.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, endpoint: &str) -> Result<PhysicalSocket, TransportError>;
}

/// Desktop connector using tokio-tungstenite
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, endpoint: &str) -> Result<PhysicalSocket, TransportError> {
        let (ws_stream, _) = connect_async(endpoint)
            .await
            .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;
        tracing::info!("Connected to game server at {}", endpoint);

        let (write, read) = ws_stream.split();

        let sink = write
            .sink_map_err(TransportError::from)
            .with(|text: String| future::ready(Ok::<_, TransportError>(Message::Text(text))));

        let stream = read.filter_map(|msg| {
            future::ready(match msg {
                Ok(Message::Text(text)) => Some(Ok(text)),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => Some(Ok(text)),
                    Err(_) => {
                        tracing::warn!("Dropping non-UTF-8 binary frame");
                        None
                    }
                },
                Ok(Message::Close(frame)) => {
                    tracing::info!("Server closed connection: {:?}", frame);
                    None
                }
                // Ping/Pong are answered by tungstenite itself
                Ok(_) => None,
                Err(e) => Some(Err(TransportError::from(e))),
            })
        });

        Ok(PhysicalSocket {
            sink: Box::pin(sink),
            stream: Box::pin(stream),
        })
    }
}
