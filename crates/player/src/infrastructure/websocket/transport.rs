//! Resilient transport over one physical socket at a time.
//!
//! `Transport` is a cheap handle; the socket, the outbound queue, the backoff
//! counter and the retry deadline all live in a single driver task that the
//! handle talks to over an unbounded command channel:
//!
//! - At most one physical socket exists. `connect` tears the old one down and
//!   cancels any pending retry before dialing.
//! - Messages sent while no socket is open are queued FIFO and flushed on open,
//!   before `Opened` is emitted.
//! - Involuntary closes are retried with capped exponential backoff; when the
//!   budget is spent the driver emits `GaveUp` and stops.
//! - `close` (or dropping the last handle) cancels everything and never emits
//!   a close event.

use std::collections::VecDeque;
use std::future::{pending, Future};
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::Instant;

use broadside_shared::{parse_server_message, ClientMessage};

use super::backoff::BackoffState;
use super::connector::{Connector, PhysicalSocket};
use super::error::TransportError;
use super::message_builder::ClientMessageBuilder;
use crate::ports::outbound::{ConnectOptions, ConnectionState, GameConnectionPort, TransportEvent};

type ConnectFuture = Pin<Box<dyn Future<Output = Result<PhysicalSocket, TransportError>> + Send>>;

/// Commands from the handle to the driver task.
#[derive(Debug)]
enum TransportCommand {
    Connect {
        endpoint: String,
        options: ConnectOptions,
    },
    Send(String),
    Close,
}

struct TransportInner {
    commands: mpsc::UnboundedSender<TransportCommand>,
    state: Arc<AtomicU8>,
}

impl Drop for TransportInner {
    fn drop(&mut self) {
        // Last handle gone: same as an explicit close.
        let _ = self.commands.send(TransportCommand::Close);
    }
}

/// Handle to the transport driver.
///
/// Clones share one driver. When the last clone is dropped the connection is
/// closed exactly as if [`Transport::close`] had been called.
#[derive(Clone)]
pub struct Transport {
    inner: Arc<TransportInner>,
}

impl Transport {
    /// Spawn the driver task on the current tokio runtime.
    ///
    /// Returns the handle and the receiver for every [`TransportEvent`].
    pub fn spawn(
        connector: Arc<dyn Connector>,
    ) -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let state = Arc::new(AtomicU8::new(ConnectionState::Disconnected.to_u8()));

        let driver = Driver {
            connector,
            commands: cmd_rx,
            events: event_tx,
            state: Arc::clone(&state),
            queue: VecDeque::new(),
            backoff: BackoffState::default(),
            target: None,
            socket: None,
            dialing: None,
            retry_at: None,
        };
        tokio::spawn(driver.run());

        let transport = Self {
            inner: Arc::new(TransportInner {
                commands: cmd_tx,
                state,
            }),
        };
        (transport, event_rx)
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.inner.state.load(Ordering::SeqCst))
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn connect(&self, endpoint: impl Into<String>, options: ConnectOptions) {
        set_connection_state(&self.inner.state, ConnectionState::Connecting);
        self.command(TransportCommand::Connect {
            endpoint: endpoint.into(),
            options,
        });
    }

    pub fn send(&self, message: &ClientMessage) {
        match message.to_json() {
            Ok(json) => self.command(TransportCommand::Send(json)),
            Err(e) => tracing::error!("Failed to serialize {} message: {}", message.action(), e),
        }
    }

    /// Disconnected as soon as this returns; the goodbye and teardown follow on the driver.
    pub fn close(&self) {
        set_connection_state(&self.inner.state, ConnectionState::Disconnected);
        self.command(TransportCommand::Close);
    }

    fn command(&self, command: TransportCommand) {
        if self.inner.commands.send(command).is_err() {
            tracing::warn!("Transport driver is gone; command dropped");
        }
    }
}

impl GameConnectionPort for Transport {
    fn state(&self) -> ConnectionState {
        Transport::state(self)
    }

    fn is_open(&self) -> bool {
        Transport::is_open(self)
    }

    fn connect(&self, endpoint: &str, options: ConnectOptions) {
        Transport::connect(self, endpoint, options);
    }

    fn send(&self, message: ClientMessage) {
        Transport::send(self, &message);
    }

    fn close(&self) {
        Transport::close(self);
    }
}

fn set_connection_state(state_ref: &AtomicU8, new_state: ConnectionState) {
    state_ref.store(new_state.to_u8(), Ordering::SeqCst);
}

/// What to dial, remembered for reconnects.
struct Target {
    endpoint: String,
    options: ConnectOptions,
}

/// Owns everything mutable about the connection. Runs until every handle is gone.
struct Driver {
    connector: Arc<dyn Connector>,
    commands: mpsc::UnboundedReceiver<TransportCommand>,
    events: mpsc::UnboundedSender<TransportEvent>,
    state: Arc<AtomicU8>,
    queue: VecDeque<String>,
    backoff: BackoffState,
    target: Option<Target>,
    socket: Option<PhysicalSocket>,
    dialing: Option<ConnectFuture>,
    retry_at: Option<Instant>,
}

impl Driver {
    async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => {
                        self.shutdown().await;
                        break;
                    }
                },

                result = dial_outcome(&mut self.dialing) => {
                    self.dialing = None;
                    match result {
                        Ok(socket) => self.on_open(socket).await,
                        Err(e) => {
                            tracing::warn!("Connect attempt failed: {}", e);
                            self.emit(TransportEvent::Error(e.to_string()));
                            self.on_involuntary_close();
                        }
                    }
                }

                frame = next_frame(&mut self.socket) => match frame {
                    Some(Ok(text)) => self.on_text(&text),
                    Some(Err(e)) => {
                        tracing::warn!("Socket error: {}", e);
                        self.socket = None;
                        self.emit(TransportEvent::Error(e.to_string()));
                        self.on_involuntary_close();
                    }
                    None => {
                        tracing::info!("Socket closed by peer");
                        self.socket = None;
                        self.on_involuntary_close();
                    }
                },

                _ = retry_due(self.retry_at) => {
                    self.retry_at = None;
                    tracing::info!(
                        "Reconnection attempt {} of {}",
                        self.backoff.attempts(),
                        super::backoff::MAX_RETRY_ATTEMPTS
                    );
                    self.dial();
                }
            }
        }
        tracing::debug!("Transport driver stopped");
    }

    async fn handle_command(&mut self, command: TransportCommand) {
        match command {
            TransportCommand::Connect { endpoint, options } => {
                self.teardown().await;
                self.backoff.reset();
                tracing::info!("Connecting to {}", endpoint);
                self.target = Some(Target { endpoint, options });
                self.dial();
            }
            TransportCommand::Send(text) => {
                let Some(socket) = self.socket.as_mut() else {
                    self.queue.push_back(text);
                    tracing::debug!("Not connected, {} message(s) queued", self.queue.len());
                    return;
                };
                let result = socket.sink.send(text.clone()).await;
                if let Err(e) = result {
                    tracing::warn!("Send failed, requeueing: {}", e);
                    self.queue.push_front(text);
                    self.socket = None;
                    self.emit(TransportEvent::Error(e.to_string()));
                    self.on_involuntary_close();
                }
            }
            TransportCommand::Close => self.shutdown().await,
        }
    }

    /// Voluntary close: no retry, no close event.
    async fn shutdown(&mut self) {
        if let Some(socket) = self.socket.as_mut() {
            match ClientMessageBuilder::disconnect().to_json() {
                Ok(goodbye) => {
                    if let Err(e) = socket.sink.send(goodbye).await {
                        tracing::debug!("Goodbye not delivered: {}", e);
                    }
                }
                Err(e) => tracing::error!("Failed to serialize goodbye: {}", e),
            }
        }
        self.teardown().await;
        self.target = None;
        if !self.queue.is_empty() {
            tracing::debug!("Discarding {} queued messages on close", self.queue.len());
            self.queue.clear();
        }
        self.set_state(ConnectionState::Disconnected);
    }

    /// Drop the current socket, any in-flight dial and any pending retry.
    async fn teardown(&mut self) {
        self.retry_at = None;
        self.dialing = None;
        if let Some(mut socket) = self.socket.take() {
            let _ = socket.sink.close().await;
        }
    }

    fn dial(&mut self) {
        let Some(target) = self.target.as_ref() else {
            return;
        };
        let connector = Arc::clone(&self.connector);
        let endpoint = target.endpoint.clone();
        self.set_state(if self.backoff.attempts() == 0 {
            ConnectionState::Connecting
        } else {
            ConnectionState::Reconnecting
        });
        self.dialing = Some(Box::pin(async move { connector.connect(&endpoint).await }));
    }

    async fn on_open(&mut self, mut socket: PhysicalSocket) {
        while let Some(text) = self.queue.pop_front() {
            if let Err(e) = socket.sink.send(text.clone()).await {
                tracing::warn!("Flush interrupted: {}", e);
                self.queue.push_front(text);
                self.emit(TransportEvent::Error(e.to_string()));
                self.on_involuntary_close();
                return;
            }
        }
        // Only a socket that took the whole queue counts as a successful open
        self.backoff.reset();
        self.socket = Some(socket);
        self.set_state(ConnectionState::Connected);
        self.emit(TransportEvent::Opened);
    }

    fn on_text(&mut self, text: &str) {
        match parse_server_message(text) {
            Ok(frame) => {
                tracing::trace!("Received {}", frame.action());
                self.emit(TransportEvent::Message(frame));
            }
            Err(e) => tracing::warn!("Dropping malformed server frame: {}", e),
        }
    }

    /// Socket lost or dial failed without `close()` being asked for.
    fn on_involuntary_close(&mut self) {
        let auto_reconnect = self
            .target
            .as_ref()
            .map(|target| target.options.auto_reconnect)
            .unwrap_or(false);

        let delay = if auto_reconnect {
            self.backoff.next_delay_and_advance()
        } else {
            None
        };

        match delay {
            Some(delay) => {
                tracing::info!("Reconnecting in {}ms", delay);
                self.retry_at = Some(Instant::now() + Duration::from_millis(delay));
                self.set_state(ConnectionState::Reconnecting);
                self.emit(TransportEvent::Closed { will_retry: true });
            }
            None => {
                let attempts = self.backoff.attempts();
                if auto_reconnect {
                    tracing::error!("Max reconnection attempts reached, giving up");
                }
                self.set_state(ConnectionState::Failed);
                self.emit(TransportEvent::Closed { will_retry: false });
                self.emit(TransportEvent::GaveUp { attempts });
            }
        }
    }

    fn set_state(&self, new_state: ConnectionState) {
        set_connection_state(&self.state, new_state);
    }

    fn emit(&self, event: TransportEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("Transport event receiver dropped");
        }
    }
}

async fn dial_outcome(dialing: &mut Option<ConnectFuture>) -> Result<PhysicalSocket, TransportError> {
    match dialing {
        Some(fut) => fut.await,
        None => pending().await,
    }
}

async fn next_frame(
    socket: &mut Option<PhysicalSocket>,
) -> Option<Result<String, TransportError>> {
    match socket {
        Some(socket) => socket.stream.next().await,
        None => pending().await,
    }
}

async fn retry_due(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures_channel::mpsc as fmpsc;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    /// Server side of an in-memory socket.
    struct ServerEnd {
        /// Frames the client wrote
        inbox: fmpsc::UnboundedReceiver<String>,
        /// Push frames to the client; drop to close the socket
        outbox: fmpsc::UnboundedSender<String>,
    }

    fn socket_pair() -> (PhysicalSocket, ServerEnd) {
        let (client_tx, inbox) = fmpsc::unbounded::<String>();
        let (outbox, client_rx) = fmpsc::unbounded::<String>();
        let socket = PhysicalSocket {
            sink: Box::pin(client_tx.sink_map_err(|_| TransportError::Closed)),
            stream: Box::pin(client_rx.map(Ok::<String, TransportError>)),
        };
        (socket, ServerEnd { inbox, outbox })
    }

    /// Hands out scripted sockets in order; refuses once the script runs out.
    #[derive(Default)]
    struct ScriptedConnector {
        script: Mutex<VecDeque<PhysicalSocket>>,
        attempts: AtomicUsize,
    }

    impl ScriptedConnector {
        fn accept_next(&self) -> ServerEnd {
            let (socket, server) = socket_pair();
            self.script
                .lock()
                .expect("script lock")
                .push_back(socket);
            server
        }

        fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Connector for ScriptedConnector {
        async fn connect(&self, _endpoint: &str) -> Result<PhysicalSocket, TransportError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().expect("script lock").pop_front();
            next.ok_or_else(|| TransportError::ConnectFailed("refused".to_string()))
        }
    }

    fn options() -> ConnectOptions {
        ConnectOptions::default()
    }

    #[tokio::test]
    async fn test_queued_messages_flush_before_opened() {
        let connector = Arc::new(ScriptedConnector::default());
        let mut server = connector.accept_next();
        let (transport, mut events) = Transport::spawn(connector.clone());

        transport.send(&ClientMessage::SetReady);
        transport.send(&ClientMessage::RequestAutoPlacement);
        transport.connect("ws://test/ws/game/room", options());

        assert_eq!(events.recv().await, Some(TransportEvent::Opened));
        assert!(transport.is_open());
        assert_eq!(
            server.inbox.next().await.as_deref(),
            Some(r#"{"action":"joueur_pret"}"#)
        );
        assert_eq!(
            server.inbox.next().await.as_deref(),
            Some(r#"{"action":"demande_placement_auto"}"#)
        );

        transport.send(&ClientMessage::Join);
        assert_eq!(
            server.inbox.next().await.as_deref(),
            Some(r#"{"action":"join"}"#)
        );
    }

    #[tokio::test]
    async fn test_malformed_frames_are_dropped() {
        let connector = Arc::new(ScriptedConnector::default());
        let server = connector.accept_next();
        let (transport, mut events) = Transport::spawn(connector.clone());
        transport.connect("ws://test", options());
        assert_eq!(events.recv().await, Some(TransportEvent::Opened));

        server
            .outbox
            .unbounded_send("{{not json".to_string())
            .expect("push frame");
        server
            .outbox
            .unbounded_send(r#"{"action":"ready","message":"go"}"#.to_string())
            .expect("push frame");

        match events.recv().await {
            Some(TransportEvent::Message(frame)) => assert_eq!(frame.action(), "ready"),
            other => panic!("Expected ready frame, got {:?}", other),
        }
        assert!(transport.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_five_retries() {
        let connector = Arc::new(ScriptedConnector::default());
        let (transport, mut events) = Transport::spawn(connector.clone());
        let started = Instant::now();
        transport.connect("ws://test", options());

        let mut closes = Vec::new();
        let attempts = loop {
            match events.recv().await.expect("driver alive") {
                TransportEvent::Closed { will_retry } => closes.push(will_retry),
                TransportEvent::GaveUp { attempts } => break attempts,
                TransportEvent::Error(_) => {}
                other => panic!("Unexpected event {:?}", other),
            }
        };

        assert_eq!(attempts, 5);
        assert_eq!(closes, vec![true, true, true, true, true, false]);
        assert_eq!(connector.attempts(), 6);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(350 + 700 + 1400 + 2000 + 2000));
        assert!(elapsed < Duration::from_millis(7_000));
        assert_eq!(transport.state(), ConnectionState::Failed);

        // No 7th dial, however long we wait
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(connector.attempts(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_cancels_scheduled_reconnect() {
        let connector = Arc::new(ScriptedConnector::default());
        let (transport, mut events) = Transport::spawn(connector.clone());
        transport.connect("ws://test", options());

        loop {
            if let TransportEvent::Closed { will_retry } = events.recv().await.expect("event") {
                assert!(will_retry);
                break;
            }
        }
        transport.close();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(connector.attempts(), 1);
        assert!(events.try_recv().is_err());
        assert_eq!(transport.state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnects_after_server_drop() {
        let connector = Arc::new(ScriptedConnector::default());
        let first = connector.accept_next();
        let mut second = connector.accept_next();
        let (transport, mut events) = Transport::spawn(connector.clone());
        transport.connect("ws://test", options());
        assert_eq!(events.recv().await, Some(TransportEvent::Opened));

        drop(first);
        assert_eq!(
            events.recv().await,
            Some(TransportEvent::Closed { will_retry: true })
        );
        transport.send(&ClientMessage::RequestReplay);

        assert_eq!(events.recv().await, Some(TransportEvent::Opened));
        assert_eq!(connector.attempts(), 2);
        assert_eq!(
            second.inbox.next().await.as_deref(),
            Some(r#"{"action":"rejouer"}"#)
        );
    }

    #[tokio::test]
    async fn test_connect_replaces_live_socket() {
        let connector = Arc::new(ScriptedConnector::default());
        let mut first = connector.accept_next();
        let _second = connector.accept_next();
        let (transport, mut events) = Transport::spawn(connector.clone());

        transport.connect("ws://test/a", options());
        assert_eq!(events.recv().await, Some(TransportEvent::Opened));
        transport.connect("ws://test/b", options());
        assert_eq!(events.recv().await, Some(TransportEvent::Opened));

        // Old socket closed by us: its inbox ends, and no Closed event was emitted
        assert_eq!(first.inbox.next().await, None);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dropping_last_handle_says_goodbye() {
        let connector = Arc::new(ScriptedConnector::default());
        let mut server = connector.accept_next();
        let (transport, mut events) = Transport::spawn(connector.clone());
        transport.connect("ws://test", options());
        assert_eq!(events.recv().await, Some(TransportEvent::Opened));

        let clone = transport.clone();
        drop(transport);
        assert!(clone.is_open());
        drop(clone);

        assert_eq!(
            server.inbox.next().await.as_deref(),
            Some(r#"{"action":"deconnexion"}"#)
        );
        assert_eq!(server.inbox.next().await, None);
        assert_eq!(events.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sockets_that_reject_the_flush_use_up_the_retry_budget() {
        let connector = Arc::new(ScriptedConnector::default());
        // Each socket opens, then fails the first write
        for _ in 0..10 {
            drop(connector.accept_next());
        }
        let (transport, mut events) = Transport::spawn(connector.clone());
        transport.send(&ClientMessage::SetReady);
        transport.connect("ws://test", options());

        let attempts = loop {
            match events.recv().await.expect("driver alive") {
                TransportEvent::GaveUp { attempts } => break attempts,
                TransportEvent::Opened => panic!("Flush never succeeds"),
                _ => {}
            }
        };
        assert_eq!(attempts, 5);
        assert_eq!(connector.attempts(), 6);
    }

    #[tokio::test]
    async fn test_close_is_visible_immediately() {
        let connector = Arc::new(ScriptedConnector::default());
        let _server = connector.accept_next();
        let (transport, mut events) = Transport::spawn(connector.clone());
        transport.connect("ws://test", options());
        assert_eq!(events.recv().await, Some(TransportEvent::Opened));

        transport.close();
        assert_eq!(transport.state(), ConnectionState::Disconnected);
        assert!(!transport.is_open());
    }

    #[tokio::test]
    async fn test_no_retry_without_auto_reconnect() {
        let connector = Arc::new(ScriptedConnector::default());
        let (transport, mut events) = Transport::spawn(connector.clone());
        transport.connect(
            "ws://test",
            ConnectOptions {
                auto_reconnect: false,
            },
        );

        assert!(matches!(events.recv().await, Some(TransportEvent::Error(_))));
        assert_eq!(
            events.recv().await,
            Some(TransportEvent::Closed { will_retry: false })
        );
        assert_eq!(
            events.recv().await,
            Some(TransportEvent::GaveUp { attempts: 0 })
        );
        assert_eq!(connector.attempts(), 1);
    }
}
