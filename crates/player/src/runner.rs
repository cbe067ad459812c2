//! Composition root and interactive loop.
//!
//! One task owns the [`Session`]: transport events and typed commands are
//! applied in arrival order, and the screen is redrawn after each.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::mpsc;

use crate::application::{Phase, Session};
use crate::config::ClientConfig;
use crate::infrastructure::{SystemClock, Transport, TungsteniteConnector};
use crate::ports::outbound::{GameConnectionPort, TransportEvent};
use crate::ui::{self, Command, HELP};

/// How long to wait for the goodbye frame to go out on exit.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Whether the loop keeps going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

pub async fn run(config: ClientConfig) -> anyhow::Result<()> {
    tracing::info!(server = %config.server_url, room = %config.default_room, "Starting Broadside client");

    let (transport, mut events) = Transport::spawn(Arc::new(TungsteniteConnector));
    let connection: Arc<dyn GameConnectionPort> = Arc::new(transport.clone());
    let mut session = Session::new(config, connection, Arc::new(SystemClock::new()));

    println!("{}", ui::render(&session));
    println!("{}", HELP);

    let lines = BufReader::new(tokio::io::stdin()).lines();
    let outcome = event_loop(&mut session, &mut events, lines, tokio::signal::ctrl_c()).await;

    leave(&mut session);
    drop(session);
    drop(transport);
    // The event channel closes once the driver has finished shutting down
    let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
        while events.recv().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        tracing::warn!("Transport did not shut down in time");
    }
    outcome
}

/// Feed transport events and typed lines to the session until `exit`, end of
/// input, or `interrupt` resolves. `interrupt` is registered once for the whole loop.
async fn event_loop<R, I>(
    session: &mut Session,
    events: &mut mpsc::UnboundedReceiver<TransportEvent>,
    mut lines: Lines<R>,
    interrupt: I,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    I: Future,
{
    tokio::pin!(interrupt);
    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                session.handle_transport_event(event);
                println!("{}", ui::render(session));
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                if dispatch(session, &line) == Flow::Exit {
                    break;
                }
            }
            _ = &mut interrupt => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }
    Ok(())
}

/// Leaving while in a game says goodbye to the server first.
fn leave(session: &mut Session) {
    if session.phase() == Phase::Lobby {
        return;
    }
    if let Err(e) = session.quit() {
        tracing::debug!(error = %e, "Quit on exit rejected");
    }
}

/// Apply one typed line to the session and print the outcome.
fn dispatch(session: &mut Session, line: &str) -> Flow {
    let command = match line.parse::<Command>() {
        Ok(command) => command,
        Err(e) => {
            println!("{}", e);
            return Flow::Continue;
        }
    };

    let mut preview = Vec::new();
    let result = match command {
        Command::Join(room) => session.join(room.as_deref()),
        Command::Ready => session.set_ready(),
        Command::Select(ship) => session.select_ship(ship.name),
        Command::Rotate => session.rotate().map(|_| ()),
        Command::Preview(origin) => {
            preview = session.placement_preview(origin);
            Ok(())
        }
        Command::Place(origin) => session.place_ship(origin),
        Command::Auto => session.request_auto_placement(),
        Command::Reset => session.reset_placement(),
        Command::Confirm => session.confirm_placement(),
        Command::Attack(target) => session.attack(target),
        Command::Replay => session.request_replay(),
        Command::Quit => session.quit(),
        Command::Help => {
            println!("{}", HELP);
            return Flow::Continue;
        }
        Command::Exit => return Flow::Exit,
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "Intent rejected");
        println!("{}", e);
    }
    println!("{}", ui::render_with_preview(session, &preview));
    Flow::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::ports::outbound::MockGameConnectionPort;
    use broadside_shared::ClientMessage;
    use chrono::Utc;

    fn session(mock: MockGameConnectionPort) -> Session {
        Session::new(
            ClientConfig::from_lookup(|_| None).expect("default config"),
            Arc::new(mock),
            Arc::new(FixedClock(Utc::now())),
        )
    }

    #[test]
    fn test_dispatch_routes_commands_to_session() {
        let mut mock = MockGameConnectionPort::new();
        mock.expect_state()
            .return_const(crate::ports::outbound::ConnectionState::Disconnected);
        mock.expect_connect()
            .withf(|endpoint, _| endpoint.ends_with("/ws/game/salle-9"))
            .times(1)
            .return_const(());
        mock.expect_send().never();
        let mut session = session(mock);

        assert_eq!(dispatch(&mut session, "join salle-9"), Flow::Continue);
        assert_eq!(session.room_id(), Some("salle-9"));
        assert_eq!(dispatch(&mut session, "bogus"), Flow::Continue);
        // Rejected locally: wrong phase
        assert_eq!(dispatch(&mut session, "attack A1"), Flow::Continue);
        assert_eq!(dispatch(&mut session, "exit"), Flow::Exit);
    }

    #[test]
    fn test_leave_only_quits_an_active_game() {
        let mut mock = MockGameConnectionPort::new();
        mock.expect_close().times(1).return_const(());
        let mut session = session(mock);

        leave(&mut session);
        assert_eq!(session.phase(), Phase::Lobby);

        session.handle_server_frame(
            broadside_shared::parse_server_message(r#"{"action":"ready"}"#).expect("valid frame"),
        );
        leave(&mut session);
        assert_eq!(session.phase(), Phase::Lobby);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_survives_loop_iterations() {
        let mut mock = MockGameConnectionPort::new();
        mock.expect_send().return_const(());
        let mut session = session(mock);
        let (event_tx, mut events) = mpsc::unbounded_channel();
        // Writer kept alive so stdin never reaches end of input
        let (_stdin_writer, stdin) = tokio::io::duplex(64);
        let interrupt = tokio::time::sleep(Duration::from_secs(5));

        event_tx.send(TransportEvent::Opened).expect("loop listening");
        event_loop(&mut session, &mut events, BufReader::new(stdin).lines(), interrupt)
            .await
            .expect("clean exit");

        assert_eq!(session.phase(), Phase::Waiting);
    }

    #[test]
    fn test_dispatch_sends_ready() {
        let mut mock = MockGameConnectionPort::new();
        mock.expect_send()
            .withf(|message| *message == ClientMessage::SetReady)
            .times(1)
            .return_const(());
        let mut session = session(mock);
        session.handle_server_frame(
            broadside_shared::parse_server_message(r#"{"action":"ready"}"#).expect("valid frame"),
        );
        assert_eq!(dispatch(&mut session, "ready"), Flow::Continue);
    }
}
