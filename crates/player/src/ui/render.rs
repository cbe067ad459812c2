//! Text rendering of a session snapshot.

use std::fmt::Write;

use broadside_domain::{Coord, Grid, GRID_SIZE, SHIP_CATALOG};

use crate::application::{Phase, ProgressStep, Session, WaitingKind};

const STEPS: [(ProgressStep, &str); 4] = [
    (ProgressStep::Menu, "Menu"),
    (ProgressStep::Placement, "Placement"),
    (ProgressStep::Battle, "Battle"),
    (ProgressStep::Finish, "Finish"),
];

const PREVIEW_SYMBOL: char = '+';

/// Full screen for the current session state.
pub fn render(session: &Session) -> String {
    render_with_preview(session, &[])
}

/// Same as [`render`], with `preview` cells highlighted on our board.
pub fn render_with_preview(session: &Session, preview: &[Coord]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", header(session));
    if let Some(detail) = phase_detail(session) {
        let _ = writeln!(out, "{}", detail);
    }
    if !session.status_text().is_empty() {
        let _ = writeln!(out, ">> {}", session.status_text());
    }

    if session.phase() != Phase::Lobby {
        out.push('\n');
        out.push_str(&boards(session.own_grid(), session.opponent_grid(), preview));
    }

    if session.phase() == Phase::Placement {
        out.push('\n');
        out.push_str(&fleet_panel(session));
    }

    let recent = session.event_log().recent();
    if !recent.is_empty() {
        out.push_str("\nLog:\n");
        for entry in recent {
            let _ = writeln!(out, "  [{}] {}", entry.time_label(), entry.message);
        }
    }
    out
}

fn header(session: &Session) -> String {
    let current = session.progress_step();
    let steps: Vec<String> = STEPS
        .iter()
        .map(|(step, name)| {
            if *step == current {
                format!("[{}]", name)
            } else {
                name.to_string()
            }
        })
        .collect();
    format!(
        "Broadside  {}  | room: {} | {}",
        steps.join(" > "),
        session.room_id().unwrap_or("-"),
        session.connection_state().label()
    )
}

fn phase_detail(session: &Session) -> Option<String> {
    let text = match session.phase() {
        Phase::Lobby => "Type 'join [room]' to find an opponent.".to_string(),
        Phase::Waiting => match session.waiting_kind() {
            WaitingKind::Searching => "Waiting for a second player...".to_string(),
            WaitingKind::ReadyConfirmation => "Waiting for the opponent to get ready...".to_string(),
            WaitingKind::Placement => "Waiting for the opponent's fleet...".to_string(),
        },
        Phase::Menu => "Both players are here. Type 'ready'.".to_string(),
        Phase::Battle if session.is_my_turn() => "Your turn: 'attack <cell>'.".to_string(),
        Phase::Battle => return None,
        Phase::Finished => match session.end_info().victory {
            Some(true) => "You won! Type 'replay' for a rematch.".to_string(),
            _ => "You lost. Type 'replay' for a rematch.".to_string(),
        },
        Phase::WaitReplay => "Rematch requested.".to_string(),
        Phase::ConfirmReplay => "The opponent wants a rematch: 'replay' to accept.".to_string(),
        Phase::Placement => format!(
            "Orientation: {} ({} of {} ships placed)",
            session.orientation(),
            session.placed_ship_names().len(),
            SHIP_CATALOG.len()
        ),
    };
    Some(text)
}

fn boards(own: &Grid, opponent: &Grid, preview: &[Coord]) -> String {
    let columns: String = (0..GRID_SIZE)
        .map(|c| format!(" {}", (b'A' + c as u8) as char))
        .collect();
    let mut out = String::new();
    let _ = writeln!(out, "    {:<22}      {}", "Your fleet", "Opponent");
    let _ = writeln!(out, "   {}       {}", columns, columns);

    for (row, (own_row, their_row)) in own.rows().zip(opponent.rows()).enumerate() {
        let mine: String = own_row
            .iter()
            .enumerate()
            .map(|(col, cell)| {
                let highlighted = preview
                    .iter()
                    .any(|c| c.row() == row && c.col() == col);
                format!(" {}", if highlighted { PREVIEW_SYMBOL } else { cell.symbol() })
            })
            .collect();
        let theirs: String = their_row.iter().map(|cell| format!(" {}", cell.symbol())).collect();
        let _ = writeln!(out, "{:>2} {}    {:>2} {}", row + 1, mine, row + 1, theirs);
    }
    out
}

fn fleet_panel(session: &Session) -> String {
    let mut out = String::from("Fleet:\n");
    for (number, ship) in SHIP_CATALOG.iter().enumerate() {
        let marker = if session.placed_ship_names().contains(ship.name) {
            "placed"
        } else if session.selected_ship() == Some(*ship) {
            "selected"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "  {}. {:<18} {} {}",
            number + 1,
            ship.name,
            "S".repeat(ship.length as usize),
            marker
        );
    }
    out
}
