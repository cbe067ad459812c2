//! Line commands typed at the prompt.

use std::str::FromStr;

use broadside_domain::{Coord, ShipSpec, SHIP_CATALOG};
use thiserror::Error;

pub const HELP: &str = "\
Commands:
  join [room]          connect and join a room
  ready                ready up once both players are in
  select <1-5|name>    pick a ship to place
  rotate               cycle orientation (HR, VD, HL, VU)
  preview <A1>         show where the selected ship would land
  place <A1>           place the selected ship
  auto                 let the server place the fleet
  reset                clear all placed ships
  confirm              lock in the fleet
  attack <A1>          fire at the opponent board (alias: fire)
  replay               ask for or accept a rematch
  quit                 leave the game
  help                 show this list
  exit                 leave and close the client";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Join(Option<String>),
    Ready,
    Select(ShipSpec),
    Rotate,
    Preview(Coord),
    Place(Coord),
    Auto,
    Reset,
    Confirm,
    Attack(Coord),
    Replay,
    Quit,
    Help,
    Exit,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command '{0}', type 'help'")]
    Unknown(String),

    #[error("'{command}' needs {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },

    #[error("No ship matches '{0}'")]
    UnknownShip(String),

    #[error("Invalid cell '{0}', expected a letter A-J and a row 1-10")]
    InvalidCoord(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or(CommandError::Empty)?.to_ascii_lowercase();
        let rest: Vec<&str> = words.collect();
        let arg = (!rest.is_empty()).then(|| rest.join(" "));

        let command = match verb.as_str() {
            "join" => Command::Join(arg),
            "ready" => Command::Ready,
            "select" => Command::Select(parse_ship(require(arg, "select", "a ship number or name")?)?),
            "rotate" | "r" => Command::Rotate,
            "preview" => Command::Preview(parse_coord(require(arg, "preview", "a cell like B4")?)?),
            "place" => Command::Place(parse_coord(require(arg, "place", "a cell like B4")?)?),
            "auto" => Command::Auto,
            "reset" => Command::Reset,
            "confirm" => Command::Confirm,
            "attack" | "fire" => {
                Command::Attack(parse_coord(require(arg, "attack", "a cell like B4")?)?)
            }
            "replay" => Command::Replay,
            "quit" | "leave" => Command::Quit,
            "help" | "?" => Command::Help,
            "exit" => Command::Exit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

fn require(
    arg: Option<String>,
    command: &'static str,
    expected: &'static str,
) -> Result<String, CommandError> {
    arg.ok_or(CommandError::MissingArgument { command, expected })
}

/// Catalog number (1-based) or case-insensitive name.
fn parse_ship(arg: String) -> Result<ShipSpec, CommandError> {
    if let Ok(number) = arg.parse::<usize>() {
        return ShipSpec::by_number(number).ok_or(CommandError::UnknownShip(arg));
    }
    SHIP_CATALOG
        .iter()
        .copied()
        .find(|ship| ship.name.eq_ignore_ascii_case(&arg))
        .ok_or(CommandError::UnknownShip(arg))
}

fn parse_coord(arg: String) -> Result<Coord, CommandError> {
    arg.parse().map_err(|_| CommandError::InvalidCoord(arg))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Command, CommandError> {
        line.parse()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse("join"), Ok(Command::Join(None)));
        assert_eq!(parse("  JOIN  salle 42 "), Ok(Command::Join(Some("salle 42".into()))));
        assert_eq!(parse("fire c7"), Ok(Command::Attack("C7".parse().expect("valid"))));
        assert_eq!(parse("place J10"), Ok(Command::Place("J10".parse().expect("valid"))));
        assert_eq!(parse("r"), Ok(Command::Rotate));
    }

    #[test]
    fn test_select_by_number_or_name() {
        assert_eq!(parse("select 1"), Ok(Command::Select(SHIP_CATALOG[0])));
        assert_eq!(parse("select sous-marin"), Ok(Command::Select(SHIP_CATALOG[3])));
        assert_eq!(
            parse("select 6"),
            Err(CommandError::UnknownShip("6".into()))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse("   "), Err(CommandError::Empty));
        assert_eq!(parse("dance"), Err(CommandError::Unknown("dance".into())));
        assert!(matches!(
            parse("attack"),
            Err(CommandError::MissingArgument { command: "attack", .. })
        ));
        assert_eq!(parse("attack K1"), Err(CommandError::InvalidCoord("K1".into())));
        assert_eq!(parse("attack A11"), Err(CommandError::InvalidCoord("A11".into())));
    }
}
