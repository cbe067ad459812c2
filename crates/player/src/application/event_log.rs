//! Event log aggregation
//!
//! Consecutive hit/sunk/miss events from the same side fold into one entry that
//! accumulates coordinates: three hits by us read "Hit at D3, D4, D5" instead of
//! three separate lines.

use chrono::{DateTime, Utc};

use broadside_domain::Coord;

/// Number of entries a front-end shows.
pub const DISPLAY_LIMIT: usize = 7;

/// Semantic kind of a log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogEventKind {
    /// An attack by us with no hit/miss/sunk classification
    AttackByMe,
    /// An attack on us with no hit/miss/sunk classification
    AttackByOpponent,
    Hit,
    Sunk,
    Miss,
    Victory,
    Defeat,
    NewGame,
    Generic,
}

impl LogEventKind {
    pub fn is_mergeable(self) -> bool {
        matches!(self, Self::Hit | Self::Sunk | Self::Miss)
    }
}

/// Which side an event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    Player,
    Opponent,
}

/// Verb used in grouped messages.
fn verb(kind: LogEventKind, origin: Origin) -> Option<&'static str> {
    let verb = match (kind, origin) {
        (LogEventKind::Hit, Origin::Player) => "Hit",
        (LogEventKind::Hit, Origin::Opponent) => "Opponent hit",
        (LogEventKind::Sunk, Origin::Player) => "Sunk",
        (LogEventKind::Sunk, Origin::Opponent) => "Opponent sunk",
        (LogEventKind::Miss, Origin::Player) => "Missed",
        (LogEventKind::Miss, Origin::Opponent) => "Opponent missed",
        _ => return None,
    };
    Some(verb)
}

fn grouped_message(verb: &str, coords: &[Coord]) -> String {
    let cells: Vec<String> = coords.iter().map(|c| c.label()).collect();
    format!("{} at {}", verb, cells.join(", "))
}

/// A semantic event, tagged with its origin at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub kind: LogEventKind,
    pub origin: Origin,
    pub coord: Option<Coord>,
    pub message: String,
}

impl LogEvent {
    pub fn new(kind: LogEventKind, origin: Origin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            coord: None,
            message: message.into(),
        }
    }

    /// Event about one attacked cell. Mergeable kinds get the grouped wording.
    pub fn at(kind: LogEventKind, origin: Origin, coord: Coord) -> Self {
        let message = match verb(kind, origin) {
            Some(verb) => grouped_message(verb, &[coord]),
            None => match origin {
                Origin::Player => format!("At {}", coord),
                Origin::Opponent => format!("Opponent at {}", coord),
            },
        };
        Self {
            kind,
            origin,
            coord: Some(coord),
            message,
        }
    }

    pub fn generic(message: impl Into<String>) -> Self {
        Self::new(LogEventKind::Generic, Origin::Player, message)
    }
}

/// One line of the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub kind: LogEventKind,
    pub origin: Origin,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Distinct cells in first-seen order
    pub coords: Vec<Coord>,
}

impl LogEntry {
    /// `HH:MM` for display.
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M").to_string()
    }
}

/// Ordered, uncapped event log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    entries: Vec<LogEntry>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold `event` into the log.
    ///
    /// Hit/sunk/miss events extend the last entry when it has the same kind and
    /// origin; anything else starts a new entry.
    pub fn record(&mut self, event: LogEvent, at: DateTime<Utc>) {
        if let Some(verb) = verb(event.kind, event.origin) {
            if let Some(last) = self
                .entries
                .last_mut()
                .filter(|last| last.kind == event.kind && last.origin == event.origin)
            {
                if let Some(coord) = event.coord {
                    if !last.coords.contains(&coord) {
                        last.coords.push(coord);
                    }
                }
                last.message = grouped_message(verb, &last.coords);
                last.timestamp = at;
                return;
            }
        }

        self.entries.push(LogEntry {
            kind: event.kind,
            origin: event.origin,
            message: event.message,
            timestamp: at,
            coords: event.coord.into_iter().collect(),
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// The last [`DISPLAY_LIMIT`] entries, oldest first.
    pub fn recent(&self) -> &[LogEntry] {
        let start = self.entries.len().saturating_sub(DISPLAY_LIMIT);
        &self.entries[start..]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }
}
