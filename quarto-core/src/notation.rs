//! Action notation.
//!
//! ```text
//! S<piece>  select piece 0-15 for the opponent   (S5)
//! P<cell>   place the selected piece on cell 0-15 (P12)
//! ```
//!
//! A game record is a whitespace-separated list of actions, e.g.
//! `S0 P0 S1 P1`. Prefixes are case-insensitive.

use std::fmt;
use std::str::FromStr;

use crate::{Action, Cell, Piece};

/// Errors raised while parsing action notation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotationError {
    #[error("empty action")]
    Empty,
    #[error("unknown action {0:?}: expected S<piece> or P<cell>")]
    UnknownPrefix(String),
    #[error("invalid index in {0:?}")]
    InvalidIndex(String),
    #[error("index out of range in {0:?}: expected 0-15")]
    OutOfRange(String),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Select(piece) => write!(f, "S{}", piece.0),
            Action::Place(cell) => write!(f, "P{}", cell.0),
        }
    }
}

impl FromStr for Action {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let prefix = chars.next().ok_or(NotationError::Empty)?.to_ascii_uppercase();
        if prefix != 'S' && prefix != 'P' {
            return Err(NotationError::UnknownPrefix(s.to_string()));
        }

        let index: u8 = chars
            .as_str()
            .parse()
            .map_err(|_| NotationError::InvalidIndex(s.to_string()))?;

        let action = if prefix == 'S' {
            Piece::new(index).map(Action::Select)
        } else {
            Cell::new(index).map(Action::Place)
        };
        action.ok_or_else(|| NotationError::OutOfRange(s.to_string()))
    }
}

/// Parse a whitespace-separated action list.
pub fn parse_actions(notation: &str) -> Result<Vec<Action>, NotationError> {
    notation.split_whitespace().map(str::parse).collect()
}

/// Format actions as a space-separated record.
pub fn format_actions(actions: &[Action]) -> String {
    actions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_select_and_place() {
        assert_eq!("S5".parse::<Action>(), Ok(Action::Select(Piece(5))));
        assert_eq!("p12".parse::<Action>(), Ok(Action::Place(Cell(12))));
        assert_eq!(" S0 ".parse::<Action>(), Ok(Action::Select(Piece(0))));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Action>(), Err(NotationError::Empty));
        assert!(matches!("X3".parse::<Action>(), Err(NotationError::UnknownPrefix(_))));
        assert!(matches!("S".parse::<Action>(), Err(NotationError::InvalidIndex(_))));
        assert!(matches!("Pfoo".parse::<Action>(), Err(NotationError::InvalidIndex(_))));
        assert!(matches!("S16".parse::<Action>(), Err(NotationError::OutOfRange(_))));
        assert!(matches!("P300".parse::<Action>(), Err(NotationError::InvalidIndex(_))));
    }

    #[test]
    fn test_display() {
        assert_eq!(Action::Select(Piece(15)).to_string(), "S15");
        assert_eq!(Action::Place(Cell(3)).to_string(), "P3");
    }

    #[test]
    fn test_record() {
        let actions = parse_actions("S0  P0\nS1 P1").unwrap();
        assert_eq!(actions.len(), 4);
        assert_eq!(format_actions(&actions), "S0 P0 S1 P1");
        assert!(parse_actions("   ").unwrap().is_empty());
        assert!(parse_actions("S0 Q1").is_err());
    }
}
