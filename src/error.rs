use std::fmt;

use crate::rules::RulesError;


#[derive(Clone, PartialEq, Eq, Debug)]
pub enum BoardError {
    // The rules engine produced a position the board cannot decode.
    MalformedPosition(String),
    UnknownTheme(String),
    // Propagated unchanged from the rules engine, e.g. on an invalid FEN.
    Rules(RulesError),
    MalformedDrawing(String),
    InvalidConfig(String),
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::MalformedPosition(msg) => write!(f, "malformed position: {msg}"),
            BoardError::UnknownTheme(name) => write!(f, "unknown theme: {name}"),
            BoardError::Rules(err) => write!(f, "rules engine error: {err}"),
            BoardError::MalformedDrawing(msg) => write!(f, "malformed drawing state: {msg}"),
            BoardError::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for BoardError {}

impl From<RulesError> for BoardError {
    fn from(err: RulesError) -> Self { BoardError::Rules(err) }
}
