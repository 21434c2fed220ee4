// The rules capability consumed by the board. Legality, check detection and position encoding
// all live behind this trait; the board only renders what it is told.

use std::fmt;

use crate::board_move::BoardMove;
use crate::coord::Coord;
use crate::force::Force;


#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RulesError(pub String);

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum MoveOutcome {
    Applied {
        new_position: String,
        applied_move: BoardMove,
    },
    // Illegal moves are an ordinary outcome, not an error.
    Rejected { reason: String },
}

pub trait RulesEngine {
    // Current position encoded as FEN.
    fn position(&self) -> String;
    fn set_position(&mut self, encoded: &str) -> Result<(), RulesError>;
    fn turn_to_move(&self) -> Force;
    fn legal_destinations_from(&self, from: Coord) -> Vec<BoardMove>;
    fn attempt_move(&mut self, mv: &BoardMove) -> MoveOutcome;
}

impl MoveOutcome {
    pub fn is_applied(&self) -> bool { matches!(self, MoveOutcome::Applied { .. }) }
}

impl fmt::Display for RulesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl std::error::Error for RulesError {}
