use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::coord::Coord;
use crate::force::Force;
use crate::piece::{Piece, PieceKind};


#[derive(Clone, PartialEq, Eq, Debug, new, Serialize, Deserialize)]
pub struct BoardMove {
    pub from: Coord,
    pub to: Coord,
    #[new(default)]
    pub promotion: Option<PieceKind>,
    #[new(default)]
    pub captured: Option<Piece>,
    #[new(default)]
    pub notation: Option<String>,
}

impl BoardMove {
    pub fn with_promotion(mut self, promotion: Option<PieceKind>) -> Self {
        self.promotion = promotion;
        self
    }
}

// A move queued by the side not to move. Carries no legality guarantee: it is only checked
// when replayed against a later position.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, new, Serialize, Deserialize)]
pub struct Premove {
    pub from: Coord,
    pub to: Coord,
    #[new(default)]
    #[serde(default)]
    pub promotion: Option<PieceKind>,
}

impl Premove {
    pub fn to_move(self) -> BoardMove {
        BoardMove::new(self.from, self.to).with_promotion(self.promotion)
    }
}

// Whether a piece moving to `to` must promote. Only pawns reaching the far rank do.
pub fn needs_promotion(piece: Piece, to: Coord) -> bool {
    let last_rank = match piece.force {
        Force::White => 7,
        Force::Black => 0,
    };
    piece.kind == PieceKind::Pawn && to.rank.to_zero_based() == last_rank
}
