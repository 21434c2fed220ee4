// `RulesEngine` backed by the `shakmaty` move generator.

use itertools::Itertools;
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, Position, Role, Square};

use crate::board_move::BoardMove;
use crate::coord::Coord;
use crate::force::Force;
use crate::piece::{Piece, PieceKind};
use crate::rules::{MoveOutcome, RulesEngine, RulesError};


#[derive(Clone, Debug, Default)]
pub struct ShakmatyRules {
    position: Chess,
}

impl ShakmatyRules {
    pub fn new() -> Self { Self::default() }

    pub fn from_fen(encoded: &str) -> Result<Self, RulesError> {
        Ok(ShakmatyRules { position: parse_position(encoded)? })
    }

    fn convert_move(&self, m: &Move) -> Option<BoardMove> {
        let from = from_square(m.from()?)?;
        let to = match *m {
            Move::Castle { king, rook } => castle_king_destination(king, rook)?,
            _ => from_square(m.to())?,
        };
        let captured = m.capture().map(|role| Piece::new(force_of(!self.position.turn()), kind_of(role)));
        let promotion = m.promotion().map(kind_of);
        let notation = match promotion {
            Some(kind) => format!("{from}{to}{}", kind.to_algebraic().to_ascii_lowercase()),
            None => format!("{from}{to}"),
        };
        Some(BoardMove {
            from,
            to,
            promotion,
            captured,
            notation: Some(notation),
        })
    }

    fn rejection_reason(&self, mv: &BoardMove) -> String {
        match self.position.board().piece_at(to_square(mv.from)) {
            None => format!("no piece on {}", mv.from),
            Some(piece) if piece.color != self.position.turn() => {
                format!("{} is not to move", force_of(piece.color))
            }
            Some(_) => format!("illegal move {}{}", mv.from, mv.to),
        }
    }
}

impl RulesEngine for ShakmatyRules {
    fn position(&self) -> String {
        Fen::from_setup(self.position.clone().into_setup(EnPassantMode::Legal)).to_string()
    }

    fn set_position(&mut self, encoded: &str) -> Result<(), RulesError> {
        self.position = parse_position(encoded)?;
        Ok(())
    }

    fn turn_to_move(&self) -> Force { force_of(self.position.turn()) }

    fn legal_destinations_from(&self, from: Coord) -> Vec<BoardMove> {
        let from_sq = to_square(from);
        self.position
            .legal_moves()
            .iter()
            .filter(|m| m.from() == Some(from_sq))
            .filter_map(|m| self.convert_move(m))
            .unique_by(|mv| mv.to)
            .collect()
    }

    fn attempt_move(&mut self, mv: &BoardMove) -> MoveOutcome {
        let wanted_promotion = mv.promotion.map(role_of);
        let legal = self.position.legal_moves().into_iter().find(|m| {
            self.convert_move(m).is_some_and(|candidate| {
                candidate.from == mv.from && candidate.to == mv.to
            }) && m.promotion() == wanted_promotion
        });
        let Some(m) = legal else {
            return MoveOutcome::Rejected { reason: self.rejection_reason(mv) };
        };
        let Some(applied_move) = self.convert_move(&m) else {
            return MoveOutcome::Rejected { reason: self.rejection_reason(mv) };
        };
        self.position.play_unchecked(&m);
        MoveOutcome::Applied { new_position: self.position(), applied_move }
    }
}

fn parse_position(encoded: &str) -> Result<Chess, RulesError> {
    let fen: Fen = encoded
        .parse()
        .map_err(|err| RulesError(format!("cannot parse FEN \"{encoded}\": {err}")))?;
    fen.into_position(CastlingMode::Standard)
        .map_err(|err| RulesError(format!("illegal position \"{encoded}\": {err}")))
}

fn to_square(coord: Coord) -> Square {
    Square::new(u32::from(coord.file.to_zero_based()) + 8 * u32::from(coord.rank.to_zero_based()))
}

fn from_square(sq: Square) -> Option<Coord> {
    Coord::from_zero_based(u8::from(sq.file()), u8::from(sq.rank()))
}

// Castling is encoded as "king takes rook"; the board wants the king's landing square.
fn castle_king_destination(king: Square, rook: Square) -> Option<Coord> {
    let king_coord = from_square(king)?;
    let rook_coord = from_square(rook)?;
    let landing_file = if rook_coord.file > king_coord.file { Coord::G1.file } else { Coord::C1.file };
    Some(Coord::new(king_coord.rank, landing_file))
}

fn force_of(color: Color) -> Force {
    match color {
        Color::White => Force::White,
        Color::Black => Force::Black,
    }
}

fn kind_of(role: Role) -> PieceKind {
    match role {
        Role::Pawn => PieceKind::Pawn,
        Role::Knight => PieceKind::Knight,
        Role::Bishop => PieceKind::Bishop,
        Role::Rook => PieceKind::Rook,
        Role::Queen => PieceKind::Queen,
        Role::King => PieceKind::King,
    }
}

fn role_of(kind: PieceKind) -> Role {
    match kind {
        PieceKind::Pawn => Role::Pawn,
        PieceKind::Knight => Role::Knight,
        PieceKind::Bishop => Role::Bishop,
        PieceKind::Rook => Role::Rook,
        PieceKind::Queen => Role::Queen,
        PieceKind::King => Role::King,
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::STARTING_FEN;

    fn destinations(rules: &ShakmatyRules, from: Coord) -> Vec<Coord> {
        rules.legal_destinations_from(from).into_iter().map(|mv| mv.to).sorted().collect()
    }

    #[test]
    fn starting_position() {
        let rules = ShakmatyRules::new();
        assert_eq!(rules.position(), STARTING_FEN);
        assert_eq!(rules.turn_to_move(), Force::White);
        assert_eq!(destinations(&rules, Coord::E2), vec![Coord::E3, Coord::E4]);
        assert_eq!(destinations(&rules, Coord::G1), vec![Coord::F3, Coord::H3]);
        assert!(destinations(&rules, Coord::E7).is_empty());
    }

    #[test]
    fn attempt_move() {
        let mut rules = ShakmatyRules::new();
        let outcome = rules.attempt_move(&BoardMove::new(Coord::E2, Coord::E5));
        assert!(matches!(outcome, MoveOutcome::Rejected { .. }));
        assert_eq!(rules.position(), STARTING_FEN);

        let MoveOutcome::Applied { new_position, applied_move } =
            rules.attempt_move(&BoardMove::new(Coord::E2, Coord::E4))
        else {
            panic!("e2e4 must be legal");
        };
        assert_eq!(applied_move.notation.as_deref(), Some("e2e4"));
        assert_eq!(rules.turn_to_move(), Force::Black);
        assert!(new_position.starts_with("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b"));
    }

    #[test]
    fn castling_uses_king_destination() {
        let mut rules =
            ShakmatyRules::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();
        assert!(destinations(&rules, Coord::E1).contains(&Coord::G1));
        assert!(rules.attempt_move(&BoardMove::new(Coord::E1, Coord::C1)).is_applied());
        assert!(rules.position().starts_with("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/2KR3R b kq"));
    }

    #[test]
    fn promotion_requires_piece() {
        let fen = "8/4P3/8/8/8/8/k7/7K w - - 0 1";
        let mut rules = ShakmatyRules::from_fen(fen).unwrap();
        assert!(!rules.attempt_move(&BoardMove::new(Coord::E7, Coord::E8)).is_applied());
        let promote = BoardMove::new(Coord::E7, Coord::E8).with_promotion(Some(PieceKind::Knight));
        assert!(rules.attempt_move(&promote).is_applied());
    }

    #[test]
    fn square_conversion_matches_names() {
        for coord in Coord::all() {
            let sq = to_square(coord);
            assert_eq!(sq.to_string(), coord.to_algebraic());
            assert_eq!(from_square(sq), Some(coord));
        }
    }

    #[test]
    fn malformed_position() {
        let mut rules = ShakmatyRules::new();
        assert!(rules.set_position("not a fen").is_err());
        assert_eq!(rules.position(), STARTING_FEN);
    }
}
