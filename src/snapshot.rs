// Immutable board snapshot decoded from the rules engine's FEN.
//
// The snapshot is never computed locally: every instance comes from text produced by the
// rules engine. This keeps the display in lockstep with the authority on legality.

use itertools::Itertools;

use crate::coord::{Coord, File, NUM_FILES, NUM_RANKS, Rank};
use crate::force::Force;
use crate::grid::Grid;
use crate::piece::Piece;
use crate::util::as_single_char;


pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PositionSnapshot {
    grid: Grid,
    turn: Force,
    castling_rights: String,
    en_passant_target: Option<Coord>,
    halfmove_clock: u32,
    fullmove_number: u32,
}

impl PositionSnapshot {
    pub fn from_fen(fen: &str) -> Result<Self, String> {
        let (placement, turn, castling, en_passant, halfmove, fullmove) = fen
            .split_whitespace()
            .collect_tuple()
            .ok_or_else(|| format!("expected 6 FEN fields: {fen}"))?;
        let grid = grid_from_fen(placement)?;
        let turn = as_single_char(turn)
            .and_then(Force::from_fen)
            .ok_or_else(|| format!("invalid side to move: {turn}"))?;
        let castling_rights = castling_rights_from_fen(castling)?;
        let en_passant_target = en_passant_target_from_fen(en_passant)?;
        let halfmove_clock =
            halfmove.parse().map_err(|_| format!("invalid halfmove clock: {halfmove}"))?;
        let fullmove_number =
            fullmove.parse().map_err(|_| format!("invalid fullmove number: {fullmove}"))?;
        Ok(PositionSnapshot {
            grid,
            turn,
            castling_rights,
            en_passant_target,
            halfmove_clock,
            fullmove_number,
        })
    }

    pub fn starting() -> Self {
        Self::from_fen(STARTING_FEN).expect("starting FEN is valid")
    }

    pub fn grid(&self) -> &Grid { &self.grid }
    pub fn piece_at(&self, coord: Coord) -> Option<Piece> { self.grid[coord] }
    pub fn turn(&self) -> Force { self.turn }
    pub fn castling_rights(&self) -> &str { &self.castling_rights }
    pub fn en_passant_target(&self) -> Option<Coord> { self.en_passant_target }
    pub fn halfmove_clock(&self) -> u32 { self.halfmove_clock }
    pub fn fullmove_number(&self) -> u32 { self.fullmove_number }

    pub fn to_fen(&self) -> String {
        let placement = Rank::all()
            .rev()
            .map(|rank| {
                let mut rank_notation = String::new();
                let mut empty_file_count: u8 = 0;
                for file in File::all() {
                    if let Some(piece) = self.grid[Coord::new(rank, file)] {
                        if empty_file_count > 0 {
                            rank_notation.push_str(&empty_file_count.to_string());
                            empty_file_count = 0;
                        }
                        rank_notation.push(piece.to_fen());
                    } else {
                        empty_file_count += 1;
                    }
                }
                if empty_file_count > 0 {
                    rank_notation.push_str(&empty_file_count.to_string());
                }
                rank_notation
            })
            .join("/");
        let en_passant = self.en_passant_target.map_or_else(|| "-".to_owned(), Coord::to_algebraic);
        format!(
            "{} {} {} {} {} {}",
            placement,
            self.turn.to_fen(),
            self.castling_rights,
            en_passant,
            self.halfmove_clock,
            self.fullmove_number
        )
    }
}

fn grid_from_fen(placement: &str) -> Result<Grid, String> {
    let rows = placement.split('/').collect_vec();
    if rows.len() != NUM_RANKS as usize {
        return Err(format!("expected {NUM_RANKS} ranks, got {}", rows.len()));
    }
    let mut grid = Grid::new();
    for (rank, row) in Rank::all().rev().zip(rows) {
        let mut file_idx: u8 = 0;
        for ch in row.chars() {
            if let Some(skip) = ch.to_digit(10) {
                file_idx += skip as u8;
            } else {
                let piece = Piece::from_fen(ch).ok_or_else(|| format!("invalid piece: {ch}"))?;
                let file = File::from_zero_based(file_idx)
                    .ok_or_else(|| format!("rank {} is too long", rank.to_algebraic()))?;
                grid[Coord::new(rank, file)] = Some(piece);
                file_idx += 1;
            }
            if file_idx > NUM_FILES {
                return Err(format!("rank {} is too long", rank.to_algebraic()));
            }
        }
        if file_idx != NUM_FILES {
            return Err(format!("rank {} is too short", rank.to_algebraic()));
        }
    }
    Ok(grid)
}

fn castling_rights_from_fen(s: &str) -> Result<String, String> {
    if s == "-" || s.chars().all(|ch| matches!(ch, 'K' | 'Q' | 'k' | 'q' | 'A'..='H' | 'a'..='h')) {
        Ok(s.to_owned())
    } else {
        Err(format!("invalid castling rights: {s}"))
    }
}

fn en_passant_target_from_fen(s: &str) -> Result<Option<Coord>, String> {
    if s == "-" {
        Ok(None)
    } else {
        let pos =
            Coord::from_algebraic(s).ok_or_else(|| format!("invalid en passant target: {s}"))?;
        Ok(Some(pos))
    }
}
