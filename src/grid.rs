use std::{fmt, ops};

use ndarray::{Array, Array2};

use crate::coord::{Coord, NUM_FILES, NUM_RANKS};
use crate::piece::Piece;


#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Grid {
    data: Array2<Option<Piece>>,
}

impl Grid {
    pub fn new() -> Self {
        Grid {
            data: Array::from_elem((NUM_RANKS as usize, NUM_FILES as usize), None),
        }
    }

    pub fn pieces(&self) -> impl Iterator<Item = (Coord, Piece)> + '_ {
        Coord::all().filter_map(|coord| self[coord].map(|piece| (coord, piece)))
    }
}

impl Default for Grid {
    fn default() -> Self { Self::new() }
}

impl ops::Index<Coord> for Grid {
    type Output = Option<Piece>;
    fn index(&self, pos: Coord) -> &Self::Output { &self.data[coord_to_index(pos)] }
}

impl ops::IndexMut<Coord> for Grid {
    fn index_mut(&mut self, pos: Coord) -> &mut Self::Output {
        &mut self.data[coord_to_index(pos)]
    }
}

// `Coord` is always within 8x8 bounds, so indexing cannot fail.
fn coord_to_index(pos: Coord) -> [usize; 2] {
    [pos.rank.to_zero_based() as usize, pos.file.to_zero_based() as usize]
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Grid ")?;
        f.debug_map()
            .entries(self.pieces().map(|(coord, piece)| (coord.to_algebraic(), piece.to_fen())))
            .finish()
    }
}
