use std::fmt;
use std::ops;

use itertools::Itertools;
use serde::{Deserialize, Serialize};


pub const NUM_RANKS: u8 = 8;
pub const NUM_FILES: u8 = 8;


#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Rank {
    idx: u8, // 0-based, rank '1' is 0
}

impl Rank {
    pub const fn from_zero_based(idx: u8) -> Option<Self> {
        if idx < NUM_RANKS { Some(Self { idx }) } else { None }
    }
    pub fn from_algebraic(ch: char) -> Option<Self> {
        let idx = (ch as u32).checked_sub('1' as u32)?;
        Self::from_zero_based(u8::try_from(idx).ok()?)
    }
    pub const fn to_zero_based(self) -> u8 { self.idx }
    pub const fn to_algebraic(self) -> char { (self.idx + b'1') as char }
    pub fn all() -> impl DoubleEndedIterator<Item = Self> + Clone {
        (0..NUM_RANKS).map(|idx| Self { idx })
    }
}

impl ops::Sub for Rank {
    type Output = i8;
    fn sub(self, other: Self) -> Self::Output { self.idx as i8 - other.idx as i8 }
}


#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct File {
    idx: u8, // 0-based, file 'a' is 0
}

impl File {
    pub const fn from_zero_based(idx: u8) -> Option<Self> {
        if idx < NUM_FILES { Some(Self { idx }) } else { None }
    }
    pub fn from_algebraic(ch: char) -> Option<Self> {
        let idx = (ch as u32).checked_sub('a' as u32)?;
        Self::from_zero_based(u8::try_from(idx).ok()?)
    }
    pub const fn to_zero_based(self) -> u8 { self.idx }
    pub const fn to_algebraic(self) -> char { (self.idx + b'a') as char }
    pub fn all() -> impl DoubleEndedIterator<Item = Self> + Clone {
        (0..NUM_FILES).map(|idx| Self { idx })
    }
}

impl ops::Sub for File {
    type Output = i8;
    fn sub(self, other: Self) -> Self::Output { self.idx as i8 - other.idx as i8 }
}


// A board square. Serialized as its algebraic name, e.g. "e4".
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Coord {
    pub rank: Rank,
    pub file: File,
}

impl Coord {
    pub const fn new(rank: Rank, file: File) -> Self { Self { rank, file } }

    pub fn from_zero_based(file: u8, rank: u8) -> Option<Self> {
        Some(Coord {
            rank: Rank::from_zero_based(rank)?,
            file: File::from_zero_based(file)?,
        })
    }

    pub fn from_algebraic(s: &str) -> Option<Self> {
        let (file, rank) = s.chars().collect_tuple()?;
        Some(Coord {
            rank: Rank::from_algebraic(rank)?,
            file: File::from_algebraic(file)?,
        })
    }

    pub fn to_algebraic(self) -> String {
        format!("{}{}", self.file.to_algebraic(), self.rank.to_algebraic())
    }

    // Ranks bottom-up, files left to right within a rank.
    pub fn all() -> impl Iterator<Item = Coord> {
        Rank::all().cartesian_product(File::all()).map(|(rank, file)| Coord { rank, file })
    }

    // Absolute (file, rank) displacement.
    pub fn distance_components(self, other: Coord) -> (u8, u8) {
        (
            (self.file - other.file).unsigned_abs(),
            (self.rank - other.rank).unsigned_abs(),
        )
    }

    pub fn is_knight_jump(self, other: Coord) -> bool {
        matches!(self.distance_components(other), (1, 2) | (2, 1))
    }
}

impl TryFrom<String> for Coord {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Coord::from_algebraic(&s).ok_or_else(|| format!("invalid square: {s}"))
    }
}

impl From<Coord> for String {
    fn from(coord: Coord) -> Self { coord.to_algebraic() }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file.to_algebraic(), self.rank.to_algebraic())
    }
}

impl fmt::Debug for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coord({}{})", self.file.to_algebraic(), self.rank.to_algebraic())
    }
}


macro_rules! square_consts {
    ($($name:ident = $file:literal $rank:literal),* $(,)?) => {
        impl Coord {
            $(
                pub const $name: Coord = Coord {
                    rank: Rank { idx: $rank },
                    file: File { idx: $file },
                };
            )*
        }
    };
}

square_consts! {
    A1 = 0 0, A2 = 0 1, A3 = 0 2, A4 = 0 3, A5 = 0 4, A6 = 0 5, A7 = 0 6, A8 = 0 7,
    B1 = 1 0, B2 = 1 1, B3 = 1 2, B4 = 1 3, B5 = 1 4, B6 = 1 5, B7 = 1 6, B8 = 1 7,
    C1 = 2 0, C2 = 2 1, C3 = 2 2, C4 = 2 3, C5 = 2 4, C6 = 2 5, C7 = 2 6, C8 = 2 7,
    D1 = 3 0, D2 = 3 1, D3 = 3 2, D4 = 3 3, D5 = 3 4, D6 = 3 5, D7 = 3 6, D8 = 3 7,
    E1 = 4 0, E2 = 4 1, E3 = 4 2, E4 = 4 3, E5 = 4 4, E6 = 4 5, E7 = 4 6, E8 = 4 7,
    F1 = 5 0, F2 = 5 1, F3 = 5 2, F4 = 5 3, F5 = 5 4, F6 = 5 5, F7 = 5 6, F8 = 5 7,
    G1 = 6 0, G2 = 6 1, G3 = 6 2, G4 = 6 3, G5 = 6 4, G6 = 6 5, G7 = 6 6, G8 = 6 7,
    H1 = 7 0, H2 = 7 1, H3 = 7 2, H4 = 7 3, H5 = 7 4, H6 = 7 5, H7 = 7 6, H8 = 7 7,
}
