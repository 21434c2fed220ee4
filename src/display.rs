// Board orientation and the square <-> pixel mapping.
//
// Pixel coordinates are device pixels of the rendering surface: (0, 0) is the top-left corner
// of the top-left square, `(width_px, height_px)` is the bottom-right corner of the board.

use std::ops;

use serde::{Deserialize, Serialize};

use crate::coord::{Coord, NUM_FILES, NUM_RANKS};
use crate::util::lerp;


#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum BoardOrientation {
    Normal,  // White at bottom
    Rotated, // Black at bottom
}

impl BoardOrientation {
    pub fn flipped(self) -> Self {
        match self {
            BoardOrientation::Normal => BoardOrientation::Rotated,
            BoardOrientation::Rotated => BoardOrientation::Normal,
        }
    }
}

// Describes board squares like `Coord`, but row 0 is the top-most row on screen, which could
// be rank '1' or rank '8'.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DisplayCoord {
    pub x: u8,
    pub y: u8,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct BoardGeometry {
    width_px: f64,
    height_px: f64,
}

pub fn to_display_coord(coord: Coord, orientation: BoardOrientation) -> DisplayCoord {
    let file = coord.file.to_zero_based();
    let rank = coord.rank.to_zero_based();
    match orientation {
        BoardOrientation::Normal => DisplayCoord { x: file, y: NUM_RANKS - rank - 1 },
        BoardOrientation::Rotated => DisplayCoord { x: NUM_FILES - file - 1, y: rank },
    }
}

pub fn from_display_coord(q: DisplayCoord, orientation: BoardOrientation) -> Option<Coord> {
    if q.x >= NUM_FILES || q.y >= NUM_RANKS {
        return None;
    }
    match orientation {
        BoardOrientation::Normal => Coord::from_zero_based(q.x, NUM_RANKS - q.y - 1),
        BoardOrientation::Rotated => Coord::from_zero_based(NUM_FILES - q.x - 1, q.y),
    }
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self { PixelPoint { x, y } }

    pub fn distance_to(self, other: PixelPoint) -> f64 { (self.x - other.x).hypot(self.y - other.y) }

    pub fn lerp(self, other: PixelPoint, t: f64) -> PixelPoint {
        PixelPoint {
            x: lerp(self.x, other.x, t),
            y: lerp(self.y, other.y, t),
        }
    }
}

impl BoardGeometry {
    pub fn new(width_px: f64, height_px: f64) -> Self { BoardGeometry { width_px, height_px } }

    pub fn width_px(&self) -> f64 { self.width_px }
    pub fn height_px(&self) -> f64 { self.height_px }
    pub fn square_width(&self) -> f64 { self.width_px / f64::from(NUM_FILES) }
    pub fn square_height(&self) -> f64 { self.height_px / f64::from(NUM_RANKS) }
    // Smaller side of a square; used to scale strokes and glyphs.
    pub fn square_size(&self) -> f64 { self.square_width().min(self.square_height()) }

    // Top-left corner of a square.
    pub fn square_pivot(&self, coord: Coord, orientation: BoardOrientation) -> PixelPoint {
        let q = to_display_coord(coord, orientation);
        PixelPoint {
            x: f64::from(q.x) * self.square_width(),
            y: f64::from(q.y) * self.square_height(),
        }
    }

    pub fn square_center(&self, coord: Coord, orientation: BoardOrientation) -> PixelPoint {
        self.square_pivot(coord, orientation) + (self.square_width() / 2., self.square_height() / 2.)
    }

    // Returns the square under a pixel point or `None` when the point is outside the board.
    pub fn square_at(&self, p: PixelPoint, orientation: BoardOrientation) -> Option<Coord> {
        if self.width_px <= 0. || self.height_px <= 0. {
            return None;
        }
        if !(0. ..self.width_px).contains(&p.x) || !(0. ..self.height_px).contains(&p.y) {
            return None;
        }
        let x = (p.x / self.square_width()).floor() as u8;
        let y = (p.y / self.square_height()).floor() as u8;
        from_display_coord(DisplayCoord { x, y }, orientation)
    }
}

// Poor man's 2D geometry.

impl ops::Add<(f64, f64)> for PixelPoint {
    type Output = Self;
    fn add(self, (x, y): (f64, f64)) -> Self::Output { PixelPoint { x: self.x + x, y: self.y + y } }
}

impl ops::Sub for PixelPoint {
    type Output = (f64, f64);
    fn sub(self, rhs: PixelPoint) -> Self::Output { (self.x - rhs.x, self.y - rhs.y) }
}

pub fn mult_vec((x, y): (f64, f64), s: f64) -> (f64, f64) { (x * s, y * s) }

pub fn normalize_vec((x, y): (f64, f64)) -> (f64, f64) {
    let len = x.hypot(y);
    if len == 0. { (0., 0.) } else { mult_vec((x, y), 1. / len) }
}

pub fn perpendicular_vec((x, y): (f64, f64)) -> (f64, f64) { (-y, x) }


#[cfg(test)]
mod tests {
    use super::*;

    const ORIENTATIONS: [BoardOrientation; 2] = [BoardOrientation::Normal, BoardOrientation::Rotated];

    #[test]
    fn display_coord_round_trip() {
        for orientation in ORIENTATIONS {
            for coord in Coord::all() {
                let q = to_display_coord(coord, orientation);
                assert_eq!(from_display_coord(q, orientation), Some(coord));
            }
        }
    }

    #[test]
    fn pixel_round_trip() {
        for (w, h) in [(800., 800.), (333., 333.), (1017., 611.), (8., 8.)] {
            let geometry = BoardGeometry::new(w, h);
            for orientation in ORIENTATIONS {
                for coord in Coord::all() {
                    let p = geometry.square_center(coord, orientation);
                    assert_eq!(geometry.square_at(p, orientation), Some(coord));
                }
            }
        }
    }

    #[test]
    fn orientation_corners() {
        let geometry = BoardGeometry::new(800., 800.);
        let top_left = PixelPoint::new(1., 1.);
        assert_eq!(geometry.square_at(top_left, BoardOrientation::Normal), Some(Coord::A8));
        assert_eq!(geometry.square_at(top_left, BoardOrientation::Rotated), Some(Coord::H1));
        let bottom_left = PixelPoint::new(1., 799.);
        assert_eq!(geometry.square_at(bottom_left, BoardOrientation::Normal), Some(Coord::A1));
        assert_eq!(geometry.square_at(bottom_left, BoardOrientation::Rotated), Some(Coord::H8));
    }

    #[test]
    fn outside_board() {
        let geometry = BoardGeometry::new(800., 800.);
        assert_eq!(geometry.square_at(PixelPoint::new(-1., 10.), BoardOrientation::Normal), None);
        assert_eq!(geometry.square_at(PixelPoint::new(800., 10.), BoardOrientation::Normal), None);
        assert_eq!(geometry.square_at(PixelPoint::new(10., 800.5), BoardOrientation::Normal), None);
        let empty = BoardGeometry::new(0., 0.);
        assert_eq!(empty.square_at(PixelPoint::new(0., 0.), BoardOrientation::Normal), None);
    }
}
