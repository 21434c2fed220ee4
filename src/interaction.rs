// Transient pointer-gesture state. Holds data only; deciding what a gesture means is up to
// `BoardView`.

use std::time::Duration;

use instant::Instant;

use crate::board_move::BoardMove;
use crate::coord::Coord;
use crate::display::PixelPoint;
use crate::piece::Piece;


#[derive(Clone, Copy, PartialEq, Debug)]
pub struct DragPayload {
    pub from: Coord,
    pub piece: Piece,
    // Live pointer position in surface pixels.
    pub point: PixelPoint,
    // Dragging a piece of the side not to move.
    pub premove: bool,
}

// A press on a piece that may turn into either a click or a drag.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct PendingDrag {
    pub square: Coord,
    pub piece: Piece,
    pub origin: PixelPoint,
    pub pressed_at: Instant,
    pub premove: bool,
}

#[derive(Clone, Debug, Default)]
pub struct InteractionState {
    selected: Option<Coord>,
    selection_is_premove: bool,
    legal_destinations: Vec<BoardMove>,
    drag: Option<DragPayload>,
    hover: Option<Coord>,
    pointer: Option<Coord>,
    pending_drag: Option<PendingDrag>,
}

impl PendingDrag {
    pub fn exceeds_threshold(
        &self, point: PixelPoint, now: Instant, distance_px: f64, delay: Duration,
    ) -> bool {
        self.origin.distance_to(point) > distance_px
            || now.saturating_duration_since(self.pressed_at) >= delay
    }

    pub fn into_drag(self, point: PixelPoint) -> DragPayload {
        DragPayload {
            from: self.square,
            piece: self.piece,
            point,
            premove: self.premove,
        }
    }
}

impl InteractionState {
    pub fn new() -> Self { Self::default() }

    pub fn selected(&self) -> Option<Coord> { self.selected }
    pub fn selection_is_premove(&self) -> bool { self.selection_is_premove }
    pub fn legal_destinations(&self) -> &[BoardMove] { &self.legal_destinations }
    pub fn is_legal_destination(&self, coord: Coord) -> bool {
        self.legal_destinations.iter().any(|mv| mv.to == coord)
    }
    pub fn drag(&self) -> Option<&DragPayload> { self.drag.as_ref() }
    pub fn hover(&self) -> Option<Coord> { self.hover }
    pub fn pointer(&self) -> Option<Coord> { self.pointer }
    pub fn pending_drag(&self) -> Option<&PendingDrag> { self.pending_drag.as_ref() }

    pub fn select(&mut self, square: Coord, legal_destinations: Vec<BoardMove>, premove: bool) {
        self.selected = Some(square);
        self.selection_is_premove = premove;
        self.legal_destinations = legal_destinations;
    }

    // Replaces any previous drag: there is never more than one.
    pub fn set_drag(&mut self, drag: DragPayload) {
        self.pending_drag = None;
        self.drag = Some(drag);
    }

    pub fn update_drag_point(&mut self, point: PixelPoint) {
        if let Some(drag) = &mut self.drag {
            drag.point = point;
        }
    }

    pub fn take_drag(&mut self) -> Option<DragPayload> { self.drag.take() }

    pub fn set_pending_drag(&mut self, pending: Option<PendingDrag>) { self.pending_drag = pending; }
    pub fn take_pending_drag(&mut self) -> Option<PendingDrag> { self.pending_drag.take() }

    pub fn set_hover(&mut self, square: Option<Coord>) { self.hover = square; }
    pub fn set_pointer(&mut self, square: Option<Coord>) { self.pointer = square; }

    pub fn clear_all(&mut self) { *self = Self::default(); }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::force::Force;
    use crate::piece::PieceKind;

    fn pending(at: Instant) -> PendingDrag {
        PendingDrag {
            square: Coord::E2,
            piece: Piece::new(Force::White, PieceKind::Pawn),
            origin: PixelPoint::new(450., 650.),
            pressed_at: at,
            premove: false,
        }
    }

    #[test]
    fn threshold() {
        let t0 = Instant::now();
        let p = pending(t0);
        let delay = Duration::from_millis(150);
        assert!(!p.exceeds_threshold(PixelPoint::new(452., 651.), t0, 4., delay));
        assert!(p.exceeds_threshold(PixelPoint::new(460., 650.), t0, 4., delay));
        assert!(p.exceeds_threshold(PixelPoint::new(450., 650.), t0 + delay, 4., delay));
    }

    #[test]
    fn single_drag_and_clear_all() {
        let t0 = Instant::now();
        let mut state = InteractionState::new();
        state.select(Coord::E2, vec![BoardMove::new(Coord::E2, Coord::E4)], false);
        state.set_pending_drag(Some(pending(t0)));
        state.set_drag(pending(t0).into_drag(PixelPoint::new(1., 2.)));
        assert!(state.pending_drag().is_none());
        state.set_drag(pending(t0).into_drag(PixelPoint::new(3., 4.)));
        assert_eq!(state.drag().unwrap().point, PixelPoint::new(3., 4.));
        assert!(state.is_legal_destination(Coord::E4));
        assert!(!state.is_legal_destination(Coord::E5));

        state.set_hover(Some(Coord::E4));
        state.clear_all();
        assert_eq!(state.selected(), None);
        assert!(state.drag().is_none());
        assert!(state.legal_destinations().is_empty());
        assert_eq!(state.hover(), None);
    }
}
