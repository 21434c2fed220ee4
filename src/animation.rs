// Eased transition between two position snapshots.
//
// Pieces are matched by symbol: a piece that left square A and a piece of the same kind and
// color that appeared on square B are treated as one piece moving from A to B. Pieces that
// appear without a counterpart are shown at their destination right away; pieces that
// disappear without one are not drawn at all.

use std::time::Duration;

use instant::Instant;
use itertools::Itertools;

use crate::board_move::BoardMove;
use crate::coord::Coord;
use crate::display::{BoardGeometry, BoardOrientation, PixelPoint};
use crate::piece::Piece;
use crate::snapshot::PositionSnapshot;


pub fn ease_out_cubic(t: f64) -> f64 { 1. - (1. - t).powi(3) }

// A piece travelling from `from` to `to`. Stationary and newly appearing pieces have
// `from == to`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AnimatedPiece {
    pub piece: Piece,
    pub from: Coord,
    pub to: Coord,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct FramePiece {
    pub piece: Piece,
    pub from: Coord,
    pub to: Coord,
    // Eased, in [0, 1].
    pub progress: f64,
}

#[derive(Clone, Debug)]
struct Animation {
    started_at: Instant,
    pieces: Vec<AnimatedPiece>,
}

#[derive(Clone, Debug)]
pub struct AnimationController {
    duration: Duration,
    current: Option<Animation>,
}

impl FramePiece {
    pub fn pivot(&self, geometry: &BoardGeometry, orientation: BoardOrientation) -> PixelPoint {
        let from = geometry.square_pivot(self.from, orientation);
        let to = geometry.square_pivot(self.to, orientation);
        from.lerp(to, self.progress)
    }
}

impl AnimationController {
    pub fn new(duration: Duration) -> Self { AnimationController { duration, current: None } }

    pub fn is_active(&self) -> bool { self.current.is_some() }

    // Supersedes any running animation. With zero duration there is nothing to animate and the
    // controller stays idle.
    pub fn start(
        &mut self, old: &PositionSnapshot, new: &PositionSnapshot, hint: Option<&BoardMove>,
        now: Instant,
    ) {
        if self.duration.is_zero() {
            self.current = None;
            return;
        }
        self.current = Some(Animation {
            started_at: now,
            pieces: correspondence(old, new, hint),
        });
    }

    pub fn cancel(&mut self) { self.current = None; }

    // Linear progress in [0, 1], or `None` if idle.
    pub fn progress(&self, now: Instant) -> Option<f64> {
        let animation = self.current.as_ref()?;
        let elapsed = now.saturating_duration_since(animation.started_at);
        Some((elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0., 1.))
    }

    pub fn frame(&self, now: Instant) -> Option<Vec<FramePiece>> {
        let animation = self.current.as_ref()?;
        let progress = ease_out_cubic(self.progress(now)?);
        Some(
            animation
                .pieces
                .iter()
                .map(|p| FramePiece {
                    piece: p.piece,
                    from: p.from,
                    to: p.to,
                    progress,
                })
                .collect(),
        )
    }

    // Drops the animation once it has run its course. Returns whether it just finished, in
    // which case the caller owes one render from the final snapshot.
    pub fn finish_if_done(&mut self, now: Instant) -> bool {
        if self.progress(now).is_some_and(|t| t >= 1.) {
            self.current = None;
            true
        } else {
            false
        }
    }
}

// Everything that is on the board after the transition, with the square each piece comes from.
pub fn correspondence(
    old: &PositionSnapshot, new: &PositionSnapshot, hint: Option<&BoardMove>,
) -> Vec<AnimatedPiece> {
    let mut result = vec![];
    let mut vacated = vec![];
    let mut arrived = vec![];
    for coord in Coord::all() {
        let before = old.piece_at(coord);
        let after = new.piece_at(coord);
        if before == after {
            if let Some(piece) = after {
                result.push(AnimatedPiece { piece, from: coord, to: coord });
            }
            continue;
        }
        if let Some(piece) = before {
            vacated.push((coord, piece));
        }
        if let Some(piece) = after {
            arrived.push((coord, piece));
        }
    }

    // The moved piece keeps its identity even when another piece of the same kind is closer,
    // and across promotion.
    if let Some(mv) = hint {
        let from_idx = vacated.iter().position(|&(coord, _)| coord == mv.from);
        let to_idx = arrived.iter().position(|&(coord, _)| coord == mv.to);
        if let (Some(from_idx), Some(to_idx)) = (from_idx, to_idx) {
            if vacated[from_idx].1.force == arrived[to_idx].1.force {
                let (from, _) = vacated.swap_remove(from_idx);
                let (to, piece) = arrived.swap_remove(to_idx);
                result.push(AnimatedPiece { piece, from, to });
            }
        }
    }

    let candidates = vacated
        .iter()
        .enumerate()
        .cartesian_product(arrived.iter().enumerate())
        .filter(|((_, (_, a)), (_, (_, b)))| a == b)
        .map(|((i, &(from, _)), (j, &(to, _)))| (square_distance(from, to), i, j))
        .sorted_by_key(|&(distance, i, j)| (distance, i, j));
    let mut vacated_used = vec![false; vacated.len()];
    let mut arrived_used = vec![false; arrived.len()];
    for (_, i, j) in candidates {
        if vacated_used[i] || arrived_used[j] {
            continue;
        }
        vacated_used[i] = true;
        arrived_used[j] = true;
        result.push(AnimatedPiece { piece: arrived[j].1, from: vacated[i].0, to: arrived[j].0 });
    }
    for (j, &(to, piece)) in arrived.iter().enumerate() {
        if !arrived_used[j] {
            result.push(AnimatedPiece { piece, from: to, to });
        }
    }
    result
}

// Squared Euclidean distance in squares; exact, so pairings compare without rounding.
fn square_distance(a: Coord, b: Coord) -> u32 {
    let (df, dr) = a.distance_components(b);
    u32::from(df).pow(2) + u32::from(dr).pow(2)
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::force::Force;
    use crate::piece::PieceKind;

    fn snapshot(fen: &str) -> PositionSnapshot { PositionSnapshot::from_fen(fen).unwrap() }

    fn moving(pieces: &[AnimatedPiece]) -> Vec<(Coord, Coord)> {
        pieces.iter().filter(|p| p.from != p.to).map(|p| (p.from, p.to)).sorted().collect()
    }

    #[test]
    fn easing() {
        assert_eq!(ease_out_cubic(0.), 0.);
        assert_eq!(ease_out_cubic(1.), 1.);
        assert_eq!(ease_out_cubic(0.5), 0.875);
    }

    #[test]
    fn single_move() {
        let old = PositionSnapshot::starting();
        let new = snapshot("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1");
        let pieces = correspondence(&old, &new, None);
        assert_eq!(pieces.len(), 32);
        assert_eq!(moving(&pieces), vec![(Coord::E2, Coord::E4)]);
    }

    #[test]
    fn like_piece_exchange_covers_every_square_once() {
        // Both white knights move at once.
        let old = snapshot("4k3/8/8/8/8/8/8/1N2K1N1 w - - 0 1");
        let new = snapshot("4k3/8/8/8/8/2N2N2/8/4K3 w - - 0 1");
        let pieces = correspondence(&old, &new, None);
        let moved = moving(&pieces);
        assert_eq!(moved, vec![(Coord::B1, Coord::C3), (Coord::G1, Coord::F3)]);
        let origins: Vec<_> = moved.iter().map(|&(from, _)| from).sorted().collect();
        let destinations: Vec<_> = moved.iter().map(|&(_, to)| to).sorted().collect();
        assert_eq!(origins, vec![Coord::B1, Coord::G1]);
        assert_eq!(destinations, vec![Coord::C3, Coord::F3]);
    }

    #[test]
    fn hint_pins_moved_piece() {
        let old = snapshot("4k3/8/8/8/8/8/8/R3K2R w - - 0 1");
        let new = snapshot("4k3/8/8/8/8/8/8/1R2K1R1 w - - 0 1");
        let unhinted = correspondence(&old, &new, None);
        assert_eq!(moving(&unhinted), vec![(Coord::A1, Coord::B1), (Coord::H1, Coord::G1)]);

        let hint = BoardMove::new(Coord::H1, Coord::B1);
        let pinned = correspondence(&old, &new, Some(&hint));
        assert_eq!(moving(&pinned), vec![(Coord::A1, Coord::G1), (Coord::H1, Coord::B1)]);
    }

    #[test]
    fn promotion_keeps_identity_with_hint() {
        let old = snapshot("4k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        let new = snapshot("Q3k3/8/8/8/8/8/8/4K3 b - - 0 1");
        let hint = BoardMove::new(Coord::A7, Coord::A8).with_promotion(Some(PieceKind::Queen));
        let pieces = correspondence(&old, &new, Some(&hint));
        let queen = pieces.iter().find(|p| p.to == Coord::A8).unwrap();
        assert_eq!(queen.from, Coord::A7);
        assert_eq!(queen.piece, Piece::new(Force::White, PieceKind::Queen));

        // Without the hint the queen just appears.
        let pieces = correspondence(&old, &new, None);
        let queen = pieces.iter().find(|p| p.to == Coord::A8).unwrap();
        assert_eq!(queen.from, Coord::A8);
    }

    #[test]
    fn capture_vanishes() {
        let old = snapshot("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1");
        let new = snapshot("4k3/8/8/3P4/8/8/8/4K3 b - - 0 1");
        let pieces = correspondence(&old, &new, None);
        assert_eq!(pieces.len(), 3);
        assert_eq!(moving(&pieces), vec![(Coord::E4, Coord::D5)]);
    }

    #[test]
    fn controller_lifecycle() {
        let t0 = Instant::now();
        let old = PositionSnapshot::starting();
        let new = snapshot("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1");
        let mut controller = AnimationController::new(Duration::from_millis(200));
        controller.start(&old, &new, None, t0);
        assert!(controller.is_active());

        let half = controller.frame(t0 + Duration::from_millis(100)).unwrap();
        let pawn = half.iter().find(|p| p.from == Coord::E2).unwrap();
        assert_eq!(pawn.progress, 0.875);

        assert!(!controller.finish_if_done(t0 + Duration::from_millis(150)));
        assert!(controller.finish_if_done(t0 + Duration::from_millis(250)));
        assert!(!controller.is_active());
        assert!(controller.frame(t0).is_none());
    }

    #[test]
    fn zero_duration_is_instant() {
        let mut controller = AnimationController::new(Duration::ZERO);
        let s = PositionSnapshot::starting();
        controller.start(&s, &s, None, Instant::now());
        assert!(!controller.is_active());
    }
}
