// Rust-upgrade (https://github.com/rust-lang/rust/issues/46379):
//   remove `#[allow(dead_code)]` before public functions.

use std::rc::Rc;
use std::sync::mpsc;
use std::time::Duration;

use board_canvas::board_view::{BoardView, PointerButton};
use board_canvas::config::BoardConfig;
use board_canvas::coord::Coord;
use board_canvas::drawing::Modifiers;
use board_canvas::event::BoardEvent;
use board_canvas::force::Force;
use board_canvas::piece::Piece;
use board_canvas::shakmaty_rules::ShakmatyRules;
use board_canvas::surface::RecordingSurface;
use board_canvas::theme::ThemeRegistry;
use board_canvas::util::as_single_char;
use instant::Instant;
use itertools::Itertools;


pub const BOARD_SIZE_PX: u32 = 800;

#[macro_export]
macro_rules! drag_move {
    ($from:ident -> $to:ident) => {
        (board_canvas::coord::Coord::$from, board_canvas::coord::Coord::$to)
    };
}

pub struct TestBoard {
    pub view: BoardView<RecordingSurface>,
    pub events_rx: mpsc::Receiver<BoardEvent>,
    pub t0: Instant,
}

#[allow(dead_code)]
pub fn init_logging() { let _ = env_logger::builder().is_test(true).try_init(); }

#[allow(dead_code)]
pub fn default_board() -> TestBoard { board_with(BoardConfig::default(), None) }

#[allow(dead_code)]
pub fn board_with(config: BoardConfig, fen: Option<&str>) -> TestBoard {
    init_logging();
    let rules = match fen {
        Some(fen) => ShakmatyRules::from_fen(fen).unwrap(),
        None => ShakmatyRules::new(),
    };
    let (events_tx, events_rx) = mpsc::channel();
    let view = BoardView::new(
        Box::new(rules),
        config,
        Rc::new(ThemeRegistry::with_builtin_themes()),
        RecordingSurface::new(BOARD_SIZE_PX, BOARD_SIZE_PX),
        events_tx,
    )
    .unwrap();
    TestBoard { view, events_rx, t0: Instant::now() }
}

impl TestBoard {
    pub fn at(&self, ms: u64) -> Instant { self.t0 + Duration::from_millis(ms) }

    #[allow(dead_code)]
    pub fn drag(&mut self, (from, to): (Coord, Coord), ms: u64) {
        let now = self.at(ms);
        let start = self.view.point_from_square(from);
        let end = self.view.point_from_square(to);
        self.view.pointer_down(start, PointerButton::Primary, Modifiers::none(), now);
        self.view.pointer_move(end, now);
        self.view.pointer_up(end, PointerButton::Primary, Modifiers::none(), now);
    }

    #[allow(dead_code)]
    pub fn click(&mut self, square: Coord, ms: u64) {
        let now = self.at(ms);
        let point = self.view.point_from_square(square);
        self.view.pointer_down(point, PointerButton::Primary, Modifiers::none(), now);
        self.view.pointer_up(point, PointerButton::Primary, Modifiers::none(), now);
    }

    #[allow(dead_code)]
    pub fn chalk(&mut self, from: Coord, to: Coord, modifiers: Modifiers) {
        let now = self.t0;
        let start = self.view.point_from_square(from);
        let end = self.view.point_from_square(to);
        self.view.pointer_down(start, PointerButton::Secondary, modifiers, now);
        self.view.pointer_move(end, now);
        self.view.pointer_up(end, PointerButton::Secondary, modifiers, now);
    }

    // Ticks until the board stops asking for frames.
    #[allow(dead_code)]
    pub fn settle(&mut self, from_ms: u64) {
        let mut ms = from_ms;
        while self.view.tick(self.at(ms)) {
            ms += 50;
            assert!(ms < from_ms + 10_000, "board never settled");
        }
    }

    #[allow(dead_code)]
    pub fn events(&self) -> Vec<BoardEvent> { self.events_rx.try_iter().collect() }

    #[allow(dead_code)]
    pub fn piece_at(&self, coord: Coord) -> Option<Piece> { self.view.snapshot().piece_at(coord) }
}

// Builds a FEN from a board diagram, rank 8 first, '.' for empty squares.
#[allow(dead_code)]
pub fn diagram_fen(diagram: &str, turn: Force) -> String {
    let rows = diagram
        .split('\n')
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(|line| line.split_ascii_whitespace().collect_vec())
        .collect_vec();
    assert_eq!(rows.len(), 8);
    assert!(rows.iter().all(|row| row.len() == 8));
    let placement = rows
        .iter()
        .map(|row| {
            let mut out = String::new();
            let mut empty = 0;
            for square in row {
                let ch = as_single_char(square).unwrap();
                if ch == '.' {
                    empty += 1;
                    continue;
                }
                if empty > 0 {
                    out.push_str(&empty.to_string());
                    empty = 0;
                }
                out.push(ch);
            }
            if empty > 0 {
                out.push_str(&empty.to_string());
            }
            out
        })
        .join("/");
    format!("{placement} {} - - 0 1", turn.to_fen())
}


#[cfg(test)]
mod tests {
    use board_canvas::snapshot::STARTING_FEN;

    use super::*;

    #[test]
    fn diagram_fen_opening() {
        let fen = diagram_fen(
            "
            r n b q k b n r
            p p p p p p p p
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            P P P P P P P P
            R N B Q K B N R
        ",
            Force::White,
        );
        assert_eq!(fen, STARTING_FEN.replace("KQkq", "-"));
    }
}
