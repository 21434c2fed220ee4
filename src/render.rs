// The three rendering passes. Each pass owns one surface layer and redraws it from scratch.

use crate::animation::FramePiece;
use crate::config::DisplaySettings;
use crate::coord::{Coord, NUM_FILES, NUM_RANKS};
use crate::display::{
    from_display_coord, BoardGeometry, BoardOrientation, DisplayCoord, PixelPoint,
};
use crate::drawing::{DrawingManager, DrawingVisibility};
use crate::interaction::InteractionState;
use crate::piece::Piece;
use crate::snapshot::PositionSnapshot;
use crate::surface::{Color, DrawCommand, Layer, Surface, TextAlign};
use crate::theme::Theme;


pub const DRAG_SCALE: f64 = 1.1;

// Fractions of a square.
const LEGAL_DOT_RADIUS: f64 = 0.16;
const LEGAL_RING_RADIUS: f64 = 0.46;
const LEGAL_RING_WIDTH: f64 = 0.08;
const LABEL_FONT_SIZE: f64 = 0.18;
const LABEL_PADDING: f64 = 0.05;

const LAST_MOVE_OPACITY: f64 = 0.4;
const SELECTION_OPACITY: f64 = 0.5;
const LEGAL_MOVE_OPACITY: f64 = 0.6;
const HOVER_OPACITY: f64 = 0.3;

// The squares layer only depends on these, so it is redrawn only when one of them changes.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SquaresCacheKey {
    pub theme: Theme,
    pub orientation: BoardOrientation,
    pub size_px: (u32, u32),
}

pub struct RenderContext<'a> {
    pub snapshot: &'a PositionSnapshot,
    pub theme: &'a Theme,
    pub geometry: BoardGeometry,
    pub orientation: BoardOrientation,
    pub display: DisplaySettings,
    pub interaction: &'a InteractionState,
    pub drawing: &'a DrawingManager,
    pub last_move: Option<(Coord, Coord)>,
    // Set while an animation is running; replaces the snapshot in the pieces pass.
    pub frame: Option<&'a [FramePiece]>,
}

pub fn is_light_square(coord: Coord) -> bool {
    (coord.file.to_zero_based() + coord.rank.to_zero_based()) % 2 == 1
}

fn square_color(theme: &Theme, coord: Coord) -> Color {
    if is_light_square(coord) { theme.light_square } else { theme.dark_square }
}

impl RenderContext<'_> {
    fn fill_square<S: Surface + ?Sized>(
        &self, surface: &mut S, layer: Layer, coord: Coord, color: Color, opacity: f64,
    ) {
        surface.draw(layer, DrawCommand::FillRect {
            pivot: self.geometry.square_pivot(coord, self.orientation),
            width: self.geometry.square_width(),
            height: self.geometry.square_height(),
            color,
            opacity,
        });
    }

    fn draw_piece<S: Surface + ?Sized>(
        &self, surface: &mut S, piece: Piece, pivot: PixelPoint,
    ) {
        surface.draw(Layer::Pieces, DrawCommand::Piece {
            piece,
            pivot,
            size: self.geometry.square_size(),
        });
    }
}

pub fn render_squares<S: Surface + ?Sized>(surface: &mut S, ctx: &RenderContext) {
    surface.clear(Layer::Squares);
    for coord in Coord::all() {
        ctx.fill_square(surface, Layer::Squares, coord, square_color(ctx.theme, coord), 1.);
    }
}

pub fn render_pieces<S: Surface + ?Sized>(surface: &mut S, ctx: &RenderContext) {
    surface.clear(Layer::Pieces);
    let drag = ctx.interaction.drag();
    let drag_origin = drag.map(|d| d.from);
    match ctx.frame {
        Some(frame) => {
            for p in frame.iter().filter(|p| Some(p.to) != drag_origin) {
                ctx.draw_piece(surface, p.piece, p.pivot(&ctx.geometry, ctx.orientation));
            }
        }
        None => {
            for (coord, piece) in ctx.snapshot.grid().pieces() {
                if Some(coord) == drag_origin {
                    continue;
                }
                ctx.draw_piece(surface, piece, ctx.geometry.square_pivot(coord, ctx.orientation));
            }
        }
    }
    if let Some(drag) = drag {
        let size = ctx.geometry.square_size() * DRAG_SCALE;
        surface.draw(Layer::Pieces, DrawCommand::Piece {
            piece: drag.piece,
            pivot: drag.point + (-size / 2., -size / 2.),
            size,
        });
    }
}

pub fn render_overlay<S: Surface + ?Sized>(surface: &mut S, ctx: &RenderContext) {
    surface.clear(Layer::Overlay);
    let theme = ctx.theme;
    let display = ctx.display;

    if display.last_move {
        if let Some((from, to)) = ctx.last_move {
            for coord in [from, to] {
                ctx.fill_square(surface, Layer::Overlay, coord, theme.last_move, LAST_MOVE_OPACITY);
            }
        }
    }

    if let Some(selected) = ctx.interaction.selected() {
        let color =
            if ctx.interaction.selection_is_premove() { theme.premove } else { theme.selection };
        ctx.fill_square(surface, Layer::Overlay, selected, color, SELECTION_OPACITY);
    }

    if display.legal_moves {
        render_legal_destinations(surface, ctx);
    }

    let visibility = DrawingVisibility {
        arrows: display.arrows,
        highlights: display.highlights,
        premoves: display.premoves,
    };
    ctx.drawing.render(surface, visibility, theme.premove);

    if ctx.interaction.drag().is_some() {
        if let Some(hover) = ctx.interaction.hover() {
            ctx.fill_square(surface, Layer::Overlay, hover, theme.hover, HOVER_OPACITY);
        }
    }

    if display.square_names {
        render_square_names(surface, ctx);
    }
}

// Dots on empty squares, rings around capturable pieces.
fn render_legal_destinations<S: Surface + ?Sized>(surface: &mut S, ctx: &RenderContext) {
    let square = ctx.geometry.square_size();
    for mv in ctx.interaction.legal_destinations() {
        let center = ctx.geometry.square_center(mv.to, ctx.orientation);
        let command = if ctx.snapshot.piece_at(mv.to).is_some() {
            DrawCommand::StrokeCircle {
                center,
                radius: square * LEGAL_RING_RADIUS,
                line_width: square * LEGAL_RING_WIDTH,
                color: ctx.theme.legal_move,
                opacity: LEGAL_MOVE_OPACITY,
            }
        } else {
            DrawCommand::FillCircle {
                center,
                radius: square * LEGAL_DOT_RADIUS,
                color: ctx.theme.legal_move,
                opacity: LEGAL_MOVE_OPACITY,
            }
        };
        surface.draw(Layer::Overlay, command);
    }
}

// Files along the bottom edge, ranks along the left edge, in the color of the opposite square
// shade so they stay readable.
fn render_square_names<S: Surface + ?Sized>(surface: &mut S, ctx: &RenderContext) {
    let square = ctx.geometry.square_size();
    let padding = square * LABEL_PADDING;
    let font_size = square * LABEL_FONT_SIZE;
    let label_color = |coord: Coord| {
        if is_light_square(coord) { ctx.theme.dark_square } else { ctx.theme.light_square }
    };
    for x in 0..NUM_FILES {
        let Some(coord) = from_display_coord(DisplayCoord { x, y: NUM_RANKS - 1 }, ctx.orientation)
        else {
            continue;
        };
        let pivot = ctx.geometry.square_pivot(coord, ctx.orientation);
        surface.draw(Layer::Overlay, DrawCommand::Text {
            text: coord.file.to_algebraic().to_string(),
            anchor: pivot
                + (ctx.geometry.square_width() - padding, ctx.geometry.square_height() - padding),
            align: TextAlign::BottomRight,
            font_size,
            color: label_color(coord),
        });
    }
    for y in 0..NUM_RANKS {
        let Some(coord) = from_display_coord(DisplayCoord { x: 0, y }, ctx.orientation) else {
            continue;
        };
        let pivot = ctx.geometry.square_pivot(coord, ctx.orientation);
        surface.draw(Layer::Overlay, DrawCommand::Text {
            text: coord.rank.to_algebraic().to_string(),
            anchor: pivot + (padding, padding),
            align: TextAlign::TopLeft,
            font_size,
            color: label_color(coord),
        });
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::board_move::BoardMove;
    use crate::force::Force;
    use crate::interaction::DragPayload;
    use crate::piece::PieceKind;
    use crate::surface::RecordingSurface;
    use crate::theme::{ThemeRegistry, ThemeResolver, DEFAULT_THEME};

    struct Fixture {
        snapshot: PositionSnapshot,
        theme: Theme,
        interaction: InteractionState,
        drawing: DrawingManager,
        geometry: BoardGeometry,
    }

    impl Fixture {
        fn new() -> Self {
            let geometry = BoardGeometry::new(800., 800.);
            Fixture {
                snapshot: PositionSnapshot::starting(),
                theme: ThemeRegistry::with_builtin_themes().resolve(DEFAULT_THEME).unwrap(),
                interaction: InteractionState::new(),
                drawing: DrawingManager::new(geometry, BoardOrientation::Normal),
                geometry,
            }
        }

        fn ctx(&self, display: DisplaySettings) -> RenderContext<'_> {
            RenderContext {
                snapshot: &self.snapshot,
                theme: &self.theme,
                geometry: self.geometry,
                orientation: BoardOrientation::Normal,
                display,
                interaction: &self.interaction,
                drawing: &self.drawing,
                last_move: None,
                frame: None,
            }
        }
    }

    #[test]
    fn squares_alternate() {
        assert!(!is_light_square(Coord::A1));
        assert!(is_light_square(Coord::H1));
        assert!(!is_light_square(Coord::H8));
        let f = Fixture::new();
        let mut surface = RecordingSurface::new(800, 800);
        render_squares(&mut surface, &f.ctx(DisplaySettings::default()));
        assert_eq!(surface.commands(Layer::Squares).len(), 64);
    }

    #[test]
    fn dragged_piece_floats() {
        let mut f = Fixture::new();
        let pawn = Piece::new(Force::White, PieceKind::Pawn);
        f.interaction.set_drag(DragPayload {
            from: Coord::E2,
            piece: pawn,
            point: PixelPoint::new(430., 420.),
            premove: false,
        });
        let mut surface = RecordingSurface::new(800, 800);
        render_pieces(&mut surface, &f.ctx(DisplaySettings::default()));
        let pieces: Vec<_> = surface.pieces().collect();
        assert_eq!(pieces.len(), 32);
        // The origin square is empty; the floating pawn is drawn last, centered on the pointer.
        let e2_pivot = f.geometry.square_pivot(Coord::E2, BoardOrientation::Normal);
        assert!(pieces[..31].iter().all(|&(_, pivot, _)| pivot != e2_pivot));
        let (piece, pivot, size) = pieces[31];
        assert_eq!(piece, pawn);
        assert_eq!(size, 100. * DRAG_SCALE);
        assert_eq!(pivot, PixelPoint::new(430. - size / 2., 420. - size / 2.));
    }

    #[test]
    fn legal_dots_and_names_are_gated() {
        let mut f = Fixture::new();
        f.interaction.select(Coord::E2, vec![
            BoardMove::new(Coord::E2, Coord::E3),
            BoardMove::new(Coord::E2, Coord::E4),
        ], false);

        let mut surface = RecordingSurface::new(800, 800);
        let display = DisplaySettings { square_names: true, ..DisplaySettings::default() };
        render_overlay(&mut surface, &f.ctx(display));
        let commands = surface.commands(Layer::Overlay);
        let dots = commands.iter().filter(|c| matches!(c, DrawCommand::FillCircle { .. })).count();
        let labels = commands.iter().filter(|c| matches!(c, DrawCommand::Text { .. })).count();
        assert_eq!(dots, 2);
        assert_eq!(labels, 16);

        let mut surface = RecordingSurface::new(800, 800);
        let display = DisplaySettings { legal_moves: false, ..DisplaySettings::default() };
        render_overlay(&mut surface, &f.ctx(display));
        let commands = surface.commands(Layer::Overlay);
        assert!(!commands.iter().any(|c| matches!(c, DrawCommand::FillCircle { .. })));
        assert!(!commands.iter().any(|c| matches!(c, DrawCommand::Text { .. })));
    }
}
