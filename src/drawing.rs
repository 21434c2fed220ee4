// Arrows, square highlights and the visualized premove drawn over the board.
//
// The manager owns its state and knows nothing about the board that hosts it: the board feeds
// it gestures and squares and asks it to render. Nothing here calls back into the board.

use serde::{Deserialize, Serialize};
use strum::EnumIter;

use crate::board_move::Premove;
use crate::coord::Coord;
use crate::display::{
    mult_vec, normalize_vec, perpendicular_vec, BoardGeometry, BoardOrientation, PixelPoint,
};
use crate::error::BoardError;
use crate::surface::{Color, DrawCommand, Layer, Surface};


// Fractions of a square.
const ARROW_START_INSET: f64 = 0.25;
const ARROW_TIP_INSET: f64 = 0.1;
// Multiples of the line width.
const ARROW_HEAD_LENGTH: f64 = 2.2;
const ARROW_HEAD_HALF_WIDTH: f64 = 1.6;

const PREMOVE_ARROW_WIDTH: f64 = 0.14;
const PREMOVE_ARROW_OPACITY: f64 = 0.8;
const PREMOVE_SQUARE_OPACITY: f64 = 0.35;
const GESTURE_PREVIEW_OPACITY: f64 = 0.5;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, EnumIter, Serialize, Deserialize)]
pub enum ArrowBrush {
    Green,
    Red,
    Blue,
    Yellow,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, EnumIter, Serialize, Deserialize)]
pub enum HighlightKind {
    Green,
    Red,
    Blue,
    Yellow,
    Orange,
}

// Order in which a plain click walks through highlight kinds. One more click after the last
// kind removes the highlight.
pub const HIGHLIGHT_CYCLE: [HighlightKind; 5] = [
    HighlightKind::Green,
    HighlightKind::Red,
    HighlightKind::Blue,
    HighlightKind::Yellow,
    HighlightKind::Orange,
];

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct Arrow {
    pub from: Coord,
    pub to: Coord,
    pub brush: ArrowBrush,
    pub color: Color,
    // Line width as a fraction of the square size.
    pub width: f64,
    pub opacity: f64,
    // Derived from the endpoints, never read from the outside.
    #[serde(skip)]
    pub knight: bool,
}

// Arrow request. Unset style fields fall back to the brush defaults.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ArrowSpec {
    pub from: Coord,
    pub to: Coord,
    pub brush: ArrowBrush,
    pub color: Option<Color>,
    pub width: Option<f64>,
    pub opacity: Option<f64>,
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct Highlight {
    pub square: Coord,
    pub kind: HighlightKind,
    // Overrides the kind's palette color.
    #[serde(default)]
    pub color: Option<Color>,
    pub opacity: f64,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct HighlightSpec {
    pub square: Coord,
    pub kind: HighlightKind,
    pub color: Option<Color>,
    pub opacity: Option<f64>,
}

// Everything the manager persists. Exported and imported as JSON.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawingState {
    pub arrows: Vec<Arrow>,
    pub highlights: Vec<Highlight>,
    pub premove: Option<Premove>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Gesture {
    from: Coord,
    to: Coord,
    modifiers: Modifiers,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GestureOutcome {
    ArrowAdded,
    ArrowRemoved,
    HighlightChanged,
    Nothing,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DrawingVisibility {
    pub arrows: bool,
    pub highlights: bool,
    pub premoves: bool,
}

#[derive(Clone, Debug)]
pub struct DrawingManager {
    state: DrawingState,
    gesture: Option<Gesture>,
    geometry: BoardGeometry,
    orientation: BoardOrientation,
}

impl Modifiers {
    pub fn none() -> Self { Self::default() }
    pub fn shift() -> Self { Modifiers { shift: true, ..Self::default() } }
    pub fn ctrl() -> Self { Modifiers { ctrl: true, ..Self::default() } }
    pub fn alt() -> Self { Modifiers { alt: true, ..Self::default() } }
    pub fn is_empty(self) -> bool { self == Self::default() }
}

impl ArrowBrush {
    pub fn from_modifiers(modifiers: Modifiers) -> Self {
        if modifiers.shift {
            ArrowBrush::Red
        } else if modifiers.ctrl || modifiers.meta {
            ArrowBrush::Blue
        } else if modifiers.alt {
            ArrowBrush::Yellow
        } else {
            ArrowBrush::Green
        }
    }

    pub fn default_color(self) -> Color {
        match self {
            ArrowBrush::Green => Color::rgb(0x15, 0x78, 0x1b),
            ArrowBrush::Red => Color::rgb(0x88, 0x20, 0x20),
            ArrowBrush::Blue => Color::rgb(0x00, 0x30, 0x88),
            ArrowBrush::Yellow => Color::rgb(0xe6, 0x8f, 0x00),
        }
    }

    pub fn default_width(self) -> f64 {
        match self {
            ArrowBrush::Green | ArrowBrush::Red | ArrowBrush::Blue => 0.16,
            ArrowBrush::Yellow => 0.12,
        }
    }

    pub fn default_opacity(self) -> f64 {
        match self {
            ArrowBrush::Green | ArrowBrush::Red | ArrowBrush::Blue => 0.8,
            ArrowBrush::Yellow => 0.9,
        }
    }

    pub fn highlight_kind(self) -> HighlightKind {
        match self {
            ArrowBrush::Green => HighlightKind::Green,
            ArrowBrush::Red => HighlightKind::Red,
            ArrowBrush::Blue => HighlightKind::Blue,
            ArrowBrush::Yellow => HighlightKind::Yellow,
        }
    }
}

impl HighlightKind {
    pub fn default_color(self) -> Color {
        match self {
            HighlightKind::Green => Color::rgb(0x15, 0x78, 0x1b),
            HighlightKind::Red => Color::rgb(0x88, 0x20, 0x20),
            HighlightKind::Blue => Color::rgb(0x00, 0x30, 0x88),
            HighlightKind::Yellow => Color::rgb(0xe6, 0x8f, 0x00),
            HighlightKind::Orange => Color::rgb(0xd3, 0x54, 0x00),
        }
    }

    pub fn default_opacity(self) -> f64 {
        match self {
            HighlightKind::Yellow | HighlightKind::Orange => 0.6,
            _ => 0.5,
        }
    }

    // Kind that follows `self` when cycling, or `None` if the cycle is over.
    pub fn next_in_cycle(self) -> Option<HighlightKind> {
        let idx = HIGHLIGHT_CYCLE.iter().position(|&k| k == self)?;
        HIGHLIGHT_CYCLE.get(idx + 1).copied()
    }
}

impl Arrow {
    pub fn key(&self) -> (Coord, Coord) { (self.from, self.to) }
}

impl ArrowSpec {
    pub fn new(from: Coord, to: Coord, brush: ArrowBrush) -> Self {
        ArrowSpec {
            from,
            to,
            brush,
            color: None,
            width: None,
            opacity: None,
        }
    }

    pub fn from_endpoints(from: Coord, to: Coord) -> Self {
        Self::new(from, to, ArrowBrush::Green)
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    fn resolve(self) -> Result<Arrow, BoardError> {
        let arrow = Arrow {
            from: self.from,
            to: self.to,
            brush: self.brush,
            color: self.color.unwrap_or_else(|| self.brush.default_color()),
            width: self.width.unwrap_or_else(|| self.brush.default_width()),
            opacity: self.opacity.unwrap_or_else(|| self.brush.default_opacity()),
            knight: self.from.is_knight_jump(self.to),
        };
        validate_arrow(&arrow)?;
        Ok(arrow)
    }
}

impl Highlight {
    pub fn effective_color(&self) -> Color { self.color.unwrap_or_else(|| self.kind.default_color()) }
}

impl HighlightSpec {
    pub fn new(square: Coord, kind: HighlightKind) -> Self {
        HighlightSpec { square, kind, color: None, opacity: None }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    fn resolve(self) -> Result<Highlight, BoardError> {
        let highlight = Highlight {
            square: self.square,
            kind: self.kind,
            color: self.color,
            opacity: self.opacity.unwrap_or_else(|| self.kind.default_opacity()),
        };
        validate_highlight(&highlight)?;
        Ok(highlight)
    }
}

impl DrawingManager {
    pub fn new(geometry: BoardGeometry, orientation: BoardOrientation) -> Self {
        DrawingManager {
            state: DrawingState::default(),
            gesture: None,
            geometry,
            orientation,
        }
    }

    pub fn state(&self) -> &DrawingState { &self.state }
    pub fn arrows(&self) -> &[Arrow] { &self.state.arrows }
    pub fn highlights(&self) -> &[Highlight] { &self.state.highlights }
    pub fn highlight_at(&self, square: Coord) -> Option<&Highlight> {
        self.state.highlights.iter().find(|h| h.square == square)
    }
    pub fn arrow(&self, from: Coord, to: Coord) -> Option<&Arrow> {
        self.state.arrows.iter().find(|a| a.key() == (from, to))
    }
    pub fn premove(&self) -> Option<Premove> { self.state.premove }

    pub fn resize(&mut self, geometry: BoardGeometry) { self.geometry = geometry; }
    pub fn set_orientation(&mut self, orientation: BoardOrientation) {
        self.orientation = orientation;
    }

    pub fn square_at(&self, point: PixelPoint) -> Option<Coord> {
        self.geometry.square_at(point, self.orientation)
    }
    pub fn square_center(&self, square: Coord) -> PixelPoint {
        self.geometry.square_center(square, self.orientation)
    }

    // Inserts an arrow or restyles the existing arrow with the same endpoints in place.
    pub fn add_arrow(&mut self, spec: ArrowSpec) -> Result<(), BoardError> {
        let arrow = spec.resolve()?;
        match self.state.arrows.iter_mut().find(|a| a.key() == arrow.key()) {
            Some(existing) => *existing = arrow,
            None => self.state.arrows.push(arrow),
        }
        Ok(())
    }

    pub fn remove_arrow(&mut self, from: Coord, to: Coord) -> bool {
        let len_before = self.state.arrows.len();
        self.state.arrows.retain(|a| a.key() != (from, to));
        self.state.arrows.len() != len_before
    }

    pub fn add_highlight(&mut self, spec: HighlightSpec) -> Result<(), BoardError> {
        let highlight = spec.resolve()?;
        match self.state.highlights.iter_mut().find(|h| h.square == highlight.square) {
            Some(existing) => *existing = highlight,
            None => self.state.highlights.push(highlight),
        }
        Ok(())
    }

    pub fn remove_highlight(&mut self, square: Coord) -> bool {
        let len_before = self.state.highlights.len();
        self.state.highlights.retain(|h| h.square != square);
        self.state.highlights.len() != len_before
    }

    pub fn clear_arrows(&mut self) { self.state.arrows.clear(); }
    pub fn clear_highlights(&mut self) { self.state.highlights.clear(); }

    // Leaves the visualized premove alone: it belongs to the premove queue.
    pub fn clear_all(&mut self) {
        self.clear_arrows();
        self.clear_highlights();
        self.gesture = None;
    }

    // Returns the kind now shown on the square, if any.
    pub fn cycle_highlight(&mut self, square: Coord) -> Option<HighlightKind> {
        let next = match self.highlight_at(square) {
            None => Some(HIGHLIGHT_CYCLE[0]),
            Some(h) => h.kind.next_in_cycle(),
        };
        match next {
            Some(kind) => {
                self.upsert_highlight(Highlight {
                    square,
                    kind,
                    color: None,
                    opacity: kind.default_opacity(),
                });
            }
            None => {
                self.remove_highlight(square);
            }
        }
        next
    }

    pub fn set_premove(&mut self, premove: Option<Premove>) { self.state.premove = premove; }

    pub fn is_drawing(&self) -> bool { self.gesture.is_some() }

    pub fn begin_gesture(&mut self, square: Coord, modifiers: Modifiers) {
        self.gesture = Some(Gesture { from: square, to: square, modifiers });
    }

    pub fn update_gesture(&mut self, square: Coord) {
        if let Some(gesture) = &mut self.gesture {
            gesture.to = square;
        }
    }

    pub fn abort_gesture(&mut self) { self.gesture = None; }

    // Commits the gesture. A release on another square toggles an arrow, a release on the
    // press square changes the highlight there.
    pub fn finish_gesture(&mut self, square: Option<Coord>) -> GestureOutcome {
        let Some(gesture) = self.gesture.take() else {
            return GestureOutcome::Nothing;
        };
        let Some(to) = square else {
            return GestureOutcome::Nothing;
        };
        let brush = ArrowBrush::from_modifiers(gesture.modifiers);
        if to != gesture.from {
            if self
                .arrow(gesture.from, to)
                .is_some_and(|a| a.color == brush.default_color())
            {
                self.remove_arrow(gesture.from, to);
                return GestureOutcome::ArrowRemoved;
            }
            return match self.add_arrow(ArrowSpec::new(gesture.from, to, brush)) {
                Ok(()) => GestureOutcome::ArrowAdded,
                Err(err) => {
                    log::debug!("Arrow gesture rejected: {err}");
                    GestureOutcome::Nothing
                }
            };
        }
        if gesture.modifiers.is_empty() {
            self.cycle_highlight(to);
        } else {
            let kind = brush.highlight_kind();
            if self.highlight_at(to).is_some_and(|h| h.kind == kind) {
                self.remove_highlight(to);
            } else {
                self.upsert_highlight(Highlight {
                    square: to,
                    kind,
                    color: None,
                    opacity: kind.default_opacity(),
                });
            }
        }
        GestureOutcome::HighlightChanged
    }

    pub fn export_state(&self) -> String {
        // Serializing plain data with string keys cannot fail.
        serde_json::to_string(&self.state).unwrap_or_default()
    }

    // All-or-nothing: on any problem the current state is kept.
    pub fn import_state(&mut self, serialized: &str) -> Result<(), BoardError> {
        match parse_state(serialized) {
            Ok(state) => {
                self.state = state;
                self.gesture = None;
                Ok(())
            }
            Err(err) => {
                log::warn!("Ignoring drawing state: {err}");
                Err(err)
            }
        }
    }

    pub fn render_highlights<S: Surface + ?Sized>(&self, surface: &mut S) {
        let size = (self.geometry.square_width(), self.geometry.square_height());
        for h in &self.state.highlights {
            surface.draw(Layer::Overlay, DrawCommand::FillRect {
                pivot: self.geometry.square_pivot(h.square, self.orientation),
                width: size.0,
                height: size.1,
                color: h.effective_color(),
                opacity: h.opacity,
            });
        }
    }

    // Committed arrows followed by the preview of the gesture in progress.
    pub fn render_arrows<S: Surface + ?Sized>(&self, surface: &mut S) {
        for arrow in &self.state.arrows {
            self.draw_arrow(surface, arrow.from, arrow.to, arrow.color, arrow.width, arrow.opacity);
        }
        if let Some(gesture) = self.gesture.filter(|g| g.from != g.to) {
            let brush = ArrowBrush::from_modifiers(gesture.modifiers);
            self.draw_arrow(
                surface,
                gesture.from,
                gesture.to,
                brush.default_color(),
                brush.default_width(),
                GESTURE_PREVIEW_OPACITY,
            );
        }
    }

    pub fn render_premove<S: Surface + ?Sized>(&self, surface: &mut S, color: Color) {
        let Some(premove) = self.state.premove else {
            return;
        };
        for square in [premove.from, premove.to] {
            surface.draw(Layer::Overlay, DrawCommand::FillRect {
                pivot: self.geometry.square_pivot(square, self.orientation),
                width: self.geometry.square_width(),
                height: self.geometry.square_height(),
                color,
                opacity: PREMOVE_SQUARE_OPACITY,
            });
        }
        if premove.from != premove.to {
            self.draw_arrow(
                surface,
                premove.from,
                premove.to,
                color,
                PREMOVE_ARROW_WIDTH,
                PREMOVE_ARROW_OPACITY,
            );
        }
    }

    pub fn render<S: Surface + ?Sized>(
        &self, surface: &mut S, visibility: DrawingVisibility, premove_color: Color,
    ) {
        if visibility.highlights {
            self.render_highlights(surface);
        }
        if visibility.arrows {
            self.render_arrows(surface);
        }
        if visibility.premoves {
            self.render_premove(surface, premove_color);
        }
    }

    // Shaft as a polyline ending at the head base, plus the head as a triangle. Knight arrows
    // bend once: along the longer axis first, then along the shorter one.
    pub fn arrow_outline(
        &self, from: Coord, to: Coord, width: f64,
    ) -> (Vec<PixelPoint>, [PixelPoint; 3]) {
        let square = self.geometry.square_size();
        let line_width = width * square;
        let start_center = self.square_center(from);
        let end_center = self.square_center(to);
        let corner = from.is_knight_jump(to).then(|| {
            let (df, dr) = from.distance_components(to);
            let corner_square = if dr > df {
                Coord::new(to.rank, from.file)
            } else {
                Coord::new(from.rank, to.file)
            };
            self.square_center(corner_square)
        });
        let first_target = corner.unwrap_or(end_center);
        let last_origin = corner.unwrap_or(start_center);
        let start_dir = normalize_vec(first_target - start_center);
        let end_dir = normalize_vec(end_center - last_origin);

        let start = start_center + mult_vec(start_dir, square * ARROW_START_INSET);
        let tip = end_center + mult_vec(end_dir, -square * ARROW_TIP_INSET);
        let head_base = tip + mult_vec(end_dir, -line_width * ARROW_HEAD_LENGTH);
        let side = mult_vec(perpendicular_vec(end_dir), line_width * ARROW_HEAD_HALF_WIDTH);

        let mut shaft = vec![start];
        shaft.extend(corner);
        shaft.push(head_base);
        let head = [tip, head_base + side, head_base + mult_vec(side, -1.)];
        (shaft, head)
    }

    fn upsert_highlight(&mut self, highlight: Highlight) {
        match self.state.highlights.iter_mut().find(|h| h.square == highlight.square) {
            Some(existing) => *existing = highlight,
            None => self.state.highlights.push(highlight),
        }
    }

    fn draw_arrow<S: Surface + ?Sized>(
        &self, surface: &mut S, from: Coord, to: Coord, color: Color, width: f64, opacity: f64,
    ) {
        let (shaft, head) = self.arrow_outline(from, to, width);
        surface.draw(Layer::Overlay, DrawCommand::Polyline {
            points: shaft,
            line_width: width * self.geometry.square_size(),
            color,
            opacity,
        });
        surface.draw(Layer::Overlay, DrawCommand::Polygon { points: head.to_vec(), color, opacity });
    }
}

fn validate_opacity(opacity: f64) -> Result<(), BoardError> {
    if (0. ..=1.).contains(&opacity) {
        Ok(())
    } else {
        Err(BoardError::MalformedDrawing(format!("opacity out of range: {opacity}")))
    }
}

fn validate_arrow(arrow: &Arrow) -> Result<(), BoardError> {
    if arrow.from == arrow.to {
        return Err(BoardError::MalformedDrawing(format!("degenerate arrow at {}", arrow.from)));
    }
    if !arrow.width.is_finite() || arrow.width <= 0. {
        return Err(BoardError::MalformedDrawing(format!("bad arrow width: {}", arrow.width)));
    }
    validate_opacity(arrow.opacity)
}

fn validate_highlight(highlight: &Highlight) -> Result<(), BoardError> {
    validate_opacity(highlight.opacity)
}

fn parse_state(serialized: &str) -> Result<DrawingState, BoardError> {
    let mut state: DrawingState = serde_json::from_str(serialized)
        .map_err(|err| BoardError::MalformedDrawing(err.to_string()))?;
    for (idx, arrow) in state.arrows.iter().enumerate() {
        validate_arrow(arrow)?;
        if state.arrows[..idx].iter().any(|a| a.key() == arrow.key()) {
            return Err(BoardError::MalformedDrawing(format!(
                "duplicate arrow {}{}",
                arrow.from, arrow.to
            )));
        }
    }
    for arrow in &mut state.arrows {
        arrow.knight = arrow.from.is_knight_jump(arrow.to);
    }
    for (idx, highlight) in state.highlights.iter().enumerate() {
        validate_highlight(highlight)?;
        if state.highlights[..idx].iter().any(|h| h.square == highlight.square) {
            return Err(BoardError::MalformedDrawing(format!(
                "duplicate highlight on {}",
                highlight.square
            )));
        }
    }
    if let Some(premove) = state.premove {
        if premove.from == premove.to {
            return Err(BoardError::MalformedDrawing(format!(
                "degenerate premove at {}",
                premove.from
            )));
        }
    }
    Ok(state)
}
