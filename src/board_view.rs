// The interactive board: owns the position snapshot and every component drawn on top of it,
// turns pointer input into moves, premoves and annotations, and reports results to the host.
//
// All methods are meant to be called from the host's event loop. Methods that depend on time
// take `now` explicitly; the board never reads the clock itself.

use std::rc::Rc;
use std::sync::mpsc;

use instant::Instant;

use crate::animation::AnimationController;
use crate::board_move::{needs_promotion, BoardMove, Premove};
use crate::config::{BoardConfig, DisplaySettings, PremoveSettings};
use crate::coord::Coord;
use crate::display::{BoardGeometry, BoardOrientation, PixelPoint};
use crate::drawing::{ArrowSpec, DrawingManager, HighlightSpec, Modifiers};
use crate::error::BoardError;
use crate::event::BoardEvent;
use crate::force::Force;
use crate::interaction::{InteractionState, PendingDrag};
use crate::premove::{ClearSelector, PremoveExecution, PremoveManager};
use crate::render::{render_overlay, render_pieces, render_squares, RenderContext, SquaresCacheKey};
use crate::rules::{MoveOutcome, RulesEngine};
use crate::snapshot::PositionSnapshot;
use crate::surface::Surface;
use crate::theme::{Theme, ThemeResolver};


#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PointerButton {
    Primary,
    Secondary,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Key {
    Escape,
    Other,
}

pub struct BoardView<S: Surface> {
    rules: Box<dyn RulesEngine>,
    config: BoardConfig,
    themes: Rc<dyn ThemeResolver>,
    theme: Theme,
    surface: S,
    events_tx: mpsc::Sender<BoardEvent>,
    snapshot: Rc<PositionSnapshot>,
    geometry: BoardGeometry,
    interaction: InteractionState,
    drawing: DrawingManager,
    premoves: PremoveManager,
    animation: AnimationController,
    last_move: Option<(Coord, Coord)>,
    // A press on a destination of the selected piece. The move is made on release.
    pending_click_move: Option<Coord>,
    premove_deadline: Option<Instant>,
    squares_cache: Option<SquaresCacheKey>,
    // Latest time seen in a callback. Used by setters that have no `now` of their own.
    now: Instant,
}

fn decode_position(encoded: &str) -> Result<PositionSnapshot, BoardError> {
    PositionSnapshot::from_fen(encoded).map_err(BoardError::MalformedPosition)
}

fn geometry_of(surface: &impl Surface) -> BoardGeometry {
    let (width, height) = surface.pixel_size();
    BoardGeometry::new(f64::from(width), f64::from(height))
}

impl<S: Surface> BoardView<S> {
    pub fn new(
        rules: Box<dyn RulesEngine>, config: BoardConfig, themes: Rc<dyn ThemeResolver>, surface: S,
        events_tx: mpsc::Sender<BoardEvent>,
    ) -> Result<Self, BoardError> {
        config.validate()?;
        let theme = themes
            .resolve(&config.theme)
            .ok_or_else(|| BoardError::UnknownTheme(config.theme.clone()))?;
        let snapshot = decode_position(&rules.position())?;
        let geometry = geometry_of(&surface);
        let drawing = DrawingManager::new(geometry, config.orientation);
        let premoves = PremoveManager::new(config.premoves.clone(), snapshot.turn());
        let animation = AnimationController::new(config.animation_duration);
        let mut view = BoardView {
            rules,
            config,
            themes,
            theme,
            surface,
            events_tx,
            snapshot: Rc::new(snapshot),
            geometry,
            interaction: InteractionState::new(),
            drawing,
            premoves,
            animation,
            last_move: None,
            pending_click_move: None,
            premove_deadline: None,
            squares_cache: None,
            now: Instant::now(),
        };
        view.render();
        Ok(view)
    }

    pub fn snapshot(&self) -> Rc<PositionSnapshot> { Rc::clone(&self.snapshot) }
    pub fn position(&self) -> String { self.rules.position() }
    pub fn rules(&self) -> &dyn RulesEngine { self.rules.as_ref() }
    pub fn config(&self) -> &BoardConfig { &self.config }
    pub fn theme(&self) -> &Theme { &self.theme }
    pub fn display(&self) -> DisplaySettings { self.config.display }
    pub fn orientation(&self) -> BoardOrientation { self.config.orientation }
    pub fn surface(&self) -> &S { &self.surface }
    pub fn surface_mut(&mut self) -> &mut S { &mut self.surface }
    pub fn interaction(&self) -> &InteractionState { &self.interaction }
    pub fn drawing(&self) -> &DrawingManager { &self.drawing }
    pub fn premoves(&self) -> &PremoveManager { &self.premoves }
    pub fn last_move(&self) -> Option<(Coord, Coord)> { self.last_move }
    pub fn is_animating(&self) -> bool { self.animation.is_active() }
    pub fn sound_enabled(&self) -> bool { self.config.display.sound }

    pub fn square_from_point(&self, point: PixelPoint) -> Option<Coord> {
        self.geometry.square_at(point, self.config.orientation)
    }

    pub fn point_from_square(&self, square: Coord) -> PixelPoint {
        self.geometry.square_center(square, self.config.orientation)
    }

    // Replaces the position. Errors from the rules engine are returned as is and leave the
    // board untouched.
    pub fn set_position(
        &mut self, encoded: &str, immediate: bool, now: Instant,
    ) -> Result<(), BoardError> {
        self.now = now;
        self.rules.set_position(encoded)?;
        let new_position = self.rules.position();
        let old = Rc::clone(&self.snapshot);
        self.snapshot = Rc::new(decode_position(&new_position)?);
        self.last_move = None;
        self.pending_click_move = None;
        self.interaction.clear_all();
        self.send(BoardEvent::PositionUpdated { new_position });
        self.on_position_changed(old.turn(), now);
        if immediate {
            self.animation.cancel();
        } else {
            self.animation.start(&old, &self.snapshot, None, now);
        }
        self.render();
        Ok(())
    }

    pub fn pointer_down(
        &mut self, point: PixelPoint, button: PointerButton, modifiers: Modifiers, now: Instant,
    ) {
        self.now = now;
        let square = self.square_from_point(point);
        self.interaction.set_pointer(square);
        match button {
            PointerButton::Secondary => self.start_drawing(square, modifiers),
            PointerButton::Primary => self.press(square, point, now),
        }
        self.render();
    }

    pub fn pointer_move(&mut self, point: PixelPoint, now: Instant) {
        self.now = now;
        let square = self.square_from_point(point);
        self.interaction.set_pointer(square);
        if self.drawing.is_drawing() {
            if let Some(square) = square {
                self.drawing.update_gesture(square);
                self.render();
            }
            return;
        }
        if let Some(pending) = self.interaction.pending_drag().copied() {
            if pending.exceeds_threshold(
                point,
                now,
                self.config.drag_threshold_px,
                self.config.drag_threshold_time,
            ) {
                self.interaction.set_drag(pending.into_drag(point));
            }
        }
        if self.interaction.drag().is_some() {
            self.interaction.update_drag_point(point);
            self.interaction.set_hover(square);
            self.render();
        }
    }

    pub fn pointer_up(
        &mut self, point: PixelPoint, button: PointerButton, _modifiers: Modifiers, now: Instant,
    ) {
        self.now = now;
        let square = self.square_from_point(point);
        self.interaction.set_pointer(square);
        if button == PointerButton::Secondary {
            if self.drawing.is_drawing() {
                self.drawing.finish_gesture(square);
                self.render();
            }
            return;
        }

        // Released away from the pressed square: the click-move is dropped, the selection stays.
        if let Some(to) = self.pending_click_move.take() {
            if square != Some(to) {
                self.render();
                return;
            }
            if let Some(from) = self.interaction.selected() {
                let premove = self.interaction.selection_is_premove();
                self.commit(from, to, premove, now);
            }
            self.render();
            return;
        }

        self.interaction.take_pending_drag();
        if let Some(drag) = self.interaction.take_drag() {
            self.interaction.set_hover(None);
            match square {
                // Dropped back on the origin: the piece stays selected for a click-move.
                Some(to) if to == drag.from => {}
                Some(to) => self.commit(drag.from, to, drag.premove, now),
                None => self.interaction.clear_all(),
            }
        }
        self.render();
    }

    pub fn key_down(&mut self, key: Key) {
        if key == Key::Escape {
            self.interaction.clear_all();
            self.pending_click_move = None;
            self.drawing.abort_gesture();
            self.render();
        }
    }

    // Host frame callback. Returns whether the board wants another frame.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.now = now;
        let mut dirty = false;
        if self.animation.is_active() {
            // Either an intermediate frame or, once done, the final render from the snapshot.
            self.animation.finish_if_done(now);
            dirty = true;
        }
        dirty |= self.run_due_premove(now);
        if dirty {
            self.render();
        }
        self.animation.is_active() || self.premove_deadline.is_some()
    }

    pub fn resize(&mut self, css_width: f64, css_height: f64, device_pixel_ratio: f64) {
        let to_device = |css: f64| (css * device_pixel_ratio).round().max(0.) as u32;
        self.surface.resize(to_device(css_width), to_device(css_height));
        self.geometry = geometry_of(&self.surface);
        self.drawing.resize(self.geometry);
        self.squares_cache = None;
        self.render();
    }

    pub fn set_theme(&mut self, name: &str) -> Result<(), BoardError> {
        let theme =
            self.themes.resolve(name).ok_or_else(|| BoardError::UnknownTheme(name.to_owned()))?;
        self.config.theme = name.to_owned();
        self.theme = theme;
        self.render();
        Ok(())
    }

    pub fn set_orientation(&mut self, orientation: BoardOrientation) {
        self.config.orientation = orientation;
        self.drawing.set_orientation(orientation);
        self.render();
    }

    pub fn flip(&mut self) { self.set_orientation(self.config.orientation.flipped()); }

    pub fn set_arrows_visible(&mut self, visible: bool) {
        self.update_display(|d| d.arrows = visible);
    }
    pub fn set_highlights_visible(&mut self, visible: bool) {
        self.update_display(|d| d.highlights = visible);
    }
    pub fn set_square_names_visible(&mut self, visible: bool) {
        self.update_display(|d| d.square_names = visible);
    }
    pub fn set_premoves_visible(&mut self, visible: bool) {
        self.update_display(|d| d.premoves = visible);
    }
    pub fn set_legal_moves_visible(&mut self, visible: bool) {
        self.update_display(|d| d.legal_moves = visible);
    }
    pub fn set_last_move_visible(&mut self, visible: bool) {
        self.update_display(|d| d.last_move = visible);
    }
    pub fn set_sound_enabled(&mut self, enabled: bool) { self.config.display.sound = enabled; }

    pub fn add_arrow(&mut self, spec: ArrowSpec) -> Result<(), BoardError> {
        self.drawing.add_arrow(spec)?;
        self.render();
        Ok(())
    }
    pub fn remove_arrow(&mut self, from: Coord, to: Coord) -> bool {
        let removed = self.drawing.remove_arrow(from, to);
        self.render();
        removed
    }
    pub fn clear_arrows(&mut self) {
        self.drawing.clear_arrows();
        self.render();
    }

    pub fn add_highlight(&mut self, spec: HighlightSpec) -> Result<(), BoardError> {
        self.drawing.add_highlight(spec)?;
        self.render();
        Ok(())
    }
    pub fn remove_highlight(&mut self, square: Coord) -> bool {
        let removed = self.drawing.remove_highlight(square);
        self.render();
        removed
    }
    pub fn clear_highlights(&mut self) {
        self.drawing.clear_highlights();
        self.render();
    }

    // Queues a premove on behalf of the host. Returns false if premoves are off for the force.
    pub fn set_premove(&mut self, force: Force, premove: Premove) -> bool {
        let queued = self.premoves.queue(force, premove, &mut self.drawing);
        self.render();
        queued
    }
    pub fn clear_premoves(&mut self, selector: ClearSelector) {
        self.premoves.clear(selector, &mut self.drawing);
        self.render();
    }
    pub fn active_premove(&self) -> Option<(Force, Premove)> {
        self.premoves.determine_active_premove(None)
    }
    pub fn premove_settings(&self) -> &PremoveSettings { self.premoves.settings() }
    pub fn set_premoves_enabled(&mut self, enabled: bool) {
        self.premoves.set_enabled(enabled, &mut self.drawing);
        self.config.premoves = self.premoves.settings().clone();
        self.render();
    }
    pub fn set_multi_premove(&mut self, multi: bool) {
        self.premoves.set_multi(multi, &mut self.drawing);
        self.config.premoves = self.premoves.settings().clone();
        self.render();
    }
    pub fn set_premoves_enabled_for(&mut self, force: Force, enabled: bool) {
        self.premoves.set_force_enabled(force, enabled, &mut self.drawing);
        self.config.premoves = self.premoves.settings().clone();
        self.render();
    }

    pub fn export_drawing(&self) -> String { self.drawing.export_state() }

    pub fn import_drawing(&mut self, serialized: &str) -> Result<(), BoardError> {
        self.drawing.import_state(serialized)?;
        self.render();
        Ok(())
    }

    fn update_display(&mut self, update: impl FnOnce(&mut DisplaySettings)) {
        update(&mut self.config.display);
        self.render();
    }

    fn start_drawing(&mut self, square: Option<Coord>, modifiers: Modifiers) {
        let display = self.config.display;
        if !(display.arrows || display.highlights) {
            return;
        }
        let Some(square) = square else {
            return;
        };
        self.pending_click_move = None;
        self.interaction.clear_all();
        self.drawing.begin_gesture(square, modifiers);
    }

    fn press(&mut self, square: Option<Coord>, point: PixelPoint, now: Instant) {
        let Some(square) = square else {
            self.interaction.clear_all();
            return;
        };
        let turn = self.snapshot.turn();
        let piece = self.snapshot.piece_at(square);

        if let Some(selected) = self.interaction.selected() {
            let premove = self.interaction.selection_is_premove();
            let selected_force = self.snapshot.piece_at(selected).map(|p| p.force);
            let own_piece = piece.is_some_and(|p| Some(p.force) == selected_force);
            let click_move = if premove {
                !own_piece
            } else {
                self.interaction.is_legal_destination(square)
            };
            if square != selected && click_move {
                self.pending_click_move = Some(square);
                return;
            }
        }

        self.pending_click_move = None;
        match piece {
            Some(piece) if piece.force == turn => {
                let destinations = self.rules.legal_destinations_from(square);
                self.interaction.select(square, destinations, false);
                self.interaction.set_pending_drag(Some(PendingDrag {
                    square,
                    piece,
                    origin: point,
                    pressed_at: now,
                    premove: false,
                }));
            }
            Some(piece) if self.premoves.is_allowed(piece.force) => {
                self.interaction.select(square, vec![], true);
                self.interaction.set_pending_drag(Some(PendingDrag {
                    square,
                    piece,
                    origin: point,
                    pressed_at: now,
                    premove: true,
                }));
            }
            _ => self.interaction.clear_all(),
        }
    }

    // Makes a move (or queues a premove) chosen by the user. Interaction state is cleared
    // whatever the outcome.
    fn commit(&mut self, from: Coord, to: Coord, premove: bool, now: Instant) {
        let Some(piece) = self.snapshot.piece_at(from) else {
            self.interaction.clear_all();
            return;
        };
        let promotion = needs_promotion(piece, to).then_some(self.config.auto_promotion);
        if premove {
            let premove = Premove { from, to, promotion };
            if !self.premoves.queue(piece.force, premove, &mut self.drawing) {
                log::debug!("Premove {from}{to} ignored: premoves are off for {}", piece.force);
            }
            self.interaction.clear_all();
            return;
        }
        let mv = BoardMove::new(from, to).with_promotion(promotion);
        match self.rules.attempt_move(&mv) {
            MoveOutcome::Applied { new_position, applied_move } => {
                self.apply_move(new_position, applied_move, now);
            }
            MoveOutcome::Rejected { reason } => {
                self.interaction.clear_all();
                self.send(BoardEvent::IllegalMove { from, to, reason });
            }
        }
    }

    fn apply_move(&mut self, new_position: String, applied_move: BoardMove, now: Instant) {
        let new_snapshot = match decode_position(&new_position) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                log::error!(
                    "Cannot display position after {}{}: {err}",
                    applied_move.from,
                    applied_move.to
                );
                self.pending_click_move = None;
                self.interaction.clear_all();
                return;
            }
        };
        let old = std::mem::replace(&mut self.snapshot, Rc::new(new_snapshot));
        self.last_move = Some((applied_move.from, applied_move.to));
        self.pending_click_move = None;
        self.interaction.clear_all();
        self.animation.start(&old, &self.snapshot, Some(&applied_move), now);
        self.send(BoardEvent::Move {
            from: applied_move.from,
            to: applied_move.to,
            new_position,
        });
        self.on_position_changed(old.turn(), now);
    }

    fn on_position_changed(&mut self, old_turn: Force, now: Instant) {
        let turn = self.snapshot.turn();
        self.premoves.set_turn(turn);
        self.premoves.sync_visual(&mut self.drawing);
        if turn != old_turn {
            self.premove_deadline = Some(now + self.config.premove_delay);
        }
    }

    // Returns whether anything changed.
    fn run_due_premove(&mut self, now: Instant) -> bool {
        if !self.premove_deadline.is_some_and(|deadline| now >= deadline) {
            return false;
        }
        self.premove_deadline = None;
        let force = self.snapshot.turn();
        let rules = &mut self.rules;
        let execution = self.premoves.execute_next(force, |premove| {
            match rules.attempt_move(&premove.to_move()) {
                MoveOutcome::Applied { new_position, applied_move } => {
                    Some((new_position, applied_move))
                }
                MoveOutcome::Rejected { reason } => {
                    log::debug!("Dropping premove {}{}: {reason}", premove.from, premove.to);
                    None
                }
            }
        });
        match execution {
            PremoveExecution::Empty => false,
            PremoveExecution::Executed((new_position, applied_move)) => {
                self.apply_move(new_position, applied_move, now);
                true
            }
            PremoveExecution::Failed(_) => {
                self.premoves.discard_next(force);
                self.premoves.sync_visual(&mut self.drawing);
                true
            }
        }
    }

    fn send(&self, event: BoardEvent) {
        if let Err(err) = self.events_tx.send(event) {
            log::warn!("Board event lost: {err}");
        }
    }

    fn render(&mut self) {
        let frame = self.animation.frame(self.now);
        let ctx = RenderContext {
            snapshot: &self.snapshot,
            theme: &self.theme,
            geometry: self.geometry,
            orientation: self.config.orientation,
            display: self.config.display,
            interaction: &self.interaction,
            drawing: &self.drawing,
            last_move: self.last_move,
            frame: frame.as_deref(),
        };
        let cache_key = SquaresCacheKey {
            theme: self.theme.clone(),
            orientation: self.config.orientation,
            size_px: self.surface.pixel_size(),
        };
        if self.squares_cache.as_ref() != Some(&cache_key) {
            render_squares(&mut self.surface, &ctx);
            self.squares_cache = Some(cache_key);
        }
        render_pieces(&mut self.surface, &ctx);
        render_overlay(&mut self.surface, &ctx);
    }
}
