// Premoves: moves queued by a side while it is not its turn.
//
// Queues are FIFO per force. A premove is never validated when queued; it is checked by the
// rules engine only when its force gets to move. A premove that turns out to be illegal is
// dropped without notice and never retried.

use std::collections::VecDeque;

use enum_map::EnumMap;
use strum::IntoEnumIterator;

use crate::board_move::Premove;
use crate::config::PremoveSettings;
use crate::drawing::DrawingManager;
use crate::force::Force;


#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ClearSelector {
    Force(Force),
    Both,
    List(Vec<Force>),
    // Same as `Both`.
    Unspecified,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PremoveExecution<T> {
    Empty,
    Executed(T),
    // The premove stays queued; the caller decides whether to drop it.
    Failed(Premove),
}

#[derive(Clone, Debug)]
pub struct PremoveManager {
    queues: EnumMap<Force, VecDeque<Premove>>,
    settings: PremoveSettings,
    turn: Force,
}

impl ClearSelector {
    fn forces(&self) -> Vec<Force> {
        match self {
            ClearSelector::Force(force) => vec![*force],
            ClearSelector::Both | ClearSelector::Unspecified => Force::iter().collect(),
            ClearSelector::List(forces) => forces.clone(),
        }
    }
}

impl PremoveManager {
    pub fn new(settings: PremoveSettings, turn: Force) -> Self {
        PremoveManager {
            queues: EnumMap::default(),
            settings,
            turn,
        }
    }

    pub fn settings(&self) -> &PremoveSettings { &self.settings }
    pub fn turn(&self) -> Force { self.turn }
    pub fn set_turn(&mut self, turn: Force) { self.turn = turn; }

    pub fn is_allowed(&self, force: Force) -> bool {
        self.settings.enabled && self.settings.colors[force]
    }

    pub fn queued(&self, force: Force) -> &VecDeque<Premove> { &self.queues[force] }
    pub fn next(&self, force: Force) -> Option<Premove> { self.queues[force].front().copied() }
    pub fn is_empty(&self) -> bool { self.queues.values().all(VecDeque::is_empty) }

    // Returns false if premoves are disabled for the force.
    pub fn queue(&mut self, force: Force, premove: Premove, visual: &mut DrawingManager) -> bool {
        if !self.is_allowed(force) {
            return false;
        }
        let queue = &mut self.queues[force];
        if !self.settings.multi {
            queue.clear();
        }
        queue.push_back(premove);
        self.sync_visual(visual);
        true
    }

    // Offers the front premove to `executor`, removing it from the queue only on success.
    pub fn execute_next<T>(
        &mut self, force: Force, executor: impl FnOnce(Premove) -> Option<T>,
    ) -> PremoveExecution<T> {
        if !self.is_allowed(force) {
            return PremoveExecution::Empty;
        }
        let Some(premove) = self.next(force) else {
            return PremoveExecution::Empty;
        };
        match executor(premove) {
            Some(result) => {
                self.queues[force].pop_front();
                PremoveExecution::Executed(result)
            }
            None => PremoveExecution::Failed(premove),
        }
    }

    pub fn discard_next(&mut self, force: Force) -> Option<Premove> {
        self.queues[force].pop_front()
    }

    // The premove shown on the board: the preferred force first, then the side waiting for
    // its turn, then the side to move.
    pub fn determine_active_premove(&self, preferred: Option<Force>) -> Option<(Force, Premove)> {
        preferred
            .into_iter()
            .chain([self.turn.opponent(), self.turn])
            .filter(|&force| self.is_allowed(force))
            .find_map(|force| self.next(force).map(|premove| (force, premove)))
    }

    pub fn clear(&mut self, selector: ClearSelector, visual: &mut DrawingManager) {
        for force in selector.forces() {
            self.queues[force].clear();
        }
        self.sync_visual(visual);
    }

    pub fn set_enabled(&mut self, enabled: bool, visual: &mut DrawingManager) {
        self.settings.enabled = enabled;
        if !enabled {
            for queue in self.queues.values_mut() {
                queue.clear();
            }
        }
        self.sync_visual(visual);
    }

    // Turning multi-queue off keeps only the earliest premove of each force.
    pub fn set_multi(&mut self, multi: bool, visual: &mut DrawingManager) {
        self.settings.multi = multi;
        if !multi {
            for queue in self.queues.values_mut() {
                queue.truncate(1);
            }
        }
        self.sync_visual(visual);
    }

    pub fn set_force_enabled(&mut self, force: Force, enabled: bool, visual: &mut DrawingManager) {
        self.settings.colors[force] = enabled;
        if !enabled {
            self.queues[force].clear();
        }
        self.sync_visual(visual);
    }

    pub fn sync_visual(&self, visual: &mut DrawingManager) {
        visual.set_premove(self.determine_active_premove(None).map(|(_, premove)| premove));
    }
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::coord::Coord;
    use crate::display::{BoardGeometry, BoardOrientation};

    fn visual() -> DrawingManager {
        DrawingManager::new(BoardGeometry::new(800., 800.), BoardOrientation::Normal)
    }

    fn manager(multi: bool) -> PremoveManager {
        let settings = PremoveSettings { multi, ..PremoveSettings::default() };
        PremoveManager::new(settings, Force::White)
    }

    #[test]
    fn single_entry_without_multi() {
        let mut v = visual();
        let mut m = manager(false);
        assert!(m.queue(Force::Black, Premove::new(Coord::E7, Coord::E5), &mut v));
        assert!(m.queue(Force::Black, Premove::new(Coord::D7, Coord::D5), &mut v));
        assert_eq!(m.queued(Force::Black).len(), 1);
        assert_eq!(m.next(Force::Black), Some(Premove::new(Coord::D7, Coord::D5)));
        assert_eq!(v.premove(), Some(Premove::new(Coord::D7, Coord::D5)));
    }

    #[test]
    fn fifo_with_multi() {
        let mut v = visual();
        let mut m = manager(true);
        m.queue(Force::Black, Premove::new(Coord::E7, Coord::E5), &mut v);
        m.queue(Force::Black, Premove::new(Coord::D7, Coord::D5), &mut v);
        assert_eq!(m.queued(Force::Black).len(), 2);
        assert_eq!(v.premove(), Some(Premove::new(Coord::E7, Coord::E5)));

        m.set_multi(false, &mut v);
        assert_eq!(m.queued(Force::Black).iter().copied().collect::<Vec<_>>(), vec![
            Premove::new(Coord::E7, Coord::E5)
        ]);
    }

    #[test]
    fn execute_dequeues_only_on_success() {
        let mut v = visual();
        let mut m = manager(true);
        m.queue(Force::Black, Premove::new(Coord::E7, Coord::E5), &mut v);
        m.queue(Force::Black, Premove::new(Coord::D7, Coord::D5), &mut v);

        let failed = m.execute_next(Force::Black, |_| None::<()>);
        assert_eq!(failed, PremoveExecution::Failed(Premove::new(Coord::E7, Coord::E5)));
        assert_eq!(m.queued(Force::Black).len(), 2);

        let executed = m.execute_next(Force::Black, |p| Some(p.to));
        assert_eq!(executed, PremoveExecution::Executed(Coord::E5));
        assert_eq!(m.queued(Force::Black).len(), 1);

        assert_eq!(m.discard_next(Force::Black), Some(Premove::new(Coord::D7, Coord::D5)));
        assert_eq!(m.execute_next(Force::Black, Some), PremoveExecution::Empty);
    }

    #[test]
    fn disabled_force() {
        let mut v = visual();
        let mut m = manager(false);
        m.queue(Force::Black, Premove::new(Coord::E7, Coord::E5), &mut v);
        m.set_force_enabled(Force::Black, false, &mut v);
        assert!(m.is_empty());
        assert_eq!(v.premove(), None);
        assert!(!m.queue(Force::Black, Premove::new(Coord::E7, Coord::E5), &mut v));

        m.set_force_enabled(Force::Black, true, &mut v);
        m.queue(Force::Black, Premove::new(Coord::E7, Coord::E5), &mut v);
        m.set_enabled(false, &mut v);
        assert!(m.is_empty());
    }

    #[test]
    fn active_premove_resolution() {
        let mut v = visual();
        let mut m = manager(false);
        let white = Premove::new(Coord::E2, Coord::E4);
        let black = Premove::new(Coord::E7, Coord::E5);
        m.queue(Force::White, white, &mut v);
        m.queue(Force::Black, black, &mut v);
        // White to move: black is the side waiting.
        assert_eq!(m.determine_active_premove(None), Some((Force::Black, black)));
        assert_eq!(m.determine_active_premove(Some(Force::White)), Some((Force::White, white)));
        m.set_turn(Force::Black);
        assert_eq!(m.determine_active_premove(None), Some((Force::White, white)));
    }

    #[test]
    fn clear_selectors() {
        let mut v = visual();
        let mut m = manager(false);
        let fill = |m: &mut PremoveManager, v: &mut DrawingManager| {
            m.queue(Force::White, Premove::new(Coord::E2, Coord::E4), v);
            m.queue(Force::Black, Premove::new(Coord::E7, Coord::E5), v);
        };

        fill(&mut m, &mut v);
        m.clear(ClearSelector::Force(Force::White), &mut v);
        assert!(m.queued(Force::White).is_empty());
        assert_eq!(m.queued(Force::Black).len(), 1);

        for selector in [
            ClearSelector::Both,
            ClearSelector::Unspecified,
            ClearSelector::List(vec![Force::White, Force::Black]),
        ] {
            fill(&mut m, &mut v);
            m.clear(selector, &mut v);
            assert!(m.is_empty());
            assert_eq!(v.premove(), None);
        }
    }
}
