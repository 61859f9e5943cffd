use bevy::prelude::*;

use crate::catalog::{ObjectCatalog, OBJ_HELIUM, OBJ_PIPE, OBJ_START};
use crate::history::{Field, History, MergePolicy};
use crate::inference::{infer_steps, JumpOptions};
use crate::jump::Jump;
use crate::level::{Coordinate, LevelFacts};
use crate::projection::{
    board_coordinates, is_flipped_per_step, logical_coordinates, view_coordinates,
    ViewCoordinates,
};
use crate::sanity::{check_solution, Severity};

pub const DEFAULT_HISTORY_SIZE: usize = 30;

type Listener = Box<dyn Fn() + Send + Sync>;

/// Everything undo and redo bring back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SolutionState {
    pub coordinates: Vec<Coordinate>,
    pub steps: Vec<Jump>,
    /// Sits between steps of `steps`, uncounted jumps included.
    pub cursor_main: usize,
    pub cursor_secondary: usize,
}

fn solution_history(max_frames: usize) -> History<SolutionState> {
    History::new(
        vec![
            Field::new(
                "coordinates",
                MergePolicy::Independent,
                |s: &SolutionState| &s.coordinates,
                |s, v| s.coordinates = v,
            ),
            Field::new(
                "steps",
                MergePolicy::Independent,
                |s: &SolutionState| &s.steps,
                |s, v| s.steps = v,
            ),
            Field::new(
                "cursor_main",
                MergePolicy::MergeIntoPrevious,
                |s: &SolutionState| &s.cursor_main,
                |s, v| s.cursor_main = v,
            ),
            Field::new(
                "cursor_secondary",
                MergePolicy::MergeIntoPrevious,
                |s: &SolutionState| &s.cursor_secondary,
                |s, v| s.cursor_secondary = v,
            ),
        ],
        max_frames,
    )
    // a merged cursor may point past the steps of an older frame
    .with_on_load(|s: &mut SolutionState| {
        s.cursor_main = s.cursor_main.min(s.steps.len());
        s.cursor_secondary = s.cursor_secondary.min(s.steps.len());
    })
}

pub struct Solution {
    state: SolutionState,
    history: History<SolutionState>,
    start: Option<Coordinate>,
    existing_pipes: usize,
    existing_helium: usize,
    initialized: bool,
    /// Set by the last sanity check when it reported anything.
    pub is_dirty: bool,
    revision: u64,
    on_cursor_change: Vec<Listener>,
    on_steps_change: Vec<Listener>,
}

impl Default for Solution {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}

impl Solution {
    pub fn new(history_size: usize) -> Self {
        Self {
            state: SolutionState::default(),
            history: solution_history(history_size),
            start: None,
            existing_pipes: 0,
            existing_helium: 0,
            initialized: false,
            is_dirty: false,
            revision: 0,
            on_cursor_change: Vec::new(),
            on_steps_change: Vec::new(),
        }
    }

    /// Forget coordinates, steps and history. Listeners stay registered.
    pub fn clear(&mut self) {
        self.history.clear();
        self.state = SolutionState::default();
        self.start = None;
        self.initialized = false;
        self.is_dirty = false;
    }

    /// Infers the steps on first use, afterwards only recomputes the coordinates.
    pub fn init(&mut self, level: &impl LevelFacts) -> Result<(), String> {
        let starts = level.count(OBJ_START);
        if starts != 1 {
            return Err(format!(
                "solution needs exactly one start field, level has {}",
                starts
            ));
        }
        let start = level
            .find(OBJ_START)
            .ok_or_else(|| "start field not found".to_string())?;
        self.start = Some(start);
        self.existing_pipes = level.count(OBJ_PIPE);
        self.existing_helium = level.count(OBJ_HELIUM);

        if !self.initialized {
            let options = JumpOptions {
                has_pipes: self.existing_pipes > 0,
                has_helium: self.existing_helium > 0,
            };
            self.state.steps = infer_steps(&self.state.coordinates, start, options, level);
            self.initialized = true;
            info!(
                "[Solution] Inferred {} steps from {} coordinates",
                self.state.steps.len(),
                self.state.coordinates.len()
            );
        }
        self.update_coordinates();
        self.clamp_cursor();

        if self.history.is_empty() {
            self.history.make_backup(&self.state);
        }
        Ok(())
    }

    pub fn add_on_cursor_change_listener(&mut self, listener: impl Fn() + Send + Sync + 'static) {
        self.on_cursor_change.push(Box::new(listener));
    }

    pub fn add_on_steps_change_listener(&mut self, listener: impl Fn() + Send + Sync + 'static) {
        self.on_steps_change.push(Box::new(listener));
    }

    fn notify_cursor_changed(&self) {
        for listener in &self.on_cursor_change {
            listener();
        }
    }

    pub fn notify_steps_changed(&self) {
        for listener in &self.on_steps_change {
            listener();
        }
    }

    fn on_steps_changed(&mut self) {
        self.update_coordinates();
        self.history.make_backup(&self.state);
        self.revision += 1;
        self.notify_steps_changed();
    }

    // ---------- cursor ----------

    fn cursor_max(&self) -> usize {
        self.state.steps.len()
    }

    pub fn cursor_range(&self) -> (usize, usize) {
        let (a, b) = (self.state.cursor_main, self.state.cursor_secondary);
        (a.min(b), a.max(b))
    }

    fn clamp_cursor(&mut self) {
        let max = self.cursor_max();
        self.state.cursor_main = self.state.cursor_main.min(max);
        self.state.cursor_secondary = self.state.cursor_secondary.min(max);
    }

    pub fn cursor_no_range(&mut self) -> bool {
        if self.state.cursor_secondary == self.state.cursor_main {
            return false;
        }
        self.state.cursor_secondary = self.state.cursor_main;
        self.notify_cursor_changed();
        true
    }

    pub fn move_cursor_to(&mut self, i: usize) -> bool {
        if i > self.cursor_max() {
            return false;
        }
        self.state.cursor_main = i;
        self.state.cursor_secondary = i;
        self.notify_cursor_changed();
        true
    }

    /// Moves both ends, keeping the size of a selected range.
    pub fn move_cursor_up(&mut self) -> bool {
        let (lo, _) = self.cursor_range();
        if lo == 0 {
            return false;
        }
        self.state.cursor_main -= 1;
        self.state.cursor_secondary -= 1;
        self.notify_cursor_changed();
        true
    }

    pub fn move_cursor_down(&mut self) -> bool {
        let (_, hi) = self.cursor_range();
        if hi >= self.cursor_max() {
            return false;
        }
        self.state.cursor_main += 1;
        self.state.cursor_secondary += 1;
        self.notify_cursor_changed();
        true
    }

    pub fn move_cursor_to_top(&mut self) -> bool {
        let (lo, _) = self.cursor_range();
        if lo == 0 {
            return false;
        }
        self.state.cursor_main -= lo;
        self.state.cursor_secondary -= lo;
        self.notify_cursor_changed();
        true
    }

    pub fn move_cursor_to_bottom(&mut self) -> bool {
        let (_, hi) = self.cursor_range();
        let dy = self.cursor_max() - hi;
        if dy == 0 {
            return false;
        }
        self.state.cursor_main += dy;
        self.state.cursor_secondary += dy;
        self.notify_cursor_changed();
        true
    }

    /// Moves only the main end, growing or shrinking the selection.
    pub fn expand_cursor_to(&mut self, i: usize) -> bool {
        if i > self.cursor_max() {
            return false;
        }
        self.state.cursor_main = i;
        self.notify_cursor_changed();
        true
    }

    pub fn expand_cursor_up(&mut self) -> bool {
        if self.state.cursor_main == 0 {
            return false;
        }
        self.state.cursor_main -= 1;
        self.notify_cursor_changed();
        true
    }

    pub fn expand_cursor_down(&mut self) -> bool {
        if self.state.cursor_main >= self.cursor_max() {
            return false;
        }
        self.state.cursor_main += 1;
        self.notify_cursor_changed();
        true
    }

    pub fn expand_cursor_to_top(&mut self) -> bool {
        if self.state.cursor_main == 0 {
            return false;
        }
        self.state.cursor_main = 0;
        self.notify_cursor_changed();
        true
    }

    pub fn expand_cursor_to_bottom(&mut self) -> bool {
        let max = self.cursor_max();
        if self.state.cursor_main == max {
            return false;
        }
        self.state.cursor_main = max;
        self.notify_cursor_changed();
        true
    }

    // ---------- steps ----------

    /// Overwrite every step of a selected range with `step`, or insert it at
    /// the cursor and move the cursor behind it.
    pub fn insert_step(&mut self, step: Jump) -> bool {
        if !self.initialized {
            return false;
        }
        let (lo, hi) = self.cursor_range();
        if lo != hi {
            self.state.steps[lo..hi].fill(step);
        } else {
            self.state.steps.insert(lo, step);
            self.state.cursor_main += 1;
            self.state.cursor_secondary += 1;
        }
        self.on_steps_changed();
        true
    }

    /// Like backspace: removes the selection or the step before the cursor.
    pub fn delete_step_above(&mut self) -> bool {
        if self.state.cursor_main != self.state.cursor_secondary {
            return self.delete_selected_range();
        }
        if self.state.cursor_main == 0 {
            return false;
        }
        self.state.cursor_main -= 1;
        self.state.cursor_secondary -= 1;
        self.state.steps.remove(self.state.cursor_main);
        self.on_steps_changed();
        true
    }

    /// Like delete: removes the selection or the step after the cursor.
    pub fn delete_step_below(&mut self) -> bool {
        if self.state.cursor_main != self.state.cursor_secondary {
            return self.delete_selected_range();
        }
        if self.state.cursor_main >= self.cursor_max() {
            return false;
        }
        self.state.steps.remove(self.state.cursor_main);
        self.on_steps_changed();
        true
    }

    fn delete_selected_range(&mut self) -> bool {
        let (lo, hi) = self.cursor_range();
        self.state.steps.drain(lo..hi);
        self.state.cursor_main = lo;
        self.state.cursor_secondary = lo;
        self.on_steps_changed();
        true
    }

    pub fn undo(&mut self) -> bool {
        if !self.history.undo(&mut self.state) {
            return false;
        }
        self.after_undo_or_redo();
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.history.redo(&mut self.state) {
            return false;
        }
        self.after_undo_or_redo();
        true
    }

    fn after_undo_or_redo(&mut self) {
        self.revision += 1;
        self.notify_steps_changed();
        self.notify_cursor_changed();
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn append_coordinate(&mut self, cor: Coordinate) {
        self.state.coordinates.push(cor);
    }

    /// Take `steps` as they are, e.g. when read from a level file. The
    /// coordinates follow on the next [`Solution::init`].
    pub fn set_steps(&mut self, steps: Vec<Jump>) {
        self.history.clear();
        self.state.steps = steps;
        self.state.cursor_main = 0;
        self.state.cursor_secondary = 0;
        self.initialized = true;
        self.update_coordinates();
    }

    fn update_coordinates(&mut self) {
        if let Some(start) = self.start {
            self.state.coordinates = logical_coordinates(&self.state.steps, start);
        }
    }

    // ---------- getters ----------

    /// Number of counted steps.
    pub fn len(&self) -> usize {
        self.state.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.coordinates.is_empty()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn start(&self) -> Option<Coordinate> {
        self.start
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.state.coordinates
    }

    pub fn steps(&self) -> &[Jump] {
        &self.state.steps
    }

    pub fn state(&self) -> &SolutionState {
        &self.state
    }

    pub fn cursor_main(&self) -> usize {
        self.state.cursor_main
    }

    pub fn cursor_secondary(&self) -> usize {
        self.state.cursor_secondary
    }

    pub fn number_existing_pipes(&self) -> usize {
        self.existing_pipes
    }

    pub fn number_existing_helium(&self) -> usize {
        self.existing_helium
    }

    /// Increases with every change of the steps, undo and redo included.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_flipped(&self) -> bool {
        let end = self.state.cursor_main.min(self.state.steps.len());
        self.state.steps[..end].iter().filter(|s| s.is_pipe()).count() % 2 == 1
    }

    pub fn board_coordinates(&self) -> Vec<Coordinate> {
        match self.start {
            Some(start) => board_coordinates(&self.state.steps, start, self.state.cursor_main),
            None => Vec::new(),
        }
    }

    /// `None` until the solution has been bound to a level.
    pub fn view_coordinates<'a, L: LevelFacts>(
        &'a self,
        level: &'a L,
    ) -> Option<ViewCoordinates<'a, L>> {
        let start = self.start?;
        Some(view_coordinates(&self.state.steps, start, level))
    }

    pub fn is_flipped_per_step(&self) -> impl Iterator<Item = bool> + '_ {
        is_flipped_per_step(&self.state.steps)
    }

    pub fn sanity_check(
        &mut self,
        level: &impl LevelFacts,
        catalog: &ObjectCatalog,
        sink: &mut dyn FnMut(Severity, &str),
    ) -> Severity {
        let worst = check_solution(self, level, catalog, sink);
        self.is_dirty = worst != Severity::None;
        worst
    }
}
