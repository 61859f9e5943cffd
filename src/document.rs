use std::path::{Path, PathBuf};

use bevy::prelude::*;

use crate::catalog::ObjectCatalog;
use crate::config::EditorConfig;
use crate::level::{Coordinate, Level};
use crate::persistence::{read_level_file, write_level_file};
use crate::sanity::{check_author, check_backgrounds, check_board, SanityLog, Severity};
use crate::solution::Solution;

#[derive(Resource)]
pub struct EditorDocument {
    pub level: Level,
    pub solution: Solution,
    pub file_name: Option<PathBuf>,
    board_changed: bool,
    /// The board was edited after the solution was last bound to it.
    changed_since_solution_edit: bool,
    saved_revision: u64,
}

impl Default for EditorDocument {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl EditorDocument {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            level: Level::new(),
            solution: Solution::new(config.history_size),
            file_name: None,
            board_changed: false,
            changed_since_solution_edit: false,
            saved_revision: 0,
        }
    }

    pub fn has_changed(&self) -> bool {
        self.board_changed || self.solution.revision() != self.saved_revision
    }

    pub fn has_changed_since_solution_edit(&self) -> bool {
        self.changed_since_solution_edit
    }

    pub fn set_field(&mut self, x: i32, y: i32, value: u8) {
        if self.level.get_field(x, y) == value {
            return;
        }
        self.level.set_field(x, y, value);
        self.board_changed = true;
        // steps that are still to be inferred follow the board anyway
        if self.solution.is_initialized() {
            self.changed_since_solution_edit = true;
        }
    }

    pub fn set_author(&mut self, author: impl Into<String>) {
        self.level.author = author.into();
        self.board_changed = true;
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.level.notes = notes;
        self.board_changed = true;
    }

    pub fn append_solution_coordinate(&mut self, cor: Coordinate) {
        self.solution.append_coordinate(cor);
        self.board_changed = true;
    }

    /// Bind the solution to the current board, inferring the steps if needed.
    pub fn init_solution(&mut self) -> Result<(), String> {
        self.solution.init(&self.level)?;
        self.changed_since_solution_edit = false;
        Ok(())
    }

    pub fn clear_solution(&mut self) {
        if !self.solution.is_empty() || self.solution.is_initialized() {
            self.board_changed = true;
        }
        self.solution.clear();
        self.changed_since_solution_edit = false;
    }

    pub fn open(
        &mut self,
        path: &Path,
        catalog: &ObjectCatalog,
        sink: &mut dyn FnMut(Severity, &str),
    ) -> Severity {
        let severity = read_level_file(path, catalog, &mut self.level, &mut self.solution, sink);
        self.file_name = Some(path.to_path_buf());
        self.board_changed = severity != Severity::None;
        self.changed_since_solution_edit = false;
        self.saved_revision = self.solution.revision();
        severity
    }

    pub fn save(&mut self, path: &Path) -> Result<(), String> {
        write_level_file(path, &self.level, &self.solution)?;
        self.file_name = Some(path.to_path_buf());
        self.board_changed = false;
        // the solution is still outdated if the board changed after it
        self.saved_revision = self.solution.revision();
        Ok(())
    }

    /// Warn when the stored solution cannot be trusted any more.
    pub fn sanity_check_solution_updated(&self, sink: &mut dyn FnMut(Severity, &str)) -> Severity {
        let mut log = SanityLog::new(sink);
        if self.solution.is_empty() {
            log.warning("no solution specified");
        } else if self.changed_since_solution_edit {
            log.warning("level has been changed since editing the solution");
        } else if self.solution.is_dirty {
            log.warning("solution has issues");
        }
        log.end()
    }

    /// Every check the editor runs before saving. Returns the worst severity.
    ///
    /// The solution is bound to the board for checking only, an outdated
    /// solution stays outdated.
    pub fn sanity_check_all(
        &mut self,
        config: &EditorConfig,
        sink: &mut dyn FnMut(Severity, &str),
    ) -> Severity {
        let catalog = &config.catalog;
        let mut worst = check_board(&self.level, catalog, sink);
        worst = worst.max(check_backgrounds(&self.level, sink));
        if config.check_author {
            worst = worst.max(check_author(&self.level, sink));
        }
        if !self.solution.is_empty() || self.solution.is_initialized() {
            match self.solution.init(&self.level) {
                Ok(()) => {
                    worst = worst.max(self.solution.sanity_check(&self.level, catalog, sink));
                }
                Err(e) => debug!("[Level] Solution not checked: {}", e),
            }
        }
        worst.max(self.sanity_check_solution_updated(sink))
    }
}
