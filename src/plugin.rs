use bevy::prelude::*;

use crate::config::{load_editor_config, EditorConfig};
use crate::document::EditorDocument;
use crate::jump::Jump;

/// An edit of the solution requested by the editor front end.
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolutionCommand {
    AppendCoordinate { x: i32, y: i32 },
    /// Infer the steps, or recompute the coordinates if they are known.
    Init,
    Clear,
    MoveCursorTo(usize),
    MoveCursorUp,
    MoveCursorDown,
    MoveCursorToTop,
    MoveCursorToBottom,
    ExpandCursorTo(usize),
    ExpandCursorUp,
    ExpandCursorDown,
    ExpandCursorToTop,
    ExpandCursorToBottom,
    CursorNoRange,
    InsertStep(Jump),
    DeleteStepAbove,
    DeleteStepBelow,
    Undo,
    Redo,
}

/// Sent once for every command that changed something.
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolutionChanged {
    /// False when only the cursor moved.
    pub steps_changed: bool,
}

pub fn apply_command(
    document: &mut EditorDocument,
    command: SolutionCommand,
) -> Result<bool, String> {
    let applied = match command {
        SolutionCommand::AppendCoordinate { x, y } => {
            document.append_solution_coordinate((x, y));
            true
        }
        SolutionCommand::Init => {
            document.init_solution()?;
            true
        }
        SolutionCommand::Clear => {
            document.clear_solution();
            true
        }
        SolutionCommand::MoveCursorTo(i) => document.solution.move_cursor_to(i),
        SolutionCommand::MoveCursorUp => document.solution.move_cursor_up(),
        SolutionCommand::MoveCursorDown => document.solution.move_cursor_down(),
        SolutionCommand::MoveCursorToTop => document.solution.move_cursor_to_top(),
        SolutionCommand::MoveCursorToBottom => document.solution.move_cursor_to_bottom(),
        SolutionCommand::ExpandCursorTo(i) => document.solution.expand_cursor_to(i),
        SolutionCommand::ExpandCursorUp => document.solution.expand_cursor_up(),
        SolutionCommand::ExpandCursorDown => document.solution.expand_cursor_down(),
        SolutionCommand::ExpandCursorToTop => document.solution.expand_cursor_to_top(),
        SolutionCommand::ExpandCursorToBottom => document.solution.expand_cursor_to_bottom(),
        SolutionCommand::CursorNoRange => document.solution.cursor_no_range(),
        SolutionCommand::InsertStep(step) => document.solution.insert_step(step),
        SolutionCommand::DeleteStepAbove => document.solution.delete_step_above(),
        SolutionCommand::DeleteStepBelow => document.solution.delete_step_below(),
        SolutionCommand::Undo => document.solution.undo(),
        SolutionCommand::Redo => document.solution.redo(),
    };
    Ok(applied)
}

pub fn apply_solution_commands(
    mut commands: EventReader<SolutionCommand>,
    mut document: ResMut<EditorDocument>,
    mut changed: EventWriter<SolutionChanged>,
) {
    for &command in commands.read() {
        let revision = document.solution.revision();
        match apply_command(&mut document, command) {
            Ok(true) => {
                let steps_changed = document.solution.revision() != revision
                    || matches!(command, SolutionCommand::Init | SolutionCommand::Clear);
                changed.send(SolutionChanged { steps_changed });
            }
            Ok(false) => debug!("[Solution] {:?} had no effect", command),
            Err(e) => warn!("[Solution] {:?} failed: {}", command, e),
        }
    }
}

#[derive(Default)]
pub struct SolutionEditorPlugin {
    /// Read from the config file when not given.
    pub config: Option<EditorConfig>,
}

impl SolutionEditorPlugin {
    pub fn with_config(config: EditorConfig) -> Self {
        Self {
            config: Some(config),
        }
    }
}

impl Plugin for SolutionEditorPlugin {
    fn build(&self, app: &mut App) {
        let config = self.config.clone().unwrap_or_else(load_editor_config);
        app.insert_resource(EditorDocument::new(&config))
            .insert_resource(config)
            .add_event::<SolutionCommand>()
            .add_event::<SolutionChanged>()
            .add_systems(Update, apply_solution_commands);
    }
}
