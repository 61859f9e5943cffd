pub mod catalog;
pub mod config;
pub mod document;
pub mod history;
pub mod inference;
pub mod jump;
pub mod level;
pub mod persistence;
pub mod plugin;
pub mod projection;
pub mod sanity;
pub mod solution;

pub use config::EditorConfig;
pub use document::EditorDocument;
pub use jump::Jump;
pub use level::{Level, LevelFacts};
pub use plugin::{SolutionChanged, SolutionCommand, SolutionEditorPlugin};
pub use sanity::Severity;
pub use solution::Solution;
