mod command;
pub mod config;
pub mod model;
pub mod project;
pub mod session;
pub mod undo_panel;

pub use config::EditorConfig;
pub use model::{GameEntity, Scene, Transform, TransformField};
pub use project::Project;
pub use session::{Instruction, Session};
pub use undo_panel::{PanelState, UndoRedoPanel};
