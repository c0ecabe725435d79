//! Command history for the editor.
//!
//! Editor code applies an edit, then records a [`Command`] that knows how to
//! revert and re-apply it. [`CommandHistory`] replays those commands on undo
//! and redo, and ignores anything recorded while a replay is running.

mod command;
mod error;
mod history;
mod property;

pub use command::{ActionCommand, ActionCommandBuilder, BoxedAction, Command, CommandGroup};
pub use error::{CommandError, Result};
pub use history::{CommandHistory, HistoryConfig, HistoryEvent};
pub use property::{Property, PropertyCommand, PropertySnapshot, PropertyValue, Reflect};
