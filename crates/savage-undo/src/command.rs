use std::fmt;

use crate::error::{CommandError, Result};

/// One reversible unit of editor work.
///
/// A command is created after its forward mutation has already happened, so
/// the history never calls `redo` on add. `undo` and `redo` are each invoked
/// at most once per history transition.
pub trait Command {
    /// Label shown in undo/redo menus.
    fn name(&self) -> &str;

    fn undo(&mut self) -> Result<()>;

    fn redo(&mut self) -> Result<()>;
}

impl fmt::Debug for dyn Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Command").field(&self.name()).finish()
    }
}

pub type BoxedAction = Box<dyn FnMut() -> anyhow::Result<()>>;

/// Command built from a pair of closures.
pub struct ActionCommand<U, R> {
    name: String,
    undo: U,
    redo: R,
}

impl<U, R> ActionCommand<U, R>
where
    U: FnMut() -> anyhow::Result<()>,
    R: FnMut() -> anyhow::Result<()>,
{
    pub fn new(name: impl Into<String>, undo: U, redo: R) -> Result<Self> {
        let name = validate_name(name.into())?;
        Ok(Self { name, undo, redo })
    }
}

impl ActionCommand<BoxedAction, BoxedAction> {
    pub fn builder(name: impl Into<String>) -> ActionCommandBuilder {
        ActionCommandBuilder {
            name: name.into(),
            undo: None,
            redo: None,
        }
    }
}

impl<U, R> Command for ActionCommand<U, R>
where
    U: FnMut() -> anyhow::Result<()>,
    R: FnMut() -> anyhow::Result<()>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn undo(&mut self) -> Result<()> {
        (self.undo)().map_err(into_command_error)
    }

    fn redo(&mut self) -> Result<()> {
        (self.redo)().map_err(into_command_error)
    }
}

/// Collects actions one at a time; `build` rejects a command missing either side.
pub struct ActionCommandBuilder {
    name: String,
    undo: Option<BoxedAction>,
    redo: Option<BoxedAction>,
}

impl ActionCommandBuilder {
    pub fn undo(mut self, action: impl FnMut() -> anyhow::Result<()> + 'static) -> Self {
        self.undo = Some(Box::new(action));
        self
    }

    pub fn redo(mut self, action: impl FnMut() -> anyhow::Result<()> + 'static) -> Self {
        self.redo = Some(Box::new(action));
        self
    }

    pub fn build(self) -> Result<ActionCommand<BoxedAction, BoxedAction>> {
        let Some(undo) = self.undo else {
            return Err(CommandError::InvalidArgument(format!(
                "command `{}` has no undo action",
                self.name
            )));
        };
        let Some(redo) = self.redo else {
            return Err(CommandError::InvalidArgument(format!(
                "command `{}` has no redo action",
                self.name
            )));
        };
        ActionCommand::new(self.name, undo, redo)
    }
}

/// Several commands recorded as a single history entry.
///
/// Undo walks the members backwards, redo forwards. The walk stops at the
/// first failing member.
pub struct CommandGroup {
    name: String,
    commands: Vec<Box<dyn Command>>,
}

impl CommandGroup {
    pub fn new(name: impl Into<String>, commands: Vec<Box<dyn Command>>) -> Result<Self> {
        let name = validate_name(name.into())?;
        if commands.is_empty() {
            return Err(CommandError::InvalidArgument(format!(
                "command group `{name}` is empty"
            )));
        }
        Ok(Self { name, commands })
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Command for CommandGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn undo(&mut self) -> Result<()> {
        for command in self.commands.iter_mut().rev() {
            command.undo()?;
        }
        Ok(())
    }

    fn redo(&mut self) -> Result<()> {
        for command in self.commands.iter_mut() {
            command.redo()?;
        }
        Ok(())
    }
}

pub(crate) fn validate_name(name: String) -> Result<String> {
    if name.trim().is_empty() {
        return Err(CommandError::InvalidArgument(
            "command name must not be empty".into(),
        ));
    }
    Ok(name)
}

// A closure may forward a CommandError through `?`; keep its variant.
fn into_command_error(err: anyhow::Error) -> CommandError {
    match err.downcast::<CommandError>() {
        Ok(err) => err,
        Err(err) => CommandError::Action(err),
    }
}
