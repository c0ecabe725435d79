//! Linear undo/redo history.
//!
//! Every method takes `&self`. Commands replayed by [`CommandHistory::undo`]
//! and [`CommandHistory::redo`] usually call back into the same editor code
//! that recorded them, and that code holds a handle to this history. No stack
//! is borrowed while a command runs, and `add` is a no-op until the replay
//! returns.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::num::NonZeroUsize;

use crate::command::Command;
use crate::error::Result;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Oldest undo entries are evicted beyond this. `None` keeps everything.
    pub capacity: Option<NonZeroUsize>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HistoryEvent {
    Added { name: String },
    Undone { name: String },
    Redone { name: String },
    /// A replayed command failed and was discarded.
    Dropped { name: String },
    Reset,
}

type Listener = Box<dyn FnMut(&HistoryEvent)>;

pub struct CommandHistory {
    config: HistoryConfig,
    // most recent last
    undo_stack: RefCell<Vec<Box<dyn Command>>>,
    // next redo first
    redo_stack: RefCell<VecDeque<Box<dyn Command>>>,
    recording: Cell<bool>,
    listeners: RefCell<Vec<Listener>>,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CommandHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandHistory")
            .field("config", &self.config)
            .field("undo", &self.undo_names())
            .field("redo", &self.redo_names())
            .field("recording", &self.recording.get())
            .finish()
    }
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::with_config(HistoryConfig::default())
    }

    pub fn with_config(config: HistoryConfig) -> Self {
        Self {
            config,
            undo_stack: RefCell::new(Vec::new()),
            redo_stack: RefCell::new(VecDeque::new()),
            recording: Cell::new(true),
            listeners: RefCell::new(Vec::new()),
        }
    }

    pub fn config(&self) -> HistoryConfig {
        self.config
    }

    /// Records a command whose forward edit has already been applied.
    ///
    /// Dropped silently while a command is being replayed. Otherwise the
    /// redo stack is discarded.
    pub fn add(&self, command: impl Command + 'static) {
        self.add_boxed(Box::new(command));
    }

    pub fn add_boxed(&self, command: Box<dyn Command>) {
        if !self.recording.get() {
            log::trace!("replaying, dropped `{}`", command.name());
            return;
        }

        let name = command.name().to_string();
        {
            let mut undo_stack = self.undo_stack.borrow_mut();
            undo_stack.push(command);
            if let Some(capacity) = self.config.capacity {
                let excess = undo_stack.len().saturating_sub(capacity.get());
                if excess > 0 {
                    log::trace!("evicting {excess} oldest command(s)");
                    undo_stack.drain(..excess);
                }
            }
        }
        self.redo_stack.borrow_mut().clear();

        log::debug!("added `{name}`");
        self.notify(HistoryEvent::Added { name });
    }

    /// Reverts the most recent command. Returns `Ok(false)` when there is
    /// nothing to undo.
    ///
    /// If the command fails its error is returned and the command is gone:
    /// it is not put back on either stack, and listeners get
    /// [`HistoryEvent::Dropped`].
    pub fn undo(&self) -> Result<bool> {
        let popped = self.undo_stack.borrow_mut().pop();
        let Some(mut command) = popped else {
            return Ok(false);
        };

        log::debug!("undo `{}`", command.name());
        let result = {
            let _paused = RecordingPaused::new(&self.recording);
            command.undo()
        };

        let name = command.name().to_string();
        if let Err(err) = result {
            log::debug!("undo of `{name}` failed, dropped");
            self.notify(HistoryEvent::Dropped { name });
            return Err(err);
        }
        self.redo_stack.borrow_mut().push_front(command);
        self.notify(HistoryEvent::Undone { name });
        Ok(true)
    }

    /// Re-applies the most recently undone command. Same failure rules as
    /// [`CommandHistory::undo`].
    pub fn redo(&self) -> Result<bool> {
        let popped = self.redo_stack.borrow_mut().pop_front();
        let Some(mut command) = popped else {
            return Ok(false);
        };

        log::debug!("redo `{}`", command.name());
        let result = {
            let _paused = RecordingPaused::new(&self.recording);
            command.redo()
        };

        let name = command.name().to_string();
        if let Err(err) = result {
            log::debug!("redo of `{name}` failed, dropped");
            self.notify(HistoryEvent::Dropped { name });
            return Err(err);
        }
        self.undo_stack.borrow_mut().push(command);
        self.notify(HistoryEvent::Redone { name });
        Ok(true)
    }

    pub fn reset(&self) {
        self.undo_stack.borrow_mut().clear();
        self.redo_stack.borrow_mut().clear();
        log::debug!("history reset");
        self.notify(HistoryEvent::Reset);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.borrow().is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.borrow().is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.borrow().len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.borrow().len()
    }

    /// Oldest first.
    pub fn undo_names(&self) -> Vec<String> {
        self.undo_stack
            .borrow()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    /// Next redo first.
    pub fn redo_names(&self) -> Vec<String> {
        self.redo_stack
            .borrow()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    pub fn next_undo_name(&self) -> Option<String> {
        self.undo_stack.borrow().last().map(|c| c.name().to_string())
    }

    pub fn next_redo_name(&self) -> Option<String> {
        self.redo_stack.borrow().front().map(|c| c.name().to_string())
    }

    /// False only while a command is being replayed.
    pub fn is_recording(&self) -> bool {
        self.recording.get()
    }

    /// Listeners run after the stacks change and may call back into the
    /// history. Events raised from inside a listener are not delivered.
    pub fn subscribe(&self, listener: impl FnMut(&HistoryEvent) + 'static) {
        self.listeners.borrow_mut().push(Box::new(listener));
    }

    fn notify(&self, event: HistoryEvent) {
        let mut notifying = Notifying {
            slot: &self.listeners,
            listeners: self.listeners.take(),
        };
        for listener in notifying.listeners.iter_mut() {
            listener(&event);
        }
    }
}

/// Listeners taken out for a notification. They go back into the history on
/// drop, also when a listener panics.
struct Notifying<'a> {
    slot: &'a RefCell<Vec<Listener>>,
    listeners: Vec<Listener>,
}

impl Drop for Notifying<'_> {
    fn drop(&mut self) {
        let mut current = self.slot.borrow_mut();
        // keep anything subscribed while we were notifying
        self.listeners.append(&mut current);
        *current = std::mem::take(&mut self.listeners);
    }
}

/// Turns recording off and restores the previous state on drop, including
/// when the replayed command panics.
struct RecordingPaused<'a> {
    recording: &'a Cell<bool>,
    previous: bool,
}

impl<'a> RecordingPaused<'a> {
    fn new(recording: &'a Cell<bool>) -> Self {
        let previous = recording.replace(false);
        Self { recording, previous }
    }
}

impl Drop for RecordingPaused<'_> {
    fn drop(&mut self) {
        self.recording.set(self.previous);
    }
}
