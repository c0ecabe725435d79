use std::cell::RefCell;
use std::fmt::Write;
use std::rc::{Rc, Weak};

use savage_undo::{CommandHistory, HistoryEvent};

/// What the undo/redo panel and the Edit menu display.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PanelState {
    /// Oldest first, the next undo is last.
    pub undo_items: Vec<String>,
    /// Next redo first.
    pub redo_items: Vec<String>,
    pub can_undo: bool,
    pub can_redo: bool,
    pub last_event: Option<HistoryEvent>,
}

/// Read-only view of a history, kept current through history events.
pub struct UndoRedoPanel {
    state: Rc<RefCell<PanelState>>,
}

impl UndoRedoPanel {
    pub fn attach(history: &Rc<CommandHistory>) -> Self {
        let state = Rc::new(RefCell::new(PanelState::default()));
        refresh(&state, history, None);

        let weak: Weak<CommandHistory> = Rc::downgrade(history);
        let listener_state = state.clone();
        history.subscribe(move |event| {
            let Some(history) = weak.upgrade() else { return; };
            refresh(&listener_state, &history, Some(event.clone()));
        });

        Self { state }
    }

    pub fn state(&self) -> PanelState {
        self.state.borrow().clone()
    }

    pub fn can_undo(&self) -> bool {
        self.state.borrow().can_undo
    }

    pub fn can_redo(&self) -> bool {
        self.state.borrow().can_redo
    }

    pub fn undo_label(&self) -> String {
        match self.state.borrow().undo_items.last() {
            Some(name) => format!("Undo {name}"),
            None => "Undo".into(),
        }
    }

    pub fn redo_label(&self) -> String {
        match self.state.borrow().redo_items.first() {
            Some(name) => format!("Redo {name}"),
            None => "Redo".into(),
        }
    }

    /// Plain-text rendering: undo entries newest first, then redo entries.
    pub fn render(&self) -> String {
        let state = self.state.borrow();
        let mut out = String::new();
        let _ = writeln!(out, "Undo ({})", state.undo_items.len());
        for name in state.undo_items.iter().rev() {
            let _ = writeln!(out, "  {name}");
        }
        let _ = writeln!(out, "Redo ({})", state.redo_items.len());
        for name in &state.redo_items {
            let _ = writeln!(out, "  {name}");
        }
        out
    }
}

fn refresh(state: &RefCell<PanelState>, history: &CommandHistory, event: Option<HistoryEvent>) {
    let mut state = state.borrow_mut();
    state.undo_items = history.undo_names();
    state.redo_items = history.redo_names();
    state.can_undo = history.can_undo();
    state.can_redo = history.can_redo();
    if event.is_some() {
        state.last_event = event;
    }
}
