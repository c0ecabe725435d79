/*
Views never record commands themselves. An edit is applied first, then the
editor captures what the touched entities looked like before and after and
records both snapshots as one command:

- before the edit: `FieldSnapshot::capture` → becomes the undo action
- after the edit:  `FieldSnapshot::capture` again → becomes the redo action

Restoring a snapshot writes every captured value back, so one command covers
a whole multi-selection.
 */

use std::rc::Rc;

use anyhow::Context;
use savage_undo::{ActionCommand, Property};

use crate::model::{EntityRef, GameEntity};

pub struct FieldSnapshot<V> {
    property: Property<GameEntity, V>,
    values: Vec<(EntityRef, V)>,
}

impl<V: Clone> FieldSnapshot<V> {
    pub fn capture(entities: &[EntityRef], property: Property<GameEntity, V>) -> Self {
        let values = entities
            .iter()
            .map(|e| (e.clone(), property.get(&e.borrow())))
            .collect();
        Self { property, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True when both snapshots hold the same values for the same entities.
    pub fn same_as(&self, other: &Self) -> bool
    where
        V: PartialEq,
    {
        self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|((a, va), (b, vb))| Rc::ptr_eq(a, b) && va == vb)
    }

    pub fn restore(&self) -> anyhow::Result<()> {
        for (entity, value) in &self.values {
            let mut entity = entity
                .try_borrow_mut()
                .with_context(|| format!("{} is in use", self.property.name()))?;
            self.property.set(&mut entity, value.clone());
        }
        Ok(())
    }
}

/// Command that moves the entities between two captured states.
pub fn snapshot_command<V: Clone + 'static>(
    name: impl Into<String>,
    before: FieldSnapshot<V>,
    after: FieldSnapshot<V>,
) -> savage_undo::Result<impl savage_undo::Command + 'static> {
    ActionCommand::new(name, move || before.restore(), move || after.restore())
}
