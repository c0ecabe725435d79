//! The open project and every undoable edit the editor can make to it.
//!
//! Each edit is applied immediately and then recorded into the project's
//! [`CommandHistory`]. Commands capture the scenes and entities they touch,
//! never the project itself, so undoing an edit does not depend on the
//! project handle that made it.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use anyhow::{anyhow, bail, Context};
use savage_undo::{
    ActionCommand, Command, CommandGroup, CommandHistory, HistoryConfig, PropertyCommand,
    PropertySnapshot,
};
use uuid::Uuid;

use crate::command::{snapshot_command, FieldSnapshot};
use crate::model::{EntityRef, GameEntity, Scene, SceneRef, TransformField, ENABLED, NAME};

type SceneList = Rc<RefCell<Vec<SceneRef>>>;
type Selection = Rc<RefCell<Vec<Uuid>>>;

pub struct Project {
    name: String,
    scenes: SceneList,
    selection: Selection,
    history: Rc<CommandHistory>,
}

impl Project {
    pub const DEFAULT_SCENE: &'static str = "Default Scene";

    /// New project with one active scene and an empty history.
    pub fn new(name: impl Into<String>, config: HistoryConfig) -> Self {
        let mut scene = Scene::new(Self::DEFAULT_SCENE);
        scene.set_active(true);
        Self {
            name: name.into(),
            scenes: Rc::new(RefCell::new(vec![Rc::new(RefCell::new(scene))])),
            selection: Rc::new(RefCell::new(Vec::new())),
            history: Rc::new(CommandHistory::with_config(config)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn history(&self) -> &Rc<CommandHistory> {
        &self.history
    }

    pub fn scenes(&self) -> Vec<SceneRef> {
        self.scenes.borrow().clone()
    }

    pub fn scene(&self, id: Uuid) -> Option<SceneRef> {
        self.scenes.borrow().iter().find(|s| s.borrow().id == id).cloned()
    }

    pub fn scene_by_name(&self, name: &str) -> Option<SceneRef> {
        self.scenes.borrow().iter().find(|s| s.borrow().name == name).cloned()
    }

    pub fn active_scene(&self) -> Option<SceneRef> {
        self.scenes.borrow().iter().find(|s| s.borrow().is_active()).cloned()
    }

    pub fn entity(&self, id: Uuid) -> Option<EntityRef> {
        self.scenes.borrow().iter().find_map(|s| {
            let scene = s.borrow();
            scene.entity_index(id).map(|i| scene.entities()[i].clone())
        })
    }

    pub fn entity_by_name(&self, name: &str) -> Option<EntityRef> {
        self.scenes.borrow().iter().find_map(|s| {
            s.borrow().entities().iter().find(|e| e.borrow().name == name).cloned()
        })
    }

    /// Switching scenes is not recorded.
    pub fn set_active_scene(&self, id: Uuid) -> anyhow::Result<()> {
        let target = self.scene(id).ok_or_else(|| anyhow!("no scene with id {id}"))?;
        for scene in self.scenes.borrow().iter() {
            let is_target = Rc::ptr_eq(scene, &target);
            scene.borrow_mut().set_active(is_target);
        }
        Ok(())
    }

    pub fn add_scene(&self, name: &str) -> anyhow::Result<Uuid> {
        if name.trim().is_empty() {
            bail!("scene name must not be empty");
        }
        let scene = Rc::new(RefCell::new(Scene::new(name)));
        let id = scene.borrow().id;
        let index = {
            let mut scenes = self.scenes.borrow_mut();
            scenes.push(scene.clone());
            scenes.len() - 1
        };
        log::debug!("added scene {name} at {index}");

        let undo_scenes = self.scenes.clone();
        let redo_scenes = self.scenes.clone();
        let redo_scene = scene;
        self.history.add(ActionCommand::new(
            format!("Add {name}"),
            move || remove_scene_from(&undo_scenes, id).map(|_| ()),
            move || insert_scene_into(&redo_scenes, redo_scene.clone(), index),
        )?);
        Ok(id)
    }

    /// The active scene cannot be removed.
    pub fn remove_scene(&self, id: Uuid) -> anyhow::Result<()> {
        let scene = self.scene(id).ok_or_else(|| anyhow!("no scene with id {id}"))?;
        if scene.borrow().is_active() {
            bail!("cannot remove the active scene {}", scene.borrow().name);
        }
        let index = remove_scene_from(&self.scenes, id)?;
        let name = scene.borrow().name.clone();
        log::debug!("removed scene {name} from {index}");

        let undo_scenes = self.scenes.clone();
        let redo_scenes = self.scenes.clone();
        self.history.add(ActionCommand::new(
            format!("Remove {name}"),
            move || insert_scene_into(&undo_scenes, scene.clone(), index),
            move || remove_scene_from(&redo_scenes, id).map(|_| ()),
        )?);
        Ok(())
    }

    /// Renames through the scene's reflected `Name` property.
    pub fn rename_scene(&self, id: Uuid, name: &str) -> anyhow::Result<()> {
        if name.trim().is_empty() {
            bail!("scene name must not be empty");
        }
        let scene = self.scene(id).ok_or_else(|| anyhow!("no scene with id {id}"))?;
        let old_name = std::mem::replace(&mut scene.borrow_mut().name, name.to_string());
        if old_name == name {
            return Ok(());
        }
        self.history.add(PropertySnapshot::new(
            "Name",
            scene,
            old_name.clone(),
            name,
            format!("Rename {old_name} to {name}"),
        )?);
        Ok(())
    }

    pub fn add_entity(&self, scene_id: Uuid, name: &str) -> anyhow::Result<Uuid> {
        if name.trim().is_empty() {
            bail!("entity name must not be empty");
        }
        let scene = self.scene(scene_id).ok_or_else(|| anyhow!("no scene with id {scene_id}"))?;
        let entity = Rc::new(RefCell::new(GameEntity::new(name)));
        let id = entity.borrow().id;
        let index = {
            let mut s = scene.borrow_mut();
            s.insert_entity(entity.clone(), None);
            s.entities().len() - 1
        };
        let scene_name = scene.borrow().name.clone();
        log::debug!("added entity {name} to {scene_name}");

        let undo_scene = scene.clone();
        self.history.add(ActionCommand::new(
            format!("Add {name} to {scene_name}"),
            move || {
                undo_scene
                    .borrow_mut()
                    .remove_entity(id)
                    .ok_or_else(|| anyhow!("entity {id} is not in its scene"))?;
                Ok(())
            },
            move || {
                scene.borrow_mut().insert_entity(entity.clone(), Some(index));
                Ok(())
            },
        )?);
        Ok(id)
    }

    pub fn remove_entity(&self, id: Uuid) -> anyhow::Result<()> {
        let scene = self
            .scenes
            .borrow()
            .iter()
            .find(|s| s.borrow().entity_index(id).is_some())
            .cloned()
            .ok_or_else(|| anyhow!("no entity with id {id}"))?;
        let (index, entity) = scene
            .borrow_mut()
            .remove_entity(id)
            .context("entity vanished from its scene")?;
        let name = entity.borrow().name.clone();
        log::debug!("removed entity {name}");

        let redo_scene = scene.clone();
        self.history.add(ActionCommand::new(
            format!("Remove {name}"),
            move || {
                scene.borrow_mut().insert_entity(entity.clone(), Some(index));
                Ok(())
            },
            move || {
                redo_scene
                    .borrow_mut()
                    .remove_entity(id)
                    .ok_or_else(|| anyhow!("entity {id} is not in its scene"))?;
                Ok(())
            },
        )?);
        Ok(())
    }

    pub fn selection(&self) -> Vec<Uuid> {
        self.selection.borrow().clone()
    }

    /// Selected entities that still exist, in selection order.
    pub fn selected_entities(&self) -> Vec<EntityRef> {
        self.selection
            .borrow()
            .iter()
            .filter_map(|id| self.entity(*id))
            .collect()
    }

    pub fn select(&self, ids: Vec<Uuid>) {
        change_selection(&self.history, &self.selection, ids);
    }

    pub fn rename_selected(&self, name: &str) -> anyhow::Result<()> {
        if name.trim().is_empty() {
            bail!("entity name must not be empty");
        }
        let entities = self.selected_entities();
        if entities.is_empty() {
            bail!("nothing selected");
        }

        let before = FieldSnapshot::capture(&entities, NAME);
        for entity in &entities {
            entity.borrow_mut().name = name.to_string();
        }
        let after = FieldSnapshot::capture(&entities, NAME);
        if before.same_as(&after) {
            return Ok(());
        }

        self.history.add(snapshot_command("Rename game entity / game entities", before, after)?);
        Ok(())
    }

    pub fn set_selected_enabled(&self, enabled: bool) -> anyhow::Result<()> {
        let entities = self.selected_entities();
        if entities.is_empty() {
            bail!("nothing selected");
        }

        let before = FieldSnapshot::capture(&entities, ENABLED);
        for entity in &entities {
            entity.borrow_mut().enabled = enabled;
        }
        let after = FieldSnapshot::capture(&entities, ENABLED);
        if before.same_as(&after) {
            return Ok(());
        }

        let name = if enabled {
            "Enable game entity / game entities"
        } else {
            "Disable game entity / game entities"
        };
        self.history.add(snapshot_command(name, before, after)?);
        Ok(())
    }

    /// One history entry covering every selected entity the value changes.
    pub fn set_selected_transform(&self, field: TransformField, value: [f32; 3]) -> anyhow::Result<()> {
        let entities = self.selected_entities();
        if entities.is_empty() {
            bail!("nothing selected");
        }

        let property = field.property();
        let changed: Vec<EntityRef> = entities
            .into_iter()
            .filter(|e| property.get(&e.borrow()) != value)
            .collect();
        if changed.is_empty() {
            return Ok(());
        }

        let mut commands: Vec<Box<dyn Command>> = Vec::with_capacity(changed.len());
        for entity in changed {
            let name = format!("{} {}", field.change_name(), entity.borrow().name);
            commands.push(Box::new(PropertyCommand::apply(name, entity, property, value)?));
        }

        self.history.add(CommandGroup::new(field.change_name(), commands)?);
        Ok(())
    }

    pub fn undo(&self) -> anyhow::Result<bool> {
        self.history.undo().map_err(|err| {
            log::error!("undo failed, history entry dropped: {err}");
            err.into()
        })
    }

    pub fn redo(&self) -> anyhow::Result<bool> {
        self.history.redo().map_err(|err| {
            log::error!("redo failed, history entry dropped: {err}");
            err.into()
        })
    }

    pub fn unload(&self) {
        log::info!("unloading project {}", self.name);
        self.selection.borrow_mut().clear();
        self.history.reset();
    }
}

fn remove_scene_from(scenes: &SceneList, id: Uuid) -> anyhow::Result<usize> {
    let mut scenes = scenes.borrow_mut();
    let index = scenes
        .iter()
        .position(|s| s.borrow().id == id)
        .ok_or_else(|| anyhow!("no scene with id {id}"))?;
    scenes.remove(index);
    Ok(index)
}

fn insert_scene_into(scenes: &SceneList, scene: SceneRef, index: usize) -> anyhow::Result<()> {
    let mut scenes = scenes.borrow_mut();
    let index = index.min(scenes.len());
    scenes.insert(index, scene);
    Ok(())
}

/// Sets the selection and records the change.
///
/// Undo and redo come back through here, exactly like a selection made in the
/// UI. The history drops those nested records because it is replaying.
fn change_selection(history: &Rc<CommandHistory>, selection: &Selection, ids: Vec<Uuid>) {
    let previous = std::mem::replace(&mut *selection.borrow_mut(), ids.clone());
    if previous == ids {
        return;
    }

    // Weak: the command lives inside the history it points to.
    let undo_history: Weak<CommandHistory> = Rc::downgrade(history);
    let redo_history = undo_history.clone();
    let undo_selection = selection.clone();
    let redo_selection = selection.clone();
    let command = ActionCommand::new(
        "Selection Changed",
        move || {
            let history = undo_history.upgrade().context("history dropped")?;
            change_selection(&history, &undo_selection, previous.clone());
            Ok(())
        },
        move || {
            let history = redo_history.upgrade().context("history dropped")?;
            change_selection(&history, &redo_selection, ids.clone());
            Ok(())
        },
    );
    match command {
        Ok(command) => history.add(command),
        Err(err) => log::error!("could not record selection change: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> Project {
        Project::new("Test", HistoryConfig::default())
    }

    fn scene_names(project: &Project) -> Vec<String> {
        project.scenes().iter().map(|s| s.borrow().name.clone()).collect()
    }

    #[test]
    fn test_new_project_has_active_default_scene() {
        let project = project();
        let active = project.active_scene().unwrap();
        assert_eq!(active.borrow().name, Project::DEFAULT_SCENE);
        assert!(!project.history().can_undo());
    }

    #[test]
    fn test_add_scene_undo_redo() {
        let project = project();
        project.add_scene("Level 1").unwrap();
        assert_eq!(scene_names(&project), vec![Project::DEFAULT_SCENE, "Level 1"]);
        assert_eq!(project.history().next_undo_name().as_deref(), Some("Add Level 1"));

        project.undo().unwrap();
        assert_eq!(scene_names(&project), vec![Project::DEFAULT_SCENE]);

        project.redo().unwrap();
        assert_eq!(scene_names(&project), vec![Project::DEFAULT_SCENE, "Level 1"]);
    }

    #[test]
    fn test_remove_scene_undo_restores_index() {
        let project = project();
        project.add_scene("A").unwrap();
        let b = project.add_scene("B").unwrap();
        project.add_scene("C").unwrap();

        project.remove_scene(b).unwrap();
        assert_eq!(scene_names(&project), vec![Project::DEFAULT_SCENE, "A", "C"]);

        project.undo().unwrap();
        assert_eq!(scene_names(&project), vec![Project::DEFAULT_SCENE, "A", "B", "C"]);
    }

    #[test]
    fn test_active_scene_cannot_be_removed() {
        let project = project();
        let id = project.active_scene().unwrap().borrow().id;
        assert!(project.remove_scene(id).is_err());
        assert!(!project.history().can_undo());
    }

    #[test]
    fn test_rename_scene_uses_reflected_property() {
        let project = project();
        let id = project.add_scene("Old").unwrap();
        project.rename_scene(id, "New").unwrap();
        assert_eq!(project.history().next_undo_name().as_deref(), Some("Rename Old to New"));

        project.undo().unwrap();
        assert_eq!(project.scene(id).unwrap().borrow().name, "Old");
        project.redo().unwrap();
        assert_eq!(project.scene(id).unwrap().borrow().name, "New");
    }

    #[test]
    fn test_add_and_remove_entity() {
        let project = project();
        let scene = project.active_scene().unwrap().borrow().id;
        let a = project.add_entity(scene, "A").unwrap();
        let b = project.add_entity(scene, "B").unwrap();
        assert!(project.entity(a).unwrap().borrow().active);

        project.remove_entity(a).unwrap();
        assert!(project.entity(a).is_none());

        project.undo().unwrap();
        let restored = project.entity(a).unwrap();
        assert!(restored.borrow().active);
        let scene = project.scene(scene).unwrap();
        assert_eq!(scene.borrow().entity_index(a), Some(0));
        assert_eq!(scene.borrow().entity_index(b), Some(1));
    }

    #[test]
    fn test_selection_undo_is_not_recorded_again() {
        let project = project();
        let scene = project.active_scene().unwrap().borrow().id;
        let a = project.add_entity(scene, "A").unwrap();
        let b = project.add_entity(scene, "B").unwrap();

        project.select(vec![a]);
        project.select(vec![a, b]);
        assert_eq!(project.history().undo_count(), 4);

        project.undo().unwrap();
        assert_eq!(project.selection(), vec![a]);
        assert_eq!(project.history().undo_count(), 3);
        assert_eq!(project.history().redo_count(), 1);

        project.redo().unwrap();
        assert_eq!(project.selection(), vec![a, b]);
        assert_eq!(project.history().redo_count(), 0);
    }

    #[test]
    fn test_same_selection_is_not_recorded() {
        let project = project();
        project.select(Vec::new());
        assert!(!project.history().can_undo());
    }

    #[test]
    fn test_rename_and_toggle_selected() {
        let project = project();
        let scene = project.active_scene().unwrap().borrow().id;
        let id = project.add_entity(scene, "A").unwrap();
        project.select(vec![id]);

        project.rename_selected("B").unwrap();
        project.set_selected_enabled(false).unwrap();
        let entity = project.entity(id).unwrap();

        project.undo().unwrap();
        assert_eq!(entity.borrow().name, "B");
        assert!(entity.borrow().enabled);

        project.undo().unwrap();
        assert_eq!(entity.borrow().name, "A");

        project.redo().unwrap();
        assert_eq!(entity.borrow().name, "B");
        assert!(entity.borrow().enabled);
    }

    #[test]
    fn test_edit_without_selection_fails() {
        let project = project();
        assert!(project.rename_selected("X").is_err());
        assert!(project.set_selected_enabled(true).is_err());
        assert!(project
            .set_selected_transform(TransformField::Position, [1.0, 0.0, 0.0])
            .is_err());
    }

    #[test]
    fn test_transform_on_multiple_entities_is_one_entry() {
        let project = project();
        let scene = project.active_scene().unwrap().borrow().id;
        let a = project.add_entity(scene, "A").unwrap();
        let b = project.add_entity(scene, "B").unwrap();
        project.select(vec![a, b]);
        let before = project.history().undo_count();

        project
            .set_selected_transform(TransformField::Position, [1.0, 2.0, 3.0])
            .unwrap();
        assert_eq!(project.history().undo_count(), before + 1);
        assert_eq!(project.history().next_undo_name().as_deref(), Some("Position Changed"));

        project.undo().unwrap();
        for id in [a, b] {
            assert_eq!(project.entity(id).unwrap().borrow().transform.position, [0.0; 3]);
        }
    }

    #[test]
    fn test_unchanged_edits_are_not_recorded() {
        let project = project();
        let scene = project.active_scene().unwrap().borrow().id;
        let a = project.add_entity(scene, "A").unwrap();
        let b = project.add_entity(scene, "B").unwrap();
        project.select(vec![a, b]);
        project
            .set_selected_transform(TransformField::Scale, [2.0, 2.0, 2.0])
            .unwrap();
        let before = project.history().undo_count();

        project
            .set_selected_transform(TransformField::Scale, [2.0, 2.0, 2.0])
            .unwrap();
        project
            .set_selected_transform(TransformField::Position, [0.0; 3])
            .unwrap();
        project.set_selected_enabled(true).unwrap();
        assert_eq!(project.history().undo_count(), before);

        project.rename_selected("C").unwrap();
        project.rename_selected("C").unwrap();
        assert_eq!(project.history().undo_count(), before + 1);
    }

    #[test]
    fn test_transform_skips_entities_already_at_value() {
        let project = project();
        let scene = project.active_scene().unwrap().borrow().id;
        let a = project.add_entity(scene, "A").unwrap();
        let b = project.add_entity(scene, "B").unwrap();
        project.select(vec![a]);
        project
            .set_selected_transform(TransformField::Position, [1.0, 0.0, 0.0])
            .unwrap();
        project.select(vec![a, b]);
        project
            .set_selected_transform(TransformField::Position, [1.0, 0.0, 0.0])
            .unwrap();

        project.undo().unwrap();
        assert_eq!(project.entity(a).unwrap().borrow().transform.position, [1.0, 0.0, 0.0]);
        assert_eq!(project.entity(b).unwrap().borrow().transform.position, [0.0; 3]);
    }

    #[test]
    fn test_unload_clears_history() {
        let project = project();
        project.add_scene("Level").unwrap();
        project.unload();
        assert!(!project.history().can_undo());
        assert!(!project.history().can_redo());
    }
}
