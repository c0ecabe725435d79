use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use savage_undo::{CommandError, Property, PropertyValue, Reflect};
use uuid::Uuid;

pub type EntityRef = Rc<RefCell<GameEntity>>;
pub type SceneRef = Rc<RefCell<Scene>>;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransformField {
    Position,
    Rotation,
    Scale,
}

impl TransformField {
    pub fn property(self) -> Property<GameEntity, [f32; 3]> {
        match self {
            TransformField::Position => POSITION,
            TransformField::Rotation => ROTATION,
            TransformField::Scale => SCALE,
        }
    }

    /// History label for an edit of this field.
    pub fn change_name(self) -> &'static str {
        match self {
            TransformField::Position => "Position Changed",
            TransformField::Rotation => "Rotation Changed",
            TransformField::Scale => "Scale Changed",
        }
    }
}

fn position_of(e: &GameEntity) -> [f32; 3] {
    e.transform.position
}

fn set_position(e: &mut GameEntity, v: [f32; 3]) {
    e.transform.position = v;
}

fn rotation_of(e: &GameEntity) -> [f32; 3] {
    e.transform.rotation
}

fn set_rotation(e: &mut GameEntity, v: [f32; 3]) {
    e.transform.rotation = v;
}

fn scale_of(e: &GameEntity) -> [f32; 3] {
    e.transform.scale
}

fn set_scale(e: &mut GameEntity, v: [f32; 3]) {
    e.transform.scale = v;
}

fn name_of(e: &GameEntity) -> String {
    e.name.clone()
}

fn set_name(e: &mut GameEntity, v: String) {
    e.name = v;
}

fn enabled_of(e: &GameEntity) -> bool {
    e.enabled
}

fn set_enabled(e: &mut GameEntity, v: bool) {
    e.enabled = v;
}

pub const POSITION: Property<GameEntity, [f32; 3]> = Property::new("Position", position_of, set_position);
pub const ROTATION: Property<GameEntity, [f32; 3]> = Property::new("Rotation", rotation_of, set_rotation);
pub const SCALE: Property<GameEntity, [f32; 3]> = Property::new("Scale", scale_of, set_scale);
pub const NAME: Property<GameEntity, String> = Property::new("Name", name_of, set_name);
pub const ENABLED: Property<GameEntity, bool> = Property::new("IsEnabled", enabled_of, set_enabled);

#[derive(Clone, Debug, PartialEq)]
pub struct GameEntity {
    pub id: Uuid,
    pub name: String,
    pub enabled: bool,
    /// Follows the owning scene; false once removed from it.
    pub active: bool,
    pub transform: Transform,
}

impl GameEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            enabled: true,
            active: false,
            transform: Transform::default(),
        }
    }
}

impl Reflect for GameEntity {
    fn type_name(&self) -> &'static str {
        "GameEntity"
    }

    fn property(&self, property: &str) -> Result<PropertyValue, CommandError> {
        match property {
            "Name" => Ok(self.name.clone().into()),
            "IsEnabled" => Ok(self.enabled.into()),
            "Position" => Ok(self.transform.position.into()),
            "Rotation" => Ok(self.transform.rotation.into()),
            "Scale" => Ok(self.transform.scale.into()),
            _ => Err(self.not_found(property)),
        }
    }

    fn set_property(&mut self, property: &str, value: PropertyValue) -> Result<(), CommandError> {
        match property {
            "Name" => self.name = value.into_text(property)?,
            "IsEnabled" => self.enabled = value.into_bool(property)?,
            "Position" => self.transform.position = value.into_vec3(property)?,
            "Rotation" => self.transform.rotation = value.into_vec3(property)?,
            "Scale" => self.transform.scale = value.into_vec3(property)?,
            _ => return Err(self.not_found(property)),
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct Scene {
    pub id: Uuid,
    pub name: String,
    active: bool,
    entities: Vec<EntityRef>,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            active: false,
            entities: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        for entity in &self.entities {
            entity.borrow_mut().active = active;
        }
    }

    pub fn entities(&self) -> &[EntityRef] {
        &self.entities
    }

    pub fn entity_index(&self, id: Uuid) -> Option<usize> {
        self.entities.iter().position(|e| e.borrow().id == id)
    }

    /// Appends when `index` is `None` or past the end.
    pub fn insert_entity(&mut self, entity: EntityRef, index: Option<usize>) {
        debug_assert!(self.entity_index(entity.borrow().id).is_none());
        entity.borrow_mut().active = self.active;
        match index {
            Some(i) if i <= self.entities.len() => self.entities.insert(i, entity),
            _ => self.entities.push(entity),
        }
    }

    pub fn remove_entity(&mut self, id: Uuid) -> Option<(usize, EntityRef)> {
        let index = self.entity_index(id)?;
        let entity = self.entities.remove(index);
        entity.borrow_mut().active = false;
        Some((index, entity))
    }
}

impl Reflect for Scene {
    fn type_name(&self) -> &'static str {
        "Scene"
    }

    fn property(&self, property: &str) -> Result<PropertyValue, CommandError> {
        match property {
            "Name" => Ok(self.name.clone().into()),
            "IsActive" => Ok(self.active.into()),
            _ => Err(self.not_found(property)),
        }
    }

    fn set_property(&mut self, property: &str, value: PropertyValue) -> Result<(), CommandError> {
        match property {
            "Name" => self.name = value.into_text(property)?,
            "IsActive" => {
                let active = value.into_bool(property)?;
                self.set_active(active);
            }
            _ => return Err(self.not_found(property)),
        }
        Ok(())
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.active {
            write!(f, " (active)")?;
        }
        for entity in &self.entities {
            let e = entity.borrow();
            let [x, y, z] = e.transform.position;
            write!(f, "\n  - {}", e.name)?;
            if !e.enabled {
                write!(f, " [disabled]")?;
            }
            write!(f, " @ ({x}, {y}, {z})")?;
        }
        Ok(())
    }
}
