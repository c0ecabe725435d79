//! Single-property snapshot commands.
//!
//! [`PropertySnapshot`] looks the property up by name when it runs, so a bad
//! name or value only surfaces on undo/redo. [`PropertyCommand`] binds the
//! accessor at construction and cannot miss.

use std::cell::RefCell;
use std::rc::Rc;

use crate::command::{validate_name, Command};
use crate::error::{CommandError, Result};

#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Vec3([f32; 3]),
}

impl PropertyValue {
    pub fn kind(&self) -> &'static str {
        match self {
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Int(_) => "int",
            PropertyValue::Float(_) => "float",
            PropertyValue::Text(_) => "text",
            PropertyValue::Vec3(_) => "vec3",
        }
    }

    pub fn into_bool(self, property: &str) -> Result<bool> {
        match self {
            PropertyValue::Bool(v) => Ok(v),
            other => Err(other.mismatch(property, "bool")),
        }
    }

    pub fn into_int(self, property: &str) -> Result<i64> {
        match self {
            PropertyValue::Int(v) => Ok(v),
            other => Err(other.mismatch(property, "int")),
        }
    }

    /// Ints widen to floats; nothing else converts.
    pub fn into_float(self, property: &str) -> Result<f64> {
        match self {
            PropertyValue::Float(v) => Ok(v),
            PropertyValue::Int(v) => Ok(v as f64),
            other => Err(other.mismatch(property, "float")),
        }
    }

    pub fn into_text(self, property: &str) -> Result<String> {
        match self {
            PropertyValue::Text(v) => Ok(v),
            other => Err(other.mismatch(property, "text")),
        }
    }

    pub fn into_vec3(self, property: &str) -> Result<[f32; 3]> {
        match self {
            PropertyValue::Vec3(v) => Ok(v),
            other => Err(other.mismatch(property, "vec3")),
        }
    }

    fn mismatch(&self, property: &str, expected: &'static str) -> CommandError {
        CommandError::TypeMismatch {
            property: property.to_string(),
            expected,
            found: self.kind(),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Float(v)
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Text(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Text(v.to_string())
    }
}

impl From<[f32; 3]> for PropertyValue {
    fn from(v: [f32; 3]) -> Self {
        PropertyValue::Vec3(v)
    }
}

/// Name-based property access for snapshot commands.
pub trait Reflect {
    fn type_name(&self) -> &'static str;

    fn property(&self, property: &str) -> Result<PropertyValue>;

    fn set_property(&mut self, property: &str, value: PropertyValue) -> Result<()>;

    fn not_found(&self, property: &str) -> CommandError {
        CommandError::PropertyNotFound {
            type_name: self.type_name(),
            property: property.to_string(),
        }
    }
}

pub struct PropertySnapshot {
    name: String,
    property: String,
    target: Rc<RefCell<dyn Reflect>>,
    undo_value: PropertyValue,
    redo_value: PropertyValue,
}

impl PropertySnapshot {
    pub fn new(
        property: impl Into<String>,
        target: Rc<RefCell<dyn Reflect>>,
        undo_value: impl Into<PropertyValue>,
        redo_value: impl Into<PropertyValue>,
        name: impl Into<String>,
    ) -> Result<Self> {
        let name = validate_name(name.into())?;
        Ok(Self {
            name,
            property: property.into(),
            target,
            undo_value: undo_value.into(),
            redo_value: redo_value.into(),
        })
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    fn assign(&self, value: &PropertyValue) -> Result<()> {
        let mut target = self
            .target
            .try_borrow_mut()
            .map_err(|_| CommandError::TargetInUse {
                property: self.property.clone(),
            })?;
        target.set_property(&self.property, value.clone())
    }
}

impl Command for PropertySnapshot {
    fn name(&self) -> &str {
        &self.name
    }

    fn undo(&mut self) -> Result<()> {
        self.assign(&self.undo_value)
    }

    fn redo(&mut self) -> Result<()> {
        self.assign(&self.redo_value)
    }
}

/// Compile-time bound accessor pair.
pub struct Property<T, V> {
    name: &'static str,
    get: fn(&T) -> V,
    set: fn(&mut T, V),
}

impl<T, V> Clone for Property<T, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, V> Copy for Property<T, V> {}

impl<T, V> Property<T, V> {
    pub const fn new(name: &'static str, get: fn(&T) -> V, set: fn(&mut T, V)) -> Self {
        Self { name, get, set }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get(&self, target: &T) -> V {
        (self.get)(target)
    }

    pub fn set(&self, target: &mut T, value: V) {
        (self.set)(target, value)
    }
}

pub struct PropertyCommand<T, V> {
    name: String,
    target: Rc<RefCell<T>>,
    property: Property<T, V>,
    undo_value: V,
    redo_value: V,
}

impl<T, V: Clone> PropertyCommand<T, V> {
    pub fn new(
        name: impl Into<String>,
        target: Rc<RefCell<T>>,
        property: Property<T, V>,
        undo_value: V,
        redo_value: V,
    ) -> Result<Self> {
        let name = validate_name(name.into())?;
        Ok(Self {
            name,
            target,
            property,
            undo_value,
            redo_value,
        })
    }

    /// Performs the forward edit and returns the command that reverses it.
    pub fn apply(
        name: impl Into<String>,
        target: Rc<RefCell<T>>,
        property: Property<T, V>,
        value: V,
    ) -> Result<Self> {
        let name = validate_name(name.into())?;
        let undo_value = {
            let mut object = target.try_borrow_mut().map_err(|_| CommandError::TargetInUse {
                property: property.name().to_string(),
            })?;
            let old = property.get(&object);
            property.set(&mut object, value.clone());
            old
        };
        Self::new(name, target, property, undo_value, value)
    }

    fn assign(&self, value: V) -> Result<()> {
        let mut object = self
            .target
            .try_borrow_mut()
            .map_err(|_| CommandError::TargetInUse {
                property: self.property.name().to_string(),
            })?;
        self.property.set(&mut object, value);
        Ok(())
    }
}

impl<T, V: Clone> Command for PropertyCommand<T, V> {
    fn name(&self) -> &str {
        &self.name
    }

    fn undo(&mut self) -> Result<()> {
        self.assign(self.undo_value.clone())
    }

    fn redo(&mut self) -> Result<()> {
        self.assign(self.redo_value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Light {
        label: String,
        on: bool,
    }

    impl Reflect for Light {
        fn type_name(&self) -> &'static str {
            "Light"
        }

        fn property(&self, property: &str) -> Result<PropertyValue> {
            match property {
                "label" => Ok(self.label.clone().into()),
                "on" => Ok(self.on.into()),
                _ => Err(self.not_found(property)),
            }
        }

        fn set_property(&mut self, property: &str, value: PropertyValue) -> Result<()> {
            match property {
                "label" => self.label = value.into_text(property)?,
                "on" => self.on = value.into_bool(property)?,
                _ => return Err(self.not_found(property)),
            }
            Ok(())
        }
    }

    fn label_of(light: &Light) -> String {
        light.label.clone()
    }

    fn set_label(light: &mut Light, label: String) {
        light.label = label;
    }

    const LABEL: Property<Light, String> = Property::new("label", label_of, set_label);

    #[test]
    fn test_snapshot_sets_old_and_new_values() {
        let light = Rc::new(RefCell::new(Light::default()));
        light.borrow_mut().on = true;
        let mut command = PropertySnapshot::new("on", light.clone(), false, true, "Switch on").unwrap();

        command.undo().unwrap();
        assert!(!light.borrow().on);
        command.redo().unwrap();
        assert!(light.borrow().on);
        assert_eq!(light.borrow().property("on").unwrap(), PropertyValue::Bool(true));
    }

    #[test]
    fn test_snapshot_unknown_property_fails_on_execution() {
        let light = Rc::new(RefCell::new(Light::default()));
        let mut command =
            PropertySnapshot::new("brightness", light.clone(), 0.0, 1.0, "Dim").unwrap();

        match command.undo() {
            Err(CommandError::PropertyNotFound { type_name, property }) => {
                assert_eq!(type_name, "Light");
                assert_eq!(property, "brightness");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_snapshot_wrong_type_fails_on_execution() {
        let light = Rc::new(RefCell::new(Light::default()));
        let mut command = PropertySnapshot::new("on", light, "yes", "no", "Toggle").unwrap();

        assert!(matches!(
            command.redo(),
            Err(CommandError::TypeMismatch { expected: "bool", found: "text", .. })
        ));
    }

    #[test]
    fn test_snapshot_reports_borrowed_target() {
        let light = Rc::new(RefCell::new(Light::default()));
        let mut command = PropertySnapshot::new("on", light.clone(), false, true, "Toggle").unwrap();

        let _guard = light.borrow();
        assert!(matches!(command.redo(), Err(CommandError::TargetInUse { .. })));
    }

    #[test]
    fn test_int_widens_to_float() {
        assert_eq!(PropertyValue::Int(3).into_float("x").unwrap(), 3.0);
        assert!(PropertyValue::Float(3.0).into_int("x").is_err());
    }

    #[test]
    fn test_typed_property_apply_and_revert() {
        let light = Rc::new(RefCell::new(Light {
            label: "Lamp".into(),
            on: false,
        }));
        let mut command =
            PropertyCommand::apply("Rename light", light.clone(), LABEL, "Sun".to_string()).unwrap();
        assert_eq!(light.borrow().label, "Sun");

        command.undo().unwrap();
        assert_eq!(light.borrow().label, "Lamp");
        command.redo().unwrap();
        assert_eq!(light.borrow().label, "Sun");
    }
}
