//! Line-oriented editing scripts.
//!
//! One instruction per line. Blank lines and lines starting with `#` are
//! skipped. Names containing spaces are written in double quotes:
//!
//! ```text
//! add-scene "Level 1"
//! add-entity "Level 1" Player
//! activate "Level 1"
//! select Player
//! move 1 0 2.5
//! undo
//! history
//! ```

use std::fmt::Write;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context};
use uuid::Uuid;

use crate::model::{EntityRef, SceneRef, TransformField};
use crate::project::Project;
use crate::undo_panel::UndoRedoPanel;

#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    AddScene(String),
    RemoveScene(String),
    RenameScene { from: String, to: String },
    ActivateScene(String),
    AddEntity { scene: String, name: String },
    RemoveEntity(String),
    /// No names clears the selection.
    Select(Vec<String>),
    Rename(String),
    SetEnabled(bool),
    Transform(TransformField, [f32; 3]),
    Undo,
    Redo,
    History,
    Reset,
}

impl FromStr for Instruction {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = tokenize(line)?.into_iter();
        let keyword = tokens.next().ok_or_else(|| anyhow!("empty instruction"))?;
        let args: Vec<String> = tokens.collect();

        let instruction = match keyword.as_str() {
            "add-scene" => {
                let [name] = take_args::<1>(&keyword, args)?;
                Instruction::AddScene(name)
            }
            "remove-scene" => {
                let [name] = take_args::<1>(&keyword, args)?;
                Instruction::RemoveScene(name)
            }
            "rename-scene" => {
                let [from, to] = take_args::<2>(&keyword, args)?;
                Instruction::RenameScene { from, to }
            }
            "activate" => {
                let [name] = take_args::<1>(&keyword, args)?;
                Instruction::ActivateScene(name)
            }
            "add-entity" => {
                let [scene, name] = take_args::<2>(&keyword, args)?;
                Instruction::AddEntity { scene, name }
            }
            "remove-entity" => {
                let [name] = take_args::<1>(&keyword, args)?;
                Instruction::RemoveEntity(name)
            }
            "select" => Instruction::Select(args),
            "rename" => {
                let [name] = take_args::<1>(&keyword, args)?;
                Instruction::Rename(name)
            }
            "enable" | "disable" => {
                let [] = take_args::<0>(&keyword, args)?;
                Instruction::SetEnabled(keyword == "enable")
            }
            "move" | "rotate" | "scale" => {
                let field = match keyword.as_str() {
                    "move" => TransformField::Position,
                    "rotate" => TransformField::Rotation,
                    _ => TransformField::Scale,
                };
                let [x, y, z] = take_args::<3>(&keyword, args)?;
                Instruction::Transform(field, [parse_f32(&x)?, parse_f32(&y)?, parse_f32(&z)?])
            }
            "undo" | "redo" | "history" | "reset" => {
                let [] = take_args::<0>(&keyword, args)?;
                match keyword.as_str() {
                    "undo" => Instruction::Undo,
                    "redo" => Instruction::Redo,
                    "history" => Instruction::History,
                    _ => Instruction::Reset,
                }
            }
            _ => bail!("unknown instruction {keyword:?}"),
        };
        Ok(instruction)
    }
}

fn tokenize(line: &str) -> anyhow::Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let mut token = String::new();
        if c == '"' {
            chars.next();
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some(c) => token.push(c),
                    None => bail!("unterminated quote"),
                }
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                token.push(c);
                chars.next();
            }
        }
        tokens.push(token);
    }
    Ok(tokens)
}

fn take_args<const N: usize>(keyword: &str, args: Vec<String>) -> anyhow::Result<[String; N]> {
    let count = args.len();
    args.try_into()
        .map_err(|_| anyhow!("{keyword} takes {N} argument(s), got {count}"))
}

fn parse_f32(raw: &str) -> anyhow::Result<f32> {
    raw.parse().with_context(|| format!("{raw:?} is not a number"))
}

pub struct Session {
    project: Project,
    panel: UndoRedoPanel,
}

impl Session {
    pub fn new(project: Project) -> Self {
        let panel = UndoRedoPanel::attach(project.history());
        Self { project, panel }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn panel(&self) -> &UndoRedoPanel {
        &self.panel
    }

    /// Returns text to show the user, if the instruction produces any.
    pub fn run_line(&self, line: &str) -> anyhow::Result<Option<String>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let instruction: Instruction = line.parse()?;
        self.execute(instruction)
    }

    /// Stops at the first failing line.
    pub fn run_script(&self, script: &str) -> anyhow::Result<String> {
        let mut output = String::new();
        for (i, line) in script.lines().enumerate() {
            let out = self
                .run_line(line)
                .with_context(|| format!("line {}: {}", i + 1, line.trim()))?;
            if let Some(out) = out {
                output.push_str(&out);
                if !out.ends_with('\n') {
                    output.push('\n');
                }
            }
        }
        Ok(output)
    }

    pub fn execute(&self, instruction: Instruction) -> anyhow::Result<Option<String>> {
        log::debug!("{instruction:?}");
        let project = &self.project;
        match instruction {
            Instruction::AddScene(name) => {
                project.add_scene(&name)?;
            }
            Instruction::RemoveScene(name) => {
                let id = scene_id(&self.scene(&name)?);
                project.remove_scene(id)?;
            }
            Instruction::RenameScene { from, to } => {
                let id = scene_id(&self.scene(&from)?);
                project.rename_scene(id, &to)?;
            }
            Instruction::ActivateScene(name) => {
                let id = scene_id(&self.scene(&name)?);
                project.set_active_scene(id)?;
            }
            Instruction::AddEntity { scene, name } => {
                let id = scene_id(&self.scene(&scene)?);
                project.add_entity(id, &name)?;
            }
            Instruction::RemoveEntity(name) => {
                let id = entity_id(&self.entity(&name)?);
                project.remove_entity(id)?;
            }
            Instruction::Select(names) => {
                let ids = names
                    .iter()
                    .map(|name| self.entity(name).map(|e| entity_id(&e)))
                    .collect::<anyhow::Result<Vec<_>>>()?;
                project.select(ids);
            }
            Instruction::Rename(name) => project.rename_selected(&name)?,
            Instruction::SetEnabled(enabled) => project.set_selected_enabled(enabled)?,
            Instruction::Transform(field, value) => project.set_selected_transform(field, value)?,
            Instruction::Undo => {
                if !project.undo()? {
                    return Ok(Some("nothing to undo".into()));
                }
            }
            Instruction::Redo => {
                if !project.redo()? {
                    return Ok(Some("nothing to redo".into()));
                }
            }
            Instruction::History => return Ok(Some(self.panel.render())),
            Instruction::Reset => project.unload(),
        }
        Ok(None)
    }

    /// Scenes with their entities, then the selection.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Project {}", self.project.name());
        for scene in self.project.scenes() {
            let _ = writeln!(out, "{}", scene.borrow());
        }
        let selected: Vec<String> = self
            .project
            .selected_entities()
            .iter()
            .map(|e| e.borrow().name.clone())
            .collect();
        let _ = writeln!(out, "Selection: [{}]", selected.join(", "));
        out
    }

    fn scene(&self, name: &str) -> anyhow::Result<SceneRef> {
        self.project
            .scene_by_name(name)
            .ok_or_else(|| anyhow!("no scene named {name:?}"))
    }

    fn entity(&self, name: &str) -> anyhow::Result<EntityRef> {
        self.project
            .entity_by_name(name)
            .ok_or_else(|| anyhow!("no entity named {name:?}"))
    }
}

fn scene_id(scene: &SceneRef) -> Uuid {
    scene.borrow().id
}

fn entity_id(entity: &EntityRef) -> Uuid {
    entity.borrow().id
}
