use std::io::Read;

use anyhow::Context;
use savage_editor::{EditorConfig, Project, Session};

fn read_script() -> anyhow::Result<String> {
    match std::env::args().nth(1) {
        Some(path) if path != "-" => {
            std::fs::read_to_string(&path).with_context(|| format!("failed to read {path}"))
        }
        _ => {
            let mut script = String::new();
            std::io::stdin()
                .read_to_string(&mut script)
                .context("failed to read stdin")?;
            Ok(script)
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let config = EditorConfig::from_env()?;
    let session = Session::new(Project::new(config.project_name, config.history));

    let script = read_script()?;
    let output = session.run_script(&script)?;
    print!("{output}");

    println!("{}", session.describe());
    print!("{}", session.panel().render());
    Ok(())
}
