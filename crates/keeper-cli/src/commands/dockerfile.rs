use std::path::PathBuf;

use anyhow::Context;
use keeper_core::Variant;

use super::{load_config, render_dockerfile};

pub fn dockerfile(variant: Option<Variant>, output: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config()?;
    let content = render_dockerfile(&config, variant)?;

    match output {
        Some(path) => {
            std::fs::write(&path, &content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => print!("{content}"),
    }
    Ok(())
}
