use std::path::Path;

use keeper_core::Variant;

use super::{load_config, render_dockerfile};

pub fn eject(variant: Option<Variant>, force: bool) -> anyhow::Result<()> {
    let config = load_config()?;
    let variant = variant.unwrap_or(config.build.variant);
    let content = render_dockerfile(&config, Some(variant))?;

    let path = keeper_build::eject::eject(Path::new("."), &content, force)?;

    println!("Ejected {variant} Dockerfile to {}", path.display());
    println!("You can now edit it directly.");
    Ok(())
}
