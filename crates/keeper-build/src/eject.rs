use std::path::{Path, PathBuf};

pub const DOCKERFILE: &str = "Dockerfile";

/// Writes a rendered Dockerfile into the project directory.
///
/// Refuses to replace an existing Dockerfile unless `force` is set, so
/// hand edits are not lost by accident.
pub fn eject(project_dir: &Path, dockerfile_content: &str, force: bool) -> Result<PathBuf, EjectError> {
    std::fs::create_dir_all(project_dir).map_err(|e| EjectError::CreateDir {
        path: project_dir.to_path_buf(),
        source: e,
    })?;

    let dockerfile_path = project_dir.join(DOCKERFILE);
    if dockerfile_path.exists() && !force {
        return Err(EjectError::AlreadyEjected(dockerfile_path));
    }

    std::fs::write(&dockerfile_path, dockerfile_content).map_err(|e| EjectError::Write {
        path: dockerfile_path.clone(),
        source: e,
    })?;

    tracing::info!(path = %dockerfile_path.display(), "Dockerfile written");
    Ok(dockerfile_path)
}

#[derive(Debug, thiserror::Error)]
pub enum EjectError {
    #[error("failed to create directory {path}")]
    CreateDir {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("Dockerfile already exists at {0}; edit it directly or pass --force to overwrite")]
    AlreadyEjected(std::path::PathBuf),
    #[error("failed to write {path}")]
    Write {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}
