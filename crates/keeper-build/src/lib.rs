//! Container recipe generation and eject for keeper.
//!
//! # Recipe
//!
//! ```text
//! keeper dockerfile
//!   1. Config     ── keeper.toml [build] (variant, images, manifest)
//!   2. Recipe     ── DockerfileGenerator::recipe()  → ordered Steps
//!   3. Validate   ── one EXPOSE, manifest before source, port match
//!   4. Render     ── Recipe::render() → Dockerfile text
//! ```
//!
//! # Variants
//!
//! - **script**: `python3 app.py`, default working directory
//! - **asgi**: `WORKDIR /app`, `uvicorn app:app --host 0.0.0.0 --port <port> --reload`
//! - **native**: cargo-chef multi-stage build of the keeper binary

pub mod dockerfile;
pub mod eject;
pub mod recipe;

pub use dockerfile::DockerfileGenerator;
pub use recipe::{Content, Recipe, RecipeError, Step};
