use std::path::Path;

use keeper_core::{BuildConfig, Variant};

use crate::recipe::{Content, Recipe, RecipeError, Step};

/// Address the containerized server binds to.
pub const CONTAINER_HOST: &str = "0.0.0.0";

/// Binary name produced by the native variant.
pub const NATIVE_BINARY: &str = "keeper";

/// Generates the container recipe for the configured variant.
pub struct DockerfileGenerator<'a> {
    config: &'a BuildConfig,
    port: u16,
}

impl<'a> DockerfileGenerator<'a> {
    pub fn new(config: &'a BuildConfig, port: u16) -> Self {
        Self { config, port }
    }

    pub fn recipe(&self) -> Recipe {
        match self.config.variant {
            Variant::Script => self.python(None, self.script_command()),
            Variant::Asgi => self.python(Some(&self.config.workdir), self.asgi_command()),
            Variant::Native => self.native(),
        }
    }

    /// Render after checking the recipe's invariants.
    pub fn render(&self) -> Result<String, RecipeError> {
        let recipe = self.recipe();
        recipe.validate()?;
        tracing::debug!(
            variant = %self.config.variant,
            steps = recipe.steps().len(),
            "rendered Dockerfile"
        );
        Ok(recipe.render())
    }

    // ── Python variants ──

    fn python(&self, workdir: Option<&str>, command: Vec<String>) -> Recipe {
        let manifest = &self.config.manifest;
        // COPY <manifest> . lands the file under its base name.
        let installed = Path::new(manifest)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(manifest);

        let mut recipe = Recipe::new().step(Step::From {
            image: self.config.base_image.clone(),
            alias: None,
        });
        if let Some(dir) = workdir {
            recipe = recipe.step(Step::Workdir(dir.to_owned()));
        }
        recipe = self.with_env(recipe);

        recipe
            .step(Step::Run("pip install --upgrade pip".to_owned()))
            .step(Step::copy(manifest.as_str(), ".", Content::Manifest))
            .step(Step::Run(format!(
                "pip install --no-cache-dir -r {installed}"
            )))
            .step(Step::copy(".", ".", Content::Source))
            .step(Step::Expose(self.port))
            .step(Step::Cmd(command))
    }

    fn script_command(&self) -> Vec<String> {
        vec!["python3".to_owned(), self.config.script.clone()]
    }

    fn asgi_command(&self) -> Vec<String> {
        let mut command = vec![
            "uvicorn".to_owned(),
            self.config.app_target.clone(),
            "--host".to_owned(),
            CONTAINER_HOST.to_owned(),
            "--port".to_owned(),
            self.port.to_string(),
        ];
        if self.config.reload {
            command.push("--reload".to_owned());
        }
        command
    }

    // ── Native variant ──

    fn native(&self) -> Recipe {
        let recipe = Recipe::new()
            .step(Step::Comment("=== Base: cargo-chef installed once ===".to_owned()))
            .step(Step::From {
                image: self.config.builder_image.clone(),
                alias: Some("chef".to_owned()),
            })
            .step(Step::Run(format!(
                "cargo install cargo-chef --version {} --locked",
                self.config.cargo_chef_version
            )))
            .step(Step::Workdir("/app".to_owned()))
            .step(Step::Comment("=== Stage 1: Planner ===".to_owned()))
            .step(Step::From {
                image: "chef".to_owned(),
                alias: Some("planner".to_owned()),
            })
            .step(Step::copy(".", ".", Content::Source))
            .step(Step::Run(
                "cargo chef prepare --recipe-path recipe.json".to_owned(),
            ))
            .step(Step::Comment(
                "=== Stage 2: Cacher (dependency build) ===".to_owned(),
            ))
            .step(Step::From {
                image: "chef".to_owned(),
                alias: Some("cacher".to_owned()),
            })
            .step(Step::Copy {
                from: Some("planner".to_owned()),
                src: "/app/recipe.json".to_owned(),
                dst: "recipe.json".to_owned(),
                content: Content::Manifest,
            })
            .step(Step::Run(
                "cargo chef cook --release --recipe-path recipe.json".to_owned(),
            ))
            .step(Step::Comment("=== Stage 3: Builder ===".to_owned()))
            .step(Step::From {
                image: "chef".to_owned(),
                alias: Some("builder".to_owned()),
            })
            .step(Step::copy_from("cacher", "/app/target", "target"))
            .step(Step::copy_from(
                "cacher",
                "/usr/local/cargo",
                "/usr/local/cargo",
            ))
            .step(Step::copy(".", ".", Content::Source))
            .step(Step::Run(format!(
                "cargo build --release --bin {NATIVE_BINARY}"
            )))
            .step(Step::Comment("=== Stage 4: Runtime ===".to_owned()))
            .step(Step::From {
                image: self.config.runtime_image.clone(),
                alias: None,
            })
            .step(Step::Workdir("/app".to_owned()));

        self.with_env(recipe)
            .step(Step::copy_from(
                "builder",
                format!("/app/target/release/{NATIVE_BINARY}"),
                format!("/usr/local/bin/{NATIVE_BINARY}"),
            ))
            .step(Step::copy("static", "./static", Content::Source))
            .step(Step::Expose(self.port))
            .step(Step::Cmd(vec![
                NATIVE_BINARY.to_owned(),
                "serve".to_owned(),
                "--host".to_owned(),
                CONTAINER_HOST.to_owned(),
                "--port".to_owned(),
                self.port.to_string(),
            ]))
    }

    fn with_env(&self, recipe: Recipe) -> Recipe {
        self.config.env.iter().fold(recipe, |recipe, (key, value)| {
            recipe.step(Step::Env {
                key: key.clone(),
                value: value.clone(),
            })
        })
    }
}
