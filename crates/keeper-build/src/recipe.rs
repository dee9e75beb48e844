//! Typed container build recipe.
//!
//! A [`Recipe`] is an ordered list of [`Step`]s. Every `FROM` opens a new
//! stage; rendering emits one Dockerfile instruction per step in order,
//! so the same recipe always renders to the same text.

/// What a `COPY` step brings into the image.
///
/// Used to check layer ordering: dependency manifests must land (and be
/// installed) before the source tree so the dependency layer stays cached
/// across source-only changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Content {
    /// Dependency manifest (`requirements.txt`, a cargo-chef recipe)
    Manifest,
    /// Application source tree
    Source,
    /// Build output from another stage
    Artifact,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Comment(String),
    From {
        image: String,
        alias: Option<String>,
    },
    Workdir(String),
    Env {
        key: String,
        value: String,
    },
    Run(String),
    Copy {
        from: Option<String>,
        src: String,
        dst: String,
        content: Content,
    },
    /// Documentation only; does not publish the port.
    Expose(u16),
    /// Exec form.
    Cmd(Vec<String>),
}

impl Step {
    pub fn copy(src: impl Into<String>, dst: impl Into<String>, content: Content) -> Self {
        Step::Copy {
            from: None,
            src: src.into(),
            dst: dst.into(),
            content,
        }
    }

    pub fn copy_from(
        stage: impl Into<String>,
        src: impl Into<String>,
        dst: impl Into<String>,
    ) -> Self {
        Step::Copy {
            from: Some(stage.into()),
            src: src.into(),
            dst: dst.into(),
            content: Content::Artifact,
        }
    }

    fn render(&self) -> String {
        match self {
            Step::Comment(text) => format!("# {text}"),
            Step::From { image, alias: None } => format!("FROM {image}"),
            Step::From {
                image,
                alias: Some(alias),
            } => format!("FROM {image} AS {alias}"),
            Step::Workdir(dir) => format!("WORKDIR {dir}"),
            Step::Env { key, value } => format!("ENV {key}={}", quote_env(value)),
            Step::Run(command) => format!("RUN {command}"),
            Step::Copy {
                from, src, dst, ..
            } => match from {
                Some(stage) => format!("COPY --from={stage} {src} {dst}"),
                None => format!("COPY {src} {dst}"),
            },
            Step::Expose(port) => format!("EXPOSE {port}"),
            Step::Cmd(args) => {
                let args: Vec<String> = args.iter().map(|a| json_string(a)).collect();
                format!("CMD [{}]", args.join(", "))
            }
        }
    }
}

fn parse_port(value: &str) -> Option<u16> {
    value
        .parse()
        // arch-lint: allow(no-silent-result-drop) reason="a non-numeric --port value means the command names no port we can check"
        .ok()
}

/// Exec-form arguments are JSON strings.
fn json_string(s: &str) -> String {
    serde_json::Value::String(s.to_owned()).to_string()
}

fn quote_env(value: &str) -> String {
    if !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:@,+".contains(c))
    {
        value.to_owned()
    } else {
        json_string(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipe {
    steps: Vec<Step>,
}

impl Recipe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Steps grouped by stage. Leading comments belong to the stage they
    /// introduce.
    pub fn stages(&self) -> Vec<&[Step]> {
        let mut starts: Vec<usize> = Vec::new();
        for (i, step) in self.steps.iter().enumerate() {
            if matches!(step, Step::From { .. }) {
                let mut start = i;
                while start > 0 && matches!(self.steps[start - 1], Step::Comment(_)) {
                    start -= 1;
                }
                starts.push(start);
            }
        }
        starts
            .iter()
            .enumerate()
            .map(|(n, &start)| {
                let end = starts.get(n + 1).copied().unwrap_or(self.steps.len());
                &self.steps[start..end]
            })
            .collect()
    }

    /// The single documented port, if exactly one `EXPOSE` exists.
    pub fn exposed_port(&self) -> Option<u16> {
        let mut ports = self.steps.iter().filter_map(|s| match s {
            Step::Expose(p) => Some(*p),
            _ => None,
        });
        match (ports.next(), ports.next()) {
            (Some(port), None) => Some(port),
            _ => None,
        }
    }

    /// The last `CMD`, which is the one a container runs.
    pub fn command(&self) -> Option<&[String]> {
        self.steps.iter().rev().find_map(|s| match s {
            Step::Cmd(args) => Some(args.as_slice()),
            _ => None,
        })
    }

    /// Port named by the startup command (`--port N` or `--port=N`).
    ///
    /// `None` when the command does not say, e.g. a script that binds
    /// its own port internally.
    pub fn command_port(&self) -> Option<u16> {
        let args = self.command()?;
        args.iter().enumerate().find_map(|(i, arg)| {
            if arg == "--port" {
                args.get(i + 1).and_then(|p| parse_port(p))
            } else {
                arg.strip_prefix("--port=").and_then(parse_port)
            }
        })
    }

    /// Working directory of the final stage.
    pub fn workdir(&self) -> Option<&str> {
        let last: &[Step] = self.stages().last().copied()?;
        last.iter().rev().find_map(|s| match s {
            Step::Workdir(dir) => Some(dir.as_str()),
            _ => None,
        })
    }

    /// Check the structural invariants every recipe must hold.
    pub fn validate(&self) -> Result<(), RecipeError> {
        if !self
            .steps
            .iter()
            .find(|s| !matches!(s, Step::Comment(_)))
            .is_some_and(|s| matches!(s, Step::From { .. }))
        {
            return Err(RecipeError::MissingBase);
        }

        let expose_count = self
            .steps
            .iter()
            .filter(|s| matches!(s, Step::Expose(_)))
            .count();
        if expose_count != 1 {
            return Err(RecipeError::ExposeCount(expose_count));
        }

        if self.command().is_none_or(|args| args.is_empty()) {
            return Err(RecipeError::MissingCommand);
        }

        for (index, stage) in self.stages().into_iter().enumerate() {
            check_stage_order(index, stage)?;
        }

        if let (Some(exposed), Some(command)) = (self.exposed_port(), self.command_port())
            && exposed != command
        {
            return Err(RecipeError::PortMismatch { exposed, command });
        }

        Ok(())
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut previous: Option<&Step> = None;
        for step in &self.steps {
            let opens_block = matches!(step, Step::Comment(_) | Step::From { .. })
                && !matches!(previous, None | Some(Step::Comment(_)));
            if opens_block {
                out.push('\n');
            }
            out.push_str(&step.render());
            out.push('\n');
            previous = Some(step);
        }
        out
    }
}

fn check_stage_order(index: usize, stage: &[Step]) -> Result<(), RecipeError> {
    let position = |wanted: Content| {
        stage.iter().position(|s| {
            matches!(s, Step::Copy { content, .. } if *content == wanted)
        })
    };
    let first_copy = stage.iter().position(|s| matches!(s, Step::Copy { .. }));
    let workdir = stage.iter().position(|s| matches!(s, Step::Workdir(_)));

    if let (Some(workdir), Some(first_copy)) = (workdir, first_copy)
        && workdir > first_copy
    {
        return Err(RecipeError::WorkdirAfterCopy { stage: index });
    }

    if let (Some(manifest), Some(source)) = (position(Content::Manifest), position(Content::Source))
    {
        if source < manifest {
            return Err(RecipeError::SourceBeforeManifest { stage: index });
        }
        // Installing dependencies happens between the two copies.
        if !stage[manifest + 1..source]
            .iter()
            .any(|s| matches!(s, Step::Run(_)))
        {
            return Err(RecipeError::NoInstallBeforeSource { stage: index });
        }
    }

    Ok(())
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RecipeError {
    #[error("recipe must start with a FROM step")]
    MissingBase,

    #[error("recipe must declare exactly one EXPOSE, found {0}")]
    ExposeCount(usize),

    #[error("recipe has no startup command")]
    MissingCommand,

    #[error("stage {stage}: WORKDIR is set after files were already copied")]
    WorkdirAfterCopy { stage: usize },

    #[error("stage {stage}: source tree is copied before the dependency manifest")]
    SourceBeforeManifest { stage: usize },

    #[error("stage {stage}: dependencies are not installed before the source tree is copied")]
    NoInstallBeforeSource { stage: usize },

    #[error("EXPOSE {exposed} does not match the command's --port {command}")]
    PortMismatch { exposed: u16, command: u16 },
}
