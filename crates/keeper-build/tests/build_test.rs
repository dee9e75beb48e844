use std::collections::BTreeMap;

use keeper_build::dockerfile::DockerfileGenerator;
use keeper_build::eject::{EjectError, eject};
use keeper_build::recipe::{Content, Step};
use keeper_core::{BuildConfig, Variant};
use tempfile::TempDir;

fn config(variant: Variant) -> BuildConfig {
    BuildConfig {
        variant,
        ..Default::default()
    }
}

fn position(steps: &[Step], pred: impl Fn(&Step) -> bool) -> usize {
    steps.iter().position(pred).expect("step present")
}

// ── Variant A: script ──

#[test]
fn script_variant_renders_expected_dockerfile() {
    let config = config(Variant::Script);
    let output = DockerfileGenerator::new(&config, 5777).render().unwrap();

    assert_eq!(
        output,
        "FROM python:3.12-slim\n\
         RUN pip install --upgrade pip\n\
         COPY requirements.txt .\n\
         RUN pip install --no-cache-dir -r requirements.txt\n\
         COPY . .\n\
         EXPOSE 5777\n\
         CMD [\"python3\", \"app.py\"]\n"
    );
}

#[test]
fn script_variant_port_and_command() {
    let config = config(Variant::Script);
    let recipe = DockerfileGenerator::new(&config, 5777).recipe();

    assert_eq!(recipe.exposed_port(), Some(5777));
    assert_eq!(recipe.command().unwrap(), ["python3", "app.py"]);
    assert_eq!(recipe.workdir(), None);
    // The script binds its own port; nothing to cross-check.
    assert_eq!(recipe.command_port(), None);
}

// ── Variant B: asgi ──

#[test]
fn asgi_variant_renders_expected_dockerfile() {
    let config = config(Variant::Asgi);
    let output = DockerfileGenerator::new(&config, 5777).render().unwrap();

    assert_eq!(
        output,
        "FROM python:3.12-slim\n\
         WORKDIR /app\n\
         RUN pip install --upgrade pip\n\
         COPY requirements.txt .\n\
         RUN pip install --no-cache-dir -r requirements.txt\n\
         COPY . .\n\
         EXPOSE 5777\n\
         CMD [\"uvicorn\", \"app:app\", \"--host\", \"0.0.0.0\", \"--port\", \"5777\", \"--reload\"]\n"
    );
}

#[test]
fn asgi_variant_sets_workdir_before_install() {
    let config = config(Variant::Asgi);
    let recipe = DockerfileGenerator::new(&config, 5777).recipe();
    let steps = recipe.steps();

    let workdir = position(steps, |s| matches!(s, Step::Workdir(d) if d == "/app"));
    let install = position(steps, |s| matches!(s, Step::Run(c) if c.contains("-r requirements.txt")));
    assert!(workdir < install);
    assert_eq!(recipe.workdir(), Some("/app"));
}

#[test]
fn asgi_variant_binds_all_interfaces_on_exposed_port() {
    let config = config(Variant::Asgi);
    let recipe = DockerfileGenerator::new(&config, 5777).recipe();
    let command = recipe.command().unwrap();

    assert_eq!(recipe.exposed_port(), Some(5777));
    assert_eq!(recipe.command_port(), Some(5777));
    assert!(command.windows(2).any(|w| w == ["--host", "0.0.0.0"]));
    assert!(command.contains(&"--reload".to_owned()));
}

#[test]
fn asgi_without_reload() {
    let config = BuildConfig {
        reload: false,
        ..config(Variant::Asgi)
    };
    let recipe = DockerfileGenerator::new(&config, 5777).recipe();
    assert!(!recipe.command().unwrap().contains(&"--reload".to_owned()));
}

#[test]
fn asgi_uses_configured_port_everywhere() {
    let config = config(Variant::Asgi);
    let output = DockerfileGenerator::new(&config, 9000).render().unwrap();

    assert!(output.contains("EXPOSE 9000"));
    assert!(output.contains("\"--port\", \"9000\""));
}

// ── Both Python variants ──

#[test]
fn manifest_installed_before_source_copy() {
    for variant in [Variant::Script, Variant::Asgi] {
        let config = config(variant);
        let recipe = DockerfileGenerator::new(&config, 5777).recipe();
        let steps = recipe.steps();

        let manifest = position(steps, |s| {
            matches!(s, Step::Copy { content: Content::Manifest, .. })
        });
        let install = position(steps, |s| matches!(s, Step::Run(c) if c.contains("--no-cache-dir")));
        let source = position(steps, |s| {
            matches!(s, Step::Copy { content: Content::Source, .. })
        });
        assert!(manifest < install, "{variant}");
        assert!(install < source, "{variant}");
    }
}

#[test]
fn exactly_one_expose() {
    for variant in Variant::ALL {
        let config = config(variant);
        let recipe = DockerfileGenerator::new(&config, 5777).recipe();
        let count = recipe
            .steps()
            .iter()
            .filter(|s| matches!(s, Step::Expose(_)))
            .count();
        assert_eq!(count, 1, "{variant}");
        assert!(recipe.validate().is_ok(), "{variant}");
    }
}

#[test]
fn rendering_is_deterministic() {
    for variant in Variant::ALL {
        let mut config = config(variant);
        config.env = BTreeMap::from([
            ("B_VAR".to_owned(), "2".to_owned()),
            ("A_VAR".to_owned(), "1".to_owned()),
        ]);
        let first = DockerfileGenerator::new(&config, 5777).render().unwrap();
        let second = DockerfileGenerator::new(&config, 5777).render().unwrap();
        assert_eq!(first, second, "{variant}");
    }
}

#[test]
fn nested_manifest_installed_by_base_name() {
    let config = BuildConfig {
        manifest: "requirements/prod.txt".to_owned(),
        ..config(Variant::Script)
    };
    let output = DockerfileGenerator::new(&config, 5777).render().unwrap();

    assert!(output.contains("COPY requirements/prod.txt .\n"));
    assert!(output.contains("pip install --no-cache-dir -r prod.txt\n"));
}

#[test]
fn env_directives_are_sorted() {
    let config = BuildConfig {
        env: BTreeMap::from([
            ("ZED".to_owned(), "last".to_owned()),
            ("ALPHA".to_owned(), "first value".to_owned()),
        ]),
        ..config(Variant::Asgi)
    };
    let output = DockerfileGenerator::new(&config, 5777).render().unwrap();

    let alpha = output.find("ENV ALPHA=\"first value\"").unwrap();
    let zed = output.find("ENV ZED=last").unwrap();
    let install = output.find("pip install --upgrade").unwrap();
    assert!(alpha < zed);
    assert!(zed < install);
}

#[test]
fn custom_base_image() {
    let config = BuildConfig {
        base_image: "python:3.11-alpine".to_owned(),
        ..config(Variant::Asgi)
    };
    let output = DockerfileGenerator::new(&config, 5777).render().unwrap();
    assert!(output.starts_with("FROM python:3.11-alpine\n"));
}

// ── Native variant ──

#[test]
fn native_variant_contains_cargo_chef_stages() {
    let config = config(Variant::Native);
    let output = DockerfileGenerator::new(&config, 5777).render().unwrap();

    assert!(output.contains("Stage 1: Planner"));
    assert!(output.contains("Stage 2: Cacher"));
    assert!(output.contains("Stage 3: Builder"));
    assert!(output.contains("Stage 4: Runtime"));
    assert!(output.contains("FROM rust:1.85-bookworm AS chef"));
    assert!(output.contains("cargo chef prepare"));
    assert!(output.contains("cargo chef cook --release"));
    assert!(output.contains("cargo build --release --bin keeper"));
    assert!(output.contains("FROM gcr.io/distroless/cc-debian12\n"));
    assert!(output.contains("COPY --from=builder /app/target/release/keeper /usr/local/bin/keeper"));
}

#[test]
fn native_variant_serves_on_exposed_port() {
    let config = config(Variant::Native);
    let recipe = DockerfileGenerator::new(&config, 5777).recipe();

    assert_eq!(recipe.stages().len(), 5);
    assert_eq!(recipe.exposed_port(), Some(5777));
    assert_eq!(recipe.command_port(), Some(5777));
    assert_eq!(recipe.command().unwrap()[..2], ["keeper", "serve"]);
    assert_eq!(recipe.workdir(), Some("/app"));
}

// ── Eject ──

#[test]
fn eject_writes_dockerfile() {
    let tmp = TempDir::new().unwrap();
    let config = config(Variant::Asgi);
    let content = DockerfileGenerator::new(&config, 5777).render().unwrap();

    assert!(!tmp.path().join("Dockerfile").exists());
    let path = eject(tmp.path(), &content, false).unwrap();

    assert_eq!(path, tmp.path().join("Dockerfile"));
    assert!(path.exists());
    assert_eq!(std::fs::read_to_string(path).unwrap(), content);
}

#[test]
fn eject_refuses_to_overwrite() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("Dockerfile"), "FROM scratch\n").unwrap();

    let result = eject(tmp.path(), "FROM python\n", false);

    assert!(matches!(result, Err(EjectError::AlreadyEjected(_))));
    assert_eq!(
        std::fs::read_to_string(tmp.path().join("Dockerfile")).unwrap(),
        "FROM scratch\n"
    );
}

#[test]
fn eject_force_overwrites() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("Dockerfile"), "FROM scratch\n").unwrap();

    eject(tmp.path(), "FROM python\n", true).unwrap();

    assert_eq!(
        std::fs::read_to_string(tmp.path().join("Dockerfile")).unwrap(),
        "FROM python\n"
    );
}

#[test]
fn eject_creates_missing_directory() {
    let tmp = TempDir::new().unwrap();
    let nested = tmp.path().join("deploy/docker");

    eject(&nested, "FROM python\n", false).unwrap();

    assert!(nested.join("Dockerfile").exists());
}
