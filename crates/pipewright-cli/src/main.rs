use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use pipewright_core::constants::CONFIG_FILE;
use pipewright_core::{shutdown_channel, PipewrightConfig, Step, TargetRef};
use pipewright_targets::{execute, plan, RunSummary, TargetRegistry};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod builtin;
mod copy;
mod executor;
mod init;
mod notify;
mod styles;

use executor::TaskExecutor;
use styles as s;

/// The command-line interface for Pipewright.
#[derive(Debug, Parser)]
#[command(name = "pw")]
#[command(version)]
#[command(styles = s::clap_styles())]
#[command(
    help_template = "{bin} {version}\n\n{about-with-newline}{usage-heading} {usage}\n\n{all-args}{after-help}"
)]
#[command(about = "Build, serve and test pipelines for web application projects")]
#[command(
    long_about = "Pipewright expands a target into an ordered pipeline of tasks and runs it.
Tasks inside a concurrency group run together; the first failure stops the run.

Targets:
  build:dev         Development build with source maps (alias: dev, default)
  build:dist        Minified build plus a deployable dist/ tree (alias: dist)
  serve:dev         Live-editing server with file watching (alias: liveEdit)
  serve:debug       Server under a process monitor with an inspector attached
  serve:start       Run the already built app (alias: start)
  test:server       Server unit tests
  test:client       Client unit tests
  test:e2e          End-to-end suite against the production build
  init              Write a starter pipewright.toml
"
)]
#[command(
    after_help = "\x1b[1;33mExamples:\x1b[0m\n  \x1b[36mpw\x1b[0m                        \x1b[2m# Same as build:dev\x1b[0m\n  \x1b[36mpw build dist\x1b[0m             \x1b[2m# Production build (shorthand for build:dist)\x1b[0m\n  \x1b[36mpw serve\x1b[0m                  \x1b[2m# Live editing on the dev build\x1b[0m\n  \x1b[36mpw test e2e --plan\x1b[0m        \x1b[2m# Show the e2e pipeline without running it\x1b[0m"
)]
pub(crate) struct Cli {
    /// Target in canonical form (`build:dist`, `serve:dev`, `test:e2e`) or an alias
    command: Option<String>,
    /// Optional key (supports `pw test e2e` style)
    key: Option<String>,
    /// Path to the pipewright config file.
    #[arg(long, default_value = CONFIG_FILE)]
    config: PathBuf,
    /// Print the expanded pipeline and exit without running it.
    #[arg(long, default_value_t = false)]
    plan: bool,
    /// `init`: print the starter config instead of writing it.
    #[arg(long, default_value_t = false)]
    stdout: bool,
    /// `init`: overwrite an existing config file.
    #[arg(long, default_value_t = false)]
    force: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok()))
        .init();

    let cli = Cli::parse();
    debug!("parsed cli arguments: {:?}", cli);

    if cli.command.as_deref() == Some("init") {
        return init::run(&cli);
    }

    let target = target_from(&cli)?;
    let registry = TargetRegistry::standard();
    let steps = plan(&registry, &target);

    if cli.plan {
        print!("{}", render_plan(&registry, &target, &steps));
        return Ok(());
    }

    let cfg = PipewrightConfig::load_from_file(&cli.config)
        .with_context(|| format!("unable to load config '{}'", cli.config.display()))?;
    let cfg = Arc::new(cfg);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    let outcome = runtime.block_on(run_pipeline(Arc::clone(&cfg), &target, &steps));

    notify::report_outcome(&cfg, &target, &outcome);
    let summary = outcome?;
    info!(
        target: "pipewright",
        "{} done: {} step(s) in {:.2?}",
        target.canonical(),
        summary.steps,
        summary.elapsed
    );
    Ok(())
}

/// `RUST_LOG` directives when they parse, INFO otherwise.
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Joins the positional arguments into a target; no command means `default`.
fn target_from(cli: &Cli) -> Result<TargetRef> {
    let text = match (&cli.command, &cli.key) {
        (Some(command), Some(key)) => format!("{command}:{key}"),
        (Some(command), None) => command.clone(),
        (None, _) => "default".to_string(),
    };
    TargetRef::from_str(&text).map_err(|e| anyhow!("failed to parse target '{}': {e}", text))
}

fn render_plan(registry: &TargetRegistry, target: &TargetRef, steps: &[Step]) -> String {
    let mut out = format!(
        "{}:{} ({} step(s))\n",
        target.group,
        registry.resolve_key(target),
        steps.len()
    );
    for step in steps {
        out.push_str(&format!(" - {step}\n"));
    }
    out
}

async fn run_pipeline(
    cfg: Arc<PipewrightConfig>,
    target: &TargetRef,
    steps: &[Step],
) -> Result<RunSummary> {
    let (trigger, keepalive) = shutdown_channel();
    let trigger = Arc::new(trigger);
    let on_signal = Arc::clone(&trigger);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => on_signal.fire(),
            Err(err) => warn!("failed to listen for Ctrl-C: {}", err),
        }
    });

    info!(target: "pipewright", "run {} ({} step(s))", target.canonical(), steps.len());
    let executor = TaskExecutor::new(cfg, keepalive);
    let outcome = execute(steps, &executor).await;
    executor.shutdown().await;
    drop(trigger);

    Ok(outcome?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipewright_core::CommandGroup;

    fn cli(command: Option<&str>, key: Option<&str>) -> Cli {
        Cli {
            command: command.map(str::to_string),
            key: key.map(str::to_string),
            config: PathBuf::from(CONFIG_FILE),
            plan: true,
            stdout: false,
            force: false,
        }
    }

    #[test]
    fn rust_log_replaces_the_default_level() {
        use tracing::level_filters::LevelFilter;

        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(
            log_filter(Some("warn".to_string())).max_level_hint(),
            Some(LevelFilter::WARN)
        );
        assert_eq!(
            log_filter(Some("debug".to_string())).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
    }

    #[test]
    fn no_command_runs_default_build() {
        let target = target_from(&cli(None, None)).unwrap();
        assert_eq!(target.group, CommandGroup::Build);
        assert_eq!(target.canonical(), "build:dev");
    }

    #[test]
    fn positional_key_joins_command() {
        let target = target_from(&cli(Some("test"), Some("e2e"))).unwrap();
        assert_eq!(target.canonical(), "test:e2e");

        let target = target_from(&cli(Some("build:dist"), None)).unwrap();
        assert_eq!(target.canonical(), "build:dist");
    }

    #[test]
    fn aliases_resolve() {
        assert_eq!(target_from(&cli(Some("dist"), None)).unwrap().canonical(), "build:dist");
        assert_eq!(target_from(&cli(Some("start"), None)).unwrap().canonical(), "serve:start");
    }

    #[test]
    fn unknown_group_is_rejected() {
        let err = target_from(&cli(Some("deploy"), None)).expect_err("must fail");
        assert!(err.to_string().contains("deploy"));
    }

    #[test]
    fn plan_lists_inlined_build_steps() {
        let registry = TargetRegistry::standard();
        let target = target_from(&cli(Some("serve"), Some("start"))).unwrap();
        let steps = plan(&registry, &target);

        let rendered = render_plan(&registry, &target, &steps);
        assert!(rendered.starts_with("serve:start (3 step(s))\n"));
        assert!(rendered.contains(" - set-environment:dev\n"));
        assert!(rendered.contains(" - watch-files\n"));
    }

    #[test]
    fn plan_for_serve_dev_inlines_the_build() {
        let registry = TargetRegistry::standard();
        let target = target_from(&cli(Some("serve"), None)).unwrap();
        let rendered = render_plan(&registry, &target, &plan(&registry, &target));

        assert!(rendered.starts_with("serve:dev"));
        assert!(rendered.contains(" - clean:dev\n"));
        assert!(!rendered.contains("build:"));
    }
}
