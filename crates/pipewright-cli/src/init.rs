use std::{fs, path::Path};

use anyhow::{anyhow, Context, Result};
use tracing::{info, instrument};

use crate::Cli;

/// Writes a starter `pipewright.toml` for the standard project layout.
#[instrument(skip(cli))]
pub fn run(cli: &Cli) -> Result<()> {
    if cli.stdout {
        print!("{CONFIG_TEMPLATE}");
        return Ok(());
    }

    write_if_absent(&cli.config, CONFIG_TEMPLATE, cli.force)
        .with_context(|| format!("failed to write '{}'", cli.config.display()))?;

    info!("init complete: config={}", cli.config.display());
    println!("next: run 'pw build:dev'");
    Ok(())
}

fn write_if_absent(output: &Path, content: &str, force: bool) -> Result<()> {
    if output.exists() && !force {
        return Err(anyhow!(
            "'{}' already exists. Re-run with --force to overwrite",
            output.display()
        ));
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory '{}'", parent.display()))?;
    }

    fs::write(output, content)
        .with_context(|| format!("failed to write file '{}'", output.display()))
}

pub(crate) const CONFIG_TEMPLATE: &str = r#"[project]
name = "norman"

[paths]
dev = "dev"
dist = "dist"
module_store = "node_modules"
manifest = "package.json"
production_config = "server/config-prod.json"
report = "test/results/testReport.json"

# Packages named <namespace>...<marker> are client-only and never bundled.
[closure]
namespace = "norman"
marker = "client"

[report]
failure_marker = '"status": "failed"'

[wait]
duration_ms = 5000

[[copy.html]]
cwd = "client"
dest = "dev"
src = ["index.html"]

[[copy.html]]
cwd = "node_modules"
dest = "dev/resources"
src = ["norman*client/**/*.html", "!norman-common-client/**/*.html", "!norman*client/node_modules/**/*.html"]

[[copy.static]]
cwd = "client"
dest = "dev"
src = ["legal/**/*", "assets/**/*", "framing_control.js", "*.{ico,txt}", "!**/*.less"]

[[copy.static]]
cwd = "node_modules"
dest = "dev/resources"
src = ["norman*client/**/*.{pdf,png,gif,jpg,svg,json}"]

[[copy.dist]]
cwd = "dev"
dest = "dist/public"
src = ["**/*"]

[[copy.dist]]
cwd = "server"
dest = "dist/server"
src = ["**/*.js", "errors/*.html", "config/*.json"]

[tasks.compile-styles]
program = "lessc"
args = ["--include-path=.:client", "client/app/app.less", "dev/assets/style.css"]

[tasks.vendor-prefix]
program = "postcss"
args = ["--use", "autoprefixer", "--replace", "dev/assets/style.css"]

[tasks.bundle-script]
program = "browserify"
args = ["client/app/app.js", "--debug", "-o", "dev/assets/bundle.js"]

[tasks.annotate-for-minification]
program = "ng-annotate"
args = ["--add", "-o", "dev/assets/bundle.js", "dev/assets/bundle.js"]

[tasks.extract-source-maps]
program = "sh"
args = ["-c", "exorcist dev/assets/bundle.js.map < dev/assets/bundle.js > dev/assets/bundle.tmp.js && mv dev/assets/bundle.tmp.js dev/assets/bundle.js"]

[tasks.compile-templates]
program = "html2js"
args = ["--module", "templates", "-o", "dev/assets/templates.js", "client/**/*.html"]

[tasks.minify-styles]
program = "cleancss"
args = ["-o", "dev/assets/style.css", "dev/assets/style.css"]

[tasks.minify-scripts]
program = "uglifyjs"
args = ["dev/assets/bundle.js", "--compress", "--mangle", "-o", "dev/assets/bundle.js"]

[tasks.start-server]
program = "node"
args = ["server/app.js"]

[tasks."start-server:prod"]
program = "node"
args = ["dist/server/app.js"]

[tasks.attach-live-editor]
program = "livereload"
args = ["dev"]

[tasks.run-process-monitor]
program = "nodemon"
args = ["--debug", "server/app.js"]

[tasks.attach-inspector]
program = "node-inspector"
args = ["--web-port=8080"]

[tasks.run-server-tests]
program = "mocha"
args = ["--recursive", "server/test"]

[tasks.run-client-tests]
program = "karma"
args = ["start", "test/karma.conf.js", "--single-run"]

[tasks.run-e2e-suite]
program = "protractor"
args = ["test/protractor.conf.js"]

# Without a watcher, watch-files keeps the run alive until Ctrl-C.
# [tasks.watch-files]
# program = "chokidar"
# args = ["client/**/*", "-c", "pw build:liveEdit"]

[notify]
enabled = false
# webhook = "https://hooks.example.com/pipewright"
success = false
"#;
