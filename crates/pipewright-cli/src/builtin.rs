//! Tasks carried out in-process rather than by an external program.

use std::io::ErrorKind;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use pipewright_closure::{resolve, ClientFilter, ModuleStore, PackageManifest};
use pipewright_core::config::PathsConfig;
use pipewright_core::constants::{DEPLOYED_CONFIG, MODULE_STORE};
use pipewright_core::{FileSet, PipewrightConfig};
use pipewright_targets::LIVE_EDIT_KEYS;
use tracing::{debug, info, instrument};

use crate::copy;

/// Removes build output. Live-editing targets only touch the dev tree.
#[instrument(skip(paths))]
pub async fn clean(paths: &PathsConfig, target: &str) -> Result<()> {
    let mut dirs = vec![&paths.dev];
    if !LIVE_EDIT_KEYS.contains(&target) {
        dirs.push(&paths.dist);
    }

    for dir in dirs {
        match tokio::fs::remove_dir_all(dir).await {
            Ok(()) => info!("removed {}", dir.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("{} does not exist", dir.display())
            }
            Err(err) => {
                return Err(err).with_context(|| format!("failed to remove '{}'", dir.display()))
            }
        }
    }
    Ok(())
}

pub async fn install_production_config(paths: &PathsConfig) -> Result<()> {
    let target = paths.dist.join(DEPLOYED_CONFIG);
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create directory '{}'", parent.display()))?;
    }
    tokio::fs::copy(&paths.production_config, &target)
        .await
        .with_context(|| {
            format!(
                "failed to install '{}' as '{}'",
                paths.production_config.display(),
                target.display()
            )
        })?;
    info!("installed production config at {}", target.display());
    Ok(())
}

/// Assembles the deployable tree: configured dist file sets, the server
/// dependency closure and the root manifest.
#[instrument(skip_all, fields(dist = %cfg.paths.dist.display()))]
pub fn copy_dist(cfg: &PipewrightConfig) -> Result<()> {
    let paths = &cfg.paths;
    let copied = copy::copy_sets(&cfg.copy.dist)?;
    debug!("copied {} dist file(s)", copied);

    let root = PackageManifest::load(&paths.manifest)?;
    let store = ModuleStore::new(&paths.module_store);
    let closure = resolve(&root, &store, &ClientFilter::from(&cfg.closure))?;
    info!("bundling {} server package(s)", closure.len());

    let modules = FileSet {
        cwd: Some(store.root().to_path_buf()),
        dest: paths.dist.join(MODULE_STORE),
        src: closure.into_globs(),
        flatten: false,
    };
    let copied = copy::copy_set(&modules)?;
    debug!("copied {} module file(s)", copied);

    copy_manifest(&paths.manifest, &paths.dist)
}

fn copy_manifest(manifest: &Path, dist: &Path) -> Result<()> {
    let name = manifest
        .file_name()
        .ok_or_else(|| anyhow!("invalid manifest path '{}'", manifest.display()))?;
    std::fs::create_dir_all(dist)
        .with_context(|| format!("failed to create directory '{}'", dist.display()))?;
    std::fs::copy(manifest, dist.join(name))
        .with_context(|| format!("failed to copy '{}'", manifest.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipewright_core::config::ProjectConfig;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn paths_in(root: &Path) -> PathsConfig {
        PathsConfig {
            dev: root.join("dev"),
            dist: root.join("dist"),
            module_store: root.join("node_modules"),
            manifest: root.join("package.json"),
            production_config: root.join("server/config-prod.json"),
            report: root.join("test/results/testReport.json"),
        }
    }

    fn config_in(root: &Path) -> PipewrightConfig {
        PipewrightConfig {
            project: ProjectConfig {
                name: "norman".to_string(),
            },
            paths: paths_in(root),
            closure: Default::default(),
            report: Default::default(),
            wait: Default::default(),
            copy: Default::default(),
            tasks: Default::default(),
            notify: Default::default(),
        }
    }

    fn write(path: PathBuf, body: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[tokio::test]
    async fn live_edit_clean_keeps_dist() {
        let dir = tempdir().unwrap();
        let paths = paths_in(dir.path());
        write(paths.dev.join("app.js"), "");
        write(paths.dist.join("app.js"), "");

        clean(&paths, "liveEdit").await.unwrap();
        assert!(!paths.dev.exists());
        assert!(paths.dist.exists());

        clean(&paths, "dist").await.unwrap();
        assert!(!paths.dist.exists());
    }

    #[tokio::test]
    async fn clean_tolerates_missing_directories() {
        let dir = tempdir().unwrap();
        clean(&paths_in(dir.path()), "dist").await.unwrap();
    }

    #[tokio::test]
    async fn installs_production_config_verbatim() {
        let dir = tempdir().unwrap();
        let paths = paths_in(dir.path());
        write(paths.production_config.clone(), r#"{ "http": { "port": 80 } }"#);

        install_production_config(&paths).await.unwrap();
        let installed = fs::read_to_string(paths.dist.join("server/config.json")).unwrap();
        assert_eq!(installed, r#"{ "http": { "port": 80 } }"#);
    }

    #[tokio::test]
    async fn missing_production_config_fails() {
        let dir = tempdir().unwrap();
        assert!(install_production_config(&paths_in(dir.path())).await.is_err());
    }

    #[test]
    fn copy_dist_bundles_server_closure() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let cfg = config_in(root);

        write(
            root.join("package.json"),
            r#"{ "name": "norman", "dependencies": { "norman-auth-server": "*", "norman-client-tp": "*" } }"#,
        );
        write(
            root.join("node_modules/norman-auth-server/package.json"),
            r#"{ "name": "norman-auth-server", "dependencies": { "passport": "*" } }"#,
        );
        write(root.join("node_modules/norman-auth-server/lib/index.js"), "");
        write(root.join("node_modules/passport/package.json"), "{}");
        write(root.join("node_modules/norman-client-tp/index.js"), "");

        copy_dist(&cfg).expect("copy-dist should succeed");

        let dist = root.join("dist");
        assert!(dist.join("package.json").is_file());
        assert!(dist.join("node_modules/norman-auth-server/lib/index.js").is_file());
        assert!(dist.join("node_modules/passport/package.json").is_file());
        assert!(!dist.join("node_modules/norman-client-tp").exists());
    }

    #[test]
    fn copy_dist_fails_on_uninstalled_dependency() {
        let dir = tempdir().unwrap();
        let cfg = config_in(dir.path());
        write(
            dir.path().join("package.json"),
            r#"{ "name": "norman", "dependencies": { "norman-auth-server": "*" } }"#,
        );

        let err = copy_dist(&cfg).expect_err("missing module must fail");
        assert!(format!("{err:#}").contains("norman-auth-server"));
    }
}
