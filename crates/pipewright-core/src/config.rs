use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::action::ExecutionAction;
use crate::constants::*;

/// The project configuration, loaded once at start-up and never mutated.
#[derive(Debug, Clone, Deserialize)]
pub struct PipewrightConfig {
    pub project: ProjectConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub closure: ClosureConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub wait: WaitConfig,
    #[serde(default)]
    pub copy: CopyConfig,
    #[serde(default)]
    pub tasks: HashMap<String, ExecutionAction>,
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl PipewrightConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let cfg = toml::from_str::<Self>(&text)
            .with_context(|| format!("failed to parse TOML config: {}", path.display()))?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub dev: PathBuf,
    pub dist: PathBuf,
    pub module_store: PathBuf,
    pub manifest: PathBuf,
    pub production_config: PathBuf,
    pub report: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            dev: PathBuf::from(DEV_DIR),
            dist: PathBuf::from(DIST_DIR),
            module_store: PathBuf::from(MODULE_STORE),
            manifest: PathBuf::from(MANIFEST_NODE),
            production_config: PathBuf::from(PRODUCTION_CONFIG),
            report: PathBuf::from(TEST_REPORT),
        }
    }
}

/// Tokens for the client-exclusion predicate: a package is client-only when
/// its name contains `namespace` followed somewhere by `marker`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClosureConfig {
    pub namespace: String,
    pub marker: String,
}

impl Default for ClosureConfig {
    fn default() -> Self {
        Self {
            namespace: CLIENT_NAMESPACE.to_string(),
            marker: CLIENT_MARKER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub failure_marker: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            failure_marker: FAILURE_MARKER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    pub duration_ms: u64,
}

impl WaitConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self { duration_ms: 5000 }
    }
}

/// Static glob file sets for the three copy tasks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CopyConfig {
    #[serde(default)]
    pub html: Vec<FileSet>,
    #[serde(default, rename = "static")]
    pub static_files: Vec<FileSet>,
    #[serde(default)]
    pub dist: Vec<FileSet>,
}

/// Files under `cwd` matching `src` (with `!`-prefixed exclusions) copied to `dest`.
#[derive(Debug, Clone, Deserialize)]
pub struct FileSet {
    #[serde(default)]
    pub cwd: Option<PathBuf>,
    pub dest: PathBuf,
    pub src: Vec<String>,
    #[serde(default)]
    pub flatten: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub enabled: bool,
    pub webhook: Option<String>,
    /// Also notify when the pipeline succeeds.
    pub success: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            webhook: None,
            success: false,
        }
    }
}
