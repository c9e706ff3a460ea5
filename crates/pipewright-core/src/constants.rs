//! Constants used across the Pipewright workspace.

/// The filename for Pipewright's primary configuration.
pub const CONFIG_FILE: &str = "pipewright.toml";

/// The manifest file read for the root project and every installed package.
pub const MANIFEST_NODE: &str = "package.json";

/// Default directory holding installed packages, addressable by name.
pub const MODULE_STORE: &str = "node_modules";

/// Default output directories for live-editing and distribution builds.
pub const DEV_DIR: &str = "dev";
pub const DIST_DIR: &str = "dist";

/// Production configuration source and its fixed location inside the dist tree.
pub const PRODUCTION_CONFIG: &str = "server/config-prod.json";
pub const DEPLOYED_CONFIG: &str = "server/config.json";

/// Where the end-to-end runner writes its JSON report.
pub const TEST_REPORT: &str = "test/results/testReport.json";

/// Literal whose presence anywhere in the repaired report fails the run.
pub const FAILURE_MARKER: &str = r#""status": "failed""#;

/// Environment variable set by `set-environment` and `start-server`.
pub const NODE_ENV: &str = "NODE_ENV";

/// Defaults for the client-exclusion predicate.
pub const CLIENT_NAMESPACE: &str = "norman";
pub const CLIENT_MARKER: &str = "client";
