//! Server deployment closure for installed packages.
//!
//! Given the root `package.json`, [`resolve`] lists the installed packages a
//! server bundle must carry, as `<name>/**/*` globs relative to the package
//! store. Front-end packages are dropped by the [`ClientFilter`].

use std::path::PathBuf;

use thiserror::Error;

pub mod exclusion;
pub mod manifest;
pub mod resolver;

pub use exclusion::{is_client_package, ClientFilter};
pub use manifest::{DependencyMap, ManifestStore, ModuleStore, PackageManifest};
pub use resolver::{package_glob, resolve, ClosureSet};

#[derive(Debug, Error)]
pub enum ClosureError {
    #[error("missing manifest for '{name}' at {}", path.display())]
    MissingManifest {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid manifest {}", path.display())]
    InvalidManifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
