use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use pipewright_core::constants::MANIFEST_NODE;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::ClosureError;

/// Dependency edges of one kind, in the order the manifest declares them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyMap(Vec<(String, String)>);

impl DependencyMap {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    /// The version range declared for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, range)| range.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, name: String, range: String) {
        match self.0.iter_mut().find(|(candidate, _)| *candidate == name) {
            Some(entry) => entry.1 = range,
            None => self.0.push((name, range)),
        }
    }
}

impl<N: Into<String>, R: Into<String>> FromIterator<(N, R)> for DependencyMap {
    fn from_iter<I: IntoIterator<Item = (N, R)>>(iter: I) -> Self {
        let mut map = Self::default();
        for (name, range) in iter {
            map.insert(name.into(), range.into());
        }
        map
    }
}

impl<'de> Deserialize<'de> for DependencyMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DependencyVisitor;

        impl<'de> Visitor<'de> for DependencyVisitor {
            type Value = DependencyMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of package names to version ranges")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = DependencyMap::default();
                while let Some((name, range)) = access.next_entry::<String, String>()? {
                    map.insert(name, range);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(DependencyVisitor)
    }
}

/// The subset of `package.json` the resolver cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub dependencies: DependencyMap,
    #[serde(default)]
    pub peer_dependencies: DependencyMap,
    #[serde(default)]
    pub dev_dependencies: DependencyMap,
}

impl PackageManifest {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Reads the root project manifest.
    pub fn load(path: &Path) -> Result<Self, ClosureError> {
        read_manifest("root project", path)
    }
}

/// Read-only access to installed package manifests, keyed by package name.
pub trait ManifestStore {
    fn load(&self, name: &str) -> Result<PackageManifest, ClosureError>;
}

/// An on-disk package store where each package lives at `<root>/<name>/`.
#[derive(Debug, Clone)]
pub struct ModuleStore {
    root: PathBuf,
}

impl ModuleStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self, name: &str) -> PathBuf {
        self.root.join(name).join(MANIFEST_NODE)
    }
}

impl ManifestStore for ModuleStore {
    fn load(&self, name: &str) -> Result<PackageManifest, ClosureError> {
        read_manifest(name, &self.manifest_path(name))
    }
}

impl ManifestStore for HashMap<String, PackageManifest> {
    fn load(&self, name: &str) -> Result<PackageManifest, ClosureError> {
        self.get(name)
            .cloned()
            .ok_or_else(|| ClosureError::MissingManifest {
                name: name.to_string(),
                path: PathBuf::from(name),
                source: io::Error::new(io::ErrorKind::NotFound, "package is not installed"),
            })
    }
}

fn read_manifest(name: &str, path: &Path) -> Result<PackageManifest, ClosureError> {
    let text = std::fs::read_to_string(path).map_err(|source| ClosureError::MissingManifest {
        name: name.to_string(),
        path: path.to_path_buf(),
        source,
    })?;
    PackageManifest::from_json(&text).map_err(|source| ClosureError::InvalidManifest {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dependency_kinds_in_declaration_order() {
        let manifest = PackageManifest::from_json(
            r#"{
                "name": "norman-app",
                "version": "1.2.0",
                "dependencies": { "zeta": "^1.0.0", "alpha": "~2.0.0" },
                "peerDependencies": { "express": ">=4" },
                "devDependencies": { "mocha": "*" },
                "scripts": { "test": "grunt test" }
            }"#,
        )
        .expect("manifest should parse");

        assert_eq!(manifest.name, "norman-app");
        assert_eq!(manifest.dependencies.names().collect::<Vec<_>>(), ["zeta", "alpha"]);
        assert_eq!(manifest.dependencies.get("alpha"), Some("~2.0.0"));
        assert_eq!(manifest.peer_dependencies.len(), 1);
        assert_eq!(manifest.dev_dependencies.get("mocha"), Some("*"));
    }

    #[test]
    fn missing_sections_are_empty() {
        let manifest = PackageManifest::from_json(r#"{ "name": "bare" }"#).unwrap();
        assert!(manifest.dependencies.is_empty());
        assert!(manifest.peer_dependencies.is_empty());
        assert_eq!(manifest.version, "");
    }

    #[test]
    fn in_memory_store_reports_missing_packages() {
        let store: HashMap<String, PackageManifest> = HashMap::new();
        let err = store.load("ghost").expect_err("must fail");
        assert!(matches!(err, ClosureError::MissingManifest { ref name, .. } if name == "ghost"));
    }

    #[test]
    fn module_store_paths_support_scoped_packages() {
        let store = ModuleStore::new("node_modules");
        assert_eq!(
            store.manifest_path("@scope/pkg"),
            PathBuf::from("node_modules/@scope/pkg/package.json")
        );
    }
}
