use std::collections::HashSet;

use tracing::{debug, info, instrument};

use crate::exclusion::ClientFilter;
use crate::manifest::{ManifestStore, PackageManifest};
use crate::ClosureError;

/// Inclusion glob covering every file of an installed package.
pub fn package_glob(name: &str) -> String {
    format!("{name}/**/*")
}

/// Deduplicated package globs in first-discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClosureSet {
    globs: Vec<String>,
    seen: HashSet<String>,
}

impl ClosureSet {
    /// Adds the glob for `name`; returns `false` if it was already present.
    pub fn insert_package(&mut self, name: &str) -> bool {
        let glob = package_glob(name);
        if !self.seen.insert(glob.clone()) {
            return false;
        }
        self.globs.push(glob);
        true
    }

    pub fn contains_package(&self, name: &str) -> bool {
        self.seen.contains(&package_glob(name))
    }

    pub fn globs(&self) -> &[String] {
        &self.globs
    }

    pub fn into_globs(self) -> Vec<String> {
        self.globs
    }

    pub fn len(&self) -> usize {
        self.globs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.globs.is_empty()
    }
}

/// Computes the installed packages a server deployment needs.
///
/// Every direct dependency of `root` that is not a client package is
/// included, together with the peer and direct dependencies listed in its
/// own manifest. Traversal stops at that second level: dependencies of
/// dependencies are not followed, and the client filter is not re-applied
/// to second-level names.
///
/// # Errors
/// Returns [`ClosureError::MissingManifest`] if an included direct
/// dependency has no manifest in `store`.
#[instrument(skip_all, fields(root = %root.name))]
pub fn resolve(
    root: &PackageManifest,
    store: &(impl ManifestStore + ?Sized),
    filter: &ClientFilter,
) -> Result<ClosureSet, ClosureError> {
    let mut closure = ClosureSet::default();

    for name in root.dependencies.names() {
        if filter.is_client_package(name) {
            debug!("skipping client package {}", name);
            continue;
        }

        info!("found server module {}", name);
        closure.insert_package(name);

        let manifest = store.load(name)?;
        for nested in manifest
            .peer_dependencies
            .names()
            .chain(manifest.dependencies.names())
        {
            if closure.insert_package(nested) {
                info!("found server module {} (via {})", nested, name);
            }
        }
    }

    debug!("closure contains {} package(s)", closure.len());
    Ok(closure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn manifest(name: &str, deps: &[&str], peers: &[&str]) -> PackageManifest {
        PackageManifest {
            name: name.to_string(),
            version: "1.0.0".to_string(),
            dependencies: deps.iter().map(|d| (*d, "*")).collect(),
            peer_dependencies: peers.iter().map(|p| (*p, "*")).collect(),
            dev_dependencies: Default::default(),
        }
    }

    fn store(manifests: Vec<PackageManifest>) -> HashMap<String, PackageManifest> {
        manifests.into_iter().map(|m| (m.name.clone(), m)).collect()
    }

    #[test]
    fn sole_client_dependency_yields_empty_closure() {
        let root = manifest("app", &["norman-client-tp"], &[]);
        let closure = resolve(&root, &store(vec![]), &ClientFilter::default()).unwrap();
        assert!(closure.is_empty());
    }

    #[test]
    fn includes_peers_and_direct_dependencies_of_each_dependency() {
        let root = manifest("app", &["A"], &[]);
        let packages = store(vec![manifest("A", &["D"], &["P"])]);

        let closure = resolve(&root, &packages, &ClientFilter::default()).unwrap();
        assert_eq!(closure.globs(), ["A/**/*", "P/**/*", "D/**/*"]);
    }

    #[test]
    fn shared_peer_is_listed_once() {
        let root = manifest("app", &["A", "B"], &[]);
        let packages = store(vec![
            manifest("A", &[], &["P"]),
            manifest("B", &[], &["P"]),
        ]);

        let closure = resolve(&root, &packages, &ClientFilter::default()).unwrap();
        assert_eq!(closure.into_globs(), vec!["A/**/*", "P/**/*", "B/**/*"]);
    }

    #[test]
    fn traversal_stops_at_second_level() {
        let root = manifest("app", &["A"], &[]);
        let packages = store(vec![
            manifest("A", &["D"], &["P"]),
            manifest("D", &["E"], &[]),
        ]);

        let closure = resolve(&root, &packages, &ClientFilter::default()).unwrap();
        assert!(closure.contains_package("D"));
        assert!(!closure.contains_package("E"));
        assert_eq!(closure.len(), 3);
    }

    #[test]
    fn second_level_names_bypass_the_client_filter() {
        let root = manifest("app", &["norman-server"], &[]);
        let packages = store(vec![manifest("norman-server", &["norman-common-client"], &[])]);

        let closure = resolve(&root, &packages, &ClientFilter::default()).unwrap();
        assert!(closure.contains_package("norman-common-client"));
    }

    #[test]
    fn dev_dependencies_are_ignored() {
        let mut root = manifest("app", &[], &[]);
        root.dev_dependencies = [("mocha", "*")].into_iter().collect();

        let closure = resolve(&root, &store(vec![]), &ClientFilter::default()).unwrap();
        assert!(closure.is_empty());
    }

    #[test]
    fn missing_dependency_manifest_is_fatal() {
        let root = manifest("app", &["A", "B"], &[]);
        let packages = store(vec![manifest("A", &[], &[])]);

        let err = resolve(&root, &packages, &ClientFilter::default()).expect_err("must fail");
        assert!(matches!(err, ClosureError::MissingManifest { ref name, .. } if name == "B"));
    }
}
