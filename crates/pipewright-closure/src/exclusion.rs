use pipewright_core::config::ClosureConfig;
use pipewright_core::constants::{CLIENT_MARKER, CLIENT_NAMESPACE};

/// Recognises front-end-only packages that never ship in the server bundle.
///
/// A name matches when it contains `namespace` with `marker` somewhere after
/// it (`norman-foo-client`, `norman-client-tp`). An empty token disables the
/// filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientFilter {
    namespace: String,
    marker: String,
}

impl ClientFilter {
    pub fn new(namespace: impl Into<String>, marker: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            marker: marker.into(),
        }
    }

    pub fn is_client_package(&self, name: &str) -> bool {
        if self.namespace.is_empty() || self.marker.is_empty() {
            return false;
        }
        name.find(&self.namespace)
            .is_some_and(|at| name[at + self.namespace.len()..].contains(&self.marker))
    }
}

impl Default for ClientFilter {
    fn default() -> Self {
        Self::new(CLIENT_NAMESPACE, CLIENT_MARKER)
    }
}

impl From<&ClosureConfig> for ClientFilter {
    fn from(cfg: &ClosureConfig) -> Self {
        Self::new(cfg.namespace.clone(), cfg.marker.clone())
    }
}

/// The default predicate: `norman` followed by `client`.
pub fn is_client_package(name: &str) -> bool {
    ClientFilter::default().is_client_package(name)
}
