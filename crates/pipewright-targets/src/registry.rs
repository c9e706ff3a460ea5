//! Static target tables for the build, serve and test command groups.

use pipewright_core::{sequence, CommandGroup, Environment, Step, TargetRef, Task};
use tracing::debug;

/// Builds the step list for a key within a group.
///
/// Composers receive the registry so a target can be assembled from other
/// targets (`test:default` is `test:server` followed by `test:client`).
pub type Composer = fn(&TargetRegistry, &str) -> Vec<Step>;

/// Build keys that skip the distribution tail of the build pipeline.
pub const LIVE_EDIT_KEYS: [&str; 2] = ["dev", "liveEdit"];

#[derive(Debug, Clone)]
struct GroupTable {
    default_key: &'static str,
    entries: Vec<(&'static str, Composer)>,
    /// Handles every key without an entry. Groups without one fall back to
    /// their default key instead.
    open: Option<Composer>,
}

impl GroupTable {
    fn entry(&self, key: &str) -> Option<Composer> {
        self.entries
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, composer)| *composer)
    }
}

/// Maps `(group, key)` to an ordered pipeline. Expansion never fails.
#[derive(Debug, Clone)]
pub struct TargetRegistry {
    build: GroupTable,
    serve: GroupTable,
    test: GroupTable,
}

impl Default for TargetRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl TargetRegistry {
    pub fn standard() -> Self {
        Self {
            build: GroupTable {
                default_key: "dev",
                entries: Vec::new(),
                open: Some(compose_build),
            },
            serve: GroupTable {
                default_key: "dev",
                entries: vec![
                    ("debug", compose_serve_debug),
                    ("dev", compose_serve_live),
                    ("liveEdit", compose_serve_live),
                    ("start", compose_serve_start),
                ],
                open: None,
            },
            test: GroupTable {
                default_key: "default",
                entries: vec![
                    ("server", compose_test_server),
                    ("client", compose_test_client),
                    ("e2e", compose_test_e2e),
                    ("e2e_ci", compose_noop),
                    ("default", compose_test_default),
                ],
                open: None,
            },
        }
    }

    fn table(&self, group: CommandGroup) -> &GroupTable {
        match group {
            CommandGroup::Build => &self.build,
            CommandGroup::Serve => &self.serve,
            CommandGroup::Test => &self.test,
        }
    }

    pub fn default_key(&self, group: CommandGroup) -> &'static str {
        self.table(group).default_key
    }

    /// Keys with a dedicated entry, in declaration order.
    pub fn keys(&self, group: CommandGroup) -> Vec<&'static str> {
        self.table(group)
            .entries
            .iter()
            .map(|(name, _)| *name)
            .collect()
    }

    /// The key `expand` will actually compose for `target`.
    pub fn resolve_key<'a>(&self, target: &'a TargetRef) -> &'a str {
        let table = self.table(target.group);
        match target.key.as_deref() {
            Some(key) if table.open.is_some() || table.entry(key).is_some() => key,
            _ => table.default_key,
        }
    }

    pub fn expand(&self, target: &TargetRef) -> Vec<Step> {
        let table = self.table(target.group);
        let key = self.resolve_key(target);
        if target.key.as_deref().is_some_and(|requested| requested != key) {
            debug!(
                "no '{}' target registered, using default '{}:{}'",
                target.canonical(),
                target.group,
                key
            );
        }

        match table.entry(key).or(table.open) {
            Some(composer) => composer(self, key),
            None => Vec::new(),
        }
    }
}

fn is_live_edit(key: &str) -> bool {
    LIVE_EDIT_KEYS.contains(&key)
}

fn compose_build(_: &TargetRegistry, key: &str) -> Vec<Step> {
    let mut tasks = vec![
        Task::Clean {
            target: key.to_string(),
        },
        Task::CompileStyles,
        Task::VendorPrefix,
        Task::CopyHtml,
        Task::CopyStatic,
        Task::BundleScript,
    ];

    if !is_live_edit(key) {
        tasks.extend([
            Task::AnnotateForMinification,
            Task::ExtractSourceMaps,
            Task::CompileTemplates,
            Task::CopyDist,
            Task::InstallProductionConfig,
            Task::MinifyStyles,
            Task::MinifyScripts,
        ]);
    }

    sequence(tasks)
}

fn compose_serve_debug(_: &TargetRegistry, key: &str) -> Vec<Step> {
    vec![Step::Concurrent(vec![
        Task::RunProcessMonitor {
            profile: key.to_string(),
        },
        Task::AttachInspector,
    ])]
}

fn compose_serve_live(_: &TargetRegistry, _key: &str) -> Vec<Step> {
    sequence([
        Task::Build {
            target: "dev".to_string(),
        },
        Task::SetEnvironment(Environment::Development),
        Task::StartServer(Environment::Development),
        Task::AttachLiveEditor,
        Task::WatchFiles,
    ])
}

/// Runs an already built app.
fn compose_serve_start(_: &TargetRegistry, _key: &str) -> Vec<Step> {
    sequence([
        Task::SetEnvironment(Environment::Development),
        Task::StartServer(Environment::Development),
        Task::WatchFiles,
    ])
}

fn compose_test_server(_: &TargetRegistry, _key: &str) -> Vec<Step> {
    sequence([
        Task::SetEnvironment(Environment::Development),
        Task::RunServerTests,
    ])
}

fn compose_test_client(_: &TargetRegistry, _key: &str) -> Vec<Step> {
    sequence([
        Task::SetEnvironment(Environment::Development),
        Task::RunClientTests,
    ])
}

// The second wait lets the e2e runner finish flushing its JSON report.
fn compose_test_e2e(_: &TargetRegistry, _key: &str) -> Vec<Step> {
    sequence([
        Task::StartServer(Environment::Production),
        Task::Wait,
        Task::RunE2eSuite,
        Task::Wait,
        Task::RepairReport,
        Task::ValidateReport,
    ])
}

fn compose_noop(_: &TargetRegistry, _key: &str) -> Vec<Step> {
    Vec::new()
}

fn compose_test_default(registry: &TargetRegistry, _key: &str) -> Vec<Step> {
    let mut steps = registry.expand(&TargetRef::new(CommandGroup::Test, "server"));
    steps.extend(registry.expand(&TargetRef::new(CommandGroup::Test, "client")));
    steps
}
