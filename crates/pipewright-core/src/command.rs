use std::fmt::{Display, Formatter};
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandGroup {
    Build,
    Serve,
    Test,
}

impl CommandGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Serve => "serve",
            Self::Test => "test",
        }
    }

    pub const ALL: [CommandGroup; 3] = [Self::Build, Self::Serve, Self::Test];
}

impl Display for CommandGroup {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A command group plus an optional target key, e.g. `build:dist` or `serve`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetRef {
    pub group: CommandGroup,
    pub key: Option<String>,
}

impl TargetRef {
    pub fn new(group: CommandGroup, key: impl Into<String>) -> Self {
        Self {
            group,
            key: Some(key.into()),
        }
    }

    pub fn group_default(group: CommandGroup) -> Self {
        Self { group, key: None }
    }

    pub fn canonical(&self) -> String {
        match &self.key {
            Some(key) => format!("{}:{}", self.group.as_str(), key),
            None => self.group.as_str().to_string(),
        }
    }
}

impl Display for TargetRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

#[derive(Debug, Error)]
pub enum CommandParseError {
    #[error("unknown command group '{0}' (expected build, serve, test or an alias)")]
    UnknownGroup(String),
}

/// Top-level shorthands that map straight onto a grouped target.
fn alias(name: &str) -> Option<TargetRef> {
    let target = match name {
        "default" | "dev" => TargetRef::new(CommandGroup::Build, "dev"),
        "dist" => TargetRef::new(CommandGroup::Build, "dist"),
        "liveEdit" => TargetRef::new(CommandGroup::Serve, "liveEdit"),
        "start" => TargetRef::new(CommandGroup::Serve, "start"),
        _ => return None,
    };
    Some(target)
}

impl FromStr for TargetRef {
    type Err = CommandParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut parts = value.splitn(2, ':');
        let group_text = parts.next().unwrap_or_default();
        let key = parts
            .next()
            .filter(|key| !key.is_empty())
            .map(ToOwned::to_owned);

        let group = match group_text {
            "build" => CommandGroup::Build,
            "serve" => CommandGroup::Serve,
            "test" => CommandGroup::Test,
            _ if key.is_none() => {
                return alias(group_text)
                    .ok_or_else(|| CommandParseError::UnknownGroup(group_text.to_string()))
            }
            _ => return Err(CommandParseError::UnknownGroup(group_text.to_string())),
        };

        Ok(Self { group, key })
    }
}
