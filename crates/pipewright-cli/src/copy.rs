//! Grunt-style static file sets: `cwd` + `src` globs (with `!` exclusions and
//! `{a,b}` alternatives) copied into `dest`.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use glob::{MatchOptions, Pattern};
use pipewright_core::FileSet;
use tracing::debug;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Copies every set in order and returns the number of files written.
pub fn copy_sets(sets: &[FileSet]) -> Result<usize> {
    let mut copied = 0;
    for set in sets {
        copied += copy_set(set)?;
    }
    Ok(copied)
}

pub fn copy_set(set: &FileSet) -> Result<usize> {
    let (excludes, includes): (Vec<&String>, Vec<&String>) =
        set.src.iter().partition(|pattern| pattern.starts_with('!'));

    let excludes = excludes
        .iter()
        .flat_map(|pattern| expand_braces(&pattern[1..]))
        .map(|pattern| {
            Pattern::new(&pattern).with_context(|| format!("invalid exclude pattern '{pattern}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    let prefix = match &set.cwd {
        Some(cwd) => {
            let text = cwd
                .to_str()
                .ok_or_else(|| anyhow!("non UTF-8 copy directory '{}'", cwd.display()))?;
            format!("{}/", Pattern::escape(text.trim_end_matches('/')))
        }
        None => String::new(),
    };

    let mut seen = HashSet::new();
    let mut copied = 0;

    for include in includes.iter().flat_map(|pattern| expand_braces(pattern)) {
        let full = format!("{prefix}{include}");
        let entries = glob::glob_with(&full, MATCH_OPTIONS)
            .with_context(|| format!("invalid copy pattern '{full}'"))?;

        for entry in entries {
            let path = entry?;
            if !path.is_file() || !seen.insert(path.clone()) {
                continue;
            }

            let relative = match &set.cwd {
                Some(cwd) => path.strip_prefix(cwd)?.to_path_buf(),
                None => path.clone(),
            };
            if excludes
                .iter()
                .any(|pattern| pattern.matches_path_with(&relative, MATCH_OPTIONS))
            {
                continue;
            }

            let target = destination(set, &path, &relative)?;
            copy_file(&path, &target)?;
            copied += 1;
        }
    }

    debug!("copied {} file(s) into {}", copied, set.dest.display());
    Ok(copied)
}

fn destination(set: &FileSet, path: &Path, relative: &Path) -> Result<PathBuf> {
    if !set.flatten {
        return Ok(set.dest.join(relative));
    }
    let name = path
        .file_name()
        .ok_or_else(|| anyhow!("cannot flatten '{}'", path.display()))?;
    Ok(set.dest.join(name))
}

fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory '{}'", parent.display()))?;
    }
    fs::copy(from, to)
        .with_context(|| format!("failed to copy '{}' to '{}'", from.display(), to.display()))?;
    Ok(())
}

/// Expands `{a,b}` alternatives; nested groups are not supported.
pub(crate) fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };
    let Some(close) = pattern[open..].find('}').map(|at| open + at) else {
        return vec![pattern.to_string()];
    };

    let (head, tail) = (&pattern[..open], &pattern[close + 1..]);
    pattern[open + 1..close]
        .split(',')
        .flat_map(|alternative| expand_braces(&format!("{head}{alternative}{tail}")))
        .collect()
}
