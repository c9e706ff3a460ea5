//! Repair and validation of the end-to-end test report.
//!
//! The e2e runner appends one JSON array per feature file to the same report,
//! so the file ends up as `[...][...]` wrapped in whatever log noise the
//! runner printed. [`repair`] cuts out the concatenated arrays and joins them
//! into one array; [`validate`] then scans the text for a failed status.
//!
//! The validation is a plain substring scan. A failure marker embedded in an
//! unrelated field (a captured log line, for instance) also fails the run.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// One or more report arrays with at least one `][` seam between them. The
/// first array must open with a keyed object, so bracketed log prefixes such
/// as `[{launcher}]` are skipped.
pub const DOCUMENT_PATTERN: &str = r#"(?s)\[\s*\{\s*".*\]\[\s*\{.*\}\s*\]"#;

static DOCUMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DOCUMENT_PATTERN).expect("invalid report pattern"));

/// End of one array immediately followed by the start of the next.
pub const ARRAY_BOUNDARY: &str = "][";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("test report does not contain concatenated report arrays")]
    PatternMismatch,
    #[error("test failures found ({occurrences} occurrence(s) of {marker})")]
    FailureDetected { marker: String, occurrences: usize },
    #[error("failed to access test report {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail { occurrences: usize },
}

/// Extracts the concatenated report arrays from `raw` and merges them.
///
/// # Errors
/// [`ReportError::PatternMismatch`] when `raw` holds no `][` seam between
/// report arrays, or when the merged text does not open with a JSON array.
/// Nothing is written in that case.
pub fn repair(raw: &str) -> Result<String, ReportError> {
    let document = DOCUMENT
        .find(raw)
        .ok_or(ReportError::PatternMismatch)?
        .as_str();

    let seams = document.matches(ARRAY_BOUNDARY).count();
    info!("merging {} report document(s)", seams + 1);
    let merged = document.replace(ARRAY_BOUNDARY, ",");

    if !opens_with_array(&merged) {
        warn!("merged report does not start with a JSON array");
        return Err(ReportError::PatternMismatch);
    }
    Ok(merged)
}

fn opens_with_array(text: &str) -> bool {
    let mut values = serde_json::Deserializer::from_str(text).into_iter::<Value>();
    matches!(values.next(), Some(Ok(Value::Array(_))))
}

pub fn validate(report: &str, failure_marker: &str) -> Verdict {
    match report.matches(failure_marker).count() {
        0 => Verdict::Pass,
        occurrences => Verdict::Fail { occurrences },
    }
}

/// Repairs the report at `path` in place.
#[instrument]
pub fn repair_file(path: &Path) -> Result<(), ReportError> {
    let raw = read(path)?;
    let repaired = repair(&raw)?;
    std::fs::write(path, repaired).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Fails with [`ReportError::FailureDetected`] if the report at `path`
/// contains `failure_marker`.
#[instrument]
pub fn validate_file(path: &Path, failure_marker: &str) -> Result<(), ReportError> {
    let report = read(path)?;
    match validate(&report, failure_marker) {
        Verdict::Pass => {
            info!("no failed scenarios in {}", path.display());
            Ok(())
        }
        Verdict::Fail { occurrences } => {
            warn!("{} failed step(s) reported in {}", occurrences, path.display());
            Err(ReportError::FailureDetected {
                marker: failure_marker.to_string(),
                occurrences,
            })
        }
    }
}

fn read(path: &Path) -> Result<String, ReportError> {
    std::fs::read_to_string(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAILED: &str = r#""status": "failed""#;

    fn feature(id: &str, status: &str) -> String {
        format!(
            r#"[
  {{
    "id": "{id}",
    "elements": [
      {{
        "steps": [
          {{ "name": "open page", "result": {{ "status": "{status}", "duration": 12 }} }}
        ]
      }}
    ]
  }}
]"#
        )
    }

    #[test]
    fn replaces_array_seams_with_commas() {
        let repaired = repair(r#"[{"a":1}]][{"b":2}]"#).expect("should repair");
        assert_eq!(repaired, r#"[{"a":1}],{"b":2}]"#);
    }

    #[test]
    fn merges_runner_output_into_one_array() {
        let raw = format!(
            "Using ChromeDriver directly...\n{}{}{}\n3 scenarios (3 passed)\n",
            feature("login", "passed"),
            feature("projects", "passed"),
            feature("logout", "passed"),
        );

        let repaired = repair(&raw).expect("should repair");
        assert!(repaired.starts_with('['));
        assert!(repaired.ends_with(']'));

        let parsed: serde_json::Value =
            serde_json::from_str(&repaired).expect("repaired report must be valid JSON");
        let features = parsed.as_array().expect("top level must be an array");
        assert_eq!(features.len(), 3);
        assert_eq!(features[2]["id"], "logout");
    }

    #[test]
    fn bracketed_log_prefix_is_not_part_of_the_report() {
        let raw = format!(
            "[launcher] Running 1 instances of WebDriver\n[{{launcher}}] Process exited\n{}{}",
            feature("login", "passed"),
            feature("logout", "passed"),
        );

        let repaired = repair(&raw).expect("should repair");
        assert!(!repaired.contains("launcher"));

        let parsed: serde_json::Value =
            serde_json::from_str(&repaired).expect("repaired report must be valid JSON");
        assert_eq!(parsed.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn unparseable_merge_is_a_mismatch() {
        assert!(matches!(
            repair(r#"[{"a": oops}][{"b": 1}]"#),
            Err(ReportError::PatternMismatch)
        ));
    }

    #[test]
    fn single_document_is_a_mismatch() {
        let err = repair(&feature("login", "passed")).expect_err("must fail");
        assert!(matches!(err, ReportError::PatternMismatch));
    }

    #[test]
    fn noise_only_is_a_mismatch() {
        assert!(matches!(
            repair("Error: could not start browser"),
            Err(ReportError::PatternMismatch)
        ));
        assert!(matches!(repair(""), Err(ReportError::PatternMismatch)));
    }

    #[test]
    fn failed_marker_fails_validation() {
        let repaired = repair(&format!(
            "{}{}",
            feature("login", "passed"),
            feature("projects", "failed")
        ))
        .unwrap();
        assert_eq!(validate(&repaired, FAILED), Verdict::Fail { occurrences: 1 });

        let passing = repaired.replace(FAILED, r#""status": "passed""#);
        assert_eq!(validate(&passing, FAILED), Verdict::Pass);
    }

    #[test]
    fn marker_inside_unrelated_payload_still_fails() {
        let report = r#"[{"result": {"status": "passed"}, "embeddings": [{"data": {"status": "failed"}}]}]"#;
        assert_eq!(validate(report, FAILED), Verdict::Fail { occurrences: 1 });
    }

    #[test]
    fn repairs_and_validates_file_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("testReport.json");
        std::fs::write(
            &path,
            format!("{}{}", feature("a", "passed"), feature("b", "passed")),
        )
        .unwrap();

        repair_file(&path).expect("repair should succeed");
        let stored = std::fs::read_to_string(&path).unwrap();
        assert!(!stored.contains(ARRAY_BOUNDARY));
        validate_file(&path, FAILED).expect("report should pass");
    }

    #[test]
    fn failing_file_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("testReport.json");
        std::fs::write(&path, feature("a", "failed")).unwrap();

        let err = validate_file(&path, FAILED).expect_err("must fail");
        assert!(matches!(err, ReportError::FailureDetected { occurrences: 1, .. }));
    }

    #[test]
    fn mismatch_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("testReport.json");
        std::fs::write(&path, "no report here").unwrap();

        assert!(matches!(repair_file(&path), Err(ReportError::PatternMismatch)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "no report here");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = repair_file(Path::new("/nonexistent/testReport.json")).expect_err("must fail");
        assert!(matches!(err, ReportError::Io { .. }));
    }
}
