use anyhow::Result;
use pipewright_core::{PipewrightConfig, TargetRef};
use pipewright_targets::RunSummary;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Posts the pipeline outcome to the configured webhook.
///
/// Delivery problems are logged and otherwise ignored: a broken hook never
/// changes the exit status of the run.
pub fn report_outcome(cfg: &PipewrightConfig, target: &TargetRef, outcome: &Result<RunSummary>) {
    let Some((url, body)) = notification(cfg, target, outcome) else {
        return;
    };

    match ureq::post(&url)
        .set("Content-Type", "application/json")
        .send_json(body)
    {
        Ok(_) => debug!("notified {}", url),
        Err(e) => warn!("failed to deliver notification: {}", e),
    }
}

fn notification(
    cfg: &PipewrightConfig,
    target: &TargetRef,
    outcome: &Result<RunSummary>,
) -> Option<(String, Value)> {
    let notify = &cfg.notify;
    if !notify.enabled {
        return None;
    }
    let Some(url) = notify.webhook.clone() else {
        debug!("notifications enabled but no webhook set, skipping");
        return None;
    };

    let (state, description) = match outcome {
        Ok(_) if !notify.success => return None,
        Ok(summary) => (
            "success",
            format!("{} finished in {:.1?}", target.canonical(), summary.elapsed),
        ),
        Err(err) => ("failure", format!("{} failed: {err:#}", target.canonical())),
    };

    let body = json!({
        "project": cfg.project.name,
        "target": target.canonical(),
        "state": state,
        "description": description,
    });
    Some((url, body))
}
