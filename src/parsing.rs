use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::Path;
use tracing::warn;

use crate::types::RunSummary;

/// Placeholder rendered in place of a field missing from the summary.
pub const MISSING_PLACEHOLDER: &str = "-";

pub fn parse_summary(text: &str) -> Result<RunSummary> {
    let summary: RunSummary =
        serde_json::from_str(text).context("Failed to parse JSON data from the report file")?;
    Ok(summary)
}

/// Keeps a string value; any other JSON type reads as absent.
pub(crate) fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// Keeps any JSON number, integer or float; any other JSON type reads as absent.
pub(crate) fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(Value::deserialize(deserializer)?.as_f64())
}

pub async fn read_summary(path: &Path) -> Result<RunSummary> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read report file {}", path.display()))?;
    let summary = parse_summary(&text)?;

    let missing = summary.missing_fields();
    if !missing.is_empty() {
        warn!("Report file has missing or unreadable fields {:?}, rendering them as '{}'", missing, MISSING_PLACEHOLDER);
    }
    Ok(summary)
}

/// Milliseconds to seconds, fixed to two decimals.
pub fn format_elapsed_secs(total_time_ms: Option<f64>) -> String {
    match total_time_ms {
        Some(ms) => format!("{:.2} secs", ms / 1000.0),
        None => format!("{} secs", MISSING_PLACEHOLDER),
    }
}

/// Whole counts print without a fractional part.
pub fn format_count(count: Option<f64>) -> String {
    count
        .map(|c| c.to_string())
        .unwrap_or_else(|| MISSING_PLACEHOLDER.to_string())
}

impl RunSummary {
    /// A run failed when at least one scenario failed.
    pub fn has_failures(&self) -> bool {
        self.scenarios_failed.map_or(false, |n| n >= 1.0)
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.env.is_none() { missing.push("env"); }
        if self.total_time_ms.is_none() { missing.push("totalTime"); }
        if self.features_passed.is_none() { missing.push("featuresPassed"); }
        if self.features_failed.is_none() { missing.push("featuresFailed"); }
        if self.scenarios_passed.is_none() { missing.push("scenariosPassed"); }
        if self.scenarios_failed.is_none() { missing.push("scenariosfailed"); }
        missing
    }
}
