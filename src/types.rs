use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub slack_token: Option<String>,
    pub slack_channel: Option<String>,
    pub summary_path: PathBuf,
    pub archive_path: PathBuf,
    pub post_message_url: String,
    pub file_upload_url: String,
}

/// Token and channel once both are known to be present.
#[derive(Debug, Clone)]
pub struct SlackCredentials {
    pub token: String,
    pub channel: String,
}

/// Test-run summary as written by the test runner.
///
/// A field that is absent, `null` or of an unexpected JSON type reads as `None`.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct RunSummary {
    #[serde(default, deserialize_with = "crate::parsing::lenient_string")]
    pub env: Option<String>,
    #[serde(rename = "totalTime", default, deserialize_with = "crate::parsing::lenient_number")]
    pub total_time_ms: Option<f64>,
    #[serde(rename = "featuresPassed", default, deserialize_with = "crate::parsing::lenient_number")]
    pub features_passed: Option<f64>,
    #[serde(rename = "featuresFailed", default, deserialize_with = "crate::parsing::lenient_number")]
    pub features_failed: Option<f64>,
    #[serde(rename = "scenariosPassed", default, deserialize_with = "crate::parsing::lenient_number")]
    pub scenarios_passed: Option<f64>,
    // lower-case "f" is what the runner emits
    #[serde(rename = "scenariosfailed", default, deserialize_with = "crate::parsing::lenient_number")]
    pub scenarios_failed: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlackPayload {
    pub channel: String,
    pub blocks: Vec<serde_json::Value>,
}

/// Response body of `chat.postMessage`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostMessageResponse {
    pub ok: bool,
    pub ts: Option<String>,
    pub error: Option<String>,
}

/// Response body of `files.upload`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileUploadResponse {
    pub ok: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NotificationRejected(Option<String>),
    MissingThreadTs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    FileUploaded { thread_ts: String },
    UploadRejected { thread_ts: String, error: Option<String> },
    UploadSkipped { reason: SkipReason },
}
