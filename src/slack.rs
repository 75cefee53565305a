use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio_util::io::ReaderStream;
use tracing::{debug, error};

use crate::parsing::{format_count, format_elapsed_secs, MISSING_PLACEHOLDER};
use crate::types::{FileUploadResponse, PostMessageResponse, RunSummary, SlackCredentials, SlackPayload};

pub const STATUS_PASSED: &str = "Passed ✓";
pub const STATUS_FAILED: &str = "Failed ⓧ";

/// Failure talking to a Slack Web API method.
#[derive(Debug, thiserror::Error)]
pub enum SlackApiError {
    #[error("{method} request failed: {source}")]
    Transport {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} returned HTTP {status}: {body}")]
    Status {
        method: &'static str,
        status: StatusCode,
        body: String,
    },
    #[error("{method} could not read archive {path}: {source}")]
    Archive {
        method: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{method} returned an unreadable response: {source}")]
    Decode {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

pub fn status_label(summary: &RunSummary) -> &'static str {
    if summary.has_failures() { STATUS_FAILED } else { STATUS_PASSED }
}

pub fn build_slack_payload(channel: &str, summary: &RunSummary) -> SlackPayload {
    let title = format!("Test Suite {}", status_label(summary));
    let env = summary.env.as_deref().unwrap_or(MISSING_PLACEHOLDER);

    let fields: Vec<serde_json::Value> = [
        ("Environment", env.to_string()),
        ("Total Time", format_elapsed_secs(summary.total_time_ms)),
        ("Features Passed", format_count(summary.features_passed)),
        ("Features Failed", format_count(summary.features_failed)),
        ("Scenarios Passed", format_count(summary.scenarios_passed)),
        ("Scenarios Failed", format_count(summary.scenarios_failed)),
    ]
    .into_iter()
    .map(|(label, value)| serde_json::json!({"type": "mrkdwn", "text": format!("*{}:*\n{}", label, value)}))
    .collect();

    let blocks = vec![
        serde_json::json!({
            "type": "header",
            "text": {"type": "plain_text", "text": title, "emoji": true}
        }),
        serde_json::json!({
            "type": "section",
            "fields": fields
        }),
    ];

    SlackPayload { channel: channel.to_string(), blocks }
}

/// Posts the payload via `chat.postMessage` and returns Slack's reply as-is.
pub async fn send_to_slack(
    client: &Client,
    url: &str,
    token: &str,
    payload: &SlackPayload,
) -> Result<PostMessageResponse, SlackApiError> {
    const METHOD: &str = "chat.postMessage";
    let res = client
        .post(url)
        .bearer_auth(token)
        .json(payload)
        .send()
        .await
        .map_err(|source| log_failure(SlackApiError::Transport { method: METHOD, source }))?;
    decode_response(METHOD, res).await
}

/// Uploads the archive as a threaded reply to `thread_ts` via `files.upload`.
pub async fn upload_file_to_slack(
    client: &Client,
    url: &str,
    creds: &SlackCredentials,
    archive_path: &Path,
    thread_ts: &str,
) -> Result<FileUploadResponse, SlackApiError> {
    const METHOD: &str = "files.upload";
    let archive_error = |source: std::io::Error| {
        log_failure(SlackApiError::Archive {
            method: METHOD,
            path: archive_path.display().to_string(),
            source,
        })
    };
    let file = tokio::fs::File::open(archive_path).await.map_err(archive_error)?;
    let len = file.metadata().await.map_err(archive_error)?.len();
    let file_name = archive_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());
    debug!("Uploading {} ({} bytes) to thread {}", file_name, len, thread_ts);

    let part = Part::stream_with_length(reqwest::Body::wrap_stream(ReaderStream::new(file)), len)
        .file_name(file_name)
        .mime_str(archive_mime_type(archive_path))
        .map_err(|source| log_failure(SlackApiError::Transport { method: METHOD, source }))?;
    // reqwest sets the multipart content type, boundary included.
    let form = Form::new()
        .part("file", part)
        .text("channels", creds.channel.clone())
        .text("thread_ts", thread_ts.to_string());

    let res = client
        .post(url)
        .bearer_auth(&creds.token)
        .multipart(form)
        .send()
        .await
        .map_err(|source| log_failure(SlackApiError::Transport { method: METHOD, source }))?;
    decode_response(METHOD, res).await
}

fn archive_mime_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}

async fn decode_response<T: DeserializeOwned>(
    method: &'static str,
    res: reqwest::Response,
) -> Result<T, SlackApiError> {
    if !res.status().is_success() {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        return Err(log_failure(SlackApiError::Status { method, status, body }));
    }
    res.json::<T>()
        .await
        .map_err(|source| log_failure(SlackApiError::Decode { method, source }))
}

fn log_failure(err: SlackApiError) -> SlackApiError {
    match &err {
        SlackApiError::Status { method, status, body } => {
            error!("Slack {} failed with HTTP {}", method, status);
            if !body.is_empty() {
                error!("Slack API error response: {}", body);
            }
        }
        other => error!("Slack API call failed: {}", other),
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(scenarios_failed: Option<f64>) -> RunSummary {
        RunSummary {
            env: Some("qa".to_string()),
            total_time_ms: Some(125000.0),
            features_passed: Some(3.0),
            features_failed: Some(0.0),
            scenarios_passed: Some(12.0),
            scenarios_failed,
        }
    }

    fn field_texts(payload: &SlackPayload) -> Vec<String> {
        payload.blocks[1]["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["text"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_build_slack_payload_passed() {
        let payload = build_slack_payload("C0123456", &summary(Some(0.0)));

        assert_eq!(payload.channel, "C0123456");
        assert_eq!(payload.blocks.len(), 2);

        let header = &payload.blocks[0];
        assert_eq!(header["type"], "header");
        assert_eq!(header["text"]["type"], "plain_text");
        assert_eq!(header["text"]["text"], "Test Suite Passed ✓");
        assert_eq!(header["text"]["emoji"], true);

        assert_eq!(payload.blocks[1]["type"], "section");
        assert_eq!(
            field_texts(&payload),
            vec![
                "*Environment:*\nqa",
                "*Total Time:*\n125.00 secs",
                "*Features Passed:*\n3",
                "*Features Failed:*\n0",
                "*Scenarios Passed:*\n12",
                "*Scenarios Failed:*\n0",
            ]
        );
    }

    #[test]
    fn test_build_slack_payload_failed() {
        let payload = build_slack_payload("C0123456", &summary(Some(1.0)));
        assert_eq!(payload.blocks[0]["text"]["text"], "Test Suite Failed ⓧ");

        let payload = build_slack_payload("C0123456", &summary(Some(5.0)));
        assert_eq!(payload.blocks[0]["text"]["text"], "Test Suite Failed ⓧ");
    }

    #[test]
    fn test_build_slack_payload_missing_fields() {
        let payload = build_slack_payload("C0123456", &RunSummary::default());

        assert_eq!(payload.blocks[0]["text"]["text"], "Test Suite Passed ✓");
        let fields = field_texts(&payload);
        assert_eq!(fields[0], "*Environment:*\n-");
        assert_eq!(fields[1], "*Total Time:*\n- secs");
        assert!(fields.iter().all(|f| !f.contains("undefined") && !f.contains("NaN")));
    }

    #[test]
    fn test_payload_serializes_channel_and_blocks_only() {
        let payload = build_slack_payload("C0123456", &summary(Some(0.0)));
        let value = serde_json::to_value(&payload).unwrap();

        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["channel"], "C0123456");
        assert!(obj["blocks"].is_array());
    }

    #[tokio::test]
    async fn test_upload_missing_archive_fails_before_request() {
        let dir = tempfile::tempdir().unwrap();
        let creds = SlackCredentials {
            token: "xoxb-test".to_string(),
            channel: "C0123456".to_string(),
        };

        let err = upload_file_to_slack(
            &Client::new(),
            "http://127.0.0.1:9/files.upload",
            &creds,
            &dir.path().join("missing.zip"),
            "1700000000.000100",
        )
        .await
        .unwrap_err();

        assert!(matches!(err, SlackApiError::Archive { method: "files.upload", .. }));
        assert!(err.to_string().contains("missing.zip"));
    }

    #[test]
    fn test_archive_mime_type() {
        assert_eq!(archive_mime_type(Path::new("reports.zip")), "application/zip");
        assert_eq!(archive_mime_type(Path::new("REPORTS.ZIP")), "application/zip");
        assert_eq!(archive_mime_type(Path::new("reports.tar.gz")), "application/octet-stream");
        assert_eq!(archive_mime_type(Path::new("reports")), "application/octet-stream");
    }
}
