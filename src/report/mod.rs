use anyhow::Result;
use reqwest::Client;
use tracing::{info, warn};

use crate::parsing::read_summary;
use crate::slack::{build_slack_payload, send_to_slack, status_label, upload_file_to_slack};
use crate::types::*;

/// Runs one report delivery: summary → message → threaded archive upload.
pub struct ReportDispatcher<'a> {
    client: Client,
    config: &'a Config,
}

impl<'a> ReportDispatcher<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &'a Config) -> Self {
        Self { client, config }
    }

    pub async fn run(&self) -> Result<DispatchOutcome> {
        // Nothing touches the network until credentials and summary are in hand
        let creds = self.config.credentials()?;
        let summary = read_summary(&self.config.summary_path).await?;
        info!(
            "Test run on {} {}",
            summary.env.as_deref().unwrap_or("unknown environment"),
            status_label(&summary)
        );

        let payload = build_slack_payload(&creds.channel, &summary);
        let response = send_to_slack(&self.client, &self.config.post_message_url, &creds.token, &payload).await?;

        let thread_ts = match response {
            PostMessageResponse { ok: false, error, .. } => {
                warn!("Slack rejected the report message ({}), skipping archive upload",
                    error.as_deref().unwrap_or("no error code"));
                return Ok(DispatchOutcome::UploadSkipped { reason: SkipReason::NotificationRejected(error) });
            }
            PostMessageResponse { ts: None, .. } => {
                warn!("Slack response carried no message ts, skipping archive upload");
                return Ok(DispatchOutcome::UploadSkipped { reason: SkipReason::MissingThreadTs });
            }
            PostMessageResponse { ts: Some(ts), .. } => ts,
        };
        info!("Report message posted (ts {})", thread_ts);

        let upload = upload_file_to_slack(
            &self.client,
            &self.config.file_upload_url,
            &creds,
            &self.config.archive_path,
            &thread_ts,
        )
        .await;

        match upload {
            Ok(FileUploadResponse { ok: true, .. }) => {
                info!("Uploaded {} to thread {}", self.config.archive_path.display(), thread_ts);
                Ok(DispatchOutcome::FileUploaded { thread_ts })
            }
            Ok(FileUploadResponse { error, .. }) => {
                warn!("Slack rejected the archive upload ({}); message {} has no attachment",
                    error.as_deref().unwrap_or("no error code"), thread_ts);
                Ok(DispatchOutcome::UploadRejected { thread_ts, error })
            }
            Err(e) => {
                warn!("Report message {} was posted but the archive upload failed", thread_ts);
                Err(e.into())
            }
        }
    }
}

impl DispatchOutcome {
    pub fn thread_ts(&self) -> Option<&str> {
        match self {
            DispatchOutcome::FileUploaded { thread_ts } => Some(thread_ts),
            DispatchOutcome::UploadRejected { thread_ts, .. } => Some(thread_ts),
            DispatchOutcome::UploadSkipped { .. } => None,
        }
    }

    pub fn file_uploaded(&self) -> bool {
        matches!(self, DispatchOutcome::FileUploaded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_thread_ts() {
        let uploaded = DispatchOutcome::FileUploaded { thread_ts: "1.2".to_string() };
        assert_eq!(uploaded.thread_ts(), Some("1.2"));
        assert!(uploaded.file_uploaded());

        let rejected = DispatchOutcome::UploadRejected {
            thread_ts: "3.4".to_string(),
            error: Some("not_allowed".to_string()),
        };
        assert_eq!(rejected.thread_ts(), Some("3.4"));
        assert!(!rejected.file_uploaded());

        let skipped = DispatchOutcome::UploadSkipped { reason: SkipReason::MissingThreadTs };
        assert_eq!(skipped.thread_ts(), None);
        assert!(!skipped.file_uploaded());
    }
}
