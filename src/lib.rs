// Public modules
pub mod types;
pub mod config;
pub mod parsing;
pub mod slack;
pub mod report;

// Re-export commonly used items
pub use types::*;
pub use config::{load_config, load_config_with_env, load_env_file, EnvironmentProvider, SystemEnvironment, MockEnvironment};
pub use parsing::{parse_summary, read_summary, format_elapsed_secs, format_count};
pub use slack::{build_slack_payload, send_to_slack, upload_file_to_slack, status_label, SlackApiError};
pub use report::ReportDispatcher;
