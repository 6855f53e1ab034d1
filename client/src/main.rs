//! `taskly-reminders` -- sends a notification for every pending task due today.
//!
//! Meant to be run once a day (cron, systemd timer, app launch). Uses the
//! session stored by the last login; exits with an error when there is none.
//!
//! # Environment variables
//!
//! | Variable          | Required | Default                      | Description                 |
//! |-------------------|----------|------------------------------|-----------------------------|
//! | `TASKLY_API_URL`  | no       | `http://localhost:3001`      | Base URL of the backend     |
//! | `TASKLY_DATA_DIR` | no       | `<platform data dir>/Taskly` | Where `session.yaml` lives  |
//! | `RUST_LOG`        | no       | `taskly_client=info`         | Log filter                  |

use anyhow::Context;
use tracing::info;

use taskly_client::services::date_utils;
use taskly_client::services::logging::init_logging;
use taskly_client::services::reminders::{notify_tasks_due_today, TracingNotifier};
use taskly_client::services::session::require_session;
use taskly_client::{ApiClient, ClientConfig, YamlSessionStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ClientConfig::from_env();
    init_logging("taskly_client=info,taskly_reminders=info");

    info!(
        api_url = %config.api_url,
        data_dir = %config.data_dir.display(),
        "Starting taskly-reminders",
    );

    let store = YamlSessionStore::new(&config.data_dir);
    let user_id = require_session(&store).context("log in with the Taskly app first")?;

    let api = ApiClient::from_config(&config);
    let today = date_utils::today();
    let sent = notify_tasks_due_today(&api, &user_id, &TracingNotifier, today).await?;

    info!(sent, date = %date_utils::format_iso_date(today), "Reminders sent");
    Ok(())
}
