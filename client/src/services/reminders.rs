//! Due-today reminders for pending tasks.
//!
//! Delivery is left to a [`Notifier`]; the client only decides which tasks
//! deserve a reminder and what it says.

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::{DueDate, Task, TaskFilters, TaskStatus};
use tracing::info;

use crate::error::ApiError;
use crate::services::api::ApiClient;

pub const DUE_TODAY_TITLE: &str = "Task due today!";
pub const NO_DETAILS: &str = "No additional details.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn due_today(task: &Task) -> Self {
        let subject = task
            .subject_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&task.subject_id);
        let notes = task
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|notes| !notes.is_empty())
            .unwrap_or(NO_DETAILS);

        Self {
            title: DUE_TODAY_TITLE.to_string(),
            body: format!(
                "The {} \"{}\" for {} is due today!\nYour notes: {}",
                task.task_type.label().to_lowercase(),
                task.title,
                subject,
                notes
            ),
        }
    }
}

/// Schedules an immediate local alert
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()>;
}

/// Writes each notification to the log instead of the OS
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        info!(title = %notification.title, body = %notification.body, "Notification");
        Ok(())
    }
}

pub async fn pending_tasks(api: &ApiClient, user_id: &str) -> Result<Vec<Task>, ApiError> {
    let filters = TaskFilters {
        status: Some(TaskStatus::Pending),
        ..Default::default()
    };
    api.get_tasks(user_id, &filters).await
}

/// Pending tasks whose due date is `day`
pub fn tasks_due_on(tasks: &[Task], day: NaiveDate) -> Vec<&Task> {
    let Some(target) = DueDate::from_date(day) else {
        return Vec::new();
    };
    tasks
        .iter()
        .filter(|task| task.status == TaskStatus::Pending && task.due_on == target)
        .collect()
}

/// Send one notification per pending task due on `today`; returns how many were sent
pub async fn notify_tasks_due_today(
    api: &ApiClient,
    user_id: &str,
    notifier: &dyn Notifier,
    today: NaiveDate,
) -> anyhow::Result<usize> {
    let tasks = pending_tasks(api, user_id).await?;
    let due = tasks_due_on(&tasks, today);

    for task in &due {
        notifier.notify(&Notification::due_today(task)).await?;
    }

    info!(pending = tasks.len(), due_today = due.len(), "Checked reminders");
    Ok(due.len())
}
