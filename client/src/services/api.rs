use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use shared::{
    ApiErrorBody, Attendance, AttendanceFilters, AttendanceListResponse, AttendanceResponse,
    AttendanceStats, AttendanceStatsResponse, AuthResponse, CreateNoteRequest,
    CreateSubjectRequest, CreateTaskRequest, Credentials, DashboardOverview,
    DashboardOverviewResponse, Note, NoteFilters, NoteListResponse, NoteResponse, NoteUpdate,
    SessionRequest, Subject, SubjectListResponse, SubjectResponse, SubjectUpdate, Task,
    TaskFilters, TaskListResponse, TaskResponse, TaskUpdate, TasksSummary, TasksSummaryResponse,
    UpcomingTask, UpcomingTasksResponse, UpdateNoteRequest, UpdateSubjectRequest,
    UpdateTaskRequest, UpsertAttendanceRequest, Validate, ValidationError,
    VerifyAuthenticationResponse,
};
use tracing::debug;

use crate::config::{ClientConfig, DEFAULT_API_URL};
use crate::error::ApiError;

/// API client for the Taskly REST backend.
///
/// Every method issues exactly one request: no retries, no caching.
/// Authenticated methods take the session identifier explicitly and fail
/// with a precondition error, without touching the network, when it is blank.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client with the default base URL
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_API_URL.to_string())
    }

    /// Create a new API client with a custom base URL
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::with_base_url(config.api_url.clone())
    }

    /// Reuse an existing [`reqwest::Client`] (shares its connection pool)
    pub fn with_client(client: reqwest::Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ---- authentication ----

    /// Ask the server whether the stored session is still valid
    pub async fn verify_authentication(&self, user_id: &str) -> Result<bool, ApiError> {
        let user_id = ensure_session(user_id)?;
        let body = SessionRequest {
            id: user_id.to_string(),
        };
        let response: VerifyAuthenticationResponse = self
            .send(self.request(Method::POST, &["verifyAuthentication"])?.json(&body))
            .await?;
        Ok(response.is_authenticated)
    }

    /// Register a new account; returns the session identifier assigned by the server
    pub async fn sign_up(&self, credentials: &Credentials) -> Result<String, ApiError> {
        credentials.validate()?;
        let response: AuthResponse = self
            .send(self.request(Method::POST, &["signup"])?.json(credentials))
            .await?;
        session_from(response)
    }

    /// Sign in; returns the session identifier assigned by the server
    pub async fn log_in(&self, credentials: &Credentials) -> Result<String, ApiError> {
        credentials.validate()?;
        let response: AuthResponse = self
            .send(self.request(Method::POST, &["login"])?.json(credentials))
            .await?;
        session_from(response)
    }

    pub async fn log_out(&self, user_id: &str) -> Result<(), ApiError> {
        let user_id = ensure_session(user_id)?;
        let body = SessionRequest {
            id: user_id.to_string(),
        };
        self.send_empty(self.request(Method::POST, &["logout"])?.json(&body))
            .await
    }

    // ---- subjects ----

    pub async fn create_subject(
        &self,
        user_id: &str,
        subject: &Subject,
    ) -> Result<Option<Subject>, ApiError> {
        let user_id = ensure_session(user_id)?;
        subject.validate()?;
        let body = CreateSubjectRequest {
            id: user_id.to_string(),
            subject: subject.clone(),
        };
        let response: SubjectResponse = self
            .send(self.request(Method::POST, &["subjects"])?.json(&body))
            .await?;
        Ok(response.subject)
    }

    /// All subjects of the user; empty when the server sends none
    pub async fn get_subjects(&self, user_id: &str) -> Result<Vec<Subject>, ApiError> {
        let user_id = ensure_session(user_id)?;
        let response: SubjectListResponse = self
            .send(self.request(Method::GET, &["subjects"])?.query(&[("userId", user_id)]))
            .await?;
        Ok(response.subjects)
    }

    pub async fn update_subject(
        &self,
        user_id: &str,
        subject_id: &str,
        update: &SubjectUpdate,
    ) -> Result<Option<Subject>, ApiError> {
        let user_id = ensure_session(user_id)?;
        let subject_id = ensure_target("subjectId", subject_id)?;
        update.validate()?;
        let body = UpdateSubjectRequest {
            id: user_id.to_string(),
            subject: update.clone(),
        };
        let response: SubjectResponse = self
            .send(self.request(Method::PATCH, &["subjects", subject_id])?.json(&body))
            .await?;
        Ok(response.subject)
    }

    pub async fn delete_subject(&self, user_id: &str, subject_id: &str) -> Result<(), ApiError> {
        let user_id = ensure_session(user_id)?;
        let subject_id = ensure_target("subjectId", subject_id)?;
        self.send_empty(
            self.request(Method::DELETE, &["subjects", subject_id])?
                .query(&[("userId", user_id)]),
        )
        .await
    }

    // ---- tasks ----

    pub async fn create_task(&self, user_id: &str, task: &Task) -> Result<Option<Task>, ApiError> {
        let user_id = ensure_session(user_id)?;
        task.validate()?;
        let body = CreateTaskRequest {
            id: user_id.to_string(),
            task: task.clone(),
        };
        let response: TaskResponse = self
            .send(self.request(Method::POST, &["tasks"])?.json(&body))
            .await?;
        Ok(response.task)
    }

    pub async fn get_tasks(
        &self,
        user_id: &str,
        filters: &TaskFilters,
    ) -> Result<Vec<Task>, ApiError> {
        let user_id = ensure_session(user_id)?;
        let response: TaskListResponse = self
            .send(
                self.request(Method::GET, &["tasks"])?
                    .query(&[("userId", user_id)])
                    .query(filters),
            )
            .await?;
        Ok(response.tasks)
    }

    /// A single task; `None` when the server answered without one
    pub async fn get_task(&self, user_id: &str, task_id: &str) -> Result<Option<Task>, ApiError> {
        let user_id = ensure_session(user_id)?;
        let task_id = ensure_target("taskId", task_id)?;
        let response: TaskResponse = self
            .send(
                self.request(Method::GET, &["tasks", task_id])?
                    .query(&[("userId", user_id)]),
            )
            .await?;
        Ok(response.task)
    }

    pub async fn update_task(
        &self,
        user_id: &str,
        task_id: &str,
        update: &TaskUpdate,
    ) -> Result<Option<Task>, ApiError> {
        let user_id = ensure_session(user_id)?;
        let task_id = ensure_target("taskId", task_id)?;
        update.validate()?;
        let body = UpdateTaskRequest {
            id: user_id.to_string(),
            task: update.clone(),
        };
        let response: TaskResponse = self
            .send(self.request(Method::PATCH, &["tasks", task_id])?.json(&body))
            .await?;
        Ok(response.task)
    }

    pub async fn delete_task(&self, user_id: &str, task_id: &str) -> Result<(), ApiError> {
        let user_id = ensure_session(user_id)?;
        let task_id = ensure_target("taskId", task_id)?;
        self.send_empty(
            self.request(Method::DELETE, &["tasks", task_id])?
                .query(&[("userId", user_id)]),
        )
        .await
    }

    // ---- notes ----

    pub async fn create_note(&self, user_id: &str, note: &Note) -> Result<Option<Note>, ApiError> {
        let user_id = ensure_session(user_id)?;
        note.validate()?;
        let body = CreateNoteRequest {
            id: user_id.to_string(),
            note: note.clone(),
        };
        let response: NoteResponse = self
            .send(self.request(Method::POST, &["notes"])?.json(&body))
            .await?;
        Ok(response.note)
    }

    pub async fn get_notes(
        &self,
        user_id: &str,
        filters: &NoteFilters,
    ) -> Result<Vec<Note>, ApiError> {
        let user_id = ensure_session(user_id)?;
        let response: NoteListResponse = self
            .send(
                self.request(Method::GET, &["notes"])?
                    .query(&[("userId", user_id)])
                    .query(filters),
            )
            .await?;
        Ok(response.notes)
    }

    pub async fn get_note(&self, user_id: &str, note_id: &str) -> Result<Option<Note>, ApiError> {
        let user_id = ensure_session(user_id)?;
        let note_id = ensure_target("noteId", note_id)?;
        let response: NoteResponse = self
            .send(
                self.request(Method::GET, &["notes", note_id])?
                    .query(&[("userId", user_id)]),
            )
            .await?;
        Ok(response.note)
    }

    pub async fn update_note(
        &self,
        user_id: &str,
        note_id: &str,
        update: &NoteUpdate,
    ) -> Result<Option<Note>, ApiError> {
        let user_id = ensure_session(user_id)?;
        let note_id = ensure_target("noteId", note_id)?;
        update.validate()?;
        let body = UpdateNoteRequest {
            id: user_id.to_string(),
            note: update.clone(),
        };
        let response: NoteResponse = self
            .send(self.request(Method::PATCH, &["notes", note_id])?.json(&body))
            .await?;
        Ok(response.note)
    }

    pub async fn delete_note(&self, user_id: &str, note_id: &str) -> Result<(), ApiError> {
        let user_id = ensure_session(user_id)?;
        let note_id = ensure_target("noteId", note_id)?;
        self.send_empty(
            self.request(Method::DELETE, &["notes", note_id])?
                .query(&[("userId", user_id)]),
        )
        .await
    }

    // ---- attendance ----

    pub async fn get_attendance(
        &self,
        user_id: &str,
        subject_id: &str,
        filters: &AttendanceFilters,
    ) -> Result<Vec<Attendance>, ApiError> {
        let user_id = ensure_session(user_id)?;
        let subject_id = ensure_target("subjectId", subject_id)?;
        let response: AttendanceListResponse = self
            .send(
                self.request(Method::GET, &["subjects", subject_id, "attendance"])?
                    .query(&[("userId", user_id)])
                    .query(filters),
            )
            .await?;
        Ok(response.attendance)
    }

    /// Aggregates for one subject; all zeros when the subject has no records
    pub async fn get_attendance_stats(
        &self,
        user_id: &str,
        subject_id: &str,
    ) -> Result<AttendanceStats, ApiError> {
        let user_id = ensure_session(user_id)?;
        let subject_id = ensure_target("subjectId", subject_id)?;
        let response: AttendanceStatsResponse = self
            .send(
                self.request(Method::GET, &["subjects", subject_id, "attendance", "stats"])?
                    .query(&[("userId", user_id)]),
            )
            .await?;
        Ok(response.stats)
    }

    /// Create or replace the record for `attendance.date`
    pub async fn upsert_attendance(
        &self,
        user_id: &str,
        subject_id: &str,
        attendance: &Attendance,
    ) -> Result<Option<Attendance>, ApiError> {
        let user_id = ensure_session(user_id)?;
        let subject_id = ensure_target("subjectId", subject_id)?;
        attendance.validate()?;
        let body = UpsertAttendanceRequest {
            id: user_id.to_string(),
            attendance: attendance.clone(),
        };
        let response: AttendanceResponse = self
            .send(
                self.request(Method::POST, &["subjects", subject_id, "attendance"])?
                    .json(&body),
            )
            .await?;
        Ok(response.record)
    }

    pub async fn delete_attendance(
        &self,
        user_id: &str,
        subject_id: &str,
        date: &str,
    ) -> Result<(), ApiError> {
        let user_id = ensure_session(user_id)?;
        let subject_id = ensure_target("subjectId", subject_id)?;
        if !shared::is_valid_iso_date(date) {
            return Err(ApiError::Validation(vec![ValidationError::InvalidDate {
                field: "date".to_string(),
                value: date.to_string(),
            }]));
        }
        self.send_empty(
            self.request(Method::DELETE, &["subjects", subject_id, "attendance", date])?
                .query(&[("userId", user_id)]),
        )
        .await
    }

    // ---- dashboard ----

    pub async fn get_dashboard_overview(
        &self,
        user_id: &str,
        upcoming_limit: Option<u32>,
    ) -> Result<DashboardOverview, ApiError> {
        let user_id = ensure_session(user_id)?;
        let mut request = self
            .request(Method::GET, &["dashboard"])?
            .query(&[("userId", user_id)]);
        if let Some(limit) = upcoming_limit {
            request = request.query(&[("upcomingLimit", limit)]);
        }
        let response: DashboardOverviewResponse = self.send(request).await?;
        Ok(response.overview)
    }

    pub async fn get_tasks_summary(&self, user_id: &str) -> Result<TasksSummary, ApiError> {
        let user_id = ensure_session(user_id)?;
        let response: TasksSummaryResponse = self
            .send(
                self.request(Method::GET, &["dashboard", "tasks-summary"])?
                    .query(&[("userId", user_id)]),
            )
            .await?;
        Ok(response.summary)
    }

    pub async fn get_upcoming_tasks(
        &self,
        user_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<UpcomingTask>, ApiError> {
        let user_id = ensure_session(user_id)?;
        let mut request = self
            .request(Method::GET, &["dashboard", "upcoming-tasks"])?
            .query(&[("userId", user_id)]);
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        let response: UpcomingTasksResponse = self.send(request).await?;
        Ok(response.upcoming_tasks)
    }

    // ---- private helpers ----

    /// Build `<base_url>/<segments...>`; each segment is percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let invalid = |reason: String| ApiError::InvalidUrl {
            url: self.base_url.clone(),
            reason,
        };
        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(segments)?;
        debug!(method = %method, path = url.path(), "Sending API request");
        Ok(self.client.request(method, url))
    }

    /// Send and decode a JSON envelope. An empty or `null` body decodes to
    /// the envelope's default, so absent payloads become empty collections.
    async fn send<T: DeserializeOwned + Default>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(request.send().await?).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(T::default());
        }
        let value: serde_json::Value = serde_json::from_str(&text)?;
        if value.is_null() {
            return Ok(T::default());
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Send and discard the body
    async fn send_empty(&self, request: RequestBuilder) -> Result<(), ApiError> {
        Self::ensure_success(request.send().await?).await?;
        Ok(())
    }

    /// Turn a non-2xx response into [`ApiError::Server`], keeping whatever
    /// `{error, details}` payload the server sent
    async fn ensure_success(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<ApiErrorBody>(&text).unwrap_or_default();
        debug!(status = status.as_u16(), error = ?body.error, "API request failed");
        Err(ApiError::Server {
            status: status.as_u16(),
            body,
        })
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_session(user_id: &str) -> Result<&str, ApiError> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        Err(ApiError::not_signed_in())
    } else {
        Ok(trimmed)
    }
}

fn ensure_target<'a>(field: &str, id: &'a str) -> Result<&'a str, ApiError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(ApiError::Validation(vec![ValidationError::Blank {
            field: field.to_string(),
        }]))
    } else {
        Ok(trimmed)
    }
}

fn session_from(response: AuthResponse) -> Result<String, ApiError> {
    response
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| {
            ApiError::UnexpectedResponse("response did not include a session identifier".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = ApiClient::with_base_url("http://localhost:3001/".to_string());
        let url = client.endpoint(&["subjects", "a b/c", "attendance"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3001/subjects/a%20b%2Fc/attendance");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = ApiClient::with_base_url("http://host:8080/api".to_string());
        let url = client.endpoint(&["dashboard", "tasks-summary"]).unwrap();
        assert_eq!(url.as_str(), "http://host:8080/api/dashboard/tasks-summary");
    }

    #[test]
    fn test_invalid_base_url() {
        let client = ApiClient::with_base_url("not a url".to_string());
        let err = client.endpoint(&["subjects"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
    }

    #[test]
    fn test_ensure_session() {
        assert_eq!(ensure_session(" abc ").unwrap(), "abc");
        assert_eq!(ensure_session("").unwrap_err().kind(), ErrorKind::Precondition);
        assert_eq!(ensure_session("   ").unwrap_err().kind(), ErrorKind::Precondition);
    }

    #[test]
    fn test_session_from_requires_id() {
        let ok = AuthResponse {
            id: Some("abc".to_string()),
        };
        assert_eq!(session_from(ok).unwrap(), "abc");

        let err = session_from(AuthResponse::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Server);
    }
}
