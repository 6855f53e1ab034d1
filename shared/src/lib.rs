use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Attendance rate (in percent) below which a subject is flagged as at risk
pub const ATTENDANCE_RISK_THRESHOLD: f64 = 75.0;

/// Decode a present-but-`null` field as its default. Absent fields are
/// handled by `#[serde(default)]` on the container.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept any JSON for the error text; only a string is kept
fn lenient_error<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(error) => Some(error),
        _ => None,
    })
}

/// `details` as a list of strings, a single string, or anything else (ignored)
fn lenient_details<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(detail) => Some(detail),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Value::String(detail) if !detail.trim().is_empty() => vec![detail],
        _ => Vec::new(),
    })
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

/// Email/password pair sent to `/signup` and `/login`
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

// Never print the password, not even in debug logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Response of `/signup` and `/login`: the session identifier assigned by the server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthResponse {
    pub id: Option<String>,
}

/// Body carrying only the session identifier (`/logout`, `/verifyAuthentication`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRequest {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VerifyAuthenticationResponse {
    pub is_authenticated: bool,
}

/// Error payload returned by the API on non-2xx responses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiErrorBody {
    #[serde(deserialize_with = "lenient_error")]
    pub error: Option<String>,
    #[serde(deserialize_with = "lenient_details")]
    pub details: Vec<String>,
}

impl ApiErrorBody {
    /// Human-readable message: `"error: detail1, detail2"`, or just `"error"`
    pub fn message(&self) -> Option<String> {
        let error = self.error.as_deref().map(str::trim).filter(|e| !e.is_empty())?;
        if self.details.is_empty() {
            Some(error.to_string())
        } else {
            Some(format!("{}: {}", error, self.details.join(", ")))
        }
    }
}

// ---------------------------------------------------------------------------
// Subjects
// ---------------------------------------------------------------------------

/// An academic course entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    /// Assigned by the server once the subject is persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub subject_name: String,
    pub teacher_name: String,
    /// `#RRGGBB`
    pub color: String,
    pub icon: String,
    pub total_classes: u32,
    /// Start time of the class, `HH:MM`
    pub class_time: String,
    pub semester: String,
    pub year: i32,
    pub college_period: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub days_of_week: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_end_time: Option<String>,
    #[serde(default, skip_serializing)]
    pub created_at: Option<serde_json::Value>,
    #[serde(default, skip_serializing)]
    pub updated_at: Option<serde_json::Value>,
}

/// Partial update for a subject; only the fields that are set are sent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_classes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semester: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub college_period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_end_time: Option<String>,
}

impl From<&Subject> for SubjectUpdate {
    fn from(subject: &Subject) -> Self {
        Self {
            subject_name: Some(subject.subject_name.clone()),
            teacher_name: Some(subject.teacher_name.clone()),
            color: Some(subject.color.clone()),
            icon: Some(subject.icon.clone()),
            total_classes: Some(subject.total_classes),
            class_time: Some(subject.class_time.clone()),
            semester: Some(subject.semester.clone()),
            year: Some(subject.year),
            college_period: Some(subject.college_period.clone()),
            days_of_week: Some(subject.days_of_week.clone()),
            class_end_time: subject.class_end_time.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSubjectRequest {
    /// Session identifier
    pub id: String,
    pub subject: Subject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateSubjectRequest {
    pub id: String,
    pub subject: SubjectUpdate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubjectListResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub subjects: Vec<Subject>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubjectResponse {
    pub subject: Option<Subject>,
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Assignment,
    Exam,
    Quiz,
    Presentation,
    Project,
    Other,
}

impl TaskType {
    pub fn label(&self) -> &'static str {
        match self {
            TaskType::Assignment => "Assignment",
            TaskType::Exam => "Exam",
            TaskType::Quiz => "Quiz",
            TaskType::Presentation => "Presentation",
            TaskType::Project => "Project",
            TaskType::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Delivered,
    Completed,
}

impl TaskStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::Delivered => "Delivered",
            TaskStatus::Completed => "Completed",
        }
    }
}

/// Due date encoded as an 8-digit `YYYYMMDD` integer, the way the API stores it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DueDate(u32);

impl DueDate {
    /// Wrap a raw value without checking it; see [`DueDate::is_valid`]
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).and_then(Self::from_date)
    }

    /// Only years 1000-9999 fit in eight digits
    pub fn from_date(date: NaiveDate) -> Option<Self> {
        let year = u32::try_from(date.year()).ok().filter(|y| (1000..=9999).contains(y))?;
        Some(Self(year * 10_000 + date.month() * 100 + date.day()))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    pub fn to_date(self) -> Option<NaiveDate> {
        if !(10_000_000..=99_999_999).contains(&self.0) {
            return None;
        }
        let year = (self.0 / 10_000) as i32;
        let month = (self.0 / 100) % 100;
        let day = self.0 % 100;
        NaiveDate::from_ymd_opt(year, month, day)
    }

    pub fn is_valid(self) -> bool {
        self.to_date().is_some()
    }

    /// Whole days from `today` to the due date (negative once it has passed)
    pub fn days_until(self, today: NaiveDate) -> Option<i64> {
        self.to_date().map(|due| (due - today).num_days())
    }

    pub fn is_overdue(self, today: NaiveDate) -> bool {
        matches!(self.days_until(today), Some(days) if days < 0)
    }

    /// Short label for task cards, e.g. "Due in 3 days"
    pub fn days_until_label(self, today: NaiveDate) -> String {
        match self.days_until(today) {
            None => "Invalid date".to_string(),
            Some(days) if days < 0 => "Overdue".to_string(),
            Some(0) => "Due today".to_string(),
            Some(1) => "Due tomorrow".to_string(),
            Some(days) => format!("Due in {} days", days),
        }
    }
}

impl fmt::Display for DueDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08}", self.0)
    }
}

/// Accepts both `20250314` and `2025-03-14`
impl FromStr for DueDate {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = if trimmed.len() == 8 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            trimmed.parse::<u32>().ok().map(DueDate)
        } else {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .and_then(DueDate::from_date)
        };

        parsed
            .filter(|due| due.is_valid())
            .ok_or_else(|| ValidationError::InvalidDate {
                field: "dueOn".to_string(),
                value: trimmed.to_string(),
            })
    }
}

/// An actionable item tied to a subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub subject_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_name: Option<String>,
    pub due_on: DueDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Computed by the server; never sent back
    #[serde(default, skip_serializing)]
    pub is_overdue: Option<bool>,
    #[serde(default, skip_serializing)]
    pub created_at: Option<serde_json::Value>,
    #[serde(default, skip_serializing)]
    pub updated_at: Option<serde_json::Value>,
}

impl Task {
    /// Overdue flag, derived locally when the server did not send one.
    /// Delivered and completed tasks are never overdue.
    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        if self.status != TaskStatus::Pending {
            return false;
        }
        self.is_overdue
            .unwrap_or_else(|| self.due_on.is_overdue(today))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub task_type: Option<TaskType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_on: Option<DueDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TaskUpdate {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

/// Optional filters for `GET /tasks`; unset fields are omitted from the query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub task_type: Option<TaskType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DueDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DueDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub id: String,
    pub task: Task,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    pub id: String,
    pub task: TaskUpdate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskListResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskResponse {
    pub task: Option<Task>,
}

// ---------------------------------------------------------------------------
// Notes
// ---------------------------------------------------------------------------

/// Free-text Markdown note tied to a subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub subject_id: String,
    pub title: String,
    /// Markdown
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
    #[serde(default, skip_serializing)]
    pub created_at: Option<serde_json::Value>,
    #[serde(default, skip_serializing)]
    pub updated_at: Option<serde_json::Value>,
}

impl Note {
    pub fn is_pinned(&self) -> bool {
        self.pinned.unwrap_or(false)
    }

    /// First `max_chars` characters of the content, on one line
    pub fn preview(&self, max_chars: usize) -> String {
        let flat: String = self
            .content
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if flat.chars().count() <= max_chars {
            flat
        } else {
            let cut: String = flat.chars().take(max_chars).collect();
            format!("{}...", cut.trim_end())
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    pub id: String,
    pub note: Note,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateNoteRequest {
    pub id: String,
    pub note: NoteUpdate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteListResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub notes: Vec<Note>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteResponse {
    pub note: Option<Note>,
}

// ---------------------------------------------------------------------------
// Attendance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Justified,
}

impl AttendanceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
            AttendanceStatus::Late => "Late",
            AttendanceStatus::Justified => "Justified",
        }
    }
}

/// One attendance record per subject and day. The date doubles as the record ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    /// `YYYY-MM-DD`
    pub date: String,
    pub status: AttendanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing)]
    pub created_at: Option<serde_json::Value>,
    #[serde(default, skip_serializing)]
    pub updated_at: Option<serde_json::Value>,
}

impl Attendance {
    pub fn new(date: impl Into<String>, status: AttendanceStatus) -> Self {
        Self {
            date: date.into(),
            status,
            notes: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.date
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AttendanceStatus>,
    /// `YYYY-MM-DD`, inclusive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Server-computed attendance aggregates for one subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AttendanceStats {
    pub total: u32,
    pub present: u32,
    pub absent: u32,
    pub late: u32,
    pub justified: u32,
    /// Percentage with two decimals, e.g. `"87.50"`
    pub attendance_rate: String,
}

impl Default for AttendanceStats {
    fn default() -> Self {
        Self {
            total: 0,
            present: 0,
            absent: 0,
            late: 0,
            justified: 0,
            attendance_rate: "0.00".to_string(),
        }
    }
}

impl AttendanceStats {
    pub fn rate_percent(&self) -> f64 {
        self.attendance_rate.trim().parse().unwrap_or(0.0)
    }

    /// Subjects without any record are not at risk yet
    pub fn is_at_risk(&self) -> bool {
        self.total > 0 && self.rate_percent() < ATTENDANCE_RISK_THRESHOLD
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertAttendanceRequest {
    pub id: String,
    pub attendance: Attendance,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttendanceListResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub attendance: Vec<Attendance>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttendanceResponse {
    pub record: Option<Attendance>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttendanceStatsResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub stats: AttendanceStats,
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TasksSummary {
    pub total: u32,
    pub pending: u32,
    pub delivered: u32,
    pub completed: u32,
    pub overdue: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingTask {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub subject_id: String,
    #[serde(default)]
    pub subject_name: Option<String>,
    pub due_on: DueDate,
    #[serde(default)]
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubjectAttendanceSummary {
    pub total_classes: u32,
    pub presences: u32,
    pub absences: u32,
    pub lates: u32,
    pub justified: u32,
    pub attendance_rate: f64,
    pub is_at_risk: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubjectSummary {
    pub subject_id: String,
    pub subject_name: String,
    pub color: String,
    pub icon: String,
    pub pending_tasks: u32,
    pub attendance: SubjectAttendanceSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub total_classes: u32,
    pub presences: u32,
    pub absences: u32,
    pub lates: u32,
    pub justified: u32,
    pub attendance_rate: f64,
}

impl AttendanceSummary {
    pub fn is_at_risk(&self) -> bool {
        self.total_classes > 0 && self.attendance_rate < ATTENDANCE_RISK_THRESHOLD
    }
}

/// Aggregated read-only view for the dashboard screen
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DashboardOverview {
    #[serde(deserialize_with = "null_as_default")]
    pub upcoming_tasks: Vec<UpcomingTask>,
    #[serde(deserialize_with = "null_as_default")]
    pub tasks_summary: TasksSummary,
    #[serde(deserialize_with = "null_as_default")]
    pub subjects_summary: Vec<SubjectSummary>,
    #[serde(deserialize_with = "null_as_default")]
    pub attendance_summary: AttendanceSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardOverviewResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub overview: DashboardOverview,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TasksSummaryResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub summary: TasksSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpcomingTasksResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub upcoming_tasks: Vec<UpcomingTask>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Field-level validation failures detected before a request is sent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValidationError {
    Blank { field: String },
    InvalidEmail,
    NotPositive { field: String },
    InvalidTime { field: String, value: String },
    InvalidColor(String),
    InvalidYear(i32),
    InvalidDate { field: String, value: String },
}

impl ValidationError {
    fn blank(field: &str) -> Self {
        ValidationError::Blank {
            field: field.to_string(),
        }
    }

    pub fn message(&self) -> String {
        match self {
            ValidationError::Blank { field } => format!("{} is required", field),
            ValidationError::InvalidEmail => "Please enter a valid email address".to_string(),
            ValidationError::NotPositive { field } => format!("{} must be greater than 0", field),
            ValidationError::InvalidTime { field, value } => {
                format!("{} must be a time in HH:MM format (got '{}')", field, value)
            }
            ValidationError::InvalidColor(value) => {
                format!("color must be a hex value like #3B82F6 (got '{}')", value)
            }
            ValidationError::InvalidYear(year) => format!("year {} is out of range", year),
            ValidationError::InvalidDate { field, value } => {
                format!("{} is not a valid date (got '{}')", field, value)
            }
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Client-side checks run on every payload before it is serialized
pub trait Validate {
    fn validation_errors(&self) -> Vec<ValidationError>;

    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let errors = self.validation_errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn check_not_blank(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(ValidationError::blank(field));
    }
}

fn check_time(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    let well_formed = value.len() == 5
        && value.as_bytes()[2] == b':'
        && NaiveTime::parse_from_str(value, "%H:%M").is_ok();
    if !well_formed {
        errors.push(ValidationError::InvalidTime {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}

fn check_color(errors: &mut Vec<ValidationError>, value: &str) {
    let well_formed = value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !well_formed {
        errors.push(ValidationError::InvalidColor(value.to_string()));
    }
}

fn check_year(errors: &mut Vec<ValidationError>, year: i32) {
    if !(1900..=9999).contains(&year) {
        errors.push(ValidationError::InvalidYear(year));
    }
}

fn check_due_date(errors: &mut Vec<ValidationError>, due_on: DueDate) {
    if !due_on.is_valid() {
        errors.push(ValidationError::InvalidDate {
            field: "dueOn".to_string(),
            value: due_on.to_string(),
        });
    }
}

/// `YYYY-MM-DD` with a real calendar date behind it
pub fn is_valid_iso_date(value: &str) -> bool {
    value.len() == 10 && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

impl Validate for Credentials {
    fn validation_errors(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let email = self.email.trim();
        let at_sign = email.find('@');
        let well_formed = matches!(at_sign, Some(pos) if pos > 0 && pos < email.len() - 1);
        if email.is_empty() {
            errors.push(ValidationError::blank("email"));
        } else if !well_formed {
            errors.push(ValidationError::InvalidEmail);
        }
        if self.password.is_empty() {
            errors.push(ValidationError::blank("password"));
        }
        errors
    }
}

impl Validate for Subject {
    fn validation_errors(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_not_blank(&mut errors, "subjectName", &self.subject_name);
        check_not_blank(&mut errors, "teacherName", &self.teacher_name);
        check_not_blank(&mut errors, "semester", &self.semester);
        if self.total_classes == 0 {
            errors.push(ValidationError::NotPositive {
                field: "totalClasses".to_string(),
            });
        }
        check_time(&mut errors, "classTime", &self.class_time);
        if let Some(end) = &self.class_end_time {
            check_time(&mut errors, "classEndTime", end);
        }
        check_color(&mut errors, &self.color);
        check_year(&mut errors, self.year);
        errors
    }
}

impl Validate for SubjectUpdate {
    fn validation_errors(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if let Some(name) = &self.subject_name {
            check_not_blank(&mut errors, "subjectName", name);
        }
        if let Some(teacher) = &self.teacher_name {
            check_not_blank(&mut errors, "teacherName", teacher);
        }
        if let Some(semester) = &self.semester {
            check_not_blank(&mut errors, "semester", semester);
        }
        if self.total_classes == Some(0) {
            errors.push(ValidationError::NotPositive {
                field: "totalClasses".to_string(),
            });
        }
        if let Some(time) = &self.class_time {
            check_time(&mut errors, "classTime", time);
        }
        if let Some(end) = &self.class_end_time {
            check_time(&mut errors, "classEndTime", end);
        }
        if let Some(color) = &self.color {
            check_color(&mut errors, color);
        }
        if let Some(year) = self.year {
            check_year(&mut errors, year);
        }
        errors
    }
}

impl Validate for Task {
    fn validation_errors(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_not_blank(&mut errors, "title", &self.title);
        check_not_blank(&mut errors, "subjectId", &self.subject_id);
        check_due_date(&mut errors, self.due_on);
        errors
    }
}

impl Validate for TaskUpdate {
    fn validation_errors(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if let Some(title) = &self.title {
            check_not_blank(&mut errors, "title", title);
        }
        if let Some(subject_id) = &self.subject_id {
            check_not_blank(&mut errors, "subjectId", subject_id);
        }
        if let Some(due_on) = self.due_on {
            check_due_date(&mut errors, due_on);
        }
        errors
    }
}

impl Validate for Note {
    fn validation_errors(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_not_blank(&mut errors, "title", &self.title);
        check_not_blank(&mut errors, "content", &self.content);
        check_not_blank(&mut errors, "subjectId", &self.subject_id);
        errors
    }
}

impl Validate for NoteUpdate {
    fn validation_errors(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if let Some(title) = &self.title {
            check_not_blank(&mut errors, "title", title);
        }
        if let Some(content) = &self.content {
            check_not_blank(&mut errors, "content", content);
        }
        if let Some(subject_id) = &self.subject_id {
            check_not_blank(&mut errors, "subjectId", subject_id);
        }
        errors
    }
}

impl Validate for Attendance {
    fn validation_errors(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if !is_valid_iso_date(&self.date) {
            errors.push(ValidationError::InvalidDate {
                field: "date".to_string(),
                value: self.date.clone(),
            });
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calculus() -> Subject {
        Subject {
            id: None,
            subject_name: "Calculus".to_string(),
            teacher_name: "Dr. Lee".to_string(),
            color: "#3B82F6".to_string(),
            icon: "calculate".to_string(),
            total_classes: 40,
            class_time: "08:00".to_string(),
            semester: "2025/1".to_string(),
            year: 2025,
            college_period: "3".to_string(),
            days_of_week: Vec::new(),
            class_end_time: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_subject_serializes_camel_case_without_unset_fields() {
        let json = serde_json::to_value(calculus()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "subjectName": "Calculus",
                "teacherName": "Dr. Lee",
                "totalClasses": 40,
                "classTime": "08:00",
                "semester": "2025/1",
                "year": 2025,
                "collegePeriod": "3",
                "color": "#3B82F6",
                "icon": "calculate"
            })
        );
    }

    #[test]
    fn test_task_wire_format() {
        let json = serde_json::json!({
            "id": "t1",
            "title": "Midterm",
            "type": "exam",
            "status": "pending",
            "subjectId": "s1",
            "dueOn": 20250314,
            "isOverdue": true,
            "createdAt": {"_seconds": 1}
        });
        let task: Task = serde_json::from_value(json).unwrap();
        assert_eq!(task.task_type, TaskType::Exam);
        assert_eq!(task.due_on.value(), 20250314);
        assert_eq!(task.is_overdue, Some(true));

        // Server-owned fields never go back over the wire
        let back = serde_json::to_value(&task).unwrap();
        assert!(back.get("isOverdue").is_none());
        assert!(back.get("createdAt").is_none());
        assert_eq!(back["type"], "exam");
    }

    #[test]
    fn test_due_date_conversions() {
        let due = DueDate::from_ymd(2025, 3, 14).unwrap();
        assert_eq!(due.value(), 20250314);
        assert_eq!(due.to_string(), "20250314");
        assert_eq!(due.to_date(), Some(day(2025, 3, 14)));

        assert_eq!("20250314".parse::<DueDate>().unwrap(), due);
        assert_eq!("2025-03-14".parse::<DueDate>().unwrap(), due);
        assert!("20250230".parse::<DueDate>().is_err());
        assert!("tomorrow".parse::<DueDate>().is_err());
        assert!(!DueDate::new(2025031).is_valid());
    }

    #[test]
    fn test_due_date_days_until() {
        let due = DueDate::from_ymd(2025, 3, 14).unwrap();
        assert_eq!(due.days_until(day(2025, 3, 10)), Some(4));
        assert_eq!(due.days_until_label(day(2025, 3, 10)), "Due in 4 days");
        assert_eq!(due.days_until_label(day(2025, 3, 13)), "Due tomorrow");
        assert_eq!(due.days_until_label(day(2025, 3, 14)), "Due today");
        assert_eq!(due.days_until_label(day(2025, 3, 15)), "Overdue");
        assert!(due.is_overdue(day(2025, 3, 15)));
        assert!(!due.is_overdue(day(2025, 3, 14)));
    }

    #[test]
    fn test_task_overdue_derivation() {
        let mut task = Task {
            id: None,
            title: "Essay".to_string(),
            task_type: TaskType::Assignment,
            status: TaskStatus::Pending,
            subject_id: "s1".to_string(),
            subject_name: None,
            due_on: DueDate::from_ymd(2025, 3, 14).unwrap(),
            notes: None,
            is_overdue: None,
            created_at: None,
            updated_at: None,
        };
        assert!(task.is_overdue_on(day(2025, 3, 20)));
        assert!(!task.is_overdue_on(day(2025, 3, 1)));

        // Server flag wins when present
        task.is_overdue = Some(false);
        assert!(!task.is_overdue_on(day(2025, 3, 20)));

        task.is_overdue = Some(true);
        task.status = TaskStatus::Completed;
        assert!(!task.is_overdue_on(day(2025, 3, 20)));
    }

    #[test]
    fn test_filters_skip_unset_fields() {
        let filters = TaskFilters {
            status: Some(TaskStatus::Pending),
            ..Default::default()
        };
        let json = serde_json::to_value(&filters).unwrap();
        assert_eq!(json, serde_json::json!({"status": "pending"}));

        let empty = serde_json::to_value(NoteFilters::default()).unwrap();
        assert_eq!(empty, serde_json::json!({}));
    }

    #[test]
    fn test_envelopes_default_when_field_missing() {
        let subjects: SubjectListResponse = serde_json::from_str("{}").unwrap();
        assert!(subjects.subjects.is_empty());

        let stats: AttendanceStatsResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(stats.stats.attendance_rate, "0.00");
        assert_eq!(stats.stats.total, 0);

        let overview: DashboardOverviewResponse =
            serde_json::from_str(r#"{"overview": {"tasksSummary": {"pending": 2}}}"#).unwrap();
        assert_eq!(overview.overview.tasks_summary.pending, 2);
        assert!(overview.overview.upcoming_tasks.is_empty());
    }

    #[test]
    fn test_envelopes_default_when_field_null() {
        let tasks: TaskListResponse = serde_json::from_str(r#"{"tasks": null}"#).unwrap();
        assert!(tasks.tasks.is_empty());

        let attendance: AttendanceListResponse =
            serde_json::from_str(r#"{"attendance": null}"#).unwrap();
        assert!(attendance.attendance.is_empty());

        let stats: AttendanceStatsResponse = serde_json::from_str(r#"{"stats": null}"#).unwrap();
        assert_eq!(stats.stats, AttendanceStats::default());

        let overview: DashboardOverviewResponse = serde_json::from_str(
            r#"{"overview": {"upcomingTasks": null, "subjectsSummary": null}}"#,
        )
        .unwrap();
        assert_eq!(overview.overview, DashboardOverview::default());
    }

    #[test]
    fn test_api_error_body_message() {
        let body: ApiErrorBody =
            serde_json::from_str(r#"{"error": "X", "details": ["a", "b"]}"#).unwrap();
        assert_eq!(body.message().as_deref(), Some("X: a, b"));

        let body: ApiErrorBody = serde_json::from_str(r#"{"error": "X"}"#).unwrap();
        assert_eq!(body.message().as_deref(), Some("X"));

        let body: ApiErrorBody = serde_json::from_str(r#"{"error": "  "}"#).unwrap();
        assert_eq!(body.message(), None);
    }

    #[test]
    fn test_api_error_body_tolerates_odd_details() {
        let body: ApiErrorBody =
            serde_json::from_str(r#"{"error": "X", "details": "x"}"#).unwrap();
        assert_eq!(body.message().as_deref(), Some("X: x"));

        let body: ApiErrorBody =
            serde_json::from_str(r#"{"error": "X", "details": {"field": "title"}}"#).unwrap();
        assert_eq!(body.message().as_deref(), Some("X"));

        let body: ApiErrorBody =
            serde_json::from_str(r#"{"error": "X", "details": null}"#).unwrap();
        assert_eq!(body.message().as_deref(), Some("X"));

        let body: ApiErrorBody =
            serde_json::from_str(r#"{"error": "X", "details": ["a", 3]}"#).unwrap();
        assert_eq!(body.message().as_deref(), Some("X: a, 3"));

        let body: ApiErrorBody = serde_json::from_str(r#"{"error": 42}"#).unwrap();
        assert_eq!(body.message(), None);
    }

    #[test]
    fn test_subject_validation() {
        assert!(calculus().validate().is_ok());

        let mut subject = calculus();
        subject.subject_name = "  ".to_string();
        subject.total_classes = 0;
        subject.class_time = "8:00".to_string();
        subject.color = "blue".to_string();
        subject.year = 1200;
        let errors = subject.validate().unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(matches!(errors[0], ValidationError::Blank { .. }));
        assert!(errors.contains(&ValidationError::InvalidColor("blue".to_string())));
        assert!(errors.contains(&ValidationError::InvalidYear(1200)));
    }

    #[test]
    fn test_partial_updates_validate_only_present_fields() {
        assert!(SubjectUpdate::default().validate().is_ok());
        assert!(TaskUpdate::status(TaskStatus::Completed).validate().is_ok());

        let update = NoteUpdate {
            title: Some("".to_string()),
            ..Default::default()
        };
        assert_eq!(
            update.validate().unwrap_err(),
            vec![ValidationError::Blank {
                field: "title".to_string()
            }]
        );
    }

    #[test]
    fn test_credentials_validation() {
        assert!(Credentials::new("ana@uni.edu", "secret").validate().is_ok());
        assert_eq!(
            Credentials::new("ana", "secret").validate().unwrap_err(),
            vec![ValidationError::InvalidEmail]
        );
        assert_eq!(Credentials::new("", "").validate().unwrap_err().len(), 2);
        assert!(!format!("{:?}", Credentials::new("a@b.c", "hunter2")).contains("hunter2"));
    }

    #[test]
    fn test_attendance_validation_and_stats() {
        assert!(Attendance::new("2025-03-14", AttendanceStatus::Late).validate().is_ok());
        assert!(Attendance::new("14/03/2025", AttendanceStatus::Late).validate().is_err());
        assert!(Attendance::new("2025-02-30", AttendanceStatus::Late).validate().is_err());

        let stats = AttendanceStats {
            total: 10,
            present: 7,
            absent: 3,
            attendance_rate: "70.00".to_string(),
            ..Default::default()
        };
        assert_eq!(stats.rate_percent(), 70.0);
        assert!(stats.is_at_risk());
        assert!(!AttendanceStats::default().is_at_risk());
    }

    #[test]
    fn test_note_preview() {
        let note = Note {
            id: None,
            subject_id: "s1".to_string(),
            title: "Limits".to_string(),
            content: "# Limits\n\nThe limit of f as x approaches a".to_string(),
            pinned: None,
            created_at: None,
            updated_at: None,
        };
        assert_eq!(note.preview(12), "# Limits The...");
        assert_eq!(note.preview(200), "# Limits The limit of f as x approaches a");
        assert!(!note.is_pinned());
    }
}
