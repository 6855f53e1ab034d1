use shared::{Attendance, AttendanceFilters, AttendanceStats};
use tracing::debug;

use crate::error::ApiError;
use crate::services::api::ApiClient;

/// Records plus aggregates for one subject, loaded together
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubjectAttendance {
    pub records: Vec<Attendance>,
    pub stats: AttendanceStats,
}

impl SubjectAttendance {
    pub fn is_at_risk(&self) -> bool {
        self.stats.is_at_risk()
    }
}

/// Fetch records and stats concurrently.
///
/// Both requests are awaited; if either fails the whole load fails and no
/// partial result is returned.
pub async fn load_subject_attendance(
    api: &ApiClient,
    user_id: &str,
    subject_id: &str,
    filters: &AttendanceFilters,
) -> Result<SubjectAttendance, ApiError> {
    debug!(subject_id, "Loading subject attendance");
    let (records, stats) = tokio::try_join!(
        api.get_attendance(user_id, subject_id, filters),
        api.get_attendance_stats(user_id, subject_id),
    )?;
    Ok(SubjectAttendance { records, stats })
}
