use chrono::NaiveDate;
use serde::Serialize;

#[derive(Serialize)]
pub struct TrainingSession {
    pub id: i64,
    pub title: String,
    pub date: NaiveDate,
    pub trainer_id: i64,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbTrainingSession {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub trainer_id: Option<i64>,
}

impl From<DbTrainingSession> for TrainingSession {
    fn from(session: DbTrainingSession) -> Self {
        Self {
            id: session.id.unwrap_or_default(),
            title: session.title.unwrap_or_default(),
            date: session.date.unwrap_or_default(),
            trainer_id: session.trainer_id.unwrap_or_default(),
        }
    }
}

#[derive(Serialize)]
pub struct AttendanceRecord {
    pub id: i64,
    pub session_id: i64,
    pub student_id: i64,
    pub present: bool,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbAttendanceRecord {
    pub id: Option<i64>,
    pub session_id: Option<i64>,
    pub student_id: Option<i64>,
    pub present: Option<bool>,
}

impl From<DbAttendanceRecord> for AttendanceRecord {
    fn from(record: DbAttendanceRecord) -> Self {
        Self {
            id: record.id.unwrap_or_default(),
            session_id: record.session_id.unwrap_or_default(),
            student_id: record.student_id.unwrap_or_default(),
            present: record.present.unwrap_or_default(),
        }
    }
}
