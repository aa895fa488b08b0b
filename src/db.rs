use chrono::NaiveDate;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::auth::{DbUser, User};
use crate::error::AppError;
use crate::models::{
    AttendanceRecord, DbAttendanceRecord, DbTrainingSession, TrainingSession,
};

/// Session dates travel as strings and are parsed here, so a malformed
/// date surfaces as a 400 from the store layer rather than being stored
/// verbatim by SQLite's loose typing.
fn parse_session_date(date: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| AppError::Validation(format!("Invalid session date '{}': {}", date, e)))
}

#[instrument(skip_all, fields(email))]
pub async fn authenticate_user(
    pool: &Pool<Sqlite>,
    email: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    info!("Authenticating user");

    #[derive(sqlx::FromRow)]
    struct CredentialRow {
        id: i64,
        name: String,
        email: String,
        password: String,
        role: String,
    }

    let row = sqlx::query_as::<_, CredentialRow>(
        "SELECT id, name, email, password, role FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(user) => {
            // A missing user and a failed hash check are indistinguishable
            // to the caller.
            let valid = bcrypt::verify(password, &user.password).unwrap_or(false);
            if valid {
                Ok(Some(User::from(DbUser {
                    id: Some(user.id),
                    name: Some(user.name),
                    email: Some(user.email),
                    role: Some(user.role),
                })))
            } else {
                Ok(None)
            }
        }
        _ => Ok(None),
    }
}

#[instrument(skip_all, fields(email, role))]
pub async fn create_user(
    pool: &Pool<Sqlite>,
    name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> Result<i64, AppError> {
    info!("Creating new user");

    let existing_user = sqlx::query("SELECT id FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    if existing_user.is_some() {
        return Err(AppError::Conflict(format!(
            "Email '{}' is already registered",
            email
        )));
    }

    let hashed_password = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;

    let res = sqlx::query("INSERT INTO users (name, email, password, role) VALUES (?, ?, ?, ?)")
        .bind(name)
        .bind(email)
        .bind(hashed_password)
        .bind(role)
        .execute(pool)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument]
pub async fn find_user_by_email(
    pool: &Pool<Sqlite>,
    email: &str,
) -> Result<Option<User>, AppError> {
    info!("Finding user by email");

    let row = sqlx::query_as::<_, DbUser>("SELECT id, name, email, role FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(User::from))
}

#[instrument]
pub async fn create_session(
    pool: &Pool<Sqlite>,
    title: &str,
    date: &str,
    trainer_id: i64,
) -> Result<i64, AppError> {
    info!("Creating training session");

    let date = parse_session_date(date)?;

    let res = sqlx::query("INSERT INTO sessions (title, date, trainer_id) VALUES (?, ?, ?)")
        .bind(title)
        .bind(date)
        .bind(trainer_id)
        .execute(pool)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument]
pub async fn get_all_sessions(pool: &Pool<Sqlite>) -> Result<Vec<TrainingSession>, AppError> {
    info!("Getting all training sessions");

    let rows = sqlx::query_as::<_, DbTrainingSession>(
        "SELECT id, title, date, trainer_id FROM sessions ORDER BY date",
    )
    .fetch_all(pool)
    .await?;

    let sessions: Vec<TrainingSession> = rows.into_iter().map(TrainingSession::from).collect();

    // An empty table is a hard error on this path; the attendance listing
    // below returns an empty vec instead.
    if sessions.is_empty() {
        return Err(AppError::NotFound("No sessions found".to_string()));
    }

    Ok(sessions)
}

#[instrument]
pub async fn get_training_session(
    pool: &Pool<Sqlite>,
    id: i64,
) -> Result<TrainingSession, AppError> {
    info!("Getting training session");

    let row = sqlx::query_as::<_, DbTrainingSession>(
        "SELECT id, title, date, trainer_id FROM sessions WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(session) => Ok(TrainingSession::from(session)),
        _ => Err(AppError::NotFound(format!(
            "Session with id {} not found in database",
            id
        ))),
    }
}

#[instrument]
pub async fn update_session(
    pool: &Pool<Sqlite>,
    id: i64,
    title: &str,
    date: &str,
) -> Result<(), AppError> {
    info!("Updating training session");

    let date = parse_session_date(date)?;

    sqlx::query("UPDATE sessions SET title = ?, date = ? WHERE id = ?")
        .bind(title)
        .bind(date)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument]
pub async fn delete_session(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
    info!("Deleting training session");

    sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument]
pub async fn create_attendance_record(
    pool: &Pool<Sqlite>,
    session_id: i64,
    student_id: i64,
    present: bool,
) -> Result<i64, AppError> {
    info!("Recording attendance");

    // Repeated submissions insert further rows for the same
    // (session, student) pair; there is no uniqueness on the table.
    let res = sqlx::query(
        "INSERT INTO attendance_records (session_id, student_id, present) VALUES (?, ?, ?)",
    )
    .bind(session_id)
    .bind(student_id)
    .bind(present)
    .execute(pool)
    .await?;

    Ok(res.last_insert_rowid())
}

#[instrument]
pub async fn get_attendance_for_session(
    pool: &Pool<Sqlite>,
    session_id: i64,
) -> Result<Vec<AttendanceRecord>, AppError> {
    info!("Getting attendance records for session");

    let rows = sqlx::query_as::<_, DbAttendanceRecord>(
        "SELECT id, session_id, student_id, present FROM attendance_records WHERE session_id = ?",
    )
    .bind(session_id)
    .fetch_all(pool)
    .await?;

    // No error thrown if there are no records found
    let records: Vec<AttendanceRecord> = rows.into_iter().map(AttendanceRecord::from).collect();

    Ok(records)
}
