use rocket::State;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::{Deserialize, Serialize, json::Json};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::{Claims, Permission, Role, TokenIssuer};
use crate::db::{
    authenticate_user, create_attendance_record, create_session, create_user, delete_session,
    find_user_by_email, get_all_sessions, get_attendance_for_session, get_training_session,
    update_session,
};
use crate::error::AppError;
use crate::models::{AttendanceRecord, TrainingSession};
use crate::validation::{AppErrorExt, JsonValidateExt, ValidationResponse};

#[derive(Deserialize, Validate, Clone)]
pub struct SignupRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    name: String,
    #[validate(email(message = "Email is not well-formed"))]
    email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    password: String,
    role: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Deserialize)]
pub struct SessionRequest {
    title: String,
    date: String,
}

#[derive(Deserialize)]
pub struct MarkAttendanceRequest {
    status: bool,
}

#[post("/auth/signup", data = "<registration>")]
pub async fn api_signup(
    registration: Json<SignupRequest>,
    db: &State<Pool<Sqlite>>,
) -> Result<(Status, &'static str), Custom<Json<ValidationResponse>>> {
    let validated = registration.validate_custom()?;

    if Role::from_str(&validated.role).is_err() {
        return Err(Custom(
            Status::BadRequest,
            Json(ValidationResponse::with_error(
                "role",
                "Role must be 'trainer' or 'student'",
            )),
        ));
    }

    let existing_user = find_user_by_email(db, &validated.email)
        .await
        .validate_custom()?;

    if existing_user.is_some() {
        return Err(Custom(
            Status::Conflict,
            Json(ValidationResponse::with_error(
                "email",
                "Email is already registered",
            )),
        ));
    }

    create_user(
        db,
        &validated.name,
        &validated.email,
        &validated.password,
        &validated.role,
    )
    .await
    .validate_custom()?;

    Ok((Status::Created, "User created"))
}

#[post("/auth/login", data = "<login>")]
pub async fn api_login(
    login: Json<LoginRequest>,
    db: &State<Pool<Sqlite>>,
    tokens: &State<TokenIssuer>,
) -> Result<Json<LoginResponse>, AppError> {
    match authenticate_user(db, &login.email, &login.password).await? {
        Some(user) => {
            let token = tokens.issue(&user)?;
            Ok(Json(LoginResponse { token }))
        }
        _ => Err(AppError::Authentication(
            "Invalid email or password".to_string(),
        )),
    }
}

#[get("/sessions")]
pub async fn api_list_sessions(
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<TrainingSession>>, AppError> {
    let sessions = get_all_sessions(db).await?;

    Ok(Json(sessions))
}

#[get("/sessions/<id>")]
pub async fn api_get_session(
    id: i64,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<TrainingSession>, AppError> {
    let session = get_training_session(db, id).await?;

    Ok(Json(session))
}

#[post("/sessions", data = "<session>")]
pub async fn api_create_session(
    session: Json<SessionRequest>,
    claims: Claims,
    db: &State<Pool<Sqlite>>,
) -> Result<(Status, &'static str), AppError> {
    claims.require_permission(Permission::CreateSessions)?;

    if session.title.trim().is_empty() || session.date.trim().is_empty() {
        return Err(AppError::Validation(
            "Title and date are required".to_string(),
        ));
    }

    create_session(db, &session.title, &session.date, claims.sub)
        .await
        .map_err(AppError::store_as_bad_request)?;

    Ok((Status::Created, "Session created"))
}

#[put("/sessions/<id>", data = "<session>")]
pub async fn api_update_session(
    id: i64,
    session: Json<SessionRequest>,
    claims: Claims,
    db: &State<Pool<Sqlite>>,
) -> Result<&'static str, AppError> {
    claims.require_permission(Permission::EditSessions)?;

    if session.title.trim().is_empty() || session.date.trim().is_empty() {
        return Err(AppError::Validation(
            "Title and date are required".to_string(),
        ));
    }

    // Any trainer may edit any session; ownership is not checked.
    update_session(db, id, &session.title, &session.date)
        .await
        .map_err(AppError::store_as_bad_request)?;

    Ok("Session updated")
}

#[delete("/sessions/<id>")]
pub async fn api_delete_session(
    id: i64,
    claims: Claims,
    db: &State<Pool<Sqlite>>,
) -> Result<&'static str, AppError> {
    claims.require_permission(Permission::DeleteSessions)?;

    delete_session(db, id)
        .await
        .map_err(AppError::store_as_bad_request)?;

    Ok("Session deleted")
}

#[post("/sessions/<id>/emargement", data = "<attendance>")]
pub async fn api_mark_attendance(
    id: i64,
    attendance: Json<MarkAttendanceRequest>,
    claims: Claims,
    db: &State<Pool<Sqlite>>,
) -> Result<(Status, &'static str), AppError> {
    claims.require_permission(Permission::MarkAttendance)?;

    // Students mark their own attendance; the student id comes from the
    // token, never from the body.
    create_attendance_record(db, id, claims.sub, attendance.status)
        .await
        .map_err(AppError::store_as_bad_request)?;

    Ok((Status::Created, "Attendance recorded"))
}

#[get("/sessions/<id>/emargement")]
pub async fn api_list_attendance(
    id: i64,
    claims: Claims,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<AttendanceRecord>>, AppError> {
    claims.require_permission(Permission::ViewAttendance)?;

    let records = get_attendance_for_session(db, id).await?;

    Ok(Json(records))
}

#[get("/health")]
pub fn health() -> &'static str {
    "OK"
}
