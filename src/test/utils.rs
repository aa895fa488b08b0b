use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Once;

use rocket::http::{ContentType, Header, Status};
use rocket::local::asynchronous::Client;
use serde_json::json;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::api::LoginResponse;
use crate::auth::{Role, TokenIssuer};
use crate::database::apply_schema;
use crate::db::{create_attendance_record, create_session, create_user};
use crate::error::AppError;
use crate::init_rocket;

static INIT: Once = Once::new();
static STANDARD_PASSWORD: &str = "password123";

/// Secret every test instance signs tokens with.
pub const TEST_SECRET: &str = "attendance-test-secret";

#[derive(Default)]
pub struct TestDbBuilder {
    users: Vec<TestUser>,
    sessions: Vec<TestSession>,
    attendance: Vec<TestAttendance>,
}

pub struct TestUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub password: String,
}

pub struct TestSession {
    pub title: String,
    pub date: String,
    pub trainer_email: Option<String>,
}

pub struct TestAttendance {
    pub session_title: Option<String>,
    pub student_email: Option<String>,
    pub present: bool,
}

impl TestDbBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trainer(mut self, name: &str, email: &str) -> Self {
        self.users.push(TestUser {
            name: name.to_string(),
            email: email.to_string(),
            role: Role::Trainer,
            password: STANDARD_PASSWORD.to_string(),
        });
        self
    }

    pub fn student(mut self, name: &str, email: &str) -> Self {
        self.users.push(TestUser {
            name: name.to_string(),
            email: email.to_string(),
            role: Role::Student,
            password: STANDARD_PASSWORD.to_string(),
        });
        self
    }

    pub fn session(mut self, title: &str, date: &str, trainer_email: Option<&str>) -> Self {
        self.sessions.push(TestSession {
            title: title.to_string(),
            date: date.to_string(),
            trainer_email: trainer_email.map(String::from),
        });
        self
    }

    pub fn attendance(
        mut self,
        session_title: Option<&str>,
        student_email: Option<&str>,
        present: bool,
    ) -> Self {
        self.attendance.push(TestAttendance {
            session_title: session_title.map(String::from),
            student_email: student_email.map(String::from),
            present,
        });
        self
    }

    pub async fn build(self) -> Result<TestDb, AppError> {
        INIT.call_once(|| {
            let _ = env_logger::builder().is_test(true).try_init();
        });

        // A single connection keeps every query on the same in-memory
        // database.
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .expect("Invalid test connection string")
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        apply_schema(&pool).await?;

        let mut user_id_map: HashMap<String, i64> = HashMap::new();
        let mut session_id_map: HashMap<String, i64> = HashMap::new();

        for user in &self.users {
            let user_id = create_user(
                &pool,
                &user.name,
                &user.email,
                &user.password,
                user.role.as_str(),
            )
            .await?;

            user_id_map.insert(user.email.clone(), user_id);
        }

        for session in &self.sessions {
            let trainer_id = match &session.trainer_email {
                Some(email) => user_id_map.get(email).copied(),
                None => self
                    .users
                    .iter()
                    .find(|u| matches!(u.role, Role::Trainer))
                    .map(|u| user_id_map[&u.email]),
            };

            if let Some(trainer_id) = trainer_id {
                let session_id =
                    create_session(&pool, &session.title, &session.date, trainer_id).await?;

                session_id_map.insert(session.title.clone(), session_id);
            }
        }

        for record in &self.attendance {
            let student_id = match &record.student_email {
                Some(email) => user_id_map.get(email).copied(),
                None => self
                    .users
                    .iter()
                    .find(|u| matches!(u.role, Role::Student))
                    .map(|u| user_id_map[&u.email]),
            };

            let session_id = match &record.session_title {
                Some(title) => session_id_map.get(title).copied(),
                None => session_id_map.values().next().copied(),
            };

            if let (Some(student_id), Some(session_id)) = (student_id, session_id) {
                create_attendance_record(&pool, session_id, student_id, record.present).await?;
            }
        }

        Ok(TestDb {
            pool,
            user_id_map,
            session_id_map,
        })
    }
}

pub struct TestDb {
    pub pool: Pool<Sqlite>,
    pub user_id_map: HashMap<String, i64>,
    pub session_id_map: HashMap<String, i64>,
}

impl TestDb {
    pub fn user_id(&self, email: &str) -> Option<i64> {
        self.user_id_map.get(email).copied()
    }

    pub fn session_id(&self, title: &str) -> Option<i64> {
        self.session_id_map.get(title).copied()
    }

    pub async fn session_count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sessions")
            .fetch_one(&self.pool)
            .await
    }

    pub async fn attendance_count(&self, session_id: i64) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM attendance_records WHERE session_id = ?",
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn user_count_by_email(&self, email: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn delete_user(&self, user_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

pub async fn create_standard_test_db() -> TestDb {
    TestDbBuilder::new()
        .trainer("Trainer User", "trainer@example.com")
        .student("Student User", "student@example.com")
        .session("Rust Fundamentals", "2025-03-10", Some("trainer@example.com"))
        .attendance(
            Some("Rust Fundamentals"),
            Some("student@example.com"),
            true,
        )
        .build()
        .await
        .expect("Failed to build test DB")
}

pub async fn setup_test_client(test_db: TestDb) -> (Client, TestDb) {
    let rocket = init_rocket(test_db.pool.clone(), TokenIssuer::new(TEST_SECRET)).await;
    let client = Client::tracked(rocket)
        .await
        .expect("Failed to build test client");

    (client, test_db)
}

pub async fn login_test_user(client: &Client, email: &str, password: &str) -> String {
    let response = client
        .post("/auth/login")
        .header(ContentType::JSON)
        .body(
            json!({
                "email": email,
                "password": password
            })
            .to_string(),
        )
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Ok, "Login failed for {}", email);

    let body = response.into_string().await.unwrap();
    let login_response: LoginResponse = serde_json::from_str(&body).unwrap();

    login_response.token
}

pub fn bearer(token: &str) -> Header<'static> {
    Header::new("Authorization", format!("Bearer {}", token))
}
