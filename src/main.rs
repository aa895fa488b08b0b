#[macro_use]
extern crate rocket;

mod api;
mod auth;
mod database;
mod db;
mod env;
mod error;
mod models;
mod telemetry;
mod validation;
#[cfg(test)]
mod test;

use std::str::FromStr;

use api::{
    api_create_session, api_delete_session, api_get_session, api_list_attendance,
    api_list_sessions, api_login, api_mark_attendance, api_signup, api_update_session, health,
};
use auth::{TokenIssuer, forbidden_api, unauthorized_api, unprocessable_api};
use database::apply_schema;
use env::AppConfig;
use rocket::fairing::AdHoc;
use rocket::{Build, Rocket};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use telemetry::TelemetryFairing;
use tracing::info;

#[launch]
async fn rocket() -> _ {
    let _ = env::load_environment();

    telemetry::init_tracing();

    let config = AppConfig::from_env().expect("Failed to load configuration");

    let options = SqliteConnectOptions::from_str(&config.database_url)
        .expect("Invalid DATABASE_URL")
        .create_if_missing(true)
        // Cascade deletes depend on this holding for every connection
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .expect("Failed to connect to SQLite database");

    info!("Preparing database schema...");
    apply_schema(&pool)
        .await
        .expect("Failed to apply database schema");

    init_rocket(pool, TokenIssuer::new(&config.jwt_secret)).await
}

pub async fn init_rocket(pool: SqlitePool, tokens: TokenIssuer) -> Rocket<Build> {
    info!("Starting attendance tracker");

    rocket::build()
        .manage(pool)
        .manage(tokens)
        .mount(
            "/",
            routes![
                api_signup,
                api_login,
                api_list_sessions,
                api_get_session,
                api_create_session,
                api_update_session,
                api_delete_session,
                api_mark_attendance,
                api_list_attendance,
                health,
            ],
        )
        .register(
            "/",
            catchers![forbidden_api, unauthorized_api, unprocessable_api],
        )
        .attach(TelemetryFairing)
        .attach(AdHoc::on_shutdown("Telemetry shutdown", |_| {
            Box::pin(async {
                telemetry::shutdown_telemetry();
            })
        }))
}
