pub mod schema;

pub use schema::*;

use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;

/// Applies the declarative schema. Every statement is idempotent, so this
/// runs unconditionally at startup and against fresh test databases.
#[instrument(skip(pool))]
pub async fn apply_schema(pool: &Pool<Sqlite>) -> Result<(), AppError> {
    info!("Applying database schema");

    sqlx::raw_sql(CURRENT_SCHEMA).execute(pool).await?;

    Ok(())
}
