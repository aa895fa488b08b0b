use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};

/// Process-wide configuration, read once at startup. The pool and the
/// token issuer built from it are injected as managed state; nothing else
/// reads the environment after launch.
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = dotenvy::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt_secret = dotenvy::var("JWT_SECRET").context("JWT_SECRET must be set")?;

        Ok(Self {
            database_url,
            jwt_secret,
        })
    }
}

pub fn load_environment() -> Result<(), Box<dyn std::error::Error>> {
    let is_production =
        dotenvy::var("ROCKET_PROFILE").unwrap_or("development".to_string()) == "production";

    let env_files = if is_production {
        vec!["config/common.env", "config/prod.env", ".secrets.env"]
    } else {
        vec!["config/common.env", "config/dev.env", ".secrets.env"]
    };

    for env_file in env_files {
        load_env_file(env_file)?;
    }

    Ok(())
}

fn load_env_file(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !Path::new(path).exists() {
        warn!("Warning: Environment file {} not found, skipping", path);
        return Ok(());
    }

    dotenvy::from_filename_override(path)?;
    info!("Loaded environment from: {}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::AppConfig;

    #[test]
    #[serial]
    fn config_reads_database_url_and_secret() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("sqlite::memory:")),
                ("JWT_SECRET", Some("config-test-secret")),
            ],
            || {
                let config = AppConfig::from_env().expect("Config should load");
                assert_eq!(config.database_url, "sqlite::memory:");
                assert_eq!(config.jwt_secret, "config-test-secret");
            },
        );
    }

    #[test]
    #[serial]
    fn config_requires_jwt_secret() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("sqlite::memory:")),
                ("JWT_SECRET", None),
            ],
            || {
                let result = AppConfig::from_env();
                assert!(result.is_err(), "Missing JWT_SECRET should be an error");
            },
        );
    }
}
