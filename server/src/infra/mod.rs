pub mod email;
pub mod memory;
pub mod postgres;

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::config::Config;
use crate::domain::ports::EmailService;
use crate::state::AppState;
use crate::utils::error::AppError;

use email::{HttpEmailService, NoopEmailService};
use memory::MemoryStore;
use postgres::{PostgresAttendeeRepo, PostgresEventRepo};

/// Wires repositories and vendor clients according to `config`.
pub async fn bootstrap_state(config: Config) -> Result<AppState, AppError> {
    let email = email_service(&config)?;

    let state = match config.database_url.as_deref() {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(database_url)
                .await?;
            info!("Successfully connected to database");

            sqlx::migrate!()
                .run(&pool)
                .await
                .map_err(|e| AppError::InternalServerError(format!("Migration failed: {}", e)))?;
            info!("Migrations run successfully");

            AppState::new(
                config,
                Arc::new(PostgresEventRepo::new(pool.clone())),
                Arc::new(PostgresAttendeeRepo::new(pool)),
                email,
            )
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory store (data is lost on restart)");
            let store = MemoryStore::new();
            AppState::new(
                config,
                Arc::new(store.events()),
                Arc::new(store.attendees()),
                email,
            )
        }
    };

    Ok(state)
}

fn email_service(config: &Config) -> Result<Arc<dyn EmailService>, AppError> {
    match (&config.email_service_url, &config.email_service_token) {
        (Some(url), Some(token)) => {
            info!(%url, "Email delivery enabled");
            let service = HttpEmailService::new(
                url.clone(),
                token.clone(),
                Duration::from_secs(config.email_timeout_secs),
            )?;
            Ok(Arc::new(service))
        }
        (Some(_), None) => {
            warn!("EMAIL_SERVICE_URL set without EMAIL_SERVICE_TOKEN, email delivery disabled");
            Ok(Arc::new(NoopEmailService))
        }
        _ => Ok(Arc::new(NoopEmailService)),
    }
}
