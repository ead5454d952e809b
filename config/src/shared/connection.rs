use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::shared::ValidationError;

/// Application name reported to Postgres by seeding connections.
const APP_NAME_SEEDER: &str = "schoolseed_seeder";

/// Connection settings for the destination Postgres instance.
///
/// This intentionally does not implement [`serde::Serialize`] to avoid accidentally
/// leaking the password into serialized forms.
#[derive(Clone, Debug, Deserialize)]
pub struct PgConnectionConfig {
    pub host: String,
    pub port: u16,
    /// Name of the database to connect to.
    pub name: String,
    pub username: String,
    pub password: Option<SecretString>,
    /// Whether to require TLS on the connection.
    #[serde(default)]
    pub tls_required: bool,
}

impl PgConnectionConfig {
    /// Builds sqlx connect options targeting the configured database.
    pub fn with_db(&self) -> PgConnectOptions {
        let ssl_mode = if self.tls_required {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };

        let mut options = PgConnectOptions::new_without_pgpass()
            .host(&self.host)
            .port(self.port)
            .database(&self.name)
            .username(&self.username)
            .application_name(APP_NAME_SEEDER)
            .ssl_mode(ssl_mode);

        if let Some(password) = &self.password {
            options = options.password(password.expose_secret());
        }

        options
    }

    /// Validates connection configuration settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.host.is_empty() {
            return Err(ValidationError::invalid(
                "pg_connection.host",
                "must not be empty",
            ));
        }

        if self.name.is_empty() {
            return Err(ValidationError::invalid(
                "pg_connection.name",
                "must not be empty",
            ));
        }

        Ok(())
    }
}
