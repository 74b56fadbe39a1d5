//! Startup configuration for the Strava API credentials.
//!
//! The three secrets are read once at startup into an explicit [`Config`]
//! that gets passed to whatever needs it. A `.env` file is honored when
//! `dotenvy::dotenv` has been called by the binary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),
    #[error("environment variable {0} is set but empty")]
    Empty(&'static str),
}

/// Credentials for the Strava token refresh call.
#[derive(Clone)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl Config {
    /// Reads `STRAVA_CLIENT_ID`, `STRAVA_CLIENT_SECRET` and
    /// `STRAVA_REFRESH_TOKEN` from the environment.
    ///
    /// # Errors
    ///
    /// Fails if any of the three variables is missing or blank. Missing
    /// credentials are a startup-fatal condition, not something to degrade
    /// around.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            client_id: require("STRAVA_CLIENT_ID")?,
            client_secret: require("STRAVA_CLIENT_SECRET")?,
            refresh_token: require("STRAVA_REFRESH_TOKEN")?,
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    let value = std::env::var(name).map_err(|_| ConfigError::Missing(name))?;
    if value.trim().is_empty() {
        return Err(ConfigError::Empty(name));
    }
    Ok(value)
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}
