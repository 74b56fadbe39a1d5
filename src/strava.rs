//! Strava API access: the once-per-session token refresh and the route
//! GPX export download.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::fetch::{BasicClient, Bearer, get_bytes};
use crate::parser::{ParseError, RouteDocument, parse_route};

const TOKEN_URL: &str = "https://www.strava.com/oauth/token";
const EXPORT_BASE: &str = "https://www.strava.com/api/v3/routes";
const ROUTE_MARKER: &str = "/routes/";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("token refresh rejected with status {status}: {body}")]
    Rejected { status: StatusCode, body: String },
    #[error("token response did not contain an access_token")]
    MalformedResponse,
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("not a Strava route link: {0:?}")]
    InvalidLink(String),
    #[error("route export request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("route export rejected with status {status}: {body}")]
    Fetch { status: StatusCode, body: String },
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Short-lived bearer credential. Acquired once per session, never persisted.
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Exchanges the long-lived refresh token for a session access token with a
/// single form-encoded POST. No retry, no backoff, no caching.
pub async fn refresh_access_token(config: &Config) -> Result<AccessToken, AuthError> {
    let client = reqwest::Client::new();
    let response = client
        .post(TOKEN_URL)
        .form(&[
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", config.refresh_token.as_str()),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::Rejected { status, body });
    }

    let token: TokenResponse = response.json().await?;
    match token.access_token {
        Some(value) if !value.is_empty() => {
            debug!("Strava access token refreshed");
            Ok(AccessToken(value))
        }
        _ => Err(AuthError::MalformedResponse),
    }
}

/// Pulls the route identifier out of a Strava route link.
///
/// The host must be `strava.com` (or a subdomain) and the path must contain
/// `/routes/`; the identifier is everything after the last such marker.
/// Trailing path content passes through uninterpreted; the export endpoint
/// is the arbiter of whether it names a real route. Query strings fall away
/// because extraction works on the URL path.
pub fn extract_route_id(link: &str) -> Result<String, RouteError> {
    let invalid = || RouteError::InvalidLink(link.to_string());

    let url = Url::parse(link).map_err(|_| invalid())?;
    let host_ok = url
        .host_str()
        .is_some_and(|host| host == "strava.com" || host.ends_with(".strava.com"));
    if !host_ok {
        return Err(invalid());
    }

    match url.path().rsplit_once(ROUTE_MARKER) {
        Some((_, id)) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(invalid()),
    }
}

/// Downloads and parses the GPX export for the route behind `link`.
///
/// One GET with bearer auth; a non-200 response surfaces with its body for
/// diagnostics, and parse failures propagate typed.
pub async fn download_route(link: &str, token: &AccessToken) -> Result<RouteDocument, RouteError> {
    let route_id = extract_route_id(link)?;
    let export_url = Url::parse(&format!("{EXPORT_BASE}/{route_id}/export_gpx"))
        .map_err(|_| RouteError::InvalidLink(link.to_string()))?;

    let client = Bearer::new(BasicClient::new(), token.as_str());
    let (status, body) = get_bytes(&client, export_url).await?;

    if !status.is_success() {
        return Err(RouteError::Fetch {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }

    debug!(%route_id, bytes = body.len(), "Route export downloaded");
    Ok(parse_route(&body)?)
}
