//! Runtime configuration from the process environment.
//! Endpoint defaults are the production Nest URLs.

use crate::client::Endpoints;
use crate::session::{Credentials, Session};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub endpoints: Endpoints,
    /// Present when `NEST_ACCESS_TOKEN` is set; required by every device command.
    pub session: Option<Session>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`], reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let non_blank = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let client_id = non_blank("NEST_CLIENT_ID").ok_or_else(|| "Missing NEST_CLIENT_ID".to_string())?;
        let client_secret =
            non_blank("NEST_CLIENT_SECRET").ok_or_else(|| "Missing NEST_CLIENT_SECRET".to_string())?;

        let mut endpoints = Endpoints::default();
        if let Some(v) = non_blank("NEST_API_BASE_URL") {
            endpoints.api_base = v;
        }
        if let Some(v) = non_blank("NEST_TOKEN_URL") {
            endpoints.token_url = v;
        }
        if let Some(v) = non_blank("NEST_AUTHORIZATION_URL") {
            endpoints.authorization_url = v;
        }

        let session = match non_blank("NEST_ACCESS_TOKEN") {
            Some(token) => {
                let raw = non_blank("NEST_TOKEN_EXPIRES_AT")
                    .ok_or_else(|| "NEST_TOKEN_EXPIRES_AT is required when NEST_ACCESS_TOKEN is set".to_string())?;
                let expires_at = DateTime::parse_from_rfc3339(&raw)
                    .map_err(|_| "NEST_TOKEN_EXPIRES_AT must be an RFC 3339 timestamp".to_string())?
                    .with_timezone(&Utc);
                Some(Session::new(token, expires_at))
            }
            None => None,
        };

        Ok(Config {
            credentials: Credentials::new(client_id, client_secret),
            endpoints,
            session,
        })
    }
}
