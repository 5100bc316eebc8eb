//! OAuth2 credentials and the access-token session handed to every request.

use crate::error::TokenProblem;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use url::Url;

const STATE_LEN: usize = 32;

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Credentials {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Authorization URL with a fresh random `state`.
    pub fn authorization_request(&self, authorization_url: &str) -> Result<AuthorizationRequest, url::ParseError> {
        let state: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(STATE_LEN)
            .map(char::from)
            .collect();
        let url = Url::parse_with_params(
            authorization_url,
            &[("client_id", self.client_id.as_str()), ("state", state.as_str())],
        )?;
        Ok(AuthorizationRequest {
            url: url.into(),
            state,
        })
    }
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Where to send the user, plus the `state` the redirect must echo back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
}

/// Access token obtained from the code exchange.
///
/// Immutable: a new exchange produces a new `Session`.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(access_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Session {
            access_token: access_token.into(),
            expires_at,
        }
    }

    /// `None` when `now + expires_in_secs` is outside chrono's range.
    pub fn from_expires_in(
        access_token: impl Into<String>,
        expires_in_secs: i64,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let expires_at = Duration::try_seconds(expires_in_secs).and_then(|d| now.checked_add_signed(d))?;
        Some(Session::new(access_token, expires_at))
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// A token is usable only if non-empty and expiring strictly after `now`.
    pub fn ensure_valid_at(&self, now: DateTime<Utc>) -> Result<(), TokenProblem> {
        if self.access_token.is_empty() {
            return Err(TokenProblem::Empty);
        }
        if self.expires_at <= now {
            return Err(TokenProblem::Expired {
                expires_at: self.expires_at,
            });
        }
        Ok(())
    }

    pub fn ensure_valid(&self) -> Result<(), TokenProblem> {
        self.ensure_valid_at(Utc::now())
    }
}

impl core::fmt::Debug for Session {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const AUTH_URL: &str = "https://home.nest.com/login/oauth2";

    #[test]
    fn empty_token_is_rejected() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let session = Session::new("", now + Duration::hours(1));
        assert_eq!(session.ensure_valid_at(now), Err(TokenProblem::Empty));
    }

    #[test]
    fn expiry_must_be_strictly_in_the_future() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let past = Session::new("c.abc", now - Duration::seconds(1));
        assert_eq!(
            past.ensure_valid_at(now),
            Err(TokenProblem::Expired {
                expires_at: now - Duration::seconds(1)
            })
        );
        let exact = Session::new("c.abc", now);
        assert!(exact.ensure_valid_at(now).is_err());
        let future = Session::new("c.abc", now + Duration::seconds(1));
        assert_eq!(future.ensure_valid_at(now), Ok(()));
    }

    #[test]
    fn expires_in_is_relative_to_now() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let session = Session::from_expires_in("c.abc", 315_360_000, now).unwrap();
        assert_eq!(session.expires_at(), now + Duration::seconds(315_360_000));
    }

    #[test]
    fn out_of_range_expires_in_yields_none() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert!(Session::from_expires_in("c.abc", i64::MAX, now).is_none());
        assert!(Session::from_expires_in("c.abc", 10_000_000_000_000, now).is_none());
        assert!(Session::from_expires_in("c.abc", i64::MIN, now).is_none());
    }

    #[test]
    fn debug_output_hides_secrets() {
        let session = Session::new("c.super-secret", Utc::now());
        assert!(!format!("{:?}", session).contains("super-secret"));
        let creds = Credentials::new("client", "hunter2");
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }

    #[test]
    fn authorization_url_carries_client_id_and_state() {
        let creds = Credentials::new("6f2b7c1e-0000-4a1b-9c3d-1234567890ab", "secret");
        let req = creds.authorization_request(AUTH_URL).unwrap();
        assert_eq!(req.state.len(), STATE_LEN);
        assert!(req.state.chars().all(|c| c.is_ascii_alphanumeric()));

        let parsed = Url::parse(&req.url).unwrap();
        let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("client_id".to_string(), "6f2b7c1e-0000-4a1b-9c3d-1234567890ab".to_string()),
                ("state".to_string(), req.state.clone()),
            ]
        );

        let again = creds.authorization_request(AUTH_URL).unwrap();
        assert_ne!(req.state, again.state);
    }
}
