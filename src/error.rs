use crate::adjust::Rejection;
use crate::models::nest::DeviceId;
use chrono::{DateTime, Utc};

/// Why a session failed the pre-request check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenProblem {
    Empty,
    Expired { expires_at: DateTime<Utc> },
}

impl core::fmt::Display for TokenProblem {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TokenProblem::Empty => write!(f, "access token is empty"),
            TokenProblem::Expired { expires_at } => write!(f, "access token expired at {}", expires_at.to_rfc3339()),
        }
    }
}

#[derive(Debug)]
pub enum NestError {
    /// Raised locally; no request was sent.
    Unauthorized(TokenProblem),
    /// Token endpoint answered 2xx without a usable `access_token`/`expires_in`.
    MalformedToken(String),
    /// Token endpoint rejected the exchange.
    Auth { status: u16, message: String },
    /// Raised locally before any write.
    Validation(Rejection),
    Http { status: u16, message: String },
    Transport(String),
    Json(serde_path_to_error::Error<serde_json::Error>),
    ThermostatNotFound(DeviceId),
    InvalidUrl(String),
}

impl core::fmt::Display for NestError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            NestError::Unauthorized(p) => write!(f, "unauthorized: {}", p),
            NestError::MalformedToken(s) => write!(f, "missing or invalid token in exchange response: {}", s),
            NestError::Auth { status, message } => write!(f, "auth error: http {}: {}", status, message),
            NestError::Validation(r) => write!(f, "invalid temperature adjustment: {}", r),
            NestError::Http { status, message } => write!(f, "http {}: {}", status, message),
            NestError::Transport(s) => write!(f, "transport error: {}", s),
            NestError::Json(e) => write!(f, "json error at `{}`: {}", e.path(), e.inner()),
            NestError::ThermostatNotFound(id) => write!(f, "thermostat {} not found", id),
            NestError::InvalidUrl(s) => write!(f, "invalid url: {}", s),
        }
    }
}

impl std::error::Error for NestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NestError::Json(e) => Some(e),
            NestError::Validation(r) => Some(r),
            _ => None,
        }
    }
}

impl From<serde_path_to_error::Error<serde_json::Error>> for NestError {
    fn from(value: serde_path_to_error::Error<serde_json::Error>) -> Self {
        NestError::Json(value)
    }
}

impl From<ureq::Error> for NestError {
    fn from(value: ureq::Error) -> Self {
        NestError::Transport(value.to_string())
    }
}

impl From<url::ParseError> for NestError {
    fn from(value: url::ParseError) -> Self {
        NestError::InvalidUrl(value.to_string())
    }
}

impl From<Rejection> for NestError {
    fn from(value: Rejection) -> Self {
        NestError::Validation(value)
    }
}

impl From<TokenProblem> for NestError {
    fn from(value: TokenProblem) -> Self {
        NestError::Unauthorized(value)
    }
}
