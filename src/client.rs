//! Blocking HTTP client for the Nest developer API.
//!
//! - Blocking client using `ureq` (no async).
//! - Uses the models in `crate::models::nest`.
//! - Covers the device, structure and single-thermostat reads and the
//!   target-temperature write.
//!
//! Authentication
//! - OAuth2 authorization-code grant. The resulting [`Session`] is passed to
//!   every call and checked before any request leaves the process.
//! - The token travels as the `auth` query parameter, not a header.

use http::StatusCode;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::adjust::TemperatureAdjustment;
use crate::error::NestError;
use crate::models::nest::*;
use crate::session::{AuthorizationRequest, Credentials, Session};

pub const BASE_URL: &str = "https://developer-api.nest.com";
pub const ACCESS_TOKEN_URL: &str = "https://api.home.nest.com/oauth2/access_token";
pub const AUTHORIZATION_URL: &str = "https://home.nest.com/login/oauth2";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub api_base: String,
    pub token_url: String,
    pub authorization_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            api_base: BASE_URL.to_string(),
            token_url: ACCESS_TOKEN_URL.to_string(),
            authorization_url: AUTHORIZATION_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// API and token endpoint under one base, as a local proxy or mock serves them.
    pub fn under(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Endpoints {
            api_base: base.to_string(),
            token_url: format!("{}/oauth2/access_token", base),
            authorization_url: format!("{}/login/oauth2", base),
        }
    }
}

pub struct NestClient {
    agent: ureq::Agent,
    credentials: Credentials,
    endpoints: Endpoints,
}

impl NestClient {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_endpoints(credentials, Endpoints::default())
    }

    pub fn with_endpoints(credentials: Credentials, endpoints: Endpoints) -> Self {
        // Non-2xx responses come back as responses so their bodies end up in the error.
        let config = ureq::Agent::config_builder().http_status_as_error(false).build();
        NestClient {
            agent: ureq::Agent::new_with_config(config),
            credentials,
            endpoints,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn url(&self, path: &str) -> String {
        let base = self.endpoints.api_base.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }

    pub fn authorization_request(&self) -> Result<AuthorizationRequest, NestError> {
        Ok(self.credentials.authorization_request(&self.endpoints.authorization_url)?)
    }

    /// Trade the code from the authorization redirect for an access token.
    pub fn exchange_code(&self, code: &str) -> Result<Session, NestError> {
        debug!("POST {}", self.endpoints.token_url);
        let resp = self
            .agent
            .post(&self.endpoints.token_url)
            .header("Accept", "application/json")
            .send_form([
                ("client_id", self.credentials.client_id()),
                ("code", code),
                ("client_secret", self.credentials.client_secret()),
                ("grant_type", "authorization_code"),
            ]);
        let (status, body) = read_response(resp)?;
        if !status.is_success() {
            return Err(NestError::Auth {
                status: status.as_u16(),
                message: body,
            });
        }
        let session = parse_token_response(&body)?;
        info!("Obtained access token (expires {})", session.expires_at().to_rfc3339());
        Ok(session)
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, NestError> {
        session.ensure_valid()?;

        let url = self.url(path);
        debug!("GET {}", url);
        let mut req = self.agent.get(&url).header("Accept", "application/json");
        for (k, v) in query {
            req = req.query(*k, v);
        }
        req = req.query("auth", session.access_token());

        let (status, body) = read_response(req.call())?;
        if !status.is_success() {
            return Err(NestError::Http {
                status: status.as_u16(),
                message: body,
            });
        }
        decode(&body)
    }

    fn put_json(&self, session: &Session, path: &str, body: &Value) -> Result<Value, NestError> {
        session.ensure_valid()?;

        let url = self.url(path);
        debug!("PUT {} {}", url, body);
        let resp = self
            .agent
            .put(&url)
            .header("Accept", "application/json")
            .query("auth", session.access_token())
            .send_json(body);

        let (status, text) = read_response(resp)?;
        if !status.is_success() {
            return Err(NestError::Http {
                status: status.as_u16(),
                message: text,
            });
        }
        decode(&text)
    }

    pub fn get_devices(&self, session: &Session) -> Result<Devices, NestError> {
        self.get_json(session, "/devices.json", &[])
    }

    pub fn get_structures(&self, session: &Session) -> Result<BTreeMap<String, Structure>, NestError> {
        self.get_json(session, "/structures.json", &[])
    }

    /// The `equalTo` filter narrows the response map to the requested key; any
    /// other entry is ignored so a write can never target an unnamed device.
    pub fn get_thermostat(&self, session: &Session, device_id: &DeviceId) -> Result<Thermostat, NestError> {
        let query = [
            ("orderBy", "\"$key\"".to_string()),
            ("equalTo", format!("\"{}\"", device_id.0)),
        ];
        let thermostats: Option<BTreeMap<String, Thermostat>> =
            self.get_json(session, "/devices/thermostats.json", &query)?;
        thermostats
            .unwrap_or_default()
            .remove(&device_id.0)
            .ok_or_else(|| NestError::ThermostatNotFound(device_id.clone()))
    }

    /// Fetches the thermostat, validates against its current mode, then writes
    /// the single target temperature field. Returns the API's response body.
    pub fn adjust_temperature(
        &self,
        session: &Session,
        device_id: &DeviceId,
        adjustment: &TemperatureAdjustment,
    ) -> Result<Value, NestError> {
        session.ensure_valid()?;
        adjustment.check_degrees()?;

        let thermostat = self.get_thermostat(session, device_id)?;
        adjustment.validate(&thermostat)?;

        let body = adjustment.body()?;
        info!(
            "Setting {} on thermostat {} (mode {})",
            body, thermostat.device_id, thermostat.hvac_mode
        );
        self.put_json(session, &format!("/devices/thermostats/{}", thermostat.device_id.0), &body)
    }
}

fn read_response(
    resp: Result<http::Response<ureq::Body>, ureq::Error>,
) -> Result<(StatusCode, String), NestError> {
    let mut resp = resp?;
    let status = resp.status();
    let body = resp.body_mut().read_to_string()?;
    Ok((status, body))
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, NestError> {
    let de = &mut serde_json::Deserializer::from_str(body);
    Ok(serde_path_to_error::deserialize(de)?)
}

/// `access_token` (non-empty string) and `expires_in` (integer seconds) are both required.
fn parse_token_response(body: &str) -> Result<Session, NestError> {
    let json: Value =
        serde_json::from_str(body).map_err(|e| NestError::MalformedToken(format!("response is not JSON: {}", e)))?;

    let access_token = json
        .get("access_token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| NestError::MalformedToken("missing access_token".to_string()))?;
    let expires_in = json
        .get("expires_in")
        .and_then(Value::as_i64)
        .ok_or_else(|| NestError::MalformedToken("missing expires_in".to_string()))?;

    Session::from_expires_in(access_token, expires_in, chrono::Utc::now())
        .ok_or_else(|| NestError::MalformedToken("expires_in out of range".to_string()))
}
