//! User pre-authentication
//!
//! Runs once before the suite: every test user of the target environment
//! logs in against the environment's `auth_url` and the returned token is
//! kept for the sessions created later. Users whose `skip_env` lists the
//! target are left out.

use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

use journeykit_common::get_path;

use crate::config::FrameworkConfig;
use crate::environment::{Environment, UserCredentials};
use crate::error::{E2eError, E2eResult};
use crate::session::{parse_body, truncate};

/// Body posted to the auth endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AuthRequest {
    ApiKey {
        value: String,
    },
    Password {
        username: String,
        password: String,
        application: String,
    },
}

impl AuthRequest {
    /// API key for `target` when one is set, login and password otherwise
    pub fn for_user(credentials: &UserCredentials, target: &str, application: &str) -> Self {
        match credentials.api_keys.get(target).filter(|key| !key.is_empty()) {
            Some(key) => AuthRequest::ApiKey { value: key.clone() },
            None => AuthRequest::Password {
                username: credentials.id.clone(),
                password: credentials.pass.clone(),
                application: application.to_string(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    #[serde(default)]
    token: String,
    #[serde(default)]
    reset_password: bool,
}

/// Token issued to one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserToken {
    pub token: String,
    /// `domain.id` claim of the token
    pub domain_id: Option<String>,
}

impl UserToken {
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        let domain_id = token_claims(&token)
            .as_ref()
            .and_then(|claims| get_path(claims, "domain.id"))
            .and_then(|id| match id {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            });
        Self { token, domain_id }
    }

    /// `Authorization` header value
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Claims of a JWT, read without verifying the signature
pub fn token_claims(token: &str) -> Option<Value> {
    let payload = token.split('.').nth(1)?;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Log in every user of `environment` that is not skipped for `target`.
///
/// Fails on the first user whose login is rejected, returns no token, or
/// must reset their password.
pub async fn pre_authenticate(
    environment: &Environment,
    target: &str,
    config: &FrameworkConfig,
) -> E2eResult<BTreeMap<String, UserToken>> {
    let auth_url = environment
        .auth_url
        .as_deref()
        .ok_or_else(|| E2eError::Config(format!("environment '{}' has no auth_url", target)))?;

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    let client = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .default_headers(headers)
        .build()?;
    let url = environment.resolve(auth_url);

    let mut tokens = BTreeMap::new();
    for (user, credentials) in &environment.users {
        if credentials.skips(target) {
            info!(user = %user, environment = %target, "skipping auth due to environment rules");
            continue;
        }

        let body = AuthRequest::for_user(credentials, target, &config.application);
        let response = client.post(&url).json(&body).send().await?;
        let status = response.status().as_u16();
        let data = parse_body(&response.text().await?);
        debug!(user = %user, status, "auth request completed");

        if status != 200 {
            let message = data
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| truncate(&data.to_string(), 200));
            return Err(E2eError::Unauthorized(format!(
                "unable to authorize user {} (status {}): {}",
                user, status, message
            )));
        }

        let auth: AuthResponse = serde_json::from_value(data)?;
        if auth.token.is_empty() {
            return Err(E2eError::Unauthorized(format!("auth for user {} returned no token", user)));
        }
        if auth.reset_password {
            return Err(E2eError::Unauthorized(format!("password reset required for user {}", user)));
        }

        info!(user = %user, "auth request complete");
        tokens.insert(user.clone(), UserToken::new(auth.token));
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt(claims: &str) -> String {
        let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        format!(
            "{}.{}.sig",
            engine.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
            engine.encode(claims)
        )
    }

    fn credentials(api_keys: &[(&str, &str)]) -> UserCredentials {
        UserCredentials {
            id: "buyer".to_string(),
            pass: "pw".to_string(),
            user_id: None,
            api_keys: api_keys.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            skip_env: vec![],
        }
    }

    #[test]
    fn test_domain_id_from_token() {
        assert_eq!(UserToken::new(jwt(r#"{"domain":{"id":77}}"#)).domain_id.as_deref(), Some("77"));
        assert_eq!(UserToken::new(jwt(r#"{"domain":{"id":"d-1"}}"#)).domain_id.as_deref(), Some("d-1"));
        assert_eq!(UserToken::new(jwt(r#"{"sub":"x"}"#)).domain_id, None);
        assert_eq!(UserToken::new("opaque").domain_id, None);
    }

    #[test]
    fn test_request_prefers_api_key_for_target() {
        let creds = credentials(&[("qa", "QA_KEY"), ("local", "")]);
        assert_eq!(
            AuthRequest::for_user(&creds, "qa", "storefront"),
            AuthRequest::ApiKey { value: "QA_KEY".to_string() }
        );
        assert_eq!(
            serde_json::to_value(AuthRequest::for_user(&creds, "local", "storefront")).unwrap(),
            serde_json::json!({"username": "buyer", "password": "pw", "application": "storefront"})
        );
    }
}
