//! Authenticated API sessions for test users
//!
//! A session wraps an HTTP client preconfigured with a user's credentials
//! (basic auth, or a bearer token from pre-authentication) and the
//! environment's API base URL. It keeps a scratch store for
//! values shared between steps and captures the last request and response
//! so they can be attached to the scenario report.

use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use journeykit_common::{get_path, set_path};

use crate::auth::UserToken;
use crate::config::FrameworkConfig;
use crate::environment::Environment;
use crate::error::{E2eError, E2eResult};

/// Environment facts about a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEnv {
    pub target: String,
    pub user_id: Option<String>,
    /// Domain id carried by the user's token
    pub domain_id: Option<String>,
    pub base_url: String,
}

/// A response with any status code; only transport failures are errors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: u16,
    pub data: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Value at a dotted path inside the body
    pub fn field(&self, path: &str) -> Option<&Value> {
        get_path(&self.data, path)
    }

    /// Fail with [`E2eError::Unauthorized`] on 401/403
    pub fn error_for_unauthorized(self) -> E2eResult<Self> {
        match StatusCode::from_u16(self.status) {
            Ok(StatusCode::UNAUTHORIZED) | Ok(StatusCode::FORBIDDEN) => Err(E2eError::Unauthorized(format!(
                "status {}: {}",
                self.status,
                truncate(&self.data.to_string(), 200)
            ))),
            _ => Ok(self),
        }
    }

    /// The response as `{"status": .., "data": ..}`
    pub fn into_envelope(self) -> Value {
        json!({ "status": self.status, "data": self.data })
    }
}

#[derive(Debug, Default)]
struct Capture {
    request: Option<String>,
    response: Option<String>,
}

/// HTTP session bound to one user in one environment
pub struct ApiSession {
    client: reqwest::Client,
    env: SessionEnv,
    temp: Mutex<Value>,
    capture: Mutex<Capture>,
    capture_limit: usize,
}

impl ApiSession {
    /// Create a session for `user` against `environment` using basic auth
    pub fn create(
        environment: &Environment,
        target: &str,
        user: &str,
        config: &FrameworkConfig,
    ) -> E2eResult<Self> {
        Self::build(environment, target, user, config, None)
    }

    /// Create a session that authenticates with a pre-issued token
    pub fn create_with_token(
        environment: &Environment,
        target: &str,
        user: &str,
        config: &FrameworkConfig,
        token: &UserToken,
    ) -> E2eResult<Self> {
        Self::build(environment, target, user, config, Some(token))
    }

    fn build(
        environment: &Environment,
        target: &str,
        user: &str,
        config: &FrameworkConfig,
        token: Option<&UserToken>,
    ) -> E2eResult<Self> {
        let credentials = environment.user(user).ok_or_else(|| E2eError::UnknownUser {
            environment: target.to_string(),
            user: user.to_string(),
        })?;

        let authorization = match token {
            Some(token) => token.bearer_header(),
            None => credentials.basic_auth_header(),
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth = HeaderValue::from_str(&authorization)
            .map_err(|e| E2eError::Config(format!("invalid credentials for {}: {}", user, e)))?;
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .default_headers(headers)
            .build()?;

        debug!(user, environment = %target, base_url = %environment.api_domain, bearer = token.is_some(), "created API session");

        Ok(Self {
            client,
            env: SessionEnv {
                target: target.to_string(),
                user_id: credentials.user_id.clone(),
                domain_id: token.and_then(|t| t.domain_id.clone()),
                base_url: environment.api_domain.clone(),
            },
            temp: Mutex::new(Value::Object(Default::default())),
            capture: Mutex::new(Capture::default()),
            capture_limit: config.payload_capture_limit,
        })
    }

    pub fn env_data(&self) -> &SessionEnv {
        &self.env
    }

    /// Environment fact by name (`target`, `userId`, `domainId`, `baseURL`)
    pub fn env(&self, key: &str) -> Option<String> {
        match key {
            "target" => Some(self.env.target.clone()),
            "userId" | "user_id" => self.env.user_id.clone(),
            "domainId" | "domain_id" => self.env.domain_id.clone(),
            "baseURL" | "base_url" => Some(self.env.base_url.clone()),
            _ => None,
        }
    }

    /// Absolute URL for `path`; absolute URLs pass through untouched
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.env.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub async fn get(&self, path: &str) -> E2eResult<ApiResponse> {
        self.send(Method::GET, path, &[], None).await
    }

    pub async fn get_with_query(&self, path: &str, query: &[(&str, &str)]) -> E2eResult<ApiResponse> {
        self.send(Method::GET, path, query, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> E2eResult<ApiResponse> {
        self.send(Method::POST, path, &[], Some(body)).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> E2eResult<ApiResponse> {
        self.send(Method::PUT, path, &[], Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> E2eResult<ApiResponse> {
        self.send(Method::PATCH, path, &[], Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> E2eResult<ApiResponse> {
        self.send(Method::DELETE, path, &[], None).await
    }

    /// Send a request and capture its payloads
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> E2eResult<ApiResponse> {
        let url = self.url(path);

        let request_payload = if query.is_empty() {
            json!({ "method": method.as_str(), "url": url, "data": body })
        } else {
            let params: serde_json::Map<String, Value> = query
                .iter()
                .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                .collect();
            Value::Object(params)
        };
        self.capture.lock().request = Some(truncate(&request_payload.to_string(), self.capture_limit));

        let mut request = self.client.request(method.clone(), &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        let data = parse_body(&text);

        debug!(method = %method, url = %url, status, "API request completed");

        self.capture.lock().response = Some(truncate(&data.to_string(), self.capture_limit));

        Ok(ApiResponse { status, data })
    }

    /// Last captured request payload
    pub fn last_request(&self) -> Option<String> {
        self.capture.lock().request.clone()
    }

    /// Last captured response body
    pub fn last_response(&self) -> Option<String> {
        self.capture.lock().response.clone()
    }

    /// Store a value in the scratch store
    pub fn set(&self, path: &str, value: impl Into<Value>) {
        set_path(&mut self.temp.lock(), path, value.into());
    }

    /// Read a value from the scratch store
    pub fn get_value(&self, path: &str) -> Option<Value> {
        get_path(&self.temp.lock(), path).cloned()
    }

    /// Read a value, storing and returning `default` when it is absent
    pub fn get_or_insert(&self, path: &str, default: impl Into<Value>) -> Value {
        let mut temp = self.temp.lock();
        if let Some(existing) = get_path(&temp, path) {
            return existing.clone();
        }
        let value = default.into();
        set_path(&mut temp, path, value.clone());
        value
    }

    /// Clear the scratch store
    pub fn reset(&self) {
        *self.temp.lock() = Value::Object(Default::default());
    }
}

pub(crate) fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Truncate to at most `limit` characters
pub(crate) fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::EnvironmentData;

    fn session() -> ApiSession {
        let data = EnvironmentData::from_yaml(
            r#"
qa:
  api_domain: https://qa.api.example.com/
  users:
    user1:
      id: user1
      pass: pw
      user_id: "1001"
"#,
        )
        .unwrap();
        ApiSession::create(data.get("qa").unwrap(), "qa", "user1", &FrameworkConfig::default()).unwrap()
    }

    #[test]
    fn test_url_joining() {
        let session = session();
        assert_eq!(session.url("/orders"), "https://qa.api.example.com/orders");
        assert_eq!(session.url("orders/7"), "https://qa.api.example.com/orders/7");
        assert_eq!(session.url("https://other.example.com/x"), "https://other.example.com/x");
    }

    #[test]
    fn test_env_lookup() {
        let session = session();
        assert_eq!(session.env("target").as_deref(), Some("qa"));
        assert_eq!(session.env("userId").as_deref(), Some("1001"));
        assert_eq!(session.env("baseURL").as_deref(), Some("https://qa.api.example.com/"));
        assert_eq!(session.env("nope"), None);
    }

    #[test]
    fn test_scratch_store() {
        let session = session();
        session.set("order.id", "order-42");
        assert_eq!(session.get_value("order.id"), Some(json!("order-42")));
        assert_eq!(session.get_or_insert("order.id", "other"), json!("order-42"));
        assert_eq!(session.get_or_insert("order.count", 3), json!(3));
        assert_eq!(session.get_value("order.count"), Some(json!(3)));

        session.reset();
        assert_eq!(session.get_value("order.id"), None);
    }

    #[test]
    fn test_unknown_user() {
        let data = EnvironmentData::from_yaml("qa:\n  api_domain: http://x\n").unwrap();
        let result = ApiSession::create(data.get("qa").unwrap(), "qa", "ghost", &FrameworkConfig::default());
        assert!(matches!(result, Err(E2eError::UnknownUser { .. })));
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("abc", 10), "abc");
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(""), Value::Null);
        assert_eq!(parse_body(r#"{"id":1}"#), json!({"id": 1}));
        assert_eq!(parse_body("plain"), json!("plain"));
    }

    #[test]
    fn test_unauthorized_response() {
        let response = ApiResponse { status: 401, data: json!({"error": "bad token"}) };
        assert!(matches!(response.error_for_unauthorized(), Err(E2eError::Unauthorized(_))));

        let response = ApiResponse { status: 404, data: Value::Null };
        assert!(response.error_for_unauthorized().is_ok());
    }
}
