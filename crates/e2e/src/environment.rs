//! Per-environment URLs and test users parsed from YAML

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{E2eError, E2eResult};

/// Credentials of a test user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCredentials {
    /// Login id
    pub id: String,

    pub pass: String,

    /// Account id on the backend, when it differs from the login id
    #[serde(default)]
    pub user_id: Option<String>,

    /// API keys per environment name
    #[serde(default)]
    pub api_keys: BTreeMap<String, String>,

    /// Environments this user does not log in to
    #[serde(default)]
    pub skip_env: Vec<String>,
}

impl UserCredentials {
    /// `Basic` authorization header value
    pub fn basic_auth_header(&self) -> String {
        use base64::Engine as _;
        let token = base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", self.id, self.pass));
        format!("Basic {}", token)
    }

    /// Whether pre-authentication skips this user on `target`
    pub fn skips(&self, target: &str) -> bool {
        self.skip_env.iter().any(|env| env == target)
    }
}

/// One target environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    /// Front-end domain
    #[serde(default)]
    pub domain: Option<String>,

    /// Base URL for API calls
    pub api_domain: String,

    /// Login endpoint used to pre-authenticate users, absolute or relative
    /// to `api_domain`
    #[serde(default)]
    pub auth_url: Option<String>,

    /// Additional named front-end URLs (customer, admin, ...)
    #[serde(default)]
    pub urls: BTreeMap<String, String>,

    #[serde(default)]
    pub users: BTreeMap<String, UserCredentials>,
}

impl Environment {
    pub fn user(&self, name: &str) -> Option<&UserCredentials> {
        self.users.get(name)
    }

    /// Named URL, with `domain` addressable as `"domain"`
    pub fn url(&self, name: &str) -> Option<&str> {
        match name {
            "domain" => self.domain.as_deref(),
            "api" | "api_domain" => Some(&self.api_domain),
            other => self.urls.get(other).map(String::as_str),
        }
    }

    /// Absolute URL for `path` under `api_domain`; absolute URLs pass through
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.api_domain.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

/// All environments keyed by name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvironmentData {
    pub environments: BTreeMap<String, Environment>,
}

impl EnvironmentData {
    /// Parse environment data from a YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        serde_yaml::from_str(yaml).map_err(E2eError::from)
    }

    /// Parse environment data from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            E2eError::Config(format!("cannot read environment data {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    pub fn get(&self, name: &str) -> E2eResult<&Environment> {
        self.environments
            .get(name)
            .ok_or_else(|| E2eError::UnknownEnvironment(name.to_string()))
    }

    /// Credentials for `user` in environment `name`
    pub fn credentials(&self, name: &str, user: &str) -> E2eResult<&UserCredentials> {
        self.get(name)?.user(user).ok_or_else(|| E2eError::UnknownUser {
            environment: name.to_string(),
            user: user.to_string(),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.environments.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
local:
  domain: http://localhost:8080
  api_domain: http://localhost:8080/
  users:
    user1:
      id: user1
      pass: ABCD1234
qa:
  api_domain: https://qa.api.example.com
  urls:
    customer: https://qa.example.com
    admin: https://admin.qa.example.com
  users:
    user1:
      id: user1
      pass: ABCD1234
      user_id: "1001"
      api_keys:
        qa: QA_KEY
    reporter:
      id: reporter
      pass: pw
      skip_env: [qa, prod]
"#;

    #[test]
    fn test_parse_environments() {
        let data = EnvironmentData::from_yaml(SAMPLE).unwrap();
        assert_eq!(data.names().collect::<Vec<_>>(), vec!["local", "qa"]);

        let qa = data.get("qa").unwrap();
        assert_eq!(qa.url("customer"), Some("https://qa.example.com"));
        assert_eq!(qa.url("api"), Some("https://qa.api.example.com"));
        assert_eq!(qa.url("domain"), None);
        assert_eq!(qa.user("user1").unwrap().api_keys["qa"], "QA_KEY");
        assert!(qa.user("reporter").unwrap().skips("qa"));
        assert!(!qa.user("user1").unwrap().skips("qa"));
    }

    #[test]
    fn test_resolve_against_api_domain() {
        let data = EnvironmentData::from_yaml(SAMPLE).unwrap();
        let local = data.get("local").unwrap();
        assert_eq!(local.resolve("/auth/login"), "http://localhost:8080/auth/login");
        assert_eq!(local.resolve("https://sso.example.com/login"), "https://sso.example.com/login");
        assert_eq!(local.auth_url, None);
    }

    #[test]
    fn test_unknown_lookups() {
        let data = EnvironmentData::from_yaml(SAMPLE).unwrap();
        assert!(matches!(data.get("prod"), Err(E2eError::UnknownEnvironment(_))));
        assert!(matches!(
            data.credentials("qa", "nobody"),
            Err(E2eError::UnknownUser { .. })
        ));
    }

    #[test]
    fn test_basic_auth_header() {
        let data = EnvironmentData::from_yaml(SAMPLE).unwrap();
        let creds = data.credentials("local", "user1").unwrap();
        assert_eq!(creds.basic_auth_header(), "Basic dXNlcjE6QUJDRDEyMzQ=");
    }
}
