//! Framework configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{E2eError, E2eResult};

/// Environment variable overriding [`FrameworkConfig::target`]
pub const TARGET_ENV_VAR: &str = "JOURNEYKIT_TARGET";

/// Environment variables supplying TestRail credentials
pub const TESTRAIL_USER_ENV_VAR: &str = "TESTRAIL_USER";
pub const TESTRAIL_PASS_ENV_VAR: &str = "TESTRAIL_PASS";

/// Top-level framework configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkConfig {
    /// Environment the tests run against (key into the environment data)
    pub target: String,

    /// Application under test
    pub application: String,

    /// Path to the environment data file
    pub data_path: PathBuf,

    /// Timeout for a single API request
    pub request_timeout_secs: u64,

    /// Captured request/response payloads are truncated to this many characters
    pub payload_capture_limit: usize,

    pub reporter: ReporterConfig,

    pub testrail: TestRailConfig,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            target: "local".to_string(),
            application: "app".to_string(),
            data_path: PathBuf::from("data/environments.yaml"),
            request_timeout_secs: 60,
            payload_capture_limit: 1000,
            reporter: ReporterConfig::default(),
            testrail: TestRailConfig::default(),
        }
    }
}

/// Failure artifact behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReporterConfig {
    /// Attach a screenshot when a scenario fails
    pub take_screenshot: bool,

    /// Quit the browser after a failed scenario
    pub close_on_fail: bool,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            take_screenshot: true,
            close_on_fail: true,
        }
    }
}

/// TestRail reporting configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TestRailConfig {
    /// Push scenario results to TestRail
    pub update: bool,

    /// Close the run once execution finishes
    pub close_run: bool,

    pub url: String,
    pub project_name: String,

    /// Section names whose cases make up a newly created run
    pub test_folders: Vec<String>,

    /// Existing run to report into; a run is created when unset
    pub run_id: Option<u64>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl FrameworkConfig {
    /// Load configuration from file, falling back to defaults when it is missing
    pub fn load(path: &Path) -> E2eResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Load from file and apply environment variable overrides
    pub fn load_with_env(path: &Path) -> E2eResult<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a variable lookup
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(target) = lookup(TARGET_ENV_VAR).filter(|t| !t.is_empty()) {
            self.target = target;
        }
        if let Some(user) = lookup(TESTRAIL_USER_ENV_VAR) {
            self.testrail.user = Some(user);
        }
        if let Some(password) = lookup(TESTRAIL_PASS_ENV_VAR) {
            self.testrail.password = Some(password);
        }
    }

    /// Request timeout as a duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Whether tests run against production
    pub fn is_prod(&self) -> bool {
        self.target.eq_ignore_ascii_case("prod")
    }

    /// Check settings that would only fail later at runtime
    pub fn validate(&self) -> E2eResult<()> {
        if self.target.trim().is_empty() {
            return Err(E2eError::Config("target must not be empty".to_string()));
        }
        if self.testrail.update {
            if self.testrail.url.is_empty() {
                return Err(E2eError::Config("testrail.url is required when testrail.update is set".to_string()));
            }
            if self.testrail.run_id.is_none() && self.testrail.project_name.trim().is_empty() {
                return Err(E2eError::Config(
                    "testrail.run_id or testrail.project_name is required when testrail.update is set".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = FrameworkConfig::load(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config.target, "local");
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
        assert_eq!(config.payload_capture_limit, 1000);
    }

    #[test]
    fn test_partial_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("journeykit.toml");
        std::fs::write(
            &path,
            r#"
target = "qa"
application = "storefront"

[testrail]
update = true
url = "https://example.testrail.io"
run_id = 42
"#,
        )
        .unwrap();

        let config = FrameworkConfig::load(&path).unwrap();
        assert_eq!(config.target, "qa");
        assert_eq!(config.application, "storefront");
        assert!(config.testrail.update);
        assert_eq!(config.testrail.run_id, Some(42));
        assert!(config.reporter.take_screenshot);
        config.validate().unwrap();
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (TARGET_ENV_VAR, "uat"),
            (TESTRAIL_USER_ENV_VAR, "qa-bot"),
            (TESTRAIL_PASS_ENV_VAR, "secret"),
        ]
        .into_iter()
        .collect();

        let mut config = FrameworkConfig::default();
        config.apply_env_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.target, "uat");
        assert_eq!(config.testrail.user.as_deref(), Some("qa-bot"));
        assert_eq!(config.testrail.password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_validate_rejects_incomplete_testrail() {
        let mut config = FrameworkConfig::default();
        config.testrail.update = true;
        assert!(matches!(config.validate(), Err(E2eError::Config(_))));
    }

    #[test]
    fn test_validate_accepts_project_without_run() {
        let mut config = FrameworkConfig::default();
        config.testrail.update = true;
        config.testrail.url = "https://example.testrail.io".to_string();
        config.testrail.project_name = "Storefront".to_string();
        config.validate().unwrap();
    }

    #[test]
    fn test_is_prod() {
        let mut config = FrameworkConfig::default();
        assert!(!config.is_prod());
        config.target = "PROD".to_string();
        assert!(config.is_prod());
    }
}
