//! Scenario lifecycle hooks
//!
//! Decides which scenarios run, what happens to the browser after each one
//! and how results are pushed to TestRail.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{FrameworkConfig, ReporterConfig};
use crate::error::E2eResult;
use crate::testrail::{CaseResult, TestRailClient};

/// Tags that keep a scenario from running
pub const SKIP_TAGS: &[&str] = &["@wip", "@skip"];

/// Tag a scenario needs to run against production
pub const PROD_TAG: &str = "@prod";

const FAILURE_BANNER: &str = "\n\n\n********* FAILURE DETAILS *********\n\n\n";
const DEFAULT_COMMENT: &str = "Test was executed via UI automation project";

/// A scenario as seen by the hooks
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Comment lines of the feature file, in order
    #[serde(default)]
    pub comments: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    Passed,
    Failed,
    Skipped,
    Pending,
    Undefined,
}

impl ScenarioStatus {
    /// TestRail `status_id`; statuses TestRail has no counterpart for map to `None`
    pub fn testrail_status_id(self) -> Option<u8> {
        match self {
            ScenarioStatus::Passed => Some(1),
            ScenarioStatus::Skipped => Some(2),
            ScenarioStatus::Failed => Some(5),
            ScenarioStatus::Pending | ScenarioStatus::Undefined => None,
        }
    }
}

/// Result of one executed scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub scenario: Scenario,
    pub status: ScenarioStatus,
    /// Failure message, if any
    pub message: Option<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Tagged `@wip` or `@skip`
    Excluded,
    /// Running against production without `@prod`
    NotForProduction,
}

/// What to do with the browser once a scenario finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowserTeardown {
    pub screenshot: bool,
    pub quit: bool,
}

/// Whether a scenario should be skipped for `target`
pub fn skip_reason(tags: &[String], target: &str) -> Option<SkipReason> {
    if tags.iter().any(|t| SKIP_TAGS.contains(&t.as_str())) {
        return Some(SkipReason::Excluded);
    }
    if target.eq_ignore_ascii_case("prod") && !tags.iter().any(|t| t == PROD_TAG) {
        return Some(SkipReason::NotForProduction);
    }
    None
}

/// TestRail case id from the first `@C<digits>` tag
pub fn testrail_case_id(tags: &[String]) -> Option<u64> {
    tags.iter()
        .filter_map(|t| t.strip_prefix("@C"))
        .find_map(|id| id.parse().ok())
}

/// Comment attached to a TestRail result.
///
/// Failures list the scenario name, the feature comments after the first
/// two lines (the file header) and the failure message.
pub fn result_comment(outcome: &ScenarioOutcome) -> String {
    match &outcome.message {
        Some(message) => {
            let mut comment = outcome.scenario.name.clone();
            for line in outcome.scenario.comments.iter().skip(2) {
                comment.push('\n');
                comment.push_str(line);
            }
            comment.push_str(FAILURE_BANNER);
            comment.push('\n');
            comment.push_str(message);
            comment
        }
        None => DEFAULT_COMMENT.to_string(),
    }
}

/// Browser handling after a scenario
pub fn browser_teardown(status: ScenarioStatus, reporter: &ReporterConfig) -> BrowserTeardown {
    match status {
        ScenarioStatus::Failed => BrowserTeardown {
            screenshot: reporter.take_screenshot,
            quit: reporter.close_on_fail,
        },
        _ => BrowserTeardown {
            screenshot: false,
            quit: true,
        },
    }
}

/// Hooks bound to one test run
pub struct Hooks {
    config: FrameworkConfig,
    testrail: Option<TestRailClient>,
}

impl Hooks {
    /// Create hooks; a TestRail client is built only when reporting is enabled
    pub fn new(config: FrameworkConfig) -> E2eResult<Self> {
        let testrail = if config.testrail.update {
            config.validate()?;
            Some(TestRailClient::from_config(&config.testrail)?)
        } else {
            None
        };
        Ok(Self { config, testrail })
    }

    /// Hooks with an explicit TestRail client
    pub fn with_client(config: FrameworkConfig, client: TestRailClient) -> Self {
        Self {
            config,
            testrail: Some(client),
        }
    }

    pub fn config(&self) -> &FrameworkConfig {
        &self.config
    }

    /// Prepare the TestRail run before any scenario executes.
    ///
    /// Without a configured `run_id`, a run is created from the project's
    /// test folders and its id is used for the rest of the suite.
    pub async fn before_all(&mut self) -> E2eResult<Option<u64>> {
        let Some(client) = &self.testrail else {
            info!("Skipping TestRail setup, reporting is disabled");
            return Ok(None);
        };
        if let Some(run_id) = self.config.testrail.run_id {
            info!(run_id, "reporting into existing TestRail run");
            return Ok(Some(run_id));
        }

        let testrail = &self.config.testrail;
        let run = client
            .prepare_run(&testrail.project_name, &testrail.test_folders, &self.config.target)
            .await?;
        self.config.testrail.run_id = Some(run.id);
        Ok(Some(run.id))
    }

    /// Decide whether the scenario runs
    pub fn before_scenario(&self, scenario: &Scenario) -> Option<SkipReason> {
        let reason = skip_reason(&scenario.tags, &self.config.target);
        if let Some(reason) = reason {
            info!(scenario = %scenario.name, ?reason, "skipping scenario");
        }
        reason
    }

    /// Report the outcome to TestRail.
    ///
    /// Returns the case id that was updated, if any.
    pub async fn after_scenario(&self, outcome: &ScenarioOutcome) -> E2eResult<Option<u64>> {
        let (Some(client), Some(run_id)) = (&self.testrail, self.config.testrail.run_id) else {
            return Ok(None);
        };

        let Some(case_id) = testrail_case_id(&outcome.scenario.tags) else {
            warn!(scenario = %outcome.scenario.name, "no TestRail case id tag on scenario");
            return Ok(None);
        };

        let Some(status_id) = outcome.status.testrail_status_id() else {
            warn!(scenario = %outcome.scenario.name, status = ?outcome.status, "status not reportable to TestRail");
            return Ok(None);
        };

        let result = CaseResult {
            status_id,
            comment: result_comment(outcome),
            elapsed: elapsed(outcome.duration_ms),
        };
        client.add_result_for_case(run_id, case_id, &result).await?;
        Ok(Some(case_id))
    }

    /// Close the TestRail run when configured to
    pub async fn after_all(&self) -> E2eResult<()> {
        let (Some(client), Some(run_id)) = (&self.testrail, self.config.testrail.run_id) else {
            return Ok(());
        };

        if self.config.testrail.close_run {
            info!("Test execution complete, closing test run");
            client.close_run(run_id).await?;
        } else {
            info!("Test execution complete, the test run has not been closed");
        }
        Ok(())
    }
}

/// TestRail timespan; runs under a second are omitted since TestRail rejects `0s`
fn elapsed(duration_ms: u64) -> Option<String> {
    let secs = duration_ms / 1000;
    (secs > 0).then(|| format!("{}s", secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_skip_rules() {
        assert_eq!(skip_reason(&tags(&["@wip"]), "qa"), Some(SkipReason::Excluded));
        assert_eq!(skip_reason(&tags(&["@smoke", "@skip"]), "qa"), Some(SkipReason::Excluded));
        assert_eq!(skip_reason(&tags(&["@smoke"]), "qa"), None);
        assert_eq!(skip_reason(&tags(&["@smoke"]), "prod"), Some(SkipReason::NotForProduction));
        assert_eq!(skip_reason(&tags(&["@smoke", "@prod"]), "prod"), None);
    }

    #[test]
    fn test_case_id_from_tags() {
        assert_eq!(testrail_case_id(&tags(&["@smoke", "@C1234", "@C99"])), Some(1234));
        assert_eq!(testrail_case_id(&tags(&["@Checkout", "@C77"])), Some(77));
        assert_eq!(testrail_case_id(&tags(&["@smoke"])), None);
    }

    #[test]
    fn test_status_ids() {
        assert_eq!(ScenarioStatus::Passed.testrail_status_id(), Some(1));
        assert_eq!(ScenarioStatus::Skipped.testrail_status_id(), Some(2));
        assert_eq!(ScenarioStatus::Failed.testrail_status_id(), Some(5));
        assert_eq!(ScenarioStatus::Pending.testrail_status_id(), None);
    }

    #[test]
    fn test_result_comment() {
        let mut outcome = ScenarioOutcome {
            scenario: Scenario {
                name: "Checkout with saved card".to_string(),
                tags: vec![],
                comments: tags(&["# header", "# owner", "# covers refunds"]),
            },
            status: ScenarioStatus::Failed,
            message: Some("expected 200, got 500".to_string()),
            duration_ms: 1200,
        };
        assert_eq!(
            result_comment(&outcome),
            "Checkout with saved card\n# covers refunds\n\n\n********* FAILURE DETAILS *********\n\n\n\nexpected 200, got 500"
        );

        outcome.message = None;
        assert_eq!(result_comment(&outcome), DEFAULT_COMMENT);
    }

    #[test]
    fn test_browser_teardown() {
        let reporter = ReporterConfig {
            take_screenshot: true,
            close_on_fail: false,
        };
        assert_eq!(
            browser_teardown(ScenarioStatus::Failed, &reporter),
            BrowserTeardown { screenshot: true, quit: false }
        );
        assert_eq!(
            browser_teardown(ScenarioStatus::Passed, &reporter),
            BrowserTeardown { screenshot: false, quit: true }
        );
    }

    #[test]
    fn test_elapsed() {
        assert_eq!(elapsed(400), None);
        assert_eq!(elapsed(65_000).as_deref(), Some("65s"));
    }

    #[tokio::test]
    async fn test_reporting_disabled_is_noop() {
        let hooks = Hooks::new(FrameworkConfig::default()).unwrap();
        let outcome = ScenarioOutcome {
            scenario: Scenario {
                name: "s".to_string(),
                tags: tags(&["@C1"]),
                comments: vec![],
            },
            status: ScenarioStatus::Passed,
            message: None,
            duration_ms: 0,
        };
        assert_eq!(hooks.after_scenario(&outcome).await.unwrap(), None);
        hooks.after_all().await.unwrap();
    }
}
