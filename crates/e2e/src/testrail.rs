//! TestRail reporting client
//!
//! Talks to the TestRail API v2 (`index.php?/api/v2/<endpoint>`) with basic
//! auth. Covers run setup before a suite and result reporting during it.

use chrono::Local;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::TestRailConfig;
use crate::error::{E2eError, E2eResult};

/// A TestRail project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub is_completed: bool,
}

/// A TestRail test run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: u64,
    #[serde(default)]
    pub suite_id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub project_id: Option<u64>,
    #[serde(default)]
    pub created_on: Option<i64>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A TestRail section (test folder)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<u64>,
}

/// A TestRail test case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub section_id: Option<u64>,
}

/// Body of `add_run`
#[derive(Debug, Clone, Serialize)]
pub struct NewRun {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suite_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub include_all: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub case_ids: Vec<u64>,
}

/// Body of `add_result_for_case`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseResult {
    pub status_id: u8,
    pub comment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Wrapped(Wrapped<T>),
    Bare(Vec<T>),
}

#[derive(Deserialize)]
struct Wrapped<T> {
    #[serde(alias = "projects", alias = "runs", alias = "sections", alias = "cases")]
    items: Vec<T>,
}

/// Page size of paginated listings
const PAGE_LIMIT: usize = 250;

impl<T> Listing<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            Listing::Wrapped(w) => w.items,
            Listing::Bare(items) => items,
        }
    }
}

/// Client for one TestRail instance
pub struct TestRailClient {
    client: reqwest::Client,
    base_url: String,
    user: String,
    password: String,
}

impl TestRailClient {
    pub fn new(base_url: &str, user: &str, password: &str) -> E2eResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            user: user.to_string(),
            password: password.to_string(),
        })
    }

    /// Build a client from framework configuration
    pub fn from_config(config: &TestRailConfig) -> E2eResult<Self> {
        let user = config
            .user
            .as_deref()
            .ok_or_else(|| E2eError::Config("TestRail user is not set".to_string()))?;
        let password = config
            .password
            .as_deref()
            .ok_or_else(|| E2eError::Config("TestRail password is not set".to_string()))?;
        Self::new(&config.url, user, password)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/index.php?/api/v2/{}", self.base_url, path)
    }

    async fn call<T: DeserializeOwned>(&self, method: Method, path: &str, body: Option<&Value>) -> E2eResult<T> {
        let url = self.endpoint(path);
        let mut request = self
            .client
            .request(method.clone(), &url)
            .basic_auth(&self.user, Some(&self.password));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(method = %method, endpoint = path, status = status.as_u16(), "TestRail request");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(E2eError::TestRail {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        Ok(serde_json::from_str(text)?)
    }

    pub async fn get_projects(&self) -> E2eResult<Vec<Project>> {
        let listing: Listing<Project> = self.call(Method::GET, "get_projects", None).await?;
        Ok(listing.into_items())
    }

    /// Find a project by name, ignoring case
    pub async fn find_project(&self, name: &str) -> E2eResult<Project> {
        let project = self
            .get_projects()
            .await?
            .into_iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| E2eError::ValueNotFound(format!("TestRail project '{}'", name)))?;
        info!(project = %project.name, id = project.id, "TestRail project found");
        Ok(project)
    }

    pub async fn get_runs(&self, project_id: u64) -> E2eResult<Vec<Run>> {
        let listing: Listing<Run> = self
            .call(Method::GET, &format!("get_runs/{}", project_id), None)
            .await?;
        Ok(listing.into_items())
    }

    /// Sections of a project, following pagination
    pub async fn get_sections(&self, project_id: u64) -> E2eResult<Vec<Section>> {
        let mut sections = Vec::new();
        for page in 0.. {
            let listing: Listing<Section> = self
                .call(
                    Method::GET,
                    &format!(
                        "get_sections/{}&offset={}&limit={}",
                        project_id,
                        page * PAGE_LIMIT,
                        PAGE_LIMIT
                    ),
                    None,
                )
                .await?;
            let items = listing.into_items();
            let last = items.len() < PAGE_LIMIT;
            sections.extend(items);
            if last {
                break;
            }
        }
        Ok(sections)
    }

    pub async fn get_cases(&self, project_id: u64, section_id: u64) -> E2eResult<Vec<Case>> {
        let listing: Listing<Case> = self
            .call(
                Method::GET,
                &format!("get_cases/{}&section_id={}", project_id, section_id),
                None,
            )
            .await?;
        Ok(listing.into_items())
    }

    pub async fn add_run(&self, project_id: u64, run: &NewRun) -> E2eResult<Run> {
        let body = serde_json::to_value(run)?;
        self.call(Method::POST, &format!("add_run/{}", project_id), Some(&body))
            .await
    }

    /// Create a run holding every case under the `folders` sections of
    /// `project_name`.
    ///
    /// Fails when the project, the sections, or any cases cannot be found.
    pub async fn prepare_run(&self, project_name: &str, folders: &[String], target: &str) -> E2eResult<Run> {
        let project = self.find_project(project_name).await?;

        let sections: Vec<Section> = self
            .get_sections(project.id)
            .await?
            .into_iter()
            .filter(|s| folders.iter().any(|f| f == &s.name))
            .collect();
        if sections.is_empty() {
            return Err(E2eError::ValueNotFound(format!(
                "TestRail sections {:?} in project '{}'",
                folders, project.name
            )));
        }
        info!(count = sections.len(), "found TestRail sections with UI tests");

        let mut case_ids = Vec::new();
        for section in &sections {
            case_ids.extend(self.get_cases(project.id, section.id).await?.into_iter().map(|c| c.id));
        }
        if case_ids.is_empty() {
            return Err(E2eError::ValueNotFound(format!(
                "TestRail cases for project '{}'",
                project.name
            )));
        }
        info!(count = case_ids.len(), "found TestRail cases");

        let run = NewRun {
            name: run_name(&project.name, target, &Local::now().format("%m-%d-%H%M").to_string()),
            suite_id: None,
            description: Some("Test run created by the UI automation framework".to_string()),
            include_all: false,
            case_ids,
        };
        let run = self.add_run(project.id, &run).await?;
        info!(run_id = run.id, name = %run.name, "TestRail run created");
        Ok(run)
    }

    pub async fn add_result_for_case(&self, run_id: u64, case_id: u64, result: &CaseResult) -> E2eResult<Value> {
        let body = serde_json::to_value(result)?;
        self.call(
            Method::POST,
            &format!("add_result_for_case/{}/{}", run_id, case_id),
            Some(&body),
        )
        .await
    }

    /// Close a run. A closed run cannot receive further results.
    pub async fn close_run(&self, run_id: u64) -> E2eResult<Run> {
        let body = serde_json::json!({});
        let run = self
            .call(Method::POST, &format!("close_run/{}", run_id), Some(&body))
            .await?;
        info!(run_id, "TestRail run closed");
        Ok(run)
    }
}

fn run_name(project: &str, target: &str, timestamp: &str) -> String {
    format!(
        "{} UI automation test run in {} at {}",
        project,
        target.to_uppercase(),
        timestamp
    )
}
