//! Per-scenario context shared by step definitions

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::auth::{self, UserToken};
use crate::config::FrameworkConfig;
use crate::environment::{Environment, EnvironmentData};
use crate::error::E2eResult;
use crate::session::ApiSession;

/// Something attached to the scenario report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub media_type: String,
    pub body: String,
}

/// Scenario state: configuration, target environment, user tokens, API
/// sessions and report attachments
pub struct World {
    config: FrameworkConfig,
    environment: Environment,
    tokens: BTreeMap<String, UserToken>,
    sessions: HashMap<String, Arc<ApiSession>>,
    attachments: Vec<Attachment>,
}

impl World {
    /// Create a world for the configured target
    pub fn new(config: FrameworkConfig, data: &EnvironmentData) -> E2eResult<Self> {
        let environment = data.get(&config.target)?.clone();
        Ok(Self {
            config,
            environment,
            tokens: BTreeMap::new(),
            sessions: HashMap::new(),
            attachments: Vec::new(),
        })
    }

    /// Load configuration and environment data from disk
    pub fn load(config: FrameworkConfig) -> E2eResult<Self> {
        let data = EnvironmentData::from_file(&config.data_path)?;
        Self::new(config, &data)
    }

    pub fn config(&self) -> &FrameworkConfig {
        &self.config
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Log in all users of the target environment; later sessions use the
    /// issued tokens. Returns how many users were authenticated.
    pub async fn pre_authenticate(&mut self) -> E2eResult<usize> {
        let tokens = auth::pre_authenticate(&self.environment, &self.config.target, &self.config).await?;
        let count = tokens.len();
        self.set_tokens(tokens);
        Ok(count)
    }

    /// Use tokens obtained elsewhere, such as by a parent process
    pub fn set_tokens(&mut self, tokens: BTreeMap<String, UserToken>) {
        self.tokens = tokens;
        self.sessions.clear();
    }

    pub fn token(&self, user: &str) -> Option<&UserToken> {
        self.tokens.get(user)
    }

    /// Session for `user`, created on first use
    pub fn session(&mut self, user: &str) -> E2eResult<Arc<ApiSession>> {
        if let Some(session) = self.sessions.get(user) {
            return Ok(Arc::clone(session));
        }
        let target = &self.config.target;
        let session = match self.tokens.get(user) {
            Some(token) => ApiSession::create_with_token(&self.environment, target, user, &self.config, token)?,
            None => ApiSession::create(&self.environment, target, user, &self.config)?,
        };
        let session = Arc::new(session);
        self.sessions.insert(user.to_string(), Arc::clone(&session));
        Ok(session)
    }

    pub fn attach(&mut self, name: impl Into<String>, media_type: impl Into<String>, body: impl Into<String>) {
        self.attachments.push(Attachment {
            name: name.into(),
            media_type: media_type.into(),
            body: body.into(),
        });
    }

    /// Attach the last request and response of `user`'s session
    pub fn attach_exchange(&mut self, user: &str) {
        let Some(session) = self.sessions.get(user).cloned() else {
            return;
        };
        if let Some(request) = session.last_request() {
            self.attach(format!("{} request", user), "application/json", request);
        }
        if let Some(response) = session.last_response() {
            self.attach(format!("{} response", user), "application/json", response);
        }
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Drop sessions and attachments before the next scenario; tokens stay
    pub fn reset(&mut self) {
        self.sessions.clear();
        self.attachments.clear();
    }
}
