//! journeykit E2E Test Framework
//!
//! Support library for browser-driven end-to-end suites. The browser itself
//! is driven by an external tool; this crate provides what the steps need
//! around it:
//! - environment and test-user data loaded from YAML
//! - user pre-authentication against the environment's login endpoint
//! - authenticated API sessions with a scratch store and payload capture
//! - `api_waiting`, a polling assertion for eventually consistent backends
//! - scenario hooks and TestRail result reporting
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Step definitions                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  World                                                       │
//! │    ├── config: FrameworkConfig (TOML)                       │
//! │    ├── environment: Environment (YAML)                      │
//! │    ├── pre_authenticate -> UserToken per user               │
//! │    ├── session(user) -> ApiSession                          │
//! │    └── attach / attach_exchange                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  api_waiting(session, search, MatchSpec, PollOptions)       │
//! │    └── journeykit_common::Poller                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Hooks                                                       │
//! │    ├── before_scenario -> skip rules                        │
//! │    ├── after_scenario  -> TestRailClient::add_result        │
//! │    └── after_all       -> TestRailClient::close_run         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod elements;
pub mod environment;
pub mod error;
pub mod hooks;
pub mod session;
pub mod testrail;
pub mod world;

pub use api::{api_waiting, api_waiting_with, wait_seconds};
pub use auth::{pre_authenticate, UserToken};
pub use config::FrameworkConfig;
pub use environment::{Environment, EnvironmentData, UserCredentials};
pub use error::{E2eError, E2eResult};
pub use hooks::{Hooks, Scenario, ScenarioOutcome, ScenarioStatus};
pub use session::{ApiResponse, ApiSession};
pub use testrail::TestRailClient;
pub use world::World;

pub use journeykit_common::{Backoff, MatchSpec, PollError, PollOptions};
