//! Wait Command
//!
//! Polls an API endpoint as a test user until a record with the given
//! field values shows up (or, with `--absent`, goes away).

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use journeykit_e2e::{api_waiting, Backoff, E2eError, MatchSpec, PollError, PollOptions, World};

use crate::output::{print_error, print_item, print_success, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct WaitArgs {
    /// Test user whose credentials are used
    #[arg(short, long, default_value = "user1")]
    pub user: String,

    /// Endpoint path, relative to the environment's API domain
    #[arg(short, long)]
    pub path: String,

    /// Expected field value as key=value; repeatable, all must match.
    /// Values parse as JSON when possible, otherwise as strings
    #[arg(short, long = "field", required = true, value_parser = parse_field)]
    pub fields: Vec<(String, Value)>,

    /// Wait for the record to disappear instead
    #[arg(long)]
    pub absent: bool,

    /// Maximum number of attempts
    #[arg(short, long, default_value = "3")]
    pub attempts: u32,

    /// Seconds to wait after the first miss
    #[arg(long, default_value = "1.0")]
    pub initial_delay: f64,

    /// Growth exponent of the wait: 0 constant, 1 doubling, -1 halving
    #[arg(long, default_value = "1.0", allow_hyphen_values = true)]
    pub growth: f64,

    /// Dotted path of the value to print on success
    #[arg(short, long, default_value = "data.id")]
    pub extract: String,

    /// Message reported when the wait fails
    #[arg(short, long)]
    pub message: Option<String>,

    /// Log in through the environment's auth endpoint and use the token
    #[arg(long)]
    pub pre_auth: bool,
}

/// Parse `key=value`, reading the value as JSON when it is valid JSON
pub fn parse_field(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty field name in '{}'", raw));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

impl WaitArgs {
    fn match_spec(&self) -> MatchSpec {
        let fields: Map<String, Value> = self.fields.iter().cloned().collect();
        MatchSpec::FieldEquals(fields)
    }

    fn options(&self) -> PollOptions {
        let mut options = PollOptions::default()
            .extract(self.extract.clone())
            .attempts(self.attempts)
            .backoff(Backoff::new(self.initial_delay, self.growth));
        if self.absent {
            options = options.expect_absent();
        }
        if let Some(message) = &self.message {
            options = options.failure_message(message.clone());
        }
        options
    }
}

/// Result display wrapper for serialization
#[derive(Serialize)]
pub struct WaitDisplay {
    pub path: String,
    pub condition: String,
    pub value: Value,
}

impl TableDisplay for WaitDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Path", "Condition", "Value"]
    }

    fn row(&self) -> Vec<String> {
        let value = match &self.value {
            Value::Null => "-".to_string(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        vec![self.path.clone(), self.condition.clone(), value]
    }
}

fn condition_summary(spec: &MatchSpec, absent: bool) -> String {
    let described = match spec {
        MatchSpec::FieldEquals(fields) => Value::Object(fields.clone()).to_string(),
        MatchSpec::Predicate(_) => "record".to_string(),
    };
    if absent {
        format!("absence of {}", described)
    } else {
        described
    }
}

/// Run the wait; returns whether the condition was reached
pub async fn execute(args: WaitArgs, world: &mut World, format: OutputFormat) -> Result<bool> {
    if args.pre_auth {
        let count = world.pre_authenticate().await?;
        debug!(count, "pre-authenticated users");
    }
    let session = world.session(&args.user)?;
    let spec = args.match_spec();
    let options = args.options();
    debug!(path = %args.path, ?spec, "starting wait");

    let path = args.path.clone();
    match api_waiting(&session, |s| s.get(&path), &spec, &options).await {
        Ok(value) => {
            let condition = if args.absent { "absent" } else { "present" };
            if matches!(format, OutputFormat::Table) {
                print_success(&format!("{} reached on {}", condition_summary(&spec, args.absent), args.path));
            }
            print_item(
                &WaitDisplay {
                    path: args.path,
                    condition: condition.to_string(),
                    value: value.unwrap_or(Value::Null),
                },
                format,
            );
            Ok(true)
        }
        Err(E2eError::Poll(err @ PollError::NoMatchFound { .. })) => {
            print_error(&err.to_string());
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_field() {
        assert_eq!(parse_field("status=shipped").unwrap(), ("status".to_string(), json!("shipped")));
        assert_eq!(parse_field("count=3").unwrap(), ("count".to_string(), json!(3)));
        assert_eq!(parse_field("active=true").unwrap(), ("active".to_string(), json!(true)));
        assert_eq!(parse_field("note=a=b").unwrap(), ("note".to_string(), json!("a=b")));
        assert!(parse_field("status").is_err());
        assert!(parse_field("=x").is_err());
    }

    #[test]
    fn test_options_from_args() {
        let args = WaitArgs {
            user: "user1".to_string(),
            path: "/orders".to_string(),
            fields: vec![("status".to_string(), json!("shipped"))],
            absent: true,
            attempts: 6,
            initial_delay: 0.5,
            growth: -1.0,
            extract: "data.ref".to_string(),
            message: Some("order stuck".to_string()),
            pre_auth: false,
        };

        let options = args.options();
        assert_eq!(options.max_attempts, 6);
        assert!(!options.expect_match);
        assert_eq!(options.backoff, Backoff::new(0.5, -1.0));
        assert_eq!(options.extract_path, "data.ref");
        assert_eq!(options.failure_message.as_deref(), Some("order stuck"));
        assert!(args.match_spec().matches(&json!({"status": "shipped"})));
        assert_eq!(
            condition_summary(&args.match_spec(), args.absent),
            r#"absence of {"status":"shipped"}"#
        );
    }
}
