//! Environment Commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;

use journeykit_e2e::{Environment, EnvironmentData};

use crate::output::{print_item, print_list, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum EnvCommands {
    /// List configured environments
    List,

    /// Show an environment and its test users
    Show {
        /// Environment name
        name: String,
    },
}

/// Environment display wrapper for serialization
#[derive(Serialize)]
pub struct EnvironmentDisplay {
    pub name: String,
    pub api_domain: String,
    pub domain: Option<String>,
    pub users: usize,
    pub urls: usize,
}

impl EnvironmentDisplay {
    fn new(name: &str, env: &Environment) -> Self {
        Self {
            name: name.to_string(),
            api_domain: env.api_domain.clone(),
            domain: env.domain.clone(),
            users: env.users.len(),
            urls: env.urls.len(),
        }
    }
}

impl TableDisplay for EnvironmentDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "API Domain", "Domain", "Users", "URLs"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.api_domain.clone(),
            self.domain.clone().unwrap_or_else(|| "-".to_string()),
            self.users.to_string(),
            self.urls.to_string(),
        ]
    }
}

/// Test user display; passwords and key values are never shown
#[derive(Serialize)]
pub struct UserDisplay {
    pub name: String,
    pub login: String,
    pub user_id: Option<String>,
    pub api_keys: Vec<String>,
}

impl TableDisplay for UserDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Login", "User ID", "API Keys"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.login.clone(),
            self.user_id.clone().unwrap_or_else(|| "-".to_string()),
            if self.api_keys.is_empty() {
                "-".to_string()
            } else {
                self.api_keys.join(", ")
            },
        ]
    }
}

fn users(env: &Environment) -> Vec<UserDisplay> {
    env.users
        .iter()
        .map(|(name, creds)| UserDisplay {
            name: name.clone(),
            login: creds.id.clone(),
            user_id: creds.user_id.clone(),
            api_keys: creds.api_keys.keys().cloned().collect(),
        })
        .collect()
}

pub async fn execute(cmd: EnvCommands, data: &EnvironmentData, format: OutputFormat) -> Result<()> {
    match cmd {
        EnvCommands::List => {
            let items: Vec<EnvironmentDisplay> = data
                .environments
                .iter()
                .map(|(name, env)| EnvironmentDisplay::new(name, env))
                .collect();
            print_list(&items, format);
        }
        EnvCommands::Show { name } => {
            let env = data.get(&name)?;
            print_item(&EnvironmentDisplay::new(&name, env), format);
            print_list(&users(env), format);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA: &str = r#"
qa:
  domain: https://qa.example.test
  api_domain: https://api.qa.example.test
  users:
    user1:
      id: buyer@example.test
      pass: hunter2
      user_id: "42"
      api_keys:
        storefront: sk-123
"#;

    #[test]
    fn test_user_rows_hide_secrets() {
        let data = EnvironmentData::from_yaml(DATA).unwrap();
        let rows = users(data.get("qa").unwrap());

        assert_eq!(rows.len(), 1);
        let row = rows[0].row();
        assert_eq!(row, vec!["user1", "buyer@example.test", "42", "storefront"]);

        let json = serde_json::to_string(&rows).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(!json.contains("sk-123"));
    }

    #[test]
    fn test_environment_row() {
        let data = EnvironmentData::from_yaml(DATA).unwrap();
        let display = EnvironmentDisplay::new("qa", data.get("qa").unwrap());
        assert_eq!(
            display.row(),
            vec!["qa", "https://api.qa.example.test", "https://qa.example.test", "1", "0"]
        );
    }
}
