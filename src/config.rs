use crate::http::HttpConfig;
use crate::workflows::refresh::{DEFAULT_CONFLICT_MARKER, DEFAULT_REFRESH_MESSAGE};
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-user and per-project configuration file
pub const CONFIG_FILE_NAME: &str = ".airrc";

/// Main configuration structure for air
///
/// Every tool section is optional so that commands which only touch Jira
/// keep working when Subversion or Crucible are not set up.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AirConfig {
    #[serde(default)]
    pub jira: Option<JiraConfig>,
    #[serde(default)]
    pub svn: Option<SvnConfig>,
    #[serde(default)]
    pub crucible: Option<CrucibleConfig>,
    /// Extra subcommand names, mapped to the command they stand for
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JiraConfig {
    pub server: String,
    pub username: String,
    pub password: String,
    /// Project new issues are created in
    pub project: String,
    /// Transition used by `close-ticket`
    #[serde(default = "default_close_status")]
    pub close_status: String,
    /// Query behind `list-tickets`
    #[serde(default)]
    pub list: JiraQueryConfig,
    /// Query behind `list-reviews`
    #[serde(default)]
    pub review: JiraQueryConfig,
}

/// A listing query: raw JQL, or the name of a favourite filter.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct JiraQueryConfig {
    pub jql: Option<String>,
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SvnConfig {
    /// Directory URL holding the feature branches
    pub branch_url: String,
    pub trunk_url: String,
    /// Parent directory for scratch working copies (system temp dir when unset)
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
    /// Substring of merge output taken to mean the merge conflicted
    #[serde(default = "default_conflict_marker")]
    pub conflict_marker: String,
    #[serde(default = "default_refresh_message")]
    pub refresh_message: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrucibleConfig {
    pub server: String,
    pub username: String,
    pub password: String,
    /// Crucible project key reviews are created in
    pub key: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level used when neither `AIR_LOG` nor `-v` say otherwise
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            json_logs: false,
        }
    }
}

fn default_close_status() -> String {
    "Close Issue".to_string()
}

fn default_conflict_marker() -> String {
    DEFAULT_CONFLICT_MARKER.to_string()
}

fn default_refresh_message() -> String {
    DEFAULT_REFRESH_MESSAGE.to_string()
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("the [{0}] section is missing from {CONFIG_FILE_NAME}; run `air init` to create a sample")]
    MissingSection(&'static str),
}

impl AirConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. `~/.airrc`
    /// 3. `./.airrc`
    /// 4. The file named by `--config`, which must exist
    /// 5. Environment variables such as `AIR__JIRA__PASSWORD`
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(home) = std::env::var_os("HOME") {
            let user_file = Path::new(&home).join(CONFIG_FILE_NAME);
            if user_file.exists() {
                builder = builder.add_source(File::from(user_file).format(FileFormat::Toml));
            }
        }

        if Path::new(CONFIG_FILE_NAME).exists() {
            builder = builder.add_source(File::new(CONFIG_FILE_NAME, FileFormat::Toml));
        }

        if let Some(path) = explicit {
            builder = builder.add_source(
                File::from(path.to_path_buf())
                    .format(FileFormat::Toml)
                    .required(true),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix("AIR")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("failed to read configuration")?;
        let air_config: AirConfig = config
            .try_deserialize()
            .context("invalid configuration")?;

        tracing::debug!(
            jira = air_config.jira.is_some(),
            svn = air_config.svn.is_some(),
            crucible = air_config.crucible.is_some(),
            "configuration loaded"
        );
        Ok(air_config)
    }

    /// Parse a configuration from TOML text alone
    pub fn from_toml(text: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }

    pub fn jira(&self) -> Result<&JiraConfig, SettingsError> {
        self.jira.as_ref().ok_or(SettingsError::MissingSection("jira"))
    }

    pub fn svn(&self) -> Result<&SvnConfig, SettingsError> {
        self.svn.as_ref().ok_or(SettingsError::MissingSection("svn"))
    }

    pub fn crucible(&self) -> Result<&CrucibleConfig, SettingsError> {
        self.crucible
            .as_ref()
            .ok_or(SettingsError::MissingSection("crucible"))
    }
}

/// Starting point written by `air init`
pub const SAMPLE_AIRRC: &str = r#"# air configuration
# Values can also be supplied through the environment, e.g. AIR__JIRA__PASSWORD.

[jira]
server = "https://jira.example.com"
username = "first.last"
password = "changeme"
# new issues are created in this project
project = "SANDBOX"
close_status = "Close Issue"

[jira.list]
# filter = "assigned to me"
jql = "assignee=currentUser() AND status != Closed AND status != Resolved"

[jira.review]
# filter = "ready for review"
jql = 'status IN ("Ready for Review", "In Review")'

[svn]
branch_url = "https://svn.example.com/repo/branches"
trunk_url = "https://svn.example.com/repo/trunk"
# scratch_dir = "/var/tmp"

[crucible]
server = "https://fisheye.example.com"
username = "first.last"
password = "changeme"
key = "CR-SANDBOX"

[aliases]
ls = "list_tickets"
start = "start_work"
mkticket = "create_bug"
mkbug = "create_bug"
mktask = "create_task"
mkbranch = "make_branch"
comment = "add_comment"
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_parses_with_every_section() {
        let config = AirConfig::from_toml(SAMPLE_AIRRC).unwrap();

        let jira = config.jira().unwrap();
        assert_eq!(jira.project, "SANDBOX");
        assert_eq!(jira.close_status, "Close Issue");
        assert!(jira.list.jql.is_some());
        assert_eq!(jira.list.filter, None);

        let svn = config.svn().unwrap();
        assert_eq!(svn.branch_url, "https://svn.example.com/repo/branches");
        assert_eq!(svn.conflict_marker, "conflicts");
        assert_eq!(svn.refresh_message, "refreshed from trunk");

        assert_eq!(config.crucible().unwrap().key, "CR-SANDBOX");
        assert_eq!(config.aliases.get("ls").map(String::as_str), Some("list_tickets"));
    }

    #[test]
    fn test_missing_sections_are_reported_by_name() {
        let config = AirConfig::from_toml("[aliases]\nx = \"take\"\n").unwrap();

        let err = config.svn().unwrap_err();
        assert!(err.to_string().contains("[svn]"));
        assert!(config.jira().is_err());
        assert!(config.crucible().is_err());
    }

    #[test]
    fn test_defaults_fill_optional_keys() {
        let config = AirConfig::from_toml(
            r#"
            [svn]
            branch_url = "file:///repo/branches"
            trunk_url = "file:///repo/trunk"

            [http]
            requests_per_second = 2
            "#,
        )
        .unwrap();

        let svn = config.svn().unwrap();
        assert_eq!(svn.scratch_dir, None);
        assert_eq!(svn.conflict_marker, DEFAULT_CONFLICT_MARKER);
        assert_eq!(config.http.requests_per_second, 2);
        assert_eq!(config.http.timeout_seconds, 30);
        assert_eq!(config.observability.log_level, "warn");
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(AirConfig::load(Some(&missing)).is_err());
    }
}
