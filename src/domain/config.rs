use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use super::label_expression::{ExpressionError, LabelExpression};

/// Settings shared by the command line and test harnesses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Versions", into = "Versions")]
pub struct Config {
    /// Selects which examples are in scope.
    ///
    /// When absent, every example is in scope.
    pub match_labels: Option<LabelExpression>,

    /// How long a harness should wait for a single statement before failing
    /// it, in seconds.
    statement_timeout_secs: u64,

    /// Whether a harness should keep running an example's remaining
    /// statements after one fails.
    pub continue_after_failure: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            match_labels: None,
            statement_timeout_secs: default_statement_timeout_secs(),
            continue_after_failure: false,
        }
    }
}

/// An error loading or saving a [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file couldn't be read.
    #[error("failed to read config file: {0}")]
    Read(#[source] std::io::Error),

    /// The file isn't valid configuration.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration couldn't be rendered as TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The file couldn't be written.
    #[error("failed to write config file: {0}")]
    Write(#[source] std::io::Error),
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid, including a malformed `match_labels` expression.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        Ok(toml::from_str(&content)?)
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(ConfigError::Write)
    }

    /// The default time allowed for a single statement.
    #[must_use]
    pub const fn statement_timeout(&self) -> Duration {
        Duration::from_secs(self.statement_timeout_secs)
    }

    /// Sets the default time allowed for a single statement, rounded down to
    /// whole seconds.
    pub const fn set_statement_timeout(&mut self, timeout: Duration) {
        self.statement_timeout_secs = timeout.as_secs();
    }
}

const fn default_statement_timeout_secs() -> u64 {
    180
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        /// A label expression such as `fast and not flaky`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        match_labels: Option<String>,

        #[serde(default = "default_statement_timeout_secs")]
        statement_timeout_secs: u64,

        #[serde(default)]
        continue_after_failure: bool,
    },
}

impl TryFrom<Versions> for Config {
    type Error = ExpressionError;

    fn try_from(versions: Versions) -> Result<Self, Self::Error> {
        match versions {
            Versions::V1 {
                match_labels,
                statement_timeout_secs,
                continue_after_failure,
            } => Ok(Self {
                match_labels: match_labels.as_deref().map(str::parse).transpose()?,
                statement_timeout_secs,
                continue_after_failure,
            }),
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            match_labels: config.match_labels.map(|expression| expression.to_string()),
            statement_timeout_secs: config.statement_timeout_secs,
            continue_after_failure: config.continue_after_failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\nmatch_labels = \"fast and not flaky\"\nstatement_timeout_secs = 30\ncontinue_after_failure = true\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(
            config.match_labels,
            Some(LabelExpression::label("fast").and_not("flaky"))
        );
        assert_eq!(config.statement_timeout(), Duration::from_secs(30));
        assert!(config.continue_after_failure);
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(matches!(error, ConfigError::Read(_)));
        assert!(error.to_string().starts_with("failed to read config file:"));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nstatement_timeout_secs = \"soon\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn malformed_label_expression_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nmatch_labels = \"fast and\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn empty_file_returns_default() {
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
        assert_eq!(actual.statement_timeout(), Duration::from_secs(180));
    }

    #[test]
    fn save_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        let mut config = Config {
            match_labels: Some(LabelExpression::label("a").or(LabelExpression::not("b").and("c"))),
            continue_after_failure: true,
            ..Config::default()
        };
        config.set_statement_timeout(Duration::from_secs(5));

        config.save(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("_version = \"1\""));

        assert_eq!(Config::load(&path).unwrap(), config);
    }
}
