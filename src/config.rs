use crate::constants::*;
use crate::error::{Result, StatsError};
use crate::types::{AlwaysDerivedSet, AmbiguousNameSet, ColumnLabel, LabelSet};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Destination CSV path
    pub output: PathBuf,
    pub fetch: FetchConfig,
    pub rules: RuleConfig,
    pub enrich: EnrichConfig,
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Maximum number of sources fetched at once
    pub concurrency: usize,
    /// Attempts per source before it is skipped
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Column used to detect header rows echoed into the data
    pub identity_column: ColumnLabel,
    /// Column that receives the injected source identifier
    pub source_id_column: ColumnLabel,
    pub ambiguous: AmbiguousNameSet,
    pub always_derived: AlwaysDerivedSet,
    pub derived_suffix: String,
    pub rename_policy: RenamePolicy,
}

/// What to do when canonical labels still collide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenamePolicy {
    /// Log an integrity warning and keep the duplicate labels
    #[default]
    Warn,
    /// Fail the run before anything is written
    Abort,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
    pub entity_column: ColumnLabel,
    pub group_column: ColumnLabel,
    pub key_column: ColumnLabel,
    pub fold_columns: Vec<ColumnLabel>,
}

/// One configured table source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    /// `http(s)://` URL or local HTML file path
    pub url: String,
    #[serde(default)]
    pub inject_source_id: bool,
    #[serde(default)]
    pub source_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_OUTPUT),
            fetch: FetchConfig::default(),
            rules: RuleConfig::default(),
            enrich: EnrichConfig::default(),
            sources: vec![
                SourceConfig {
                    name: BIG5_SOURCE_NAME.to_string(),
                    url: BIG5_URL.to_string(),
                    inject_source_id: false,
                    source_id: None,
                },
                SourceConfig {
                    name: CHAMPIONSHIP_SOURCE_NAME.to_string(),
                    url: CHAMPIONSHIP_URL.to_string(),
                    inject_source_id: true,
                    source_id: Some(CHAMPIONSHIP_SOURCE_ID.to_string()),
                },
            ],
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: 2,
            max_retries: 3,
            retry_delay_ms: 1000,
            timeout_seconds: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            identity_column: PLAYER_COLUMN.into(),
            source_id_column: COMPETITION_COLUMN.into(),
            ambiguous: LabelSet::new(AMBIGUOUS_LABELS.iter().copied()),
            always_derived: LabelSet::new(ALWAYS_DERIVED_LABELS.iter().copied()),
            derived_suffix: DERIVED_SUFFIX.to_string(),
            rename_policy: RenamePolicy::Warn,
        }
    }
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            entity_column: PLAYER_COLUMN.into(),
            group_column: SQUAD_COLUMN.into(),
            key_column: KEY_COLUMN.into(),
            fold_columns: FOLD_COLUMNS.iter().map(|c| ColumnLabel::from(*c)).collect(),
        }
    }
}

impl Config {
    /// Reads and validates a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            StatsError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(StatsError::Config("no sources configured".into()));
        }
        if self.fetch.concurrency == 0 {
            return Err(StatsError::Config("fetch.concurrency must be at least 1".into()));
        }
        if self.fetch.max_retries == 0 {
            return Err(StatsError::Config("fetch.max_retries must be at least 1".into()));
        }
        if self.rules.derived_suffix.is_empty() {
            return Err(StatsError::Config("rules.derived_suffix must not be empty".into()));
        }
        for source in &self.sources {
            if source.inject_source_id && source.source_id.is_none() {
                return Err(StatsError::Config(format!(
                    "source '{}' sets inject_source_id but has no source_id",
                    source.name
                )));
            }
        }
        Ok(())
    }

    /// Keeps only the named sources, in configuration order.
    pub fn retain_sources(&mut self, names: &[String]) -> Result<()> {
        let wanted: Vec<String> = names.iter().map(|n| n.trim().to_lowercase()).collect();
        self.sources.retain(|s| wanted.contains(&s.name.to_lowercase()));
        if self.sources.is_empty() {
            return Err(StatsError::Config(format!(
                "none of the requested sources are configured: {}",
                names.join(", ")
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_only_config_uses_defaults() {
        let config = Config::from_toml(
            r#"
            [[sources]]
            name = "Local"
            url = "fixtures/table.html"
            "#,
        )
        .unwrap();

        assert_eq!(config.sources.len(), 1);
        assert!(!config.sources[0].inject_source_id);
        assert_eq!(config.rules.identity_column, "Player");
        assert!(config.rules.ambiguous.contains("Gls"));
        assert!(config.rules.always_derived.contains("xG+xAG"));
        assert_eq!(config.rules.rename_policy, RenamePolicy::Warn);
        assert_eq!(config.output, PathBuf::from(DEFAULT_OUTPUT));
    }

    #[test]
    fn test_rule_overrides() {
        let config = Config::from_toml(
            r#"
            output = "out/stats.csv"

            [rules]
            ambiguous = ["Gls", "Gls", "Ast"]
            always_derived = []
            rename_policy = "abort"

            [[sources]]
            name = "Championship"
            url = "https://example.com/champ"
            inject_source_id = true
            source_id = "ENG-Championship"
            "#,
        )
        .unwrap();

        assert_eq!(config.rules.ambiguous.len(), 2);
        assert!(config.rules.always_derived.is_empty());
        assert_eq!(config.rules.rename_policy, RenamePolicy::Abort);
        assert_eq!(config.sources[0].source_id.as_deref(), Some("ENG-Championship"));
    }

    #[test]
    fn test_injection_without_value_is_rejected() {
        let err = Config::from_toml(
            r#"
            [[sources]]
            name = "Broken"
            url = "x.html"
            inject_source_id = true
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, StatsError::Config(_)));
    }

    #[test]
    fn test_empty_source_list_is_rejected() {
        assert!(Config::from_toml("sources = []").is_err());
    }

    #[test]
    fn test_retain_sources_filters_by_name() {
        let mut config = Config::default();
        config.retain_sources(&["efl championship".to_string()]).unwrap();
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].name, CHAMPIONSHIP_SOURCE_NAME);

        assert!(config.retain_sources(&["nope".to_string()]).is_err());
    }
}
