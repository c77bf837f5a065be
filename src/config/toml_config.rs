use crate::config::AdapterConfig;
use crate::core::ConfigProvider;
use crate::utils::error::{AdapterError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_TASKS_COLLECTION: &str = "tasks/task";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub adapter: AdapterConfig,
    pub tasks: Option<TasksConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    pub collection: String,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_TASKS_COLLECTION.to_string(),
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AdapterError::Config {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ES_URL})，找不到的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AdapterError::Config {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn tasks_collection(&self) -> &str {
        self.tasks
            .as_ref()
            .map(|t| t.collection.as_str())
            .unwrap_or(DEFAULT_TASKS_COLLECTION)
    }
}

impl ConfigProvider for TomlConfig {
    fn base_url(&self) -> &str {
        &self.adapter.url
    }

    fn timeout_seconds(&self) -> Option<u64> {
        self.adapter.timeout_seconds
    }

    fn find_all_size(&self) -> usize {
        self.adapter.find_all_size
    }

    fn refresh_on_write(&self) -> bool {
        self.adapter.refresh_on_write
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.adapter.validate()?;
        validation::validate_collection_path("tasks.collection", self.tasks_collection())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let config = TomlConfig::from_toml_str(
            r#"
[adapter]
url = "http://search.example.com"
timeout_seconds = 5
find_all_size = 500
refresh_on_write = true

[tasks]
collection = "todo/task"
"#,
        )
        .unwrap();

        assert_eq!(config.base_url(), "http://search.example.com");
        assert_eq!(config.timeout_seconds(), Some(5));
        assert_eq!(config.find_all_size(), 500);
        assert!(config.refresh_on_write());
        assert_eq!(config.tasks_collection(), "todo/task");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config.base_url(), "http://localhost:9200");
        assert_eq!(config.find_all_size(), 1_000_000);
        assert_eq!(config.tasks_collection(), DEFAULT_TASKS_COLLECTION);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("ES_ADAPTER_TEST_URL", "http://10.0.0.7:9200");
        let config = TomlConfig::from_toml_str(
            r#"
[adapter]
url = "${ES_ADAPTER_TEST_URL}"
"#,
        )
        .unwrap();
        assert_eq!(config.base_url(), "http://10.0.0.7:9200");
    }

    #[test]
    fn test_unresolved_env_var_fails_validation() {
        let config = TomlConfig::from_toml_str(
            r#"
[adapter]
url = "${ES_ADAPTER_SURELY_UNSET_VARIABLE}"
"#,
        )
        .unwrap();
        assert_eq!(config.base_url(), "${ES_ADAPTER_SURELY_UNSET_VARIABLE}");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml() {
        let err = TomlConfig::from_toml_str("[adapter\nurl = 1").unwrap_err();
        assert!(matches!(err, AdapterError::Config { .. }));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[adapter]\nurl = \"http://127.0.0.1:9201\"").unwrap();

        let config = TomlConfig::from_file(file.path()).unwrap();
        assert_eq!(config.base_url(), "http://127.0.0.1:9201");

        let missing = TomlConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(missing, AdapterError::Io(_)));
    }
}
