use crate::core::ConfigProvider;
use crate::domain::ports::SinkKind;
use crate::utils::error::{ImportError, Result};
use crate::utils::validation::{validate_import_config, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub source: SourceConfig,
    pub sink: SinkConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    pub r#type: SinkKind,
    pub endpoint: Option<String>,
    pub access_token: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub output_path: Option<String>,
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub verbose: Option<bool>,
}

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_OUTPUT_PATH: &str = "./output";
const DEFAULT_FILE_NAME: &str = "health_records.json";

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ImportError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${HEALTH_STORE_TOKEN})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ImportError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn verbose(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.verbose)
            .unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.source.path
    }

    fn sink(&self) -> SinkKind {
        self.sink.r#type
    }

    fn endpoint(&self) -> Option<&str> {
        self.sink.endpoint.as_deref()
    }

    fn access_token(&self) -> Option<&str> {
        // 未被替換的 ${VAR} 視為未設定
        self.sink
            .access_token
            .as_deref()
            .filter(|token| !token.is_empty() && !token.starts_with("${"))
    }

    fn timeout_seconds(&self) -> u64 {
        self.sink.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }

    fn output_path(&self) -> &str {
        self.sink.output_path.as_deref().unwrap_or(DEFAULT_OUTPUT_PATH)
    }

    fn file_name(&self) -> &str {
        self.sink.file_name.as_deref().unwrap_or(DEFAULT_FILE_NAME)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_import_config(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_http_sink_config() {
        let toml_content = r#"
[source]
path = "data/body.csv"

[sink]
type = "http"
endpoint = "https://health.example.com/api"
access_token = "secret"
timeout_seconds = 10

[monitoring]
enabled = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.input_path(), "data/body.csv");
        assert_eq!(config.sink(), SinkKind::Http);
        assert_eq!(config.endpoint(), Some("https://health.example.com/api"));
        assert_eq!(config.access_token(), Some("secret"));
        assert_eq!(config.timeout_seconds(), 10);
        assert!(config.monitoring_enabled());
        assert!(!config.verbose());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_sink_defaults() {
        let toml_content = r#"
[source]
path = "body.csv"

[sink]
type = "file"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.output_path(), "./output");
        assert_eq!(config.file_name(), "health_records.json");
        assert_eq!(config.timeout_seconds(), 30);
        assert!(!config.monitoring_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TEST_HEALTH_ENDPOINT", "https://test.health.com");

        let toml_content = r#"
[source]
path = "body.csv"

[sink]
type = "http"
endpoint = "${TEST_HEALTH_ENDPOINT}"
access_token = "${TEST_HEALTH_TOKEN_NOT_SET}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.endpoint(), Some("https://test.health.com"));
        assert_eq!(config.access_token(), None);

        std::env::remove_var("TEST_HEALTH_ENDPOINT");
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[source]
path = "body.csv"

[sink]
type = "http"
endpoint = "invalid-url"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_sink_type_is_rejected() {
        let toml_content = r#"
[source]
path = "body.csv"

[sink]
type = "s3"
"#;

        assert!(matches!(
            TomlConfig::from_toml_str(toml_content),
            Err(ImportError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[source]
path = "from-file.csv"

[sink]
type = "file"
file_name = "out.json"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.input_path(), "from-file.csv");
        assert_eq!(config.file_name(), "out.json");
    }
}
