use crate::core::ConfigProvider;
use crate::domain::ports::SinkKind;
use crate::utils::error::Result;
use crate::utils::validation::{validate_import_config, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "health-csv-import")]
#[command(about = "Import body composition CSV exports into a health data store")]
pub struct CliConfig {
    /// CSV file with a header line and one measurement per row
    #[arg(short, long)]
    pub input: String,

    #[arg(long, value_enum, default_value = "file")]
    pub sink: SinkKind,

    /// Base URL of the health store (required for the http sink)
    #[arg(long)]
    pub endpoint: Option<String>,

    #[arg(long, env = "HEALTH_STORE_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    #[arg(long, default_value = "30")]
    pub timeout_seconds: u64,

    /// Directory for the file sink
    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = "health_records.json")]
    pub file_name: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        &self.input
    }

    fn sink(&self) -> SinkKind {
        self.sink
    }

    fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_import_config(self)
    }
}
