use clap::Parser;
use health_csv_import::core::ConfigProvider;
use health_csv_import::utils::error::ErrorSeverity;
use health_csv_import::utils::{logger, validation::Validate};
use health_csv_import::{CliConfig, ImportEngine, LocalStorage, StoreBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting health-csv-import");
    tracing::debug!("CLI config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let store = StoreBackend::from_config(&config)?;
    tracing::info!("Using {} health store", store.describe());

    let engine = ImportEngine::new_with_monitoring(LocalStorage::new("."), store, config.monitor);

    match engine.run(config.input_path()).await {
        Ok(outcome) => {
            println!("{}", outcome);
            if !outcome.is_success {
                std::process::exit(4);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Import failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
