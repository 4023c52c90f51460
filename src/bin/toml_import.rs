use clap::Parser;
use health_csv_import::core::importer::derive_entries;
use health_csv_import::core::ConfigProvider;
use health_csv_import::utils::{logger, validation::Validate};
use health_csv_import::{CsvParser, ImportEngine, LocalStorage, StoreBackend, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-import")]
#[command(about = "Body composition import driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "import-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Parse and convert the CSV without contacting the health store
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    logger::init_cli_logger(args.verbose || config.verbose());
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing will be submitted");
        return perform_dry_run(&config);
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    let store = StoreBackend::from_config(&config)?;
    let engine = ImportEngine::new_with_monitoring(LocalStorage::new("."), store, monitor_enabled);

    match engine.run(config.input_path()).await {
        Ok(outcome) => {
            println!("{}", outcome);
            if !outcome.is_success {
                std::process::exit(4);
            }
        }
        Err(e) => {
            tracing::error!("❌ Import failed: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig) {
    tracing::info!("📋 Import configuration:");
    tracing::info!("   Input: {}", config.input_path());
    tracing::info!("   Sink: {:?}", config.sink());
    if let Some(endpoint) = config.endpoint() {
        tracing::info!("   Endpoint: {}", endpoint);
    }
    tracing::info!("   Output: {}/{}", config.output_path(), config.file_name());
    tracing::info!("   Timeout: {}s", config.timeout_seconds());
}

fn perform_dry_run(config: &TomlConfig) -> anyhow::Result<()> {
    let file = std::fs::File::open(config.input_path())?;
    let (records, summary) = CsvParser::new().parse_with_summary(file);

    let mut entry_count = 0;
    let mut rejected = 0;
    for record in &records {
        match derive_entries(record) {
            Ok(entries) => entry_count += entries.len(),
            Err(e) => {
                rejected += 1;
                println!("⚠️  {}: {}", record.time.to_rfc3339(), e);
            }
        }
    }

    println!("Rows read: {}", summary.rows_seen);
    println!("Rows skipped: {}", summary.skipped());
    println!("Records parsed: {}", records.len());
    println!("Records with invalid values: {}", rejected);
    println!("Entries that would be submitted: {}", entry_count);
    Ok(())
}
