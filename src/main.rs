use clap::Parser;
use decl_rollover::adapters::csv_report;
use decl_rollover::utils::date_format::format_date;
use decl_rollover::utils::error::ErrorSeverity;
use decl_rollover::utils::{logger, validation::Validate};
use decl_rollover::{
    CliConfig, JsonFileStore, OutputFormat, RolloverConfig, RolloverEngine, RolloverError,
    RolloverOutcome, RolloverRequest,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliConfig::parse();

    // 載入 TOML 配置；日誌設定可能來自配置檔，先載入再初始化
    let config = match RolloverConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if args.json_logs || config.json_logging() {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose || config.verbose_logging());
    }

    tracing::info!("🚀 Starting decl-rollover");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    if let Err(e) = args.validate() {
        exit_with(&e);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        exit_with(&e);
    }

    // 套用命令列覆蓋設定
    let mut request = RolloverRequest::from_config(&config);
    if args.source.is_some() {
        request.source_period = args.source.clone();
    }
    if args.target.is_some() {
        request.target_period = args.target.clone();
    }
    request.selection_overrides.extend(args.selection_overrides());
    request.dry_run = args.dry_run;

    let store = JsonFileStore::new(config.store_path());
    let engine = RolloverEngine::from_config(store, &config);

    match engine.run(&request).await {
        Ok(outcome) => {
            if let Err(e) = render(&outcome, args.format) {
                tracing::error!("❌ Failed to write rollover plan: {}", e);
                exit_with(&e);
            }
            if outcome.persisted {
                println!(
                    "✅ Created {} declarations for {}",
                    outcome.created.len(),
                    outcome.target_period
                );
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Rollover failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            exit_with(&e);
        }
    }

    Ok(())
}

fn exit_with(e: &RolloverError) -> ! {
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

fn render(outcome: &RolloverOutcome, format: OutputFormat) -> decl_rollover::Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&outcome.plan)?;
            println!("{}", json);
        }
        OutputFormat::Csv => {
            csv_report::write_items(&outcome.plan.items, std::io::stdout())?;
        }
        OutputFormat::Table => {
            println!(
                "📋 Rollover {} -> {}",
                outcome.source_period, outcome.target_period
            );
            for item in &outcome.plan.items {
                let due = format_date(item.due_date);
                println!(
                    "  {:<30} type {:<6} due {}",
                    item.customer_title,
                    item.type_id.as_str(),
                    if due.is_empty() { "(needs manual entry)" } else { due.as_str() }
                );
            }
            let stats = &outcome.plan.stats;
            println!(
                "  carried: {}, dropped: {}, injected: {}, already existing: {}",
                stats.carried, stats.dropped, stats.injected, stats.skipped_existing
            );
            println!();
        }
    }
    Ok(())
}
