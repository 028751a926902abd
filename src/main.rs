use clap::Parser;
use external_link_report::utils::error::ErrorSeverity;
use external_link_report::utils::{logger, validation::Validate};
use external_link_report::{
    CliConfig, ContentSource, EtlEngine, LinkReportPipeline, LocalStorage, OutboxDispatcher,
    ReportConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 先載入配置，日誌格式由配置決定
    let config = match ReportConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    logger::init_cli_logger(config.log_format());
    tracing::info!("Starting external-link-report");

    for check in [cli.validate(), config.validate()] {
        if let Err(e) = check {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    }

    let source = ContentSource::from_config(&config.source)?;
    let storage = LocalStorage::new(config.outbox_path().to_string());
    let dispatcher = OutboxDispatcher::new(storage.clone());
    let pipeline = LinkReportPipeline::new(source, dispatcher, config, cli.recipient_list());

    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        Ok(message_dir) => {
            let location = storage.full_path(&message_dir);
            tracing::info!("✅ Report generation completed");
            println!("✅ Reports queued in {}", location.display());
        }
        Err(e) => {
            tracing::error!(
                "❌ Report generation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            // 依嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    }

    Ok(())
}
