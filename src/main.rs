use clap::Parser;
use serde_json::Value;
use thought::app::pipelines::{
    destination_name, resolve_destination, sort_collection, DedupeOptions, DedupePipeline,
    ExportOptions, ExportPipeline, SortOptions, SyncPipeline,
};
use thought::config::{Cli, Command, LogFormat};
use thought::services::registry::sanitize_name;
use thought::services::ActionArgs;
use thought::utils::{logger, validation::Validate};
use thought::{
    parse_notion_id, AppConfig, EtlEngine, LocalStorage, NotionClient, Registry, Result,
    ThoughtError,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.log_format {
        LogFormat::Compact => logger::init_cli_logger(cli.verbose),
        LogFormat::Json => logger::init_json_logger(cli.verbose),
    }

    tracing::info!("🚀 Starting thought");
    tracing::info!("📁 Loading configuration from: {}", cli.config.display());

    let config = match AppConfig::load(Some(cli.config.as_path())) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "❌ Failed to load config file '{}': {}",
                cli.config.display(),
                e
            );
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code().max(1));
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code().max(1));
    }

    match run(cli.command, &config).await {
        Ok(outcome) => {
            tracing::info!("✅ Done: {}", outcome);
            println!("✅ {}", outcome);
        }
        Err(e) => {
            tracing::error!(
                "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }
}

async fn run(command: Command, config: &AppConfig) -> Result<String> {
    match command {
        Command::Dedupe {
            collection,
            fields,
            keep_last,
            dry_run,
            export,
        } => {
            let options = DedupeOptions {
                collection: parse_notion_id(&collection)?,
                fields: (!fields.is_empty()).then_some(fields),
                keep_first: !keep_last,
                dry_run,
            };
            let client = NotionClient::new(&config.notion)?;
            let pipeline = DedupePipeline::new(client, options);
            let pipeline = match export {
                Some(dir) => pipeline.with_snapshot(LocalStorage::new(dir)),
                None => pipeline,
            };
            EtlEngine::new("dedupe", pipeline).run().await
        }

        Command::Sort {
            collection,
            field,
            record_values,
            dry_run,
        } => {
            let options = SortOptions {
                collection: parse_notion_id(&collection)?,
                field,
                record_values,
                dry_run,
            };
            let client = NotionClient::new(&config.notion)?;
            let summary = sort_collection(&client, &options).await?;
            Ok(summary.to_string())
        }

        Command::Sync {
            service,
            action,
            target,
            folder,
            params,
            dry_run,
        } => {
            let mut args = ActionArgs::parse_pairs(&params)?;
            if let Some(folder) = folder {
                args = args.with("folder", folder);
            }

            let target = target
                .or_else(|| config.sync.services_page.clone())
                .ok_or_else(|| ThoughtError::MissingConfigError {
                    field: "sync.services_page (NOTION_SERVICES_PAGE) or --target".to_string(),
                })?;
            let target = parse_notion_id(&target)?;
            let client = NotionClient::new(&config.notion)?;

            let mut service = Registry::new().create(&service, config)?;
            service.authorize().await?;

            let name = destination_name(service.name(), &sanitize_name(&action));
            let destination = resolve_destination(&client, &target, &name).await?;

            let pipeline =
                SyncPipeline::new(client, service, action, args, destination).dry_run(dry_run);
            EtlEngine::new("sync", pipeline).run().await
        }

        Command::Export {
            collection,
            format,
            columns,
            clean_columns,
            plain_text,
            filter,
            output,
        } => {
            let filter = filter.as_deref().map(parse_filter).transpose()?;
            let options = ExportOptions {
                collection: parse_notion_id(&collection)?,
                format,
                columns,
                clean_columns,
                plain_text,
                filter,
            };
            let output_dir = output.unwrap_or_else(|| config.export.output_dir.clone());
            let client = NotionClient::new(&config.notion)?;
            let pipeline = ExportPipeline::new(client, LocalStorage::new(output_dir), options);
            let path = EtlEngine::new("export", pipeline).run().await?;
            Ok(format!("Export saved to: {}", path))
        }
    }
}

fn parse_filter(raw: &str) -> Result<Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(other) => Err(ThoughtError::ValidationError {
            message: format!("--filter must be a JSON object, got {}", other),
        }),
        Err(e) => Err(ThoughtError::ValidationError {
            message: format!("--filter is not valid JSON: {}", e),
        }),
    }
}
