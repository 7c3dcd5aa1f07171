//! Service binary: configuration, logging, state, serve.

use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = pandora_config::load_from_env().context("failed to load configuration")?;

    let log_config = pandora_telemetry::LogConfig {
        level: config.logging.level.clone(),
        json_format: matches!(config.logging.format, pandora_config::LogFormat::Json),
    };
    pandora_telemetry::init_logging(&log_config).context("failed to initialize logging")?;
    pandora_telemetry::describe_metrics();

    tracing::info!(
        addr = %config.server.http_addr,
        document = %config.export.local_document_path.display(),
        bucket = %config.export.s3_bucket,
        key = %config.export.s3_key,
        max_entries = config.export.max_entries,
        "starting pandora"
    );

    let state = pandora_server::AppState::from_config(config).await;
    pandora_server::Server::new(state).run().await?;
    Ok(())
}
