use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chronicle_export::http_api::{self, AppState};
use chronicle_export::{DailyExporter, ExportConfig, SqliteTaskStore, TemplateRenderer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::var_os("CHRONICLE_CONFIG").map(PathBuf::from);
    let config = ExportConfig::resolve(config_path.as_deref())?;
    let addr: SocketAddr = config
        .http_addr
        .parse()
        .with_context(|| format!("invalid listen address {}", config.http_addr))?;

    let store = SqliteTaskStore::open(&config.database_path)
        .with_context(|| format!("opening {:?}", config.database_path))?;
    let renderer = TemplateRenderer::from_path(&config.template_path)?;
    let exporter = DailyExporter::new(
        Arc::new(store) as http_api::SharedStore,
        Arc::new(renderer) as http_api::SharedRenderer,
    )
    .with_extension(config.document_extension.as_str());

    log::info!("chronicle export API listening on http://{addr}");
    http_api::serve(addr, AppState::with_exporter(exporter)).await?;
    Ok(())
}
