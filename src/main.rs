//! Proctor Monitor entrypoint: serves the frame analysis API until Ctrl+C.
//! Perception backends other than the reference registry are not wired in here;
//! missing producers degrade to empty signals.

use proctor_monitor::{
    config::MonitorConfig,
    logging::StructuredLogger,
    orchestrator::FrameAnalyzer,
    perception::{ReferenceRegistry, Unconfigured},
    risk::FusionEngine,
    server,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = MonitorConfig::default_path();
    let config = MonitorConfig::load(&config_path);

    StructuredLogger::init(config.log.json, &config.log.level);

    info!(
        config = %config_path.display(),
        window_size = config.fusion.window_size,
        "proctor monitor starting"
    );

    let engine = Arc::new(FusionEngine::new(config.fusion.clone(), config.labels.clone()));
    let analyzer = Arc::new(FrameAnalyzer::new(
        Arc::new(ReferenceRegistry::new(config.identity.match_tolerance)),
        Arc::new(Unconfigured),
        Arc::new(Unconfigured),
        engine,
        config.server.max_frame_bytes,
    ));

    server::serve(&config.server, analyzer).await?;
    info!("proctor monitor stopped");
    Ok(())
}
