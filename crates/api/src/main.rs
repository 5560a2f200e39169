use std::sync::Arc;

use anyhow::Result;
use api::{build_router, ApiState};
use axum::Router;
use common::{config::AppConfig, logging};
use feed_pipeline::{load_sample, FeedPipelineBuilder};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    logging::init_tracing("api", &config.observability.log_level);

    let mut builder = FeedPipelineBuilder::from_config(&config.cache);
    if let Some(path) = &config.preview.sample_path {
        builder = builder.sample(load_sample(path).await?);
    }
    let pipeline = builder.build();

    let metrics_path: &'static str =
        Box::leak(config.observability.metrics_path.clone().into_boxed_str());
    let state = Arc::new(ApiState {
        pipeline,
        metrics_path,
    });
    let app: Router = build_router(state);

    let addr: std::net::SocketAddr = config.api.bind.parse()?;
    info!("api listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
