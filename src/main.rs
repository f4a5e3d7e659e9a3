use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod detect;
mod pipeline;
mod render;
mod store;
mod video;

use api::{start_server, AppState};
use config::Config;
use detect::{Labels, OrtBackend, PersonDetector};

const PERSON_CLASS_NAME: &str = "person";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("passerby=debug".parse()?))
        .init();

    let config = Config::load()?;

    let labels = Labels::load(&config.model.labels)?;
    let person_class = labels.require(PERSON_CLASS_NAME)?;
    tracing::info!(
        classes = labels.len(),
        person_class,
        "labels loaded"
    );

    let backend = OrtBackend::new(&config.model.path)?;
    tracing::info!(
        model = %config.model.path,
        outputs = backend.output_names().len(),
        "model loaded"
    );

    let detector = PersonDetector::new(Box::new(backend), person_class);
    let state = AppState::new(detector, config.video.output_scale);

    let server = start_server(state.clone(), config.http.port);
    tokio::select! {
        result = server => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
            state.stop_active();
        }
    }

    tracing::info!("shutdown complete");
    Ok(())
}
