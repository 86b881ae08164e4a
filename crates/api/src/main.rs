use anyhow::Context;

use shutter_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shutter_observability::init();

    // Misconfiguration is fatal: never serve with a broken trust setup.
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "refusing to start");
            return Err(e.into());
        }
    };

    tracing::info!(
        environment = ?config.environment,
        algorithm = %config.signing.algorithm(),
        kid = config.signing.key_id(),
        lifetime_secs = config.signing.lifetime_secs(),
        "signing configuration loaded"
    );

    let app = shutter_api::app::build_app(&config).context("failed to build application")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
