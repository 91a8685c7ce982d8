use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use storefront_api::app::{self, services::AppServices};
use storefront_infra::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    storefront_observability::init();

    let settings = Settings::from_env().context("invalid configuration")?;

    let services = match &settings.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(settings.database_max_connections)
                .connect(url)
                .await
                .context("failed to connect to postgres")?;
            tracing::info!("using postgres document store");
            AppServices::postgres(pool, &settings)
                .await
                .context("failed to prepare postgres schema")?
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory document store");
            AppServices::in_memory(&settings)
        }
    };

    let app = app::build_app(services);

    let listener = tokio::net::TcpListener::bind(settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
