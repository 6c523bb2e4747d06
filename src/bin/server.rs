//! Server entry point: config, pool, schema bootstrap (non-fatal), routes.

use contribtrack::{app, ensure_schema, AppState, Config};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("contribtrack=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    let port = config.port;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect_lazy(&config.database_url)?;

    let state = AppState::new(pool, config);

    // Bootstrap failure must not take the process down; liveness probes need
    // the health endpoints. The failure is recorded and reported instead.
    if let Err(e) = ensure_schema(&state.pool, &state.config).await {
        tracing::error!(error = %e, "schema bootstrap failed, continuing degraded");
        state.mark_degraded(e.to_string());
    }

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
