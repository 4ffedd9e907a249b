use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;
use back::{config::Config, store::Store, AppState};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();

    let store = Store::open(&config.data_file)?;
    let state = Arc::new(AppState::new(
        store,
        config.session_ttl(),
        config.tls().is_some(),
    ));
    let app = back::app(state);

    match config.tls() {
        Some((cert, key)) => {
            let tls = RustlsConfig::from_pem_file(cert, key).await?;

            info!(addr = %config.bind, "listening (https)");
            axum_server::bind_rustls(config.bind, tls)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            info!(addr = %config.bind, "listening (http)");
            axum_server::bind(config.bind)
                .serve(app.into_make_service())
                .await?;
        }
    }

    Ok(())
}
