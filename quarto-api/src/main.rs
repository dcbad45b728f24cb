//! Quarto Web API
//!
//! Serves a single in-memory game session over JSON. The engine in
//! quarto-core silently ignores invalid actions; this layer reports them
//! as `400 {detail}` so clients can show why an action was refused.
//!
//! Configuration (environment):
//! - `QUARTO_API_ADDR`: listen address, default `0.0.0.0:8000`
//! - `RUST_LOG`: tracing filter, default `info`

mod error;
mod routes;
mod session;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::routes::AppStateInner;

const ADDR_VAR: &str = "QUARTO_API_ADDR";
const DEFAULT_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 8000);

/// Server settings loaded from environment variables.
#[derive(Debug, Clone, Copy)]
struct Config {
    addr: SocketAddr,
}

impl Config {
    fn from_env() -> Self {
        Self::from_value(std::env::var(ADDR_VAR).ok().as_deref())
    }

    fn from_value(addr: Option<&str>) -> Self {
        let addr = match addr.map(str::parse::<SocketAddr>) {
            Some(Ok(addr)) => addr,
            Some(Err(e)) => {
                warn!(error = %e, var = ADDR_VAR, "invalid listen address, using default");
                SocketAddr::from(DEFAULT_ADDR)
            }
            None => SocketAddr::from(DEFAULT_ADDR),
        };
        Self { addr }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    let state = Arc::new(AppStateInner::default());
    let app = routes::app(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, "quarto api listening");
    axum::serve(listener, app).await?;
    Ok(())
}
