use crate::bootstrap::Bootstrap;
use crate::errors::BootstrapResult;
use crate::models::config::ServerConfig;

pub mod bootstrap;
pub mod db;
pub mod dto;
pub mod errors;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod net;
pub mod routes;
pub mod server;
pub mod theme;

/// Runs the panel with the default database gateway and API routes until
/// every server has shut down.
pub async fn run(server_config: ServerConfig) -> BootstrapResult<()> {
    let running = Bootstrap::new(server_config).start()?;
    running.wait().await?;
    Ok(())
}
