use std::env;
use std::net::IpAddr;

use serde::Serialize;
use serde_json::Value;

use crate::models::config::ServerConfig;

/// Values available to every rendered view.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderContext {
    /// Working directory of the process.
    pub app_path: String,
    /// Configuration snapshot, filtered by `expose_config`.
    pub config: Value,
    /// Manifest of the effective theme.
    pub theme: Value,
    pub local_ip: String,
}

impl RenderContext {
    pub fn new(server_config: &ServerConfig, theme: Value, local_ip: IpAddr) -> Self {
        let app_path = env::current_dir()
            .map(|dir| dir.display().to_string())
            .unwrap_or_else(|_| ".".to_string());

        Self {
            app_path,
            config: server_config.render_snapshot(),
            theme,
            local_ip: local_ip.to_string(),
        }
    }

    pub fn to_tera(&self) -> tera::Context {
        tera::Context::from_serialize(self).unwrap_or_default()
    }
}
