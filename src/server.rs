//! Construction and binding of the API and console HTTP servers.

use std::io;
use std::net::SocketAddr;
use std::path::Path;

use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::{App, HttpServer, middleware, web};
use tera::Tera;

use crate::errors::{BootstrapError, BootstrapResult};
use crate::middleware::log_request;
use crate::models::config::ServerConfig;
use crate::routes::api::ApiRoutes;
use crate::routes::console::{self, ConsoleMode, ConsoleState};

/// A server whose listener is bound but which has not been started yet.
pub struct BoundServer {
    pub server: Server,
    pub addrs: Vec<SocketAddr>,
}

/// Loads every `*.html` template under `dir`.
pub fn load_templates(dir: &Path) -> BootstrapResult<Tera> {
    let glob = format!("{}/**/*.html", dir.display());
    Tera::new(&glob).map_err(|source| BootstrapError::Templates {
        dir: dir.display().to_string(),
        source,
    })
}

fn bind_error(
    name: &'static str,
    server_config: &ServerConfig,
    port: u16,
) -> impl FnOnce(io::Error) -> BootstrapError {
    let address = format!("{}:{port}", server_config.address);
    move |source| BootstrapError::Bind {
        server: name,
        address,
        source,
    }
}

/// Binds the JSON API on `api_port` with the registered routes.
pub fn api_server(server_config: &ServerConfig, routes: ApiRoutes) -> BootstrapResult<BoundServer> {
    let server = HttpServer::new(move || {
        let routes = routes.clone();
        App::new()
            .wrap(Cors::permissive())
            .wrap(middleware::from_fn(log_request))
            .configure(move |cfg| routes(cfg))
    });
    let server = match server_config.workers {
        Some(workers) => server.workers(workers),
        None => server,
    };

    let port = server_config.api_port;
    let server = server
        .bind((server_config.address.as_str(), port))
        .map_err(bind_error("API", server_config, port))?;
    let addrs = server.addrs();
    Ok(BoundServer {
        server: server.run(),
        addrs,
    })
}

/// Binds a console server on `http_port` in the given mode.
pub fn console_server(
    server_config: &ServerConfig,
    state: ConsoleState,
) -> BootstrapResult<BoundServer> {
    let name = match state.mode {
        ConsoleMode::Primary => "console",
        ConsoleMode::Fallback => "fallback console",
    };
    let state = web::Data::new(state);
    let server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(console::configure)
    });
    let server = match server_config.workers {
        Some(workers) => server.workers(workers),
        None => server,
    };

    let port = server_config.http_port;
    let server = server
        .bind((server_config.address.as_str(), port))
        .map_err(bind_error(name, server_config, port))?;
    let addrs = server.addrs();
    Ok(BoundServer {
        server: server.run(),
        addrs,
    })
}
