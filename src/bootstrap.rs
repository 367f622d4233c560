//! Startup orchestration.
//!
//! The orchestrator runs one sequential workflow: resolve the theme, make the
//! single database connection attempt, then bind listeners according to the
//! outcome. With a live database the API is bound first and the primary
//! console only after it; without one the configured [`DegradationPolicy`]
//! either binds the fallback console alone or aborts startup.

use std::io;
use std::net::{IpAddr, SocketAddr};

use actix_web::dev::ServerHandle;
use actix_web::rt::task::JoinHandle;
use log::{debug, error, info};

use crate::db::{DatabaseGateway, DieselGateway};
use crate::dto::render::RenderContext;
use crate::errors::{BootstrapError, BootstrapResult};
use crate::models::config::{DegradationPolicy, ServerConfig};
use crate::net::local_ip;
use crate::routes::api::{CoreRoutes, RouteRegistrar};
use crate::routes::console::{ConsoleMode, ConsoleState};
use crate::server::{BoundServer, api_server, console_server, load_templates};
use crate::theme::{load_manifest, resolve_theme};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootstrapState {
    Init,
    ThemeResolved,
    DbPending,
    DbReady,
    DbFailed,
    ListenersBound,
    DegradedBound,
    Running,
    Aborted,
}

impl BootstrapState {
    pub fn can_transition_to(self, next: BootstrapState) -> bool {
        use BootstrapState::*;
        matches!(
            (self, next),
            (Init, ThemeResolved)
                | (ThemeResolved, DbPending)
                | (DbPending, DbReady)
                | (DbPending, DbFailed)
                | (DbReady, ListenersBound)
                | (DbFailed, DegradedBound)
                | (DbFailed, Aborted)
                | (ListenersBound, Running)
                | (DegradedBound, Running)
        )
    }
}

/// Observable milestones of a startup, in the order they happened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BootstrapStep {
    ThemeResolved(String),
    DatabaseConnected,
    DatabaseFailed(String),
    RoutesRegistered,
    ApiBound(Vec<SocketAddr>),
    ConsoleBound(Vec<SocketAddr>),
    FallbackBound(Vec<SocketAddr>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    /// API and primary console are serving.
    Normal,
    /// Only the fallback console is serving.
    Degraded,
}

struct Progress {
    state: BootstrapState,
    states: Vec<BootstrapState>,
    steps: Vec<BootstrapStep>,
}

impl Progress {
    fn new() -> Self {
        Self {
            state: BootstrapState::Init,
            states: vec![BootstrapState::Init],
            steps: Vec::new(),
        }
    }

    fn advance(&mut self, next: BootstrapState) -> BootstrapResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(BootstrapError::IllegalTransition {
                from: self.state,
                to: next,
            });
        }
        debug!("Bootstrap state {:?} -> {:?}", self.state, next);
        self.state = next;
        self.states.push(next);
        Ok(())
    }

    fn record(&mut self, step: BootstrapStep) {
        self.steps.push(step);
    }
}

/// Servers started by a successful [`Bootstrap::start`].
pub struct Running {
    mode: RunMode,
    theme: String,
    api_addrs: Vec<SocketAddr>,
    console_addrs: Vec<SocketAddr>,
    states: Vec<BootstrapState>,
    steps: Vec<BootstrapStep>,
    handles: Vec<ServerHandle>,
    tasks: Vec<JoinHandle<io::Result<()>>>,
}

impl Running {
    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Effective theme name used by the console.
    pub fn theme(&self) -> &str {
        &self.theme
    }

    /// Addresses of the API listener; empty in degraded mode.
    pub fn api_addrs(&self) -> &[SocketAddr] {
        &self.api_addrs
    }

    /// Addresses of the primary or fallback console listener.
    pub fn console_addrs(&self) -> &[SocketAddr] {
        &self.console_addrs
    }

    pub fn states(&self) -> &[BootstrapState] {
        &self.states
    }

    pub fn steps(&self) -> &[BootstrapStep] {
        &self.steps
    }

    /// Waits until every started server has shut down.
    pub async fn wait(self) -> io::Result<()> {
        for task in self.tasks {
            task.await.map_err(io::Error::other)??;
        }
        Ok(())
    }

    /// Gracefully stops every started server.
    pub async fn stop(self) -> io::Result<()> {
        for handle in &self.handles {
            handle.stop(true).await;
        }
        self.wait().await
    }
}

/// Startup orchestrator parameterized by its database gateway and API route
/// registrar.
pub struct Bootstrap<G, R> {
    server_config: ServerConfig,
    gateway: G,
    registrar: R,
    local_ip: IpAddr,
}

impl Bootstrap<DieselGateway, CoreRoutes> {
    pub fn new(server_config: ServerConfig) -> Self {
        Self::with_collaborators(server_config, DieselGateway, CoreRoutes)
    }
}

impl<G, R> Bootstrap<G, R>
where
    G: DatabaseGateway,
    R: RouteRegistrar,
{
    pub fn with_collaborators(server_config: ServerConfig, gateway: G, registrar: R) -> Self {
        Self {
            server_config,
            gateway,
            registrar,
            local_ip: local_ip(),
        }
    }

    /// Runs the startup workflow and spawns the resulting servers on the
    /// current actix runtime.
    pub fn start(self) -> BootstrapResult<Running> {
        let server_config = &self.server_config;
        let mut progress = Progress::new();

        let resolution = resolve_theme(&server_config.views_dir, &server_config.theme);
        let theme = resolution.effective().to_string();
        let manifest = load_manifest(&server_config.views_dir, &theme);
        let context = RenderContext::new(server_config, manifest, self.local_ip).to_tera();
        progress.record(BootstrapStep::ThemeResolved(theme.clone()));
        progress.advance(BootstrapState::ThemeResolved)?;

        progress.advance(BootstrapState::DbPending)?;
        let connected = self.gateway.connect(&server_config.database_url);
        let (mode, api_addrs, console_addrs, bound) = match connected {
            Ok(pool) => {
                progress.record(BootstrapStep::DatabaseConnected);
                progress.advance(BootstrapState::DbReady)?;

                let tera = load_templates(&server_config.views_dir)?;
                let routes = self.registrar.register(pool);
                progress.record(BootstrapStep::RoutesRegistered);

                let api = api_server(server_config, routes)?;
                info!("API on http://{}", self.display_addr(&api));
                progress.record(BootstrapStep::ApiBound(api.addrs.clone()));

                let state = ConsoleState::new(
                    ConsoleMode::Primary,
                    tera,
                    context,
                    server_config.views_dir.clone(),
                );
                let console = console_server(server_config, state)?;
                info!("Control panel on http://{}", self.display_addr(&console));
                progress.record(BootstrapStep::ConsoleBound(console.addrs.clone()));
                progress.advance(BootstrapState::ListenersBound)?;

                let api_addrs = api.addrs.clone();
                let console_addrs = console.addrs.clone();
                (RunMode::Normal, api_addrs, console_addrs, vec![api, console])
            }
            Err(err) => {
                error!("{err}");
                progress.record(BootstrapStep::DatabaseFailed(err.to_string()));
                progress.advance(BootstrapState::DbFailed)?;

                if server_config.on_database_failure == DegradationPolicy::Abort {
                    progress.advance(BootstrapState::Aborted)?;
                    error!("Aborting startup: database unavailable");
                    return Err(BootstrapError::DatabaseUnavailable(err));
                }

                let tera = load_templates(&server_config.fallback_dir)?;
                let state = ConsoleState::new(
                    ConsoleMode::Fallback,
                    tera,
                    context,
                    server_config.views_dir.clone(),
                );
                let fallback = console_server(server_config, state)?;
                info!(
                    "Database unavailable, fallback console on http://{}",
                    self.display_addr(&fallback)
                );
                progress.record(BootstrapStep::FallbackBound(fallback.addrs.clone()));
                progress.advance(BootstrapState::DegradedBound)?;

                let console_addrs = fallback.addrs.clone();
                (RunMode::Degraded, Vec::new(), console_addrs, vec![fallback])
            }
        };

        progress.advance(BootstrapState::Running)?;

        let mut handles = Vec::with_capacity(bound.len());
        let mut tasks = Vec::with_capacity(bound.len());
        for BoundServer { server, .. } in bound {
            handles.push(server.handle());
            tasks.push(actix_web::rt::spawn(server));
        }

        Ok(Running {
            mode,
            theme,
            api_addrs,
            console_addrs,
            states: progress.states,
            steps: progress.steps,
            handles,
            tasks,
        })
    }

    fn display_addr(&self, bound: &BoundServer) -> String {
        match bound.addrs.first() {
            Some(addr) => format!("{}:{}", self.local_ip, addr.port()),
            None => self.local_ip.to_string(),
        }
    }
}
