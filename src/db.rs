//! Database connection helpers.
//!
//! The panel makes exactly one connection attempt at startup. A successful
//! attempt yields a shared Diesel connection pool handed to the API route
//! handlers; a failed attempt is reported to the bootstrap orchestrator, which
//! decides how to degrade.

use std::time::Duration;

use diesel::Connection;
use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PoolError, PooledConnection};
use diesel::result::ConnectionError as DieselConnectionError;
use diesel::sqlite::SqliteConnection;
use log::error;
use thiserror::Error;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Invalid database address: {0}")]
    InvalidAddress(String),

    #[error("Could not connect to database: {0}")]
    Unreachable(String),
}

impl From<DieselConnectionError> for ConnectionError {
    fn from(err: DieselConnectionError) -> Self {
        match err {
            DieselConnectionError::InvalidConnectionUrl(url) => {
                ConnectionError::InvalidAddress(url)
            }
            DieselConnectionError::InvalidCString(_) => {
                ConnectionError::InvalidAddress("address contains a NUL byte".to_string())
            }
            other => ConnectionError::Unreachable(other.to_string()),
        }
    }
}

#[derive(Debug)]
/// Options that are applied each time a connection is acquired from the pool.
pub struct ConnectionOptions {
    /// Enable Write Ahead Logging mode for SQLite.
    pub enable_wal: bool,
    /// Enforce foreign key checks for SQLite.
    pub enable_foreign_keys: bool,
    /// Timeout to wait for a locked database.
    pub busy_timeout: Option<Duration>,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            enable_wal: true,
            enable_foreign_keys: true,
            busy_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl ConnectionOptions {
    fn apply(&self, conn: &mut SqliteConnection) -> diesel::QueryResult<()> {
        if self.enable_wal {
            conn.batch_execute("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")?;
        }
        if self.enable_foreign_keys {
            conn.batch_execute("PRAGMA foreign_keys = ON;")?;
        }
        if let Some(d) = self.busy_timeout {
            conn.batch_execute(&format!("PRAGMA busy_timeout = {};", d.as_millis()))?;
        }
        Ok(())
    }
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        self.apply(conn).map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Performs a single connection attempt against `database_url` and, when it
/// succeeds, returns a pool for that database.
///
/// The pool itself is built without eagerly opening connections, so no
/// further attempts are made here.
pub fn establish_connection_pool(database_url: &str) -> Result<DbPool, ConnectionError> {
    let options = ConnectionOptions::default();

    let mut probe = SqliteConnection::establish(database_url)?;
    options
        .apply(&mut probe)
        .map_err(|e| ConnectionError::Unreachable(e.to_string()))?;

    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    Ok(Pool::builder()
        .connection_customizer(Box::new(options))
        .build_unchecked(manager))
}

/// Retrieve a connection from the pool
pub fn get_connection(pool: &DbPool) -> Result<DbConnection, PoolError> {
    match pool.get() {
        Ok(conn) => Ok(conn),
        Err(e) => {
            error!("Failed to get connection from pool: {e}");
            Err(e)
        }
    }
}

/// Source of the live database handle used by the API server.
pub trait DatabaseGateway {
    /// Makes one connection attempt. Implementations must not retry.
    fn connect(&self, database_url: &str) -> Result<DbPool, ConnectionError>;
}

/// Gateway backed by [`establish_connection_pool`].
#[derive(Clone, Copy, Debug, Default)]
pub struct DieselGateway;

impl DatabaseGateway for DieselGateway {
    fn connect(&self, database_url: &str) -> Result<DbPool, ConnectionError> {
        establish_connection_pool(database_url)
    }
}
