#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::net::TcpListener;
use std::path::Path;
use std::sync::Once;

use merlin_panel::models::config::{ConfigExposure, DegradationPolicy, Environment, ServerConfig};
use log::{Level, LevelFilter, Log, Metadata, Record};
use tempfile::TempDir;

/// Scratch panel installation: views, a `merlin-light` theme, a fallback
/// view and a logs directory.
pub struct TestSite {
    pub dir: TempDir,
}

impl TestSite {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();

        write(root, "views/index.html", "home on {{ localIp }} with {{ theme.name }}");
        write(root, "views/admin/users.html", "users page");
        write(root, "views/css/site.css", "body { color: black; }");
        write(
            root,
            "views/themes/merlin-light/theme.json",
            r#"{"name": "merlin-light"}"#,
        );
        write(
            root,
            "views/themes/merlin-dark/theme.json",
            r#"{"name": "merlin-dark"}"#,
        );
        write(root, "fallback/index.html", "database unavailable");

        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Configuration bound to loopback on ephemeral ports with a reachable
    /// database file.
    pub fn config(&self, theme: &str) -> ServerConfig {
        let root = self.path();
        ServerConfig {
            environment: Environment::Development,
            address: "127.0.0.1".to_string(),
            api_port: 0,
            http_port: 0,
            theme: theme.to_string(),
            database_url: root.join("panel.db").display().to_string(),
            expose_config: ConfigExposure::Full,
            on_database_failure: DegradationPolicy::ServeFallback,
            views_dir: root.join("views"),
            fallback_dir: root.join("fallback"),
            logs_dir: root.join("logs"),
            workers: Some(1),
        }
    }

    /// Address of a database that cannot be opened.
    pub fn unreachable_database(&self) -> String {
        self.path()
            .join("missing")
            .join("nested")
            .join("panel.db")
            .display()
            .to_string()
    }
}

pub fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
    fs::write(path, contents).expect("write file");
}

/// A loopback port that was free a moment ago.
pub fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .map(|addr| addr.port())
        .expect("free port")
}

thread_local! {
    static CAPTURED: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
}

/// Records every log entry emitted on the current thread, so tests running
/// in parallel only see their own entries.
struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        CAPTURED.with(|entries| {
            entries
                .borrow_mut()
                .push((record.level(), record.args().to_string()))
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;
static INSTALL: Once = Once::new();

/// Starts capturing log entries on the current thread, discarding any
/// captured earlier.
pub fn capture_logs() {
    INSTALL.call_once(|| {
        log::set_logger(&LOGGER).expect("install capturing logger");
        log::set_max_level(LevelFilter::Trace);
    });
    CAPTURED.with(|entries| entries.borrow_mut().clear());
}

/// Entries captured on the current thread since [`capture_logs`].
pub fn captured_logs() -> Vec<(Level, String)> {
    CAPTURED.with(|entries| entries.borrow().clone())
}
