use std::env;
use std::process;

use dotenvy::dotenv;

use merlin_panel::errors::BootstrapError;
use merlin_panel::logging::init_logging;
use merlin_panel::models::config::{PortOverrides, load_server_config};

/// Plain console logging used when the file sink cannot be set up.
fn init_console_logger() {
    let _ = env_logger::try_init_from_env(env_logger::Env::default().default_filter_or("info"));
}

#[actix_web::main]
async fn main() {
    dotenv().ok(); // Load .env file

    // Select config profile (defaults to `local`).
    let app_env = env::var("APP_ENV").unwrap_or_else(|_| "local".into());

    let server_config = match load_server_config("config", &app_env, &PortOverrides::from_env())
    {
        Ok(server_config) => server_config,
        Err(err) => {
            init_console_logger();
            let err = BootstrapError::from(err);
            log::error!("{err}");
            process::exit(err.exit_code());
        }
    };

    if let Err(err) = init_logging(&server_config.logs_dir, server_config.is_development()) {
        init_console_logger();
        let err = BootstrapError::from(err);
        log::error!("{err}");
        process::exit(err.exit_code());
    }

    if let Err(err) = merlin_panel::run(server_config).await {
        log::error!("Startup failed: {err}");
        log::logger().flush();
        process::exit(err.exit_code());
    }
}
