mod config;
mod form;
mod locale;
mod order;
mod query;
mod source;
mod temporal;
mod util;
mod web;

use config::{load as config_load, validate as config_validate};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match config_load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Configuration error: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = config_validate(&config) {
        eprintln!("Configuration error: {err}");
        std::process::exit(1);
    }

    let locale = config.display.locale();

    info!(
        orders_path = %config.source.orders_path,
        locale = %locale,
        default_page_size = config.display.default_page_size,
        port = config.web.port,
        "Effective configuration loaded"
    );

    let running = Arc::new(AtomicBool::new(true));
    let running_signal = Arc::clone(&running);

    if let Err(err) = ctrlc::set_handler(move || {
        info!("Ctrl-C received, shutting down gracefully");
        running_signal.store(false, Ordering::SeqCst);
    }) {
        error!(error = %err, "Failed to install Ctrl-C handler");
        std::process::exit(1);
    }

    let state = web::AppState {
        source: Box::new(source::JsonFileSource::new(&config.source.orders_path)),
        locale,
        default_page_size: config.display.default_page_size,
    };

    info!("orderdesk starting");

    if let Err(err) = web::start(state, config.web.port, running) {
        error!(error = %err, "Web server failed");
        std::process::exit(1);
    }

    info!("orderdesk stopped");
}
