//! # Pool HTTP Server - Entry Point
//! src/main.rs
//!
//! Punto de entrada del servidor: parsea la configuración, inicializa el
//! logging y corre el acceptor hasta que el proceso termine.

use clap::Parser;
use pool_http_server::config::Config;
use pool_http_server::server::Server;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .with_thread_names(true)
        .with_target(false)
        .init();

    info!("Pool HTTP Server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        config = %serde_json::to_string(&config).unwrap_or_default(),
        "Configuración cargada"
    );

    let server = match Server::bind(&config) {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "No se pudo iniciar el servidor");
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        error!(error = %e, "Error fatal");
        std::process::exit(1);
    }
}
