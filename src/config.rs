//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servidor con soporte para argumentos CLI y variables
//! de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./pool_http_server --port 8080 \
//!   --document-root ./www \
//!   --workers 5 \
//!   --queue-capacity 10
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 DOCUMENT_ROOT=/srv/www RUST_LOG=debug ./pool_http_server
//! ```

use crate::error::ConfigError;
use crate::jobs::channel::DEFAULT_CAPACITY;
use crate::workers::DEFAULT_POOL_SIZE;
use clap::Parser;
use serde::Serialize;

/// Configuración del servidor HTTP
#[derive(Debug, Clone, Parser, Serialize)]
#[command(name = "pool_http_server")]
#[command(about = "Servidor HTTP concurrente con canal acotado y pool fijo de workers")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor (1-65535)
    #[arg(short, long, default_value = "8080", env = "HTTP_PORT", allow_negative_numbers = true)]
    pub port: i64,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    /// Directorio desde el que se sirven los archivos
    #[arg(long = "document-root", default_value = "./www", env = "DOCUMENT_ROOT")]
    pub document_root: String,

    /// Documento enviado con los 404, relativo al document root
    #[arg(long = "not-found-page", default_value = "404.html", env = "NOT_FOUND_PAGE")]
    pub not_found_page: String,

    // === Workers y canal ===

    /// Número de workers del pool
    #[arg(short, long, default_value_t = DEFAULT_POOL_SIZE, env = "WORKERS")]
    pub workers: usize,

    /// Capacidad máxima del canal de requests
    #[arg(long = "queue-capacity", default_value_t = DEFAULT_CAPACITY, env = "QUEUE_CAPACITY")]
    pub queue_capacity: usize,

    // === Logging ===

    /// Filtro de logs (sintaxis de RUST_LOG, ej: "info" o "pool_http_server=debug")
    #[arg(long = "log", default_value = "info", env = "RUST_LOG")]
    pub log_filter: String,
}

impl Config {
    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use pool_http_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Valida la configuración antes de abrir cualquier socket
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=i64::from(u16::MAX)).contains(&self.port) {
            return Err(ConfigError::InvalidPort(self.port));
        }

        self.validate_pipeline()
    }

    /// Valida workers y canal; el puerto lo valida `validate`
    pub fn validate_pipeline(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidPoolSize(self.workers));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::InvalidCapacity(self.queue_capacity));
        }

        Ok(())
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            document_root: "./www".to_string(),
            not_found_page: "404.html".to_string(),
            workers: DEFAULT_POOL_SIZE,
            queue_capacity: DEFAULT_CAPACITY,
            log_filter: "info".to_string(),
        }
    }
}
