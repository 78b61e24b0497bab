//! # Pool HTTP Server
//! src/lib.rs
//!
//! Servidor HTTP concurrente que sirve archivos estáticos desde un
//! document root, usando un canal acotado de requests y un pool fijo de
//! workers.
//!
//! ## Arquitectura
//!
//! El servidor está dividido en módulos especializados:
//! - `config`: Configuración por CLI y variables de entorno
//! - `error`: Errores tipados de cada capa
//! - `http`: Parsing de requests y construcción de responses
//! - `resolver`: Mapeo de paths a documentos (200 / 404)
//! - `jobs`: Canal acotado de requests y el job por conexión
//! - `workers`: Pool fijo de workers que consume el canal
//! - `server`: Acceptor TCP y apagado ordenado
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use pool_http_server::config::Config;
//! use pool_http_server::server::Server;
//!
//! let config = Config::default();
//! let server = Server::bind(&config).expect("Error al iniciar servidor");
//! server.run().expect("Error en el acceptor");
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod jobs;
pub mod resolver;
pub mod server;
pub mod workers;

pub use config::Config;
pub use error::{ChannelError, ConfigError, FileAccessError, JobError, PoolError, ServerError};
pub use server::Server;
