//! # Errores del Servidor
//! src/error.rs
//!
//! Taxonomía de errores del pipeline:
//!
//! - `ConfigError`: valores inválidos detectados al construir componentes
//! - `ServerError`: fallos fatales de arranque (bind, config, pool)
//! - `PoolError`: transiciones inválidas del ciclo de vida del pool
//! - `ChannelError`: encolar en un canal ya cerrado
//! - `FileAccessError`: lectura de documentos bajo el document root
//! - `JobError`: fallos de I/O durante la vida de una conexión

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Configuración inválida. Siempre se detecta antes de abrir sockets.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid port {0}: must be in 1..=65535")]
    InvalidPort(i64),

    #[error("Invalid pool size {0}: workers must be >= 1")]
    InvalidPoolSize(usize),

    #[error("Invalid queue capacity {0}: capacity must be >= 1")]
    InvalidCapacity(usize),
}

/// Errores fatales del servidor
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("Worker pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errores del ciclo de vida del pool de workers
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Worker pool already started")]
    AlreadyStarted,

    #[error("Worker pool already terminated")]
    Terminated,

    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[source] io::Error),
}

/// El canal fue cerrado; el job se devuelve al llamador.
pub enum ChannelError<T> {
    Closed(T),
}

impl<T> ChannelError<T> {
    /// Recupera el job que no pudo encolarse
    pub fn into_inner(self) -> T {
        match self {
            ChannelError::Closed(job) => job,
        }
    }
}

impl<T> std::fmt::Debug for ChannelError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelError::Closed(_) => f.write_str("Closed(..)"),
        }
    }
}

impl<T> std::fmt::Display for ChannelError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelError::Closed(_) => f.write_str("Request channel is closed"),
        }
    }
}

impl<T> std::error::Error for ChannelError<T> {}

/// Errores al acceder a un documento
#[derive(Error, Debug)]
pub enum FileAccessError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Path escapes document root: {0}")]
    Forbidden(String),

    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errores de un job durante su ejecución
#[derive(Error, Debug)]
pub enum JobError {
    #[error("Failed to read request: {0}")]
    Read(#[source] io::Error),

    #[error("Failed to write response: {0}")]
    Write(#[source] io::Error),

    #[error("Failed to close connection: {0}")]
    Close(#[source] io::Error),

    #[error("Failed to resolve response: {0}")]
    Resolve(#[from] FileAccessError),
}
