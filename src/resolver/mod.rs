//! # Resolución de Respuestas
//! src/resolver/mod.rs
//!
//! Mapea el path de un request a un documento bajo el document root.
//!
//! ```text
//! path → ¿existe? ─ sí → 200 + bytes del archivo
//!                 └ no → 404 + bytes del documento "not found"
//! ```
//!
//! Si el archivo desaparece entre `exists` y `load_body`, la respuesta
//! cae a 404. Si tampoco se puede leer el documento "not found", el error
//! sube al job, que cierra la conexión sin responder.

pub mod store;

pub use crate::http::response::build_header;
pub use store::{DocumentStore, FsDocumentStore};

use crate::error::FileAccessError;
use crate::http::response::DEFAULT_CHARSET;
use crate::http::{HttpResponse, StatusCode};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Documento servido para paths que terminan en '/'
pub const DIRECTORY_INDEX: &str = "index.html";

/// Documento "not found" por defecto, relativo al root
pub const DEFAULT_NOT_FOUND_PAGE: &str = "/404.html";

/// Resuelve paths de request a respuestas completas
pub struct ResponseResolver {
    store: Box<dyn DocumentStore>,
    not_found_page: String,
    charset: String,
}

impl ResponseResolver {
    pub fn new(store: impl DocumentStore + 'static, not_found_page: &str) -> Self {
        let not_found_page = if not_found_page.starts_with('/') {
            not_found_page.to_string()
        } else {
            format!("/{}", not_found_page)
        };

        Self {
            store: Box::new(store),
            not_found_page,
            charset: DEFAULT_CHARSET.to_string(),
        }
    }

    /// Resolver sobre un directorio del sistema de archivos
    pub fn from_document_root(root: impl Into<PathBuf>, not_found_page: &str) -> Self {
        Self::new(FsDocumentStore::new(root), not_found_page)
    }

    pub fn not_found_page(&self) -> &str {
        &self.not_found_page
    }

    /// `true` si hay un archivo regular para el path
    pub fn exists(&self, path: &str) -> bool {
        self.store.exists(&document_path(path))
    }

    /// Lee el documento completo como bytes
    pub fn load_body(&self, path: &str) -> Result<Vec<u8>, FileAccessError> {
        self.store.read_bytes(&document_path(path))
    }

    /// Construye la respuesta para un path de request
    pub fn resolve(&self, path: &str) -> Result<HttpResponse, FileAccessError> {
        if self.exists(path) {
            match self.load_body(path) {
                Ok(body) => {
                    return Ok(HttpResponse::with_charset(StatusCode::Ok, &self.charset, body));
                }
                Err(e) => warn!(path, error = %e, "Archivo no disponible al leerlo, respondiendo 404"),
            }
        } else {
            debug!(path, "Documento no encontrado");
        }

        self.not_found()
    }

    /// Respuesta 404 con el documento "not found"
    pub fn not_found(&self) -> Result<HttpResponse, FileAccessError> {
        let body = self.store.read_bytes(&self.not_found_page)?;
        Ok(HttpResponse::with_charset(StatusCode::NotFound, &self.charset, body))
    }
}

/// Los paths que terminan en '/' apuntan al índice del directorio
fn document_path(path: &str) -> String {
    if path.ends_with('/') {
        format!("{}{}", path, DIRECTORY_INDEX)
    } else {
        path.to_string()
    }
}
