//! # Almacén de Documentos
//! src/resolver/store.rs
//!
//! Acceso a los archivos bajo el document root. El resolver sólo conoce
//! el trait, así los tests pueden usar un almacén en memoria.

use crate::error::FileAccessError;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Fuente de documentos indexada por path de request (ej: "/index.html")
pub trait DocumentStore: Send + Sync {
    /// `true` sólo si hay un archivo regular en ese path
    fn exists(&self, path: &str) -> bool;

    /// Lee el contenido completo del documento
    fn read_bytes(&self, path: &str) -> Result<Vec<u8>, FileAccessError>;
}

/// Documentos servidos desde un directorio del sistema de archivos
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Traduce un path de request a un archivo dentro del root
    ///
    /// Rechaza `..` y cualquier componente que pueda salir del root.
    pub fn locate(&self, path: &str) -> Result<PathBuf, FileAccessError> {
        let mut located = self.root.clone();

        for component in Path::new(path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => located.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(FileAccessError::Forbidden(path.to_string()));
                }
            }
        }

        Ok(located)
    }
}

impl DocumentStore for FsDocumentStore {
    fn exists(&self, path: &str) -> bool {
        self.locate(path)
            .map(|file| file.is_file())
            .unwrap_or(false)
    }

    fn read_bytes(&self, path: &str) -> Result<Vec<u8>, FileAccessError> {
        let file = self.locate(path)?;

        fs::read(&file).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                FileAccessError::NotFound(file)
            } else {
                FileAccessError::Io { path: file, source }
            }
        })
    }
}
