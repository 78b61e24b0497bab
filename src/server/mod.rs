//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Este módulo implementa el acceptor TCP que:
//! 1. Escucha en un puerto
//! 2. Acepta conexiones entrantes
//! 3. Las encola como jobs en el canal acotado
//! 4. Se detiene ordenadamente con `Server::shutdown`

pub mod tcp;

pub use tcp::Server;
