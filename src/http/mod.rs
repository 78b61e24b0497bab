//! # Módulo HTTP
//!
//! Subconjunto de HTTP que necesita el servidor: un request por conexión,
//! estilo HTTP/1.0 (`Connection: Closed`).
//!
//! - Parsing de la request line, query parameters y headers
//! - Construcción del bloque de headers de la respuesta
//! - Códigos de estado
//!
//! No hay conexiones persistentes, chunked transfer ni pipelining.

pub mod request;   // Parsing de HTTP requests
pub mod response;  // Construcción de HTTP responses
pub mod status;    // Códigos de estado HTTP

// Re-exportamos los tipos principales para facilitar su uso
pub use request::{HttpRequest, HttpRequestParser, Method};
pub use response::HttpResponse;
pub use status::StatusCode;
