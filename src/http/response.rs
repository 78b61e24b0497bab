//! # Construcción de Respuestas HTTP
//!
//! Este módulo arma la respuesta completa (header + body) y la serializa
//! a bytes antes de escribir nada en el socket.
//!
//! ## Formato
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Server: HTTP server/0.1\r\n
//! Content-Type: text/html; charset=UTF-8\r\n
//! Connection: Closed\r\n
//! Content-Length: 13\r\n
//! \r\n
//! <html>...</html>
//! ```
//!
//! Los headers van siempre en ese orden y `Content-Length` se calcula con
//! la longitud en bytes del body, no en caracteres.

use super::StatusCode;
use std::io::{self, Write};

pub const HTTP_VERSION: &str = "HTTP/1.1";
pub const SERVER_NAME: &str = "HTTP server/0.1";
pub const DEFAULT_CHARSET: &str = "UTF-8";
pub const CONNECTION_CLOSED: &str = "Closed";

const CRLF: &str = "\r\n";

/// Genera el bloque de headers completo, incluida la línea en blanco final
///
/// # Ejemplo
/// ```
/// use pool_http_server::http::{response, StatusCode};
///
/// let header = response::build_header(StatusCode::Ok, "UTF-8", 5);
/// assert!(header.starts_with("HTTP/1.1 200 OK\r\n"));
/// assert!(header.ends_with("Content-Length: 5\r\n\r\n"));
/// ```
pub fn build_header(status: StatusCode, charset: &str, body_byte_length: usize) -> String {
    let mut header = String::with_capacity(160);

    header.push_str(&format!("{} {}{}", HTTP_VERSION, status, CRLF));
    for (name, value) in header_fields(charset, body_byte_length) {
        header.push_str(&format!("{}: {}{}", name, value, CRLF));
    }
    header.push_str(CRLF);

    header
}

fn header_fields(charset: &str, body_byte_length: usize) -> Vec<(String, String)> {
    vec![
        ("Server".to_string(), SERVER_NAME.to_string()),
        (
            "Content-Type".to_string(),
            format!("text/html; charset={}", charset),
        ),
        ("Connection".to_string(), CONNECTION_CLOSED.to_string()),
        ("Content-Length".to_string(), body_byte_length.to_string()),
    ]
}

/// Respuesta HTTP lista para enviar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    status: StatusCode,

    /// Headers en orden de emisión
    headers: Vec<(String, String)>,

    body: Vec<u8>,
}

impl HttpResponse {
    /// Crea una respuesta HTML con el charset por defecto
    pub fn new(status: StatusCode, body: Vec<u8>) -> Self {
        Self::with_charset(status, DEFAULT_CHARSET, body)
    }

    pub fn with_charset(status: StatusCode, charset: &str, body: Vec<u8>) -> Self {
        Self {
            status,
            headers: header_fields(charset, body.len()),
            body,
        }
    }

    /// Serializa status line, headers, línea en blanco y body
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(160 + self.body.len());

        result.extend_from_slice(format!("{} {}{}", HTTP_VERSION, self.status, CRLF).as_bytes());
        for (name, value) in &self.headers {
            result.extend_from_slice(format!("{}: {}{}", name, value, CRLF).as_bytes());
        }
        result.extend_from_slice(CRLF.as_bytes());
        result.extend_from_slice(&self.body);

        result
    }

    /// Escribe la respuesta completa y hace flush
    ///
    /// Todo se serializa antes de tocar el writer, así que nunca se envía
    /// un bloque de headers a medias por un error de formato.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let bytes = self.to_bytes();
        writer.write_all(&bytes)?;
        writer.flush()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Busca un header por nombre exacto
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}
