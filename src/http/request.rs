//! # Parsing de Requests HTTP
//! src/http/request.rs
//!
//! Parser línea por línea del bloque de headers de un request.
//!
//! ## Formato
//!
//! ```text
//! GET /search?q=cats&limit=10 HTTP/1.1\r\n
//! Host: localhost:8080\r\n
//! User-Agent: curl/8.0\r\n
//! \r\n
//! ```
//!
//! ## Reglas
//!
//! 1. **Request Line**: sólo la primera línea, y sólo si su primer token es
//!    `GET` o `POST` (sin importar mayúsculas). Si no lo es, el path queda
//!    vacío y todas las líneas se tratan como headers. El target se separa
//!    en path y query en el primer `?`.
//! 2. **Query**: pares separados por `&`, cada uno dividido en el primer `=`.
//!    Los pares sin `=` se ignoran. Claves y valores se recortan.
//! 3. **Headers**: `Name: Value`, divididos en el primer `:`. El nombre se
//!    guarda en minúsculas. Las líneas sin `:` se descartan.
//! 4. **Fin**: una línea vacía (o sólo espacios), el fin del stream, o una
//!    línea o bloque que supere `MAX_LINE_LENGTH` / `MAX_HEADER_BYTES`.
//!
//! Nunca se lee el body. Un request malformado no es un error: el parser
//! se queda con lo que haya podido extraer.

use serde_json::Value;
use std::collections::HashMap;
use std::io::{self, BufRead, Read};
use tracing::warn;

const HEADER_DELIMITER: char = ':';

/// Largo máximo de una línea del request, en bytes
pub const MAX_LINE_LENGTH: usize = 8 * 1024;

/// Tamaño máximo del bloque de headers completo, en bytes
pub const MAX_HEADER_BYTES: usize = 64 * 1024;

/// Métodos HTTP aceptados en la request line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Obtener un recurso
    GET,

    /// POST - Aceptado en la request line; el body no se lee
    POST,
}

impl Method {
    /// Reconoce el método sin importar mayúsculas
    pub fn parse(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("GET") {
            Some(Method::GET)
        } else if token.eq_ignore_ascii_case("POST") {
            Some(Method::POST)
        } else {
            None
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request HTTP ya parseado
///
/// Se construye una vez por job y no se comparte entre workers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpRequest {
    /// `None` si nunca llegó una request line válida
    method: Option<Method>,

    /// Path sin query string (ej: "/search")
    path: String,

    /// Versión tal como la envió el cliente (ej: "HTTP/1.1")
    version: String,

    /// Query parameters; la última ocurrencia gana
    query_params: HashMap<String, String>,

    /// Headers con nombre en minúsculas; la última ocurrencia gana
    headers: HashMap<String, String>,

    /// Anotaciones libres para etapas posteriores
    attributes: HashMap<String, Value>,
}

impl HttpRequest {
    /// Lee y parsea el bloque de headers desde un stream
    ///
    /// Se detiene en la primera línea en blanco o en EOF. Una línea de más
    /// de `MAX_LINE_LENGTH` bytes, o un bloque de más de `MAX_HEADER_BYTES`,
    /// se trata como EOF. Sólo retorna error si falla la lectura del stream.
    pub fn read_from<R: BufRead>(reader: &mut R) -> io::Result<Self> {
        let mut parser = HttpRequestParser::new();
        let mut buffer = Vec::new();
        let mut total = 0;

        loop {
            buffer.clear();
            let read = reader
                .by_ref()
                .take(MAX_LINE_LENGTH as u64)
                .read_until(b'\n', &mut buffer)?;
            if read == 0 {
                // EOF: el cliente cerró antes de la línea en blanco
                break;
            }

            if read == MAX_LINE_LENGTH && !buffer.ends_with(b"\n") {
                warn!(limit = MAX_LINE_LENGTH, "Línea demasiado larga, fin del request");
                break;
            }

            total += read;
            if total > MAX_HEADER_BYTES {
                warn!(limit = MAX_HEADER_BYTES, "Bloque de headers demasiado grande, fin del request");
                break;
            }

            let line = String::from_utf8_lossy(&buffer);
            if parser.feed_line(strip_line_ending(&line)) == Feed::EndOfHeaders {
                break;
            }
        }

        Ok(parser.finish())
    }

    /// Parsea un request completo desde bytes en memoria
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use pool_http_server::http::HttpRequest;
    ///
    /// let request = HttpRequest::parse(b"GET /search?q=cats HTTP/1.1\r\n\r\n");
    ///
    /// assert_eq!(request.path(), "/search");
    /// assert_eq!(request.query_param("q"), Some("cats"));
    /// ```
    pub fn parse(buffer: &[u8]) -> Self {
        let text = String::from_utf8_lossy(buffer);
        let mut parser = HttpRequestParser::new();

        for line in text.split('\n') {
            if parser.feed_line(strip_line_ending(line)) == Feed::EndOfHeaders {
                break;
            }
        }

        parser.finish()
    }

    // === Métodos públicos para acceder a los campos ===

    pub fn method(&self) -> Option<Method> {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query_params
    }

    /// Obtiene un query parameter específico
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(|s| s.as_str())
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Busca un header sin importar mayúsculas en el nombre
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
    }

    /// Agrega una anotación (ej: worker que atendió el request)
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> &HashMap<String, Value> {
        &self.attributes
    }
}

/// Resultado de alimentar una línea al parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    /// Seguir leyendo líneas
    Continue,

    /// Línea en blanco: terminó el bloque de headers
    EndOfHeaders,
}

/// Parser incremental, una línea a la vez
#[derive(Debug, Default)]
pub struct HttpRequestParser {
    request: HttpRequest,
    seen_first_line: bool,
}

impl HttpRequestParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Procesa una línea sin el `\r\n` final
    pub fn feed_line(&mut self, line: &str) -> Feed {
        if line.trim().is_empty() {
            return Feed::EndOfHeaders;
        }

        // Sólo la primera línea puede ser la request line
        if !self.seen_first_line {
            self.seen_first_line = true;
            if is_request_line(line) {
                self.parse_request_line(line);
                return Feed::Continue;
            }
            warn!(line, "Primera línea no es GET/POST");
        }

        self.parse_header(line);

        Feed::Continue
    }

    /// Entrega el request con todo lo que se haya parseado
    pub fn finish(self) -> HttpRequest {
        self.request
    }

    /// Formato: `METHOD SP TARGET SP VERSION`
    fn parse_request_line(&mut self, line: &str) {
        let parts: Vec<&str> = line.split_whitespace().collect();

        self.request.method = parts.first().and_then(|token| Method::parse(token));

        if parts.len() < 3 {
            warn!(line, "Request line incompleta");
            return;
        }

        let (path, query_params) = parse_path_and_query(parts[1]);
        self.request.path = path;
        self.request.query_params = query_params;
        self.request.version = parts[2].to_string();
    }

    /// Formato: `Name: Value`
    fn parse_header(&mut self, line: &str) {
        match line.split_once(HEADER_DELIMITER) {
            Some((name, value)) => {
                self.request
                    .headers
                    .insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
            }
            None => warn!(line, "Header sin ':' descartado"),
        }
    }
}

/// La línea empieza con el token `GET` o `POST`
fn is_request_line(line: &str) -> bool {
    line.split_whitespace()
        .next()
        .map_or(false, |token| Method::parse(token).is_some())
}

fn strip_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Separa el path de la query en el primer '?'
///
/// Ejemplo: "/search?q=cats&limit=10"
/// Retorna: ("/search", {"q": "cats", "limit": "10"})
fn parse_path_and_query(target: &str) -> (String, HashMap<String, String>) {
    match target.split_once('?') {
        Some((path, query)) => (path.to_string(), parse_query_string(query)),
        None => (target.to_string(), HashMap::new()),
    }
}

/// Parsea una query string en un HashMap
///
/// Los pares sin '=' (ej: "?debug") y las claves vacías se ignoran.
fn parse_query_string(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    for pair in query.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };

        let key = key.trim();
        if key.is_empty() {
            continue;
        }

        params.insert(key.to_string(), value.trim().to_string());
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor, Read};

    // ==================== Request Line ====================

    #[test]
    fn test_parse_simple_get() {
        let request = HttpRequest::parse(b"GET /index.html HTTP/1.1\r\n\r\n");

        assert_eq!(request.method(), Some(Method::GET));
        assert_eq!(request.path(), "/index.html");
        assert_eq!(request.version(), "HTTP/1.1");
        assert!(request.query_params().is_empty());
    }

    #[test]
    fn test_method_case_insensitive() {
        let request = HttpRequest::parse(b"post /form HTTP/1.0\r\n\r\n");

        assert_eq!(request.method(), Some(Method::POST));
        assert_eq!(request.path(), "/form");
    }

    #[test]
    fn test_request_line_must_be_anchored() {
        // "GET" aparece dentro de la línea pero no como primer token
        let request = HttpRequest::parse(b"FETCH /GET HTTP/1.1\r\nX-Method: GET\r\n\r\n");

        assert_eq!(request.method(), None);
        assert_eq!(request.path(), "");
        assert_eq!(request.header("x-method"), Some("GET"));
    }

    #[test]
    fn test_incomplete_request_line() {
        let request = HttpRequest::parse(b"GET\r\n\r\n");

        assert_eq!(request.method(), Some(Method::GET));
        assert_eq!(request.path(), "");
    }

    #[test]
    fn test_request_line_only_on_first_line() {
        let request = HttpRequest::parse(b"X-Junk: 1\r\nGET /index.html HTTP/1.1\r\n\r\n");

        assert_eq!(request.method(), None);
        assert_eq!(request.path(), "");
        assert_eq!(request.header("x-junk"), Some("1"));

        let request = HttpRequest::parse(b"hello\r\nGET /index.html HTTP/1.1\r\n\r\n");
        assert_eq!(request.method(), None);
        assert_eq!(request.path(), "");
    }

    #[test]
    fn test_request_line_with_tabs() {
        let request = HttpRequest::parse(b"GET\t/index.html\tHTTP/1.1\r\n\r\n");

        assert_eq!(request.method(), Some(Method::GET));
        assert_eq!(request.path(), "/index.html");
        assert_eq!(request.version(), "HTTP/1.1");
    }

    #[test]
    fn test_second_request_line_is_header() {
        let request = HttpRequest::parse(b"GET /a HTTP/1.1\r\nGET /b HTTP/1.1\r\n\r\n");

        assert_eq!(request.path(), "/a");
    }

    // ==================== Query ====================

    #[test]
    fn test_parse_query_params() {
        let request = HttpRequest::parse(b"GET /search?q=cats&limit=10 HTTP/1.1\r\n\r\n");

        assert_eq!(request.path(), "/search");
        assert_eq!(request.query_params().len(), 2);
        assert_eq!(request.query_param("q"), Some("cats"));
        assert_eq!(request.query_param("limit"), Some("10"));
    }

    #[test]
    fn test_malformed_query_pair_dropped() {
        let request = HttpRequest::parse(b"GET /x?a&b=2 HTTP/1.1\r\n\r\n");

        assert_eq!(request.path(), "/x");
        assert_eq!(request.query_params().len(), 1);
        assert_eq!(request.query_param("b"), Some("2"));
        assert_eq!(request.query_param("a"), None);
    }

    #[test]
    fn test_query_last_occurrence_wins() {
        let request = HttpRequest::parse(b"GET /x?k=1&k=2 HTTP/1.1\r\n\r\n");
        assert_eq!(request.query_param("k"), Some("2"));
    }

    #[test]
    fn test_query_splits_on_first_equals() {
        let request = HttpRequest::parse(b"GET /x?expr=a=b&=orphan HTTP/1.1\r\n\r\n");

        assert_eq!(request.query_param("expr"), Some("a=b"));
        assert_eq!(request.query_params().len(), 1);
    }

    #[test]
    fn test_query_splits_on_first_question_mark() {
        let request = HttpRequest::parse(b"GET /x?a=1?2 HTTP/1.1\r\n\r\n");

        assert_eq!(request.path(), "/x");
        assert_eq!(request.query_param("a"), Some("1?2"));
    }

    // ==================== Headers ====================

    #[test]
    fn test_headers_case_normalized() {
        let request = HttpRequest::parse(
            b"GET / HTTP/1.1\r\nHost: localhost:8080\r\nUser-Agent:  test \r\n\r\n",
        );

        assert_eq!(request.header("Host"), Some("localhost:8080"));
        assert_eq!(request.header("HOST"), Some("localhost:8080"));
        assert_eq!(request.header("user-agent"), Some("test"));
        assert!(request.headers().contains_key("host"));
    }

    #[test]
    fn test_header_last_occurrence_wins() {
        let request = HttpRequest::parse(b"GET / HTTP/1.1\r\nAccept: a\r\naccept: b\r\n\r\n");
        assert_eq!(request.header("Accept"), Some("b"));
    }

    #[test]
    fn test_header_value_keeps_later_colons() {
        let request = HttpRequest::parse(b"GET / HTTP/1.1\r\nHost: localhost:8080\r\n\r\n");
        assert_eq!(request.header("host"), Some("localhost:8080"));
    }

    #[test]
    fn test_malformed_header_skipped() {
        let request = HttpRequest::parse(
            b"GET / HTTP/1.1\r\nthis is not a header\r\nAccept: text/html\r\n\r\n",
        );

        assert_eq!(request.headers().len(), 1);
        assert_eq!(request.header("accept"), Some("text/html"));
    }

    #[test]
    fn test_parsing_stops_at_blank_line() {
        let request = HttpRequest::parse(
            b"GET / HTTP/1.1\r\nAccept: a\r\n   \r\nX-Body: not-a-header\r\n",
        );

        assert_eq!(request.header("accept"), Some("a"));
        assert_eq!(request.header("x-body"), None);
    }

    // ==================== Streams ====================

    #[test]
    fn test_read_from_stream_stops_at_eof() {
        let mut reader = Cursor::new(b"GET /a?x=1 HTTP/1.0\nHost: h".to_vec());
        let request = HttpRequest::read_from(&mut reader).unwrap();

        assert_eq!(request.path(), "/a");
        assert_eq!(request.query_param("x"), Some("1"));
        assert_eq!(request.header("host"), Some("h"));
    }

    #[test]
    fn test_read_from_leaves_body_unread() {
        let raw = b"POST /form HTTP/1.1\r\nContent-Length: 4\r\n\r\nbody".to_vec();
        let mut reader = BufReader::new(Cursor::new(raw));

        let request = HttpRequest::read_from(&mut reader).unwrap();
        assert_eq!(request.method(), Some(Method::POST));

        let mut rest = String::new();
        reader.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "body");
    }

    #[test]
    fn test_read_from_stops_at_overlong_line() {
        let mut raw = b"GET /a HTTP/1.1\r\nX-Big: ".to_vec();
        raw.extend(std::iter::repeat(b'a').take(MAX_LINE_LENGTH * 2));
        raw.extend_from_slice(b"\r\nHost: h\r\n\r\n");
        let mut reader = Cursor::new(raw);

        let request = HttpRequest::read_from(&mut reader).unwrap();
        assert_eq!(request.path(), "/a");
        assert_eq!(request.header("x-big"), None);
        assert_eq!(request.header("host"), None);
    }

    #[test]
    fn test_read_from_caps_header_block() {
        let mut raw = b"GET /a HTTP/1.1\r\n".to_vec();
        for i in 0..(MAX_HEADER_BYTES / 16) {
            raw.extend_from_slice(format!("X-H{:05}: {:04}\r\n", i, i % 10_000).as_bytes());
        }
        raw.extend_from_slice(b"\r\n");
        let mut reader = Cursor::new(raw);

        let request = HttpRequest::read_from(&mut reader).unwrap();
        assert_eq!(request.path(), "/a");
        assert!(request.headers().len() < MAX_HEADER_BYTES / 16);
    }

    #[test]
    fn test_empty_stream() {
        let mut reader = Cursor::new(Vec::new());
        let request = HttpRequest::read_from(&mut reader).unwrap();

        assert_eq!(request, HttpRequest::default());
    }

    #[test]
    fn test_invalid_utf8_is_tolerated() {
        let request = HttpRequest::parse(b"GET /\xff\xfe HTTP/1.1\r\n\r\n");
        assert_eq!(request.method(), Some(Method::GET));
        assert!(request.path().starts_with('/'));
    }

    // ==================== Atributos ====================

    #[test]
    fn test_attributes() {
        let mut request = HttpRequest::parse(b"GET / HTTP/1.1\r\n\r\n");
        request.set_attribute("worker", "thread-1");
        request.set_attribute("attempt", 1);

        assert_eq!(request.attribute("worker"), Some(&Value::from("thread-1")));
        assert_eq!(request.attribute("attempt"), Some(&Value::from(1)));
        assert_eq!(request.attribute("missing"), None);
        assert_eq!(request.attributes().len(), 2);
    }
}
