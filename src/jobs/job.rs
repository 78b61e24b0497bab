//! # Job por Conexión
//! src/jobs/job.rs
//!
//! Un `HttpJob` es dueño de una conexión aceptada y la lleva por todo el
//! pipeline:
//!
//! ```text
//! ACCEPTED → PARSED → RESOLVED → WRITTEN → CLOSED
//!     └──────────┴─────────┴─────────┴──→ ERRORED
//! ```
//!
//! La conexión se cierra siempre, haya fallado o no alguna etapa.

use crate::error::JobError;
use crate::http::{HttpRequest, HttpResponse};
use crate::resolver::ResponseResolver;
use std::io::{self, BufReader, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::thread;
use tracing::{debug, trace};

/// Unidad de trabajo que ejecuta un worker del pool
pub trait Executable: Send {
    /// Ejecuta el job una sola vez, consumiéndolo
    fn execute(self: Box<Self>) -> Result<(), JobError>;
}

/// Conexión de un cliente
pub trait Connection: Read + Write + Send {
    /// Dirección del cliente, para logs
    fn peer(&self) -> String;

    /// Cierra ambos sentidos de la conexión
    fn close(&mut self) -> io::Result<()>;
}

impl Connection for TcpStream {
    fn peer(&self) -> String {
        self.peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string())
    }

    fn close(&mut self) -> io::Result<()> {
        match self.shutdown(Shutdown::Both) {
            // El cliente ya cerró su lado
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}

/// Estados de un job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Conexión aceptada, nada leído todavía
    Accepted,

    /// Bloque de headers leído y parseado
    Parsed,

    /// Respuesta construida
    Resolved,

    /// Respuesta enviada
    Written,

    /// Conexión cerrada tras un pipeline exitoso
    Closed,

    /// Alguna etapa falló; la conexión igual se cerró
    Errored,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Accepted => "accepted",
            JobState::Parsed => "parsed",
            JobState::Resolved => "resolved",
            JobState::Written => "written",
            JobState::Closed => "closed",
            JobState::Errored => "errored",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Closed | JobState::Errored)
    }
}

/// Job HTTP: parse → resolve → write → close
pub struct HttpJob<C: Connection = TcpStream> {
    connection: C,
    peer: String,
    resolver: Arc<ResponseResolver>,
    request: Option<HttpRequest>,
    response: Option<HttpResponse>,
    state: JobState,
}

impl<C: Connection> HttpJob<C> {
    pub fn new(connection: C, resolver: Arc<ResponseResolver>) -> Self {
        let peer = connection.peer();

        Self {
            connection,
            peer,
            resolver,
            request: None,
            response: None,
            state: JobState::Accepted,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn request(&self) -> Option<&HttpRequest> {
        self.request.as_ref()
    }

    pub fn response(&self) -> Option<&HttpResponse> {
        self.response.as_ref()
    }

    /// Corre el pipeline completo y cierra la conexión
    ///
    /// Retorna el primer error de cualquier etapa. El cierre ocurre igual.
    pub fn run(&mut self) -> Result<(), JobError> {
        let outcome = self.process();
        let closed = self.connection.close().map_err(JobError::Close);

        match (outcome, closed) {
            (Ok(()), Ok(())) => {
                self.transition(JobState::Closed);
                Ok(())
            }
            (Err(e), closed) => {
                if let Err(close_error) = closed {
                    debug!(peer = %self.peer, error = %close_error, "Cierre fallido tras error");
                }
                self.transition(JobState::Errored);
                Err(e)
            }
            (Ok(()), Err(e)) => {
                self.transition(JobState::Errored);
                Err(e)
            }
        }
    }

    fn process(&mut self) -> Result<(), JobError> {
        self.parse()?;
        self.resolve()?;
        self.write()
    }

    fn transition(&mut self, next: JobState) {
        trace!(peer = %self.peer, from = self.state.as_str(), to = next.as_str(), "Job state");
        self.state = next;
    }

    /// ACCEPTED → PARSED
    fn parse(&mut self) -> Result<(), JobError> {
        let mut request = {
            let mut reader = BufReader::new(&mut self.connection);
            HttpRequest::read_from(&mut reader).map_err(JobError::Read)?
        };

        request.set_attribute("peer", self.peer.clone());
        if let Some(worker) = thread::current().name() {
            request.set_attribute("worker", worker);
        }

        debug!(
            method = request.method().map_or("-", |m| m.as_str()),
            path = request.path(),
            headers = request.headers().len(),
            "Request parseado"
        );

        self.request = Some(request);
        self.transition(JobState::Parsed);
        Ok(())
    }

    /// PARSED → RESOLVED
    fn resolve(&mut self) -> Result<(), JobError> {
        let path = self.request.as_ref().map_or("", |r| r.path());
        let response = self.resolver.resolve(path)?;

        self.response = Some(response);
        self.transition(JobState::Resolved);
        Ok(())
    }

    /// RESOLVED → WRITTEN
    fn write(&mut self) -> Result<(), JobError> {
        if let Some(response) = &self.response {
            response
                .write_to(&mut self.connection)
                .map_err(JobError::Write)?;

            debug!(
                peer = %self.peer,
                status = %response.status(),
                bytes = response.body().len(),
                "Respuesta enviada"
            );
        }

        self.transition(JobState::Written);
        Ok(())
    }
}

impl<C: Connection> Executable for HttpJob<C> {
    fn execute(mut self: Box<Self>) -> Result<(), JobError> {
        self.run()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::StatusCode;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Conexión en memoria que registra lo escrito y si fue cerrada
    struct MockConnection {
        input: Cursor<Vec<u8>>,
        output: Arc<Mutex<Vec<u8>>>,
        closed: Arc<AtomicBool>,
        fail_reads: bool,
        fail_writes: bool,
    }

    impl MockConnection {
        fn new(request: &[u8]) -> Self {
            Self {
                input: Cursor::new(request.to_vec()),
                output: Arc::new(Mutex::new(Vec::new())),
                closed: Arc::new(AtomicBool::new(false)),
                fail_reads: false,
                fail_writes: false,
            }
        }
    }

    impl Read for MockConnection {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.fail_reads {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
            }
            self.input.read(buf)
        }
    }

    impl Write for MockConnection {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail_writes {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"));
            }
            self.output.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Connection for MockConnection {
        fn peer(&self) -> String {
            "mock".to_string()
        }

        fn close(&mut self) -> io::Result<()> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn document_root() -> (TempDir, Arc<ResponseResolver>) {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>hello</h1>").unwrap();
        std::fs::write(dir.path().join("404.html"), "<h1>not found</h1>").unwrap();

        let resolver = Arc::new(ResponseResolver::from_document_root(dir.path(), "404.html"));
        (dir, resolver)
    }

    fn split_response(raw: &[u8]) -> (String, Vec<u8>) {
        let pos = raw
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .expect("header terminator");
        (
            String::from_utf8(raw[..pos + 4].to_vec()).unwrap(),
            raw[pos + 4..].to_vec(),
        )
    }

    // ==================== Pipeline exitoso ====================

    #[test]
    fn test_existing_file_served() {
        let (_dir, resolver) = document_root();
        let connection = MockConnection::new(b"GET /index.html HTTP/1.1\r\nHost: x\r\n\r\n");
        let output = Arc::clone(&connection.output);
        let closed = Arc::clone(&connection.closed);

        let mut job = HttpJob::new(connection, resolver);
        job.run().unwrap();

        assert_eq!(job.state(), JobState::Closed);
        assert!(closed.load(Ordering::SeqCst));
        assert_eq!(job.response().unwrap().status(), StatusCode::Ok);

        let raw = output.lock().unwrap().clone();
        let (header, body) = split_response(&raw);
        assert!(header.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(header.contains("Content-Length: 14\r\n"));
        assert!(header.contains("Connection: Closed\r\n"));
        assert_eq!(body, b"<h1>hello</h1>");
    }

    #[test]
    fn test_missing_file_gets_404() {
        let (_dir, resolver) = document_root();
        let connection = MockConnection::new(b"GET /missing.html HTTP/1.1\r\n\r\n");
        let output = Arc::clone(&connection.output);

        let mut job = HttpJob::new(connection, resolver);
        job.run().unwrap();

        let raw = output.lock().unwrap().clone();
        let (header, body) = split_response(&raw);
        assert!(header.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert_eq!(body, b"<h1>not found</h1>");
    }

    #[test]
    fn test_garbage_request_gets_404() {
        let (_dir, resolver) = document_root();
        let connection = MockConnection::new(b"\x00\x01garbage");
        let output = Arc::clone(&connection.output);

        let mut job = HttpJob::new(connection, resolver);
        job.run().unwrap();

        assert_eq!(job.request().unwrap().path(), "");
        assert!(output.lock().unwrap().starts_with(b"HTTP/1.1 404 Not Found\r\n"));
    }

    #[test]
    fn test_request_annotated_with_peer() {
        let (_dir, resolver) = document_root();
        let mut job = HttpJob::new(MockConnection::new(b"GET / HTTP/1.1\r\n\r\n"), resolver);
        job.run().unwrap();

        let request = job.request().unwrap();
        assert_eq!(request.attribute("peer"), Some(&serde_json::Value::from("mock")));
    }

    // ==================== Errores ====================

    #[test]
    fn test_read_failure_still_closes() {
        let (_dir, resolver) = document_root();
        let mut connection = MockConnection::new(b"");
        connection.fail_reads = true;
        let closed = Arc::clone(&connection.closed);
        let output = Arc::clone(&connection.output);

        let mut job = HttpJob::new(connection, resolver);
        let result = job.run();

        assert!(matches!(result, Err(JobError::Read(_))));
        assert_eq!(job.state(), JobState::Errored);
        assert!(closed.load(Ordering::SeqCst));
        assert!(output.lock().unwrap().is_empty());
    }

    #[test]
    fn test_write_failure_still_closes() {
        let (_dir, resolver) = document_root();
        let mut connection = MockConnection::new(b"GET /index.html HTTP/1.1\r\n\r\n");
        connection.fail_writes = true;
        let closed = Arc::clone(&connection.closed);

        let mut job = HttpJob::new(connection, resolver);
        let result = job.run();

        assert!(matches!(result, Err(JobError::Write(_))));
        assert_eq!(job.state(), JobState::Errored);
        assert!(closed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_missing_not_found_page_closes_without_response() {
        let dir = TempDir::new().unwrap();
        let resolver = Arc::new(ResponseResolver::from_document_root(dir.path(), "404.html"));
        let connection = MockConnection::new(b"GET /nothing HTTP/1.1\r\n\r\n");
        let output = Arc::clone(&connection.output);
        let closed = Arc::clone(&connection.closed);

        let result = Box::new(HttpJob::new(connection, resolver)).execute();

        assert!(matches!(result, Err(JobError::Resolve(_))));
        assert!(closed.load(Ordering::SeqCst));
        assert!(output.lock().unwrap().is_empty());
    }

    #[test]
    fn test_state_names() {
        assert_eq!(JobState::Accepted.as_str(), "accepted");
        assert!(JobState::Closed.is_terminal());
        assert!(JobState::Errored.is_terminal());
        assert!(!JobState::Written.is_terminal());
    }
}
