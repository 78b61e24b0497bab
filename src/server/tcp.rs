//! # Acceptor TCP
//! src/server/tcp.rs
//!
//! Un único thread acepta conexiones y las encola como `HttpJob` en el
//! canal acotado. Los workers del pool las procesan.
//!
//! ```text
//! accept() → HttpJob → RequestChannel → worker-N → respuesta + cierre
//! ```
//!
//! Cuando el canal está lleno, `add_job` bloquea al acceptor: el backlog
//! queda en el kernel y no en memoria.

use crate::config::Config;
use crate::error::{ChannelError, ServerError};
use crate::jobs::{BoxedJob, HttpJob, RequestChannel};
use crate::resolver::ResponseResolver;
use crate::workers::{PoolStats, WorkerThreadPool};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Servidor HTTP con canal acotado y pool fijo de workers
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    channel: Arc<RequestChannel<BoxedJob>>,
    resolver: Arc<ResponseResolver>,
    pool: WorkerThreadPool,
    stopping: AtomicBool,
}

impl Server {
    /// Valida la configuración y abre el socket en `config.address()`
    pub fn bind(config: &Config) -> Result<Self, ServerError> {
        config.validate()?;

        let address = config.address();
        let listener = TcpListener::bind(&address).map_err(|source| ServerError::Bind {
            address: address.clone(),
            source,
        })?;

        Self::from_listener(listener, config)
    }

    /// Arma el servidor sobre un listener ya abierto
    ///
    /// El puerto de `config` se ignora; manda el del listener.
    pub fn from_listener(listener: TcpListener, config: &Config) -> Result<Self, ServerError> {
        config.validate_pipeline()?;

        let local_addr = listener.local_addr()?;
        let channel = Arc::new(RequestChannel::new(config.queue_capacity)?);
        let resolver = Arc::new(ResponseResolver::from_document_root(
            &config.document_root,
            &config.not_found_page,
        ));
        let pool = WorkerThreadPool::new(config.workers, Arc::clone(&channel))?;

        Ok(Self {
            listener,
            local_addr,
            channel,
            resolver,
            pool,
            stopping: AtomicBool::new(false),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn pool(&self) -> &WorkerThreadPool {
        &self.pool
    }

    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    /// Lanza el pool y acepta conexiones hasta que se llame a `shutdown`
    pub fn run(&self) -> Result<(), ServerError> {
        if self.is_stopping() {
            return Ok(());
        }

        self.pool.start()?;
        info!(
            address = %self.local_addr,
            workers = self.pool.pool_size(),
            queue_capacity = self.channel.capacity(),
            "Servidor escuchando"
        );

        for stream in self.listener.incoming() {
            if self.is_stopping() {
                break;
            }

            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(error = %e, "Error al aceptar conexión");
                    continue;
                }
            };

            if let Err(ChannelError::Closed(_)) = self.dispatch(stream) {
                debug!("Canal cerrado, acceptor terminando");
                break;
            }
        }

        info!("Acceptor detenido");
        Ok(())
    }

    /// Encola la conexión; bloquea mientras el canal esté lleno
    fn dispatch(&self, stream: TcpStream) -> Result<(), ChannelError<BoxedJob>> {
        let job = HttpJob::new(stream, Arc::clone(&self.resolver));
        debug!(peer = %job.peer(), queued = self.channel.len(), "Conexión aceptada");

        self.channel.add_job(Box::new(job))
    }

    /// Detiene el pool y despierta al acceptor para que `run` retorne
    ///
    /// Los jobs en curso terminan; los encolados se descartan.
    pub fn shutdown(&self) {
        if self.stopping.swap(true, Ordering::SeqCst) {
            return;
        }

        info!("Deteniendo servidor");
        self.pool.stop();

        // accept() no tiene timeout: una conexión propia lo desbloquea
        if let Err(e) = TcpStream::connect(self.local_addr) {
            debug!(error = %e, "No se pudo despertar al acceptor");
        }
    }
}
