//! # Pool de Workers
//! src/workers/pool.rs
//!
//! Conjunto fijo de threads que drenan el `RequestChannel`. Cada worker
//! repite `take_job()` → `execute()` hasta que el canal se cierra.
//!
//! Un job que falla (o hace panic) se registra y se descarta; el worker
//! sigue con el siguiente.

use crate::error::{ConfigError, PoolError};
use crate::jobs::{BoxedJob, RequestChannel};
use serde::Serialize;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{error, info, info_span, warn};

/// Tamaño del pool por defecto
pub const DEFAULT_POOL_SIZE: usize = 5;

/// Ciclo de vida del pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    NotStarted,
    Running,
    Terminated,
}

impl PoolState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoolState::NotStarted => "not_started",
            PoolState::Running => "running",
            PoolState::Terminated => "terminated",
        }
    }
}

/// Contadores compartidos por los workers
#[derive(Debug, Default)]
struct Counters {
    completed: AtomicU64,
    failed: AtomicU64,
}

/// Foto del estado del pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub pool_size: usize,
    pub state: &'static str,
    pub queued: usize,
    pub completed: u64,
    pub failed: u64,
}

/// Pool fijo de workers sobre un canal compartido
pub struct WorkerThreadPool {
    pool_size: usize,
    channel: Arc<RequestChannel<BoxedJob>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    state: Mutex<PoolState>,
    // Serializa las llamadas a `stop` sin retener `state` durante el join
    stop_lock: Mutex<()>,
    counters: Arc<Counters>,
}

impl WorkerThreadPool {
    /// Crea el pool sin lanzar threads todavía
    ///
    /// # Errores
    ///
    /// `ConfigError::InvalidPoolSize` si `pool_size == 0`
    pub fn new(
        pool_size: usize,
        channel: Arc<RequestChannel<BoxedJob>>,
    ) -> Result<Self, ConfigError> {
        if pool_size == 0 {
            return Err(ConfigError::InvalidPoolSize(pool_size));
        }

        Ok(Self {
            pool_size,
            channel,
            workers: Mutex::new(Vec::with_capacity(pool_size)),
            state: Mutex::new(PoolState::NotStarted),
            stop_lock: Mutex::new(()),
            counters: Arc::new(Counters::default()),
        })
    }

    /// Pool de `DEFAULT_POOL_SIZE` workers
    pub fn with_default_size(channel: Arc<RequestChannel<BoxedJob>>) -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            channel,
            workers: Mutex::new(Vec::with_capacity(DEFAULT_POOL_SIZE)),
            state: Mutex::new(PoolState::NotStarted),
            stop_lock: Mutex::new(()),
            counters: Arc::new(Counters::default()),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_workers(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.workers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lanza `pool_size` workers llamados `thread-1`, `thread-2`, ...
    pub fn start(&self) -> Result<(), PoolError> {
        let mut state = self.lock_state();
        match *state {
            PoolState::Running => return Err(PoolError::AlreadyStarted),
            PoolState::Terminated => return Err(PoolError::Terminated),
            PoolState::NotStarted => {}
        }

        let mut workers = self.lock_workers();
        for index in 0..self.pool_size {
            let name = format!("thread-{}", index + 1);
            let channel = Arc::clone(&self.channel);
            let counters = Arc::clone(&self.counters);

            let spawned = thread::Builder::new()
                .name(name.clone())
                .spawn(move || worker_loop(&name, &channel, &counters));

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    error!(error = %e, "No se pudo lanzar un worker, deteniendo el pool");
                    *state = PoolState::Terminated;
                    self.channel.close();
                    for handle in workers.drain(..) {
                        let _ = handle.join();
                    }
                    return Err(PoolError::Spawn(e));
                }
            }
        }

        *state = PoolState::Running;
        info!(pool_size = self.pool_size, "Pool de workers iniciado");
        Ok(())
    }

    /// Detiene a todos los workers y espera a que terminen
    ///
    /// Cierra el canal: los workers bloqueados en `take_job` despiertan y
    /// salen; los que están ejecutando un job lo terminan primero. Los jobs
    /// que seguían en cola se descartan. Llamadas repetidas no hacen nada.
    pub fn stop(&self) {
        let _stopping = self.stop_lock.lock().unwrap_or_else(PoisonError::into_inner);
        {
            let mut state = self.lock_state();
            match *state {
                PoolState::Terminated => return,
                PoolState::NotStarted => {
                    *state = PoolState::Terminated;
                    self.channel.close();
                    return;
                }
                PoolState::Running => *state = PoolState::Terminated,
            }
        }

        let dropped = self.channel.close();
        if !dropped.is_empty() {
            warn!(count = dropped.len(), "Jobs en cola descartados al detener el pool");
        }
        drop(dropped);

        let handles = std::mem::take(&mut *self.lock_workers());
        for handle in handles {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                error!(worker = %name, "Worker terminó con panic");
            }
        }

        let stats = self.stats();
        info!(
            stats = %serde_json::to_string(&stats).unwrap_or_default(),
            "Pool de workers detenido"
        );
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn state(&self) -> PoolState {
        *self.lock_state()
    }

    pub fn channel(&self) -> &Arc<RequestChannel<BoxedJob>> {
        &self.channel
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            pool_size: self.pool_size,
            state: self.state().as_str(),
            queued: self.channel.len(),
            completed: self.counters.completed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }
}

impl Drop for WorkerThreadPool {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Loop principal del worker
fn worker_loop(name: &str, channel: &RequestChannel<BoxedJob>, counters: &Counters) {
    let span = info_span!("worker", name);
    let _guard = span.enter();

    info!("Worker iniciado");

    while let Some(job) = channel.take_job() {
        match panic::catch_unwind(AssertUnwindSafe(|| job.execute())) {
            Ok(Ok(())) => {
                counters.completed.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(e)) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                error!(error = %e, "Job fallido");
            }
            Err(payload) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                error!(reason = panic_message(&*payload), "Job terminó con panic");
            }
        }
    }

    info!("Worker detenido");
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown"
    }
}
