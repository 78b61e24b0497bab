//! # Canal de Requests
//! src/jobs/channel.rs
//!
//! Cola FIFO acotada y thread-safe que desacopla el acceptor (productor)
//! de los workers (consumidores).
//!
//! - `add_job` bloquea mientras la cola está llena (backpressure)
//! - `take_job` bloquea mientras la cola está vacía
//! - `close` despierta a todos los bloqueados; es la señal de cancelación
//!   que usa el pool para detener a sus workers

use crate::error::{ChannelError, ConfigError};
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Capacidad por defecto del canal
pub const DEFAULT_CAPACITY: usize = 10;

/// Estado protegido por el mutex
struct ChannelState<T> {
    queue: VecDeque<T>,
    closed: bool,
}

/// Cola acotada de jobs pendientes
pub struct RequestChannel<T> {
    state: Mutex<ChannelState<T>>,

    /// Señalada cuando se libera un lugar
    not_full: Condvar,

    /// Señalada cuando llega un job
    not_empty: Condvar,

    capacity: usize,
}

impl<T> RequestChannel<T> {
    /// Crea un canal con capacidad fija
    ///
    /// # Errores
    ///
    /// `ConfigError::InvalidCapacity` si `capacity == 0`
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::InvalidCapacity(capacity));
        }

        Ok(Self {
            state: Mutex::new(ChannelState {
                queue: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
        })
    }

    /// Canal con `DEFAULT_CAPACITY`
    pub fn with_default_capacity() -> Self {
        Self {
            state: Mutex::new(ChannelState {
                queue: VecDeque::with_capacity(DEFAULT_CAPACITY),
                closed: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity: DEFAULT_CAPACITY,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChannelState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Encola un job al final de la cola
    ///
    /// Bloquea mientras la cola está llena. Nunca descarta un job: si el
    /// canal se cerró, el job se devuelve dentro de `ChannelError::Closed`.
    pub fn add_job(&self, job: T) -> Result<(), ChannelError<T>> {
        let mut state = self.lock();

        while state.queue.len() >= self.capacity && !state.closed {
            state = self
                .not_full
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        if state.closed {
            return Err(ChannelError::Closed(job));
        }

        state.queue.push_back(job);
        drop(state);

        self.not_empty.notify_one();
        Ok(())
    }

    /// Desencola el job más antiguo
    ///
    /// Bloquea mientras la cola está vacía. Retorna `None` cuando el canal
    /// fue cerrado, aunque queden jobs en la cola.
    pub fn take_job(&self) -> Option<T> {
        let mut state = self.lock();

        loop {
            if state.closed {
                return None;
            }

            if let Some(job) = state.queue.pop_front() {
                drop(state);
                self.not_full.notify_one();
                return Some(job);
            }

            state = self
                .not_empty
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Intenta desencolar sin bloquear
    pub fn try_take_job(&self) -> Option<T> {
        let mut state = self.lock();
        if state.closed {
            return None;
        }

        let job = state.queue.pop_front();
        drop(state);

        if job.is_some() {
            self.not_full.notify_one();
        }
        job
    }

    /// Cierra el canal y despierta a productores y consumidores bloqueados
    ///
    /// Retorna los jobs que quedaron sin procesar. Llamarlo más de una vez
    /// no tiene efecto.
    pub fn close(&self) -> Vec<T> {
        let mut state = self.lock();
        state.closed = true;
        let pending: Vec<T> = state.queue.drain(..).collect();
        drop(state);

        self.not_empty.notify_all();
        self.not_full.notify_all();
        pending
    }

    /// Cantidad de jobs en cola
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> Default for RequestChannel<T> {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
