//! # Sistema de Jobs
//!
//! - `channel`: cola FIFO acotada entre el acceptor y los workers
//! - `job`: el trabajo asociado a cada conexión aceptada

pub mod channel;
pub mod job;

pub use channel::RequestChannel;
pub use job::{Connection, Executable, HttpJob, JobState};

/// Job tal como viaja por el canal
pub type BoxedJob = Box<dyn Executable>;
