//! Bounded worker pool.
//!
//! - [`manager`] - round-robin dispatch, in-flight accounting and shutdown.
//! - [`worker`] - the task loop that runs the engine.
//! - [`request`] - messages exchanged with workers.

pub mod manager;
pub mod request;
pub mod worker;
