//! Listening socket, worker accept loops, and their supervisor.

pub mod listener;
pub mod supervisor;

pub use supervisor::{RestartAction, RestartPolicy, Supervisor};
