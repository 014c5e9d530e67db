//! Background Tasks Module
//!
//! Detached work that runs alongside request handling.
//!
//! # Tasks
//! - Prefetch passes: tracked so shutdown can wait for or abort them
//! - Expiry sweep: drops entries older than the cache expiry at an interval

mod background;
mod sweep;

pub use background::BackgroundTasks;
pub use sweep::spawn_expiry_sweep;
