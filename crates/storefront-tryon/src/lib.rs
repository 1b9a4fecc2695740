//! Virtual try-on backed by a hosted inference queue.
//!
//! A shopper uploads a photo, which is encoded as a data URL and submitted
//! together with a garment image. The queue is polled until the job completes
//! and the first output image becomes the result.
//!
//! - `TryOnSession` - Popup state machine with an abortable in-flight job
//! - `QueueClient` - Submit, poll, fetch and cancel queue jobs
//! - `Pause` - Wait between status polls

mod config;
mod encode;
mod error;
mod input;
mod pause;
mod queue;
mod session;

pub use config::*;
pub use encode::*;
pub use error::*;
pub use input::*;
pub use pause::*;
pub use queue::*;
pub use session::*;
