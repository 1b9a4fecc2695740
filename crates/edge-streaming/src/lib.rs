//! Shell-first HTML streaming.
//!
//! - `Shell` / `HeadContent` - Document frame rendered before any section
//! - `StreamingSink` - Enforces that the shell is flushed before sections

mod shell;
mod sink;

pub use shell::*;
pub use sink::*;
