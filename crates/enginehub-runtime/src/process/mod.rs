//! OS-level process plumbing for engine children.
//!
//! - `spawn` - executable lookup and spawning with the engine's stdio layout
//! - `stderr` - bounded capture of the engine's stderr for diagnostics
//! - `shutdown` - SIGTERM → SIGKILL escalation with bounded waits
//!
//! Nothing here knows about models or providers.

mod shutdown;
mod spawn;
mod stderr;

pub use shutdown::{ShutdownOutcome, shutdown_child};
pub use spawn::{EngineCommand, resolve_binary, spawn_engine};
pub use stderr::{STDERR_TAIL_LINES, StderrTail, spawn_stderr_reader};
