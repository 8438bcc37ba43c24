//! Domain types shared by the runtime and its callers.
//!
//! Everything here is pure data: no process handles, no HTTP clients.

mod engine;
mod provider;
mod status;

pub use engine::EngineKind;
pub use provider::{Provider, RequestedModel, detect_provider};
pub use status::{ManagerStatus, ServerPhase, ServerStatus};
