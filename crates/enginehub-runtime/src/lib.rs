#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unsafe_code)]

mod controller;
pub mod engines;
mod health;
pub mod lifecycle;
pub mod manager;
mod poll;
pub mod process;
pub mod system;

// Re-export the generic controller and its configuration
pub use controller::{ControllerConfig, DEFAULT_KILL_CONFIRM, DEFAULT_STOP_GRACE, ServerController};

// Re-export engine adapters
pub use engines::{EngineBackend, MlxBackend, MlxController, VllmBackend, VllmController};

// Re-export health utilities for direct use if needed
pub use health::{HEALTH_CHECK_TIMEOUT, check_models_endpoint, is_ready, models_url};

// Re-export the orchestrator
pub use lifecycle::{run_until_shutdown, shutdown_signal};
pub use manager::{ModelServerManager, Route, route};

pub use poll::{PollStep, poll_until};

// Re-export system probe implementation
pub use system::DefaultAcceleratorProbe;
