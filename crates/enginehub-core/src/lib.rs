#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unsafe_code)]

pub mod domain;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    EngineKind, ManagerStatus, Provider, RequestedModel, ServerPhase, ServerStatus,
    detect_provider,
};
pub use ports::{
    Accelerator, AcceleratorProbe, CoreError, EngineController, EngineError, ProviderError,
};
pub use settings::{
    DEFAULT_HOST, DEFAULT_MLX_PORT, DEFAULT_VLLM_PORT, EngineSettings, Settings, SettingsError,
    validate_settings,
};

#[cfg(any(test, feature = "test-utils"))]
pub use ports::{MockAcceleratorProbe, MockEngineController};
