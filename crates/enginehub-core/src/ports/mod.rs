//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the orchestrator expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No process handles or HTTP client types in any signature
//! - Intent-based methods for engine controllers (start/stop/status)
//! - Mocks are generated with `mockall` under `cfg(test)` or the
//!   `test-utils` feature

pub mod accelerator;
pub mod engine_controller;

use thiserror::Error;

pub use accelerator::{Accelerator, AcceleratorProbe};
pub use engine_controller::{EngineController, EngineError};

#[cfg(any(test, feature = "test-utils"))]
pub use accelerator::MockAcceleratorProbe;
#[cfg(any(test, feature = "test-utils"))]
pub use engine_controller::MockEngineController;

/// Routing failures for `provider:model` identifiers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider prefix is missing or not recognised.
    #[error("Unknown provider in model identifier '{0}'")]
    UnknownProvider(String),

    /// A local provider was named without a model reference (`mlx:`).
    #[error("Model identifier '{0}' has no model reference after the provider")]
    MissingReference(String),
}

/// Core error type for semantic domain errors.
///
/// Adapters map this to their own error types (CLI exit codes, HTTP
/// status codes).
#[derive(Debug, Error)]
pub enum CoreError {
    /// Engine lifecycle failure.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Routing failure.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Settings validation error.
    #[error(transparent)]
    Settings(#[from] crate::settings::SettingsError),

    /// Internal error (unexpected condition).
    #[error("Internal error: {0}")]
    Internal(String),
}
