//! Host probing.
//!
//! `DefaultAcceleratorProbe` implements `AcceleratorProbe` from
//! enginehub-core by running vendor tools. It blocks, so async callers
//! should run it on a blocking thread.

mod gpu;

use enginehub_core::{Accelerator, AcceleratorProbe};
use tracing::debug;

pub use gpu::{detect_nvidia_hardware, detect_rocm_hardware};

/// Default implementation of `AcceleratorProbe`.
///
/// Checks for NVIDIA first, then ROCm, and reports CPU when neither is
/// found.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAcceleratorProbe;

impl DefaultAcceleratorProbe {
    pub const fn new() -> Self {
        Self
    }
}

impl AcceleratorProbe for DefaultAcceleratorProbe {
    fn detect(&self) -> Accelerator {
        let accelerator = if detect_nvidia_hardware() {
            Accelerator::Cuda
        } else if detect_rocm_hardware() {
            Accelerator::Rocm
        } else {
            Accelerator::Cpu
        };
        debug!(accelerator = %accelerator, "Accelerator probe finished");
        accelerator
    }
}
