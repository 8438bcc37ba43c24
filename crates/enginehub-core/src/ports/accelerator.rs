//! Accelerator probe port.
//!
//! vLLM picks its device at launch time. The probe itself runs commands,
//! so the trait lives here and the implementation lives in the runtime.

use serde::{Deserialize, Serialize};
use std::fmt;

/// General-purpose accelerator available to vLLM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accelerator {
    /// NVIDIA GPU with a working driver.
    Cuda,
    /// AMD GPU with ROCm.
    Rocm,
    /// No usable GPU; vLLM runs on the CPU backend.
    Cpu,
}

impl Accelerator {
    #[must_use]
    pub const fn is_gpu(self) -> bool {
        !matches!(self, Self::Cpu)
    }
}

impl fmt::Display for Accelerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cuda => "cuda",
            Self::Rocm => "rocm",
            Self::Cpu => "cpu",
        })
    }
}

/// Port for detecting the accelerator vLLM should use.
///
/// Implementations may block (they shell out to vendor tools); callers on
/// an async runtime should run them on a blocking thread.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
pub trait AcceleratorProbe: Send + Sync {
    fn detect(&self) -> Accelerator;
}
