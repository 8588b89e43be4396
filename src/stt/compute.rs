//! Capability-driven compute selection.
//!
//! Picks the device and arithmetic precision for inference as a pure function
//! of a capability descriptor, so the policy is testable without hardware.

use std::fmt;

/// What the host offers for inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCapabilities {
    /// A GPU backend was compiled in and is assumed usable.
    pub accelerator: bool,
}

impl DeviceCapabilities {
    /// Detect capabilities from the compiled feature flags.
    pub fn detect() -> Self {
        Self {
            accelerator: crate::defaults::gpu_backend() != "CPU",
        }
    }
}

/// Where inference runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    Accelerator,
    Cpu,
}

/// Arithmetic precision for inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precision {
    Float16,
    Int8,
}

/// Selected device plus precision pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Compute {
    pub device: Device,
    pub precision: Precision,
}

impl fmt::Display for Compute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let device = match self.device {
            Device::Accelerator => "accelerator",
            Device::Cpu => "cpu",
        };
        let precision = match self.precision {
            Precision::Float16 => "float16",
            Precision::Int8 => "int8",
        };
        write!(f, "{} ({})", device, precision)
    }
}

/// Map capabilities to a compute configuration.
///
/// An accelerator gets higher-precision arithmetic; the CPU fallback uses
/// int8, which is the recommended trade-off for quantized CPU inference.
pub fn select_compute(caps: &DeviceCapabilities) -> Compute {
    if caps.accelerator {
        Compute {
            device: Device::Accelerator,
            precision: Precision::Float16,
        }
    } else {
        Compute {
            device: Device::Cpu,
            precision: Precision::Int8,
        }
    }
}
