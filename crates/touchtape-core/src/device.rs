//! The capability contract a touch device provides to the core.
//!
//! The state machine never opens or polls a device itself; it consumes a
//! handle that can answer axis capability queries and accept injected
//! events. The real implementation (evdev-backed) lives in the CLI crate;
//! tests use an in-memory fake.

use thiserror::Error;

/// Absolute-axis state as reported by the device driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisInfo {
    pub value: i32,
    pub minimum: i32,
    pub maximum: i32,
}

/// A failed capability query or injection.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("axis 0x{axis:02x} is not reported by the device")]
    UnsupportedAxis { axis: u16 },
    #[error("device request failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Capabilities the protocol state machine needs from a touch device.
pub trait TouchDevice {
    /// Whether the device reports the given absolute axis at all.
    fn supports_axis(&self, axis: u16) -> bool;

    /// Current value and range of an absolute axis.
    fn axis_info(&self, axis: u16) -> Result<AxisInfo, DeviceError>;

    /// Current value of an absolute axis.
    fn axis_value(&self, axis: u16) -> Result<i32, DeviceError> {
        Ok(self.axis_info(axis)?.value)
    }

    /// Write one event into the device's input stream.
    fn inject(&mut self, kind: u16, code: u16, value: i32) -> Result<(), DeviceError>;
}
