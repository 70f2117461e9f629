//! Touchscreen discovery and the evdev-backed device implementation.
//!
//! The evdev handle answers identity and capability queries; raw event
//! records and injections go through a second, non-blocking handle on the
//! same node so the driver can drain events without ever stalling the
//! loop.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use evdev::{AbsoluteAxisCode, Device};
use touchtape_core::device::{AxisInfo, DeviceError, TouchDevice};
use touchtape_core::event::RawEvent;
use tracing::{debug, info};

/// Directory scanned for input device nodes.
const INPUT_DIR: &str = "/dev/input";

/// Find the first device under `/dev/input` that reports a multi-touch
/// position axis.
pub fn detect_touch_device() -> Option<PathBuf> {
    let entries = std::fs::read_dir(INPUT_DIR).ok()?;
    let mut nodes: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.starts_with("event"))
                .unwrap_or(false)
        })
        .collect();
    nodes.sort();

    for path in nodes {
        match Device::open(&path) {
            Ok(dev) => {
                let has_touch_position = dev.supported_absolute_axes().is_some_and(|axes| {
                    axes.contains(AbsoluteAxisCode::ABS_MT_POSITION_X)
                });
                if has_touch_position {
                    return Some(path);
                }
            }
            Err(e) => debug!("skipping {}: {e}", path.display()),
        }
    }
    None
}

/// An opened touchscreen node.
pub struct TouchScreen {
    dev: Device,
    stream: File,
}

impl TouchScreen {
    /// Open a device node for capability queries plus a read-write,
    /// non-blocking event stream. Failure here is fatal for the process;
    /// nothing works without a device.
    pub fn open(path: &Path) -> Result<Self> {
        use std::os::unix::fs::OpenOptionsExt;

        let dev = Device::open(path)
            .with_context(|| format!("could not open device {}", path.display()))?;
        let stream = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)
            .with_context(|| format!("could not open event stream on {}", path.display()))?;

        Ok(Self { dev, stream })
    }

    /// Log driver and device identity. Purely informational; nothing here
    /// is required for operation.
    pub fn log_identity(&self) {
        if let Some(name) = self.dev.name() {
            info!("device name '{name}'");
        }
        let version = self.dev.driver_version();
        let id = self.dev.input_id();
        debug!(
            "driver version {}.{}.{}, vendor 0x{:04x} product 0x{:04x}",
            version.0,
            version.1,
            version.2,
            id.vendor(),
            id.product()
        );
    }

    /// A second handle on the raw event stream, for readiness polling
    /// separate from the injection path.
    pub fn try_clone_stream(&self) -> io::Result<File> {
        self.stream.try_clone()
    }
}

impl TouchDevice for TouchScreen {
    fn supports_axis(&self, axis: u16) -> bool {
        self.dev
            .supported_absolute_axes()
            .is_some_and(|axes| axes.contains(AbsoluteAxisCode(axis)))
    }

    fn axis_info(&self, axis: u16) -> Result<AxisInfo, DeviceError> {
        let (_, info) = self
            .dev
            .get_absinfo()
            .map_err(DeviceError::Io)?
            .find(|(code, _)| code.0 == axis)
            .ok_or(DeviceError::UnsupportedAxis { axis })?;
        Ok(AxisInfo {
            value: info.value(),
            minimum: info.minimum(),
            maximum: info.maximum(),
        })
    }

    fn inject(&mut self, kind: u16, code: u16, value: i32) -> Result<(), DeviceError> {
        let record = RawEvent::new(kind, code, value).encode();
        (&self.stream).write_all(&record).map_err(DeviceError::Io)
    }
}
