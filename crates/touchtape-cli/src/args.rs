//! CLI argument parsing with clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// The fixed logical screen forced by `-s`.
const NHD_WIDTH: i32 = 360;
const NHD_HEIGHT: i32 = 640;

/// Record and replay multi-touch gestures on a touchscreen device.
///
/// Captured gestures are written to stdout as a text line protocol; lines
/// fed on stdin are queued and replayed onto the device with their
/// original pacing. Both directions run at once, so a capture can be
/// piped straight into a file while a recording plays.
#[derive(Debug, Parser)]
#[command(name = "touchtape", version)]
pub struct Cli {
    /// Print extra debugging on stderr
    #[arg(short = 'd')]
    pub debug: bool,

    /// Scale all touches to nHD (360x640), overriding -x/-y
    #[arg(short = 's')]
    pub scale_nhd: bool,

    /// Width of the logical screen
    #[arg(short = 'x', value_name = "WIDTH", default_value_t = 720)]
    pub width: i32,

    /// Height of the logical screen
    #[arg(short = 'y', value_name = "HEIGHT", default_value_t = 1280)]
    pub height: i32,

    /// Touch device to use; the first multi-touch node under /dev/input
    /// is used when omitted
    pub device: Option<PathBuf>,
}

impl Cli {
    /// Logical screen size after applying the `-s` override.
    pub fn screen_size(&self) -> (i32, i32) {
        if self.scale_nhd {
            (NHD_WIDTH, NHD_HEIGHT)
        } else {
            (self.width, self.height)
        }
    }
}
