//! Raw device event records and multi-touch protocol constants.
//!
//! The kernel delivers input as fixed-size `input_event` records. The
//! record layout depends on the platform's time representation (a pair of
//! native-width integers), so the byte codec here keeps the on-the-wire
//! layout separate from [`RawEvent`], the typed value the protocol logic
//! consumes.

// Event types.
pub const EV_SYN: u16 = 0x00;
pub const EV_ABS: u16 = 0x03;

// Synchronization codes.
pub const SYN_REPORT: u16 = 0x00;
pub const SYN_MT_REPORT: u16 = 0x02;

// Multi-touch absolute axes.
pub const ABS_MT_SLOT: u16 = 0x2f;
pub const ABS_MT_TOUCH_MAJOR: u16 = 0x30;
pub const ABS_MT_TOUCH_MINOR: u16 = 0x31;
pub const ABS_MT_WIDTH_MAJOR: u16 = 0x32;
pub const ABS_MT_WIDTH_MINOR: u16 = 0x33;
pub const ABS_MT_ORIENTATION: u16 = 0x34;
pub const ABS_MT_POSITION_X: u16 = 0x35;
pub const ABS_MT_POSITION_Y: u16 = 0x36;
pub const ABS_MT_TOOL_TYPE: u16 = 0x37;
pub const ABS_MT_TRACKING_ID: u16 = 0x39;
pub const ABS_MT_PRESSURE: u16 = 0x3a;
pub const ABS_MT_DISTANCE: u16 = 0x3b;

/// Size in bytes of one kernel record: a timeval (two native-width
/// integers) followed by type, code and value.
#[cfg(target_pointer_width = "64")]
pub const RECORD_SIZE: usize = 24;
#[cfg(target_pointer_width = "32")]
pub const RECORD_SIZE: usize = 16;

/// One decoded device event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub time_secs: i64,
    pub time_micros: i64,
    pub kind: u16,
    pub code: u16,
    pub value: i32,
}

impl RawEvent {
    /// An event for injection. The timestamp is zeroed; the kernel stamps
    /// injected events itself.
    pub fn new(kind: u16, code: u16, value: i32) -> Self {
        Self {
            time_secs: 0,
            time_micros: 0,
            kind,
            code,
            value,
        }
    }

    /// Decode one record from native-endian bytes.
    ///
    /// Returns `None` if the buffer holds less than [`RECORD_SIZE`] bytes.
    pub fn parse(buf: &[u8]) -> Option<RawEvent> {
        if buf.len() < RECORD_SIZE {
            return None;
        }

        #[cfg(target_pointer_width = "64")]
        let (time_secs, time_micros, rest) = {
            let secs = i64::from_ne_bytes(buf[0..8].try_into().ok()?);
            let micros = i64::from_ne_bytes(buf[8..16].try_into().ok()?);
            (secs, micros, &buf[16..])
        };
        #[cfg(target_pointer_width = "32")]
        let (time_secs, time_micros, rest) = {
            let secs = i32::from_ne_bytes(buf[0..4].try_into().ok()?) as i64;
            let micros = i32::from_ne_bytes(buf[4..8].try_into().ok()?) as i64;
            (secs, micros, &buf[8..])
        };

        Some(RawEvent {
            time_secs,
            time_micros,
            kind: u16::from_ne_bytes(rest[0..2].try_into().ok()?),
            code: u16::from_ne_bytes(rest[2..4].try_into().ok()?),
            value: i32::from_ne_bytes(rest[4..8].try_into().ok()?),
        })
    }

    /// Encode to one native-endian record ready to write to a device node.
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut out = [0u8; RECORD_SIZE];

        #[cfg(target_pointer_width = "64")]
        let tail = {
            out[0..8].copy_from_slice(&self.time_secs.to_ne_bytes());
            out[8..16].copy_from_slice(&self.time_micros.to_ne_bytes());
            16
        };
        #[cfg(target_pointer_width = "32")]
        let tail = {
            out[0..4].copy_from_slice(&(self.time_secs as i32).to_ne_bytes());
            out[4..8].copy_from_slice(&(self.time_micros as i32).to_ne_bytes());
            8
        };

        out[tail..tail + 2].copy_from_slice(&self.kind.to_ne_bytes());
        out[tail + 2..tail + 4].copy_from_slice(&self.code.to_ne_bytes());
        out[tail + 4..tail + 8].copy_from_slice(&self.value.to_ne_bytes());
        out
    }
}
