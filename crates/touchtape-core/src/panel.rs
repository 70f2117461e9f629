//! The per-slot multi-touch protocol state machine.
//!
//! Devices speak one of two wire variants. Under the slots protocol each
//! event names the contact it updates through a slot-index axis, and a
//! negative tracking id is an explicit lift. The legacy protocol streams
//! one contact's fields at a time, delimited by multi-touch-report
//! markers, and a contact that is not refreshed in the next frame is
//! logically gone. [`TouchPanel`] detects the variant at configure time
//! and applies the matching accumulation and frame-completion rules, in
//! both directions: device events in, captured messages out, and queued
//! messages back into injected device events.

use tracing::{debug, warn};

use crate::clock::Clock;
use crate::device::{DeviceError, TouchDevice};
use crate::event::{
    RawEvent, ABS_MT_DISTANCE, ABS_MT_ORIENTATION, ABS_MT_POSITION_X, ABS_MT_POSITION_Y,
    ABS_MT_PRESSURE, ABS_MT_SLOT, ABS_MT_TOOL_TYPE, ABS_MT_TOUCH_MAJOR, ABS_MT_TOUCH_MINOR,
    ABS_MT_TRACKING_ID, ABS_MT_WIDTH_MAJOR, ABS_MT_WIDTH_MINOR, EV_ABS, EV_SYN, SYN_MT_REPORT,
    SYN_REPORT,
};
use crate::message::Message;

/// Pressure injected for replayed contacts; recordings do not carry
/// per-frame pressure.
const REPLAY_PRESSURE: i32 = 30;

/// Tracking id injected under the legacy protocol, which has no stable
/// contact identity on the wire.
const LEGACY_REPLAY_TRACKING_ID: i32 = 0;

/// Lifecycle of one slot accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    InUse,
    Done,
    NotInUse,
}

/// Accumulator for one simultaneous contact's most recent field values.
///
/// Slots are reused across contacts. The minor axes are optional on many
/// devices; their accessors fall back to the major value until the device
/// reports a minor one.
#[derive(Debug, Clone)]
pub struct Slot {
    state: SlotState,
    have_touch_minor: bool,
    have_width_minor: bool,
    have_tool_type: bool,
    position_x: i32,
    position_y: i32,
    touch_major: i32,
    touch_minor: i32,
    width_major: i32,
    width_minor: i32,
    orientation: i32,
    tracking_id: i32,
    pressure: i32,
    distance: i32,
    tool_type: i32,
}

impl Slot {
    fn new() -> Self {
        Self {
            state: SlotState::NotInUse,
            have_touch_minor: false,
            have_width_minor: false,
            have_tool_type: false,
            position_x: 0,
            position_y: 0,
            touch_major: 0,
            touch_minor: 0,
            width_major: 0,
            width_minor: 0,
            orientation: 0,
            tracking_id: -1,
            pressure: 0,
            distance: 0,
            tool_type: 0,
        }
    }

    fn clear(&mut self) {
        *self = Slot::new();
    }

    pub fn state(&self) -> SlotState {
        self.state
    }

    pub fn x(&self) -> i32 {
        self.position_x
    }

    pub fn y(&self) -> i32 {
        self.position_y
    }

    pub fn touch_major(&self) -> i32 {
        self.touch_major
    }

    pub fn touch_minor(&self) -> i32 {
        if self.have_touch_minor {
            self.touch_minor
        } else {
            self.touch_major
        }
    }

    pub fn tool_major(&self) -> i32 {
        self.width_major
    }

    pub fn tool_minor(&self) -> i32 {
        if self.have_width_minor {
            self.width_minor
        } else {
            self.width_major
        }
    }

    pub fn orientation(&self) -> i32 {
        self.orientation
    }

    pub fn tracking_id(&self) -> i32 {
        self.tracking_id
    }

    pub fn pressure(&self) -> i32 {
        self.pressure
    }

    pub fn distance(&self) -> i32 {
        self.distance
    }

    /// Reported tool type, defaulting to 0 (finger) until the device
    /// names one.
    pub fn tool_type(&self) -> i32 {
        if self.have_tool_type {
            self.tool_type
        } else {
            0
        }
    }
}

/// Tracks the state of the multi-touch protocol for one device.
pub struct TouchPanel<D> {
    device: D,
    slots: Vec<Slot>,
    current_slot: i32,
    using_slots_protocol: bool,
    x_scale: f32,
    y_scale: f32,
    screen_width: i32,
    screen_height: i32,
    clock: Clock,
}

impl<D: TouchDevice> TouchPanel<D> {
    /// A panel with `slot_count` accumulators mapping device coordinates
    /// onto a `screen_width` x `screen_height` logical screen.
    ///
    /// Call [`configure`](Self::configure) before feeding events.
    pub fn new(
        device: D,
        slot_count: usize,
        screen_width: i32,
        screen_height: i32,
        clock: Clock,
    ) -> Self {
        Self {
            device,
            slots: vec![Slot::new(); slot_count],
            current_slot: -1,
            using_slots_protocol: true,
            x_scale: 1.0,
            y_scale: 1.0,
            screen_width,
            screen_height,
            clock,
        }
    }

    /// Detect which protocol variant the device speaks, derive the
    /// coordinate scale factors, and reset the accumulator.
    ///
    /// Query failures degrade: a missing axis range leaves coordinates
    /// unscaled, and a failed slot-index query clears all slots.
    pub fn configure(&mut self) {
        self.using_slots_protocol = self.device.supports_axis(ABS_MT_SLOT);
        debug!(
            slots_protocol = self.using_slots_protocol,
            "detected protocol variant"
        );

        self.x_scale = self.scale_for(ABS_MT_POSITION_X, self.screen_width);
        self.y_scale = self.scale_for(ABS_MT_POSITION_Y, self.screen_height);
        debug!(
            x_scale = self.x_scale,
            y_scale = self.y_scale,
            "derived coordinate scales"
        );

        self.reset();
    }

    fn scale_for(&self, axis: u16, logical: i32) -> f32 {
        match self.device.axis_info(axis) {
            Ok(info) => logical as f32 / (info.maximum - info.minimum + 1) as f32,
            Err(e) => {
                warn!("could not read range of axis 0x{axis:02x}, leaving coordinates unscaled: {e}");
                1.0
            }
        }
    }

    /// Clear every slot and reseed the current slot index from the device.
    ///
    /// There is no way to read the initial contents of the slots, so they
    /// are assumed empty. The seeded index may lag the oldest event still
    /// buffered in the device; at worst two slots are confused until the
    /// next slot-selecting event, which can make a touch point jump but
    /// never stick.
    pub fn reset(&mut self) {
        let mut initial_slot = -1;
        if self.using_slots_protocol {
            match self.device.axis_value(ABS_MT_SLOT) {
                Ok(value) => initial_slot = value,
                Err(e) => warn!("could not retrieve current multitouch slot index: {e}"),
            }
        }
        self.clear_slots(initial_slot);
        debug!(initial_slot, "accumulator reset");
    }

    fn clear_slots(&mut self, initial_slot: i32) {
        for slot in &mut self.slots {
            slot.clear();
        }
        self.current_slot = initial_slot;
    }

    /// Consume one raw device event.
    ///
    /// Returns the messages completed by this event: empty for field
    /// updates, the frame's `stop`/`sync` reports for a frame marker.
    pub fn process(&mut self, event: &RawEvent) -> Vec<Message> {
        match (event.kind, event.code) {
            (EV_ABS, code) => {
                self.process_axis(code, event.value);
                Vec::new()
            }
            (EV_SYN, SYN_MT_REPORT) => {
                // The legacy protocol has no slot-index axis; the marker
                // delimits one contact's fields.
                if !self.using_slots_protocol {
                    self.current_slot += 1;
                }
                Vec::new()
            }
            (EV_SYN, SYN_REPORT) => {
                let timestamp = self.clock.timestamp(event.time_secs, event.time_micros);
                self.finish_frame(timestamp)
            }
            _ => Vec::new(),
        }
    }

    fn process_axis(&mut self, code: u16, value: i32) {
        let mut selected_slot = false;
        if self.using_slots_protocol {
            if code == ABS_MT_SLOT {
                self.current_slot = value;
                selected_slot = true;
            }
        } else if code == ABS_MT_TRACKING_ID {
            // Legacy devices identify the contact by tracking id alone.
            self.current_slot = value;
        }

        let index = self.current_slot;
        if index < 0 || index as usize >= self.slots.len() {
            if selected_slot {
                warn!(
                    "device emitted invalid slot index {index}, expected 0..{}; ignoring this slot",
                    self.slots.len()
                );
            }
            return;
        }

        let slots_protocol = self.using_slots_protocol;
        let slot = &mut self.slots[index as usize];
        match code {
            ABS_MT_POSITION_X => {
                slot.state = SlotState::InUse;
                slot.position_x = value;
            }
            ABS_MT_POSITION_Y => {
                slot.state = SlotState::InUse;
                slot.position_y = value;
            }
            ABS_MT_TOUCH_MAJOR => {
                slot.state = SlotState::InUse;
                slot.touch_major = value;
            }
            ABS_MT_TOUCH_MINOR => {
                slot.state = SlotState::InUse;
                slot.touch_minor = value;
                slot.have_touch_minor = true;
            }
            ABS_MT_WIDTH_MAJOR => {
                slot.state = SlotState::InUse;
                slot.width_major = value;
            }
            ABS_MT_WIDTH_MINOR => {
                slot.state = SlotState::InUse;
                slot.width_minor = value;
                slot.have_width_minor = true;
            }
            ABS_MT_ORIENTATION => {
                slot.state = SlotState::InUse;
                slot.orientation = value;
            }
            ABS_MT_TRACKING_ID => {
                if slots_protocol && value < 0 {
                    // Lift. The slot keeps its previous contents for the
                    // stop report and may be reused by a later contact.
                    slot.state = SlotState::Done;
                } else {
                    slot.state = SlotState::InUse;
                    slot.tracking_id = value;
                }
            }
            ABS_MT_PRESSURE => {
                slot.state = SlotState::InUse;
                slot.pressure = value;
            }
            ABS_MT_DISTANCE => {
                slot.state = SlotState::InUse;
                slot.distance = value;
            }
            ABS_MT_TOOL_TYPE => {
                slot.state = SlotState::InUse;
                slot.tool_type = value;
                slot.have_tool_type = true;
            }
            _ => {}
        }
    }

    /// A frame marker closes one atomic snapshot: report every finished
    /// contact, then every live one.
    fn finish_frame(&mut self, timestamp: i64) -> Vec<Message> {
        let mut out = Vec::new();
        for slot in &mut self.slots {
            if slot.state == SlotState::Done {
                slot.state = SlotState::NotInUse;
                out.push(Message::Stop {
                    timestamp,
                    tracking_id: slot.tracking_id,
                });
            }
            if slot.state == SlotState::InUse {
                out.push(Message::Sync {
                    timestamp,
                    tracking_id: slot.tracking_id,
                    x: (slot.position_x as f32 * self.x_scale) as i32,
                    y: (slot.position_y as f32 * self.y_scale) as i32,
                });
                if !self.using_slots_protocol {
                    // No lift event exists in the legacy protocol; a
                    // contact not refreshed by the next frame is gone.
                    slot.state = SlotState::Done;
                }
            }
        }
        out
    }

    /// Inject the device-event sequence equivalent to one message.
    pub fn replay(&mut self, msg: &Message) -> Result<(), DeviceError> {
        match *msg {
            Message::Sync {
                tracking_id, x, y, ..
            } => {
                debug!(tracking_id, x, y, "replaying sync");
                if self.using_slots_protocol {
                    self.device.inject(EV_ABS, ABS_MT_TRACKING_ID, tracking_id)?;
                } else {
                    self.device
                        .inject(EV_ABS, ABS_MT_TRACKING_ID, LEGACY_REPLAY_TRACKING_ID)?;
                }
                self.device
                    .inject(EV_ABS, ABS_MT_POSITION_X, (x as f32 / self.x_scale) as i32)?;
                self.device
                    .inject(EV_ABS, ABS_MT_POSITION_Y, (y as f32 / self.y_scale) as i32)?;
                self.device.inject(EV_ABS, ABS_MT_PRESSURE, REPLAY_PRESSURE)?;
                if !self.using_slots_protocol {
                    self.device.inject(EV_SYN, SYN_MT_REPORT, 0)?;
                }
                self.device.inject(EV_SYN, SYN_REPORT, 0)?;
            }
            Message::Stop { tracking_id, .. } => {
                debug!(tracking_id, "replaying stop");
                if self.using_slots_protocol {
                    self.device.inject(EV_ABS, ABS_MT_TRACKING_ID, -1)?;
                } else {
                    // An empty report frame signals "no contact".
                    self.device.inject(EV_SYN, SYN_MT_REPORT, 0)?;
                }
                self.device.inject(EV_SYN, SYN_REPORT, 0)?;
            }
            // Re-anchoring already happened when the queue released it.
            Message::Reset { .. } => {}
        }
        Ok(())
    }

    /// Drop per-contact state after a replay-driven frame. The legacy
    /// protocol carries no persistent lift signal, so its slots must not
    /// outlive the frame.
    pub fn finish_sync(&mut self) {
        if !self.using_slots_protocol {
            self.clear_slots(-1);
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slot(&self, index: usize) -> &Slot {
        &self.slots[index]
    }

    pub fn using_slots_protocol(&self) -> bool {
        self.using_slots_protocol
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::AxisInfo;

    /// In-memory device: a fixed axis table plus a log of injections.
    struct FakeDevice {
        axes: Vec<(u16, AxisInfo)>,
        injected: Vec<(u16, u16, i32)>,
    }

    impl FakeDevice {
        fn new(axes: Vec<(u16, AxisInfo)>) -> Self {
            Self {
                axes,
                injected: Vec::new(),
            }
        }

        /// A slots-protocol device with 720x1280-matched position ranges.
        fn slots() -> Self {
            Self::new(vec![
                (ABS_MT_SLOT, axis(0, 0, 3)),
                (ABS_MT_POSITION_X, axis(0, 0, 719)),
                (ABS_MT_POSITION_Y, axis(0, 0, 1279)),
            ])
        }

        /// A legacy device: no slot axis.
        fn legacy() -> Self {
            Self::new(vec![
                (ABS_MT_POSITION_X, axis(0, 0, 719)),
                (ABS_MT_POSITION_Y, axis(0, 0, 1279)),
            ])
        }
    }

    fn axis(value: i32, minimum: i32, maximum: i32) -> AxisInfo {
        AxisInfo {
            value,
            minimum,
            maximum,
        }
    }

    impl TouchDevice for FakeDevice {
        fn supports_axis(&self, axis: u16) -> bool {
            self.axes.iter().any(|(code, _)| *code == axis)
        }

        fn axis_info(&self, axis: u16) -> Result<AxisInfo, DeviceError> {
            self.axes
                .iter()
                .find(|(code, _)| *code == axis)
                .map(|(_, info)| *info)
                .ok_or(DeviceError::UnsupportedAxis { axis })
        }

        fn inject(&mut self, kind: u16, code: u16, value: i32) -> Result<(), DeviceError> {
            self.injected.push((kind, code, value));
            Ok(())
        }
    }

    fn panel(device: FakeDevice) -> TouchPanel<FakeDevice> {
        let mut panel = TouchPanel::new(device, 4, 720, 1280, Clock::with_epoch(0));
        panel.configure();
        panel
    }

    fn abs(code: u16, value: i32) -> RawEvent {
        RawEvent::new(EV_ABS, code, value)
    }

    fn frame_marker(secs: i64, micros: i64) -> RawEvent {
        RawEvent {
            time_secs: secs,
            time_micros: micros,
            kind: EV_SYN,
            code: SYN_REPORT,
            value: 0,
        }
    }

    #[test]
    fn test_configure_detects_slots_protocol() {
        assert!(panel(FakeDevice::slots()).using_slots_protocol());
        assert!(!panel(FakeDevice::legacy()).using_slots_protocol());
    }

    #[test]
    fn test_slots_frame_emits_one_sync() {
        let mut p = panel(FakeDevice::slots());
        assert!(p.process(&abs(ABS_MT_SLOT, 0)).is_empty());
        assert!(p.process(&abs(ABS_MT_TRACKING_ID, 5)).is_empty());
        assert!(p.process(&abs(ABS_MT_POSITION_X, 100)).is_empty());
        assert!(p.process(&abs(ABS_MT_POSITION_Y, 200)).is_empty());

        let messages = p.process(&frame_marker(1, 500_000));
        assert_eq!(
            messages,
            vec![Message::Sync {
                timestamp: 1500,
                tracking_id: 5,
                x: 100,
                y: 200
            }]
        );
        assert_eq!(p.slot(0).state(), SlotState::InUse);
    }

    #[test]
    fn test_slots_lift_emits_stop_and_frees_slot() {
        let mut p = panel(FakeDevice::slots());
        p.process(&abs(ABS_MT_SLOT, 0));
        p.process(&abs(ABS_MT_TRACKING_ID, 5));
        p.process(&abs(ABS_MT_POSITION_X, 100));
        p.process(&abs(ABS_MT_POSITION_Y, 200));
        p.process(&frame_marker(1, 0));

        p.process(&abs(ABS_MT_TRACKING_ID, -1));
        let messages = p.process(&frame_marker(2, 0));
        assert_eq!(
            messages,
            vec![Message::Stop {
                timestamp: 2000,
                tracking_id: 5
            }]
        );
        assert_eq!(p.slot(0).state(), SlotState::NotInUse);
    }

    #[test]
    fn test_legacy_auto_lift_on_unrefreshed_contact() {
        let mut p = panel(FakeDevice::legacy());
        // Tracking id selects the slot under the legacy protocol.
        p.process(&abs(ABS_MT_TRACKING_ID, 2));
        p.process(&abs(ABS_MT_POSITION_X, 50));
        p.process(&abs(ABS_MT_POSITION_Y, 60));

        let first = p.process(&frame_marker(1, 0));
        assert_eq!(
            first,
            vec![Message::Sync {
                timestamp: 1000,
                tracking_id: 2,
                x: 50,
                y: 60
            }]
        );

        // Nothing refreshed the contact: the next frame reports the lift.
        let second = p.process(&frame_marker(2, 0));
        assert_eq!(
            second,
            vec![Message::Stop {
                timestamp: 2000,
                tracking_id: 2
            }]
        );
        assert_eq!(p.slot(2).state(), SlotState::NotInUse);
    }

    #[test]
    fn test_legacy_mt_report_advances_slot() {
        let mut p = panel(FakeDevice::legacy());
        p.process(&abs(ABS_MT_TRACKING_ID, 0));
        p.process(&abs(ABS_MT_POSITION_X, 10));
        p.process(&abs(ABS_MT_POSITION_Y, 11));
        p.process(&RawEvent::new(EV_SYN, SYN_MT_REPORT, 0));
        // After the marker the next contact's fields land in slot 1.
        p.process(&abs(ABS_MT_POSITION_X, 20));
        p.process(&abs(ABS_MT_POSITION_Y, 21));

        let messages = p.process(&frame_marker(1, 0));
        assert_eq!(messages.len(), 2);
        assert_eq!(p.slot(1).x(), 20);
    }

    #[test]
    fn test_slots_mt_report_is_ignored() {
        let mut p = panel(FakeDevice::slots());
        p.process(&abs(ABS_MT_SLOT, 1));
        p.process(&RawEvent::new(EV_SYN, SYN_MT_REPORT, 0));
        p.process(&abs(ABS_MT_TRACKING_ID, 9));
        p.process(&frame_marker(1, 0));
        // The marker must not have advanced the slot index.
        assert_eq!(p.slot(1).tracking_id(), 9);
    }

    #[test]
    fn test_out_of_range_slot_index_is_dropped() {
        let mut p = panel(FakeDevice::slots());
        p.process(&abs(ABS_MT_SLOT, 0));
        p.process(&abs(ABS_MT_TRACKING_ID, 5));
        p.process(&frame_marker(1, 0));

        // Events addressed past the slot count fall on the floor.
        p.process(&abs(ABS_MT_SLOT, 9));
        p.process(&abs(ABS_MT_POSITION_X, 777));
        let messages = p.process(&frame_marker(2, 0));

        // Slot 0 is untouched and still reporting.
        assert_eq!(messages.len(), 1);
        assert_eq!(p.slot(0).tracking_id(), 5);
        assert_eq!(p.slot(0).x(), 0);
        for i in 1..p.slot_count() {
            assert_eq!(p.slot(i).state(), SlotState::NotInUse);
        }
    }

    #[test]
    fn test_coordinates_scale_to_logical_screen() {
        let device = FakeDevice::new(vec![
            (ABS_MT_SLOT, axis(0, 0, 3)),
            (ABS_MT_POSITION_X, axis(0, 0, 1439)),
            (ABS_MT_POSITION_Y, axis(0, 0, 2559)),
        ]);
        let mut p = panel(device);
        p.process(&abs(ABS_MT_SLOT, 0));
        p.process(&abs(ABS_MT_TRACKING_ID, 1));
        p.process(&abs(ABS_MT_POSITION_X, 1000));
        p.process(&abs(ABS_MT_POSITION_Y, 2000));

        let messages = p.process(&frame_marker(1, 0));
        assert_eq!(
            messages,
            vec![Message::Sync {
                timestamp: 1000,
                tracking_id: 1,
                x: 500,
                y: 1000
            }]
        );
    }

    #[test]
    fn test_pressure_event_updates_slot() {
        let mut p = panel(FakeDevice::slots());
        p.process(&abs(ABS_MT_SLOT, 0));
        p.process(&abs(ABS_MT_PRESSURE, 44));
        assert_eq!(p.slot(0).state(), SlotState::InUse);
        assert_eq!(p.slot(0).pressure(), 44);
    }

    #[test]
    fn test_minor_axes_fall_back_to_major() {
        let mut p = panel(FakeDevice::slots());
        p.process(&abs(ABS_MT_SLOT, 0));
        p.process(&abs(ABS_MT_TOUCH_MAJOR, 12));
        p.process(&abs(ABS_MT_WIDTH_MAJOR, 30));
        assert_eq!(p.slot(0).touch_minor(), 12);
        assert_eq!(p.slot(0).tool_minor(), 30);

        p.process(&abs(ABS_MT_TOUCH_MINOR, 8));
        assert_eq!(p.slot(0).touch_minor(), 8);
    }

    #[test]
    fn test_reset_seeds_current_slot_from_device() {
        let device = FakeDevice::new(vec![
            (ABS_MT_SLOT, axis(2, 0, 3)),
            (ABS_MT_POSITION_X, axis(0, 0, 719)),
            (ABS_MT_POSITION_Y, axis(0, 0, 1279)),
        ]);
        let mut p = panel(device);
        // Field updates before any slot event land in the seeded slot.
        p.process(&abs(ABS_MT_TRACKING_ID, 6));
        assert_eq!(p.slot(2).tracking_id(), 6);
    }

    #[test]
    fn test_degraded_configure_defaults() {
        // No axes at all: legacy protocol, unscaled coordinates.
        let mut p = panel(FakeDevice::new(Vec::new()));
        assert!(!p.using_slots_protocol());

        p.process(&abs(ABS_MT_TRACKING_ID, 0));
        p.process(&abs(ABS_MT_POSITION_X, 123));
        p.process(&abs(ABS_MT_POSITION_Y, 321));
        let messages = p.process(&frame_marker(1, 0));
        assert_eq!(
            messages,
            vec![Message::Sync {
                timestamp: 1000,
                tracking_id: 0,
                x: 123,
                y: 321
            }]
        );
    }

    #[test]
    fn test_replay_sync_slots_protocol() {
        let mut p = panel(FakeDevice::slots());
        p.replay(&Message::Sync {
            timestamp: 0,
            tracking_id: 7,
            x: 360,
            y: 640,
        })
        .unwrap();
        assert_eq!(
            p.device.injected,
            vec![
                (EV_ABS, ABS_MT_TRACKING_ID, 7),
                (EV_ABS, ABS_MT_POSITION_X, 360),
                (EV_ABS, ABS_MT_POSITION_Y, 640),
                (EV_ABS, ABS_MT_PRESSURE, REPLAY_PRESSURE),
                (EV_SYN, SYN_REPORT, 0),
            ]
        );
    }

    #[test]
    fn test_replay_sync_legacy_protocol() {
        let mut p = panel(FakeDevice::legacy());
        p.replay(&Message::Sync {
            timestamp: 0,
            tracking_id: 7,
            x: 100,
            y: 200,
        })
        .unwrap();
        assert_eq!(
            p.device.injected,
            vec![
                (EV_ABS, ABS_MT_TRACKING_ID, LEGACY_REPLAY_TRACKING_ID),
                (EV_ABS, ABS_MT_POSITION_X, 100),
                (EV_ABS, ABS_MT_POSITION_Y, 200),
                (EV_ABS, ABS_MT_PRESSURE, REPLAY_PRESSURE),
                (EV_SYN, SYN_MT_REPORT, 0),
                (EV_SYN, SYN_REPORT, 0),
            ]
        );
    }

    #[test]
    fn test_replay_sync_rescales_to_device_range() {
        let device = FakeDevice::new(vec![
            (ABS_MT_SLOT, axis(0, 0, 3)),
            (ABS_MT_POSITION_X, axis(0, 0, 1439)),
            (ABS_MT_POSITION_Y, axis(0, 0, 2559)),
        ]);
        let mut p = panel(device);
        p.replay(&Message::Sync {
            timestamp: 0,
            tracking_id: 1,
            x: 360,
            y: 640,
        })
        .unwrap();
        // Screen-space coordinates divide back into the device's range.
        assert!(p.device.injected.contains(&(EV_ABS, ABS_MT_POSITION_X, 720)));
        assert!(p.device.injected.contains(&(EV_ABS, ABS_MT_POSITION_Y, 1280)));
    }

    #[test]
    fn test_replay_stop_both_protocols() {
        let stop = Message::Stop {
            timestamp: 0,
            tracking_id: 7,
        };

        let mut slots = panel(FakeDevice::slots());
        slots.replay(&stop).unwrap();
        assert_eq!(
            slots.device.injected,
            vec![(EV_ABS, ABS_MT_TRACKING_ID, -1), (EV_SYN, SYN_REPORT, 0)]
        );

        let mut legacy = panel(FakeDevice::legacy());
        legacy.replay(&stop).unwrap();
        assert_eq!(
            legacy.device.injected,
            vec![(EV_SYN, SYN_MT_REPORT, 0), (EV_SYN, SYN_REPORT, 0)]
        );
    }

    #[test]
    fn test_replay_reset_injects_nothing() {
        let mut p = panel(FakeDevice::slots());
        p.replay(&Message::Reset { timestamp: 5 }).unwrap();
        assert!(p.device.injected.is_empty());
    }

    #[test]
    fn test_finish_sync_clears_legacy_state_only() {
        let mut legacy = panel(FakeDevice::legacy());
        legacy.process(&abs(ABS_MT_TRACKING_ID, 1));
        legacy.process(&abs(ABS_MT_POSITION_X, 9));
        legacy.finish_sync();
        assert_eq!(legacy.slot(1).state(), SlotState::NotInUse);
        assert_eq!(legacy.slot(1).x(), 0);

        let mut slots = panel(FakeDevice::slots());
        slots.process(&abs(ABS_MT_SLOT, 0));
        slots.process(&abs(ABS_MT_POSITION_X, 9));
        slots.finish_sync();
        assert_eq!(slots.slot(0).state(), SlotState::InUse);
        assert_eq!(slots.slot(0).x(), 9);
    }
}
