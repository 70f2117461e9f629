//! Pending-message buffering and the replay scheduler.
//!
//! `ReplayQueue` carries both directions of the recording protocol: on the
//! capture path it serializes messages straight to an output sink, and on
//! the load path it assembles lines from a non-blocking byte stream,
//! decodes them and holds the resulting messages in arrival order until
//! they come due.
//!
//! Replay pacing works on two anchors: `timebase` (the recorded timestamp
//! that maps to "replay start") and `motion_start` (the real time replay
//! began). A message is due once real time has advanced past its recorded
//! offset from the timebase. Dequeuing a `reset` rewrites both anchors
//! together, so a second recording appended to the queue replays at its
//! own pace instead of inheriting the first one's drift.

use std::collections::VecDeque;
use std::io::{self, Read, Write};

use tracing::{debug, warn};

use crate::message::Message;

/// Longest accepted protocol line, terminator included.
const MAX_LINE_LEN: usize = 200;

/// Outcome of one [`ReplayQueue::dequeue`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dequeue {
    /// The head message is due; play it now and call `dequeue` again.
    Ready(Message),
    /// Nothing is due for this many milliseconds.
    Wait(i64),
    /// The queue is empty; wait without a timeout.
    Idle,
}

/// Ordered buffer of pending messages plus the timing-alignment state.
pub struct ReplayQueue<W> {
    pending: VecDeque<Message>,
    timebase: i64,
    motion_start: i64,
    line: Vec<u8>,
    discarding: bool,
    out: W,
}

impl<W: Write> ReplayQueue<W> {
    pub fn new(out: W) -> Self {
        Self {
            pending: VecDeque::new(),
            timebase: -1,
            motion_start: -1,
            line: Vec::with_capacity(MAX_LINE_LEN),
            discarding: false,
            out,
        }
    }

    /// Serialize one captured message straight to the output sink.
    pub fn send(&mut self, msg: &Message) -> io::Result<()> {
        self.out.write_all(msg.encode().as_bytes())?;
        self.out.flush()
    }

    /// Append a message to the pending sequence. Arrival order is the
    /// replay order; no bound is enforced on the backlog.
    pub fn enqueue(&mut self, msg: Message) {
        self.pending.push_back(msg);
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Decide whether the head message is due at `now`.
    ///
    /// The first call seeds `motion_start` from `now`, and `timebase` from
    /// the head message's timestamp if no `reset` has supplied one, so an
    /// untrimmed recording starts playing immediately. A due `reset`
    /// re-anchors both values before being returned.
    pub fn dequeue(&mut self, now: i64) -> Dequeue {
        let Some(head) = self.pending.front().copied() else {
            return Dequeue::Idle;
        };

        if self.motion_start < 1 {
            self.motion_start = now;
        }
        if self.timebase < 1 {
            self.timebase = head.timestamp();
        }

        let elapsed_real = now - self.motion_start;
        let elapsed_recorded = head.timestamp() - self.timebase;

        if elapsed_real >= elapsed_recorded {
            if let Message::Reset { timestamp } = head {
                self.timebase = timestamp;
                self.motion_start = now;
            }
            self.pending.pop_front();
            Dequeue::Ready(head)
        } else {
            Dequeue::Wait((elapsed_recorded - elapsed_real).max(0))
        }
    }

    /// Drain available bytes from `reader`, decoding complete lines into
    /// pending messages.
    ///
    /// Returns `Ok(true)` while the stream is still open (the read would
    /// block) and `Ok(false)` once it reached end-of-input. A line longer
    /// than the buffer bound is dropped whole: the buffered prefix is
    /// discarded and so is the rest of that line, so the following line
    /// parses intact. Undecodable lines are logged and skipped.
    pub fn fill_from(&mut self, reader: &mut impl Read) -> io::Result<bool> {
        let mut chunk = [0u8; 256];
        loop {
            match reader.read(&mut chunk) {
                Ok(0) => return Ok(false),
                Ok(n) => {
                    for &byte in &chunk[..n] {
                        self.push_byte(byte);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(true),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn push_byte(&mut self, byte: u8) {
        if byte == b'\n' {
            if self.discarding {
                self.discarding = false;
            } else {
                self.decode_line();
            }
            self.line.clear();
            return;
        }
        if self.discarding {
            return;
        }
        if self.line.len() >= MAX_LINE_LEN - 1 {
            warn!(
                buffered = self.line.len(),
                "max message length exceeded, dropping line"
            );
            self.line.clear();
            self.discarding = true;
            return;
        }
        self.line.push(byte);
    }

    fn decode_line(&mut self) {
        let text = String::from_utf8_lossy(&self.line);
        if text.trim().is_empty() {
            return;
        }
        match Message::decode(&text) {
            Ok(msg) => {
                debug!(?msg, "queued message");
                self.enqueue(msg);
            }
            Err(e) => warn!("failed to parse message '{}': {}", text.trim_end(), e),
        }
    }
}
