//! The single-threaded capture/replay event loop.
//!
//! One task, one suspension point: a multiplexed wait across the touch
//! device, the inbound recording stream and the replay queue's next-due
//! delay. Device events feed the state machine (capture path); stream
//! bytes feed the replay queue (load path); due messages feed the state
//! machine's replay direction. All of it runs on a current-thread
//! runtime, so no state is shared across threads.

use std::fs::File;
use std::io::{self, Read};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::io::unix::{AsyncFd, AsyncFdReadyGuard};
use tokio::io::Interest;
use touchtape_core::clock::Clock;
use touchtape_core::event::{RawEvent, RECORD_SIZE};
use touchtape_core::message::Message;
use touchtape_core::panel::TouchPanel;
use touchtape_core::queue::{Dequeue, ReplayQueue};
use tracing::{debug, warn};

use crate::device::TouchScreen;

/// Drive capture and replay until the process is killed.
///
/// Each iteration first drains the replay queue of everything already due
/// (each message is injected and followed by a frame-state cleanup), then
/// parks in the multiplexed wait. Stdin reaching end-of-input stops the
/// stream branch; touch processing continues indefinitely.
pub async fn run(
    mut panel: TouchPanel<TouchScreen>,
    mut queue: ReplayQueue<io::Stdout>,
    mut clock: Clock,
    device_stream: File,
) -> Result<()> {
    let device = AsyncFd::with_interest(device_stream, Interest::READABLE)
        .context("could not register touch device for polling")?;
    debug!("starting input polling, epoch {}", clock.start_ms());

    // A recording opens with its own timebase, so captures can be
    // concatenated and each segment replays at its own pace.
    queue
        .send(&Message::Reset {
            timestamp: clock.now(),
        })
        .context("could not write capture preamble")?;

    let stdin = match AsyncFd::with_interest(nonblocking_stdin()?, Interest::READABLE) {
        Ok(fd) => Some(fd),
        Err(e) => {
            // Regular files cannot be polled; when stdin is one, slurp the
            // whole recording up front instead.
            debug!("stdin is not pollable ({e}); reading the recording eagerly");
            let mut reader = nonblocking_stdin()?;
            queue
                .fill_from(&mut reader)
                .context("could not read recording from stdin")?;
            None
        }
    };
    let mut stdin_open = stdin.is_some();

    loop {
        let now = clock.now();
        let mut timeout = None;
        loop {
            match queue.dequeue(now) {
                Dequeue::Ready(msg) => {
                    if let Err(e) = panel.replay(&msg) {
                        warn!("replay injection failed: {e}");
                    }
                    panel.finish_sync();
                }
                Dequeue::Wait(delay) => {
                    timeout = Some(Duration::from_millis(delay.max(0) as u64));
                    break;
                }
                Dequeue::Idle => break,
            }
        }

        tokio::select! {
            // Device events are handled before stream bytes when both are
            // ready; callers must not depend on the order.
            biased;

            guard = device.readable() => {
                let mut guard = guard.context("touch device poll failed")?;
                drain_device(&mut panel, &mut queue, device.get_ref())?;
                guard.clear_ready();
            }
            guard = readable_or_pending(&stdin), if stdin_open => {
                let mut guard = guard.context("recording stream poll failed")?;
                if let Some(fd) = stdin.as_ref() {
                    let mut reader = fd.get_ref();
                    let open = queue
                        .fill_from(&mut reader)
                        .context("error reading recording stream")?;
                    if !open {
                        debug!("recording stream closed; replay queue is final");
                        stdin_open = false;
                    }
                }
                guard.clear_ready();
            }
            _ = wait_due(timeout) => {
                // Loop back around; the drain above plays what came due.
            }
        }
    }
}

/// Read every raw record currently buffered on the device, feeding the
/// state machine and writing captured messages to the output sink.
///
/// A read that is not a whole number of records means the device path is
/// unusable, which is fatal.
fn drain_device(
    panel: &mut TouchPanel<TouchScreen>,
    queue: &mut ReplayQueue<io::Stdout>,
    mut stream: &File,
) -> Result<()> {
    let mut buf = [0u8; RECORD_SIZE * 64];
    loop {
        match stream.read(&mut buf) {
            Ok(0) => bail!("touch device closed"),
            Ok(n) if n % RECORD_SIZE != 0 => {
                bail!("truncated read of {n} bytes from touch device")
            }
            Ok(n) => {
                for chunk in buf[..n].chunks_exact(RECORD_SIZE) {
                    let Some(event) = RawEvent::parse(chunk) else {
                        continue;
                    };
                    for msg in panel.process(&event) {
                        if let Err(e) = queue.send(&msg) {
                            warn!("could not write captured message: {e}");
                        }
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context("could not read from touch device"),
        }
    }
}

/// Wait for readability, or forever when the stream was never pollable.
async fn readable_or_pending(
    fd: &Option<AsyncFd<File>>,
) -> io::Result<AsyncFdReadyGuard<'_, File>> {
    match fd {
        Some(fd) => fd.readable().await,
        None => std::future::pending().await,
    }
}

/// Sleep until the next replay message is due, or park when the queue is
/// empty.
async fn wait_due(timeout: Option<Duration>) {
    match timeout {
        Some(delay) => tokio::time::sleep(delay).await,
        None => std::future::pending().await,
    }
}

/// Duplicate stdin and put it into non-blocking mode.
fn nonblocking_stdin() -> Result<File> {
    use std::os::fd::FromRawFd;

    // SAFETY: dup() hands back a fresh descriptor that the File below
    // takes sole ownership of; fd 0 itself stays open for the process.
    let fd = unsafe { libc::dup(libc::STDIN_FILENO) };
    if fd < 0 {
        return Err(io::Error::last_os_error()).context("could not duplicate stdin");
    }
    // SAFETY: fd was just created by dup() and is owned by nothing else.
    let file = unsafe { File::from_raw_fd(fd) };

    // SAFETY: flag manipulation on a descriptor this process owns.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 || unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
        return Err(io::Error::last_os_error()).context("could not make stdin non-blocking");
    }
    Ok(file)
}
