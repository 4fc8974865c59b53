//! Input event sources
//!
//! Raw `(type, code, value)` events are decoded into [`InputEvent`]s here so
//! the translator only ever sees key actions and sync markers.
//!
//! Two sources are provided:
//! - [`EvdevSource`] reads an event device node such as `/dev/input/event3`
//! - [`StreamSource`] decodes native `struct input_event` records from any
//!   byte stream, stdin by default (`cat /dev/input/event3 | virtual-controller`)

use crate::error::SourceError;
use crate::names::EV_KEY;
use crate::translator::KeyAction;
use evdev::raw_stream::RawDevice;
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use std::ffi::c_long;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use zerocopy::{FromBytes, Immutable, KnownLayout};

/// Synchronization event type
pub const EV_SYN: u16 = 0x00;
/// End of an atomic batch of events
pub const SYN_REPORT: u16 = 0;
/// The kernel's event buffer overran; events were lost
pub const SYN_DROPPED: u16 = 3;

/// Events read per batch (matches a 64-record read buffer)
const BATCH_EVENTS: usize = 64;

/// Decoded input event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Key { code: u16, action: KeyAction },
    /// `SYN_REPORT`: the batch is complete
    SyncReport,
    /// `SYN_DROPPED`: events were lost until the next report
    SyncDropped,
    /// Anything else (scan codes, LEDs, unknown key values, ...)
    Other,
}

impl InputEvent {
    /// Decode a raw evdev event
    pub fn decode(event_type: u16, code: u16, value: i32) -> Self {
        match (event_type, code) {
            (EV_SYN, SYN_REPORT) => InputEvent::SyncReport,
            (EV_SYN, SYN_DROPPED) => InputEvent::SyncDropped,
            (EV_KEY, _) => match KeyAction::from_value(value) {
                Some(action) => InputEvent::Key { code, action },
                None => InputEvent::Other,
            },
            _ => InputEvent::Other,
        }
    }
}

/// Something that yields batches of input events
pub trait EventSource {
    /// Wait up to `timeout` for input. Returns false on timeout so the caller
    /// can check for shutdown between batches.
    fn wait(&mut self, _timeout: Duration) -> Result<bool, SourceError> {
        Ok(true)
    }

    /// Read the next batch of events. `None` means the input has ended.
    fn read_batch(&mut self) -> Result<Option<Vec<InputEvent>>, SourceError>;
}

/// Poll a file descriptor for readability
fn poll_readable(fd: impl AsFd, timeout: Duration) -> Result<bool, SourceError> {
    let mut fds = [PollFd::new(fd.as_fd(), PollFlags::POLLIN)];
    let millis = u16::try_from(timeout.as_millis()).unwrap_or(u16::MAX);

    match poll(&mut fds, PollTimeout::from(millis)) {
        Ok(ready) => Ok(ready > 0),
        Err(Errno::EINTR) => Ok(false),
        Err(e) => Err(SourceError::Read(e.into())),
    }
}

/// Event device node read through evdev
pub struct EvdevSource {
    device: RawDevice,
    path: PathBuf,
}

impl EvdevSource {
    /// Open an event device (e.g. `/dev/input/event3`)
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let device = RawDevice::open(path).map_err(|source| SourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            "Opened {} ({})",
            path.display(),
            device.name().unwrap_or("unnamed device")
        );
        Ok(Self {
            device,
            path: path.to_path_buf(),
        })
    }

    /// Take exclusive access so key presses are not also delivered to other
    /// applications
    pub fn grab(&mut self) -> Result<(), SourceError> {
        self.device.grab().map_err(SourceError::Grab)?;
        debug!("Grabbed {}", self.path.display());
        Ok(())
    }
}

impl EventSource for EvdevSource {
    fn wait(&mut self, timeout: Duration) -> Result<bool, SourceError> {
        // SAFETY: the descriptor belongs to `self.device`, which outlives the
        // borrow. RawDevice only exposes AsRawFd.
        let fd = unsafe { BorrowedFd::borrow_raw(self.device.as_raw_fd()) };
        poll_readable(fd, timeout)
    }

    fn read_batch(&mut self) -> Result<Option<Vec<InputEvent>>, SourceError> {
        match self.device.fetch_events() {
            Ok(events) => Ok(Some(
                events
                    .map(|e| InputEvent::decode(e.event_type().0, e.code(), e.value()))
                    .collect(),
            )),
            Err(e) if e.kind() == ErrorKind::Interrupted => Ok(Some(Vec::new())),
            Err(e) => Err(SourceError::Read(e)),
        }
    }
}

/// Native `struct input_event` layout (timeval followed by type/code/value)
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
#[repr(C)]
struct RawInputEvent {
    _tv_sec: c_long,
    _tv_usec: c_long,
    event_type: u16,
    code: u16,
    value: i32,
}

/// Size of one `struct input_event` record
pub const RAW_EVENT_SIZE: usize = std::mem::size_of::<RawInputEvent>();

/// Decodes `struct input_event` records from a byte stream
///
/// Readers backed by a descriptor must be unbuffered: [`EventSource::wait`]
/// polls the descriptor, so bytes parked in a userspace buffer would never
/// be reported as ready.
pub struct StreamSource<R> {
    reader: R,
    /// Descriptor polled by `wait`; `None` means the reader never blocks
    fd: Option<OwnedFd>,
    buf: Vec<u8>,
    filled: usize,
}

impl<R: Read> StreamSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            fd: None,
            buf: vec![0; BATCH_EVENTS * RAW_EVENT_SIZE],
            filled: 0,
        }
    }
}

impl StreamSource<File> {
    /// Read events straight from a descriptor such as a pipe
    pub fn from_fd(fd: OwnedFd) -> Result<Self, SourceError> {
        let poll_fd = fd.try_clone().map_err(SourceError::Read)?;
        Ok(Self {
            fd: Some(poll_fd),
            ..Self::new(File::from(fd))
        })
    }

    /// Read events from stdin without going through its buffered handle
    pub fn stdin() -> Result<Self, SourceError> {
        let fd = std::io::stdin()
            .as_fd()
            .try_clone_to_owned()
            .map_err(SourceError::Read)?;
        Self::from_fd(fd)
    }
}

impl<R: Read> EventSource for StreamSource<R> {
    fn wait(&mut self, timeout: Duration) -> Result<bool, SourceError> {
        match &self.fd {
            Some(fd) => poll_readable(fd, timeout),
            None => Ok(true),
        }
    }

    fn read_batch(&mut self) -> Result<Option<Vec<InputEvent>>, SourceError> {
        let read = match self.reader.read(&mut self.buf[self.filled..]) {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => return Ok(Some(Vec::new())),
            Err(e) => return Err(SourceError::Read(e)),
        };

        if read == 0 {
            if self.filled > 0 {
                return Err(SourceError::Truncated { len: self.filled });
            }
            return Ok(None);
        }
        self.filled += read;

        // Decode whole records, keep a partial one for the next read
        let whole = self.filled - self.filled % RAW_EVENT_SIZE;
        let events = self.buf[..whole]
            .chunks_exact(RAW_EVENT_SIZE)
            .filter_map(|chunk| RawInputEvent::read_from_bytes(chunk).ok())
            .map(|raw| InputEvent::decode(raw.event_type, raw.code, raw.value))
            .collect();
        self.buf.copy_within(whole..self.filled, 0);
        self.filled -= whole;

        Ok(Some(events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Encode a raw event the way the kernel lays it out
    fn raw(event_type: u16, code: u16, value: i32) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(RAW_EVENT_SIZE);
        bytes.extend_from_slice(&(1 as c_long).to_ne_bytes());
        bytes.extend_from_slice(&(2 as c_long).to_ne_bytes());
        bytes.extend_from_slice(&event_type.to_ne_bytes());
        bytes.extend_from_slice(&code.to_ne_bytes());
        bytes.extend_from_slice(&value.to_ne_bytes());
        bytes
    }

    #[test]
    fn test_decode() {
        assert_eq!(
            InputEvent::decode(EV_KEY, 30, 1),
            InputEvent::Key {
                code: 30,
                action: KeyAction::Press
            }
        );
        assert_eq!(
            InputEvent::decode(EV_KEY, 30, 2),
            InputEvent::Key {
                code: 30,
                action: KeyAction::Repeat
            }
        );
        assert_eq!(InputEvent::decode(EV_KEY, 30, 7), InputEvent::Other);
        assert_eq!(InputEvent::decode(EV_SYN, SYN_REPORT, 0), InputEvent::SyncReport);
        assert_eq!(InputEvent::decode(EV_SYN, SYN_DROPPED, 0), InputEvent::SyncDropped);
        // EV_MSC scan code
        assert_eq!(InputEvent::decode(0x04, 0x04, 0x70004), InputEvent::Other);
    }

    #[test]
    fn test_stream_decodes_records() {
        let mut bytes = raw(0x04, 0x04, 0x70004);
        bytes.extend(raw(EV_KEY, 30, 1));
        bytes.extend(raw(EV_SYN, SYN_REPORT, 0));

        let mut source = StreamSource::new(Cursor::new(bytes));
        assert!(source.wait(Duration::from_millis(10)).unwrap());
        let batch = source.read_batch().unwrap().unwrap();
        assert_eq!(
            batch,
            vec![
                InputEvent::Other,
                InputEvent::Key {
                    code: 30,
                    action: KeyAction::Press
                },
                InputEvent::SyncReport,
            ]
        );
        assert!(source.read_batch().unwrap().is_none());
    }

    /// Hands out the stream a few bytes at a time
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        step: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn test_stream_reassembles_split_records() {
        let mut data = raw(EV_KEY, 32, 1);
        data.extend(raw(EV_KEY, 32, 0));
        let mut source = StreamSource::new(Trickle {
            data,
            pos: 0,
            step: RAW_EVENT_SIZE / 2 + 1,
        });

        let mut events = Vec::new();
        while let Some(batch) = source.read_batch().unwrap() {
            events.extend(batch);
        }
        assert_eq!(
            events,
            vec![
                InputEvent::Key {
                    code: 32,
                    action: KeyAction::Press
                },
                InputEvent::Key {
                    code: 32,
                    action: KeyAction::Release
                },
            ]
        );
    }

    #[test]
    fn test_fd_stream_delivers_whole_burst() {
        use nix::unistd::pipe;
        use std::io::Write;

        // More records than one batch holds, in a single write
        let pairs = 50;
        let mut burst = Vec::new();
        for _ in 0..pairs {
            burst.extend(raw(EV_KEY, 36, 1));
            burst.extend(raw(EV_SYN, SYN_REPORT, 0));
            burst.extend(raw(EV_KEY, 36, 0));
            burst.extend(raw(EV_SYN, SYN_REPORT, 0));
        }
        assert!(burst.len() > BATCH_EVENTS * RAW_EVENT_SIZE);

        let (read_end, write_end) = pipe().unwrap();
        let mut writer = File::from(write_end);
        writer.write_all(&burst).unwrap();

        // The writer stays open, so only poll can say whether data is left
        let mut source = StreamSource::from_fd(read_end).unwrap();
        let mut events = Vec::new();
        while source.wait(Duration::from_millis(50)).unwrap() {
            events.extend(source.read_batch().unwrap().unwrap());
        }

        assert_eq!(events.len(), pairs * 4);
        let releases = events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    InputEvent::Key {
                        code: 36,
                        action: KeyAction::Release
                    }
                )
            })
            .count();
        assert_eq!(releases, pairs);
        drop(writer);
    }

    #[test]
    fn test_stream_truncated() {
        let mut bytes = raw(EV_KEY, 30, 1);
        bytes.extend_from_slice(&[0u8; 5]);
        let mut source = StreamSource::new(Cursor::new(bytes));

        assert_eq!(source.read_batch().unwrap().unwrap().len(), 1);
        assert!(matches!(
            source.read_batch(),
            Err(SourceError::Truncated { len: 5 })
        ));
    }
}
