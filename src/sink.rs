//! Output sinks
//!
//! The translator hands every output value to an [`OutputSink`] and closes
//! each frame with [`OutputSink::sync`]. [`crate::gamepad::VirtualGamepad`]
//! is the real sink; [`LogSink`] and [`Recorder`] are for dry runs and tests.

use crate::error::SinkError;
use crate::keymap::OutputKind;
use tracing::{debug, info};

/// Destination for translated gamepad events
pub trait OutputSink {
    /// Queue one button or axis value
    fn emit(&mut self, kind: OutputKind, code: u16, value: i32) -> Result<(), SinkError>;

    /// Mark the end of a frame: everything emitted since the last sync is
    /// applied together
    fn sync(&mut self) -> Result<(), SinkError>;
}

/// Sink that only logs what would be sent (`--dry-run`)
#[derive(Debug, Default)]
pub struct LogSink;

impl OutputSink for LogSink {
    fn emit(&mut self, kind: OutputKind, code: u16, value: i32) -> Result<(), SinkError> {
        info!("{} {} = {}", kind.as_str(), kind.code_name(code), value);
        Ok(())
    }

    fn sync(&mut self) -> Result<(), SinkError> {
        debug!("frame");
        Ok(())
    }
}

/// One thing a sink was asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emission {
    Value {
        kind: OutputKind,
        code: u16,
        value: i32,
    },
    Sync,
}

/// In-memory sink that records every emission
#[derive(Debug, Default)]
pub struct Recorder {
    emissions: Vec<Emission>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, in order
    pub fn emissions(&self) -> &[Emission] {
        &self.emissions
    }

    /// Recorded values without the sync markers
    pub fn values(&self) -> Vec<(OutputKind, u16, i32)> {
        self.emissions
            .iter()
            .filter_map(|e| match *e {
                Emission::Value { kind, code, value } => Some((kind, code, value)),
                Emission::Sync => None,
            })
            .collect()
    }

    /// Number of completed frames
    pub fn frames(&self) -> usize {
        self.emissions
            .iter()
            .filter(|e| matches!(e, Emission::Sync))
            .count()
    }
}

impl OutputSink for Recorder {
    fn emit(&mut self, kind: OutputKind, code: u16, value: i32) -> Result<(), SinkError> {
        self.emissions.push(Emission::Value { kind, code, value });
        Ok(())
    }

    fn sync(&mut self) -> Result<(), SinkError> {
        self.emissions.push(Emission::Sync);
        Ok(())
    }
}
