//! Batch dispatch and the translation loop
//!
//! When the kernel reports `SYN_DROPPED`, the events up to the next
//! `SYN_REPORT` are an incomplete picture of the keyboard. [`Dispatcher`]
//! discards key events inside that window and forwards everything else to the
//! [`Translator`] in arrival order.

use crate::error::{RunError, SinkError};
use crate::keymap::KeyMap;
use crate::sink::OutputSink;
use crate::source::{EventSource, InputEvent};
use crate::translator::Translator;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, trace};

/// How long to wait for input before rechecking the shutdown flag
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Routes decoded input events to the translator
pub struct Dispatcher<'a> {
    translator: Translator<'a>,
    dropping: bool,
}

impl<'a> Dispatcher<'a> {
    pub fn new(translator: Translator<'a>) -> Self {
        Self {
            translator,
            dropping: false,
        }
    }

    /// True between `SYN_DROPPED` and the next `SYN_REPORT`
    pub fn is_dropping(&self) -> bool {
        self.dropping
    }

    pub fn translator(&self) -> &Translator<'a> {
        &self.translator
    }

    /// Handle one event
    pub fn dispatch<S: OutputSink + ?Sized>(
        &mut self,
        event: &InputEvent,
        sink: &mut S,
    ) -> Result<(), SinkError> {
        match *event {
            InputEvent::SyncDropped => {
                if !self.dropping {
                    debug!("Input events dropped, ignoring keys until next report");
                }
                self.dropping = true;
            }
            InputEvent::SyncReport => {
                self.dropping = false;
            }
            InputEvent::Key { code, action } if self.dropping => {
                trace!("key {code} {action:?} ignored inside drop window");
            }
            InputEvent::Key { code, action } => {
                self.translator.handle(code, action, sink)?;
            }
            InputEvent::Other => {}
        }
        Ok(())
    }

    /// Handle a batch in order, stopping at the first sink error
    pub fn dispatch_batch<S: OutputSink + ?Sized>(
        &mut self,
        events: &[InputEvent],
        sink: &mut S,
    ) -> Result<(), SinkError> {
        for event in events {
            self.dispatch(event, sink)?;
        }
        Ok(())
    }
}

/// Run the translation loop until `running` is cleared or the input ends.
///
/// Shutdown is checked between batches, never in the middle of one.
pub fn pump<I, O>(
    source: &mut I,
    sink: &mut O,
    keymap: &mut KeyMap,
    running: &AtomicBool,
) -> Result<(), RunError>
where
    I: EventSource + ?Sized,
    O: OutputSink + ?Sized,
{
    let mut dispatcher = Dispatcher::new(Translator::new(keymap));

    while running.load(Ordering::SeqCst) {
        if !source.wait(POLL_INTERVAL)? {
            continue;
        }
        let Some(batch) = source.read_batch()? else {
            info!("Input stream ended");
            break;
        };
        dispatcher.dispatch_batch(&batch, sink)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Location;
    use crate::keymap::{BindingRecord, OutputKind, AXIS_MAX, AXIS_MIN};
    use crate::names::EV_ABS;
    use crate::sink::Recorder;
    use crate::translator::KeyAction;

    const KEY_A: u16 = 30;
    const KEY_D: u16 = 32;

    fn axis_keymap() -> KeyMap {
        KeyMap::build([
            BindingRecord {
                key: KEY_A.into(),
                event_type: EV_ABS,
                code: 0,
                value: AXIS_MIN,
                at: Location::record(0),
            },
            BindingRecord {
                key: KEY_D.into(),
                event_type: EV_ABS,
                code: 0,
                value: AXIS_MAX,
                at: Location::record(1),
            },
        ])
        .unwrap()
    }

    fn key(code: u16, action: KeyAction) -> InputEvent {
        InputEvent::Key { code, action }
    }

    #[test]
    fn test_drop_window_suppresses_keys() {
        let mut keymap = axis_keymap();
        let mut dispatcher = Dispatcher::new(Translator::new(&mut keymap));
        let mut sink = Recorder::new();

        dispatcher
            .dispatch_batch(
                &[
                    key(KEY_A, KeyAction::Press),
                    InputEvent::SyncDropped,
                    key(KEY_D, KeyAction::Press),
                    InputEvent::SyncReport,
                    key(KEY_A, KeyAction::Release),
                ],
                &mut sink,
            )
            .unwrap();

        assert!(!dispatcher.is_dropping());
        assert_eq!(
            sink.values(),
            vec![(OutputKind::Axis, 0, AXIS_MIN), (OutputKind::Axis, 0, 0)]
        );
    }

    #[test]
    fn test_drop_window_spans_batches() {
        let mut keymap = axis_keymap();
        let mut dispatcher = Dispatcher::new(Translator::new(&mut keymap));
        let mut sink = Recorder::new();

        dispatcher
            .dispatch_batch(&[InputEvent::SyncDropped], &mut sink)
            .unwrap();
        assert!(dispatcher.is_dropping());
        dispatcher
            .dispatch_batch(&[key(KEY_D, KeyAction::Press)], &mut sink)
            .unwrap();
        assert!(sink.emissions().is_empty());
        assert!(dispatcher
            .translator()
            .keymap()
            .lookup(KEY_D)
            .is_some_and(|b| !b.holding));

        dispatcher
            .dispatch_batch(
                &[InputEvent::SyncReport, key(KEY_D, KeyAction::Press)],
                &mut sink,
            )
            .unwrap();
        assert_eq!(sink.values(), vec![(OutputKind::Axis, 0, AXIS_MAX)]);
    }

    #[test]
    fn test_other_events_ignored() {
        let mut keymap = axis_keymap();
        let mut dispatcher = Dispatcher::new(Translator::new(&mut keymap));
        let mut sink = Recorder::new();

        dispatcher
            .dispatch_batch(&[InputEvent::Other, InputEvent::SyncReport], &mut sink)
            .unwrap();
        assert!(sink.emissions().is_empty());
    }
}
