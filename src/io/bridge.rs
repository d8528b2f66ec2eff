//! Visualization bridge
//!
//! The engine reports what it is doing through a [`VisualizationBridge`]. The
//! callbacks run on whatever thread drives the engine, usually the audio
//! callback, so implementations must not block.
//!
//! Three implementations ship with the crate:
//!
//!   NullBridge        discards everything
//!   Vec<BridgeEvent>  records events in order (tests, offline renders)
//!   RingBridge        pushes events into an `rtrb` ring buffer for a UI thread

use slotmap::new_key_type;

use crate::sequencing::NoteValue;

new_key_type! {
    /// Identifies one delay-phase marker from start to end.
    pub struct DelayPhaseId;
}

pub trait VisualizationBridge {
    /// A slice began playing from `start_sample` for `duration_samples`.
    fn on_slice_start(&mut self, _start_sample: usize, _duration_samples: usize) {}

    /// The sequence position changed or a step finished.
    fn on_sequence_progress(&mut self, _index: usize, _total: usize, _active_events: usize) {}

    /// A slice entered its release tail. Times are audio-clock seconds.
    fn on_delay_phase_start(
        &mut self,
        _id: DelayPhaseId,
        _note_value: NoteValue,
        _start_time: f64,
        _end_time: f64,
    ) {
    }

    fn on_delay_phase_end(&mut self, _id: DelayPhaseId) {}
}

/// One bridge callback captured as a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BridgeEvent {
    SliceStart {
        start_sample: usize,
        duration_samples: usize,
    },
    SequenceProgress {
        index: usize,
        total: usize,
        active_events: usize,
    },
    DelayPhaseStart {
        id: DelayPhaseId,
        note_value: NoteValue,
        start_time: f64,
        end_time: f64,
    },
    DelayPhaseEnd {
        id: DelayPhaseId,
    },
}

impl BridgeEvent {
    /// Replay this event against another bridge.
    pub fn dispatch(self, bridge: &mut impl VisualizationBridge) {
        match self {
            BridgeEvent::SliceStart {
                start_sample,
                duration_samples,
            } => bridge.on_slice_start(start_sample, duration_samples),
            BridgeEvent::SequenceProgress {
                index,
                total,
                active_events,
            } => bridge.on_sequence_progress(index, total, active_events),
            BridgeEvent::DelayPhaseStart {
                id,
                note_value,
                start_time,
                end_time,
            } => bridge.on_delay_phase_start(id, note_value, start_time, end_time),
            BridgeEvent::DelayPhaseEnd { id } => bridge.on_delay_phase_end(id),
        }
    }
}

/// Discards every callback.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBridge;

impl VisualizationBridge for NullBridge {}

/// Records every callback in order.
impl VisualizationBridge for Vec<BridgeEvent> {
    fn on_slice_start(&mut self, start_sample: usize, duration_samples: usize) {
        self.push(BridgeEvent::SliceStart {
            start_sample,
            duration_samples,
        });
    }

    fn on_sequence_progress(&mut self, index: usize, total: usize, active_events: usize) {
        self.push(BridgeEvent::SequenceProgress {
            index,
            total,
            active_events,
        });
    }

    fn on_delay_phase_start(
        &mut self,
        id: DelayPhaseId,
        note_value: NoteValue,
        start_time: f64,
        end_time: f64,
    ) {
        self.push(BridgeEvent::DelayPhaseStart {
            id,
            note_value,
            start_time,
            end_time,
        });
    }

    fn on_delay_phase_end(&mut self, id: DelayPhaseId) {
        self.push(BridgeEvent::DelayPhaseEnd { id });
    }
}

impl<B: VisualizationBridge + ?Sized> VisualizationBridge for Box<B> {
    fn on_slice_start(&mut self, start_sample: usize, duration_samples: usize) {
        (**self).on_slice_start(start_sample, duration_samples)
    }

    fn on_sequence_progress(&mut self, index: usize, total: usize, active_events: usize) {
        (**self).on_sequence_progress(index, total, active_events)
    }

    fn on_delay_phase_start(
        &mut self,
        id: DelayPhaseId,
        note_value: NoteValue,
        start_time: f64,
        end_time: f64,
    ) {
        (**self).on_delay_phase_start(id, note_value, start_time, end_time)
    }

    fn on_delay_phase_end(&mut self, id: DelayPhaseId) {
        (**self).on_delay_phase_end(id)
    }
}

#[cfg(feature = "rtrb")]
pub use ring::RingBridge;

#[cfg(feature = "rtrb")]
mod ring {
    use rtrb::{Consumer, Producer, RingBuffer};

    use super::{BridgeEvent, DelayPhaseId, VisualizationBridge};
    use crate::sequencing::NoteValue;

    /// Lock-free hand-off of bridge events to another thread.
    ///
    /// When the ring is full new events are dropped and counted; the audio
    /// thread never waits on the reader.
    pub struct RingBridge {
        tx: Producer<BridgeEvent>,
        dropped: usize,
    }

    impl RingBridge {
        pub fn new(capacity: usize) -> (Self, Consumer<BridgeEvent>) {
            let (tx, rx) = RingBuffer::new(capacity);
            (Self { tx, dropped: 0 }, rx)
        }

        /// Events lost to a full ring since creation.
        pub fn dropped(&self) -> usize {
            self.dropped
        }

        fn send(&mut self, event: BridgeEvent) {
            if self.tx.push(event).is_err() {
                self.dropped += 1;
            }
        }
    }

    impl VisualizationBridge for RingBridge {
        fn on_slice_start(&mut self, start_sample: usize, duration_samples: usize) {
            self.send(BridgeEvent::SliceStart {
                start_sample,
                duration_samples,
            });
        }

        fn on_sequence_progress(&mut self, index: usize, total: usize, active_events: usize) {
            self.send(BridgeEvent::SequenceProgress {
                index,
                total,
                active_events,
            });
        }

        fn on_delay_phase_start(
            &mut self,
            id: DelayPhaseId,
            note_value: NoteValue,
            start_time: f64,
            end_time: f64,
        ) {
            self.send(BridgeEvent::DelayPhaseStart {
                id,
                note_value,
                start_time,
                end_time,
            });
        }

        fn on_delay_phase_end(&mut self, id: DelayPhaseId) {
            self.send(BridgeEvent::DelayPhaseEnd { id });
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_ring_delivers_in_order_and_counts_drops() {
            let (mut bridge, mut rx) = RingBridge::new(2);
            bridge.on_slice_start(10, 20);
            bridge.on_sequence_progress(1, 128, 2);
            bridge.on_sequence_progress(2, 128, 2);

            assert_eq!(bridge.dropped(), 1);
            assert_eq!(
                rx.pop().unwrap(),
                BridgeEvent::SliceStart {
                    start_sample: 10,
                    duration_samples: 20
                }
            );
            assert!(matches!(
                rx.pop().unwrap(),
                BridgeEvent::SequenceProgress { index: 1, .. }
            ));
            assert!(rx.pop().is_err());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_replays_into_another_bridge() {
        let mut recorded: Vec<BridgeEvent> = Vec::new();
        recorded.on_slice_start(5, 50);
        recorded.on_sequence_progress(3, 128, 1);

        let mut replayed: Vec<BridgeEvent> = Vec::new();
        for event in recorded.iter().copied() {
            event.dispatch(&mut replayed);
        }
        assert_eq!(recorded, replayed);
    }
}
