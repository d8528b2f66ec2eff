//! Remix scheduler
//!
//! The scheduler owns the playback session and every timer that belongs to
//! it. A *pass* is one run through the active sequence: a fire event per
//! entry at its start offset plus a continuation at the end of the last
//! entry. Fired entries arm a cleanup event once their slice and release
//! have elapsed.
//!
//! # States
//!
//! ```text
//!            start                 hold_press
//!   Idle ────────────▶ Scheduling ───────────▶ Holding
//!    ▲                  │  ▲ │                   │
//!    │        stop      │  │ └── reschedule ──┐  │ hold_release
//!    └──────────────────┘  └──────────────────┘  │
//!    ▲                     ▲                     │
//!    │                     └─────────────────────┘
//!    └──────────────── stop (from any state) ────
//! ```
//!
//! Every reschedule cancels the previous pass before arming the next one, so
//! at most one pass is ever armed. Events carry their pass number and the
//! engine drops any that do not match the current pass.
//!
//! The scheduler never plays audio. It hands events back to the engine via
//! [`EventScheduler::pop_due`], and the engine decides what each one means.

use std::collections::HashSet;

use slotmap::SlotMap;
use tracing::debug;

use super::timer::{AudioClock, TimerFacility, TimerHandle, TimerQueue};
use crate::io::bridge::DelayPhaseId;
use crate::sequencing::{Bpm, NoteValue, Sequence};

/// Timer payloads understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RemixEvent {
    /// Play entry `index` of the sequence armed in `pass`.
    Fire { pass: u64, index: usize },
    /// Entry `index` finished its slice and release.
    Cleanup {
        pass: u64,
        index: usize,
        fire: TimerHandle,
    },
    /// The last entry of `pass` ended; generate the next sequence.
    Continuation { pass: u64 },
    /// Re-trigger the current entry while holding.
    HoldTick,
    /// A release tail finished.
    DelayPhaseEnd(DelayPhaseId),
}

/// A pending fire event, as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledEvent {
    pub fire_at_ms: f64,
    pub sequence_index: usize,
    pub handle: TimerHandle,
}

/// The release-tail window of one fired slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayPhaseMarker {
    pub note_value: NoteValue,
    /// Audio-clock seconds
    pub start_time: f64,
    pub end_time: f64,
    timer: TimerHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Scheduling,
    /// Scheduling with the hold ticker running on top.
    Holding,
}

/// Bookkeeping for one remix session, from start to stop.
#[derive(Debug, Clone, Default)]
pub struct PlaybackSession {
    pub is_remixing: bool,
    pub is_holding: bool,
    pub current_index: usize,
    pub active_sequence: Option<Sequence>,
    /// Start frame of the most recent non-held slice.
    pub last_start: Option<usize>,
    pub pass: u64,
}

#[derive(Debug, Default)]
pub struct EventScheduler {
    timers: TimerQueue<RemixEvent>,
    session: PlaybackSession,
    /// Timers belonging to the current pass (fires, cleanups, continuation).
    pass_events: HashSet<TimerHandle>,
    hold_ticker: Option<TimerHandle>,
    hold_interval_ms: f64,
    delay_phases: SlotMap<DelayPhaseId, DelayPhaseMarker>,
}

impl EventScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SchedulerState {
        match (self.session.is_remixing, self.session.is_holding) {
            (false, _) => SchedulerState::Idle,
            (true, false) => SchedulerState::Scheduling,
            (true, true) => SchedulerState::Holding,
        }
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    /// Leave Idle with `sequence` and arm its first pass from the current
    /// clock time. Returns the pass number.
    pub fn start(&mut self, sequence: Sequence) -> u64 {
        self.session.is_remixing = true;
        self.session.current_index = 0;
        self.session.last_start = None;
        self.session.active_sequence = Some(sequence);
        self.arm_pass()
    }

    /// Swap in a freshly generated sequence and arm it from now.
    pub fn reschedule(&mut self, sequence: Sequence) -> u64 {
        self.session.active_sequence = Some(sequence);
        self.arm_pass()
    }

    /// Recompute the durations of the active sequence for a new tempo and
    /// re-arm it. Note values are preserved.
    pub fn retime(&mut self, bpm: Bpm) -> Option<u64> {
        let sequence = self.session.active_sequence.as_mut()?;
        sequence.retime(bpm);
        Some(self.arm_pass())
    }

    fn cancel_pass(&mut self) {
        for handle in self.pass_events.drain() {
            self.timers.cancel(handle);
        }
    }

    fn arm_pass(&mut self) -> u64 {
        self.cancel_pass();
        self.session.pass += 1;
        let pass = self.session.pass;

        let Some(sequence) = self.session.active_sequence.as_ref() else {
            return pass;
        };

        let offsets: Vec<f64> = sequence.offsets().collect();
        let total_ms = sequence.total_ms();
        for (index, offset) in offsets.into_iter().enumerate() {
            let handle = self.timers.schedule(RemixEvent::Fire { pass, index }, offset);
            self.pass_events.insert(handle);
        }
        let handle = self.timers.schedule(RemixEvent::Continuation { pass }, total_ms);
        self.pass_events.insert(handle);

        debug!(pass, entries = self.pass_events.len() - 1, total_ms, "armed pass");
        pass
    }

    /// Start re-triggering the current entry every `interval_ms`. The first
    /// tick comes one interval after the press. Returns false when not
    /// remixing or already holding.
    pub fn hold_press(&mut self, interval_ms: f64) -> bool {
        if !self.session.is_remixing || self.session.is_holding {
            return false;
        }
        self.session.is_holding = true;
        self.hold_interval_ms = interval_ms;
        self.hold_ticker = Some(self.timers.schedule(RemixEvent::HoldTick, interval_ms));
        true
    }

    pub fn hold_release(&mut self) -> bool {
        if !self.session.is_holding {
            return false;
        }
        self.session.is_holding = false;
        if let Some(ticker) = self.hold_ticker.take() {
            self.timers.cancel(ticker);
        }
        true
    }

    /// Arm the next hold tick after one has fired.
    pub fn rearm_hold(&mut self) {
        if self.session.is_holding {
            self.hold_ticker = Some(
                self.timers
                    .schedule(RemixEvent::HoldTick, self.hold_interval_ms),
            );
        }
    }

    /// Cancel everything and return to Idle. Returns the delay-phase markers
    /// that were still open so the caller can report their end.
    pub fn stop(&mut self) -> Vec<DelayPhaseId> {
        self.cancel_pass();
        self.timers.clear();
        self.hold_ticker = None;

        let open: Vec<DelayPhaseId> = self.delay_phases.keys().collect();
        self.delay_phases.clear();

        let pass = self.session.pass;
        self.session = PlaybackSession {
            pass,
            ..PlaybackSession::default()
        };
        open
    }

    pub fn next_due_ms(&mut self) -> Option<f64> {
        self.timers.next_due_ms()
    }

    /// Pop the next event due at or before `until_ms`.
    pub fn pop_due(&mut self, until_ms: f64) -> Option<(TimerHandle, RemixEvent)> {
        let (handle, event) = self.timers.pop_due(until_ms)?;
        if matches!(event, RemixEvent::HoldTick) && self.hold_ticker == Some(handle) {
            self.hold_ticker = None;
        }
        if matches!(event, RemixEvent::Continuation { .. }) {
            self.pass_events.remove(&handle);
        }
        Some((handle, event))
    }

    /// True if `pass` is the pass currently armed.
    pub fn accepts(&self, pass: u64) -> bool {
        self.session.is_remixing && pass == self.session.pass
    }

    /// Record that entry `index` fired and arm its cleanup `delay_ms` later.
    pub fn mark_fired(&mut self, index: usize, fire: TimerHandle, delay_ms: f64) -> TimerHandle {
        self.session.current_index = index;
        let pass = self.session.pass;
        let cleanup = self
            .timers
            .schedule(RemixEvent::Cleanup { pass, index, fire }, delay_ms);
        self.pass_events.insert(cleanup);
        cleanup
    }

    /// Forget a finished fire/cleanup pair.
    pub fn retire(&mut self, fire: TimerHandle, cleanup: TimerHandle) {
        self.pass_events.remove(&fire);
        self.pass_events.remove(&cleanup);
    }

    /// Open a delay-phase marker spanning the release tail of a slice that
    /// fires now. Nothing is opened when `release_ms` is zero.
    pub fn open_delay_phase(
        &mut self,
        note_value: NoteValue,
        slice_ms: f64,
        release_ms: f64,
    ) -> Option<(DelayPhaseId, DelayPhaseMarker)> {
        if release_ms <= 0.0 {
            return None;
        }

        let now = self.timers.now();
        let start_time = now + slice_ms / 1000.0;
        let end_time = start_time + release_ms / 1000.0;
        let id = self.delay_phases.insert(DelayPhaseMarker {
            note_value,
            start_time,
            end_time,
            timer: TimerHandle::default(),
        });
        let timer = self
            .timers
            .schedule(RemixEvent::DelayPhaseEnd(id), slice_ms + release_ms);
        let marker = self.delay_phases.get_mut(id)?;
        marker.timer = timer;
        Some((id, *marker))
    }

    /// Close a delay-phase marker. Returns false if it was already closed.
    pub fn close_delay_phase(&mut self, id: DelayPhaseId) -> bool {
        match self.delay_phases.remove(id) {
            Some(marker) => {
                self.timers.cancel(marker.timer);
                true
            }
            None => false,
        }
    }

    pub fn delay_phases(&self) -> impl Iterator<Item = (DelayPhaseId, &DelayPhaseMarker)> {
        self.delay_phases.iter()
    }

    pub fn set_last_start(&mut self, start: Option<usize>) {
        self.session.last_start = start;
    }

    pub fn last_start(&self) -> Option<usize> {
        self.session.last_start
    }

    /// Timers of every kind still waiting to fire.
    pub fn pending_event_count(&self) -> usize {
        self.timers.len()
    }

    /// Fires and cleanups of the current pass that have not completed.
    pub fn active_event_count(&self) -> usize {
        self.pass_events.len()
    }

    /// Pending fire events of the current pass, in firing order.
    pub fn scheduled_events(&self) -> Vec<ScheduledEvent> {
        let pass = self.session.pass;
        let mut events: Vec<ScheduledEvent> = self
            .timers
            .iter()
            .filter_map(|(handle, fire_at_ms, event)| match *event {
                RemixEvent::Fire { pass: p, index } if p == pass => Some(ScheduledEvent {
                    fire_at_ms,
                    sequence_index: index,
                    handle,
                }),
                _ => None,
            })
            .collect();
        events.sort_by(|a, b| {
            a.fire_at_ms
                .total_cmp(&b.fire_at_ms)
                .then(a.sequence_index.cmp(&b.sequence_index))
        });
        events
    }

    pub fn current_index(&self) -> usize {
        self.session.current_index
    }

    pub fn is_remixing(&self) -> bool {
        self.session.is_remixing
    }

    pub fn is_holding(&self) -> bool {
        self.session.is_holding
    }

    pub fn active_sequence(&self) -> Option<&Sequence> {
        self.session.active_sequence.as_ref()
    }

    pub fn pass(&self) -> u64 {
        self.session.pass
    }

    pub fn now_ms(&self) -> f64 {
        self.timers.now_ms()
    }

    pub fn advance_to(&mut self, now_ms: f64) {
        self.timers.advance_to(now_ms);
    }
}
