//! Playback session: re-emits an [`EventLog`] as synthetic input
//!
//! Each pass records its own start instant and schedules every event at
//! `pass_start + elapsed / speed`. Targets are absolute, so a late wakeup
//! delays one event without shifting the rest of the pass.
//!
//! Cancellation is cooperative. The run checks its [`CancelToken`] before
//! waiting and again before firing; the wait itself returns as soon as
//! `cancel()` is called.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use super::types::{EventLog, PlaybackReport};
use crate::backend::InputSink;
use crate::error::Result;
use crate::types::Event;

/// Longest single blocking wait while sleeping towards a target time
pub const MAX_WAIT_SLICE: Duration = Duration::from_millis(100);

/// Slowest and fastest speed multipliers the UI offers
pub const MIN_SPEED: u32 = 1;
pub const MAX_SPEED: u32 = 10;

/// Cooperative cancellation flag with a wakeup for sleepers
#[derive(Debug)]
pub struct CancelToken {
    cancelled: AtomicBool,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (wake_tx, wake_rx) = bounded(1);
        Self {
            cancelled: AtomicBool::new(false),
            wake_tx,
            wake_rx,
        }
    }

    /// Request cancellation; safe to call from any thread, any number of times
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        let _ = self.wake_tx.try_send(());
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Block until `deadline`; returns `true` if cancelled first
    pub fn sleep_until(&self, deadline: Instant) -> bool {
        loop {
            if self.is_cancelled() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let wake_at = deadline.min(now + MAX_WAIT_SLICE);
            match self.wake_rx.recv_deadline(wake_at) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => return self.is_cancelled(),
                Err(RecvTimeoutError::Timeout) => {}
            }
        }
    }

    /// Block until cancelled, for targets too far out to schedule
    pub fn wait(&self) {
        while !self.is_cancelled() {
            let _ = self.wake_rx.recv_timeout(MAX_WAIT_SLICE);
        }
    }
}

/// Parameters read once at the start of a playback run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackOptions {
    speed: u32,
    loop_playback: bool,
}

impl PlaybackOptions {
    /// A speed below 1 is treated as 1
    pub fn new(speed: i64, loop_playback: bool) -> Self {
        let speed = speed.clamp(MIN_SPEED as i64, u32::MAX as i64) as u32;
        Self {
            speed,
            loop_playback,
        }
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn loop_playback(&self) -> bool {
        self.loop_playback
    }

    /// Wall-clock offset of an event within its pass
    ///
    /// `None` when the offset does not fit in a `Duration`.
    pub fn scaled_offset(&self, elapsed: f64) -> Option<Duration> {
        Duration::try_from_secs_f64(elapsed / self.speed as f64).ok()
    }
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self::new(1, false)
    }
}

/// Replays a log against an input sink
pub struct PlaybackSession<'a> {
    log: &'a EventLog,
    options: PlaybackOptions,
    sink: &'a dyn InputSink,
    cancel: &'a CancelToken,
}

impl<'a> PlaybackSession<'a> {
    pub fn new(
        log: &'a EventLog,
        options: PlaybackOptions,
        sink: &'a dyn InputSink,
        cancel: &'a CancelToken,
    ) -> Self {
        Self {
            log,
            options,
            sink,
            cancel,
        }
    }

    /// Run to completion or cancellation
    ///
    /// `on_pass` is called with the 1-based pass number as each pass begins.
    pub fn run(&self, mut on_pass: impl FnMut(u32)) -> PlaybackReport {
        let run_start = Instant::now();
        let total_events = self.log.len();
        let mut passes: u32 = 0;

        loop {
            passes = next_pass(passes);
            on_pass(passes);
            let pass_start = Instant::now();

            for (index, timed) in self.log.iter().enumerate() {
                if self.cancel.is_cancelled() {
                    return self.report(passes, index, true, run_start);
                }

                let target = self
                    .options
                    .scaled_offset(timed.elapsed)
                    .and_then(|offset| pass_start.checked_add(offset));
                let cancelled = match target {
                    Some(target) => self.cancel.sleep_until(target),
                    None => {
                        tracing::warn!(
                            "Event {} at {}s is beyond any reachable time; waiting for stop",
                            index,
                            timed.elapsed
                        );
                        self.cancel.wait();
                        true
                    }
                };
                if cancelled {
                    return self.report(passes, index, true, run_start);
                }

                if let Err(e) = fire(self.sink, &timed.event) {
                    tracing::debug!("Synthetic {} not delivered: {}", timed.event.kind_name(), e);
                }
            }

            if !self.options.loop_playback || self.cancel.is_cancelled() {
                let cancelled = self.cancel.is_cancelled();
                return self.report(passes, total_events, cancelled, run_start);
            }
            tracing::trace!("Playback pass {} complete, looping", passes);
        }
    }

    fn report(
        &self,
        passes: u32,
        events_completed: usize,
        cancelled: bool,
        run_start: Instant,
    ) -> PlaybackReport {
        PlaybackReport {
            passes,
            events_completed,
            total_events: self.log.len(),
            cancelled,
            elapsed: run_start.elapsed(),
        }
    }
}

/// Pass counter step; an endless loop sticks at the last pass number
fn next_pass(passes: u32) -> u32 {
    passes.saturating_add(1)
}

/// Emit one event through the sink
pub fn fire(sink: &dyn InputSink, event: &Event) -> Result<()> {
    match *event {
        Event::Move { x, y } => sink.move_to(x, y),
        Event::Click {
            x,
            y,
            button,
            action,
        } => {
            sink.move_to(x, y)?;
            sink.button(button, action)
        }
        Event::Scroll { x, y, dx, dy } => {
            sink.move_to(x, y)?;
            sink.scroll(dx, dy)
        }
        Event::KeyPress { key } => sink.key(key, crate::types::ButtonAction::Press),
        Event::KeyRelease { key } => sink.key(key, crate::types::ButtonAction::Release),
    }
}
