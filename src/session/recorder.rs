//! Capture session: turns asynchronous input notifications into an [`EventLog`]
//!
//! Notification callbacks never touch the log. They take a timestamp and push
//! the event into a bounded crossbeam queue; a single consumer thread owns the
//! log and appends in arrival order. Stopping detaches the tap from the hub
//! (which waits for in-flight deliveries), drops the last sender, and joins
//! the consumer once it has drained the queue.

use crossbeam_channel::{bounded, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::types::EventLog;
use crate::backend::{InputHub, InputObserver};
use crate::error::Result;
use crate::types::{Event, InputChannel, TimedEvent};

/// Queue capacity between notification callbacks and the consumer
pub const CAPTURE_QUEUE_CAPACITY: usize = 65_536;

/// Producer side of the capture queue, attached to the hub while recording
struct CaptureTap {
    started: Instant,
    tx: Sender<TimedEvent>,
}

impl InputObserver for CaptureTap {
    fn observe(&self, event: &Event) {
        let elapsed = self.started.elapsed().as_secs_f64();
        if self.tx.send(TimedEvent::new(elapsed, event.clone())).is_err() {
            tracing::warn!("Capture consumer gone, dropping {} event", event.kind_name());
        }
    }
}

/// An active recording
#[derive(Debug)]
pub struct CaptureSession {
    hub: InputHub,
    started: Instant,
    consumer: Option<JoinHandle<EventLog>>,
}

impl CaptureSession {
    /// Start capturing from the hub into a fresh log
    pub fn start(hub: &InputHub) -> Result<Self> {
        let (tx, rx) = bounded::<TimedEvent>(CAPTURE_QUEUE_CAPACITY);

        let consumer = thread::Builder::new()
            .name("capture-consumer".into())
            .spawn(move || {
                let mut log = EventLog::new();
                for timed in rx.iter() {
                    log.push_captured(timed);
                }
                log
            })?;

        let started = Instant::now();
        // The consumer exits on its own once this tap (the only sender) is dropped.
        hub.attach_capture(Arc::new(CaptureTap { started, tx }))?;

        tracing::info!("Capture session started");
        Ok(Self {
            hub: hub.clone(),
            started,
            consumer: Some(consumer),
        })
    }

    pub fn is_active(&self) -> bool {
        self.consumer.is_some()
    }

    /// Time since the session started
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Stop capturing and return the final log
    ///
    /// Returns `None` if the session was already stopped.
    pub fn stop(&mut self) -> Option<EventLog> {
        let consumer = self.consumer.take()?;
        drop(self.hub.detach_capture());

        match consumer.join() {
            Ok(log) => {
                let keyboard = log.count_where(|e| e.channel() == InputChannel::Keyboard);
                tracing::info!(
                    "Capture session stopped after {:.2?}: {} events ({} pointer, {} keyboard)",
                    self.elapsed(),
                    log.len(),
                    log.len() - keyboard,
                    keyboard
                );
                Some(log)
            }
            Err(_) => {
                tracing::error!("Capture consumer panicked; recording lost");
                Some(EventLog::new())
            }
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if self.consumer.is_some() {
            drop(self.hub.detach_capture());
        }
    }
}
