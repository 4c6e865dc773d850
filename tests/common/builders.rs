//! Test data builders for creating test objects

use inputrec_rs::types::{ButtonAction, MouseButton, NamedKey};
use inputrec_rs::{Event, EventLog, KeySymbol, TimedEvent};

/// Builder for creating test EventLogs
///
/// Events are appended at an explicit offset or `step` seconds after the
/// previous one.
pub struct EventLogBuilder {
    events: Vec<TimedEvent>,
    cursor: f64,
    step: f64,
}

impl Default for EventLogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLogBuilder {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            cursor: 0.0,
            step: 0.01,
        }
    }

    /// Gap inserted before each following event
    pub fn step(mut self, seconds: f64) -> Self {
        self.step = seconds;
        self
    }

    /// Place the next event at an absolute offset
    pub fn at(mut self, seconds: f64) -> Self {
        self.cursor = seconds;
        self
    }

    pub fn event(mut self, event: Event) -> Self {
        self.events.push(TimedEvent::new(self.cursor, event));
        self.cursor += self.step;
        self
    }

    pub fn moves(mut self, count: i32) -> Self {
        for i in 0..count {
            self = self.event(Event::Move { x: i, y: i * 2 });
        }
        self
    }

    pub fn click(self, x: i32, y: i32) -> Self {
        self.event(Event::Click {
            x,
            y,
            button: MouseButton::Left,
            action: ButtonAction::Press,
        })
        .event(Event::Click {
            x,
            y,
            button: MouseButton::Left,
            action: ButtonAction::Release,
        })
    }

    pub fn type_char(self, c: char) -> Self {
        self.event(Event::KeyPress {
            key: KeySymbol::Char(c),
        })
        .event(Event::KeyRelease {
            key: KeySymbol::Char(c),
        })
    }

    pub fn tap(self, key: NamedKey) -> Self {
        self.event(Event::KeyPress {
            key: KeySymbol::Named(key),
        })
        .event(Event::KeyRelease {
            key: KeySymbol::Named(key),
        })
    }

    pub fn build(self) -> EventLog {
        EventLog::from_events(self.events).expect("builder produces ordered events")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_builder() {
        let log = EventLogBuilder::new()
            .step(0.5)
            .moves(2)
            .click(3, 4)
            .at(10.0)
            .type_char('q')
            .build();

        assert_eq!(log.len(), 6);
        assert_eq!(log.events()[1].elapsed, 0.5);
        assert_eq!(log.events()[4].elapsed, 10.0);
    }
}
