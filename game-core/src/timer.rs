use chrono::{DateTime, Utc};

/// One-shot deadline owned by a single component.
///
/// The owner's event loop polls [`Timer::fire`]; a fired or cancelled timer
/// stays disarmed until armed again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timer {
    due: Option<DateTime<Utc>>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, due: DateTime<Utc>) {
        self.due = Some(due);
    }

    pub fn cancel(&mut self) {
        self.due = None;
    }

    pub fn is_armed(&self) -> bool {
        self.due.is_some()
    }

    /// Disarms and returns `true` if the deadline has passed.
    pub fn fire(&mut self, now: DateTime<Utc>) -> bool {
        match self.due {
            Some(due) if now >= due => {
                self.due = None;
                true
            }
            _ => false,
        }
    }
}
