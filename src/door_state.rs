use std::fmt;

use rppal::gpio::Level;

/// Logical state of the mailbox door.
///
/// `Unknown` is only held before the first poll so that the first reading is
/// always treated as a transition.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DoorState {
    Unknown,
    Open,
    Closed,
}

impl DoorState {
    /// Endpoint sub-path this state is reported on, `None` for `Unknown`.
    pub fn path_segment(self) -> Option<&'static str> {
        match self {
            DoorState::Open => Some("open"),
            DoorState::Closed => Some("closed"),
            DoorState::Unknown => None,
        }
    }
}

// The door switch is wired against a pull-up, so an open door leaves the
// input de-asserted (high).
impl From<Level> for DoorState {
    fn from(level: Level) -> Self {
        match level {
            Level::High => DoorState::Open,
            Level::Low => DoorState::Closed,
        }
    }
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DoorState::Open => f.write_str("Open"),
            DoorState::Closed => f.write_str("Closed"),
            DoorState::Unknown => f.write_str("Unknown"),
        }
    }
}
