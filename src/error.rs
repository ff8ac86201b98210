use std::error::Error;
use std::fmt;

use crate::DoorState;

/// A fault the monitor does not recover from locally. Every one of these ends
/// in a device reset.
#[derive(Debug)]
pub enum FatalError {
    /// The wireless link could not be established within the retry budget.
    ConnectivityExhausted { attempts: u32 },
    /// A notification could not be delivered.
    NotifyFailed { url: String, reason: String },
    /// Only `Open` and `Closed` can be reported.
    InvalidNotification(DoorState),
    Gpio(rppal::gpio::Error),
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalError::ConnectivityExhausted { attempts } => {
                write!(f, "unable to connect to network after {} attempts", attempts)
            }
            FatalError::NotifyFailed { url, reason } => {
                write!(f, "failed to send POST request to {}: {}", url, reason)
            }
            FatalError::InvalidNotification(state) => {
                write!(f, "refusing to notify invalid door state: {}", state)
            }
            FatalError::Gpio(err) => write!(f, "GPIO error: {}", err),
        }
    }
}

impl Error for FatalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FatalError::Gpio(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rppal::gpio::Error> for FatalError {
    fn from(err: rppal::gpio::Error) -> Self {
        FatalError::Gpio(err)
    }
}
