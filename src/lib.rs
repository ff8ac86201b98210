pub mod clock;
pub mod config;
mod door_state;
pub mod error;
pub mod led;
pub mod notify;
pub mod reset;
pub mod sensor;
pub mod supervisor;
pub mod wifi;

pub use door_state::DoorState;
pub use error::FatalError;
