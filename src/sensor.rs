use rppal::gpio::{InputPin, Level};

use crate::DoorState;

/// A digital input the door switch is wired to.
pub trait DoorInput {
    fn level(&self) -> Level;
}

impl DoorInput for InputPin {
    fn level(&self) -> Level {
        self.read()
    }
}

/// Samples the door switch. Owns the input handle.
pub struct SensorReader<I> {
    input: I,
}

impl<I: DoorInput> SensorReader<I> {
    pub fn new(input: I) -> Self {
        SensorReader { input }
    }

    pub fn read(&self) -> DoorState {
        self.input.level().into()
    }
}
