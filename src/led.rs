use rppal::gpio::{Level, OutputPin};

use crate::DoorState;

/// One colour channel of the status LED.
pub trait LedChannel {
    fn set_level(&mut self, level: Level);
}

impl LedChannel for OutputPin {
    fn set_level(&mut self, level: Level) {
        self.write(level)
    }
}

/// RGB status LED reflecting the door state: all channels lit while the
/// door is open, dark otherwise.
pub struct Indicator<O> {
    red: O,
    green: O,
    blue: O,
    active_low: bool,
    last: Option<DoorState>,
}

impl<O: LedChannel> Indicator<O> {
    /// `active_low` selects wiring where driving a pin low energizes the
    /// channel.
    pub fn new(red: O, green: O, blue: O, active_low: bool) -> Self {
        Indicator {
            red,
            green,
            blue,
            active_low,
            last: None,
        }
    }

    pub fn show(&mut self, state: DoorState) {
        let on = state == DoorState::Open;
        self.set_colour(on, on, on);
        self.last = Some(state);
    }

    /// The state most recently passed to [`Indicator::show`].
    pub fn last_shown(&self) -> Option<DoorState> {
        self.last
    }

    fn set_colour(&mut self, red: bool, green: bool, blue: bool) {
        let red = self.level(red);
        let green = self.level(green);
        let blue = self.level(blue);
        self.red.set_level(red);
        self.green.set_level(green);
        self.blue.set_level(blue);
    }

    fn level(&self, on: bool) -> Level {
        if on != self.active_low {
            Level::High
        } else {
            Level::Low
        }
    }
}
