//! The poll loop. Turns sensor readings and timer expiries into indicator
//! updates and notifications, and stops at the first fatal error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, info};

use crate::clock::Clock;
use crate::error::FatalError;
use crate::led::{Indicator, LedChannel};
use crate::notify::Notify;
use crate::sensor::{DoorInput, SensorReader};
use crate::DoorState;

pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Intervals {
    /// How often an open door is re-announced.
    pub resend: Duration,
    /// How often a closed door reports in.
    pub keepalive: Duration,
}

pub struct Supervisor<I, O, N, C> {
    sensor: SensorReader<I>,
    indicator: Indicator<O>,
    notifier: N,
    clock: C,
    intervals: Intervals,
    door_state: DoorState,
    last_transition: Duration,
    last_keepalive: Duration,
}

impl<I, O, N, C> Supervisor<I, O, N, C>
where
    I: DoorInput,
    O: LedChannel,
    N: Notify,
    C: Clock,
{
    pub fn new(
        sensor: SensorReader<I>,
        indicator: Indicator<O>,
        notifier: N,
        clock: C,
        intervals: Intervals,
    ) -> Self {
        let now = clock.now();
        Supervisor {
            sensor,
            indicator,
            notifier,
            clock,
            intervals,
            door_state: DoorState::Unknown,
            last_transition: now,
            last_keepalive: now,
        }
    }

    pub fn door_state(&self) -> DoorState {
        self.door_state
    }

    pub fn indicator(&self) -> &Indicator<O> {
        &self.indicator
    }

    /// Polls until a fatal error occurs or `term` is set.
    pub fn run(&mut self, term: &AtomicBool) -> Result<(), FatalError> {
        while !term.load(Ordering::Relaxed) {
            self.poll()?;
        }
        info!("shutdown requested, leaving poll loop");
        Ok(())
    }

    /// One tick followed by a wait for the next tick boundary.
    pub fn poll(&mut self) -> Result<(), FatalError> {
        let started = self.clock.now();
        self.tick(started)?;
        let elapsed = self.clock.now().saturating_sub(started);
        self.clock.sleep(POLL_INTERVAL.saturating_sub(elapsed));
        Ok(())
    }

    fn tick(&mut self, now: Duration) -> Result<(), FatalError> {
        let current = self.sensor.read();
        self.indicator.show(current);
        debug!("door reads {}", current);

        if current != self.door_state {
            info!("door state changed: {} -> {}", self.door_state, current);
            self.door_state = current;
            self.last_transition = now;
            if current == DoorState::Closed {
                self.last_keepalive = now;
            }
            self.notifier.notify(current)?;
        }

        match self.door_state {
            DoorState::Open if now - self.last_transition >= self.intervals.resend => {
                info!("door still open, resending");
                self.notifier.notify(DoorState::Open)?;
                self.last_transition = now;
            }
            DoorState::Closed if now - self.last_keepalive >= self.intervals.keepalive => {
                info!("sending keepalive");
                self.notifier.notify(DoorState::Closed)?;
                self.last_keepalive = now;
            }
            _ => {}
        }

        Ok(())
    }
}
