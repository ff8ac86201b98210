//! Mock hardware and a virtual clock for driving the supervisor in tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use mailbox_monitor::clock::Clock;
use mailbox_monitor::led::{Indicator, LedChannel};
use mailbox_monitor::notify::Notify;
use mailbox_monitor::sensor::{DoorInput, SensorReader};
use mailbox_monitor::supervisor::{Intervals, Supervisor};
use mailbox_monitor::{DoorState, FatalError};
use rppal::gpio::Level;

/// Clock whose time only moves when something sleeps.
#[derive(Clone, Default)]
pub struct VirtualClock(Rc<Cell<Duration>>);

impl VirtualClock {
    pub fn secs(&self) -> u64 {
        self.0.get().as_secs()
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Duration {
        self.0.get()
    }

    fn sleep(&self, duration: Duration) {
        self.0.set(self.0.get() + duration);
    }
}

/// Door input whose level is a function of virtual time (in seconds).
pub struct ScriptedDoor {
    clock: VirtualClock,
    script: Box<dyn Fn(u64) -> DoorState>,
    pub reads: Rc<Cell<u32>>,
}

impl ScriptedDoor {
    pub fn new(clock: &VirtualClock, script: impl Fn(u64) -> DoorState + 'static) -> Self {
        ScriptedDoor {
            clock: clock.clone(),
            script: Box::new(script),
            reads: Rc::new(Cell::new(0)),
        }
    }
}

impl DoorInput for ScriptedDoor {
    fn level(&self) -> Level {
        self.reads.set(self.reads.get() + 1);
        match (self.script)(self.clock.secs()) {
            DoorState::Open => Level::High,
            _ => Level::Low,
        }
    }
}

#[derive(Clone, Default)]
pub struct RecordingChannel(pub Rc<RefCell<Vec<Level>>>);

impl LedChannel for RecordingChannel {
    fn set_level(&mut self, level: Level) {
        self.0.borrow_mut().push(level);
    }
}

/// Records `(time in seconds, state)` for every notification and can be told
/// to fail on the nth call.
#[derive(Clone)]
pub struct RecordingNotifier {
    clock: VirtualClock,
    pub sent: Rc<RefCell<Vec<(u64, DoorState)>>>,
    fail_on_call: Option<usize>,
}

impl RecordingNotifier {
    pub fn new(clock: &VirtualClock) -> Self {
        RecordingNotifier {
            clock: clock.clone(),
            sent: Rc::default(),
            fail_on_call: None,
        }
    }

    pub fn failing_on_call(clock: &VirtualClock, call: usize) -> Self {
        RecordingNotifier {
            fail_on_call: Some(call),
            ..RecordingNotifier::new(clock)
        }
    }

    pub fn sent(&self) -> Vec<(u64, DoorState)> {
        self.sent.borrow().clone()
    }
}

impl Notify for RecordingNotifier {
    fn notify(&mut self, state: DoorState) -> Result<(), FatalError> {
        let call = self.sent.borrow().len() + 1;
        if self.fail_on_call == Some(call) {
            return Err(FatalError::NotifyFailed {
                url: format!("http://test/{}", state),
                reason: String::from("connection refused"),
            });
        }
        self.sent.borrow_mut().push((self.clock.secs(), state));
        Ok(())
    }
}

pub type TestSupervisor = Supervisor<ScriptedDoor, RecordingChannel, RecordingNotifier, VirtualClock>;

pub struct Rig {
    pub clock: VirtualClock,
    pub notifier: RecordingNotifier,
    pub red: RecordingChannel,
    pub reads: Rc<Cell<u32>>,
    pub supervisor: TestSupervisor,
}

pub fn build_rig(
    resend_secs: u64,
    keepalive_secs: u64,
    notifier: impl FnOnce(&VirtualClock) -> RecordingNotifier,
    script: impl Fn(u64) -> DoorState + 'static,
) -> Rig {
    let clock = VirtualClock::default();
    let notifier = notifier(&clock);
    let door = ScriptedDoor::new(&clock, script);
    let reads = Rc::clone(&door.reads);
    let red = RecordingChannel::default();
    let indicator = Indicator::new(
        red.clone(),
        RecordingChannel::default(),
        RecordingChannel::default(),
        false,
    );
    let intervals = Intervals {
        resend: Duration::from_secs(resend_secs),
        keepalive: Duration::from_secs(keepalive_secs),
    };
    let supervisor = Supervisor::new(
        SensorReader::new(door),
        indicator,
        notifier.clone(),
        clock.clone(),
        intervals,
    );
    Rig {
        clock,
        notifier,
        red,
        reads,
        supervisor,
    }
}
