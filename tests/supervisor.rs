mod common;

use std::sync::atomic::AtomicBool;

use common::{build_rig, RecordingNotifier};
use mailbox_monitor::{DoorState, FatalError};
use rppal::gpio::Level;

use DoorState::{Closed, Open};

fn poll_through(rig: &mut common::Rig, last_secs: u64) {
    while rig.clock.secs() <= last_secs {
        rig.supervisor.poll().unwrap();
    }
}

#[test]
fn keepalive_then_open_then_resend() {
    let mut rig = build_rig(300, 600, RecordingNotifier::new, |t| {
        if t < 605 {
            Closed
        } else {
            Open
        }
    });
    poll_through(&mut rig, 1205);

    assert_eq!(
        rig.notifier.sent(),
        vec![
            (0, Closed),
            (600, Closed),
            (605, Open),
            (905, Open),
            (1205, Open)
        ]
    );
    assert_eq!(rig.supervisor.door_state(), Open);
}

#[test]
fn first_reading_is_reported_once() {
    let mut rig = build_rig(300, 600, RecordingNotifier::new, |_| Open);
    poll_through(&mut rig, 10);
    assert_eq!(rig.notifier.sent(), vec![(0, Open)]);
}

#[test]
fn closing_is_not_double_reported_as_keepalive() {
    let mut rig = build_rig(4, 5, RecordingNotifier::new, |t| if t < 10 { Open } else { Closed });
    poll_through(&mut rig, 20);

    assert_eq!(
        rig.notifier.sent(),
        vec![
            (0, Open),
            (4, Open),
            (8, Open),
            (10, Closed),
            (15, Closed),
            (20, Closed)
        ]
    );
}

#[test]
fn indicator_follows_every_reading() {
    let mut rig = build_rig(300, 600, RecordingNotifier::new, |t| {
        if t % 3 == 0 {
            Open
        } else {
            Closed
        }
    });
    poll_through(&mut rig, 8);

    let levels = rig.red.0.borrow().clone();
    let expected: Vec<Level> = (0..=8)
        .map(|t| if t % 3 == 0 { Level::High } else { Level::Low })
        .collect();
    assert_eq!(levels, expected);
    assert_eq!(rig.supervisor.indicator().last_shown(), Some(Closed));
}

#[test]
fn ticks_are_one_second_apart() {
    let mut rig = build_rig(300, 600, RecordingNotifier::new, |_| Closed);
    for expected in 1..=5 {
        rig.supervisor.poll().unwrap();
        assert_eq!(rig.clock.secs(), expected);
    }
}

#[test]
fn notify_failure_stops_the_loop() {
    let mut rig = build_rig(300, 3, |clock| RecordingNotifier::failing_on_call(clock, 2), |_| Closed);
    let term = AtomicBool::new(false);

    let result = rig.supervisor.run(&term);

    assert!(matches!(result, Err(FatalError::NotifyFailed { .. })));
    assert_eq!(rig.notifier.sent(), vec![(0, Closed)]);
    // readings at t = 0, 1, 2, 3 and nothing after the failing keepalive
    assert_eq!(rig.reads.get(), 4);
    assert_eq!(rig.clock.secs(), 3);
}

#[test]
fn initial_notify_failure_is_fatal() {
    let mut rig = build_rig(300, 600, |clock| RecordingNotifier::failing_on_call(clock, 1), |_| Open);
    let term = AtomicBool::new(false);

    assert!(rig.supervisor.run(&term).is_err());
    assert_eq!(rig.reads.get(), 1);
    assert!(rig.notifier.sent().is_empty());
}

#[test]
fn run_returns_when_terminated() {
    let mut rig = build_rig(300, 600, RecordingNotifier::new, |_| Open);
    let term = AtomicBool::new(true);

    rig.supervisor.run(&term).unwrap();
    assert_eq!(rig.reads.get(), 0);
}
