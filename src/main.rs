use std::process;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use log::{error, info, LevelFilter};
use rppal::gpio::{Gpio, InputPin, OutputPin};
use syslog::Facility;

use mailbox_monitor::clock::SystemClock;
use mailbox_monitor::config::Config;
use mailbox_monitor::led::Indicator;
use mailbox_monitor::notify::HttpNotifier;
use mailbox_monitor::reset;
use mailbox_monitor::sensor::SensorReader;
use mailbox_monitor::supervisor::{Intervals, Supervisor};
use mailbox_monitor::wifi::{ConnectivityManager, NmcliLink, RetryPolicy};
use mailbox_monitor::FatalError;

fn main() {
    if let Err(err) = syslog::init(Facility::LOG_DAEMON, LevelFilter::Info, Some("mailbox-monitor")) {
        eprintln!("unable to connect to syslog, logging disabled: {}", err);
    }

    let path = Config::path_from_env();
    let config = match Config::load(&path) {
        Ok(config) => config,
        Err(err) => {
            // Restarting cannot fix a bad config file.
            eprintln!("configuration error in {}: {}", path.display(), err);
            error!("configuration error in {}: {}", path.display(), err);
            process::exit(1);
        }
    };
    log::set_max_level(config.log_level);
    reset::install_panic_hook(config.reset_mode, config.reset_delay);
    info!("mailbox-monitor {} starting", env!("CARGO_PKG_VERSION"));

    let term = Arc::new(AtomicBool::new(false));
    if let Err(err) = register_signals(&term) {
        reset::fatal_reset(&err, config.reset_mode, config.reset_delay);
    }

    match run(&config, &term) {
        Ok(()) => info!("exiting"),
        Err(err) => reset::fatal_reset(&err, config.reset_mode, config.reset_delay),
    }
}

fn run(config: &Config, term: &AtomicBool) -> Result<(), FatalError> {
    let (door, [red, green, blue]) = setup_gpio(config)?;
    let clock = SystemClock::new();

    let wifi = &config.wifi;
    let mut connectivity =
        ConnectivityManager::new(NmcliLink::new(&wifi.interface), &clock, RetryPolicy::default());
    connectivity.connect(&wifi.ssid, &wifi.password, &wifi.hostname)?;

    let notifier = HttpNotifier::new(
        &config.notify_url,
        config.http_timeout,
        config.require_success_status,
    );
    let indicator = Indicator::new(red, green, blue, config.led_active_low);
    let intervals = Intervals {
        resend: config.resend_interval,
        keepalive: config.keepalive_interval,
    };
    let mut supervisor = Supervisor::new(
        SensorReader::new(door),
        indicator,
        notifier,
        &clock,
        intervals,
    );
    supervisor.run(term)
}

fn setup_gpio(config: &Config) -> Result<(InputPin, [OutputPin; 3]), FatalError> {
    let gpio = Gpio::new()?;
    let door_pin = gpio.get(config.door_pin)?.into_input_pullup();
    let pins = config.led_pins;
    let leds = [
        gpio.get(pins.red)?.into_output(),
        gpio.get(pins.green)?.into_output(),
        gpio.get(pins.blue)?.into_output(),
    ];
    Ok((door_pin, leds))
}

// The first SIGINT/SIGTERM asks the loop to stop; a second one while a
// blocking call is in progress terminates straight away.
fn register_signals(term: &Arc<AtomicBool>) -> std::io::Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};

    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register_conditional_shutdown(signal, 1, Arc::clone(term))?;
        signal_hook::flag::register(signal, Arc::clone(term))?;
    }
    Ok(())
}
