//! The monitor's only recovery mechanism: start again from scratch.

use std::fmt;
use std::os::unix::process::CommandExt;
use std::process::{self, Command};
use std::str::FromStr;
use std::time::Duration;
use std::{env, panic, thread};

use log::error;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ResetMode {
    /// Replace the running process with a fresh copy of itself.
    #[default]
    Exec,
    /// Reboot the whole machine. Requires CAP_SYS_BOOT.
    Reboot,
    /// Exit with a failure status and leave the restart to the service manager.
    Exit,
}

impl FromStr for ResetMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exec" => Ok(ResetMode::Exec),
            "reboot" => Ok(ResetMode::Reboot),
            "exit" => Ok(ResetMode::Exit),
            other => Err(format!(
                "unknown reset mode '{}', expected exec, reboot or exit",
                other
            )),
        }
    }
}

impl fmt::Display for ResetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResetMode::Exec => f.write_str("exec"),
            ResetMode::Reboot => f.write_str("reboot"),
            ResetMode::Exit => f.write_str("exit"),
        }
    }
}

/// Logs `err` and resets. Never returns.
pub fn fatal_reset(err: &dyn fmt::Display, mode: ResetMode, delay: Duration) -> ! {
    error!("fatal: {}; resetting ({}) in {}s", err, mode, delay.as_secs());
    log::logger().flush();
    thread::sleep(delay);
    reset(mode)
}

/// Routes panics through [`fatal_reset`] so they get the same treatment as
/// returned errors.
pub fn install_panic_hook(mode: ResetMode, delay: Duration) {
    panic::set_hook(Box::new(move |info| {
        eprintln!("{}", info);
        fatal_reset(info, mode, delay)
    }));
}

fn reset(mode: ResetMode) -> ! {
    match mode {
        ResetMode::Exec => {
            match env::current_exe() {
                Ok(exe) => {
                    // exec only returns on failure
                    let err = Command::new(exe).args(env::args_os().skip(1)).exec();
                    eprintln!("unable to re-exec: {}", err);
                }
                Err(err) => eprintln!("unable to locate executable: {}", err),
            }
            process::exit(1)
        }
        ResetMode::Reboot => {
            // SAFETY: sync and reboot take no pointers; reboot only returns on
            // failure.
            let ret = unsafe {
                libc::sync();
                libc::reboot(libc::RB_AUTOBOOT)
            };
            eprintln!(
                "reboot failed ({}): {}",
                ret,
                std::io::Error::last_os_error()
            );
            process::exit(1)
        }
        ResetMode::Exit => process::exit(1),
    }
}
