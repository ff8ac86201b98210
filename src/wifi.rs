//! Wireless link bring-up with a bounded retry budget.
//!
//! Each attempt re-issues the connect request rather than only waiting, since
//! some stacks need a fresh association before a flapping link recovers.

use std::error::Error;
use std::process::{Command, ExitStatus};
use std::time::Duration;
use std::{fmt, io};

use log::{debug, info, warn};
use systemstat::{IpAddr, Platform, System};

use crate::clock::Clock;
use crate::error::FatalError;

/// Driver for the wireless interface.
pub trait Link {
    /// Power the radio up and set the hostname announced over DHCP.
    fn activate(&mut self, hostname: &str) -> Result<(), LinkError>;

    /// Ask the driver to associate. May return before the link is up.
    fn request_connect(&mut self, ssid: &str, password: &str) -> Result<(), LinkError>;

    fn is_connected(&self) -> bool;
}

#[derive(Debug)]
pub enum LinkError {
    Spawn(io::Error),
    Command { status: ExitStatus, stderr: String },
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::Spawn(err) => write!(f, "unable to run nmcli: {}", err),
            LinkError::Command { status, stderr } => {
                write!(f, "nmcli exited with {}: {}", status, stderr.trim())
            }
        }
    }
}

impl Error for LinkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LinkError::Spawn(err) => Some(err),
            LinkError::Command { .. } => None,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub polls_per_attempt: u32,
    pub poll_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 10,
            polls_per_attempt: 30,
            poll_interval: Duration::from_secs(7),
        }
    }
}

impl RetryPolicy {
    /// Longest time [`ConnectivityManager::connect`] can block before giving up.
    pub fn worst_case(&self) -> Duration {
        self.poll_interval * self.polls_per_attempt * self.max_attempts
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConnectionState {
    Disconnected,
    Connecting { attempt: u32 },
    Connected,
    Failed,
}

pub struct ConnectivityManager<L, C> {
    link: L,
    clock: C,
    policy: RetryPolicy,
    state: ConnectionState,
}

impl<L: Link, C: Clock> ConnectivityManager<L, C> {
    pub fn new(link: L, clock: C, policy: RetryPolicy) -> Self {
        ConnectivityManager {
            link,
            clock,
            policy,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn connect(&mut self, ssid: &str, password: &str, hostname: &str) -> Result<(), FatalError> {
        if let Err(err) = self.link.activate(hostname) {
            warn!("unable to activate wireless interface: {}", err);
        }

        info!("Connecting to network: {}", ssid);
        if self.link.is_connected() {
            info!("already connected");
            self.state = ConnectionState::Connected;
            return Ok(());
        }

        for attempt in 1..=self.policy.max_attempts {
            self.state = ConnectionState::Connecting { attempt };
            info!("attempting to connect to network, attempt {}", attempt);
            if let Err(err) = self.link.request_connect(ssid, password) {
                warn!("connect request failed: {}", err);
            }

            for poll in 0..self.policy.polls_per_attempt {
                if self.link.is_connected() {
                    info!("connected to {}", ssid);
                    self.state = ConnectionState::Connected;
                    return Ok(());
                }
                debug!("link down, poll {} of attempt {}", poll + 1, attempt);
                self.clock.sleep(self.policy.poll_interval);
            }
            warn!("connection attempt {} failed", attempt);
        }

        self.state = ConnectionState::Failed;
        Err(FatalError::ConnectivityExhausted {
            attempts: self.policy.max_attempts,
        })
    }
}

/// NetworkManager-backed link. Link status comes from the interface's
/// addresses rather than from nmcli so that it reflects DHCP completing.
pub struct NmcliLink {
    interface: String,
    system: System,
}

impl NmcliLink {
    pub fn new(interface: &str) -> Self {
        NmcliLink {
            interface: String::from(interface),
            system: System::new(),
        }
    }

    fn nmcli(args: &[&str]) -> Result<(), LinkError> {
        let output = Command::new("nmcli")
            .args(args)
            .output()
            .map_err(LinkError::Spawn)?;
        if output.status.success() {
            Ok(())
        } else {
            Err(LinkError::Command {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        }
    }
}

impl Link for NmcliLink {
    fn activate(&mut self, hostname: &str) -> Result<(), LinkError> {
        Self::nmcli(&["radio", "wifi", "on"])?;
        Self::nmcli(&["general", "hostname", hostname])
    }

    fn request_connect(&mut self, ssid: &str, password: &str) -> Result<(), LinkError> {
        Self::nmcli(&[
            "--wait",
            "0",
            "device",
            "wifi",
            "connect",
            ssid,
            "password",
            password,
            "ifname",
            self.interface.as_str(),
        ])
    }

    fn is_connected(&self) -> bool {
        match self.system.networks() {
            Ok(networks) => networks
                .get(&self.interface)
                .map(|network| {
                    network
                        .addrs
                        .iter()
                        .any(|addr| matches!(addr.addr, IpAddr::V4(_)))
                })
                .unwrap_or(false),
            Err(err) => {
                debug!("unable to list network interfaces: {}", err);
                false
            }
        }
    }
}
