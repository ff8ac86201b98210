use std::time::Duration;

use log::{debug, info, warn};

use crate::error::FatalError;
use crate::DoorState;

/// Reports door states to the outside world. Implementations do not retry:
/// a failure is returned to the caller as fatal.
pub trait Notify {
    fn notify(&mut self, state: DoorState) -> Result<(), FatalError>;
}

/// POSTs to `{base}/open` or `{base}/closed`.
///
/// The request is labelled JSON but carries no body, which is what the
/// receiving endpoint has always been sent.
pub struct HttpNotifier {
    agent: ureq::Agent,
    base_url: String,
    require_success_status: bool,
}

impl HttpNotifier {
    pub fn new(base_url: &str, timeout: Duration, require_success_status: bool) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("mailbox-monitor/", env!("CARGO_PKG_VERSION")))
            .build();
        HttpNotifier {
            agent,
            base_url: String::from(base_url.trim_end_matches('/')),
            require_success_status,
        }
    }

    pub fn url_for(&self, state: DoorState) -> Option<String> {
        state
            .path_segment()
            .map(|segment| format!("{}/{}", self.base_url, segment))
    }
}

impl Notify for HttpNotifier {
    fn notify(&mut self, state: DoorState) -> Result<(), FatalError> {
        let url = self
            .url_for(state)
            .ok_or(FatalError::InvalidNotification(state))?;
        info!("Mailbox is {}", state.to_string().to_lowercase());

        let failed = |reason: String| FatalError::NotifyFailed {
            url: url.clone(),
            reason,
        };
        let result = self
            .agent
            .post(&url)
            .set("Content-Type", "application/json")
            .send_bytes(&[]);
        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(code, response)) => {
                if self.require_success_status {
                    return Err(failed(format!("server responded with status {}", code)));
                }
                warn!("{} responded with status {}", url, code);
                response
            }
            Err(ureq::Error::Transport(transport)) => return Err(failed(transport.to_string())),
        };

        let body = response
            .into_string()
            .map_err(|err| failed(format!("unable to read response: {}", err)))?;
        debug!("response: {}", body);
        Ok(())
    }
}
