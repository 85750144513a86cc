//! Transaction confirmation polling
//!
//! After a transaction carrying a root digest is submitted, its status is
//! polled until the node reports a final state. The transport that fetches
//! the status is supplied by the caller through [`StatusSource`].

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Delay between status polls while a transaction is pending
pub const DEFAULT_POLL_DELAY: Duration = Duration::from_millis(511);

/// Polls before giving up on a pending transaction
pub const DEFAULT_POLL_ATTEMPTS: u32 = 120;

/// Status body as returned by the node
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusResponse {
    pub fn new(status: impl Into<String>) -> Self {
        StatusResponse {
            status: status.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Interpreted transaction status
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxStatus {
    Unknown,
    Waiting,
    Confirmed,
    Rejected,
    /// The node or transport reported an error
    Exception(String),
}

impl TxStatus {
    /// Interpret a status response; unrecognised statuses are errors
    pub fn from_response(response: &StatusResponse) -> Result<Self> {
        match response.status.as_str() {
            "unknown" => Ok(TxStatus::Unknown),
            "waiting" => Ok(TxStatus::Waiting),
            "confirmed" => Ok(TxStatus::Confirmed),
            "rejected" => Ok(TxStatus::Rejected),
            "exception" => Ok(TxStatus::Exception(
                response.message.clone().unwrap_or_default(),
            )),
            other => Err(Error::UnexpectedStatus(other.to_string())),
        }
    }

    /// Worth asking again later
    pub fn is_pending(&self) -> bool {
        matches!(self, TxStatus::Unknown | TxStatus::Waiting)
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxStatus::Unknown => f.write_str("unknown"),
            TxStatus::Waiting => f.write_str("waiting"),
            TxStatus::Confirmed => f.write_str("confirmed"),
            TxStatus::Rejected => f.write_str("rejected"),
            TxStatus::Exception(msg) => write!(f, "exception: {}", msg),
        }
    }
}

/// Anything that can report the status of a transaction
pub trait StatusSource {
    fn status(&self, tx_hash: &str) -> Result<StatusResponse>;
}

impl<S: StatusSource + ?Sized> StatusSource for &S {
    fn status(&self, tx_hash: &str) -> Result<StatusResponse> {
        (**self).status(tx_hash)
    }
}

/// Polling limits
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub max_attempts: u32,
    /// Delay between polls, in milliseconds
    pub delay_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            max_attempts: DEFAULT_POLL_ATTEMPTS,
            delay_ms: DEFAULT_POLL_DELAY.as_millis() as u64,
        }
    }
}

impl PollConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Waits for a transaction to reach a final state
#[derive(Clone, Debug, Default)]
pub struct ConfirmationPoller {
    config: PollConfig,
}

impl ConfirmationPoller {
    pub fn new(config: PollConfig) -> Self {
        ConfirmationPoller { config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Poll `source` until `tx_hash` is confirmed
    ///
    /// `Unknown` and `Waiting` are retried after the configured delay.
    /// Rejection, a reported exception, or an unrecognised status end the
    /// wait with an error, as does running out of attempts.
    pub fn wait<S: StatusSource>(&self, source: &S, tx_hash: &str) -> Result<TxStatus> {
        validate_tx_hash(tx_hash)?;

        for attempt in 1..=self.config.max_attempts {
            let response = source.status(tx_hash)?;
            let status = TxStatus::from_response(&response)?;
            debug!(tx = tx_hash, attempt, status = %status, "polled transaction status");

            match status {
                TxStatus::Confirmed => return Ok(status),
                TxStatus::Rejected => return Err(Error::Rejected(tx_hash.to_string())),
                TxStatus::Exception(msg) => {
                    warn!(tx = tx_hash, message = %msg, "status query reported an exception");
                    return Err(Error::Remote(msg));
                }
                TxStatus::Unknown | TxStatus::Waiting => {
                    if attempt < self.config.max_attempts {
                        thread::sleep(self.config.delay());
                    }
                }
            }
        }

        Err(Error::ConfirmationTimeout {
            tx: tx_hash.to_string(),
            attempts: self.config.max_attempts,
        })
    }
}

/// Transaction hashes are 32 bytes, sent as 64 hex characters
fn validate_tx_hash(tx_hash: &str) -> Result<()> {
    if tx_hash.len() == 64 && tx_hash.bytes().all(|b| b.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(Error::InvalidHash(format!(
            "transaction hash must be 64 hex characters, got {:?}",
            tx_hash
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    const TX: &str = "00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff";

    /// Replays a fixed sequence of responses, then keeps repeating the last
    struct Scripted {
        responses: RefCell<VecDeque<StatusResponse>>,
        calls: RefCell<u32>,
    }

    impl Scripted {
        fn new(statuses: &[StatusResponse]) -> Self {
            Scripted {
                responses: RefCell::new(statuses.iter().cloned().collect()),
                calls: RefCell::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.borrow()
        }
    }

    impl StatusSource for Scripted {
        fn status(&self, _tx_hash: &str) -> Result<StatusResponse> {
            *self.calls.borrow_mut() += 1;
            let mut responses = self.responses.borrow_mut();
            if responses.len() > 1 {
                Ok(responses.pop_front().unwrap())
            } else {
                Ok(responses.front().cloned().unwrap())
            }
        }
    }

    fn poller(max_attempts: u32) -> ConfirmationPoller {
        ConfirmationPoller::new(PollConfig {
            max_attempts,
            delay_ms: 0,
        })
    }

    #[test]
    fn test_confirmed_after_pending() {
        let source = Scripted::new(&[
            StatusResponse::new("unknown"),
            StatusResponse::new("waiting"),
            StatusResponse::new("confirmed"),
        ]);
        assert_eq!(poller(10).wait(&source, TX).unwrap(), TxStatus::Confirmed);
        assert_eq!(source.calls(), 3);
    }

    #[test]
    fn test_rejected() {
        let source = Scripted::new(&[StatusResponse::new("rejected")]);
        assert!(matches!(poller(10).wait(&source, TX), Err(Error::Rejected(_))));
    }

    #[test]
    fn test_exception_carries_message() {
        let source = Scripted::new(&[StatusResponse::new("exception").with_message("boom")]);
        match poller(10).wait(&source, TX) {
            Err(Error::Remote(msg)) => assert_eq!(msg, "boom"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_unexpected_status() {
        let source = Scripted::new(&[StatusResponse::new("teapot")]);
        assert!(matches!(
            poller(10).wait(&source, TX),
            Err(Error::UnexpectedStatus(s)) if s == "teapot"
        ));
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let source = Scripted::new(&[StatusResponse::new("waiting")]);
        assert!(matches!(
            poller(4).wait(&source, TX),
            Err(Error::ConfirmationTimeout { attempts: 4, .. })
        ));
        assert_eq!(source.calls(), 4);
    }

    #[test]
    fn test_bad_tx_hash_is_not_polled() {
        let source = Scripted::new(&[StatusResponse::new("confirmed")]);
        assert!(poller(1).wait(&source, "abc").is_err());
        assert!(poller(1).wait(&source, &"zz".repeat(32)).is_err());
        assert_eq!(source.calls(), 0);
    }

    #[test]
    fn test_status_response_json() {
        let r: StatusResponse = serde_json::from_str(r#"{"status":"waiting"}"#).unwrap();
        assert_eq!(TxStatus::from_response(&r).unwrap(), TxStatus::Waiting);
        assert!(TxStatus::Waiting.is_pending());
        assert!(!TxStatus::Confirmed.is_pending());
    }

    #[test]
    fn test_default_delay() {
        assert_eq!(PollConfig::default().delay(), Duration::from_millis(511));
    }
}
