use std::time::Duration;
use thiserror::Error;

/// Errors surfaced to callers of the NWS client.
///
/// The detailed cause of an `Unknown` failure that came from the network or
/// from parsing is written to the diagnostic log instead of being returned.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Rate limited. Try again in {:.1} seconds.", .remaining.as_secs_f64())]
    RateLimit { remaining: Duration },
    #[error("Return status {status} was received from NWS API")]
    Api { status: u16 },
    #[error("{0}")]
    Unknown(String),
}

impl ClientError {
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown(message.into())
    }
}
