//! Fault taxonomy shared across the driver.
//!
//! Three categories with distinct handling rules: transport faults leave
//! channel values stale and are retried on the next poll; validation
//! faults are logged and never corrupt state; configuration faults are
//! fatal at startup.

use thiserror::Error;

use crate::bus::transport::BusError;

/// A fault raised by any driver operation.
#[derive(Debug, Error)]
pub enum Fault {
    /// Bus I/O failure. Reads leave channels at their last good value;
    /// writes keep the pending command for retry.
    #[error("transport fault: {0}")]
    Transport(#[from] BusError),

    /// A value rejected by a downstream consumer or an encode range
    /// check. Logged by the caller; the cycle continues.
    #[error("validation fault: {0}")]
    Validation(String),

    /// Invalid device configuration. Fatal at startup; the device does
    /// not become active.
    #[error("configuration fault: {0}")]
    Config(String),
}

impl Fault {
    /// Shorthand for a validation fault with a formatted message.
    pub fn validation(message: impl Into<String>) -> Self {
        Fault::Validation(message.into())
    }

    /// Shorthand for a configuration fault with a formatted message.
    pub fn config(message: impl Into<String>) -> Self {
        Fault::Config(message.into())
    }
}
