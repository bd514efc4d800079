//! Configuration for receivers and senders.
//!
//! Every setting has a documented default, so `Default::default()` is always a
//! working configuration. Configurations can also be loaded from JSON:
//!
//! ```
//! use serialwire::config::{ArgumentRead, ProtocolConfig};
//!
//! let config = ProtocolConfig::from_json(
//!     r#"{ "receiver": { "argument_read": { "mode": "wait", "timeout_ms": 20 } } }"#,
//! ).unwrap();
//!
//! assert_eq!(config.receiver.argument_read, ArgumentRead::Wait { timeout_ms: 20 });
//! assert!(config.sender.flush_each_instruction);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SerialwireError};

/// Interval between availability checks while waiting for argument bytes.
pub const CHECK_INTERVAL: Duration = Duration::from_micros(100);

/// Upper bound accepted for [`ArgumentRead::Wait`] timeouts (1 minute).
pub const MAX_ARGUMENT_TIMEOUT_MS: u64 = 60_000;

/// What a receive handler does when its argument bytes are not buffered yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ArgumentRead {
    /// Fail immediately with `InstructionArgumentReadFail`.
    #[default]
    FailFast,
    /// Poll the stream until the bytes arrive or the timeout elapses.
    Wait {
        /// Timeout in milliseconds.
        timeout_ms: u64,
    },
}

/// Receiver configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// Argument-read policy. Default: fail fast.
    pub argument_read: ArgumentRead,
}

impl ReceiverConfig {
    /// Check the configuration for values the receiver cannot honor.
    pub fn validate(&self) -> Result<()> {
        if let ArgumentRead::Wait { timeout_ms } = self.argument_read {
            if timeout_ms > MAX_ARGUMENT_TIMEOUT_MS {
                return Err(SerialwireError::Config(format!(
                    "argument timeout {}ms exceeds maximum {}ms",
                    timeout_ms, MAX_ARGUMENT_TIMEOUT_MS
                )));
            }
        }
        Ok(())
    }
}

/// Sender configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Flush the output stream after every instruction.
    ///
    /// Default: true
    pub flush_each_instruction: bool,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            flush_each_instruction: true,
        }
    }
}

/// Configuration for both halves of a link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Receiving half.
    pub receiver: ReceiverConfig,
    /// Sending half.
    pub sender: SenderConfig,
}

impl ProtocolConfig {
    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate both halves.
    pub fn validate(&self) -> Result<()> {
        self.receiver.validate()
    }
}
