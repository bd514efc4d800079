//! Error types for serialwire.

use thiserror::Error;

/// Main error type for all serialwire operations.
///
/// Every variant is the terminal outcome of a single operation. Nothing in
/// the crate retries or resynchronizes; the caller decides whether an error
/// is fatal for the link.
#[derive(Debug, Error)]
pub enum SerialwireError {
    /// Decoded code has no entry in the dispatch table.
    #[error("Unknown instruction code {code} (table size {table_size})")]
    UnknownInstruction { code: usize, table_size: usize },

    /// Instruction code header could not be fully read.
    #[error("Failed to read instruction code")]
    InstructionCodeReadFail,

    /// A receive handler could not read its argument bytes.
    #[error("Failed to read instruction argument: needed {needed} bytes, {available} available")]
    InstructionArgumentReadFail { needed: usize, available: usize },

    /// Instruction code header could not be fully written.
    #[error("Failed to write instruction code")]
    InstructionCodeWriteFail,

    /// An instruction was invoked before a send handler was attached.
    #[error("Instruction {code} has no send handler")]
    InstructionSendHandlerIsNull { code: usize },

    /// A send handler could not write its argument bytes.
    #[error("Failed to write instruction argument ({len} bytes)")]
    InstructionArgumentWriteFail { len: usize },

    /// Dispatch table slot was never given a handler.
    #[error("Receive handler for code {code} is not set")]
    ReceiveHandlerUnset { code: usize },

    /// The code type cannot represent another instruction.
    #[error("Instruction code space exhausted ({capacity} codes)")]
    CodeSpaceExhausted { capacity: usize },

    /// Output stream is already in use by an instruction being sent.
    #[error("Output stream busy")]
    OutputBusy,

    /// Instruction tables of two peers disagree.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Invalid configuration.
    #[error("Config error: {0}")]
    Config(String),

    /// I/O error from the underlying transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error (schema and config only).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using SerialwireError.
pub type Result<T> = std::result::Result<T, SerialwireError>;
