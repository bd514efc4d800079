//! Codec module - fixed-width encoding for codes and arguments.
//!
//! - [`Wire`] - explicit little-endian encoding with a compile-time width
//! - [`InstructionCode`] - the unsigned types usable as instruction codes
//!
//! # Design
//!
//! Arguments are never sent as a memory image. Each type spells out its own
//! byte order and width, so peers on different architectures agree on the
//! wire format as long as they declare the same argument types.

mod code;
mod wire;

pub use code::InstructionCode;
pub use wire::Wire;
