//! # serialwire
//!
//! Minimal instruction protocol for byte streams between two peers, such as
//! a host and a microcontroller over a serial line.
//!
//! Each side registers an ordered list of instructions. The position of an
//! instruction in that list is its code. On the wire an instruction is just
//! its code (fixed width, little-endian) followed by argument bytes that only
//! its handlers understand:
//!
//! ```text
//! ┌──────────────┬─────────────────────────────┐
//! │ code (C)     │ arguments (handler-defined) │
//! └──────────────┴─────────────────────────────┘
//! ```
//!
//! There is no framing, no length prefix, no checksum and no resync. Both
//! peers must register the same instructions in the same order; an
//! [`InstructionSchema`](schema::InstructionSchema) can be compared out of band
//! to catch mismatches.
//!
//! ## Architecture
//!
//! - **Sender**: assigns codes at registration, writes code + arguments
//! - **Receiver**: polls the input stream and dispatches one instruction per call
//! - **Streams**: two small traits plus memory, `std::io` and tokio adapters
//!
//! ## Example
//!
//! ```
//! use serialwire::handler::DispatchTable;
//! use serialwire::stream::MemoryStream;
//! use serialwire::{Receiver, Sender};
//!
//! let mut sender = Sender::<u8, _>::new(MemoryStream::new());
//! let _ping = sender.create_typed::<()>("ping")?;
//! let set_level = sender.create_typed::<u32>("set_level")?;
//! set_level.invoke(&42)?;
//!
//! let table = DispatchTable::builder()
//!     .handle("ping", |_| Ok(()))
//!     .handle_args("set_level", |level: u32| {
//!         assert_eq!(level, 42);
//!         Ok(())
//!     })
//!     .build();
//! let mut receiver = Receiver::<u8, _>::new(MemoryStream::new(), table);
//!
//! let bytes = sender.with_stream(|s| s.take_written())?;
//! receiver.stream_mut().push(&bytes);
//! receiver.poll()?;
//!
//! sender.build_schema().ensure_compatible(&receiver.build_schema())?;
//! # Ok::<(), serialwire::SerialwireError>(())
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod handler;
pub mod schema;
pub mod stream;

mod receiver;
mod sender;

pub use codec::{InstructionCode, Wire};
pub use config::{ArgumentRead, ProtocolConfig, ReceiverConfig, SenderConfig};
pub use error::{Result, SerialwireError};
pub use receiver::Receiver;
pub use sender::{Instruction, Sender};
