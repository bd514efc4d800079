//! Receiver - decodes instruction codes and dispatches them.
//!
//! The receiver owns the input stream and a [`DispatchTable`]. The
//! application calls [`Receiver::poll`] from its own loop; each call handles
//! at most one instruction and never blocks waiting for a code.
//!
//! ```text
//! poll()
//!   ├─ fewer than WIDTH(C) bytes buffered ──► Ok(()), nothing consumed
//!   ├─ read code C ──────── fails ─────────► InstructionCodeReadFail
//!   ├─ code >= table size ─────────────────► UnknownInstruction
//!   ├─ slot unset ─────────────────────────► ReceiveHandlerUnset
//!   └─ table[code](reader) ────────────────► handler's Result
//! ```
//!
//! There is no resynchronization. After `UnknownInstruction` the argument
//! bytes of that instruction (if any) are still in the stream and will be
//! read as the next code.
//!
//! # Example
//!
//! ```
//! use serialwire::handler::DispatchTable;
//! use serialwire::stream::MemoryStream;
//! use serialwire::Receiver;
//!
//! let table = DispatchTable::builder()
//!     .handle_args("set_speed", |speed: u16| {
//!         assert_eq!(speed, 300);
//!         Ok(())
//!     })
//!     .build();
//!
//! let mut receiver = Receiver::<u8, _>::new(MemoryStream::new(), table);
//! receiver.stream_mut().push(&[0x00, 0x2C, 0x01]);
//! receiver.poll().unwrap();
//! ```

use std::marker::PhantomData;

use bytes::BytesMut;

use crate::codec::InstructionCode;
use crate::config::ReceiverConfig;
use crate::error::{Result, SerialwireError};
use crate::handler::DispatchTable;
use crate::schema::InstructionSchema;
use crate::stream::{InputStream, Reader};

/// Incoming half of the protocol.
///
/// `C` is the instruction code type, `S` the input stream.
pub struct Receiver<C, S> {
    /// Input stream.
    stream: S,
    /// Handlers by code.
    table: DispatchTable<S>,
    /// Receiver settings.
    config: ReceiverConfig,
    /// Decode buffer shared by all reads.
    scratch: BytesMut,
    _code: PhantomData<fn() -> C>,
}

impl<C: InstructionCode, S: InputStream> Receiver<C, S> {
    /// Create a receiver with the default configuration.
    ///
    /// A table longer than the code type can address is accepted, but its
    /// extra slots are unreachable; [`with_config`](Self::with_config)
    /// rejects such a table.
    pub fn new(stream: S, table: DispatchTable<S>) -> Self {
        if table.len() > C::CAPACITY {
            tracing::warn!(
                "Dispatch table has {} slots but codes address only {}",
                table.len(),
                C::CAPACITY
            );
        }
        Self {
            stream,
            table,
            config: ReceiverConfig::default(),
            scratch: BytesMut::new(),
            _code: PhantomData,
        }
    }

    /// Create a receiver with an explicit configuration.
    pub fn with_config(stream: S, table: DispatchTable<S>, config: ReceiverConfig) -> Result<Self> {
        config.validate()?;
        if table.len() > C::CAPACITY {
            return Err(SerialwireError::CodeSpaceExhausted {
                capacity: C::CAPACITY,
            });
        }
        Ok(Self {
            config,
            ..Self::new(stream, table)
        })
    }

    /// Decode and dispatch at most one instruction.
    ///
    /// Returns `Ok(())` without consuming anything when a full code is not
    /// buffered yet. Otherwise the code is consumed and the handler's result
    /// is returned unchanged.
    pub fn poll(&mut self) -> Result<()> {
        if self.stream.available() < C::WIDTH {
            return Ok(());
        }

        let code = Reader::new(&mut self.stream, &mut self.scratch)
            .take::<C>()
            .map_err(|_| SerialwireError::InstructionCodeReadFail)?;
        let index = code.index();
        let table_size = self.table.len();

        let slot = match self.table.slot_mut(index) {
            Some(slot) => slot,
            None => {
                tracing::warn!(
                    "Received unknown instruction code {} (table size {})",
                    code,
                    table_size
                );
                return Err(SerialwireError::UnknownInstruction {
                    code: index,
                    table_size,
                });
            }
        };

        let handler = match slot.handler.as_mut() {
            Some(handler) => handler,
            None => {
                tracing::warn!("No receive handler set for code {}", code);
                return Err(SerialwireError::ReceiveHandlerUnset { code: index });
            }
        };

        tracing::trace!("Dispatching instruction {} ({})", code, slot.name);

        let mut reader =
            Reader::with_policy(&mut self.stream, &mut self.scratch, self.config.argument_read);
        handler(&mut reader)
    }

    /// Number of instructions in the dispatch table.
    pub fn table_size(&self) -> usize {
        self.table.len()
    }

    /// Describe the dispatch table.
    pub fn build_schema(&self) -> InstructionSchema {
        self.table.build_schema(C::WIDTH)
    }

    /// Receiver settings.
    pub fn config(&self) -> &ReceiverConfig {
        &self.config
    }

    /// Shared reference to the input stream.
    pub fn stream(&self) -> &S {
        &self.stream
    }

    /// Mutable reference to the input stream, e.g. to feed a
    /// [`MemoryStream`](crate::stream::MemoryStream).
    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Take the receiver apart.
    pub fn into_parts(self) -> (S, DispatchTable<S>) {
        (self.stream, self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArgumentRead;
    use crate::stream::MemoryStream;
    use std::cell::RefCell;
    use std::io;
    use std::rc::Rc;

    /// Stream that always claims four readable bytes but fails every read.
    struct BrokenInput;

    impl InputStream for BrokenInput {
        fn available(&mut self) -> usize {
            4
        }

        fn read_exact(&mut self, _buf: &mut [u8]) -> io::Result<()> {
            Err(io::ErrorKind::ConnectionReset.into())
        }
    }

    /// Table of `size` handlers that record the code they were called for.
    fn recording_table(size: usize) -> (DispatchTable<MemoryStream>, Rc<RefCell<Vec<usize>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut builder = DispatchTable::builder();
        for code in 0..size {
            let calls = calls.clone();
            builder = builder.handle(&format!("op{}", code), move |_| {
                calls.borrow_mut().push(code);
                Ok(())
            });
        }
        (builder.build(), calls)
    }

    #[test]
    fn test_poll_without_bytes_is_noop() {
        let (table, calls) = recording_table(2);
        let mut receiver = Receiver::<u8, _>::new(MemoryStream::new(), table);

        receiver.poll().unwrap();
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_partial_code_not_consumed() {
        let (table, calls) = recording_table(2);
        let mut receiver = Receiver::<u16, _>::new(MemoryStream::from_inbound(&[0x01]), table);

        receiver.poll().unwrap();
        receiver.poll().unwrap();
        assert!(calls.borrow().is_empty());
        assert_eq!(receiver.stream().pending(), 1);

        receiver.stream_mut().push(&[0x00]);
        receiver.poll().unwrap();
        assert_eq!(*calls.borrow(), vec![1]);
    }

    #[test]
    fn test_code_read_failure() {
        let ran = Rc::new(RefCell::new(false));
        let flag = ran.clone();
        let table = DispatchTable::<BrokenInput>::builder()
            .handle("any", move |_| {
                *flag.borrow_mut() = true;
                Ok(())
            })
            .build();
        let mut receiver = Receiver::<u16, _>::new(BrokenInput, table);

        let err = receiver.poll().unwrap_err();
        assert!(matches!(err, SerialwireError::InstructionCodeReadFail));
        assert!(!*ran.borrow());
    }

    #[test]
    fn test_dispatches_by_code() {
        let (table, calls) = recording_table(3);
        let mut receiver = Receiver::<u8, _>::new(MemoryStream::from_inbound(&[2, 0, 1]), table);

        receiver.poll().unwrap();
        receiver.poll().unwrap();
        receiver.poll().unwrap();
        receiver.poll().unwrap();

        assert_eq!(*calls.borrow(), vec![2, 0, 1]);
    }

    #[test]
    fn test_unknown_code_consumes_only_code() {
        let (table, calls) = recording_table(3);
        let mut receiver =
            Receiver::<u8, _>::new(MemoryStream::from_inbound(&[5, 0xAA, 0xBB]), table);

        let err = receiver.poll().unwrap_err();
        assert!(matches!(
            err,
            SerialwireError::UnknownInstruction {
                code: 5,
                table_size: 3
            }
        ));
        assert!(calls.borrow().is_empty());
        assert_eq!(receiver.stream().pending(), 2);
    }

    #[test]
    fn test_unset_slot() {
        let mut table = DispatchTable::<MemoryStream>::with_slots(2);
        table.set(0, "only", |_| Ok(())).unwrap();
        let mut receiver = Receiver::<u8, _>::new(MemoryStream::from_inbound(&[1]), table);

        let err = receiver.poll().unwrap_err();
        assert!(matches!(err, SerialwireError::ReceiveHandlerUnset { code: 1 }));
    }

    #[test]
    fn test_wide_code_little_endian() {
        let (table, calls) = recording_table(300);
        let mut receiver =
            Receiver::<u16, _>::new(MemoryStream::from_inbound(&[0x2B, 0x01]), table);

        receiver.poll().unwrap();
        assert_eq!(*calls.borrow(), vec![299]);
    }

    #[test]
    fn test_argument_error_propagates_unchanged() {
        let table = DispatchTable::builder()
            .handle_args("needs_four", |_: u32| Ok(()))
            .build();
        let mut receiver = Receiver::<u8, _>::new(MemoryStream::from_inbound(&[0, 1, 2]), table);

        let err = receiver.poll().unwrap_err();
        assert!(matches!(
            err,
            SerialwireError::InstructionArgumentReadFail {
                needed: 4,
                available: 2
            }
        ));
        // The code is gone; the two argument bytes are still buffered.
        assert_eq!(receiver.stream().pending(), 2);
    }

    #[test]
    fn test_wait_policy_reaches_handler() {
        let table = DispatchTable::builder()
            .handle_args("needs_two", |_: u16| Ok(()))
            .build();
        let config = ReceiverConfig {
            argument_read: ArgumentRead::Wait { timeout_ms: 2 },
        };
        let mut receiver =
            Receiver::<u8, _>::with_config(MemoryStream::from_inbound(&[0, 1]), table, config)
                .unwrap();

        assert!(receiver.poll().is_err());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let (table, _) = recording_table(1);
        let config = ReceiverConfig {
            argument_read: ArgumentRead::Wait {
                timeout_ms: u64::MAX,
            },
        };

        let result = Receiver::<u8, _>::with_config(MemoryStream::new(), table, config);
        assert!(matches!(result, Err(SerialwireError::Config(_))));
    }

    #[test]
    fn test_table_beyond_code_space() {
        let (table, _) = recording_table(257);
        let result =
            Receiver::<u8, _>::with_config(MemoryStream::new(), table, ReceiverConfig::default());
        assert!(matches!(
            result,
            Err(SerialwireError::CodeSpaceExhausted { capacity: 256 })
        ));

        let (table, _) = recording_table(256);
        let result =
            Receiver::<u8, _>::with_config(MemoryStream::new(), table, ReceiverConfig::default());
        assert!(result.is_ok());
    }

    #[test]
    fn test_schema_uses_code_width() {
        let (table, _) = recording_table(2);
        let receiver = Receiver::<u16, _>::new(MemoryStream::new(), table);

        let schema = receiver.build_schema();
        assert_eq!(schema.code_width, 2);
        assert_eq!(schema.code_of("op1"), Some(1));
    }
}
