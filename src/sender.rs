//! Sender - assigns instruction codes and encodes outgoing instructions.
//!
//! Codes are handed out at *registration* time, in order, starting at 0. The
//! k-th instruction created on a sender always has code `k - 1`, no matter in
//! which order the returned handles are later invoked. The peer's dispatch
//! table must list the matching handlers in the same order.
//!
//! ```text
//! Sender ──create_instruction("a")──► Instruction(code 0) ─┐
//!        ──create_instruction("b")──► Instruction(code 1) ─┼─► shared output stream
//!        ──create_typed("c")────────► Instruction(code 2) ─┘
//! ```
//!
//! # Example
//!
//! ```
//! use serialwire::stream::MemoryStream;
//! use serialwire::Sender;
//!
//! let mut sender = Sender::<u8, _>::new(MemoryStream::new());
//! let ping = sender.create_typed::<()>("ping")?;
//! let set_level = sender.create_typed::<u32>("set_level")?;
//!
//! set_level.invoke(&42)?;
//! ping.invoke(&())?;
//!
//! let bytes = sender.with_stream(|s| s.take_written())?;
//! assert_eq!(&bytes[..], &[0x01, 0x2A, 0x00, 0x00, 0x00, 0x00]);
//! # Ok::<(), serialwire::SerialwireError>(())
//! ```

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use bytes::BytesMut;

use crate::codec::{InstructionCode, Wire};
use crate::config::SenderConfig;
use crate::error::{Result, SerialwireError};
use crate::handler::SendHandler;
use crate::schema::InstructionSchema;
use crate::stream::{OutputStream, Writer};

/// Output state shared by a sender and all of its instructions.
struct Output<S> {
    stream: S,
    scratch: BytesMut,
    config: SenderConfig,
}

/// Outgoing half of the protocol.
///
/// `C` is the instruction code type, `S` the output stream.
pub struct Sender<C, S> {
    /// Stream shared with every instruction created here.
    output: Rc<RefCell<Output<S>>>,
    /// Code the next registration will receive.
    next_code: usize,
    /// Registrations so far, in code order.
    schema: InstructionSchema,
    _code: PhantomData<fn() -> C>,
}

impl<C: InstructionCode, S: OutputStream + 'static> Sender<C, S> {
    /// Create a sender with the default configuration.
    pub fn new(stream: S) -> Self {
        Self::with_config(stream, SenderConfig::default())
    }

    /// Create a sender with an explicit configuration.
    pub fn with_config(stream: S, config: SenderConfig) -> Self {
        Self {
            output: Rc::new(RefCell::new(Output {
                stream,
                scratch: BytesMut::new(),
                config,
            })),
            next_code: 0,
            schema: InstructionSchema::new(C::WIDTH),
            _code: PhantomData,
        }
    }

    /// Register an instruction whose arguments are written by `handler`.
    pub fn create_instruction<A, F>(&mut self, name: &str, handler: F) -> Result<Instruction<C, S, A>>
    where
        A: 'static,
        F: Fn(&mut Writer<'_, S>, &A) -> Result<()> + 'static,
    {
        self.register(name, None, Some(Box::new(handler)))
    }

    /// Register an instruction whose single argument value is written as-is.
    ///
    /// Use a tuple for several arguments and `()` for none.
    pub fn create_typed<A: Wire + 'static>(&mut self, name: &str) -> Result<Instruction<C, S, A>> {
        let handler: SendHandler<S, A> =
            Box::new(|writer: &mut Writer<'_, S>, args: &A| writer.write(args));
        self.register(name, Some(A::WIDTH), Some(handler))
    }

    /// Register an instruction without a send handler yet.
    ///
    /// The code is assigned now. Invoking the instruction before
    /// [`Instruction::attach`] fails without writing anything.
    pub fn reserve_instruction<A: 'static>(&mut self, name: &str) -> Result<Instruction<C, S, A>> {
        self.register(name, None, None)
    }

    fn register<A>(
        &mut self,
        name: &str,
        argument_width: Option<usize>,
        handler: Option<SendHandler<S, A>>,
    ) -> Result<Instruction<C, S, A>> {
        let code = C::from_index(self.next_code).ok_or(SerialwireError::CodeSpaceExhausted {
            capacity: C::CAPACITY,
        })?;
        self.next_code += 1;
        self.schema.add(name, argument_width);

        tracing::debug!("Registered instruction '{}' as code {}", name, code);

        Ok(Instruction {
            code,
            name: Rc::from(name),
            output: self.output.clone(),
            handler,
        })
    }

    /// Code the next registration will receive; equals the number of
    /// instructions created so far.
    pub fn next_code(&self) -> usize {
        self.next_code
    }

    /// Describe every instruction registered so far.
    pub fn build_schema(&self) -> InstructionSchema {
        self.schema.clone()
    }

    /// Run `f` with the output stream, e.g. to drain a
    /// [`MemoryStream`](crate::stream::MemoryStream).
    ///
    /// Fails with [`SerialwireError::OutputBusy`] when called from inside a
    /// send handler.
    pub fn with_stream<R>(&self, f: impl FnOnce(&mut S) -> R) -> Result<R> {
        let mut output = self
            .output
            .try_borrow_mut()
            .map_err(|_| SerialwireError::OutputBusy)?;
        Ok(f(&mut output.stream))
    }
}

/// Handle for sending one instruction with arguments of type `A`.
pub struct Instruction<C, S, A> {
    /// Code assigned at registration; never changes.
    code: C,
    /// Registration name, for logs.
    name: Rc<str>,
    /// Output shared with the sender.
    output: Rc<RefCell<Output<S>>>,
    /// Writes the arguments, once attached.
    handler: Option<SendHandler<S, A>>,
}

impl<C: InstructionCode, S: OutputStream, A> Instruction<C, S, A> {
    /// Assigned code.
    pub fn code(&self) -> C {
        self.code
    }

    /// Registration name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if a send handler is attached.
    pub fn is_bound(&self) -> bool {
        self.handler.is_some()
    }

    /// Attach a send handler, replacing any previous one. The code is
    /// unchanged.
    pub fn attach<F>(&mut self, handler: F)
    where
        F: Fn(&mut Writer<'_, S>, &A) -> Result<()> + 'static,
    {
        self.handler = Some(Box::new(handler));
    }

    /// Write the code followed by the arguments.
    ///
    /// Nothing is written if no handler is attached. If the code cannot be
    /// written, the handler is not called. Errors from the handler are
    /// returned unchanged, so a failed argument write may leave a code
    /// without its arguments on the wire. The same holds when the handler
    /// invokes another instruction on this sender: the nested call fails with
    /// [`SerialwireError::OutputBusy`] after the outer code was written.
    pub fn invoke(&self, args: &A) -> Result<()> {
        let handler = match &self.handler {
            Some(handler) => handler,
            None => {
                tracing::warn!("Instruction '{}' ({}) invoked without a send handler", self.name, self.code);
                return Err(SerialwireError::InstructionSendHandlerIsNull {
                    code: self.code.index(),
                });
            }
        };

        let mut output = self
            .output
            .try_borrow_mut()
            .map_err(|_| SerialwireError::OutputBusy)?;
        let Output {
            stream,
            scratch,
            config,
        } = &mut *output;

        let mut writer = Writer::new(&mut *stream, &mut *scratch);
        writer
            .write(&self.code)
            .map_err(|_| SerialwireError::InstructionCodeWriteFail)?;
        handler(&mut writer, args)?;

        if config.flush_each_instruction {
            stream.flush()?;
        }

        tracing::trace!("Sent instruction '{}' ({})", self.name, self.code);
        Ok(())
    }
}
