//! Dispatch table mapping instruction codes to receive handlers.
//!
//! The table is an ordered, fixed-length list of slots. A slot's index is the
//! instruction code that selects it, so registration order *is* the code
//! assignment and must match the peer's sender.
//!
//! # Example
//!
//! ```
//! use serialwire::handler::DispatchTable;
//! use serialwire::stream::MemoryStream;
//!
//! let table = DispatchTable::<MemoryStream>::builder()
//!     .handle_args("set_led", |(index, on): (u8, bool)| {
//!         println!("led {} -> {}", index, on);
//!         Ok(())
//!     })
//!     .handle("ping", |_reader| Ok(()))
//!     .build();
//!
//! assert_eq!(table.len(), 2);
//! assert_eq!(table.name(1), Some("ping"));
//! ```

use super::ReceiveHandler;
use crate::codec::Wire;
use crate::error::{Result, SerialwireError};
use crate::schema::InstructionSchema;
use crate::stream::{InputStream, Reader};

/// One entry of the table.
pub(crate) struct Slot<S> {
    /// Registration name.
    pub(crate) name: String,
    /// Declared argument width, for typed handlers.
    pub(crate) argument_width: Option<usize>,
    /// The handler, if one was set.
    pub(crate) handler: Option<ReceiveHandler<S>>,
}

impl<S> Slot<S> {
    fn empty() -> Self {
        Self {
            name: String::new(),
            argument_width: None,
            handler: None,
        }
    }
}

/// Fixed-size table of receive handlers indexed by instruction code.
pub struct DispatchTable<S> {
    slots: Box<[Slot<S>]>,
}

impl<S: InputStream + 'static> DispatchTable<S> {
    /// Start building a table in registration order.
    pub fn builder() -> DispatchTableBuilder<S> {
        DispatchTableBuilder::new()
    }

    /// Create a table of `size` unset slots, to be filled with [`set`].
    ///
    /// Dispatching to a slot that is still unset fails with
    /// [`SerialwireError::ReceiveHandlerUnset`].
    ///
    /// [`set`]: DispatchTable::set
    pub fn with_slots(size: usize) -> Self {
        Self {
            slots: (0..size).map(|_| Slot::empty()).collect(),
        }
    }

    /// Set the handler for `code`, replacing any previous one.
    ///
    /// Fails with [`SerialwireError::Config`] if `code` is outside the table.
    pub fn set<F>(&mut self, code: usize, name: &str, handler: F) -> Result<()>
    where
        F: FnMut(&mut Reader<'_, S>) -> Result<()> + 'static,
    {
        self.fill(code, name, None, Box::new(handler))
    }

    /// Set a handler for `code` that receives its decoded arguments.
    pub fn set_args<A, F>(&mut self, code: usize, name: &str, handler: F) -> Result<()>
    where
        A: Wire + 'static,
        F: FnMut(A) -> Result<()> + 'static,
    {
        self.fill(code, name, Some(A::WIDTH), typed_handler(handler))
    }

    fn fill(
        &mut self,
        code: usize,
        name: &str,
        argument_width: Option<usize>,
        handler: ReceiveHandler<S>,
    ) -> Result<()> {
        let table_size = self.slots.len();
        let slot = self.slots.get_mut(code).ok_or_else(|| {
            SerialwireError::Config(format!(
                "code {} is outside a table of {} slots",
                code, table_size
            ))
        })?;

        slot.name = name.to_string();
        slot.argument_width = argument_width;
        slot.handler = Some(handler);
        Ok(())
    }
}

impl<S> DispatchTable<S> {
    /// Number of slots. Fixed for the table's lifetime.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if the table has no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Check if every slot has a handler.
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(|s| s.handler.is_some())
    }

    /// Codes whose slot has no handler yet.
    pub fn unset_codes(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.handler.is_none())
            .map(|(code, _)| code)
            .collect()
    }

    /// Registration name at `code`.
    pub fn name(&self, code: usize) -> Option<&str> {
        self.slots.get(code).map(|s| s.name.as_str())
    }

    /// Describe the table for codes of `code_width` bytes.
    pub fn build_schema(&self, code_width: usize) -> InstructionSchema {
        let mut schema = InstructionSchema::new(code_width);
        for slot in self.slots.iter() {
            schema.add(&slot.name, slot.argument_width);
        }
        schema
    }

    pub(crate) fn slot_mut(&mut self, code: usize) -> Option<&mut Slot<S>> {
        self.slots.get_mut(code)
    }
}

/// Builder that appends handlers in code order.
pub struct DispatchTableBuilder<S> {
    slots: Vec<Slot<S>>,
}

impl<S: InputStream + 'static> DispatchTableBuilder<S> {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Append a handler that reads its own arguments from the reader.
    ///
    /// The handler gets the next code: the first call is code 0.
    pub fn handle<F>(mut self, name: &str, handler: F) -> Self
    where
        F: FnMut(&mut Reader<'_, S>) -> Result<()> + 'static,
    {
        self.push(name, None, Box::new(handler));
        self
    }

    /// Append a handler that receives its arguments already decoded.
    ///
    /// Use a tuple for several arguments: `handle_args("move", |(x, y): (i16, i16)| ..)`.
    pub fn handle_args<A, F>(mut self, name: &str, handler: F) -> Self
    where
        A: Wire + 'static,
        F: FnMut(A) -> Result<()> + 'static,
    {
        self.push(name, Some(A::WIDTH), typed_handler(handler));
        self
    }

    /// Number of handlers registered so far.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if no handler has been registered.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Freeze the table. Its length cannot change afterwards.
    pub fn build(self) -> DispatchTable<S> {
        tracing::debug!("Built dispatch table with {} instructions", self.slots.len());
        DispatchTable {
            slots: self.slots.into_boxed_slice(),
        }
    }

    fn push(&mut self, name: &str, argument_width: Option<usize>, handler: ReceiveHandler<S>) {
        tracing::debug!("Registered receive handler '{}' as code {}", name, self.slots.len());
        self.slots.push(Slot {
            name: name.to_string(),
            argument_width,
            handler: Some(handler),
        });
    }
}

impl<S: InputStream + 'static> Default for DispatchTableBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap an argument-taking closure into a reader-taking handler.
fn typed_handler<S, A, F>(mut handler: F) -> ReceiveHandler<S>
where
    S: InputStream + 'static,
    A: Wire + 'static,
    F: FnMut(A) -> Result<()> + 'static,
{
    Box::new(move |reader: &mut Reader<'_, S>| {
        let args = reader.read::<A>()?;
        handler(args)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::MemoryStream;
    use bytes::BytesMut;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn run(table: &mut DispatchTable<MemoryStream>, code: usize, input: &[u8]) -> Result<()> {
        let mut stream = MemoryStream::from_inbound(input);
        let mut scratch = BytesMut::new();
        let mut reader = Reader::new(&mut stream, &mut scratch);
        let slot = table.slot_mut(code).expect("slot exists");
        let handler = slot.handler.as_mut().expect("handler set");
        handler(&mut reader)
    }

    #[test]
    fn test_builder_assigns_codes_in_order() {
        let table = DispatchTable::<MemoryStream>::builder()
            .handle("first", |_| Ok(()))
            .handle("second", |_| Ok(()))
            .handle("third", |_| Ok(()))
            .build();

        assert_eq!(table.len(), 3);
        assert_eq!(table.name(0), Some("first"));
        assert_eq!(table.name(2), Some("third"));
        assert!(table.name(3).is_none());
        assert!(table.is_complete());
    }

    #[test]
    fn test_typed_handler_decodes_arguments() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();

        let mut table = DispatchTable::<MemoryStream>::builder()
            .handle_args("pair", move |(a, b): (u8, i16)| {
                sink.borrow_mut().push((a, b));
                Ok(())
            })
            .build();

        run(&mut table, 0, &[0x05, 0xFF, 0xFF]).unwrap();
        assert_eq!(*seen.borrow(), vec![(5, -1)]);
    }

    #[test]
    fn test_typed_handler_short_arguments() {
        let mut table = DispatchTable::<MemoryStream>::builder()
            .handle_args("wide", |_: u64| Ok(()))
            .build();

        let err = run(&mut table, 0, &[1, 2, 3]).unwrap_err();
        assert!(matches!(
            err,
            SerialwireError::InstructionArgumentReadFail {
                needed: 8,
                available: 3
            }
        ));
    }

    #[test]
    fn test_with_slots_starts_unset() {
        let mut table = DispatchTable::<MemoryStream>::with_slots(3);
        assert_eq!(table.len(), 3);
        assert!(!table.is_complete());
        assert_eq!(table.unset_codes(), vec![0, 1, 2]);

        table.set(1, "middle", |_| Ok(())).unwrap();
        table.set_args(2, "last", |_: u32| Ok(())).unwrap();

        assert_eq!(table.unset_codes(), vec![0]);
        assert_eq!(table.name(1), Some("middle"));
    }

    #[test]
    fn test_set_out_of_range() {
        let mut table = DispatchTable::<MemoryStream>::with_slots(2);

        let err = table.set(2, "extra", |_| Ok(())).unwrap_err();
        assert!(matches!(err, SerialwireError::Config(_)));
        assert!(err.to_string().contains("code 2 is outside a table of 2 slots"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_build_schema() {
        let table = DispatchTable::<MemoryStream>::builder()
            .handle("raw", |_| Ok(()))
            .handle_args("typed", |_: (u16, bool)| Ok(()))
            .build();

        let schema = table.build_schema(1);
        assert_eq!(schema.code_width, 1);
        assert_eq!(schema.get(0).unwrap().argument_width, None);
        assert_eq!(schema.get(1).unwrap().argument_width, Some(3));
        assert_eq!(schema.code_of("typed"), Some(1));
    }

    #[test]
    fn test_handler_error_propagates() {
        let mut table = DispatchTable::<MemoryStream>::builder()
            .handle("fails", |_| Err(SerialwireError::Config("boom".into())))
            .build();

        let err = run(&mut table, 0, &[]).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}
