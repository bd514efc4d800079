//! Handler module - the closures that give instructions their meaning.
//!
//! Provides:
//! - [`DispatchTable`] - fixed-size table of receive handlers, indexed by code
//! - [`ReceiveHandler`] / [`SendHandler`] - the boxed handler shapes
//!
//! A receive handler consumes an instruction's argument bytes through a
//! [`Reader`]; a send handler produces them through a [`Writer`]. The pair
//! registered at the same code on both peers must be exact inverses.

mod table;

pub use table::{DispatchTable, DispatchTableBuilder};

use crate::error::Result;
use crate::stream::{Reader, Writer};

/// Receive handler: reads the arguments of one instruction and acts on them.
pub type ReceiveHandler<S> = Box<dyn FnMut(&mut Reader<'_, S>) -> Result<()>>;

/// Send handler: writes the arguments `A` of one instruction.
pub type SendHandler<S, A> = Box<dyn Fn(&mut Writer<'_, S>, &A) -> Result<()>>;
