//! Instruction code types.
//!
//! A code is the positional index of an instruction in the peer's dispatch
//! table. Its width on the wire is the width of the chosen code type.

use std::fmt::{Debug, Display};

use super::Wire;

/// Unsigned integer type usable as an instruction code.
pub trait InstructionCode: Wire + Copy + Eq + Debug + Display + 'static {
    /// Number of distinct codes this type can represent.
    const CAPACITY: usize;

    /// Convert a table index into a code, if it fits.
    fn from_index(index: usize) -> Option<Self>;

    /// Table index addressed by this code.
    fn index(self) -> usize;
}

macro_rules! impl_instruction_code {
    ($($ty:ty),*) => {
        $(
            impl InstructionCode for $ty {
                // Saturates where the type is as wide as usize.
                const CAPACITY: usize = (<$ty>::MAX as usize).saturating_add(1);

                #[inline]
                fn from_index(index: usize) -> Option<Self> {
                    <$ty>::try_from(index).ok()
                }

                #[inline]
                fn index(self) -> usize {
                    self as usize
                }
            }
        )*
    };
}

impl_instruction_code!(u8, u16, u32);
