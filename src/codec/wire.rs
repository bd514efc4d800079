//! Fixed-width wire encoding for argument types.
//!
//! Every [`Wire`] type has a width known at compile time and encodes to
//! exactly that many bytes. Multi-byte integers and floats are little-endian;
//! composite types are the concatenation of their parts with no padding.
//!
//! ```text
//! (u8, i16, bool)  ─►  ┌────┬─────────┬────┐
//!                      │ u8 │ i16 LE  │bool│
//!                      │ 1  │ 2 bytes │ 1  │
//!                      └────┴─────────┴────┘
//! ```
//!
//! # Example
//!
//! ```
//! use serialwire::codec::Wire;
//! use bytes::BytesMut;
//!
//! let mut buf = BytesMut::new();
//! (1u8, 42u32).encode(&mut buf);
//! assert_eq!(&buf[..], &[0x01, 0x2A, 0x00, 0x00, 0x00]);
//!
//! let decoded = <(u8, u32)>::decode(&mut &buf[..]);
//! assert_eq!(decoded, (1, 42));
//! ```

use bytes::{Buf, BufMut};

/// A value with a fixed-width, platform-independent byte encoding.
pub trait Wire: Sized {
    /// Encoded size in bytes.
    const WIDTH: usize;

    /// Append exactly `WIDTH` bytes to `buf`.
    fn encode<B: BufMut>(&self, buf: &mut B);

    /// Decode from the front of `buf`.
    ///
    /// Callers guarantee at least `WIDTH` bytes remain.
    fn decode<B: Buf>(buf: &mut B) -> Self;
}

macro_rules! impl_wire_int {
    ($($ty:ty => $put:ident, $get:ident;)*) => {
        $(
            impl Wire for $ty {
                const WIDTH: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn encode<B: BufMut>(&self, buf: &mut B) {
                    buf.$put(*self);
                }

                #[inline]
                fn decode<B: Buf>(buf: &mut B) -> Self {
                    buf.$get()
                }
            }
        )*
    };
}

impl_wire_int! {
    u8 => put_u8, get_u8;
    i8 => put_i8, get_i8;
    u16 => put_u16_le, get_u16_le;
    i16 => put_i16_le, get_i16_le;
    u32 => put_u32_le, get_u32_le;
    i32 => put_i32_le, get_i32_le;
    u64 => put_u64_le, get_u64_le;
    i64 => put_i64_le, get_i64_le;
    f32 => put_f32_le, get_f32_le;
    f64 => put_f64_le, get_f64_le;
}

impl Wire for bool {
    const WIDTH: usize = 1;

    #[inline]
    fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(u8::from(*self));
    }

    #[inline]
    fn decode<B: Buf>(buf: &mut B) -> Self {
        buf.get_u8() != 0
    }
}

impl Wire for () {
    const WIDTH: usize = 0;

    #[inline]
    fn encode<B: BufMut>(&self, _buf: &mut B) {}

    #[inline]
    fn decode<B: Buf>(_buf: &mut B) -> Self {}
}

impl<T: Wire, const N: usize> Wire for [T; N] {
    const WIDTH: usize = T::WIDTH * N;

    fn encode<B: BufMut>(&self, buf: &mut B) {
        for item in self {
            item.encode(buf);
        }
    }

    fn decode<B: Buf>(buf: &mut B) -> Self {
        std::array::from_fn(|_| T::decode(buf))
    }
}

macro_rules! impl_wire_tuple {
    ($(($($name:ident),+))*) => {
        $(
            impl<$($name: Wire),+> Wire for ($($name,)+) {
                const WIDTH: usize = 0 $(+ $name::WIDTH)+;

                #[allow(non_snake_case)]
                fn encode<Out: BufMut>(&self, buf: &mut Out) {
                    let ($($name,)+) = self;
                    $($name.encode(buf);)+
                }

                fn decode<In: Buf>(buf: &mut In) -> Self {
                    // Tuple expressions evaluate left to right.
                    ($($name::decode(buf),)+)
                }
            }
        )*
    };
}

impl_wire_tuple! {
    (A)
    (A, B)
    (A, B, C)
    (A, B, C, D)
    (A, B, C, D, E)
    (A, B, C, D, E, F)
    (A, B, C, D, E, F, G)
    (A, B, C, D, E, F, G, H)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    fn encoded<T: Wire>(value: &T) -> BytesMut {
        let mut buf = BytesMut::new();
        value.encode(&mut buf);
        assert_eq!(buf.len(), T::WIDTH, "encoded length must equal WIDTH");
        buf
    }

    #[test]
    fn test_integer_widths() {
        assert_eq!(u8::WIDTH, 1);
        assert_eq!(i16::WIDTH, 2);
        assert_eq!(u32::WIDTH, 4);
        assert_eq!(f64::WIDTH, 8);
        assert_eq!(<()>::WIDTH, 0);
    }

    #[test]
    fn test_little_endian_byte_order() {
        assert_eq!(&encoded(&0x0102_0304u32)[..], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&encoded(&-2i16)[..], &[0xFE, 0xFF]);
        assert_eq!(&encoded(&42i32)[..], &[0x2A, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_float_uses_ieee_bits() {
        let buf = encoded(&1.5f32);
        assert_eq!(&buf[..], &1.5f32.to_bits().to_le_bytes());
        assert_eq!(f32::decode(&mut &buf[..]), 1.5);
    }

    #[test]
    fn test_bool_decodes_nonzero_as_true() {
        assert_eq!(&encoded(&true)[..], &[1]);
        assert_eq!(&encoded(&false)[..], &[0]);
        assert!(bool::decode(&mut &[0x7Fu8][..]));
        assert!(!bool::decode(&mut &[0x00u8][..]));
    }

    #[test]
    fn test_tuple_has_no_padding() {
        type Args = (u8, u32, bool);
        assert_eq!(Args::WIDTH, 6);

        let buf = encoded(&(7u8, 0xAABB_CCDDu32, true));
        assert_eq!(&buf[..], &[0x07, 0xDD, 0xCC, 0xBB, 0xAA, 0x01]);
        assert_eq!(Args::decode(&mut &buf[..]), (7, 0xAABB_CCDD, true));
    }

    #[test]
    fn test_array_elements_in_order() {
        let value = [1u16, 2, 0x0300];
        assert_eq!(<[u16; 3]>::WIDTH, 6);

        let buf = encoded(&value);
        assert_eq!(&buf[..], &[1, 0, 2, 0, 0, 3]);
        assert_eq!(<[u16; 3]>::decode(&mut &buf[..]), value);
    }

    #[test]
    fn test_nested_composites() {
        type Args = ([u8; 2], (i64, f64));
        assert_eq!(Args::WIDTH, 18);

        let value = ([9u8, 8], (-1i64, 0.25f64));
        let buf = encoded(&value);
        assert_eq!(Args::decode(&mut &buf[..]), value);
    }

    #[test]
    fn test_decode_consumes_exactly_width() {
        let bytes = [0x01u8, 0x00, 0xFF];
        let mut cursor = &bytes[..];
        assert_eq!(u16::decode(&mut cursor), 1);
        assert_eq!(cursor, &[0xFF]);
    }
}
