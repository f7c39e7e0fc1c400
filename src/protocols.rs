use crate::io::{BinaryReadable, Endian, Source};
use std::io;

/// The compact integer encoding: one signed byte, where `-128` escapes to a
/// full little-endian `u32` and anything else is sign-extended.
pub(crate) struct CompactU32;

impl BinaryReadable for CompactU32 {
    type Item = u32;

    fn from_stream<In>(stream: &mut In, endian: Endian) -> io::Result<Self::Item>
    where
        In: ?Sized + Source,
    {
        let first: i8 = stream.read(endian)?;
        if first == i8::MIN {
            stream.read(endian)
        } else {
            #[allow(clippy::cast_sign_loss)]
            Ok(first as u32)
        }
    }
}

/// The long form of [`CompactU32`]: the `-128` escape reads a `u64` instead.
#[allow(dead_code)]
pub(crate) struct CompactU64;

impl BinaryReadable for CompactU64 {
    type Item = u64;

    fn from_stream<In>(stream: &mut In, endian: Endian) -> io::Result<Self::Item>
    where
        In: ?Sized + Source,
    {
        let first: i8 = stream.read(endian)?;
        if first == i8::MIN {
            stream.read(endian)
        } else {
            #[allow(clippy::cast_sign_loss)]
            Ok(first as u64)
        }
    }
}
