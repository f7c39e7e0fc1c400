use core::mem;
use std::io;

#[derive(Clone, Copy)]
pub(crate) enum Endian {
    Little,
    #[allow(dead_code)]
    Native,
}

pub(crate) trait Source {
    fn len(&self) -> usize;

    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<()>;

    fn seek_absolute(&mut self, pos: usize) -> io::Result<()>;

    #[must_use]
    fn stream_position(&self) -> usize;

    fn read<T>(&mut self, endian: Endian) -> io::Result<T>
    where
        T: BinaryReadable<Item = T>,
    {
        T::from_stream(self, endian)
    }

    fn read_protocol<T>(&mut self, endian: Endian) -> io::Result<T::Item>
    where
        T: BinaryReadable,
    {
        T::from_stream(self, endian)
    }

    fn save_restore_position<F, T>(&mut self, f: F) -> io::Result<T>
    where
        F: FnOnce(&mut Self) -> T,
    {
        let position = self.stream_position();
        let result = f(self);
        self.seek_absolute(position)?;
        Ok(result)
    }

    fn seek_relative(&mut self, offset: isize) -> io::Result<()> {
        if let Some(pos) = self.stream_position().checked_add_signed(offset) {
            self.seek_absolute(pos)
        } else {
            Err(io::ErrorKind::UnexpectedEof.into())
        }
    }

    #[must_use]
    fn remaining(&self) -> usize {
        self.len() - self.stream_position()
    }
}

pub(crate) struct ByteSource<'bytes> {
    source: &'bytes [u8],
    pos: usize,
}

impl<'bytes> From<&'bytes [u8]> for ByteSource<'bytes> {
    fn from(source: &'bytes [u8]) -> Self {
        Self { source, pos: 0 }
    }
}

impl Source for ByteSource<'_> {
    fn len(&self) -> usize {
        self.source.len()
    }

    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<()> {
        let start = self.pos;
        let stop = start + buf.len();
        if stop > self.source.len() {
            Err(io::ErrorKind::UnexpectedEof.into())
        } else {
            self.pos = stop;
            buf.copy_from_slice(&self.source[start..stop]);
            Ok(())
        }
    }

    fn seek_absolute(&mut self, pos: usize) -> io::Result<()> {
        if pos > self.source.len() {
            Err(io::ErrorKind::UnexpectedEof.into())
        } else {
            self.pos = pos;
            Ok(())
        }
    }

    fn stream_position(&self) -> usize {
        self.pos
    }
}

pub(crate) trait BinaryReadable {
    type Item;

    fn from_stream<In>(stream: &mut In, endian: Endian) -> io::Result<Self::Item>
    where
        In: ?Sized + Source;
}

macro_rules! make_binary_streamable {
    ($t:ty) => {
        impl BinaryReadable for $t {
            type Item = $t;

            fn from_stream<In>(stream: &mut In, endian: Endian) -> io::Result<Self::Item>
            where
                In: ?Sized + Source,
            {
                let mut bytes = [0u8; mem::size_of::<Self::Item>()];
                stream.read_into(&mut bytes)?;
                Ok(match endian {
                    Endian::Little => Self::from_le_bytes(bytes),
                    Endian::Native => Self::from_ne_bytes(bytes),
                })
            }
        }
    };
}

make_binary_streamable!(u8);
make_binary_streamable!(u16);
make_binary_streamable!(u32);
make_binary_streamable!(u64);

make_binary_streamable!(i8);
make_binary_streamable!(i16);
make_binary_streamable!(i32);
make_binary_streamable!(i64);

macro_rules! make_binary_streamable_tuple {
    ($($t:ident),+) => {
        impl<$($t,)+> BinaryReadable for ($($t,)+)
        where
            $($t: BinaryReadable,)+
        {
            type Item = ($($t::Item,)+);

            fn from_stream<In>(stream: &mut In, endian: Endian) -> io::Result<Self::Item>
            where
                In: ?Sized + Source,
            {
                Ok(($(
                    $t::from_stream(stream, endian)?,
                )+))
            }
        }
    };
}

make_binary_streamable_tuple!(T0);
make_binary_streamable_tuple!(T0, T1);
make_binary_streamable_tuple!(T0, T1, T2);
make_binary_streamable_tuple!(T0, T1, T2, T3);

#[cfg(test)]
mod tests {
    use super::{ByteSource, Endian, Source};

    #[test]
    fn reads_are_little_endian() -> anyhow::Result<()> {
        let data: &[u8] = b"\x01\x23\x45\x67\x89\xAB\xCD\xEF";
        let source = &mut ByteSource::from(data);
        assert_eq!(source.read::<u16>(Endian::Little)?, 0x2301);
        source.seek_absolute(0)?;
        assert_eq!(source.read::<u32>(Endian::Little)?, 0x6745_2301);
        source.seek_absolute(0)?;
        assert_eq!(source.read::<u64>(Endian::Little)?, 0xEFCD_AB89_6745_2301);
        Ok(())
    }

    #[test]
    fn failed_reads_leave_the_buffer_and_cursor_alone() -> anyhow::Result<()> {
        let data: &[u8] = b"ab";
        let source = &mut ByteSource::from(data);
        let mut buf = *b"cd";
        source.read_into(&mut buf)?;
        assert_eq!(&buf, b"ab");

        let result = source.read_into(&mut buf);
        assert!(result.is_err());
        assert_eq!(&buf, b"ab");
        assert_eq!(source.stream_position(), 2);
        Ok(())
    }

    #[test]
    fn eof_reads_fail_without_consuming() -> anyhow::Result<()> {
        let data: &[u8] = b"\x01";
        let source = &mut ByteSource::from(data);
        assert!(source.read::<u32>(Endian::Little).is_err());
        assert_eq!(source.stream_position(), 0);
        assert_eq!(source.read::<u8>(Endian::Little)?, 1);
        Ok(())
    }

    #[test]
    fn seeks_clamp_to_the_source() -> anyhow::Result<()> {
        let data: &[u8] = b"\x01\x23\x45\x67\x89";
        let source = &mut ByteSource::from(data);
        source.seek_absolute(2)?;
        assert_eq!(source.stream_position(), 2);
        source.seek_relative(3)?;
        assert_eq!(source.stream_position(), 5);
        assert!(source.seek_relative(1).is_err());
        assert!(source.seek_relative(-6).is_err());
        Ok(())
    }
}
