use crate::{
    io::{Endian, Source},
    Error, Result,
};
use bstr::BString;
use std::io;

/// The fixed-layout prologue of every archive: a magic, the content size,
/// the content start offset, and a copyright string filling the gap up to
/// that offset.
///
/// The magic is structural only; the format family never compares it to a
/// constant, so neither does the reader.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Header {
    ident: [u8; 4],
    size: u64,
    start: u32,
    copyright: BString,
}

impl Header {
    #[must_use]
    pub fn ident(&self) -> [u8; 4] {
        self.ident
    }

    /// Size in bytes of the archive content past the prologue.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Offset at which the archive content begins. Address deobfuscation
    /// pivots on this value.
    #[must_use]
    pub fn start(&self) -> u32 {
        self.start
    }

    #[must_use]
    pub fn copyright(&self) -> &[u8] {
        &self.copyright
    }

    pub(crate) fn read<In>(source: &mut In) -> Result<Self>
    where
        In: ?Sized + Source,
    {
        let mut ident = [0u8; 4];
        source.read_into(&mut ident)?;
        let (size, start): (u64, u32) = source.read(Endian::Little)?;

        let position = u32::try_from(source.stream_position())?;
        if start < position {
            return Err(Error::MalformedHeader);
        }
        let gap = (start - position) as usize;
        if gap > source.remaining() {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }

        let mut copyright = vec![0u8; gap];
        source.read_into(&mut copyright)?;
        Ok(Self {
            ident,
            size,
            start,
            copyright: copyright.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Header;
    use crate::{io::ByteSource, Error};

    #[test]
    fn reads_the_prologue() -> anyhow::Result<()> {
        let data: &[u8] = b"\x01\x23\x45\x67\
                            \x12\x00\x00\x00\x00\x00\x00\x00\
                            \x12\x00\x00\x00\
                            ab";
        let header = Header::read(&mut ByteSource::from(data))?;
        assert_eq!(header.ident(), *b"\x01\x23\x45\x67");
        assert_eq!(header.size(), 18);
        assert_eq!(header.start(), 18);
        assert_eq!(header.copyright(), b"ab");
        Ok(())
    }

    #[test]
    fn short_copyright_fails() {
        let data: &[u8] = b"\x01\x23\x45\x67\
                            \x12\x00\x00\x00\x00\x00\x00\x00\
                            \x12\x00\x00\x00\
                            a";
        let result = Header::read(&mut ByteSource::from(data));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn start_before_the_prologue_fails() {
        let data: &[u8] = b"\x01\x23\x45\x67\
                            \x12\x00\x00\x00\x00\x00\x00\x00\
                            \x0C\x00\x00\x00\
                            ab";
        let result = Header::read(&mut ByteSource::from(data));
        assert!(matches!(result, Err(Error::MalformedHeader)));
    }
}
