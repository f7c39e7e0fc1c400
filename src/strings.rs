use crate::{
    crypto::{self, Keystream},
    io::{Endian, Source},
    Result,
};
use bstr::BString;
use std::io;

/// How a [`Name`]'s bytes are to be interpreted once decrypted.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Encoding {
    #[default]
    Ascii,
    Utf16Le,
}

/// A decrypted node name.
///
/// Names are stored with a signed length prefix: negative values select the
/// single-byte encoding (`-128` escaping to a full `u32` byte count) and
/// positive values the double-byte encoding (`127` escaping to a full `u32`
/// unit count). The asymmetry between the two escape pivots is part of the
/// format and preserved as-is.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Name {
    bytes: BString,
    encoding: Encoding,
}

impl Name {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub(crate) fn read<In>(source: &mut In, keystream: Option<&Keystream>) -> Result<Self>
    where
        In: ?Sized + Source,
    {
        let prefix: i8 = source.read(Endian::Little)?;
        let (encoding, len) = if prefix < 0 {
            let len = if prefix == i8::MIN {
                source.read::<u32>(Endian::Little)?
            } else {
                u32::from(prefix.unsigned_abs())
            };
            (Encoding::Ascii, u64::from(len))
        } else if prefix > 0 {
            let units = if prefix == i8::MAX {
                source.read::<u32>(Endian::Little)?
            } else {
                u32::from(prefix.unsigned_abs())
            };
            (Encoding::Utf16Le, u64::from(units) * 2)
        } else {
            (Encoding::Ascii, 0)
        };
        let len = usize::try_from(len)?;

        if len > source.remaining() {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }

        let mut bytes = vec![0u8; len];
        source.read_into(&mut bytes)?;
        crypto::decode(&mut bytes, encoding, keystream)?;
        Ok(Self {
            bytes: bytes.into(),
            encoding,
        })
    }

    pub(crate) fn decode(&mut self, keystream: &Keystream) -> Result<()> {
        crypto::decode(&mut self.bytes, self.encoding, Some(keystream))
    }
}

impl core::fmt::Display for Name {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.bytes, f)
    }
}

#[cfg(test)]
mod tests {
    use super::{Encoding, Name};
    use crate::{
        crypto::Keystream,
        io::{ByteSource, Source as _},
    };

    const GAUNTLET: &[u8] = b"\xFE\x01\x23\
                              \x80\x02\x00\x00\x00\x45\x67\
                              \x01\x89\xAB\
                              \x7F\x03\x00\x00\x00\xCD\xEF\x01\x23\x45\x67";

    #[test]
    fn reads_every_prefix_form_raw() -> anyhow::Result<()> {
        let source = &mut ByteSource::from(GAUNTLET);

        let name = Name::read(source, None)?;
        assert_eq!(name.as_bytes(), b"\x01\x23");
        assert_eq!(name.encoding(), Encoding::Ascii);

        let name = Name::read(source, None)?;
        assert_eq!(name.as_bytes(), b"\x45\x67");
        assert_eq!(name.encoding(), Encoding::Ascii);

        let name = Name::read(source, None)?;
        assert_eq!(name.as_bytes(), b"\x89\xAB");
        assert_eq!(name.encoding(), Encoding::Utf16Le);

        let name = Name::read(source, None)?;
        assert_eq!(name.as_bytes(), b"\xCD\xEF\x01\x23\x45\x67");
        assert_eq!(name.encoding(), Encoding::Utf16Le);
        assert_eq!(source.stream_position(), GAUNTLET.len());
        Ok(())
    }

    #[test]
    fn reads_every_prefix_form_decrypted() -> anyhow::Result<()> {
        let keystream = Keystream::from_bytes(b"\x01\x23\x45\x67\x89\xAB");
        let source = &mut ByteSource::from(GAUNTLET);

        let name = Name::read(source, Some(&keystream))?;
        assert_eq!(name.as_bytes(), b"\xAA\xAB");

        let name = Name::read(source, Some(&keystream))?;
        assert_eq!(name.as_bytes(), b"\xEE\xEF");

        let name = Name::read(source, Some(&keystream))?;
        assert_eq!(name.as_bytes(), b"\x22\x22");

        let name = Name::read(source, Some(&keystream))?;
        assert_eq!(name.as_bytes(), b"\x66\x66\xEF\xEE\x60\x66");
        Ok(())
    }

    #[test]
    fn zero_prefix_is_an_empty_name() -> anyhow::Result<()> {
        let source = &mut ByteSource::from(b"\x00\xFF".as_slice());
        let name = Name::read(source, None)?;
        assert!(name.is_empty());
        assert_eq!(source.stream_position(), 1);
        Ok(())
    }

    #[test]
    fn truncated_names_fail() {
        let source = &mut ByteSource::from(b"\xFD\x01\x23".as_slice());
        assert!(Name::read(source, None).is_err());
    }
}
