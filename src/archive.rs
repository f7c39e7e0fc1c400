use crate::{
    containers::Bytes,
    crypto::{self, Keystream},
    directory::{Directory, Entry, Node},
    header::Header,
    io::{ByteSource, Endian, Source},
    strings::{Encoding, Name},
    version::{self, Version},
    Borrowed, Copied, Error, Reader, Result,
};
use memmap2::MmapOptions;
use std::{fs::File, sync::Arc};

/// An opened archive: the source bytes, the parsed prologue, the committed
/// version, the keystream the key deducer settled on, and the root
/// directory.
///
/// Deeper directories are not parsed up front; descend with
/// [`read_directory`](Self::read_directory).
pub struct Archive<'bytes> {
    data: Bytes<'bytes>,
    header: Header,
    version: Version,
    keystream: Keystream,
    root: Directory,
}

impl<'bytes> Archive<'bytes> {
    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    #[must_use]
    pub fn version(&self) -> Version {
        self.version
    }

    #[must_use]
    pub fn root(&self) -> &Directory {
        &self.root
    }

    /// Parses the directory a directory entry points at, decrypting names
    /// and deobfuscating child addresses with the state bound at open.
    pub fn read_directory(&self, entry: &Entry) -> Result<Directory> {
        let bytes = self.data.as_bytes();
        let offset = usize::try_from(entry.offset())?;
        if offset > bytes.len() {
            return Err(Error::AddressOutOfBounds(entry.offset()));
        }

        let source = &mut ByteSource::from(bytes);
        source.seek_absolute(offset)?;
        let mut directory = Directory::read(source, self.header.start(), Some(&self.keystream))?;
        directory.decode_addresses(self.header.start(), self.version.hash());
        Ok(directory)
    }

    /// The raw bytes behind a file entry, `size` bytes from its offset.
    /// No payload decoding is performed.
    pub fn file_data(&self, entry: &Entry) -> Result<&[u8]> {
        let bytes = self.data.as_bytes();
        let start = usize::try_from(entry.offset())?;
        let stop = start
            .checked_add(usize::try_from(entry.size())?)
            .ok_or(Error::IntegralTruncation)?;
        bytes
            .get(start..stop)
            .ok_or(Error::AddressOutOfBounds(entry.offset()))
    }

    fn do_read(data: Bytes<'bytes>) -> Result<Self> {
        let bytes = data.as_bytes();
        let source = &mut ByteSource::from(bytes);

        let header = Header::read(source)?;
        let encoded: u16 = source.read(Endian::Little)?;

        // the key is unknown until the root has been seen, so names come
        // out raw here and are decrypted once the deducers have run
        let mut root = Directory::read(source, header.start(), None)?;
        let version = version::deduce(encoded, &root, header.start(), bytes.len() as u64)?;
        root.decode_addresses(header.start(), version.hash());

        let keystream = Self::deduce_keystream(&root)?;
        root.decode_names(&keystream)?;

        Ok(Self {
            data,
            header,
            version,
            keystream,
            root,
        })
    }

    /// Tries each regional keystream until one decrypts every root entry
    /// name to printable text.
    fn deduce_keystream(root: &Directory) -> Result<Keystream> {
        Keystream::candidates()
            .into_iter()
            .find(|candidate| {
                root.nodes()
                    .iter()
                    .filter_map(Node::entry)
                    .all(|entry| decodes_printable(entry.name(), candidate))
            })
            .ok_or(Error::KeyNotFound)
    }
}

fn decodes_printable(name: &Name, keystream: &Keystream) -> bool {
    let mut bytes = name.as_bytes().to_vec();
    if crypto::decode(&mut bytes, name.encoding(), Some(keystream)).is_err() {
        return false;
    }
    let printable = |unit: u16| (0x20..=0x7E).contains(&unit);
    match name.encoding() {
        Encoding::Ascii => bytes.iter().all(|&byte| printable(u16::from(byte))),
        Encoding::Utf16Le => bytes
            .chunks_exact(2)
            .all(|unit| printable(u16::from_le_bytes([unit[0], unit[1]]))),
    }
}

impl<'bytes> Reader<Borrowed<'bytes>> for Archive<'bytes> {
    type Error = Error;
    type Item = Archive<'bytes>;

    fn read(source: Borrowed<'bytes>) -> Result<Self::Item> {
        Archive::do_read(Bytes::from_borrowed(source.0))
    }
}

impl<'bytes> Reader<Copied<'bytes>> for Archive<'static> {
    type Error = Error;
    type Item = Archive<'static>;

    fn read(source: Copied<'bytes>) -> Result<Self::Item> {
        Archive::do_read(Bytes::from_owned(source.0.to_vec()))
    }
}

impl Reader<&File> for Archive<'static> {
    type Error = Error;
    type Item = Archive<'static>;

    fn read(source: &File) -> Result<Self::Item> {
        let mapping = unsafe { MmapOptions::new().map(source) }?;
        let len = mapping.len();
        Archive::do_read(Bytes::from_mapped(0, len, Arc::new(mapping)))
    }
}
