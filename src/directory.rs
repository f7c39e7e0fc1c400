use crate::{
    crypto::Keystream,
    io::{Endian, Source},
    protocols::CompactU32,
    strings::Name,
    version::Address,
    Error, Result,
};
use std::io;

/// A named directory or file record: everything a node carries besides its
/// tag. The payload behind a file entry's address is not interpreted here.
#[derive(Clone, Debug, Default)]
pub struct Entry {
    pub(crate) name: Name,
    pub(crate) size: u32,
    pub(crate) check: u32,
    pub(crate) addr: Address,
}

impl Entry {
    #[must_use]
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Size in bytes of the data behind [`offset`](Self::offset).
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// The entry's stored checksum. The reader does not recompute it.
    #[must_use]
    pub fn check(&self) -> u32 {
        self.check
    }

    /// The entry's deobfuscated file offset. Until the owning archive has
    /// committed a version this is the obfuscated word as stored.
    #[must_use]
    pub fn offset(&self) -> u32 {
        self.addr.value
    }
}

/// One slot in a directory.
///
/// Tag 1 is an empty placeholder, tags 3 and 4 are directories and files.
/// Tag 2 is a forward reference whose name and kind live elsewhere in the
/// archive; the reader resolves it on the spot, so no link variant survives
/// parsing.
#[derive(Clone, Debug)]
pub enum Node {
    Empty,
    Directory(Entry),
    File(Entry),
}

mod tags {
    pub(super) const EMPTY: u8 = 1;
    pub(super) const LINK: u8 = 2;
    pub(super) const DIRECTORY: u8 = 3;
    pub(super) const FILE: u8 = 4;

    /// Bytes of filler carried by an empty node.
    pub(super) const EMPTY_FILLER: isize = 10;
}

impl Node {
    #[must_use]
    pub fn entry(&self) -> Option<&Entry> {
        match self {
            Self::Empty => None,
            Self::Directory(entry) | Self::File(entry) => Some(entry),
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&Name> {
        self.entry().map(Entry::name)
    }

    #[must_use]
    pub fn is_directory(&self) -> bool {
        matches!(self, Self::Directory(_))
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }

    fn entry_mut(&mut self) -> Option<&mut Entry> {
        match self {
            Self::Empty => None,
            Self::Directory(entry) | Self::File(entry) => Some(entry),
        }
    }

    pub(crate) fn read<In>(
        source: &mut In,
        start: u32,
        keystream: Option<&Keystream>,
    ) -> Result<Self>
    where
        In: ?Sized + Source,
    {
        let tag: u8 = source.read(Endian::Little)?;
        match tag {
            tags::EMPTY => {
                source.seek_relative(tags::EMPTY_FILLER)?;
                Ok(Self::Empty)
            }
            tags::LINK => {
                let link: u32 = source.read(Endian::Little)?;
                let target = usize::try_from(u64::from(start) + u64::from(link))?;
                let (tag, name) = source.save_restore_position(|source| {
                    Self::read_link_target(source, target, keystream)
                })??;
                Self::read_entry(source, tag, name)
            }
            tags::DIRECTORY | tags::FILE => {
                let name = Name::read(source, keystream)?;
                Self::read_entry(source, tag, name)
            }
            tag => Err(Error::InvalidTag(tag)),
        }
    }

    fn read_link_target<In>(
        source: &mut In,
        target: usize,
        keystream: Option<&Keystream>,
    ) -> Result<(u8, Name)>
    where
        In: ?Sized + Source,
    {
        source.seek_absolute(target)?;
        let tag: u8 = source.read(Endian::Little)?;
        if !matches!(tag, tags::DIRECTORY | tags::FILE) {
            return Err(Error::InvalidTag(tag));
        }
        let name = Name::read(source, keystream)?;
        Ok((tag, name))
    }

    fn read_entry<In>(source: &mut In, tag: u8, name: Name) -> Result<Self>
    where
        In: ?Sized + Source,
    {
        let size = source.read_protocol::<CompactU32>(Endian::Little)?;
        let check = source.read_protocol::<CompactU32>(Endian::Little)?;
        let addr = Address::read(source)?;
        let entry = Entry {
            name,
            size,
            check,
            addr,
        };
        match tag {
            tags::DIRECTORY => Ok(Self::Directory(entry)),
            tags::FILE => Ok(Self::File(entry)),
            tag => Err(Error::InvalidTag(tag)),
        }
    }
}

/// A parsed directory: the nodes in the order they were read.
#[derive(Clone, Debug, Default)]
pub struct Directory {
    pub(crate) nodes: Vec<Node>,
}

impl Directory {
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Finds the first directory or file node with the given decrypted name.
    #[must_use]
    pub fn get(&self, name: &[u8]) -> Option<&Node> {
        self.nodes
            .iter()
            .find(|node| node.name().is_some_and(|n| n.as_bytes() == name))
    }

    pub(crate) fn read<In>(
        source: &mut In,
        start: u32,
        keystream: Option<&Keystream>,
    ) -> Result<Self>
    where
        In: ?Sized + Source,
    {
        let len = source.read_protocol::<CompactU32>(Endian::Little)?;
        let len = usize::try_from(len)?;
        if len > source.remaining() {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }

        let mut nodes = Vec::with_capacity(len);
        for _ in 0..len {
            nodes.push(Node::read(source, start, keystream)?);
        }
        Ok(Self { nodes })
    }

    /// Rewrites every entry address with its deobfuscated offset.
    pub(crate) fn decode_addresses(&mut self, start: u32, hash: u32) {
        for entry in self.nodes.iter_mut().filter_map(Node::entry_mut) {
            entry.addr.value = entry.addr.decode(start, hash);
        }
    }

    /// Decrypts every entry name in place.
    pub(crate) fn decode_names(&mut self, keystream: &Keystream) -> Result<()> {
        for entry in self.nodes.iter_mut().filter_map(Node::entry_mut) {
            entry.name.decode(keystream)?;
        }
        Ok(())
    }
}

impl<'nodes> IntoIterator for &'nodes Directory {
    type Item = &'nodes Node;
    type IntoIter = core::slice::Iter<'nodes, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{Directory, Node};
    use crate::{
        crypto::Keystream,
        io::{ByteSource, Source as _},
        Error,
    };

    const NODE_GAUNTLET: &[u8] = b"\x01\xFF\xFF\xFF\xFF\xFF\xFF\xFF\xFF\xFF\xFF\
                                   \x02\x29\x00\x00\x00\x01\x02\x01\x23\x45\x67\
                                   \x03\xFE\x01\x23\x01\x02\x01\x23\x45\x67\
                                   \x04\xFE\x01\x23\x01\x02\x01\x23\x45\x67\
                                   \x05\
                                   \x03\xFE\x01\x23";

    #[test]
    fn reads_every_node_kind() -> anyhow::Result<()> {
        let source = &mut ByteSource::from(NODE_GAUNTLET);

        let node = Node::read(source, 0x2, None)?;
        assert!(matches!(node, Node::Empty));
        assert!(node.entry().is_none());

        // the link at offset 11 resolves to the trailing record at
        // 0x2 + 0x29 while its body is read in place
        let node = Node::read(source, 0x2, None)?;
        assert!(node.is_directory());
        let entry = node.entry().unwrap();
        assert_eq!(entry.name().as_bytes(), b"\x01\x23");
        assert_eq!((entry.size(), entry.check()), (1, 2));
        assert_eq!(entry.offset(), 0x6745_2301);

        let node = Node::read(source, 0x2, None)?;
        assert!(node.is_directory());
        assert_eq!(node.name().unwrap().as_bytes(), b"\x01\x23");

        let node = Node::read(source, 0x2, None)?;
        assert!(node.is_file());
        assert_eq!(node.name().unwrap().as_bytes(), b"\x01\x23");

        let result = Node::read(source, 0x2, None);
        assert!(matches!(result, Err(Error::InvalidTag(5))));
        Ok(())
    }

    #[test]
    fn link_nodes_decrypt_their_target_name() -> anyhow::Result<()> {
        let keystream = Keystream::from_bytes(b"\xCA\xEA");
        let source = &mut ByteSource::from(NODE_GAUNTLET);
        source.seek_absolute(11)?;
        let node = Node::read(source, 0x2, Some(&keystream))?;
        assert_eq!(node.name().unwrap().as_bytes(), b"ab");
        assert_eq!(source.stream_position(), 22);
        Ok(())
    }

    #[test]
    fn reads_a_directory() -> anyhow::Result<()> {
        let data: &[u8] = b"\x03\
                            \x01\xFF\xFF\xFF\xFF\xFF\xFF\xFF\xFF\xFF\xFF\
                            \x03\xFE\x01\x23\x01\x02\x01\x23\x45\x67\
                            \x04\xFE\x01\x23\x01\x02\x01\x23\x45\x67";
        let directory = Directory::read(&mut ByteSource::from(data), 0, None)?;
        assert_eq!(directory.len(), 3);
        assert!(matches!(directory.nodes()[0], Node::Empty));
        assert!(directory.nodes()[1].is_directory());
        assert!(directory.nodes()[2].is_file());
        assert_eq!(
            directory.get(b"\x01\x23").unwrap().entry().unwrap().size(),
            1
        );
        assert!(directory.get(b"zz").is_none());
        Ok(())
    }

    #[test]
    fn a_bad_node_fails_the_whole_directory() {
        let data: &[u8] = b"\x03\
                            \x01\xFF\xFF\xFF\xFF\xFF\xFF\xFF\xFF\xFF\xFF\
                            \x03\xFE\x01\x23\x01\x02\x01\x23\x45\x67\
                            \x02";
        let result = Directory::read(&mut ByteSource::from(data), 0, None);
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn an_empty_directory_is_valid() -> anyhow::Result<()> {
        let directory = Directory::read(&mut ByteSource::from(b"\x00".as_slice()), 0, None)?;
        assert!(directory.is_empty());
        Ok(())
    }
}
