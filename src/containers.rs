use memmap2::Mmap;
use std::sync::Arc;

mod detail {
    use memmap2::Mmap;
    use std::sync::Arc;

    pub enum Bytes<'bytes> {
        Owned(Vec<u8>),
        Borrowed(&'bytes [u8]),
        Mapped {
            pos: usize,
            len: usize,
            source: Arc<Mmap>,
        },
    }
}

use detail::Bytes::*;

pub(crate) struct Bytes<'bytes> {
    container: detail::Bytes<'bytes>,
}

impl<'bytes> Bytes<'bytes> {
    #[must_use]
    pub(crate) fn as_bytes(&self) -> &[u8] {
        match &self.container {
            Owned(bytes) => bytes,
            Borrowed(bytes) => bytes,
            Mapped { pos, len, source } => &source[*pos..*pos + *len],
        }
    }

    #[must_use]
    pub(crate) fn from_borrowed(bytes: &'bytes [u8]) -> Self {
        Self {
            container: Borrowed(bytes),
        }
    }

    #[must_use]
    pub(crate) fn from_owned(bytes: Vec<u8>) -> Self {
        Self {
            container: Owned(bytes),
        }
    }

    #[must_use]
    pub(crate) fn from_mapped(pos: usize, len: usize, source: Arc<Mmap>) -> Self {
        Self {
            container: Mapped { pos, len, source },
        }
    }

}
