#![warn(
    clippy::pedantic,
    clippy::single_char_lifetime_names,
    clippy::std_instead_of_core
)]
#![allow(clippy::enum_glob_use, clippy::missing_errors_doc)]

//! A reader for the Wizet archive file format.
//!
//! Archives package game content as nested directories of named, typed
//! assets. Offsets inside an archive are obfuscated with an unknown
//! version hash and string tables are encrypted with a per-region AES-OFB
//! keystream; opening an archive recovers both by brute force and binds
//! them to the returned handle.
//!
//! # Reading
//! ```rust
//! use wz::{prelude::*, Archive};
//! use std::{fs, path::Path};
//!
//! fn example() -> Option<()> {
//!     let path = Path::new("path/to/Base.wz");
//!     let file = fs::File::open(path).ok()?;
//!     let archive = Archive::read(&file).ok()?;
//!     for node in archive.root() {
//!         if let Some(entry) = node.entry() {
//!             println!("{} ({} bytes)", entry.name(), entry.size());
//!         }
//!     }
//!     Some(())
//! }
//! ```
//!
//! The tree is populated lazily: [`Archive::read_directory`] descends one
//! directory entry at a time, and [`Archive::file_data`] exposes a file
//! entry's raw payload without interpreting it.

mod archive;
mod containers;
mod crypto;
mod directory;
mod header;
mod io;
mod protocols;
mod strings;
mod version;

pub use self::{
    archive::Archive,
    directory::{Directory, Entry, Node},
    header::Header,
    strings::{Encoding, Name},
    version::Version,
};

/// Archive data borrowed from the caller; the archive borrows it for its
/// whole lifetime.
pub struct Borrowed<'borrow>(pub &'borrow [u8]);

/// Archive data copied out of the caller's slice; the archive owns the
/// copy.
pub struct Copied<'copy>(pub &'copy [u8]);

mod private {
    use crate::Archive;

    pub trait Sealed {}

    impl Sealed for Archive<'_> {}
}

use private::Sealed;

pub trait Reader<T>: Sealed {
    type Error;
    type Item;

    fn read(source: T) -> core::result::Result<Self::Item, Self::Error>;
}

use core::num::TryFromIntError;
use std::io as std_io;

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("deobfuscated address {0:#x} lies outside the archive")]
    AddressOutOfBounds(u32),

    #[error("an operation on an integer would have truncated and corrupted data")]
    IntegralTruncation,

    #[error("invalid node tag read from directory: {0}")]
    InvalidTag(u8),

    #[error("no candidate keystream decrypts the root directory names to printable text")]
    KeyNotFound,

    #[error("the keystream is shorter than the string it should decrypt")]
    KeystreamExhausted,

    #[error("the start offset read from the header lies inside the header itself")]
    MalformedHeader,

    #[error("no version in 1..=32767 matches the encoded version word")]
    VersionNotFound,

    #[error(transparent)]
    Io(#[from] std_io::Error),
}

impl From<TryFromIntError> for Error {
    fn from(_: TryFromIntError) -> Self {
        Self::IntegralTruncation
    }
}

pub type Result<T> = core::result::Result<T, Error>;

pub use bstr::{BStr, BString};

pub mod prelude {
    pub use crate::Reader as _;
}
