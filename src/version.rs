use crate::{
    directory::{Directory, Node},
    io::{Endian, Source},
    Error, Result,
};

/// The archive version: the obfuscated word as stored, the brute-forced
/// real version, and the 32-bit hash that deobfuscates addresses.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Version {
    pub(crate) enc: u16,
    pub(crate) dec: u16,
    pub(crate) hash: u32,
}

impl Version {
    /// The version word as stored in the archive.
    #[must_use]
    pub fn encoded(&self) -> u16 {
        self.enc
    }

    /// The deduced real version.
    #[must_use]
    pub fn decoded(&self) -> u16 {
        self.dec
    }

    /// The multiplier recovered from the decoded version's decimal digits.
    #[must_use]
    pub fn hash(&self) -> u32 {
        self.hash
    }
}

/// Folds a decoded version into its stored word and address hash.
///
/// The hash accumulates `h = (h << 5) + digit + 1` over the decimal ASCII
/// digits; the stored word XORs the hash's four bytes together with `0xFF`.
pub(crate) fn encode(decoded: u16) -> (u16, u32) {
    let mut hash = 0u32;
    for digit in decoded.to_string().bytes() {
        hash = (hash << 5).wrapping_add(u32::from(digit) + 1);
    }
    #[allow(clippy::cast_possible_truncation)]
    let enc = 0xFF ^ (hash >> 24) as u8 ^ (hash >> 16) as u8 ^ (hash >> 8) as u8 ^ hash as u8;
    (u16::from(enc), hash)
}

/// Brute-forces the decoded version against the stored word.
///
/// A candidate is committed once every entry address in the already-parsed
/// root directory deobfuscates, under the candidate's hash, to an offset
/// inside the source. Exhausting `1..=32767` is an error.
pub(crate) fn deduce(
    encoded: u16,
    root: &Directory,
    start: u32,
    source_len: u64,
) -> Result<Version> {
    for decoded in 1..=0x7FFF {
        let (candidate, hash) = encode(decoded);
        if candidate != encoded {
            continue;
        }
        if validate(root, start, hash, source_len) {
            return Ok(Version {
                enc: encoded,
                dec: decoded,
                hash,
            });
        }
    }
    Err(Error::VersionNotFound)
}

fn validate(root: &Directory, start: u32, hash: u32, source_len: u64) -> bool {
    root.nodes()
        .iter()
        .filter_map(Node::entry)
        .all(|entry| u64::from(entry.addr.decode(start, hash)) <= source_len)
}

/// An obfuscated file offset together with the position it was read from;
/// both feed the deobfuscation below.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct Address {
    pub(crate) value: u32,
    pub(crate) position: u32,
}

impl Address {
    pub(crate) fn read<In>(source: &mut In) -> Result<Self>
    where
        In: ?Sized + Source,
    {
        let position = u32::try_from(source.stream_position())?;
        let value = source.read(Endian::Little)?;
        Ok(Self { value, position })
    }

    /// Recovers the real file offset. All arithmetic wraps in `u32`; the
    /// rotate amount is the low five bits of the value being rotated.
    #[must_use]
    pub(crate) fn decode(self, start: u32, hash: u32) -> u32 {
        let mut x = self.position.wrapping_sub(start) ^ 0xFFFF_FFFF;
        x = x.wrapping_mul(hash).wrapping_sub(0x581C_3F6D);
        x = x.rotate_left(x & 0x1F);
        (x ^ self.value).wrapping_add(start.wrapping_mul(2))
    }
}
