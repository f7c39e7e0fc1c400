use crate::{strings::Encoding, Error, Result};
use aes::cipher::{KeyIvInit, StreamCipher};
use ofb::Ofb;

/// The longest string any archive can hold, and therefore the length of
/// every keystream pad.
const MAX_CHARS: usize = 0x1_0000;

/// The AES-256 key shared by every regional variant of the format.
const KEY: [u8; 32] = [
    0x13, 0x00, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00, //
    0x06, 0x00, 0x00, 0x00, 0xB4, 0x00, 0x00, 0x00, //
    0x1B, 0x00, 0x00, 0x00, 0x0F, 0x00, 0x00, 0x00, //
    0x33, 0x00, 0x00, 0x00, 0x52, 0x00, 0x00, 0x00, //
];

/// Per-region IV seeds. The IV is the seed repeated four times.
const IV_SEEDS: [[u8; 4]; 2] = [
    [0x4D, 0x23, 0xC7, 0x2B], // global
    [0xB9, 0x7D, 0x63, 0xE9], // taiwan/korea
];

/// An AES-256-OFB pad XORed against string ciphertext alongside the mask
/// schedule. Regions that never encrypted their string tables are modelled
/// by the all-zero pad.
pub(crate) struct Keystream {
    bytes: Box<[u8]>,
}

impl Keystream {
    /// Every candidate pad, in the order the key deducer tries them.
    #[must_use]
    pub(crate) fn candidates() -> [Self; 3] {
        [
            Self::expand(IV_SEEDS[0]),
            Self::expand(IV_SEEDS[1]),
            Self::zeroed(),
        ]
    }

    fn expand(seed: [u8; 4]) -> Self {
        let mut iv = [0u8; 16];
        for chunk in iv.chunks_exact_mut(4) {
            chunk.copy_from_slice(&seed);
        }

        let mut bytes = vec![0u8; MAX_CHARS];
        let mut cipher = Ofb::<aes::Aes256>::new((&KEY).into(), (&iv).into());
        cipher.apply_keystream(&mut bytes);
        Self {
            bytes: bytes.into_boxed_slice(),
        }
    }

    fn zeroed() -> Self {
        Self {
            bytes: vec![0u8; MAX_CHARS].into_boxed_slice(),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    #[must_use]
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Decrypts string bytes in place: each unit is XORed with the incrementing
/// mask schedule and the keystream pad. Without a keystream this is a no-op.
pub(crate) fn decode(
    bytes: &mut [u8],
    encoding: Encoding,
    keystream: Option<&Keystream>,
) -> Result<()> {
    let Some(keystream) = keystream else {
        return Ok(());
    };

    let pad = keystream.as_bytes();
    if pad.len() < bytes.len() {
        return Err(Error::KeystreamExhausted);
    }

    match encoding {
        Encoding::Ascii => {
            let mut mask = 0xAAu8;
            for (byte, &pad) in bytes.iter_mut().zip(pad) {
                *byte ^= mask ^ pad;
                mask = mask.wrapping_add(1);
            }
        }
        Encoding::Utf16Le => {
            let mut mask = 0xAAAAu16;
            for (unit, pad) in bytes.chunks_exact_mut(2).zip(pad.chunks_exact(2)) {
                let decoded = u16::from_le_bytes([unit[0], unit[1]])
                    ^ mask
                    ^ u16::from_le_bytes([pad[0], pad[1]]);
                unit.copy_from_slice(&decoded.to_le_bytes());
                mask = mask.wrapping_add(1);
            }
        }
    }

    Ok(())
}
