//! Fixed-width ABI word packing.
//!
//! Every value is laid out as a 32-byte big-endian word: addresses are
//! left-padded with 12 zero bytes, unsigned integers are left-padded with
//! zeros. Readers go the other way and refuse words whose padding is dirty
//! or whose value does not fit the requested width.

use crate::address::Address;
use crate::hash::ContentHash;

/// Size of one ABI word in bytes.
pub const WORD_LEN: usize = 32;

/// Bytes of zero padding in front of an address word.
const ADDRESS_PAD: usize = 12;

/// Pack an address into a 32-byte word.
#[must_use]
pub fn pack_address(address: &Address) -> [u8; WORD_LEN] {
    let mut word = [0u8; WORD_LEN];
    word[ADDRESS_PAD..].copy_from_slice(address.as_bytes());
    word
}

/// Pack an unsigned integer into a 32-byte big-endian word.
#[must_use]
pub fn pack_uint(value: u64) -> [u8; WORD_LEN] {
    let mut word = [0u8; WORD_LEN];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Pack a 128-bit unsigned integer into a 32-byte big-endian word.
#[must_use]
pub fn pack_u128(value: u128) -> [u8; WORD_LEN] {
    let mut word = [0u8; WORD_LEN];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Pack a boolean into a 32-byte word.
#[must_use]
pub fn pack_bool(value: bool) -> [u8; WORD_LEN] {
    pack_uint(u64::from(value))
}

/// Builder for a concatenation of ABI words.
///
/// Dynamic `bytes` values are committed to by their Keccak-256 hash, which
/// is how EIP-712 struct hashing treats them.
#[derive(Debug, Clone, Default)]
pub struct AbiPacker {
    buf: Vec<u8>,
}

impl AbiPacker {
    /// Create an empty packer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a packer with room for `words` words.
    #[must_use]
    pub fn with_words(words: usize) -> Self {
        Self {
            buf: Vec::with_capacity(words.saturating_mul(WORD_LEN)),
        }
    }

    /// Append raw bytes without padding.
    #[must_use]
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Append a pre-formed 32-byte word.
    #[must_use]
    pub fn word(self, word: &[u8; WORD_LEN]) -> Self {
        self.raw(word)
    }

    /// Append an address word.
    #[must_use]
    pub fn address(self, address: &Address) -> Self {
        self.word(&pack_address(address))
    }

    /// Append an unsigned integer word.
    #[must_use]
    pub fn uint(self, value: u64) -> Self {
        self.word(&pack_uint(value))
    }

    /// Append a 128-bit unsigned integer word.
    #[must_use]
    pub fn u128(self, value: u128) -> Self {
        self.word(&pack_u128(value))
    }

    /// Append a hash as a word.
    #[must_use]
    pub fn hash(self, hash: &ContentHash) -> Self {
        self.word(hash.as_bytes())
    }

    /// Append the Keccak-256 hash of dynamic bytes.
    #[must_use]
    pub fn bytes_hash(self, bytes: &[u8]) -> Self {
        self.hash(&ContentHash::hash(bytes))
    }

    /// Number of bytes packed so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been packed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Return the packed bytes.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    /// Keccak-256 of the packed bytes.
    #[must_use]
    pub fn digest(&self) -> ContentHash {
        ContentHash::hash(&self.buf)
    }
}

/// Borrow the 32-byte word starting at `offset`.
#[must_use]
pub fn read_word(data: &[u8], offset: usize) -> Option<&[u8; WORD_LEN]> {
    let end = offset.checked_add(WORD_LEN)?;
    data.get(offset..end)?.try_into().ok()
}

/// Interpret a word as a `u64`, refusing values that do not fit.
#[must_use]
pub fn word_to_u64(word: &[u8; WORD_LEN]) -> Option<u64> {
    if word[..24].iter().any(|b| *b != 0) {
        return None;
    }
    let mut be = [0u8; 8];
    be.copy_from_slice(&word[24..]);
    Some(u64::from_be_bytes(be))
}

/// Interpret a word as a `usize` offset or length.
#[must_use]
pub fn word_to_usize(word: &[u8; WORD_LEN]) -> Option<usize> {
    word_to_u64(word).and_then(|v| usize::try_from(v).ok())
}

/// Interpret a word as an address, refusing dirty padding.
#[must_use]
pub fn word_to_address(word: &[u8; WORD_LEN]) -> Option<Address> {
    if word[..ADDRESS_PAD].iter().any(|b| *b != 0) {
        return None;
    }
    Address::try_from_slice(&word[ADDRESS_PAD..])
}

/// Interpret a word as a boolean; only 0 and 1 are valid.
#[must_use]
pub fn word_to_bool(word: &[u8; WORD_LEN]) -> Option<bool> {
    match word_to_u64(word)? {
        0 => Some(false),
        1 => Some(true),
        _ => None,
    }
}

/// Read a `u64` word at `offset`.
#[must_use]
pub fn read_u64(data: &[u8], offset: usize) -> Option<u64> {
    read_word(data, offset).and_then(word_to_u64)
}

/// Read a `usize` word at `offset`.
#[must_use]
pub fn read_usize(data: &[u8], offset: usize) -> Option<usize> {
    read_word(data, offset).and_then(word_to_usize)
}

/// Read an address word at `offset`.
#[must_use]
pub fn read_address(data: &[u8], offset: usize) -> Option<Address> {
    read_word(data, offset).and_then(word_to_address)
}

/// Read a boolean word at `offset`.
#[must_use]
pub fn read_bool(data: &[u8], offset: usize) -> Option<bool> {
    read_word(data, offset).and_then(word_to_bool)
}
