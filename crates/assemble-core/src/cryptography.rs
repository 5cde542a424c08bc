//! Sha256 hashing, used to fingerprint task inputs and outputs.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::Digest;
use std::fmt::{Display, Formatter};
use std::io;
use std::io::Read;
use std::num::ParseIntError;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Number of bytes in a sha256 digest
pub const SHA256_BYTES: usize = 256 / 8;

/// The output of sha256 hashing
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Sha256([u8; SHA256_BYTES]);

impl Sha256 {
    /// The raw bytes of the digest
    pub fn as_bytes(&self) -> &[u8; SHA256_BYTES] {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum ParseSha256Error {
    #[error("Expected a string of 64 hex digits (len = {0})")]
    WrongSize(usize),
    #[error(transparent)]
    ParseIntError(#[from] ParseIntError),
}

impl FromStr for Sha256 {
    type Err = ParseSha256Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != SHA256_BYTES * 2 || !s.is_ascii() {
            return Err(ParseSha256Error::WrongSize(s.chars().count()));
        }

        let mut bytes = [0_u8; SHA256_BYTES];
        for (index, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[(index * 2)..][..2], 16)?;
        }
        Ok(Self(bytes))
    }
}

impl Display for Sha256 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl Serialize for Sha256 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_string().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Sha256 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let string = String::deserialize(deserializer)?;
        Sha256::from_str(&string).map_err(D::Error::custom)
    }
}

/// An incremental sha256 hasher
#[derive(Default)]
pub struct Sha256Hasher {
    hasher: sha2::Sha256,
}

impl Sha256Hasher {
    /// Create a new hasher
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the hasher with some bytes
    pub fn update<B: AsRef<[u8]> + ?Sized>(&mut self, value: &B) {
        self.hasher.update(value.as_ref());
    }

    /// Update the hasher with the entire contents of a reader
    pub fn update_from_reader<R: Read>(&mut self, mut reader: R) -> io::Result<()> {
        let mut buffer = [0_u8; 8 * 1024];
        loop {
            let read = reader.read(&mut buffer)?;
            if read == 0 {
                return Ok(());
            }
            self.hasher.update(&buffer[..read]);
        }
    }

    /// Finish hashing
    pub fn finalize(self) -> Sha256 {
        let mut output = [0_u8; SHA256_BYTES];
        output.copy_from_slice(self.hasher.finalize().as_slice());
        Sha256(output)
    }
}

/// Convenience method for hashing a value into a [`Sha256`](Sha256) value
pub fn hash_sha256<B: AsRef<[u8]> + ?Sized>(value: &B) -> Sha256 {
    let mut hasher = Sha256Hasher::new();
    hasher.update(value);
    hasher.finalize()
}

/// Hashes the contents of a file into a [`Sha256`](Sha256) value
pub fn hash_file_sha256<P: AsRef<Path> + ?Sized>(path: &P) -> io::Result<Sha256> {
    let file = std::fs::File::open(path)?;
    let mut hasher = Sha256Hasher::new();
    hasher.update_from_reader(io::BufReader::new(file))?;
    Ok(hasher.finalize())
}
