//! Named hash algorithms, allow-list enforcement, and digest encoding.
//!
//! `RECORD` entries store hashes as `"<algo>=<digest>"`, where `<digest>` is the raw
//! digest bytes encoded as unpadded urlsafe base64:
//! <https://www.python.org/dev/peps/pep-0376/#record>

use data_encoding::BASE64URL_NOPAD;
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::io::{self, Read, Write};

use crate::Error;

/// A hash algorithm this crate knows how to compute.
///
/// `RECORD` rows may reference other algorithm names (the PEP only requires the name be
/// a hashlib-recognized identifier), but this crate can only *produce* digests for the
/// `sha2` family already in its dependency stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    pub fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "sha256" => Some(Self::Sha256),
            "sha384" => Some(Self::Sha384),
            "sha512" => Some(Self::Sha512),
            _ => None,
        }
    }
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        Self::Sha256
    }
}

/// A parsed `(algorithm, digest)` pair as found in a `RECORD` row, e.g.
/// `sha256=x_c8nmc4Huc-lKEsAXj78ZiyqSJ9hJ71j7vltY67icw`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Hash {
    pub algorithm: String,
    pub digest: String,
}

impl Hash {
    pub fn parse(field: &str) -> Result<Self, Error> {
        let (algorithm, digest) = field
            .split_once('=')
            .ok_or_else(|| Error::InvalidRecordEntry {
                line: 0,
                content: field.to_string(),
            })?;
        Ok(Self {
            algorithm: algorithm.to_string(),
            digest: digest.to_string(),
        })
    }

    pub fn to_field(&self) -> String {
        format!("{}={}", self.algorithm, self.digest)
    }
}

impl std::fmt::Display for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_field())
    }
}

/// The set of hash algorithms a caller permits for `RECORD` validation.
///
/// The default rejects `md5` and `sha1`: both are considered broken for integrity
/// purposes and `pip`/`installer` have historically refused to trust them.
#[derive(Debug, Clone)]
pub struct AllowList {
    rejected: Vec<String>,
}

impl Default for AllowList {
    fn default() -> Self {
        Self {
            rejected: vec!["md5".to_string(), "sha1".to_string()],
        }
    }
}

impl AllowList {
    /// An allow-list that accepts every algorithm name.
    pub fn allow_all() -> Self {
        Self {
            rejected: Vec::new(),
        }
    }

    pub fn is_allowed(&self, algorithm: &str) -> bool {
        !self.rejected.iter().any(|name| name == algorithm)
    }
}

/// Compute the digest of `buffer` with `algorithm`, encoded as unpadded urlsafe base64.
pub fn digest(algorithm: HashAlgorithm, buffer: &[u8]) -> String {
    match algorithm {
        HashAlgorithm::Sha256 => BASE64URL_NOPAD.encode(&Sha256::digest(buffer)),
        HashAlgorithm::Sha384 => BASE64URL_NOPAD.encode(&Sha384::digest(buffer)),
        HashAlgorithm::Sha512 => BASE64URL_NOPAD.encode(&Sha512::digest(buffer)),
    }
}

/// Verify that `hash` matches the digest of `buffer` under its own named algorithm.
///
/// Returns `false` (never an error) for a mismatch; returns `false` for an algorithm this
/// crate cannot compute, since it cannot confirm the claim either way.
pub fn validate(hash: &Hash, buffer: &[u8]) -> bool {
    let Some(algorithm) = HashAlgorithm::from_name(&hash.algorithm) else {
        return false;
    };
    digest(algorithm, buffer) == hash.digest
}

/// Copies from `reader` to `writer` while hashing, in a single streaming pass.
///
/// Uses the same 8 KiB buffer size as the standard library's own `io::copy`, so a
/// multi-gigabyte wheel member never needs to be buffered whole in memory.
pub fn copy_and_hash(
    reader: &mut impl Read,
    writer: &mut impl Write,
    algorithm: HashAlgorithm,
) -> io::Result<(u64, Hash)> {
    let mut hasher = Sha256Multi::new(algorithm);
    let mut buf = vec![0u8; 8 * 1024];
    let mut written = 0u64;
    loop {
        let len = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(len) => len,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..len]);
        writer.write_all(&buf[..len])?;
        written += len as u64;
    }
    let hash = Hash {
        algorithm: algorithm.name().to_string(),
        digest: hasher.finish(),
    };
    Ok((written, hash))
}

/// A small enum-dispatched hasher so `copy_and_hash` doesn't need to be generic over
/// the `sha2` digest type at every call site.
enum Sha256Multi {
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
}

impl Sha256Multi {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            HashAlgorithm::Sha384 => Self::Sha384(Sha384::new()),
            HashAlgorithm::Sha512 => Self::Sha512(Sha512::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha256(h) => Digest::update(h, data),
            Self::Sha384(h) => Digest::update(h, data),
            Self::Sha512(h) => Digest::update(h, data),
        }
    }

    fn finish(self) -> String {
        match self {
            Self::Sha256(h) => BASE64URL_NOPAD.encode(&h.finalize()),
            Self::Sha384(h) => BASE64URL_NOPAD.encode(&h.finalize()),
            Self::Sha512(h) => BASE64URL_NOPAD.encode(&h.finalize()),
        }
    }
}
