//! Content hashing for change detection

use dirmirror_config::HashConfig;
use dirmirror_types::{ChunkSize, Error, HashAlgorithm, IoResultExt, Result};
use md5::Digest as _;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::trace;

/// Fixed-length fingerprint of a file's bytes
///
/// Digests produced by different algorithms never compare equal.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Digest {
    algorithm: HashAlgorithm,
    bytes: Box<[u8]>,
}

impl Digest {
    /// Algorithm that produced this digest
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(
            f,
            "Digest({}:{})",
            self.algorithm,
            hex.get(..16).unwrap_or(&hex)
        )
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

enum HashState {
    Blake3(Box<blake3::Hasher>),
    Xxh3(Box<xxhash_rust::xxh3::Xxh3>),
    Md5(md5::Md5),
}

impl HashState {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
            HashAlgorithm::Xxh3 => Self::Xxh3(Box::new(xxhash_rust::xxh3::Xxh3::new())),
            HashAlgorithm::Md5 => Self::Md5(md5::Md5::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Blake3(hasher) => {
                hasher.update(data);
            }
            Self::Xxh3(hasher) => hasher.update(data),
            Self::Md5(hasher) => hasher.update(data),
        }
    }

    fn finalize(self) -> Digest {
        let (algorithm, bytes): (HashAlgorithm, Box<[u8]>) = match self {
            Self::Blake3(hasher) => (
                HashAlgorithm::Blake3,
                hasher.finalize().as_bytes().to_vec().into_boxed_slice(),
            ),
            Self::Xxh3(hasher) => (
                HashAlgorithm::Xxh3,
                hasher.digest128().to_be_bytes().to_vec().into_boxed_slice(),
            ),
            Self::Md5(hasher) => (
                HashAlgorithm::Md5,
                hasher.finalize().to_vec().into_boxed_slice(),
            ),
        };
        Digest { algorithm, bytes }
    }
}

/// Computes digests of whole files, reading them in bounded chunks
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentHasher {
    algorithm: HashAlgorithm,
    chunk_size: ChunkSize,
}

impl ContentHasher {
    /// Create a hasher from configuration
    pub fn new(config: HashConfig) -> Self {
        Self {
            algorithm: config.algorithm,
            chunk_size: config.chunk_size,
        }
    }

    /// Create a hasher for an algorithm with the default chunk size
    pub fn with_algorithm(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            chunk_size: ChunkSize::default(),
        }
    }

    /// Algorithm in use
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Chunk size in use
    pub fn chunk_size(&self) -> ChunkSize {
        self.chunk_size
    }

    /// Digest the full contents of the file at `path`
    ///
    /// Open and read failures are returned as [`Error::Io`] naming the path.
    pub fn digest(&self, path: &Path) -> Result<Digest> {
        let file = File::open(path).with_path(path)?;
        let digest = self
            .digest_reader(file)
            .map_err(|e| Error::io(path, format!("Failed to read file: {}", e)))?;
        trace!("Digest of {}: {:?}", path.display(), digest);
        Ok(digest)
    }

    /// Digest everything readable from `reader`
    pub fn digest_reader<R: Read>(&self, mut reader: R) -> io::Result<Digest> {
        let mut state = HashState::new(self.algorithm);
        let mut buffer = vec![0u8; self.chunk_size.get()];

        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            state.update(&buffer[..bytes_read]);
        }

        Ok(state.finalize())
    }

    /// Digest an in-memory buffer
    pub fn digest_bytes(&self, data: &[u8]) -> Digest {
        let mut state = HashState::new(self.algorithm);
        state.update(data);
        state.finalize()
    }
}
