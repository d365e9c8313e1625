//! Configuration types for dirmirror
//!
//! Validated newtypes shared by the configuration builder and the sync engine.

use std::fmt;
use std::time::Duration;

/// Read chunk size used when hashing files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChunkSize(usize);

impl ChunkSize {
    /// Minimum chunk size (512 bytes)
    pub const MIN: usize = 512;
    /// Maximum chunk size (64MB)
    pub const MAX: usize = 64 * 1024 * 1024;
    /// Default chunk size (4KB)
    pub const DEFAULT: usize = 4 * 1024;

    /// Create a new chunk size with validation
    pub fn new(size: usize) -> Result<Self, String> {
        if size < Self::MIN {
            Err(format!("Chunk size {} is below minimum {}", size, Self::MIN))
        } else if size > Self::MAX {
            Err(format!("Chunk size {} exceeds maximum {}", size, Self::MAX))
        } else if !size.is_power_of_two() {
            Err(format!("Chunk size {} must be a power of two", size))
        } else {
            Ok(Self(size))
        }
    }

    /// Get the chunk size value
    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for ChunkSize {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl fmt::Display for ChunkSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes", self.0)
    }
}

/// Wall-clock wait between two reconciliation passes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SyncInterval(Duration);

impl SyncInterval {
    /// Create an interval from whole seconds, as given on the command line
    pub fn from_secs(seconds: u64) -> Result<Self, String> {
        if seconds == 0 {
            Err("Interval must be at least 1 second".to_string())
        } else {
            Ok(Self(Duration::from_secs(seconds)))
        }
    }

    /// Create an interval from an arbitrary non-zero duration
    pub fn from_duration(duration: Duration) -> Result<Self, String> {
        if duration.is_zero() {
            Err("Interval must be greater than zero".to_string())
        } else {
            Ok(Self(duration))
        }
    }

    /// Get the interval as a duration
    pub fn get(self) -> Duration {
        self.0
    }
}

impl fmt::Display for SyncInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Digest algorithm used for change detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum HashAlgorithm {
    /// BLAKE3, 256-bit
    #[default]
    Blake3,
    /// XXH3, 128-bit, non-cryptographic
    Xxh3,
    /// MD5, 128-bit
    Md5,
}

impl HashAlgorithm {
    /// Lowercase name as accepted on the command line
    pub fn name(self) -> &'static str {
        match self {
            Self::Blake3 => "blake3",
            Self::Xxh3 => "xxh3",
            Self::Md5 => "md5",
        }
    }

    /// Digest length in bytes
    pub fn digest_len(self) -> usize {
        match self {
            Self::Blake3 => 32,
            Self::Xxh3 | Self::Md5 => 16,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blake3" => Ok(Self::Blake3),
            "xxh3" => Ok(Self::Xxh3),
            "md5" => Ok(Self::Md5),
            other => Err(format!(
                "Unknown hash algorithm '{}' (expected blake3, xxh3 or md5)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("blake3", HashAlgorithm::Blake3)]
    #[case("XXH3", HashAlgorithm::Xxh3)]
    #[case("md5", HashAlgorithm::Md5)]
    fn test_hash_algorithm_parse(#[case] input: &str, #[case] expected: HashAlgorithm) {
        assert_eq!(input.parse::<HashAlgorithm>().unwrap(), expected);
    }

    #[test]
    fn test_hash_algorithm_rejects_unknown() {
        assert!("sha1".parse::<HashAlgorithm>().is_err());
    }

    #[rstest]
    #[case(512, true)]
    #[case(4096, true)]
    #[case(64 * 1024 * 1024, true)]
    #[case(0, false)]
    #[case(511, false)]
    #[case(3000, false)]
    #[case(128 * 1024 * 1024, false)]
    fn test_chunk_size_bounds(#[case] size: usize, #[case] valid: bool) {
        assert_eq!(ChunkSize::new(size).is_ok(), valid);
    }

    #[test]
    fn test_chunk_size_default() {
        assert_eq!(ChunkSize::default().get(), 4096);
    }

    #[test]
    fn test_interval_rejects_zero() {
        assert!(SyncInterval::from_secs(0).is_err());
        assert!(SyncInterval::from_duration(Duration::ZERO).is_err());
        assert_eq!(
            SyncInterval::from_secs(5).unwrap().get(),
            Duration::from_secs(5)
        );
    }
}
