//! Binary artifact encoding.
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! +--------+---------+----------------+-----------+-----------------+
//! | magic  | version | payload length | crc32     | bincode payload |
//! | 4 B    | u32     | u64            | u32       | length bytes    |
//! +--------+---------+----------------+-----------+-----------------+
//! ```

use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Result, RiskProfilerError};

/// Current on-disk format version.
pub const FORMAT_VERSION: u32 = 1;

/// Size of the fixed header in bytes.
pub const HEADER_LEN: usize = 4 + 4 + 8 + 4;

/// Which half of the model pair a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Vectorizer,
    Classifier,
}

impl ArtifactKind {
    /// File signature.
    pub fn magic(self) -> &'static [u8; 4] {
        match self {
            ArtifactKind::Vectorizer => b"RPVZ",
            ArtifactKind::Classifier => b"RPCL",
        }
    }

    /// Human-readable name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            ArtifactKind::Vectorizer => "vectorizer",
            ArtifactKind::Classifier => "classifier",
        }
    }
}

/// Serialize `value` into a complete artifact file image.
pub fn encode<T: Serialize>(kind: ArtifactKind, value: &T) -> Result<Vec<u8>> {
    let payload = bincode::serialize(value)?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.write_all(kind.magic())?;
    bytes.write_u32::<LittleEndian>(FORMAT_VERSION)?;
    bytes.write_u64::<LittleEndian>(payload.len() as u64)?;
    bytes.write_u32::<LittleEndian>(crc32fast::hash(&payload))?;
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Validate the header of an artifact file image and deserialize its payload.
pub fn decode<T: DeserializeOwned>(kind: ArtifactKind, bytes: &[u8]) -> Result<T> {
    if bytes.len() < HEADER_LEN {
        return Err(RiskProfilerError::artifact(format!(
            "{} artifact is truncated ({} bytes)",
            kind.name(),
            bytes.len()
        )));
    }

    let (header, payload) = bytes.split_at(HEADER_LEN);
    if &header[..4] != kind.magic() {
        return Err(RiskProfilerError::artifact(format!(
            "{} artifact has an invalid signature",
            kind.name()
        )));
    }

    let mut cursor = Cursor::new(&header[4..]);
    let version = cursor.read_u32::<LittleEndian>()?;
    let length = cursor.read_u64::<LittleEndian>()?;
    let checksum = cursor.read_u32::<LittleEndian>()?;

    if version != FORMAT_VERSION {
        return Err(RiskProfilerError::artifact(format!(
            "{} artifact has unsupported format version {version}",
            kind.name()
        )));
    }
    if length != payload.len() as u64 {
        return Err(RiskProfilerError::artifact(format!(
            "{} artifact declares {length} payload bytes but holds {}",
            kind.name(),
            payload.len()
        )));
    }
    if crc32fast::hash(payload) != checksum {
        return Err(RiskProfilerError::artifact(format!(
            "{} artifact checksum mismatch",
            kind.name()
        )));
    }

    bincode::deserialize(payload).map_err(|e| {
        RiskProfilerError::artifact(format!("{} artifact is corrupt: {e}", kind.name()))
    })
}

/// Temporary sibling path used while writing `path`.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `bytes` to the temporary sibling of `path` and flush it to disk.
/// The caller publishes it with [`publish`].
pub fn write_temp(path: &Path, bytes: &[u8]) -> Result<PathBuf> {
    let tmp = temp_path(path);
    let mut file = File::create(&tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(tmp)
}

/// Atomically move a finished temporary file into place.
pub fn publish(tmp: &Path, path: &Path) -> Result<()> {
    fs::rename(tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_decode_rejects_wrong_kind() {
        let bytes = encode(ArtifactKind::Vectorizer, &vec![1u32, 2, 3]).unwrap();
        assert_eq!(&bytes[..4], b"RPVZ");

        let err = decode::<Vec<u32>>(ArtifactKind::Classifier, &bytes).unwrap_err();
        assert!(err.to_string().contains("signature"));
        assert_eq!(
            decode::<Vec<u32>>(ArtifactKind::Vectorizer, &bytes).unwrap(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_decode_detects_corruption() {
        let mut bytes = encode(ArtifactKind::Classifier, &"payload".to_string()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;

        let err = decode::<String>(ArtifactKind::Classifier, &bytes).unwrap_err();
        assert!(matches!(err, RiskProfilerError::Artifact(_)));
        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn test_decode_detects_truncation() {
        let bytes = encode(ArtifactKind::Classifier, &vec![0.5f64; 16]).unwrap();

        assert!(decode::<Vec<f64>>(ArtifactKind::Classifier, &bytes[..10]).is_err());
        assert!(decode::<Vec<f64>>(ArtifactKind::Classifier, &bytes[..bytes.len() - 8]).is_err());
    }

    #[test]
    fn test_decode_rejects_future_version() {
        let mut bytes = encode(ArtifactKind::Vectorizer, &1u8).unwrap();
        bytes[4] = 99;

        let err = decode::<u8>(ArtifactKind::Vectorizer, &bytes).unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn test_write_temp_and_publish() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vectorizer.bin");

        let tmp = write_temp(&path, b"hello").unwrap();
        assert_eq!(tmp, dir.path().join("vectorizer.bin.tmp"));
        assert!(!path.exists());

        publish(&tmp, &path).unwrap();
        assert!(!tmp.exists());
        assert_eq!(fs::read(&path).unwrap(), b"hello");
    }
}
