//! # Persistence Format
//!
//! Binary serialization for project snapshots.
//!
//! Format: Header (5 bytes) + postcard-serialized [`ProjectState`].
//! - 4 bytes: Magic ("SGTE")
//! - 1 byte: Version
//!
//! Size and header are validated before the payload is decoded, so corrupted
//! or hostile records fail fast without large allocations.

use crate::progression::ProjectState;
use crate::{StageGateError, primitives};

/// Maximum accepted snapshot size.
///
/// A snapshot holds current and previous content for every stage; 64 MiB
/// leaves room for a long thesis track at the content size limit.
pub const MAX_SNAPSHOT_SIZE: usize = 64 * 1024 * 1024;

const HEADER_LEN: usize = 5;

// =============================================================================
// HEADER
// =============================================================================

/// The header that precedes every stored snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistenceHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl PersistenceHeader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), StageGateError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(StageGateError::DeserializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(StageGateError::DeserializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let [a, b, c, d] = self.magic;
        [a, b, c, d, self.version]
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StageGateError> {
        match bytes {
            [a, b, c, d, version, ..] => Ok(Self {
                magic: [*a, *b, *c, *d],
                version: *version,
            }),
            _ => Err(StageGateError::DeserializationError(
                "Header too short".to_string(),
            )),
        }
    }
}

impl Default for PersistenceHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SNAPSHOT ENCODING
// =============================================================================

/// Encode a project snapshot (header + payload).
pub fn state_to_bytes(state: &ProjectState) -> Result<Vec<u8>, StageGateError> {
    let payload = postcard::to_stdvec(state)
        .map_err(|e| StageGateError::SerializationError(e.to_string()))?;

    let mut bytes = Vec::with_capacity(HEADER_LEN.saturating_add(payload.len()));
    bytes.extend_from_slice(&PersistenceHeader::new().to_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decode a project snapshot, validating size and header first.
pub fn state_from_bytes(bytes: &[u8]) -> Result<ProjectState, StageGateError> {
    if bytes.len() > MAX_SNAPSHOT_SIZE {
        return Err(StageGateError::DeserializationError(format!(
            "Snapshot size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_SNAPSHOT_SIZE
        )));
    }

    let header = PersistenceHeader::from_bytes(bytes)?;
    header.validate()?;

    let payload = bytes.get(HEADER_LEN..).unwrap_or_default();
    postcard::from_bytes(payload).map_err(|e| {
        StageGateError::DeserializationError(format!("Failed to decode project snapshot: {}", e))
    })
}

// =============================================================================
// TESTS
// =============================================================================
