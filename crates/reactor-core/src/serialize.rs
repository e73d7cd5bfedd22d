//! Snapshots of the durable store.
//!
//! Binary snapshots are `bitcode` with a versioned header, checked before
//! the payload is trusted. A JSON mirror is available for inspection and for
//! importing hand-written or legacy records.

use crate::fixed::Ticks;
use crate::store::MemoryStore;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a store snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0x1AB5_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Header stored in front of every snapshot payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Tick at which the snapshot was taken.
    pub tick: Ticks,
}

impl SnapshotHeader {
    pub fn new(tick: Ticks) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            tick,
        }
    }

    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(SnapshotError::InvalidMagic(self.magic));
        }
        if self.version != FORMAT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreSnapshot {
    header: SnapshotHeader,
    store: MemoryStore,
}

// ---------------------------------------------------------------------------
// Binary
// ---------------------------------------------------------------------------

/// Encode a store snapshot taken at `tick`.
pub fn encode_store(store: &MemoryStore, tick: Ticks) -> Result<Vec<u8>, SnapshotError> {
    let snapshot = StoreSnapshot {
        header: SnapshotHeader::new(tick),
        store: store.clone(),
    };
    bitcode::serialize(&snapshot).map_err(|e| SnapshotError::Encode(e.to_string()))
}

/// Decode a snapshot, returning its header and the store.
pub fn decode_store(data: &[u8]) -> Result<(SnapshotHeader, MemoryStore), SnapshotError> {
    let snapshot: StoreSnapshot =
        bitcode::deserialize(data).map_err(|e| SnapshotError::Decode(e.to_string()))?;
    snapshot.header.validate()?;
    Ok((snapshot.header, snapshot.store))
}

// ---------------------------------------------------------------------------
// JSON mirror
// ---------------------------------------------------------------------------

pub fn store_to_json(store: &MemoryStore) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string_pretty(store)?)
}

/// Load a store from JSON. Missing order fields take their serde defaults
/// and are repaired on the next tick.
pub fn store_from_json(json: &str) -> Result<MemoryStore, SnapshotError> {
    Ok(serde_json::from_str(json)?)
}
