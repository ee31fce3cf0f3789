//! Persistence boundary for the address cache
//!
//! The durable store lives outside the engine; this module only defines the
//! records exchanged with it and the trait a backend implements. Backend
//! failures are logged by the callers and never fatal: the in-memory cache
//! stays authoritative until the next successful save.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One persisted address row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    pub address: String,
    pub blacklisted: bool,
    pub whitelisted: bool,
    pub nicknames: Vec<String>,
}

/// Durable backing store for [`super::AddressStore`].
///
/// `load` runs once at startup; `save` runs from the periodic flush task and
/// on shutdown. Implementations may block (they are driven from blocking
/// contexts), but must be callable from any thread.
pub trait StorageBackend: Send + Sync {
    /// Load every persisted record.
    fn load(&self) -> Result<Vec<AddressRecord>>;

    /// Persist a full snapshot, replacing previous contents.
    fn save(&self, records: &[AddressRecord]) -> Result<()>;
}

/// Backend that persists nothing. Used by tests and by hosts that opt out
/// of durable storage.
#[derive(Debug, Default)]
pub struct NullBackend;

impl StorageBackend for NullBackend {
    fn load(&self) -> Result<Vec<AddressRecord>> {
        Ok(Vec::new())
    }

    fn save(&self, _records: &[AddressRecord]) -> Result<()> {
        Ok(())
    }
}
