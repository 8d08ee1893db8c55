//! Hand-off of enqueue decisions from page renders to delivery requests.
//!
//! A page render stores one [`DeliveryState`] under the client's session
//! token. Each asset type of that state can be taken exactly once by a
//! later delivery request; the record disappears once every type has been
//! taken, or when it expires.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::localization::LocalizationEntry;
use crate::registry::AssetDefinition;
use crate::types::{AssetType, PerType};

/// Default lifetime of a stored record.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(300);

/// Everything the delivery phase needs to rebuild the bundles of a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryState {
    pub enqueued: PerType<Vec<AssetDefinition>>,
    pub localization: Vec<LocalizationEntry>,
    pub caching_enabled: bool,
    pub compression_enabled: bool,
    pub force_gzip: bool,
}

/// The part of a [`DeliveryState`] that serves one asset type.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliverySlot {
    pub asset_type: AssetType,
    pub assets: Vec<AssetDefinition>,
    pub localization: Vec<LocalizationEntry>,
    pub caching_enabled: bool,
    pub compression_enabled: bool,
    pub force_gzip: bool,
}

struct StoredRecord {
    /// Per-type assets still waiting to be delivered.
    pending: PerType<Option<Vec<AssetDefinition>>>,
    localization: Vec<LocalizationEntry>,
    caching_enabled: bool,
    compression_enabled: bool,
    force_gzip: bool,
    stored_at: Instant,
}

impl StoredRecord {
    fn new(state: DeliveryState) -> Self {
        let pending_slot = |assets: Vec<AssetDefinition>| (!assets.is_empty()).then_some(assets);
        Self {
            pending: PerType {
                scripts: pending_slot(state.enqueued.scripts),
                styles: pending_slot(state.enqueued.styles),
            },
            localization: state.localization,
            caching_enabled: state.caching_enabled,
            compression_enabled: state.compression_enabled,
            force_gzip: state.force_gzip,
            stored_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() > ttl
    }

    fn is_drained(&self) -> bool {
        self.pending.scripts.is_none() && self.pending.styles.is_none()
    }
}

/// In-memory store of delivery records keyed by session token.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application.
pub struct SessionStore {
    ttl: Duration,
    records: RwLock<HashMap<String, StoredRecord>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Store the state for `token`, replacing any earlier record, and drop
    /// records that have expired in the meantime.
    pub async fn put(&self, token: &str, state: DeliveryState) {
        let mut records = self.records.write().await;
        let ttl = self.ttl;
        records.retain(|_, record| !record.is_expired(ttl));
        records.insert(token.to_string(), StoredRecord::new(state));
    }

    /// Take the slot for `asset_type`. Returns `None` when nothing is
    /// stored for the token, the record expired, the type had no enqueued
    /// assets, or the slot was already taken.
    pub async fn take(&self, token: &str, asset_type: AssetType) -> Option<DeliverySlot> {
        let mut records = self.records.write().await;
        let record = records.get_mut(token)?;

        if record.is_expired(self.ttl) {
            records.remove(token);
            tracing::debug!(%asset_type, "Delivery record expired");
            return None;
        }

        let assets = record.pending.get_mut(asset_type).take()?;
        let slot = DeliverySlot {
            asset_type,
            assets,
            localization: record.localization.clone(),
            caching_enabled: record.caching_enabled,
            compression_enabled: record.compression_enabled,
            force_gzip: record.force_gzip,
        };

        if record.is_drained() {
            records.remove(token);
        }
        Some(slot)
    }

    /// Number of records currently held, including expired ones not yet
    /// purged.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}
