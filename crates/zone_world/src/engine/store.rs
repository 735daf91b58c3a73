//! Persistence collaborator: snapshot types and the store trait.
//!
//! The codec and on-disk layout are the implementor's business; the
//! hierarchy only ever exchanges typed snapshots.

use std::collections::BTreeMap;
use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::domain::Domain;
use super::region::Region;
use super::setting::SettingMap;

/// Errors surfaced by a store implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Io(String),
    Corrupt(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(message) => write!(f, "io: {message}"),
            StoreError::Corrupt(message) => write!(f, "corrupt data: {message}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Persisted form of a domain: everything except the rebuildable index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainRecord {
    pub name: String,
    pub min_y: i64,
    pub max_y: i64,
    #[serde(default)]
    pub settings: SettingMap,
}

impl From<&Domain> for DomainRecord {
    fn from(domain: &Domain) -> Self {
        Self {
            name: domain.name.clone(),
            min_y: domain.min_y,
            max_y: domain.max_y,
            settings: domain.settings.clone(),
        }
    }
}

/// Full persisted capture of the hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HierarchySnapshot {
    #[serde(default)]
    pub global_settings: SettingMap,
    #[serde(default)]
    pub domains: Vec<DomainRecord>,
    #[serde(default)]
    pub regions: Vec<Region>,
}

/// Storage collaborator invoked by the hierarchy on startup and on
/// mutation. Implementations decide format and placement.
pub trait ZoneStore: Send + Sync {
    fn load(&self) -> Result<HierarchySnapshot, StoreError>;
    fn save_global(&self, settings: &SettingMap) -> Result<(), StoreError>;
    fn save_domain(&self, record: &DomainRecord) -> Result<(), StoreError>;
    fn save_region(&self, region: &Region) -> Result<(), StoreError>;
    fn delete_region(&self, name: &str) -> Result<(), StoreError>;
}

impl<S: ZoneStore> ZoneStore for std::sync::Arc<S> {
    fn load(&self) -> Result<HierarchySnapshot, StoreError> {
        (**self).load()
    }

    fn save_global(&self, settings: &SettingMap) -> Result<(), StoreError> {
        (**self).save_global(settings)
    }

    fn save_domain(&self, record: &DomainRecord) -> Result<(), StoreError> {
        (**self).save_domain(record)
    }

    fn save_region(&self, region: &Region) -> Result<(), StoreError> {
        (**self).save_region(region)
    }

    fn delete_region(&self, name: &str) -> Result<(), StoreError> {
        (**self).delete_region(name)
    }
}

#[derive(Debug, Default)]
struct MemoryStoreState {
    global_settings: SettingMap,
    domains: BTreeMap<String, DomainRecord>,
    regions: BTreeMap<String, Region>,
}

/// In-memory store for tests and embedders without persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryStoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with a snapshot, as if a prior run had saved it.
    pub fn seeded(snapshot: HierarchySnapshot) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.lock();
            state.global_settings = snapshot.global_settings;
            for domain in snapshot.domains {
                state.domains.insert(domain.name.clone(), domain);
            }
            for region in snapshot.regions {
                state.regions.insert(region.name.clone(), region);
            }
        }
        store
    }

    pub fn region_count(&self) -> usize {
        self.state.lock().regions.len()
    }
}

impl ZoneStore for MemoryStore {
    fn load(&self) -> Result<HierarchySnapshot, StoreError> {
        let state = self.state.lock();
        Ok(HierarchySnapshot {
            global_settings: state.global_settings.clone(),
            domains: state.domains.values().cloned().collect(),
            regions: state.regions.values().cloned().collect(),
        })
    }

    fn save_global(&self, settings: &SettingMap) -> Result<(), StoreError> {
        self.state.lock().global_settings = settings.clone();
        Ok(())
    }

    fn save_domain(&self, record: &DomainRecord) -> Result<(), StoreError> {
        self.state
            .lock()
            .domains
            .insert(record.name.clone(), record.clone());
        Ok(())
    }

    fn save_region(&self, region: &Region) -> Result<(), StoreError> {
        self.state
            .lock()
            .regions
            .insert(region.name.clone(), region.clone());
        Ok(())
    }

    fn delete_region(&self, name: &str) -> Result<(), StoreError> {
        self.state.lock().regions.remove(name);
        Ok(())
    }
}
