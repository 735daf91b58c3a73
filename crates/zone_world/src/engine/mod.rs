//! Engine module - the stateful decision core.
//!
//! This module contains everything above the pure geometry layer:
//! - Spatial indexing of placed volumes
//! - The host hierarchy (global, domains, regions)
//! - Typed settings, targets, and the key registry
//! - Policy resolution
//! - The persistence collaborator and shared-access wrapper

mod domain;
mod error;
mod hierarchy;
mod host;
mod index;
mod region;
mod resolver;
mod setting;
mod shared;
mod store;
mod target;

#[cfg(test)]
mod tests;

// Hosts and hierarchy
pub use domain::Domain;
pub use hierarchy::RegionHierarchy;
pub use host::HostKey;
pub use region::{OrphanPolicy, Region, RegionSpec};

// Spatial index
pub use index::{IndexConfig, SpatialIndex, VolumeId};

// Settings and targets
pub use setting::{
    PolyValue, Scalar, ScalarKind, Setting, SettingKey, SettingKind, SettingMap, SettingRegistry,
    SettingValue,
};
pub use target::{NoPermissions, PermissionLookup, Target, TargetMode, BYPASS_PERMISSION};

// Resolution
pub use resolver::{Location, Resolution, ZoneWorld};

// Errors
pub use error::ZoneError;

// Persistence and sharing
pub use shared::SharedZoneWorld;
pub use store::{DomainRecord, HierarchySnapshot, MemoryStore, StoreError, ZoneStore};
