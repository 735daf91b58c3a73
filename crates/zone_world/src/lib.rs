//! zone_world: nested, prioritized spatial regions with typed policy
//! settings, resolved deterministically per point and actor.
//!
//! An operator defines regions (boxes, spheres, cylinders, slabs) inside
//! discrete worlds, attaches typed setting values with actor targets to
//! any host (global, domain, region), and the resolver answers "which
//! value applies here, for this actor" in one synchronous call.

pub mod engine;
pub mod geometry;

pub use geometry::{Aabb, Pos, Shape, Volume, VolumeError};

pub use engine::{
    Domain, DomainRecord, HierarchySnapshot, HostKey, IndexConfig, Location, MemoryStore,
    NoPermissions, OrphanPolicy, PermissionLookup, PolyValue, Region, RegionHierarchy, RegionSpec,
    Resolution, Scalar, ScalarKind, Setting, SettingKey, SettingKind, SettingMap, SettingRegistry,
    SettingValue, SharedZoneWorld, SpatialIndex, StoreError, Target, TargetMode, VolumeId,
    ZoneError, ZoneStore, ZoneWorld, BYPASS_PERMISSION,
};
