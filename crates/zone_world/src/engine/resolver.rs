//! The policy resolver and the `ZoneWorld` façade that owns everything.
//!
//! `resolve` is a pure read path: it never logs, caches, or mutates.
//! All mutation goes through the façade so the persistence collaborator
//! sees every change.

use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::geometry::{Pos, Shape, Volume};

use super::domain::Domain;
use super::error::ZoneError;
use super::hierarchy::RegionHierarchy;
use super::host::HostKey;
use super::index::VolumeId;
use super::region::{OrphanPolicy, Region, RegionSpec};
use super::setting::{
    PolyValue, Setting, SettingKind, SettingRegistry, SettingValue,
};
use super::store::{DomainRecord, StoreError, ZoneStore};
use super::target::{PermissionLookup, Target, BYPASS_PERMISSION};

/// A point within a named domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub domain: String,
    pub pos: Pos,
}

impl Location {
    pub fn new(domain: impl Into<String>, pos: Pos) -> Self {
        Self {
            domain: domain.into(),
            pos,
        }
    }
}

/// Outcome of a resolve: the effective value and the host it came from
/// (`None` when the key's default applied).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub value: SettingValue,
    pub source: Option<HostKey>,
}

/// The decision core: setting registry, region hierarchy, and an
/// optional persistence collaborator.
pub struct ZoneWorld {
    registry: SettingRegistry,
    hierarchy: RegionHierarchy,
    store: Option<Box<dyn ZoneStore>>,
}

impl fmt::Debug for ZoneWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZoneWorld")
            .field("registry", &self.registry)
            .field("hierarchy", &self.hierarchy)
            .field("store", &self.store.is_some())
            .finish()
    }
}

impl ZoneWorld {
    pub fn new(registry: SettingRegistry) -> Self {
        Self {
            registry,
            hierarchy: RegionHierarchy::new(),
            store: None,
        }
    }

    /// Loads the hierarchy from a store and keeps the store attached for
    /// save hooks. Every index is constructed before this returns.
    pub fn load_from(
        registry: SettingRegistry,
        store: Box<dyn ZoneStore>,
    ) -> Result<Self, ZoneError> {
        let snapshot = store.load().map_err(store_error)?;
        let hierarchy = RegionHierarchy::from_snapshot(snapshot)?;
        Ok(Self {
            registry,
            hierarchy,
            store: Some(store),
        })
    }

    pub fn registry(&self) -> &SettingRegistry {
        &self.registry
    }

    pub fn hierarchy(&self) -> &RegionHierarchy {
        &self.hierarchy
    }

    // -------------------------------------------------------------------------
    // Hierarchy mutation (with save hooks)
    // -------------------------------------------------------------------------

    pub fn add_domain(&mut self, domain: Domain) -> Result<(), ZoneError> {
        let name = domain.name.clone();
        self.hierarchy.add_domain(domain)?;
        self.persist_domain(&name)
    }

    pub fn add_region(&mut self, spec: RegionSpec) -> Result<(), ZoneError> {
        let name = spec.name.clone();
        self.hierarchy.add_region(spec)?;
        self.persist_region(&name)
    }

    pub fn remove_region(
        &mut self,
        name: &str,
        policy: OrphanPolicy,
    ) -> Result<Region, ZoneError> {
        let region = self.hierarchy.remove_region(name, policy)?;
        if let Some(store) = &self.store {
            store.delete_region(name).map_err(store_error)?;
        }
        Ok(region)
    }

    pub fn add_volume(&mut self, region: &str, volume: Volume) -> Result<VolumeId, ZoneError> {
        let id = self.hierarchy.add_volume(region, volume)?;
        self.persist_region(region)?;
        Ok(id)
    }

    pub fn remove_volume(&mut self, region: &str, id: VolumeId) -> Result<Volume, ZoneError> {
        let volume = self.hierarchy.remove_volume(region, id)?;
        self.persist_region(region)?;
        Ok(volume)
    }

    pub fn replace_volume(
        &mut self,
        region: &str,
        id: VolumeId,
        shape: Shape,
    ) -> Result<VolumeId, ZoneError> {
        let new_id = self.hierarchy.replace_volume(region, id, shape)?;
        self.persist_region(region)?;
        Ok(new_id)
    }

    /// Expired preview volumes are dropped without touching the store;
    /// they were never meant to outlive the session.
    pub fn purge_expired(&mut self, now_ms: u64) -> usize {
        self.hierarchy.purge_expired(now_ms)
    }

    pub fn construct_indexes(&mut self) {
        self.hierarchy.construct_indexes();
    }

    // -------------------------------------------------------------------------
    // Setting mutation (with save hooks)
    // -------------------------------------------------------------------------

    pub fn set_setting(
        &mut self,
        host: &HostKey,
        key_id: &str,
        value: SettingValue,
        target: Option<Target>,
    ) -> Result<(), ZoneError> {
        let key = self.registry.require(key_id)?;
        if !key.accepts(&value) {
            return Err(ZoneError::TypeMismatch {
                key: key_id.to_string(),
                expected: key.kind.describe(),
                found: value.describe(),
            });
        }
        if key.global_only && *host != HostKey::Global {
            return Err(ZoneError::GlobalOnlyViolation {
                key: key_id.to_string(),
                host: host.clone(),
            });
        }
        let settings = self
            .hierarchy
            .settings_mut(host)
            .ok_or_else(|| missing_host(host))?;
        settings.set(key_id, value, target);
        self.persist_host(host)
    }

    pub fn remove_setting(
        &mut self,
        host: &HostKey,
        key_id: &str,
    ) -> Result<Option<Setting>, ZoneError> {
        self.registry.require(key_id)?;
        let settings = self
            .hierarchy
            .settings_mut(host)
            .ok_or_else(|| missing_host(host))?;
        let removed = settings.remove(key_id);
        if removed.is_some() {
            self.persist_host(host)?;
        }
        Ok(removed)
    }

    /// Returns the target stored for a key on a host, creating one with
    /// the supplier if the setting exists without a target. `None` when
    /// the host has no setting for the key.
    pub fn compute_target(
        &mut self,
        host: &HostKey,
        key_id: &str,
        default: impl FnOnce() -> Target,
    ) -> Result<Option<Target>, ZoneError> {
        self.registry.require(key_id)?;
        let settings = self
            .hierarchy
            .settings_mut(host)
            .ok_or_else(|| missing_host(host))?;
        let target = settings.target_or_insert_with(key_id, default).map(|t| t.clone());
        if target.is_some() {
            self.persist_host(host)?;
        }
        Ok(target)
    }

    // -------------------------------------------------------------------------
    // Resolution
    // -------------------------------------------------------------------------

    /// Resolves the effective value of a setting at a location for an
    /// optional actor. Pure read path.
    pub fn resolve(
        &self,
        key_id: &str,
        location: &Location,
        actor: Option<&str>,
        perms: &dyn PermissionLookup,
    ) -> Result<Resolution, ZoneError> {
        let key = self.registry.require(key_id)?;
        let mut hosts = self
            .hierarchy
            .covering_hosts(&location.domain, location.pos)?;
        if key.global_only {
            hosts.retain(|host| *host == HostKey::Global);
        }
        let bypassing = key.player_restrictive
            && actor.map_or(false, |id| perms.has_permission(id, BYPASS_PERMISSION));

        let mut contributors: Vec<(HostKey, PolyValue)> = Vec::new();
        for host in hosts {
            let (setting, source) = match self.hierarchy.setting_for(&host, key_id) {
                Some(found) => found,
                None => continue,
            };
            let target = setting.target.as_ref();
            if bypassing && !target.map_or(false, |t| t.indiscriminate) {
                continue;
            }
            if !target.map_or(true, |t| t.applies_to(actor, perms)) {
                continue;
            }
            match key.kind {
                SettingKind::Unary(_) => {
                    return Ok(Resolution {
                        value: setting.value.clone(),
                        source: Some(source),
                    });
                }
                SettingKind::Poly => {
                    let poly = match &setting.value {
                        SettingValue::Poly(poly) => poly,
                        // A mismatched stored value cannot contribute.
                        SettingValue::Unary(_) => continue,
                    };
                    // Parent inheritance can surface the same ancestor
                    // through several covering regions; count it once.
                    if contributors.iter().any(|(seen, _)| *seen == source) {
                        continue;
                    }
                    let terminal = matches!(poly, PolyValue::Declarative { .. });
                    contributors.push((source, poly.clone()));
                    if terminal {
                        break;
                    }
                }
            }
        }

        match key.kind {
            SettingKind::Unary(_) => Ok(Resolution {
                value: key.default_value.clone(),
                source: None,
            }),
            SettingKind::Poly => {
                if contributors.is_empty() {
                    return Ok(Resolution {
                        value: key.default_value.clone(),
                        source: None,
                    });
                }
                // Deltas stack bottom-up so higher-priority hosts land last.
                let mut entries = key.default_entries();
                for (_, poly) in contributors.iter().rev() {
                    poly.apply_to(&mut entries);
                }
                let source = contributors
                    .first()
                    .map(|(host, _)| host.clone());
                Ok(Resolution {
                    value: SettingValue::Poly(PolyValue::Declarative { entries }),
                    source,
                })
            }
        }
    }

    // -------------------------------------------------------------------------
    // Persistence plumbing
    // -------------------------------------------------------------------------

    fn persist_host(&self, host: &HostKey) -> Result<(), ZoneError> {
        match host {
            HostKey::Global => {
                if let Some(store) = &self.store {
                    store
                        .save_global(self.hierarchy.global_settings())
                        .map_err(store_error)?;
                }
                Ok(())
            }
            HostKey::Domain(name) => self.persist_domain(name),
            HostKey::Region(name) => self.persist_region(name),
        }
    }

    fn persist_domain(&self, name: &str) -> Result<(), ZoneError> {
        let store = match &self.store {
            Some(store) => store,
            None => return Ok(()),
        };
        if let Some(domain) = self.hierarchy.domain(name) {
            store.save_domain(&DomainRecord::from(domain)).map_err(store_error)?;
        }
        Ok(())
    }

    fn persist_region(&self, name: &str) -> Result<(), ZoneError> {
        let store = match &self.store {
            Some(store) => store,
            None => return Ok(()),
        };
        if let Some(region) = self.hierarchy.region(name) {
            store.save_region(region).map_err(store_error)?;
        }
        Ok(())
    }
}

fn missing_host(host: &HostKey) -> ZoneError {
    match host {
        HostKey::Global => ZoneError::UnknownRegion { region: "global".to_string() },
        HostKey::Domain(name) => ZoneError::UnknownDomain { domain: name.clone() },
        HostKey::Region(name) => ZoneError::UnknownRegion { region: name.clone() },
    }
}

fn store_error(error: StoreError) -> ZoneError {
    warn!("store operation failed: {error}");
    ZoneError::Store(error.to_string())
}
