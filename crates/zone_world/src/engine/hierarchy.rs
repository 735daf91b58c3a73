//! The region hierarchy: global host, domains, regions, and their indexes.
//!
//! Sole mutator of every spatial index. All mutation validates first and
//! applies second, so a failed call leaves the hierarchy untouched.

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::geometry::{Pos, Shape, Volume};

use super::domain::Domain;
use super::error::ZoneError;
use super::host::HostKey;
use super::index::VolumeId;
use super::region::{OrphanPolicy, Region, RegionSpec};
use super::setting::{Setting, SettingMap};
use super::store::{DomainRecord, HierarchySnapshot};

/// The forest of settings-carrying hosts: one global root, one domain per
/// world, and arbitrarily many named regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionHierarchy {
    global_settings: SettingMap,
    domains: BTreeMap<String, Domain>,
    regions: BTreeMap<String, Region>,
    next_volume_id: VolumeId,
}

impl Default for RegionHierarchy {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionHierarchy {
    pub fn new() -> Self {
        Self {
            global_settings: SettingMap::new(),
            domains: BTreeMap::new(),
            regions: BTreeMap::new(),
            next_volume_id: 1,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn domain(&self, name: &str) -> Option<&Domain> {
        self.domains.get(name)
    }

    pub fn domains(&self) -> impl Iterator<Item = &Domain> {
        self.domains.values()
    }

    pub fn region(&self, name: &str) -> Option<&Region> {
        self.regions.get(name)
    }

    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    pub fn global_settings(&self) -> &SettingMap {
        &self.global_settings
    }

    /// The setting map of a host, if the host exists.
    pub fn settings(&self, host: &HostKey) -> Option<&SettingMap> {
        match host {
            HostKey::Global => Some(&self.global_settings),
            HostKey::Domain(name) => self.domains.get(name).map(|d| &d.settings),
            HostKey::Region(name) => self.regions.get(name).map(|r| &r.settings),
        }
    }

    pub fn settings_mut(&mut self, host: &HostKey) -> Option<&mut SettingMap> {
        match host {
            HostKey::Global => Some(&mut self.global_settings),
            HostKey::Domain(name) => self.domains.get_mut(name).map(|d| &mut d.settings),
            HostKey::Region(name) => self.regions.get_mut(name).map(|r| &mut r.settings),
        }
    }

    fn name_taken(&self, name: &str) -> bool {
        name == "global" || self.domains.contains_key(name) || self.regions.contains_key(name)
    }

    // -------------------------------------------------------------------------
    // Domains
    // -------------------------------------------------------------------------

    pub fn add_domain(&mut self, domain: Domain) -> Result<(), ZoneError> {
        if self.name_taken(&domain.name) {
            return Err(ZoneError::DuplicateName { name: domain.name });
        }
        debug!("add domain {} ({}..={})", domain.name, domain.min_y, domain.max_y);
        self.domains.insert(domain.name.clone(), domain);
        Ok(())
    }

    fn require_domain(&self, name: &str) -> Result<&Domain, ZoneError> {
        self.domains
            .get(name)
            .ok_or_else(|| ZoneError::UnknownDomain { domain: name.to_string() })
    }

    // -------------------------------------------------------------------------
    // Regions
    // -------------------------------------------------------------------------

    /// Validates a volume against its region's domain and returns the
    /// shape that should be indexed (slabs arrive clipped).
    fn check_volume(&self, region: &str, domain_name: &str, volume: &Volume) -> Result<Shape, ZoneError> {
        let domain = self.require_domain(domain_name)?;
        if volume.domain != domain_name {
            return Err(ZoneError::WrongDomain {
                region: region.to_string(),
                expected: domain_name.to_string(),
                found: volume.domain.clone(),
            });
        }
        volume.shape.validate().map_err(|source| ZoneError::InvalidVolume {
            region: region.to_string(),
            source,
        })?;
        let clipped = domain.clip(volume.shape.clone());
        if !domain.overlaps_shape(&clipped) {
            let (lo, _) = clipped.y_range();
            return Err(ZoneError::CoordinateOutOfBounds {
                domain: domain_name.to_string(),
                y: lo,
                min_y: domain.min_y,
                max_y: domain.max_y,
            });
        }
        Ok(clipped)
    }

    pub fn add_region(&mut self, spec: RegionSpec) -> Result<(), ZoneError> {
        if self.name_taken(&spec.name) {
            return Err(ZoneError::DuplicateName { name: spec.name });
        }
        self.require_domain(&spec.domain)?;
        if let Some(parent) = &spec.parent {
            if !self.regions.contains_key(parent) {
                return Err(ZoneError::UnknownRegion { region: parent.clone() });
            }
        }
        let mut clipped = Vec::with_capacity(spec.volumes.len());
        for volume in &spec.volumes {
            clipped.push(self.check_volume(&spec.name, &spec.domain, volume)?);
        }

        let mut volumes = BTreeMap::new();
        let domain = match self.domains.get_mut(&spec.domain) {
            Some(domain) => domain,
            None => return Err(ZoneError::UnknownDomain { domain: spec.domain }),
        };
        for (volume, shape) in spec.volumes.into_iter().zip(clipped) {
            let id = self.next_volume_id;
            self.next_volume_id += 1;
            let placed = Volume { shape, ..volume };
            domain.index.put(id, placed.clone(), spec.name.clone());
            volumes.insert(id, placed);
        }
        debug!(
            "add region {} (domain {}, priority {}, {} volumes)",
            spec.name,
            spec.domain,
            spec.priority,
            volumes.len()
        );
        self.regions.insert(
            spec.name.clone(),
            Region {
                name: spec.name,
                domain: spec.domain,
                parent: spec.parent,
                priority: spec.priority,
                volumes,
                settings: SettingMap::new(),
            },
        );
        Ok(())
    }

    /// Removes a region, all of its volumes, and detaches its children
    /// per the explicit orphan policy. Returns the removed region.
    pub fn remove_region(&mut self, name: &str, policy: OrphanPolicy) -> Result<Region, ZoneError> {
        let region = self
            .regions
            .remove(name)
            .ok_or_else(|| ZoneError::UnknownRegion { region: name.to_string() })?;
        if let Some(domain) = self.domains.get_mut(&region.domain) {
            domain.index.remove_region(name);
        }
        let new_parent = match policy {
            OrphanPolicy::DetachToDomain => None,
            OrphanPolicy::ReparentToGrandparent => region.parent.clone(),
        };
        for child in self.regions.values_mut() {
            if child.parent.as_deref() == Some(name) {
                child.parent = new_parent.clone();
            }
        }
        debug!("remove region {name} ({:?})", policy);
        Ok(region)
    }

    // -------------------------------------------------------------------------
    // Volumes
    // -------------------------------------------------------------------------

    pub fn add_volume(&mut self, region_name: &str, volume: Volume) -> Result<VolumeId, ZoneError> {
        let domain_name = self
            .regions
            .get(region_name)
            .map(|region| region.domain.clone())
            .ok_or_else(|| ZoneError::UnknownRegion { region: region_name.to_string() })?;
        let shape = self.check_volume(region_name, &domain_name, &volume)?;
        let id = self.next_volume_id;
        self.next_volume_id += 1;
        let placed = Volume { shape, ..volume };
        if let Some(domain) = self.domains.get_mut(&domain_name) {
            domain.index.put(id, placed.clone(), region_name.to_string());
        }
        if let Some(region) = self.regions.get_mut(region_name) {
            region.volumes.insert(id, placed);
        }
        Ok(id)
    }

    pub fn remove_volume(&mut self, region_name: &str, id: VolumeId) -> Result<Volume, ZoneError> {
        let region = self
            .regions
            .get_mut(region_name)
            .ok_or_else(|| ZoneError::UnknownRegion { region: region_name.to_string() })?;
        let volume = region.volumes.remove(&id).ok_or(ZoneError::UnknownVolume {
            region: region_name.to_string(),
            volume: id,
        })?;
        if let Some(domain) = self.domains.get_mut(&volume.domain) {
            domain.index.remove_volume(id);
        }
        Ok(volume)
    }

    /// Copy-on-edit: validates the replacement shape, removes the old
    /// volume from the index, and inserts the new one under a fresh id.
    /// The indexed geometry is never mutated in place.
    pub fn replace_volume(
        &mut self,
        region_name: &str,
        id: VolumeId,
        shape: Shape,
    ) -> Result<VolumeId, ZoneError> {
        let old = match self.regions.get(region_name).and_then(|r| r.volumes.get(&id)) {
            Some(volume) => volume.clone(),
            None => {
                if self.regions.contains_key(region_name) {
                    return Err(ZoneError::UnknownVolume {
                        region: region_name.to_string(),
                        volume: id,
                    });
                }
                return Err(ZoneError::UnknownRegion { region: region_name.to_string() });
            }
        };
        let replacement = Volume { shape, ..old };
        // Validate before touching anything.
        let domain_name = replacement.domain.clone();
        self.check_volume(region_name, &domain_name, &replacement)?;
        self.remove_volume(region_name, id)?;
        self.add_volume(region_name, replacement)
    }

    /// Drops every expired ephemeral volume; returns how many went away.
    pub fn purge_expired(&mut self, now_ms: u64) -> usize {
        let mut purged = 0;
        for domain in self.domains.values_mut() {
            for id in domain.index.purge_expired(now_ms) {
                purged += 1;
                for region in self.regions.values_mut() {
                    region.volumes.remove(&id);
                }
            }
        }
        if purged > 0 {
            debug!("purged {purged} expired volumes");
        }
        purged
    }

    /// Finalizes every domain index after a bulk load.
    pub fn construct_indexes(&mut self) {
        for domain in self.domains.values_mut() {
            domain.index.construct();
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// All hosts covering a point, ordered by descending effective
    /// priority: regions (priority desc, then name asc), the point's
    /// domain, Global. Regions always outrank their domain, which
    /// outranks Global.
    pub fn covering_hosts(&self, domain_name: &str, pos: Pos) -> Result<Vec<HostKey>, ZoneError> {
        let domain = self.require_domain(domain_name)?;
        if !domain.contains_y(pos.y) {
            return Err(ZoneError::CoordinateOutOfBounds {
                domain: domain_name.to_string(),
                y: pos.y,
                min_y: domain.min_y,
                max_y: domain.max_y,
            });
        }
        let mut covering: Vec<&Region> = domain
            .index
            .containing(pos)
            .into_iter()
            .filter_map(|name| self.regions.get(&name))
            .collect();
        covering.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.name.cmp(&b.name))
        });
        let mut hosts: Vec<HostKey> = covering
            .into_iter()
            .map(|region| HostKey::Region(region.name.clone()))
            .collect();
        hosts.push(HostKey::Domain(domain_name.to_string()));
        hosts.push(HostKey::Global);
        Ok(hosts)
    }

    /// All regions of a domain with at least one volume intersecting the
    /// query shape.
    pub fn regions_intersecting(
        &self,
        domain_name: &str,
        shape: &Shape,
    ) -> Result<Vec<&Region>, ZoneError> {
        let domain = self.require_domain(domain_name)?;
        Ok(domain
            .index
            .intersecting(shape)
            .into_iter()
            .filter_map(|name| self.regions.get(&name))
            .collect())
    }

    /// The setting a host supplies for a key, together with the host
    /// that actually holds it. Regions without the key consult their
    /// parent chain (setting inheritance), nearest ancestor first.
    pub fn setting_for(&self, host: &HostKey, key: &str) -> Option<(&Setting, HostKey)> {
        match host {
            HostKey::Global => self
                .global_settings
                .get(key)
                .map(|setting| (setting, HostKey::Global)),
            HostKey::Domain(name) => self
                .domains
                .get(name)
                .and_then(|domain| domain.settings.get(key))
                .map(|setting| (setting, host.clone())),
            HostKey::Region(name) => {
                let mut current = self.regions.get(name.as_str());
                let mut hops = 0;
                while let Some(region) = current {
                    if let Some(setting) = region.settings.get(key) {
                        return Some((setting, HostKey::Region(region.name.clone())));
                    }
                    // Parent links cannot cycle (a parent must exist before
                    // its child), the hop cap just bounds a corrupt load.
                    hops += 1;
                    if hops > self.regions.len() {
                        break;
                    }
                    current = region
                        .parent
                        .as_deref()
                        .and_then(|parent| self.regions.get(parent));
                }
                None
            }
        }
    }

    // -------------------------------------------------------------------------
    // Snapshot
    // -------------------------------------------------------------------------

    pub fn snapshot(&self) -> HierarchySnapshot {
        HierarchySnapshot {
            global_settings: self.global_settings.clone(),
            domains: self.domains.values().map(DomainRecord::from).collect(),
            regions: self.regions.values().cloned().collect(),
        }
    }

    /// Rebuilds a hierarchy from persisted state, re-validating every
    /// volume, and constructs all indexes.
    pub fn from_snapshot(snapshot: HierarchySnapshot) -> Result<Self, ZoneError> {
        let mut hierarchy = Self::new();
        hierarchy.global_settings = snapshot.global_settings;
        for record in snapshot.domains {
            let mut domain = Domain::new(record.name, record.min_y, record.max_y);
            domain.settings = record.settings;
            hierarchy.add_domain(domain)?;
        }
        let mut max_id = 0;
        for region in snapshot.regions {
            if hierarchy.name_taken(&region.name) {
                return Err(ZoneError::DuplicateName { name: region.name });
            }
            for volume in region.volumes.values() {
                hierarchy.check_volume(&region.name, &region.domain, volume)?;
            }
            if let Some(domain) = hierarchy.domains.get_mut(&region.domain) {
                for (id, volume) in &region.volumes {
                    domain.index.put(*id, volume.clone(), region.name.clone());
                    max_id = max_id.max(*id);
                }
            }
            hierarchy.regions.insert(region.name.clone(), region);
        }
        for region in hierarchy.regions.values() {
            if let Some(parent) = &region.parent {
                if !hierarchy.regions.contains_key(parent) {
                    return Err(ZoneError::UnknownRegion { region: parent.clone() });
                }
            }
        }
        hierarchy.next_volume_id = max_id + 1;
        hierarchy.construct_indexes();
        Ok(hierarchy)
    }
}
