//! Regions: named, prioritized areas defined by one or more volumes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::{Shape, Volume};

use super::index::VolumeId;
use super::setting::SettingMap;

/// A named node of the hierarchy covering zero or more volumes.
///
/// The parent link feeds setting inheritance only; it says nothing about
/// spatial containment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Higher wins; ties among regions break by lexicographic name.
    pub priority: i32,
    pub volumes: BTreeMap<VolumeId, Volume>,
    pub settings: SettingMap,
}

/// What happens to child regions when their parent is removed.
///
/// Always an explicit parameter; removal never silently reparents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Children lose their parent link and hang off the domain.
    DetachToDomain,
    /// Children move up to the removed region's own parent, if any.
    ReparentToGrandparent,
}

/// Blueprint for creating a region through the hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSpec {
    pub name: String,
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub volumes: Vec<Volume>,
}

impl RegionSpec {
    pub fn new(name: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: domain.into(),
            parent: None,
            priority: 0,
            volumes: Vec::new(),
        }
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Adds a shape as a volume owned by the region's own domain.
    pub fn shape(mut self, shape: Shape) -> Self {
        let domain = self.domain.clone();
        self.volumes.push(Volume::new(shape, domain));
        self
    }

    pub fn volume(mut self, volume: Volume) -> Self {
        self.volumes.push(volume);
        self
    }
}
