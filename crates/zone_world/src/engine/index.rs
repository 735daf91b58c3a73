//! Per-domain spatial index over placed volumes.
//!
//! A uniform x/z cell grid accelerates point and volume queries: each
//! bounded volume is registered in every cell its bounding box covers,
//! slabs and oversized footprints live in side lists scanned linearly.
//! The grid is an accelerator only — every candidate is confirmed against
//! the live volume table and the exact geometry predicate, so stale cell
//! entries after removals can never produce a false positive, and a
//! never-constructed index falls back to a full scan with no false
//! negatives.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::geometry::{Pos, Shape, Volume};

pub type VolumeId = u64;

/// Tuning knobs for the acceleration grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Edge length of one grid cell on the x/z plane.
    pub cell_size: i64,
    /// Footprints covering more cells than this go to the linear side
    /// list instead of being fanned out across the grid.
    pub oversized_cell_limit: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            cell_size: 64,
            oversized_cell_limit: 4096,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct IndexEntry {
    volume: Volume,
    region: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Grid {
    cells: BTreeMap<(i64, i64), Vec<VolumeId>>,
    slabs: Vec<VolumeId>,
    oversized: Vec<VolumeId>,
}

/// Maps placed volumes to their owning regions and answers point and
/// volume queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialIndex {
    config: IndexConfig,
    volumes: BTreeMap<VolumeId, IndexEntry>,
    /// Rebuilt by `construct`; dropped on (de)serialization and rebuilt
    /// by the load path.
    #[serde(skip)]
    grid: Option<Grid>,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new(IndexConfig::default())
    }
}

impl SpatialIndex {
    pub fn new(config: IndexConfig) -> Self {
        Self {
            config,
            volumes: BTreeMap::new(),
            grid: None,
        }
    }

    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    pub fn volume(&self, id: VolumeId) -> Option<&Volume> {
        self.volumes.get(&id).map(|entry| &entry.volume)
    }

    pub fn region_of(&self, id: VolumeId) -> Option<&str> {
        self.volumes.get(&id).map(|entry| entry.region.as_str())
    }

    /// Registers a volume under a region. Immediately visible to queries;
    /// when a grid exists the volume is threaded into it incrementally.
    pub fn put(&mut self, id: VolumeId, volume: Volume, region: impl Into<String>) {
        let region = region.into();
        if let Some(grid) = self.grid.as_mut() {
            insert_into_grid(grid, &self.config, id, &volume.shape);
        }
        self.volumes.insert(id, IndexEntry { volume, region });
    }

    /// Removes one volume. Stale grid references are tolerated; queries
    /// confirm against the live table.
    pub fn remove_volume(&mut self, id: VolumeId) -> Option<Volume> {
        self.volumes.remove(&id).map(|entry| entry.volume)
    }

    /// Removes every volume owned by `region`, returning their ids.
    pub fn remove_region(&mut self, region: &str) -> Vec<VolumeId> {
        let ids: Vec<VolumeId> = self
            .volumes
            .iter()
            .filter(|(_, entry)| entry.region == region)
            .map(|(id, _)| *id)
            .collect();
        for id in &ids {
            self.volumes.remove(id);
        }
        ids
    }

    /// Drops volumes whose expiry has passed, returning their ids.
    pub fn purge_expired(&mut self, now_ms: u64) -> Vec<VolumeId> {
        let ids: Vec<VolumeId> = self
            .volumes
            .iter()
            .filter(|(_, entry)| entry.volume.expired(now_ms))
            .map(|(id, _)| *id)
            .collect();
        for id in &ids {
            self.volumes.remove(id);
        }
        ids
    }

    /// Rebuilds the acceleration grid from the live volume table.
    pub fn construct(&mut self) {
        let mut grid = Grid::default();
        for (id, entry) in &self.volumes {
            insert_into_grid(&mut grid, &self.config, *id, &entry.volume.shape);
        }
        self.grid = Some(grid);
    }

    /// All regions with at least one volume containing the point.
    pub fn containing(&self, pos: Pos) -> BTreeSet<String> {
        let mut regions = BTreeSet::new();
        match &self.grid {
            Some(grid) => {
                let cell = cell_of(&self.config, pos.x, pos.z);
                let mut seen = BTreeSet::new();
                let cell_ids = grid.cells.get(&cell).map(Vec::as_slice).unwrap_or(&[]);
                for &id in cell_ids.iter().chain(&grid.oversized).chain(&grid.slabs) {
                    if !seen.insert(id) {
                        continue;
                    }
                    if let Some(entry) = self.volumes.get(&id) {
                        if entry.volume.shape.contains(pos) {
                            regions.insert(entry.region.clone());
                        }
                    }
                }
            }
            None => {
                for entry in self.volumes.values() {
                    if entry.volume.shape.contains(pos) {
                        regions.insert(entry.region.clone());
                    }
                }
            }
        }
        regions
    }

    /// All regions with at least one volume intersecting the query shape.
    pub fn intersecting(&self, shape: &Shape) -> BTreeSet<String> {
        let mut regions = BTreeSet::new();
        let candidates = self.candidates_for_shape(shape);
        for id in candidates {
            if let Some(entry) = self.volumes.get(&id) {
                if entry.volume.shape.intersects(shape) {
                    regions.insert(entry.region.clone());
                }
            }
        }
        regions
    }

    fn candidates_for_shape(&self, shape: &Shape) -> BTreeSet<VolumeId> {
        let grid = match &self.grid {
            Some(grid) => grid,
            None => return self.volumes.keys().copied().collect(),
        };
        let aabb = match shape.aabb() {
            Some(aabb) => aabb,
            // Slab queries are horizontally unbounded; test everything.
            None => return self.volumes.keys().copied().collect(),
        };
        let mut ids: BTreeSet<VolumeId> = grid.slabs.iter().copied().collect();
        ids.extend(grid.oversized.iter().copied());
        let (c0, c1) = cell_range(&self.config, aabb.min.x, aabb.min.z, aabb.max.x, aabb.max.z);
        if span_cells(c0, c1) > self.config.oversized_cell_limit {
            // Query footprint larger than the grid pays off for.
            return self.volumes.keys().copied().collect();
        }
        for cx in c0.0..=c1.0 {
            for cz in c0.1..=c1.1 {
                if let Some(cell_ids) = grid.cells.get(&(cx, cz)) {
                    ids.extend(cell_ids.iter().copied());
                }
            }
        }
        ids
    }
}

fn cell_of(config: &IndexConfig, x: i64, z: i64) -> (i64, i64) {
    (x.div_euclid(config.cell_size), z.div_euclid(config.cell_size))
}

fn cell_range(
    config: &IndexConfig,
    min_x: i64,
    min_z: i64,
    max_x: i64,
    max_z: i64,
) -> ((i64, i64), (i64, i64)) {
    (cell_of(config, min_x, min_z), cell_of(config, max_x, max_z))
}

fn span_cells(c0: (i64, i64), c1: (i64, i64)) -> u64 {
    let width = (c1.0 - c0.0 + 1).max(0) as u128;
    let depth = (c1.1 - c0.1 + 1).max(0) as u128;
    (width * depth).min(u64::MAX as u128) as u64
}

fn insert_into_grid(grid: &mut Grid, config: &IndexConfig, id: VolumeId, shape: &Shape) {
    let aabb = match shape.aabb() {
        Some(aabb) => aabb,
        None => {
            grid.slabs.push(id);
            return;
        }
    };
    let (c0, c1) = cell_range(config, aabb.min.x, aabb.min.z, aabb.max.x, aabb.max.z);
    if span_cells(c0, c1) > config.oversized_cell_limit {
        grid.oversized.push(id);
        return;
    }
    for cx in c0.0..=c1.0 {
        for cz in c0.1..=c1.1 {
            grid.cells.entry((cx, cz)).or_default().push(id);
        }
    }
}
