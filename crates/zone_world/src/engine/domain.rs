//! Domains: one per discrete world, root container for its regions.

use serde::{Deserialize, Serialize};

use crate::geometry::Shape;

use super::index::SpatialIndex;
use super::setting::SettingMap;

/// One discrete world. Holds the vertical bounds used to clip slabs and
/// validate coordinates, the world's spatial index, and its own settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub name: String,
    pub min_y: i64,
    pub max_y: i64,
    pub index: SpatialIndex,
    pub settings: SettingMap,
}

impl Domain {
    pub fn new(name: impl Into<String>, min_y: i64, max_y: i64) -> Self {
        Self {
            name: name.into(),
            min_y,
            max_y,
            index: SpatialIndex::default(),
            settings: SettingMap::new(),
        }
    }

    /// Vertical bounds running from zero to `depth - 1`.
    pub fn with_depth(name: impl Into<String>, depth: i64) -> Self {
        Self::new(name, 0, depth - 1)
    }

    pub fn contains_y(&self, y: i64) -> bool {
        y >= self.min_y && y <= self.max_y
    }

    /// Whether a shape's vertical extent touches this domain at all.
    pub fn overlaps_shape(&self, shape: &Shape) -> bool {
        let (lo, hi) = shape.y_range();
        lo <= self.max_y && hi >= self.min_y
    }

    /// Clamps a slab to the domain's vertical bounds; other shapes pass
    /// through unchanged.
    pub fn clip(&self, shape: Shape) -> Shape {
        match shape {
            Shape::Slab { min_y, max_y } => Shape::Slab {
                min_y: min_y.max(self.min_y),
                max_y: max_y.min(self.max_y),
            },
            other => other,
        }
    }
}
