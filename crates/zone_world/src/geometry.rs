//! Volume shapes and containment/intersection predicates.
//!
//! Everything here is a pure value type: shapes are validated at
//! construction and never mutated afterwards, so the spatial index can
//! trust any `Shape` it is handed. Coordinates are discrete (`i64`) and
//! containment is inclusive on both bounds.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A discrete point in a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl Pos {
    pub fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Axis-aligned bounding box, inclusive on both corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Pos,
    pub max: Pos,
}

/// Errors produced by shape constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeError {
    InvertedBounds { axis: char, min: i64, max: i64 },
    NonPositiveRadius { radius: i64 },
}

impl fmt::Display for VolumeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeError::InvertedBounds { axis, min, max } => {
                write!(f, "inverted bounds on {axis}: {min} > {max}")
            }
            VolumeError::NonPositiveRadius { radius } => {
                write!(f, "radius must be positive, got {radius}")
            }
        }
    }
}

impl std::error::Error for VolumeError {}

/// One geometric volume shape.
///
/// The enum is closed on purpose: adding a shape forces every predicate
/// below to be extended before the crate compiles again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Shape {
    Cuboid {
        min: Pos,
        max: Pos,
    },
    Sphere {
        center: Pos,
        radius: i64,
    },
    Cylinder {
        center_x: i64,
        center_z: i64,
        radius: i64,
        min_y: i64,
        max_y: i64,
    },
    /// A horizontal band spanning the full x/z extent of its domain.
    Slab {
        min_y: i64,
        max_y: i64,
    },
}

impl Shape {
    /// Axis-aligned cuboid between two corners, inclusive.
    pub fn cuboid(min: Pos, max: Pos) -> Result<Self, VolumeError> {
        for (axis, lo, hi) in [
            ('x', min.x, max.x),
            ('y', min.y, max.y),
            ('z', min.z, max.z),
        ] {
            if lo > hi {
                return Err(VolumeError::InvertedBounds { axis, min: lo, max: hi });
            }
        }
        Ok(Shape::Cuboid { min, max })
    }

    pub fn sphere(center: Pos, radius: i64) -> Result<Self, VolumeError> {
        if radius <= 0 {
            return Err(VolumeError::NonPositiveRadius { radius });
        }
        Ok(Shape::Sphere { center, radius })
    }

    /// Vertical cylinder: a circle on the x/z plane extruded over a y range.
    pub fn cylinder(
        center_x: i64,
        center_z: i64,
        radius: i64,
        min_y: i64,
        max_y: i64,
    ) -> Result<Self, VolumeError> {
        if radius <= 0 {
            return Err(VolumeError::NonPositiveRadius { radius });
        }
        if min_y > max_y {
            return Err(VolumeError::InvertedBounds { axis: 'y', min: min_y, max: max_y });
        }
        Ok(Shape::Cylinder { center_x, center_z, radius, min_y, max_y })
    }

    pub fn slab(min_y: i64, max_y: i64) -> Result<Self, VolumeError> {
        if min_y > max_y {
            return Err(VolumeError::InvertedBounds { axis: 'y', min: min_y, max: max_y });
        }
        Ok(Shape::Slab { min_y, max_y })
    }

    /// Re-checks the constructor invariants.
    ///
    /// Variant fields are public, so a shape assembled with literal
    /// syntax can bypass the validating constructors; the hierarchy
    /// re-validates before anything reaches an index.
    pub fn validate(&self) -> Result<(), VolumeError> {
        match *self {
            Shape::Cuboid { min, max } => Shape::cuboid(min, max).map(|_| ()),
            Shape::Sphere { center, radius } => Shape::sphere(center, radius).map(|_| ()),
            Shape::Cylinder { center_x, center_z, radius, min_y, max_y } => {
                Shape::cylinder(center_x, center_z, radius, min_y, max_y).map(|_| ())
            }
            Shape::Slab { min_y, max_y } => Shape::slab(min_y, max_y).map(|_| ()),
        }
    }

    /// Inclusive vertical extent of the shape.
    pub fn y_range(&self) -> (i64, i64) {
        match *self {
            Shape::Cuboid { min, max } => (min.y, max.y),
            Shape::Sphere { center, radius } => (center.y - radius, center.y + radius),
            Shape::Cylinder { min_y, max_y, .. } => (min_y, max_y),
            Shape::Slab { min_y, max_y } => (min_y, max_y),
        }
    }

    /// Bounding box, or `None` for slabs, which are horizontally unbounded.
    pub fn aabb(&self) -> Option<Aabb> {
        match *self {
            Shape::Cuboid { min, max } => Some(Aabb { min, max }),
            Shape::Sphere { center, radius } => Some(Aabb {
                min: Pos::new(center.x - radius, center.y - radius, center.z - radius),
                max: Pos::new(center.x + radius, center.y + radius, center.z + radius),
            }),
            Shape::Cylinder { center_x, center_z, radius, min_y, max_y } => Some(Aabb {
                min: Pos::new(center_x - radius, min_y, center_z - radius),
                max: Pos::new(center_x + radius, max_y, center_z + radius),
            }),
            Shape::Slab { .. } => None,
        }
    }

    pub fn contains(&self, pos: Pos) -> bool {
        match *self {
            Shape::Cuboid { min, max } => {
                pos.x >= min.x
                    && pos.x <= max.x
                    && pos.y >= min.y
                    && pos.y <= max.y
                    && pos.z >= min.z
                    && pos.z <= max.z
            }
            Shape::Sphere { center, radius } => {
                dist_sq_3d(pos.x - center.x, pos.y - center.y, pos.z - center.z)
                    <= sq(radius)
            }
            Shape::Cylinder { center_x, center_z, radius, min_y, max_y } => {
                pos.y >= min_y
                    && pos.y <= max_y
                    && dist_sq_2d(pos.x - center_x, pos.z - center_z) <= sq(radius)
            }
            Shape::Slab { min_y, max_y } => pos.y >= min_y && pos.y <= max_y,
        }
    }

    /// Whether two shapes share at least one point.
    ///
    /// Each unordered pair is implemented once; the mirrored order
    /// delegates back with the operands swapped.
    pub fn intersects(&self, other: &Shape) -> bool {
        use Shape::*;
        match (self, other) {
            (&Cuboid { min: a0, max: a1 }, &Cuboid { min: b0, max: b1 }) => {
                overlap(a0.x, a1.x, b0.x, b1.x)
                    && overlap(a0.y, a1.y, b0.y, b1.y)
                    && overlap(a0.z, a1.z, b0.z, b1.z)
            }
            (&Cuboid { min, max }, &Sphere { center, radius }) => {
                let cx = clamp(center.x, min.x, max.x);
                let cy = clamp(center.y, min.y, max.y);
                let cz = clamp(center.z, min.z, max.z);
                dist_sq_3d(center.x - cx, center.y - cy, center.z - cz) <= sq(radius)
            }
            (&Cuboid { min, max }, &Cylinder { center_x, center_z, radius, min_y, max_y }) => {
                let cx = clamp(center_x, min.x, max.x);
                let cz = clamp(center_z, min.z, max.z);
                overlap(min.y, max.y, min_y, max_y)
                    && dist_sq_2d(center_x - cx, center_z - cz) <= sq(radius)
            }
            (&Cuboid { min, max }, &Slab { min_y, max_y }) => {
                overlap(min.y, max.y, min_y, max_y)
            }
            (&Sphere { center: a, radius: ra }, &Sphere { center: b, radius: rb }) => {
                dist_sq_3d(a.x - b.x, a.y - b.y, a.z - b.z) <= sq(ra + rb)
            }
            (&Sphere { center, radius }, &Cylinder { center_x, center_z, radius: rc, min_y, max_y }) => {
                // Closest point on the cylinder: clamp horizontally to the
                // circle, vertically to the y band, then compare gaps.
                let horiz = (dist_sq_2d(center.x - center_x, center.z - center_z) as f64).sqrt();
                let gap_h = (horiz - rc as f64).max(0.0);
                let gap_v = vertical_gap(center.y, min_y, max_y) as f64;
                gap_h * gap_h + gap_v * gap_v <= (radius as f64) * (radius as f64)
            }
            (&Sphere { center, radius }, &Slab { min_y, max_y }) => {
                vertical_gap(center.y, min_y, max_y) <= radius
            }
            (
                &Cylinder { center_x: ax, center_z: az, radius: ra, min_y: ay0, max_y: ay1 },
                &Cylinder { center_x: bx, center_z: bz, radius: rb, min_y: by0, max_y: by1 },
            ) => {
                overlap(ay0, ay1, by0, by1) && dist_sq_2d(ax - bx, az - bz) <= sq(ra + rb)
            }
            (&Cylinder { min_y: a0, max_y: a1, .. }, &Slab { min_y: b0, max_y: b1 }) => {
                overlap(a0, a1, b0, b1)
            }
            (&Slab { min_y: a0, max_y: a1 }, &Slab { min_y: b0, max_y: b1 }) => {
                overlap(a0, a1, b0, b1)
            }
            // Mirrored pairs.
            (a @ &Sphere { .. }, b @ &Cuboid { .. })
            | (a @ &Cylinder { .. }, b @ &Cuboid { .. })
            | (a @ &Slab { .. }, b @ &Cuboid { .. })
            | (a @ &Cylinder { .. }, b @ &Sphere { .. })
            | (a @ &Slab { .. }, b @ &Sphere { .. })
            | (a @ &Slab { .. }, b @ &Cylinder { .. }) => b.intersects(a),
        }
    }
}

/// A placed shape: geometry plus ownership and lifecycle metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub shape: Shape,
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Epoch millis after which this volume no longer counts (preview
    /// volumes); purged explicitly, never checked on the query path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
}

impl Volume {
    pub fn new(shape: Shape, domain: impl Into<String>) -> Self {
        Self {
            shape,
            domain: domain.into(),
            name: None,
            expires_at: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn expiring(mut self, expires_at: u64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn expired(&self, now_ms: u64) -> bool {
        matches!(self.expires_at, Some(at) if at <= now_ms)
    }
}

fn sq(v: i64) -> i128 {
    (v as i128) * (v as i128)
}

fn dist_sq_2d(dx: i64, dz: i64) -> i128 {
    sq(dx) + sq(dz)
}

fn dist_sq_3d(dx: i64, dy: i64, dz: i64) -> i128 {
    sq(dx) + sq(dy) + sq(dz)
}

fn overlap(a0: i64, a1: i64, b0: i64, b1: i64) -> bool {
    a0 <= b1 && b0 <= a1
}

fn clamp(v: i64, lo: i64, hi: i64) -> i64 {
    v.max(lo).min(hi)
}

/// Distance from `y` to the inclusive band, zero when inside.
fn vertical_gap(y: i64, min_y: i64, max_y: i64) -> i64 {
    if y < min_y {
        min_y - y
    } else if y > max_y {
        y - max_y
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: i64, y: i64, z: i64) -> Pos {
        Pos::new(x, y, z)
    }

    #[test]
    fn cuboid_contains_is_inclusive_on_both_bounds() {
        let shape = Shape::cuboid(p(0, 0, 0), p(10, 10, 10)).unwrap();
        assert!(shape.contains(p(0, 0, 0)));
        assert!(shape.contains(p(10, 10, 10)));
        assert!(shape.contains(p(5, 5, 5)));
        assert!(!shape.contains(p(11, 5, 5)));
        assert!(!shape.contains(p(5, -1, 5)));
    }

    #[test]
    fn sphere_contains_matches_squared_distance() {
        let shape = Shape::sphere(p(0, 0, 0), 5).unwrap();
        assert!(shape.contains(p(5, 0, 0)));
        assert!(shape.contains(p(3, 4, 0)));
        assert!(!shape.contains(p(4, 4, 0)));
        assert!(!shape.contains(p(6, 0, 0)));
    }

    #[test]
    fn cylinder_contains_checks_band_and_disc() {
        let shape = Shape::cylinder(0, 0, 4, 10, 20).unwrap();
        assert!(shape.contains(p(4, 10, 0)));
        assert!(shape.contains(p(0, 20, -4)));
        assert!(!shape.contains(p(0, 9, 0)));
        assert!(!shape.contains(p(3, 15, 3)));
    }

    #[test]
    fn slab_ignores_horizontal_axes() {
        let shape = Shape::slab(0, 63).unwrap();
        assert!(shape.contains(p(1_000_000, 0, -1_000_000)));
        assert!(shape.contains(p(0, 63, 0)));
        assert!(!shape.contains(p(0, 64, 0)));
    }

    #[test]
    fn degenerate_shapes_are_rejected() {
        assert_eq!(
            Shape::cuboid(p(5, 0, 0), p(0, 10, 10)),
            Err(VolumeError::InvertedBounds { axis: 'x', min: 5, max: 0 })
        );
        assert_eq!(
            Shape::sphere(p(0, 0, 0), 0),
            Err(VolumeError::NonPositiveRadius { radius: 0 })
        );
        assert_eq!(
            Shape::cylinder(0, 0, 3, 7, 2),
            Err(VolumeError::InvertedBounds { axis: 'y', min: 7, max: 2 })
        );
        assert!(Shape::slab(10, 5).is_err());
    }

    #[test]
    fn contains_agrees_with_brute_force_over_a_lattice() {
        let shapes = [
            Shape::cuboid(p(-3, -3, -3), p(4, 2, 5)).unwrap(),
            Shape::sphere(p(1, 0, -1), 4).unwrap(),
            Shape::cylinder(0, 1, 3, -2, 3).unwrap(),
            Shape::slab(-1, 2).unwrap(),
        ];
        for shape in &shapes {
            for x in -6..=6 {
                for y in -6..=6 {
                    for z in -6..=6 {
                        let pos = p(x, y, z);
                        let expected = match *shape {
                            Shape::Cuboid { min, max } => {
                                (min.x..=max.x).contains(&x)
                                    && (min.y..=max.y).contains(&y)
                                    && (min.z..=max.z).contains(&z)
                            }
                            Shape::Sphere { center, radius } => {
                                let dx = x - center.x;
                                let dy = y - center.y;
                                let dz = z - center.z;
                                dx * dx + dy * dy + dz * dz <= radius * radius
                            }
                            Shape::Cylinder { center_x, center_z, radius, min_y, max_y } => {
                                let dx = x - center_x;
                                let dz = z - center_z;
                                (min_y..=max_y).contains(&y)
                                    && dx * dx + dz * dz <= radius * radius
                            }
                            Shape::Slab { min_y, max_y } => (min_y..=max_y).contains(&y),
                        };
                        assert_eq!(shape.contains(pos), expected, "{shape:?} at {pos}");
                    }
                }
            }
        }
    }

    #[test]
    fn intersects_is_symmetric_across_all_pairs() {
        let shapes = [
            Shape::cuboid(p(0, 0, 0), p(10, 10, 10)).unwrap(),
            Shape::sphere(p(12, 5, 5), 3).unwrap(),
            Shape::cylinder(5, 5, 2, -5, 25).unwrap(),
            Shape::slab(8, 9).unwrap(),
        ];
        for a in &shapes {
            for b in &shapes {
                assert_eq!(a.intersects(b), b.intersects(a), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn cuboid_sphere_intersection_boundary() {
        let cube = Shape::cuboid(p(0, 0, 0), p(10, 10, 10)).unwrap();
        // Touching the face exactly.
        assert!(cube.intersects(&Shape::sphere(p(13, 5, 5), 3).unwrap()));
        // One block too far.
        assert!(!cube.intersects(&Shape::sphere(p(14, 5, 5), 3).unwrap()));
        // Corner approach: distance sqrt(3) > 1.
        assert!(!cube.intersects(&Shape::sphere(p(12, 12, 12), 1).unwrap()));
        assert!(cube.intersects(&Shape::sphere(p(12, 12, 12), 4).unwrap()));
    }

    #[test]
    fn sphere_cylinder_intersection_accounts_for_both_gaps() {
        let cyl = Shape::cylinder(0, 0, 5, 0, 10).unwrap();
        // Directly above the rim, vertical gap 2, horizontal gap 0.
        assert!(Shape::sphere(p(5, 12, 0), 2).unwrap().intersects(&cyl));
        assert!(!Shape::sphere(p(5, 13, 0), 2).unwrap().intersects(&cyl));
        // Diagonal approach to the rim.
        assert!(Shape::sphere(p(8, 13, 0), 5).unwrap().intersects(&cyl));
        assert!(!Shape::sphere(p(9, 14, 0), 5).unwrap().intersects(&cyl));
    }

    #[test]
    fn slab_intersections_reduce_to_band_overlap() {
        let slab = Shape::slab(0, 10).unwrap();
        assert!(slab.intersects(&Shape::slab(10, 20).unwrap()));
        assert!(!slab.intersects(&Shape::slab(11, 20).unwrap()));
        assert!(slab.intersects(&Shape::cuboid(p(999, 5, 999), p(1000, 6, 1000)).unwrap()));
        assert!(!slab.intersects(&Shape::cylinder(0, 0, 1, 11, 12).unwrap()));
    }

    #[test]
    fn volume_expiry() {
        let shape = Shape::slab(0, 1).unwrap();
        let volume = Volume::new(shape.clone(), "earth").expiring(1_000);
        assert!(!volume.expired(999));
        assert!(volume.expired(1_000));
        assert!(!Volume::new(shape, "earth").expired(u64::MAX));
    }
}
