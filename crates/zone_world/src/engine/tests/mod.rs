//! Tests for the engine module.

use crate::geometry::{Pos, Shape};

use super::{Domain, RegionSpec, Scalar, SettingKey, SettingRegistry, ZoneWorld};

pub(super) fn p(x: i64, y: i64, z: i64) -> Pos {
    Pos::new(x, y, z)
}

pub(super) fn cube(min: (i64, i64, i64), max: (i64, i64, i64)) -> Shape {
    Shape::cuboid(p(min.0, min.1, min.2), p(max.0, max.1, max.2)).unwrap()
}

pub(super) fn registry() -> SettingRegistry {
    let mut registry = SettingRegistry::new();
    registry
        .register(SettingKey::unary("pvp", Scalar::Bool(true)).category("combat"))
        .unwrap();
    registry
        .register(
            SettingKey::unary("block-break", Scalar::Bool(true))
                .category("blocks")
                .player_restrictive(),
        )
        .unwrap();
    registry
        .register(SettingKey::unary("greeting", Scalar::Text("hello".to_string())))
        .unwrap();
    registry
        .register(SettingKey::poly("allowed-commands", ["spawn", "home", "help"]))
        .unwrap();
    registry
        .register(SettingKey::unary("tick-rate", Scalar::Integer(20)).global_only())
        .unwrap();
    registry
}

/// Domain "earth" with depth 256 and region "spawn" (priority 10) over
/// the box (0,0,0)-(10,10,10).
pub(super) fn earth_world() -> ZoneWorld {
    let mut world = ZoneWorld::new(registry());
    world.add_domain(Domain::with_depth("earth", 256)).unwrap();
    world
        .add_region(RegionSpec::new("spawn", "earth").priority(10).shape(cube((0, 0, 0), (10, 10, 10))))
        .unwrap();
    world
}

mod settings;
mod shared;
