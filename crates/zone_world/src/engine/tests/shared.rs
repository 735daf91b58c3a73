use std::thread;

use super::super::{
    HostKey, Location, NoPermissions, SettingValue, SharedZoneWorld,
};
use super::{earth_world, p};

#[test]
fn concurrent_readers_and_a_writer_stay_consistent() {
    let shared = SharedZoneWorld::new(earth_world());
    shared
        .write(|world| {
            world.set_setting(&HostKey::Global, "pvp", SettingValue::bool(true), None)
        })
        .unwrap();

    let mut readers = Vec::new();
    for _ in 0..4 {
        let shared = shared.clone();
        readers.push(thread::spawn(move || {
            for _ in 0..500 {
                let resolution = shared
                    .read(|world| {
                        world.resolve(
                            "pvp",
                            &Location::new("earth", p(5, 5, 5)),
                            None,
                            &NoPermissions,
                        )
                    })
                    .unwrap();
                // Either the pre-edit or post-edit value, never anything else.
                assert!(matches!(
                    resolution.value,
                    SettingValue::Unary(crate::engine::Scalar::Bool(_))
                ));
            }
        }));
    }
    for _ in 0..50 {
        shared
            .write(|world| {
                world.set_setting(
                    &HostKey::region("spawn"),
                    "pvp",
                    SettingValue::bool(false),
                    None,
                )
            })
            .unwrap();
    }
    for reader in readers {
        reader.join().unwrap();
    }

    let resolution = shared
        .read(|world| {
            world.resolve("pvp", &Location::new("earth", p(5, 5, 5)), None, &NoPermissions)
        })
        .unwrap();
    assert_eq!(resolution.source, Some(HostKey::region("spawn")));
}
