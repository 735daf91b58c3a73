use super::super::{
    HostKey, NoPermissions, PolyValue, Scalar, SettingKey, SettingValue, Target, TargetMode,
    ZoneError,
};
use super::{earth_world, registry};

#[test]
fn registry_rejects_duplicate_key_ids() {
    let mut registry = registry();
    assert_eq!(
        registry.register(SettingKey::unary("pvp", Scalar::Bool(false))),
        Err(ZoneError::DuplicateKey { key: "pvp".to_string() })
    );
    assert_eq!(registry.len(), 5);
}

#[test]
fn natural_value_defaults_to_the_default_value() {
    let key = SettingKey::unary("fall-damage", Scalar::Bool(true));
    assert_eq!(key.natural_value, key.default_value);

    let tuned = SettingKey::unary("fall-damage", Scalar::Bool(true))
        .natural(SettingValue::bool(false));
    assert_eq!(tuned.natural_value, SettingValue::bool(false));
    assert_eq!(tuned.default_value, SettingValue::bool(true));
}

#[test]
fn set_setting_enforces_the_declared_type() {
    let mut world = earth_world();
    let result = world.set_setting(
        &HostKey::Global,
        "pvp",
        SettingValue::integer(3),
        None,
    );
    assert_eq!(
        result,
        Err(ZoneError::TypeMismatch {
            key: "pvp".to_string(),
            expected: "unary(bool)".to_string(),
            found: "unary(integer)".to_string(),
        })
    );

    let result = world.set_setting(
        &HostKey::Global,
        "allowed-commands",
        SettingValue::bool(true),
        None,
    );
    assert!(matches!(result, Err(ZoneError::TypeMismatch { .. })));
}

#[test]
fn global_only_keys_cannot_land_on_other_hosts() {
    let mut world = earth_world();
    let result = world.set_setting(
        &HostKey::region("spawn"),
        "tick-rate",
        SettingValue::integer(10),
        None,
    );
    assert_eq!(
        result,
        Err(ZoneError::GlobalOnlyViolation {
            key: "tick-rate".to_string(),
            host: HostKey::region("spawn"),
        })
    );
    world
        .set_setting(&HostKey::Global, "tick-rate", SettingValue::integer(10), None)
        .unwrap();
}

#[test]
fn settings_on_unknown_hosts_are_rejected() {
    let mut world = earth_world();
    assert_eq!(
        world.set_setting(&HostKey::region("nowhere"), "pvp", SettingValue::bool(false), None),
        Err(ZoneError::UnknownRegion { region: "nowhere".to_string() })
    );
    assert_eq!(
        world.set_setting(&HostKey::domain("mars"), "pvp", SettingValue::bool(false), None),
        Err(ZoneError::UnknownDomain { domain: "mars".to_string() })
    );
}

#[test]
fn a_host_holds_at_most_one_setting_per_key() {
    let mut world = earth_world();
    world
        .set_setting(&HostKey::Global, "pvp", SettingValue::bool(true), None)
        .unwrap();
    world
        .set_setting(&HostKey::Global, "pvp", SettingValue::bool(false), None)
        .unwrap();
    let settings = world.hierarchy().global_settings();
    assert_eq!(settings.len(), 1);
    assert_eq!(settings.get("pvp").unwrap().value, SettingValue::bool(false));
}

#[test]
fn remove_setting_round_trips() {
    let mut world = earth_world();
    world
        .set_setting(&HostKey::Global, "pvp", SettingValue::bool(false), None)
        .unwrap();
    let removed = world.remove_setting(&HostKey::Global, "pvp").unwrap();
    assert_eq!(removed.unwrap().value, SettingValue::bool(false));
    assert!(world.remove_setting(&HostKey::Global, "pvp").unwrap().is_none());
    assert_eq!(
        world.remove_setting(&HostKey::Global, "ghost-key"),
        Err(ZoneError::UnknownKey { key: "ghost-key".to_string() })
    );
}

#[test]
fn compute_target_fills_in_a_default_once() {
    let mut world = earth_world();
    assert_eq!(
        world
            .compute_target(&HostKey::Global, "pvp", Target::none)
            .unwrap(),
        None
    );

    world
        .set_setting(&HostKey::Global, "pvp", SettingValue::bool(false), None)
        .unwrap();
    let created = world
        .compute_target(&HostKey::Global, "pvp", Target::none)
        .unwrap()
        .unwrap();
    assert_eq!(created.mode, TargetMode::None);

    // A second supplier does not overwrite the stored target.
    let kept = world
        .compute_target(&HostKey::Global, "pvp", Target::all)
        .unwrap()
        .unwrap();
    assert_eq!(kept.mode, TargetMode::None);
}

#[test]
fn target_modes_match_expected_actors() {
    let all = Target::all();
    let none = Target::none();
    let white = Target::whitelist(["steve"]);
    let black = Target::blacklist(["steve"]);

    assert!(all.applies_to(Some("steve"), &NoPermissions));
    assert!(all.applies_to(None, &NoPermissions));
    assert!(!none.applies_to(Some("steve"), &NoPermissions));
    assert!(!none.applies_to(None, &NoPermissions));
    assert!(white.applies_to(Some("steve"), &NoPermissions));
    assert!(!white.applies_to(Some("alex"), &NoPermissions));
    assert!(!white.applies_to(None, &NoPermissions));
    assert!(!black.applies_to(Some("steve"), &NoPermissions));
    assert!(black.applies_to(Some("alex"), &NoPermissions));
    assert!(black.applies_to(None, &NoPermissions));
}

#[test]
fn held_permission_overrides_beat_membership() {
    let target = Target::none().with_permission("vip", true);
    let perms = |actor: &str, permission: &str| actor == "steve" && permission == "vip";
    assert!(target.applies_to(Some("steve"), &perms));
    assert!(!target.applies_to(Some("alex"), &perms));
    // Overrides the actor does not hold are ignored entirely.
    assert!(!target.applies_to(None, &perms));
}

#[test]
fn manipulative_values_merge_additive_then_subtractive() {
    let mut base = ["a", "b"].into_iter().map(String::from).collect();
    PolyValue::manipulative(["c", "b"], ["a"]).apply_to(&mut base);
    let expected: std::collections::BTreeSet<String> =
        ["b", "c"].into_iter().map(String::from).collect();
    assert_eq!(base, expected);

    PolyValue::declarative(["x"]).apply_to(&mut base);
    assert_eq!(base.len(), 1);
    assert!(base.contains("x"));
}
