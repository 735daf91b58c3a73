//! Setting keys, values, and per-host setting storage.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::ZoneError;
use super::target::Target;

/// The scalar types a unary setting can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    Bool,
    Integer,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scalar {
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Bool(_) => ScalarKind::Bool,
            Scalar::Integer(_) => ScalarKind::Integer,
            Scalar::Text(_) => ScalarKind::Text,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(v) => write!(f, "{v}"),
            Scalar::Integer(v) => write!(f, "{v}"),
            Scalar::Text(v) => write!(f, "{v}"),
        }
    }
}

/// Declared value type of a setting key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingKind {
    Unary(ScalarKind),
    Poly,
}

impl SettingKind {
    pub fn describe(&self) -> String {
        match self {
            SettingKind::Unary(ScalarKind::Bool) => "unary(bool)".to_string(),
            SettingKind::Unary(ScalarKind::Integer) => "unary(integer)".to_string(),
            SettingKind::Unary(ScalarKind::Text) => "unary(text)".to_string(),
            SettingKind::Poly => "poly".to_string(),
        }
    }
}

/// A poly value is either a full replacement set or a delta, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PolyValue {
    /// Replaces everything inherited from lower-priority hosts.
    Declarative { entries: BTreeSet<String> },
    /// Applied to the inherited set as `(inherited ∪ additive) \ subtractive`.
    Manipulative {
        additive: BTreeSet<String>,
        subtractive: BTreeSet<String>,
    },
}

impl PolyValue {
    pub fn declarative<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PolyValue::Declarative {
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }

    pub fn manipulative<I, J, S>(additive: I, subtractive: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PolyValue::Manipulative {
            additive: additive.into_iter().map(Into::into).collect(),
            subtractive: subtractive.into_iter().map(Into::into).collect(),
        }
    }

    /// Applies a manipulative delta to an accumulated set.
    pub fn apply_to(&self, base: &mut BTreeSet<String>) {
        match self {
            PolyValue::Declarative { entries } => {
                *base = entries.clone();
            }
            PolyValue::Manipulative { additive, subtractive } => {
                base.extend(additive.iter().cloned());
                for entry in subtractive {
                    base.remove(entry);
                }
            }
        }
    }
}

/// A stored setting value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingValue {
    Unary(Scalar),
    Poly(PolyValue),
}

impl SettingValue {
    pub fn bool(value: bool) -> Self {
        SettingValue::Unary(Scalar::Bool(value))
    }

    pub fn integer(value: i64) -> Self {
        SettingValue::Unary(Scalar::Integer(value))
    }

    pub fn text(value: impl Into<String>) -> Self {
        SettingValue::Unary(Scalar::Text(value.into()))
    }

    pub fn describe(&self) -> String {
        match self {
            SettingValue::Unary(scalar) => SettingKind::Unary(scalar.kind()).describe(),
            SettingValue::Poly(_) => SettingKind::Poly.describe(),
        }
    }
}

/// Immutable identity of a setting: id, type, defaults, and flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingKey {
    pub id: String,
    pub kind: SettingKind,
    pub default_value: SettingValue,
    /// The no-op value; defaults to `default_value`.
    pub natural_value: SettingValue,
    #[serde(default)]
    pub category: String,
    /// Whether something actively listens for this key.
    #[serde(default)]
    pub functional: bool,
    /// May only be set on the Global host.
    #[serde(default)]
    pub global_only: bool,
    /// Non-default values can be bypassed by the unrestricted permission
    /// unless the host's target is indiscriminate.
    #[serde(default)]
    pub player_restrictive: bool,
}

impl SettingKey {
    pub fn unary(id: impl Into<String>, default: Scalar) -> Self {
        let kind = SettingKind::Unary(default.kind());
        let default_value = SettingValue::Unary(default);
        Self {
            id: id.into(),
            kind,
            natural_value: default_value.clone(),
            default_value,
            category: String::new(),
            functional: false,
            global_only: false,
            player_restrictive: false,
        }
    }

    pub fn poly<I, S>(id: impl Into<String>, default_entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let default_value = SettingValue::Poly(PolyValue::declarative(default_entries));
        Self {
            id: id.into(),
            kind: SettingKind::Poly,
            natural_value: default_value.clone(),
            default_value,
            category: String::new(),
            functional: false,
            global_only: false,
            player_restrictive: false,
        }
    }

    pub fn natural(mut self, value: SettingValue) -> Self {
        self.natural_value = value;
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn functional(mut self) -> Self {
        self.functional = true;
        self
    }

    pub fn global_only(mut self) -> Self {
        self.global_only = true;
        self
    }

    pub fn player_restrictive(mut self) -> Self {
        self.player_restrictive = true;
        self
    }

    /// Whether a value agrees with this key's declared type.
    pub fn accepts(&self, value: &SettingValue) -> bool {
        match (self.kind, value) {
            (SettingKind::Unary(kind), SettingValue::Unary(scalar)) => scalar.kind() == kind,
            (SettingKind::Poly, SettingValue::Poly(_)) => true,
            _ => false,
        }
    }

    /// The default poly entries, for keys of poly kind.
    pub fn default_entries(&self) -> BTreeSet<String> {
        match &self.default_value {
            SettingValue::Poly(PolyValue::Declarative { entries }) => entries.clone(),
            _ => BTreeSet::new(),
        }
    }
}

/// All setting keys known to the system, declared before any resolve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingRegistry {
    keys: BTreeMap<String, SettingKey>,
}

impl SettingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: SettingKey) -> Result<(), ZoneError> {
        if self.keys.contains_key(&key.id) {
            return Err(ZoneError::DuplicateKey { key: key.id });
        }
        self.keys.insert(key.id.clone(), key);
        Ok(())
    }

    pub fn key(&self, id: &str) -> Option<&SettingKey> {
        self.keys.get(id)
    }

    pub fn require(&self, id: &str) -> Result<&SettingKey, ZoneError> {
        self.keys
            .get(id)
            .ok_or_else(|| ZoneError::UnknownKey { key: id.to_string() })
    }

    pub fn iter(&self) -> impl Iterator<Item = &SettingKey> {
        self.keys.values()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// One stored setting: a key id paired with a value and an optional target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: SettingValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
}

/// Per-host setting storage; at most one setting per key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingMap {
    entries: BTreeMap<String, Setting>,
}

impl SettingMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Setting> {
        self.entries.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: SettingValue, target: Option<Target>) {
        let key = key.into();
        self.entries.insert(
            key.clone(),
            Setting { key, value, target },
        );
    }

    pub fn remove(&mut self, key: &str) -> Option<Setting> {
        self.entries.remove(key)
    }

    /// Returns the stored target for `key`, creating one with `default` if
    /// the setting exists but carries none. Returns `None` for absent keys.
    pub fn target_or_insert_with(
        &mut self,
        key: &str,
        default: impl FnOnce() -> Target,
    ) -> Option<&mut Target> {
        let setting = self.entries.get_mut(key)?;
        Some(setting.target.get_or_insert_with(default))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Setting> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
