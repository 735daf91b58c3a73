//! Actor targets: which actors a setting applies to.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Permission that lets an actor bypass player-restrictive settings.
pub const BYPASS_PERMISSION: &str = "zone.unrestricted";

/// Actor permission predicate supplied by the embedding application.
///
/// Consulted only during target evaluation; results are never cached
/// beyond a single resolve call.
pub trait PermissionLookup {
    fn has_permission(&self, actor_id: &str, permission: &str) -> bool;
}

impl<F> PermissionLookup for F
where
    F: Fn(&str, &str) -> bool,
{
    fn has_permission(&self, actor_id: &str, permission: &str) -> bool {
        self(actor_id, permission)
    }
}

/// A permission lookup that grants nothing; for actor-less contexts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPermissions;

impl PermissionLookup for NoPermissions {
    fn has_permission(&self, _actor_id: &str, _permission: &str) -> bool {
        false
    }
}

/// Membership component of a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "actors", rename_all = "snake_case")]
pub enum TargetMode {
    All,
    None,
    Whitelist(BTreeSet<String>),
    Blacklist(BTreeSet<String>),
}

impl Default for TargetMode {
    fn default() -> Self {
        TargetMode::All
    }
}

/// Filter describing which actors a setting applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    #[serde(default)]
    pub mode: TargetMode,
    /// Per-permission overrides; an override held by the actor takes
    /// precedence over membership.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub permissions: BTreeMap<String, bool>,
    /// Apply even to actors holding the bypass permission.
    #[serde(default)]
    pub indiscriminate: bool,
}

impl Target {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn none() -> Self {
        Self {
            mode: TargetMode::None,
            ..Self::default()
        }
    }

    pub fn whitelist<I, S>(actors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode: TargetMode::Whitelist(actors.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn blacklist<I, S>(actors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode: TargetMode::Blacklist(actors.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn with_permission(mut self, permission: impl Into<String>, applies: bool) -> Self {
        self.permissions.insert(permission.into(), applies);
        self
    }

    pub fn indiscriminate(mut self) -> Self {
        self.indiscriminate = true;
        self
    }

    /// Whether this target applies to `actor`.
    ///
    /// Permission overrides held by the actor win over membership: any
    /// held override mapped to `true` admits, otherwise any held
    /// override mapped to `false` rejects. Overrides the actor does not
    /// hold are ignored. Without an actor only membership applies;
    /// `All` and `Blacklist` match, `None` and `Whitelist` do not.
    pub fn applies_to(&self, actor: Option<&str>, perms: &dyn PermissionLookup) -> bool {
        if let Some(actor_id) = actor {
            let mut denied = false;
            for (permission, applies) in &self.permissions {
                if perms.has_permission(actor_id, permission) {
                    if *applies {
                        return true;
                    }
                    denied = true;
                }
            }
            if denied {
                return false;
            }
        }
        match (&self.mode, actor) {
            (TargetMode::All, _) => true,
            (TargetMode::None, _) => false,
            (TargetMode::Whitelist(actors), Some(actor_id)) => actors.contains(actor_id),
            (TargetMode::Whitelist(_), None) => false,
            (TargetMode::Blacklist(actors), Some(actor_id)) => !actors.contains(actor_id),
            (TargetMode::Blacklist(_), None) => true,
        }
    }
}
