//! Host identity: the nodes of the hierarchy that can carry settings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Names one settings-carrying node in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum HostKey {
    Global,
    Domain(String),
    Region(String),
}

impl HostKey {
    pub fn domain(name: impl Into<String>) -> Self {
        HostKey::Domain(name.into())
    }

    pub fn region(name: impl Into<String>) -> Self {
        HostKey::Region(name.into())
    }

    /// Specificity rank: Region > Domain > Global.
    pub fn rank(&self) -> u8 {
        match self {
            HostKey::Global => 0,
            HostKey::Domain(_) => 1,
            HostKey::Region(_) => 2,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            HostKey::Global => "global",
            HostKey::Domain(name) | HostKey::Region(name) => name,
        }
    }
}

impl fmt::Display for HostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostKey::Global => write!(f, "global"),
            HostKey::Domain(name) => write!(f, "domain:{name}"),
            HostKey::Region(name) => write!(f, "region:{name}"),
        }
    }
}
