//! Error types for the engine module.

use std::fmt;

use crate::geometry::VolumeError;

use super::host::HostKey;

/// Errors that can occur in hierarchy, setting, and resolve operations.
///
/// Every variant carries the offending identifier so the embedding
/// application can build a message; none of these are retried internally.
#[derive(Debug, Clone, PartialEq)]
pub enum ZoneError {
    UnknownDomain { domain: String },
    CoordinateOutOfBounds { domain: String, y: i64, min_y: i64, max_y: i64 },
    UnknownKey { key: String },
    UnknownRegion { region: String },
    UnknownVolume { region: String, volume: u64 },
    DuplicateName { name: String },
    DuplicateKey { key: String },
    InvalidVolume { region: String, source: VolumeError },
    WrongDomain { region: String, expected: String, found: String },
    TypeMismatch { key: String, expected: String, found: String },
    GlobalOnlyViolation { key: String, host: HostKey },
    Store(String),
}

impl fmt::Display for ZoneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneError::UnknownDomain { domain } => write!(f, "unknown domain: {domain}"),
            ZoneError::CoordinateOutOfBounds { domain, y, min_y, max_y } => write!(
                f,
                "y={y} outside vertical bounds {min_y}..={max_y} of domain {domain}"
            ),
            ZoneError::UnknownKey { key } => write!(f, "unknown setting key: {key}"),
            ZoneError::UnknownRegion { region } => write!(f, "unknown region: {region}"),
            ZoneError::UnknownVolume { region, volume } => {
                write!(f, "region {region} has no volume #{volume}")
            }
            ZoneError::DuplicateName { name } => write!(f, "name already taken: {name}"),
            ZoneError::DuplicateKey { key } => write!(f, "setting key already registered: {key}"),
            ZoneError::InvalidVolume { region, source } => {
                write!(f, "invalid volume for region {region}: {source}")
            }
            ZoneError::WrongDomain { region, expected, found } => write!(
                f,
                "volume for region {region} belongs to domain {found}, expected {expected}"
            ),
            ZoneError::TypeMismatch { key, expected, found } => {
                write!(f, "value for key {key} has type {found}, expected {expected}")
            }
            ZoneError::GlobalOnlyViolation { key, host } => {
                write!(f, "key {key} is global-only and cannot be set on {host}")
            }
            ZoneError::Store(message) => write!(f, "store error: {message}"),
        }
    }
}

impl std::error::Error for ZoneError {}
