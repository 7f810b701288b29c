use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::StorePath;

/// Numeric identity of a stored path. Fast key for the store tries, patches
/// and change tracking.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// First eight bytes (big-endian) of the BLAKE3 digest of the normalized path.
    pub fn from_path(path: &StorePath) -> Self {
        let digest = blake3::hash(path.as_str().as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest.as_bytes()[..8]);
        Self(u64::from_be_bytes(bytes))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&StorePath> for EntityId {
    fn from(path: &StorePath) -> Self {
        Self::from_path(path)
    }
}

/// Directed edge between two entities, as stored in an adjacency list.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct IdPair {
    pub source: EntityId,
    pub destination: EntityId,
}

impl IdPair {
    pub fn new(source: EntityId, destination: EntityId) -> Self {
        Self {
            source,
            destination,
        }
    }

    pub fn touches(&self, id: EntityId) -> bool {
        self.source == id || self.destination == id
    }
}

impl fmt::Display for IdPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.source, self.destination)
    }
}

impl FromStr for IdPair {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (source, destination) = s
            .split_once('-')
            .ok_or_else(|| format!("id pair '{}' is missing a '-' separator", s))?;
        let source: u64 = source
            .parse()
            .map_err(|e| format!("bad source id in '{}': {}", s, e))?;
        let destination: u64 = destination
            .parse()
            .map_err(|e| format!("bad destination id in '{}': {}", s, e))?;
        Ok(Self::new(EntityId::new(source), EntityId::new(destination)))
    }
}
