use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::EntityId;

/// Hierarchical, slash-delimited key identifying one stored field or container.
///
/// Paths are normalized on construction: a single leading `/`, no trailing
/// slash, no empty segments. The root path is `/`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StorePath(String);

impl StorePath {
    pub fn root() -> Self {
        Self("/".to_string())
    }

    pub fn new(path: &str) -> Self {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Self::root();
        }
        Self(format!("/{}", segments.join("/")))
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn id(&self) -> EntityId {
        EntityId::from_path(self)
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Last segment, or `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.segments().last()
    }

    /// Append one or more segments (`segment` may itself contain slashes).
    pub fn join(&self, segment: &str) -> Self {
        if self.is_root() {
            Self::new(segment)
        } else {
            Self::new(&format!("{}/{}", self.0, segment))
        }
    }

    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) | None => Some(Self::root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
        }
    }

    /// Strict ancestors, nearest first, ending with the root.
    pub fn ancestors(&self) -> Vec<StorePath> {
        let mut out = Vec::new();
        let mut current = self.parent();
        while let Some(path) = current {
            current = path.parent();
            out.push(path);
        }
        out
    }

    /// True if `self` lies strictly below `other`.
    pub fn is_descendant_of(&self, other: &StorePath) -> bool {
        if self == other {
            return false;
        }
        if other.is_root() {
            return true;
        }
        self.0.len() > other.0.len()
            && self.0.starts_with(&other.0)
            && self.0.as_bytes()[other.0.len()] == b'/'
    }
}

impl Default for StorePath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StorePath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for StorePath {
    fn from(path: String) -> Self {
        Self::new(&path)
    }
}

impl Serialize for StorePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for StorePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::new(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_slashes() {
        assert_eq!(StorePath::new("foo//bar/").as_str(), "/foo/bar");
        assert_eq!(StorePath::new("").as_str(), "/");
        assert_eq!(StorePath::new("///").as_str(), "/");
    }

    #[test]
    fn join_and_parent() {
        let path = StorePath::root().join("foo").join("bar");
        assert_eq!(path.as_str(), "/foo/bar");
        assert_eq!(path.parent().unwrap().as_str(), "/foo");
        assert_eq!(path.parent().unwrap().parent().unwrap(), StorePath::root());
        assert!(StorePath::root().parent().is_none());
    }

    #[test]
    fn ancestors_nearest_first() {
        let path = StorePath::new("/a/b/c");
        let names: Vec<String> = path.ancestors().iter().map(|p| p.to_string()).collect();
        assert_eq!(names, vec!["/a/b", "/a", "/"]);
    }

    #[test]
    fn descendant_requires_segment_boundary() {
        let parent = StorePath::new("/audio/graph");
        assert!(StorePath::new("/audio/graph/nodes").is_descendant_of(&parent));
        assert!(!StorePath::new("/audio/graphics").is_descendant_of(&parent));
        assert!(!parent.is_descendant_of(&parent));
        assert!(parent.is_descendant_of(&StorePath::root()));
    }

    #[test]
    fn serializes_as_string() {
        let path = StorePath::new("/foo/bar");
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"/foo/bar\"");
        let back: StorePath = serde_json::from_str("\"foo/bar/\"").unwrap();
        assert_eq!(back, path);
    }
}
