//! Patches: per-path operation lists describing the difference between two
//! store snapshots.
//!
//! - [`create_patch`] diffs two snapshots (see `diff.rs`)
//! - [`merge`] folds two chronologically adjacent patches into one
//! - [`apply_patch`] replays a patch onto a transient store

mod apply;
mod diff;
mod merge;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use patchwork_types::{EntityId, Primitive, StorePath};

pub use apply::apply_patch;
pub use diff::create_patch;
pub use merge::merge;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatchOpKind {
    Add,
    Remove,
    Replace,
    Insert,
    Erase,
    PushBack,
    PopBack,
    Set(usize),
}

impl PatchOpKind {
    /// Container element ops, as opposed to whole-value Add/Remove/Replace.
    pub fn is_element_op(self) -> bool {
        !matches!(
            self,
            PatchOpKind::Add | PatchOpKind::Remove | PatchOpKind::Replace
        )
    }
}

impl fmt::Display for PatchOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchOpKind::Add => write!(f, "add"),
            PatchOpKind::Remove => write!(f, "remove"),
            PatchOpKind::Replace => write!(f, "replace"),
            PatchOpKind::Insert => write!(f, "insert"),
            PatchOpKind::Erase => write!(f, "erase"),
            PatchOpKind::PushBack => write!(f, "push back"),
            PatchOpKind::PopBack => write!(f, "pop back"),
            PatchOpKind::Set(i) => write!(f, "set [{}]", i),
        }
    }
}

/// One operation on one path. Additive ops carry `value`, removals carry
/// `old`, replacements carry both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOp {
    pub kind: PatchOpKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Primitive>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<Primitive>,
}

impl PatchOp {
    fn new(kind: PatchOpKind, value: Option<Primitive>, old: Option<Primitive>) -> Self {
        Self { kind, value, old }
    }

    pub fn add(value: Primitive) -> Self {
        Self::new(PatchOpKind::Add, Some(value), None)
    }

    pub fn remove(old: Primitive) -> Self {
        Self::new(PatchOpKind::Remove, None, Some(old))
    }

    pub fn replace(value: Primitive, old: Primitive) -> Self {
        Self::new(PatchOpKind::Replace, Some(value), Some(old))
    }

    pub fn insert(value: Primitive) -> Self {
        Self::new(PatchOpKind::Insert, Some(value), None)
    }

    pub fn erase(old: Primitive) -> Self {
        Self::new(PatchOpKind::Erase, None, Some(old))
    }

    pub fn push_back(value: Primitive) -> Self {
        Self::new(PatchOpKind::PushBack, Some(value), None)
    }

    pub fn pop_back(old: Primitive) -> Self {
        Self::new(PatchOpKind::PopBack, None, Some(old))
    }

    pub fn set(index: usize, value: Primitive, old: Primitive) -> Self {
        Self::new(PatchOpKind::Set(index), Some(value), Some(old))
    }
}

impl fmt::Display for PatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(old) = &self.old {
            write!(f, " {}", old)?;
            if self.value.is_some() {
                write!(f, " ->")?;
            }
        }
        if let Some(value) = &self.value {
            write!(f, " {}", value)?;
        }
        Ok(())
    }
}

/// Ordered per-id operation lists between two snapshots.
///
/// `paths` records the path of every id the patch touches, so a patch can be
/// applied, displayed or filtered without the snapshots it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub base_id: EntityId,
    pub ops: BTreeMap<EntityId, Vec<PatchOp>>,
    pub paths: BTreeMap<EntityId, StorePath>,
}

impl Patch {
    pub fn new(base_id: EntityId) -> Self {
        Self {
            base_id,
            ops: BTreeMap::new(),
            paths: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of ids with at least one op.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.ops.keys().copied()
    }

    pub fn ops_for(&self, id: EntityId) -> &[PatchOp] {
        self.ops.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn path_of(&self, id: EntityId) -> Option<&StorePath> {
        self.paths.get(&id)
    }

    pub(crate) fn push(&mut self, path: &StorePath, id: EntityId, op: PatchOp) {
        self.ops.entry(id).or_default().push(op);
        self.paths.entry(id).or_insert_with(|| path.clone());
    }

    /// Only the ids at or below `base`.
    pub fn restricted_to(&self, base: &StorePath) -> Patch {
        let mut out = Patch::new(base.id());
        for (id, ops) in &self.ops {
            let Some(path) = self.paths.get(id) else {
                continue;
            };
            if path == base || path.is_descendant_of(base) {
                out.ops.insert(*id, ops.clone());
                out.paths.insert(*id, path.clone());
            }
        }
        out
    }

    /// Path-keyed rendering for debugging and metrics display.
    pub fn describe(&self) -> PatchDocument {
        let mut entries: Vec<PatchEntry> = self
            .ops
            .iter()
            .map(|(id, ops)| PatchEntry {
                id: *id,
                path: self.paths.get(id).cloned(),
                ops: ops.iter().map(ToString::to_string).collect(),
            })
            .collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        PatchDocument {
            base_id: self.base_id,
            entries,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchEntry {
    pub id: EntityId,
    pub path: Option<StorePath>,
    pub ops: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchDocument {
    pub base_id: EntityId,
    pub entries: Vec<PatchEntry>,
}

impl fmt::Display for PatchDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            match &entry.path {
                Some(path) => write!(f, "{}:", path)?,
                None => write!(f, "#{}:", entry.id)?,
            }
            for op in &entry.ops {
                write!(f, " {};", op)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Patch {
        let mut patch = Patch::new(StorePath::root().id());
        let volume = StorePath::new("/mixer/volume");
        let seq = StorePath::new("/mixer/sends");
        let name = StorePath::new("/name");
        patch.push(&volume, volume.id(), PatchOp::replace(Primitive::Float(0.5), Primitive::Float(1.0)));
        patch.push(&seq, seq.id(), PatchOp::push_back(Primitive::Int(2)));
        patch.push(&name, name.id(), PatchOp::add(Primitive::String("x".into())));
        patch
    }

    #[test]
    fn restricted_to_keeps_subtree() {
        let patch = sample();
        let mixer = patch.restricted_to(&StorePath::new("/mixer"));
        assert_eq!(mixer.len(), 2);
        assert_eq!(mixer.base_id, StorePath::new("/mixer").id());
        assert!(mixer.ops_for(StorePath::new("/name").id()).is_empty());
    }

    #[test]
    fn describe_is_path_sorted() {
        let doc = sample().describe();
        let paths: Vec<String> = doc
            .entries
            .iter()
            .filter_map(|e| e.path.as_ref().map(|p| p.to_string()))
            .collect();
        assert_eq!(paths, vec!["/mixer/sends", "/mixer/volume", "/name"]);
        assert_eq!(doc.entries[1].ops, vec!["replace 1 -> 0.5".to_string()]);
    }

    #[test]
    fn patch_serializes_to_json() {
        let patch = sample();
        let json = serde_json::to_string(&patch).unwrap();
        let back: Patch = serde_json::from_str(&json).unwrap();
        assert_eq!(back, patch);
    }
}
