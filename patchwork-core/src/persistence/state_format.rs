//! Nested-document snapshot of a store.
//!
//! Each path segment becomes a JSON object key; the value stored at a path
//! sits under `"$value"` in that path's object:
//!
//! ```json
//! { "format_version": 1,
//!   "state": { "mixer": { "volume": { "$value": { "Float": 0.8 } } } } }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use patchwork_types::{Primitive, StorePath};

use super::{check_version, parse_error, FORMAT_VERSION};
use crate::error::ProjectError;
use crate::store::{Store, StoreRead, TransientStore};

const VALUE_KEY: &str = "$value";

#[derive(Serialize, Deserialize)]
struct StateDocument {
    format_version: u32,
    state: Value,
}

pub fn encode(store: &Store) -> Result<String, ProjectError> {
    let document = StateDocument {
        format_version: FORMAT_VERSION,
        state: to_tree(store)?,
    };
    serde_json::to_string_pretty(&document)
        .map_err(|e| ProjectError::InvalidState(e.to_string()))
}

/// Parse a state document read from `source`.
pub fn decode(text: &str, source: &Path) -> Result<Store, ProjectError> {
    check_version(text, source)?;
    let document: StateDocument =
        serde_json::from_str(text).map_err(|e| parse_error(source, e))?;
    from_tree(&document.state)
}

/// The nested object for `store`, without the document header.
pub(super) fn to_tree(store: &Store) -> Result<Value, ProjectError> {
    let mut root = Map::new();
    for (id, path, _) in store.paths() {
        if let Some(segment) = path.segments().find(|s| s.starts_with('$')) {
            return Err(ProjectError::InvalidState(format!(
                "{}: segment {:?} uses the reserved '$' prefix",
                path, segment
            )));
        }
        let Some(value) = store.get_primitive(id) else {
            continue;
        };
        let mut node = &mut root;
        for segment in path.segments() {
            let child = node
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            node = match child {
                Value::Object(map) => map,
                // Only this function builds the tree, and it only inserts objects.
                _ => unreachable!("state document nodes are objects"),
            };
        }
        let encoded = serde_json::to_value(&value)
            .map_err(|e| ProjectError::InvalidState(format!("{}: {}", path, e)))?;
        node.insert(VALUE_KEY.to_string(), encoded);
    }
    Ok(Value::Object(root))
}

pub(super) fn from_tree(tree: &Value) -> Result<Store, ProjectError> {
    let mut store = TransientStore::new();
    read_node(tree, &StorePath::root(), &mut store)?;
    Ok(store.into_persistent())
}

fn read_node(node: &Value, path: &StorePath, store: &mut TransientStore) -> Result<(), ProjectError> {
    let Value::Object(map) = node else {
        return Err(ProjectError::InvalidState(format!(
            "{}: expected an object",
            path
        )));
    };
    for (key, child) in map {
        if key == VALUE_KEY {
            let value: Primitive = serde_json::from_value(child.clone())
                .map_err(|e| ProjectError::InvalidState(format!("{}: {}", path, e)))?;
            store.set_primitive(path, value);
        } else if key.starts_with('$') || key.is_empty() || key.contains('/') {
            return Err(ProjectError::InvalidState(format!(
                "{}: invalid segment {:?}",
                path, key
            )));
        } else {
            read_node(child, &path.join(key), store)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use patchwork_types::{EntityId, IdPair};

    #[test]
    fn every_kind_round_trips() {
        let store = Store::new()
            .with_set(&StorePath::root(), 1u32)
            .with_set(&StorePath::new("/a/flag"), true)
            .with_set(&StorePath::new("/a/int"), -4i32)
            .with_set(&StorePath::new("/a/float"), 0.25f32)
            .with_set(&StorePath::new("/title"), "song".to_string())
            .with_set(
                &StorePath::new("/seq"),
                vec![Primitive::String("x".into()), Primitive::String("y".into())],
            )
            .with_set(&StorePath::new("/ids"), BTreeSet::from([3u32, 9]))
            .with_set(
                &StorePath::new("/graph"),
                BTreeSet::from([IdPair::new(EntityId::new(1), EntityId::new(2))]),
            )
            .with_set(&StorePath::new("/buffer"), vec![0u8, 255]);
        let text = encode(&store).unwrap();
        assert!(text.contains("\"$value\""));
        let loaded = decode(&text, Path::new("song.pws")).unwrap();
        assert_eq!(loaded, store);
        assert_eq!(loaded.path_of(StorePath::new("/a/int").id()), Some(&StorePath::new("/a/int")));
    }

    #[test]
    fn reserved_segments_are_rejected() {
        let store = Store::new().with_set(&StorePath::new("/$bad"), 1i32);
        assert!(matches!(encode(&store), Err(ProjectError::InvalidState(_))));

        let text = r#"{"format_version":1,"state":{"$oops":{}}}"#;
        assert!(matches!(
            decode(text, Path::new("x.pws")),
            Err(ProjectError::InvalidState(_))
        ));
    }

    #[test]
    fn version_and_shape_are_checked() {
        let source = Path::new("x.pws");
        let text = r#"{"format_version":7,"state":{}}"#;
        assert!(matches!(
            decode(text, source),
            Err(ProjectError::UnsupportedVersion { found: 7, expected: 1 })
        ));
        let text = r#"{"format_version":1,"state":{"x":3}}"#;
        assert!(matches!(decode(text, source), Err(ProjectError::InvalidState(_))));
        assert!(matches!(decode("not json", source), Err(ProjectError::Parse { .. })));
    }
}
