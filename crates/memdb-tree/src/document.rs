use serde_json::{Map, Value};

use crate::error::{Result, TreeError};
use crate::path::KeyPath;

/// The in-memory document: a root mapping plus the flush revision.
///
/// Mutations come in pairs: `check_*` validates without touching the tree,
/// the mutating call applies. The mutating calls re-run the check first, so
/// they are safe to use on their own.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    revision: u64,
    root: Map<String, Value>,
}

impl Document {
    /// Empty document at revision 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a document from a loaded snapshot.
    pub fn from_parts(revision: u64, root: Map<String, Value>) -> Self {
        Self { revision, root }
    }

    /// Number of successful flushes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Set the revision. Only the journal should call this.
    pub fn set_revision(&mut self, revision: u64) {
        self.revision = revision;
    }

    /// Borrow the root mapping.
    pub fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    /// Owned deep copy of the root mapping.
    pub fn to_map(&self) -> Map<String, Value> {
        self.root.clone()
    }

    /// Returns `true` if there are no top-level keys.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    // ---- Reads ----

    /// Resolve `path` to the stored value.
    pub fn get(&self, path: &KeyPath) -> Result<&Value> {
        let (last, parents) = path.split_last();
        let parent = self.parent(path, parents)?;
        parent
            .get(last)
            .ok_or_else(|| TreeError::not_found(path.as_str()))
    }

    /// Returns `true` if `path` resolves to a stored value.
    pub fn contains(&self, path: &KeyPath) -> bool {
        self.get(path).is_ok()
    }

    // ---- Writes ----

    /// Validate a put without mutating.
    ///
    /// Walks the intermediate segments. Strict mode fails on the first one
    /// that is not a mapping. Loose mode always succeeds: from that segment
    /// down, everything gets replaced by fresh mappings.
    pub fn check_put(&self, path: &KeyPath, loose: bool) -> Result<()> {
        if loose {
            return Ok(());
        }
        let (_, parents) = path.split_last();
        let mut node = &self.root;
        for segment in parents {
            match node.get(segment) {
                Some(Value::Object(child)) => node = child,
                _ => return Err(TreeError::not_found(path.as_str())),
            }
        }
        Ok(())
    }

    /// Assign `value` at `path`, overwriting whatever was there.
    ///
    /// In loose mode an intermediate that is absent or holds a non-mapping
    /// value (including `null`) becomes an empty mapping.
    pub fn put(&mut self, path: &KeyPath, value: Value, loose: bool) -> Result<()> {
        self.check_put(path, loose)?;

        let (last, parents) = path.split_last();
        let mut node = &mut self.root;
        for segment in parents {
            let child = node
                .entry(segment.as_str())
                .or_insert_with(|| Value::Object(Map::new()));
            if loose && !child.is_object() {
                *child = Value::Object(Map::new());
            }
            node = match child {
                Value::Object(child) => child,
                _ => return Err(TreeError::not_found(path.as_str())),
            };
        }
        node.insert(last.to_string(), value);
        Ok(())
    }

    /// Validate a delete without mutating.
    pub fn check_delete(&self, path: &KeyPath) -> Result<()> {
        self.get(path).map(|_| ())
    }

    /// Remove the value at `path` and return it.
    pub fn delete(&mut self, path: &KeyPath) -> Result<Value> {
        let (last, parents) = path.split_last();
        let mut node = &mut self.root;
        for segment in parents {
            node = match node.get_mut(segment.as_str()) {
                Some(Value::Object(child)) => child,
                _ => return Err(TreeError::not_found(path.as_str())),
            };
        }
        node.remove(last)
            .ok_or_else(|| TreeError::not_found(path.as_str()))
    }

    fn parent(&self, path: &KeyPath, parents: &[String]) -> Result<&Map<String, Value>> {
        let mut node = &self.root;
        for segment in parents {
            node = match node.get(segment.as_str()) {
                Some(Value::Object(child)) => child,
                _ => return Err(TreeError::not_found(path.as_str())),
            };
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn key(s: &str) -> KeyPath {
        KeyPath::parse(s).unwrap()
    }

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => Document::from_parts(0, map),
            other => panic!("fixture must be an object, got {other}"),
        }
    }

    #[test]
    fn put_top_level() {
        let mut d = Document::new();
        d.put(&key("name"), json!("Alex Soumaoro"), false).unwrap();
        assert_eq!(Value::Object(d.to_map()), json!({"name": "Alex Soumaoro"}));
    }

    #[test]
    fn single_segment_ignores_mode() {
        let mut d = Document::new();
        d.put(&key("a"), json!(1), false).unwrap();
        d.put(&key("a"), json!(2), true).unwrap();
        assert_eq!(d.get(&key("a")).unwrap(), &json!(2));
    }

    #[test]
    fn loose_put_creates_intermediates() {
        let mut d = Document::new();
        d.put(
            &key("family.me.members"),
            json!([{"name": "Alex Soumaoro"}]),
            true,
        )
        .unwrap();
        d.put(&key("family.name"), json!("Soumaoro"), false).unwrap();
        assert_eq!(
            Value::Object(d.to_map()),
            json!({"family": {"me": {"members": [{"name": "Alex Soumaoro"}]}, "name": "Soumaoro"}})
        );
    }

    #[test]
    fn strict_put_missing_intermediate_leaves_tree_unchanged() {
        let mut d = doc(json!({"family": {"name": "Soumaoro"}}));
        let before = d.clone();
        let err = d
            .put(&key("family.me.members"), json!([]), false)
            .unwrap_err();
        assert_eq!(
            err,
            TreeError::KeyNotFound {
                key: "family.me.members".into()
            }
        );
        assert_eq!(d, before);
    }

    #[test]
    fn strict_put_through_scalar_fails() {
        let mut d = doc(json!({"a": 5, "nil": null}));
        let before = d.clone();
        assert!(d.put(&key("a.b"), json!(1), false).is_err());
        assert!(d.put(&key("nil.b"), json!(1), false).is_err());
        assert_eq!(d, before);
    }

    #[test]
    fn loose_put_replaces_non_mapping_intermediates() {
        let mut d = doc(json!({"a": null, "n": 5, "s": "text", "l": [1], "keep": {"x": 1}}));
        d.put(&key("a.b"), json!(1), true).unwrap();
        d.put(&key("n.b"), json!(2), true).unwrap();
        d.put(&key("s.deep.c"), json!(3), true).unwrap();
        d.put(&key("l.b"), json!(4), true).unwrap();
        d.put(&key("keep.y"), json!(5), true).unwrap();
        assert_eq!(
            Value::Object(d.to_map()),
            json!({
                "a": {"b": 1},
                "n": {"b": 2},
                "s": {"deep": {"c": 3}},
                "l": {"b": 4},
                "keep": {"x": 1, "y": 5}
            })
        );
    }

    #[test]
    fn put_overwrites_subtree() {
        let mut d = doc(json!({"a": {"b": {"c": 1}}}));
        d.put(&key("a.b"), json!("flat"), false).unwrap();
        assert_eq!(Value::Object(d.to_map()), json!({"a": {"b": "flat"}}));
    }

    #[test]
    fn falsy_values_are_found() {
        let d = doc(json!({"zero": 0, "empty": "", "no": false, "nil": null}));
        assert_eq!(d.get(&key("zero")).unwrap(), &json!(0));
        assert_eq!(d.get(&key("empty")).unwrap(), &json!(""));
        assert_eq!(d.get(&key("no")).unwrap(), &json!(false));
        assert_eq!(d.get(&key("nil")).unwrap(), &Value::Null);
    }

    #[test]
    fn get_nested_and_subtree() {
        let d = doc(json!({"server": {"port": 3000, "tls": {"on": true}}}));
        assert_eq!(d.get(&key("server.port")).unwrap(), &json!(3000));
        assert_eq!(d.get(&key("server.tls")).unwrap(), &json!({"on": true}));
    }

    #[test]
    fn get_missing() {
        let d = doc(json!({"server": {"port": 3000}}));
        assert!(matches!(
            d.get(&key("server.host")),
            Err(TreeError::KeyNotFound { .. })
        ));
        assert!(d.get(&key("client.port")).is_err());
        assert!(d.get(&key("server.port.number")).is_err());
    }

    #[test]
    fn get_does_not_index_into_sequences() {
        let d = doc(json!({"list": [10, 20]}));
        assert!(d.get(&key("list.0")).is_err());
    }

    #[test]
    fn delete_leaf_keeps_parent() {
        let mut d = doc(json!({"server": {"port": 3000}}));
        let removed = d.delete(&key("server.port")).unwrap();
        assert_eq!(removed, json!(3000));
        assert_eq!(d.get(&key("server")).unwrap(), &json!({}));
        assert!(d.get(&key("server.port")).is_err());
    }

    #[test]
    fn delete_missing_fails() {
        let mut d = doc(json!({"a": {"b": 1}}));
        let before = d.clone();
        assert!(d.delete(&key("a.c")).is_err());
        assert!(d.delete(&key("x.b")).is_err());
        assert!(d.delete(&key("a.b.c")).is_err());
        assert_eq!(d, before);
    }

    #[test]
    fn delete_null_value_succeeds() {
        let mut d = doc(json!({"nil": null}));
        assert_eq!(d.delete(&key("nil")).unwrap(), Value::Null);
        assert!(d.is_empty());
    }

    #[test]
    fn check_calls_do_not_mutate() {
        let d = Document::new();
        assert!(d.check_put(&key("a.b.c"), true).is_ok());
        assert!(d.check_put(&key("a.b.c"), false).is_err());
        assert!(d.check_delete(&key("a")).is_err());
        assert!(d.is_empty());
    }

    #[test]
    fn to_map_is_independent() {
        let d = doc(json!({"a": {"b": 1}}));
        let mut copy = d.to_map();
        copy.insert("c".into(), json!(2));
        assert!(!d.contains(&key("c")));
    }

    proptest! {
        #[test]
        fn loose_put_then_get_roundtrips(
            segments in prop::collection::vec("[a-z_][a-z0-9_]{0,6}", 1..5),
            n in any::<i64>(),
            s in ".{0,12}",
        ) {
            let path = KeyPath::parse(&segments.join(".")).unwrap();
            let value = json!({"n": n, "s": s});
            let mut d = Document::new();
            d.put(&path, value.clone(), true).unwrap();
            prop_assert_eq!(d.get(&path).unwrap(), &value);
        }
    }
}
