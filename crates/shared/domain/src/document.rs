//! Schemaless documents and dotted-path access.
//!
//! A path such as `authentication.sessionToken` addresses a value nested
//! inside object fields. Only objects are traversed; arrays are leaves.

use serde_json::{Map, Value};

/// A stored record: a JSON object keyed by field name.
pub type Document = Map<String, Value>;

/// Look up the value at a dotted path.
pub fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = doc.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Set the value at a dotted path, creating intermediate objects.
///
/// A non-object value in the middle of the path is replaced by an object.
pub fn set_path(doc: &mut Document, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            doc.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = doc
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(inner) = entry {
                set_path(inner, rest, value);
            }
        }
    }
}

/// Remove the value at a dotted path, returning it if present.
pub fn remove_path(doc: &mut Document, path: &str) -> Option<Value> {
    match path.split_once('.') {
        None => doc.remove(path),
        Some((head, rest)) => match doc.get_mut(head) {
            Some(Value::Object(inner)) => remove_path(inner, rest),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_get_nested_path() {
        let d = doc(json!({ "authentication": { "sessionToken": "abc" } }));
        assert_eq!(get_path(&d, "authentication.sessionToken"), Some(&json!("abc")));
        assert_eq!(get_path(&d, "authentication.salt"), None);
        assert_eq!(get_path(&d, "authentication.sessionToken.deeper"), None);
    }

    #[test]
    fn test_set_path_creates_intermediate_objects() {
        let mut d = Document::new();
        set_path(&mut d, "authentication.password", json!("secret"));
        assert_eq!(d, doc(json!({ "authentication": { "password": "secret" } })));
    }

    #[test]
    fn test_set_path_replaces_scalar_parent() {
        let mut d = doc(json!({ "authentication": "oops" }));
        set_path(&mut d, "authentication.salt", json!("s"));
        assert_eq!(get_path(&d, "authentication.salt"), Some(&json!("s")));
    }

    #[test]
    fn test_remove_path_keeps_siblings() {
        let mut d = doc(json!({ "authentication": { "password": "p", "salt": "s" } }));
        assert_eq!(remove_path(&mut d, "authentication.password"), Some(json!("p")));
        assert_eq!(remove_path(&mut d, "authentication.password"), None);
        assert_eq!(d, doc(json!({ "authentication": { "salt": "s" } })));
    }
}
