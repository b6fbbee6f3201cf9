//! Declarative document schemas.
//!
//! A [`Schema`] lists the text paths a model accepts, which of them are
//! required on creation, and which are hidden from default reads. Casting a
//! payload through the schema is strict: undeclared paths are dropped.

use serde_json::{Map, Value};

use crate::document::{get_path, set_path, Document};
use crate::error::{DomainError, DomainResult};

/// Declaration of a single text path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub path: &'static str,
    /// Must be present and non-empty on creation
    pub required: bool,
    /// Returned by default reads
    pub selected: bool,
}

impl FieldSpec {
    /// Optional, selected text path
    pub const fn text(path: &'static str) -> Self {
        Self {
            path,
            required: false,
            selected: true,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Exclude the path from default reads
    pub const fn hidden(mut self) -> Self {
        self.selected = false;
        self
    }
}

/// Named set of field declarations.
#[derive(Debug)]
pub struct Schema {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

impl Schema {
    /// Find the declaration for an exact path
    pub fn field(&self, path: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.path == path)
    }

    /// Paths excluded from default reads
    pub fn hidden_paths(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| !f.selected)
            .map(|f| f.path)
            .collect()
    }

    /// Whether `path` is a nested record containing declared paths.
    fn is_nested(&self, path: &str) -> bool {
        self.fields.iter().any(|f| {
            f.path
                .strip_prefix(path)
                .is_some_and(|rest| rest.starts_with('.'))
        })
    }

    /// Cast a creation payload and enforce required paths.
    pub fn cast_new(&self, input: Document) -> DomainResult<Document> {
        let mut out = Document::new();
        self.cast_into(None, input, &mut out)?;

        let missing: Vec<String> = self
            .fields
            .iter()
            .filter(|f| f.required && !is_present(get_path(&out, f.path)))
            .map(|f| format!("{} is required", f.path))
            .collect();

        if !missing.is_empty() {
            return Err(DomainError::validation(format!(
                "{} validation failed: {}",
                self.name,
                missing.join(", ")
            )));
        }

        Ok(out)
    }

    /// Cast an update payload into path assignments.
    ///
    /// Keys of the result are paths: a dotted key sets one nested value, a
    /// nested record key replaces the whole record. Required paths are not
    /// checked.
    pub fn cast_update(&self, input: Document) -> DomainResult<Document> {
        let mut out = Document::new();
        for (key, value) in input {
            if self.field(&key).is_some() {
                let cast = cast_text(&key, value)?;
                out.insert(key, cast);
            } else if self.is_nested(&key) {
                match value {
                    Value::Object(inner) => {
                        let mut record = Document::new();
                        self.cast_into(Some(&key), inner, &mut record)?;
                        // cast_into writes full paths; keep only the record itself
                        let record = record
                            .remove(&key)
                            .unwrap_or_else(|| Value::Object(Map::new()));
                        out.insert(key, record);
                    }
                    Value::Null => {
                        out.insert(key, Value::Null);
                    }
                    _ => return Err(DomainError::cast(key)),
                }
            } else {
                tracing::debug!(model = self.name, path = %key, "dropping undeclared path");
            }
        }

        if let Some((outer, inner)) = conflicting_paths(&out) {
            return Err(DomainError::validation(format!(
                "Updating the path '{}' would create a conflict at '{}'",
                inner, outer
            )));
        }

        Ok(out)
    }

    fn cast_into(&self, prefix: Option<&str>, input: Document, out: &mut Document) -> DomainResult<()> {
        for (key, value) in input {
            let path = match prefix {
                Some(p) => format!("{}.{}", p, key),
                None => key,
            };

            if self.field(&path).is_some() {
                let cast = cast_text(&path, value)?;
                set_path(out, &path, cast);
            } else if self.is_nested(&path) {
                match value {
                    Value::Object(inner) => {
                        // Materialize the record even when every inner path is dropped
                        if get_path(out, &path).is_none() {
                            set_path(out, &path, Value::Object(Map::new()));
                        }
                        self.cast_into(Some(&path), inner, out)?;
                    }
                    Value::Null => set_path(out, &path, Value::Null),
                    _ => return Err(DomainError::cast(path)),
                }
            } else {
                tracing::debug!(model = self.name, path = %path, "dropping undeclared path");
            }
        }
        Ok(())
    }
}

/// First pair of assignments where one path contains the other.
fn conflicting_paths(update: &Document) -> Option<(&str, &str)> {
    update.keys().find_map(|outer| {
        update
            .keys()
            .find(|inner| {
                inner
                    .strip_prefix(outer.as_str())
                    .is_some_and(|rest| rest.starts_with('.'))
            })
            .map(|inner| (outer.as_str(), inner.as_str()))
    })
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    }
}

fn cast_text(path: &str, value: Value) -> DomainResult<Value> {
    match value {
        Value::String(_) | Value::Null => Ok(value),
        Value::Number(n) => Ok(Value::String(n.to_string())),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        Value::Array(_) | Value::Object(_) => Err(DomainError::cast(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    static SCHEMA: Schema = Schema {
        name: "Thing",
        fields: &[
            FieldSpec::text("title").required(),
            FieldSpec::text("meta.secret").hidden(),
            FieldSpec::text("meta.note"),
        ],
    };

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_cast_new_drops_undeclared_paths() {
        let out = SCHEMA
            .cast_new(doc(json!({ "title": "a", "extra": 1, "meta": { "note": "n", "junk": true } })))
            .unwrap();
        assert_eq!(out, doc(json!({ "title": "a", "meta": { "note": "n" } })));
    }

    #[test]
    fn test_cast_new_casts_scalars_to_text() {
        let out = SCHEMA.cast_new(doc(json!({ "title": 42, "meta.note": false }))).unwrap();
        assert_eq!(out, doc(json!({ "title": "42", "meta": { "note": "false" } })));
    }

    #[test]
    fn test_cast_new_rejects_missing_and_empty_required() {
        let err = SCHEMA.cast_new(doc(json!({ "meta": { "note": "n" } }))).unwrap_err();
        assert_eq!(err, DomainError::validation("Thing validation failed: title is required"));

        let err = SCHEMA.cast_new(doc(json!({ "title": "" }))).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn test_cast_rejects_object_at_text_path() {
        let err = SCHEMA.cast_new(doc(json!({ "title": { "nested": 1 } }))).unwrap_err();
        assert_eq!(err, DomainError::cast("title"));
    }

    #[test]
    fn test_cast_update_keeps_paths_and_replaces_records() {
        let out = SCHEMA
            .cast_update(doc(json!({
                "title": 7,
                "meta": { "secret": "s", "junk": 1 },
                "unknown": "dropped"
            })))
            .unwrap();
        assert_eq!(out, doc(json!({ "title": "7", "meta": { "secret": "s" } })));
    }

    #[test]
    fn test_cast_update_rejects_overlapping_paths() {
        let err = SCHEMA
            .cast_update(doc(json!({ "meta": { "note": "a" }, "meta.note": "b" })))
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::validation("Updating the path 'meta.note' would create a conflict at 'meta'")
        );
    }

    #[test]
    fn test_cast_update_allows_sibling_paths() {
        let out = SCHEMA
            .cast_update(doc(json!({ "meta.note": "a", "meta.secret": "b" })))
            .unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_cast_update_skips_required_check() {
        let out = SCHEMA.cast_update(doc(json!({ "meta.note": "only" }))).unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_hidden_paths() {
        assert_eq!(SCHEMA.hidden_paths(), vec!["meta.secret"]);
    }
}
