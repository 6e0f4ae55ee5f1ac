//! Structural comparison of pact bodies.
//!
//! Object keys are compared without regard to insertion order. Arrays are
//! compared positionally. Keys present on only one side always count as a
//! difference.

use crate::error::RegistryResult;
use serde::Serialize;
use serde_json::{Map, Number, Value};

/// How a value differs between two documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Present only in the newer document
    Added,
    /// Present only in the older document
    Removed,
    /// Present in both with different values
    Changed,
}

/// A single structural difference, addressed by JSON pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Difference {
    /// JSON pointer to the differing value ("" is the document root)
    pub path: String,
    /// Kind of difference
    pub kind: ChangeKind,
}

/// Decides whether two pact bodies differ in a way that matters.
#[derive(Debug, Clone, Copy, Default)]
pub struct SemanticDiffer;

impl SemanticDiffer {
    /// Return true iff the parsed documents are not deeply equal.
    ///
    /// # Errors
    ///
    /// Returns `MalformedContent` if either side is not valid JSON.
    pub fn differs(self, a: &str, b: &str) -> RegistryResult<bool> {
        let a = parse(a)?;
        let b = parse(b)?;
        Ok(!same_value(&a, &b))
    }

    /// List every difference between `older` and `newer`.
    ///
    /// # Errors
    ///
    /// Returns `MalformedContent` if either side is not valid JSON.
    pub fn diff(self, older: &str, newer: &str) -> RegistryResult<Vec<Difference>> {
        let older = parse(older)?;
        let newer = parse(newer)?;
        let mut out = Vec::new();
        collect(&mut String::new(), &older, &newer, &mut out);
        Ok(out)
    }
}

fn parse(content: &str) -> RegistryResult<Value> {
    Ok(serde_json::from_str(content)?)
}

fn collect(path: &mut String, older: &Value, newer: &Value, out: &mut Vec<Difference>) {
    match (older, newer) {
        (Value::Object(a), Value::Object(b)) => collect_objects(path, a, b, out),
        (Value::Array(a), Value::Array(b)) => {
            for i in 0..a.len().max(b.len()) {
                with_segment(path, &i.to_string(), |path| match (a.get(i), b.get(i)) {
                    (Some(x), Some(y)) => collect(path, x, y, out),
                    (Some(_), None) => out.push(difference(path, ChangeKind::Removed)),
                    (None, Some(_)) => out.push(difference(path, ChangeKind::Added)),
                    (None, None) => {}
                });
            }
        }
        (a, b) if !same_value(a, b) => out.push(difference(path, ChangeKind::Changed)),
        _ => {}
    }
}

/// Deep equality where numbers compare by value, so `200` equals `200.0`.
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => same_number(x, y),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| same_value(x, y))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter().all(|(key, x)| y.get(key).is_some_and(|y| same_value(x, y)))
        }
        _ => a == b,
    }
}

fn same_number(x: &Number, y: &Number) -> bool {
    if x == y {
        return true;
    }
    // Two integers are only equal when their representations match exactly.
    if (x.is_i64() || x.is_u64()) && (y.is_i64() || y.is_u64()) {
        return false;
    }
    matches!((x.as_f64(), y.as_f64()), (Some(x), Some(y)) if x == y)
}

fn collect_objects(
    path: &mut String,
    older: &Map<String, Value>,
    newer: &Map<String, Value>,
    out: &mut Vec<Difference>,
) {
    let mut keys: Vec<&String> = older.keys().chain(newer.keys()).collect();
    keys.sort();
    keys.dedup();

    for key in keys {
        with_segment(path, key, |path| match (older.get(key), newer.get(key)) {
            (Some(x), Some(y)) => collect(path, x, y, out),
            (Some(_), None) => out.push(difference(path, ChangeKind::Removed)),
            (None, Some(_)) => out.push(difference(path, ChangeKind::Added)),
            (None, None) => {}
        });
    }
}

fn with_segment(path: &mut String, segment: &str, f: impl FnOnce(&mut String)) {
    let len = path.len();
    path.push('/');
    path.push_str(&segment.replace('~', "~0").replace('/', "~1"));
    f(path);
    path.truncate(len);
}

fn difference(path: &str, kind: ChangeKind) -> Difference {
    Difference {
        path: path.to_string(),
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;

    #[test]
    fn test_key_order_is_ignored() {
        let a = r#"{"consumer":{"name":"Foo"},"provider":{"name":"Bar"}}"#;
        let b = r#"{ "provider": {"name": "Bar"}, "consumer": {"name": "Foo"} }"#;
        assert!(!SemanticDiffer.differs(a, b).unwrap());
        assert!(SemanticDiffer.diff(a, b).unwrap().is_empty());
    }

    #[test]
    fn test_extra_key_differs() {
        let a = r#"{"interactions":[]}"#;
        let b = r#"{"interactions":[],"metadata":{"pactSpecification":{"version":"2.0.0"}}}"#;
        assert!(SemanticDiffer.differs(a, b).unwrap());
        assert!(SemanticDiffer.differs(b, a).unwrap());
    }

    #[test]
    fn test_numbers_compare_by_value() {
        let a = r#"{"response":{"status":200}}"#;
        let b = r#"{"response":{"status":200.0}}"#;
        assert!(!SemanticDiffer.differs(a, b).unwrap());
        assert!(SemanticDiffer.diff(a, b).unwrap().is_empty());

        assert!(SemanticDiffer.differs(r#"{"status":200}"#, r#"{"status":200.5}"#).unwrap());
        assert!(SemanticDiffer.differs("[-1]", "[1]").unwrap());
        assert!(
            SemanticDiffer
                .differs("9007199254740993", "9007199254740992")
                .unwrap()
        );
    }

    #[test]
    fn test_array_order_matters() {
        assert!(SemanticDiffer.differs("[1,2]", "[2,1]").unwrap());
    }

    #[test]
    fn test_diff_paths() {
        let older = r#"{"a":{"b":1,"c":[1,2]},"x/y":true}"#;
        let newer = r#"{"a":{"b":2,"c":[1],"d":null},"x/y":true}"#;

        let diff = SemanticDiffer.diff(older, newer).unwrap();
        assert_eq!(
            diff,
            vec![
                Difference { path: "/a/b".to_string(), kind: ChangeKind::Changed },
                Difference { path: "/a/c/1".to_string(), kind: ChangeKind::Removed },
                Difference { path: "/a/d".to_string(), kind: ChangeKind::Added },
            ]
        );
    }

    #[test]
    fn test_pointer_escaping() {
        let diff = SemanticDiffer.diff(r#"{"a/b~c":1}"#, r#"{"a/b~c":2}"#).unwrap();
        assert_eq!(diff[0].path, "/a~1b~0c");
    }

    #[test]
    fn test_root_type_change() {
        let diff = SemanticDiffer.diff("{}", "[]").unwrap();
        assert_eq!(diff, vec![Difference { path: String::new(), kind: ChangeKind::Changed }]);
    }

    #[test]
    fn test_malformed_content_is_an_error() {
        let err = SemanticDiffer.differs("{", "{}").unwrap_err();
        assert!(matches!(err, RegistryError::MalformedContent(_)));

        let err = SemanticDiffer.differs("{}", "not json").unwrap_err();
        assert!(matches!(err, RegistryError::MalformedContent(_)));
    }
}
