//! Dotted/indexed paths into JSON documents
//!
//! A path such as `entry[0].resource.name` is parsed once into a sequence of
//! [`Segment`]s and then walked against a [`serde_json::Value`]:
//!
//! ```rust
//! use ferrum_inspect::Path;
//! use serde_json::json;
//!
//! let doc = json!({"name": [{"given": ["Alisher"]}]});
//! let path: Path = "name[0].given[0]".parse().unwrap();
//! assert_eq!(path.resolve(&doc).unwrap().as_str(), Some("Alisher"));
//! ```

use crate::error::{Error, NotFoundReason, Result};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Key of a mapping. Keys containing `.`, `[` or `]` are kept as-is but
    /// are not escaped by `Display`, so such a path does not parse back to
    /// the same segments.
    Field(String),
    /// Position in a sequence.
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name) => f.write_str(name),
            Segment::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// Parsed path into a document. The empty path addresses the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// The root path (no segments).
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse the external `a.b[0].c` syntax.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut segments = Vec::new();
        if raw.is_empty() {
            return Ok(Self { segments });
        }
        for token in raw.split('.') {
            parse_token(raw, token, &mut segments)?;
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// Path of the mapping entry `name` below this path.
    pub fn child_field(&self, name: impl Into<String>) -> Self {
        let mut child = self.clone();
        child.push(Segment::Field(name.into()));
        child
    }

    /// Path of the sequence element `index` below this path.
    pub fn child_index(&self, index: usize) -> Self {
        let mut child = self.clone();
        child.push(Segment::Index(index));
        child
    }

    /// True when `self` equals `other` or is one of its ancestors.
    pub fn is_prefix_of(&self, other: &Path) -> bool {
        other.segments.starts_with(&self.segments)
    }

    /// Walk the path from `document` and return the value it addresses.
    pub fn resolve<'a>(&self, document: &'a Value) -> Result<&'a Value> {
        let mut current = document;
        for segment in &self.segments {
            current = match (segment, current) {
                (Segment::Field(name), Value::Object(map)) => map
                    .get(name)
                    .ok_or_else(|| self.not_found(segment, NotFoundReason::MissingField))?,
                (Segment::Field(_), _) => {
                    return Err(self.not_found(segment, NotFoundReason::ExpectedObject))
                }
                (Segment::Index(index), Value::Array(items)) => {
                    items.get(*index).ok_or_else(|| {
                        self.not_found(
                            segment,
                            NotFoundReason::IndexOutOfRange { len: items.len() },
                        )
                    })?
                }
                (Segment::Index(_), _) => {
                    return Err(self.not_found(segment, NotFoundReason::ExpectedArray))
                }
            };
        }
        Ok(current)
    }

    fn not_found(&self, segment: &Segment, reason: NotFoundReason) -> Error {
        Error::PathNotFound {
            path: self.to_string(),
            segment: segment.to_string(),
            reason,
        }
    }
}

/// Parse `path` and resolve it against `document`.
pub fn resolve<'a>(document: &'a Value, path: &str) -> Result<&'a Value> {
    Path::parse(path)?.resolve(document)
}

impl FromStr for Path {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Path::parse(s)
    }
}

impl From<Vec<Segment>> for Path {
    fn from(segments: Vec<Segment>) -> Self {
        Self { segments }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 && matches!(segment, Segment::Field(_)) {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// Parse one dot-separated token, peeling trailing `[n]` suffixes.
fn parse_token(raw: &str, token: &str, out: &mut Vec<Segment>) -> Result<()> {
    let invalid = |message: String| Error::InvalidPath {
        path: raw.to_string(),
        message,
    };

    if token.is_empty() {
        return Err(invalid("empty segment".to_string()));
    }

    let Some(stripped) = token.strip_suffix(']') else {
        if token.contains('[') || token.contains(']') {
            return Err(invalid(format!("unbalanced brackets in `{token}`")));
        }
        out.push(Segment::Field(token.to_string()));
        return Ok(());
    };

    let open = stripped
        .rfind('[')
        .ok_or_else(|| invalid(format!("unbalanced brackets in `{token}`")))?;
    let digits = &stripped[open + 1..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(format!("`{digits}` is not a sequence index")));
    }
    // All digits, so parsing only fails on overflow; such an index is out
    // of range for any sequence rather than malformed.
    let index = digits.parse::<usize>().unwrap_or(usize::MAX);

    let prefix = &stripped[..open];
    if !prefix.is_empty() {
        parse_token(raw, prefix, out)?;
    }
    out.push(Segment::Index(index));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(name: &str) -> Segment {
        Segment::Field(name.to_string())
    }

    #[test]
    fn test_parse_dotted_and_indexed() {
        let path = Path::parse("entry[0].resource.name").unwrap();
        assert_eq!(
            path.segments(),
            &[
                field("entry"),
                Segment::Index(0),
                field("resource"),
                field("name")
            ]
        );
    }

    #[test]
    fn test_parse_repeated_index_suffix() {
        let path = Path::parse("matrix[1][2]").unwrap();
        assert_eq!(
            path.segments(),
            &[field("matrix"), Segment::Index(1), Segment::Index(2)]
        );
    }

    #[test]
    fn test_parse_empty_is_root() {
        assert!(Path::parse("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed_tokens() {
        for raw in ["a..b", "a.", "name[x]", "name[]", "name[0", "name]0", "a[0]b", "a[+1]"] {
            let err = Path::parse(raw).unwrap_err();
            assert!(
                matches!(err, Error::InvalidPath { .. }),
                "expected InvalidPath for {raw:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_display_round_trips() {
        for raw in ["entry[0].resource.name", "a", "[3].b", "m[1][2].x", ""] {
            assert_eq!(Path::parse(raw).unwrap().to_string(), raw);
        }
    }

    #[test]
    fn test_resolve_nested_value() {
        let doc = json!({"name": [{"given": ["Alisher"]}]});
        assert_eq!(resolve(&doc, "name[0].given[0]").unwrap(), &json!("Alisher"));
    }

    #[test]
    fn test_resolve_root() {
        let doc = json!({"x": 1});
        assert_eq!(resolve(&doc, "").unwrap(), &doc);
    }

    #[test]
    fn test_resolve_missing_field_names_segment() {
        let doc = json!({"x": 1});
        let err = resolve(&doc, "y").unwrap_err();
        assert_eq!(
            err,
            Error::PathNotFound {
                path: "y".to_string(),
                segment: "y".to_string(),
                reason: NotFoundReason::MissingField,
            }
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn test_resolve_index_out_of_range() {
        let doc = json!({"entry": []});
        let err = resolve(&doc, "entry[0]").unwrap_err();
        assert_eq!(
            err,
            Error::PathNotFound {
                path: "entry[0]".to_string(),
                segment: "[0]".to_string(),
                reason: NotFoundReason::IndexOutOfRange { len: 0 },
            }
        );
    }

    #[test]
    fn test_resolve_overflowing_index_is_not_found() {
        let doc = json!({"entry": []});
        let err = resolve(&doc, "entry[18446744073709551616]").unwrap_err();
        assert!(err.is_not_found(), "got {err:?}");
        assert!(matches!(
            err,
            Error::PathNotFound {
                reason: NotFoundReason::IndexOutOfRange { len: 0 },
                ..
            }
        ));
    }

    #[test]
    fn test_display_does_not_escape_field_separators() {
        let path = Path::root().child_field("a.b");
        assert_eq!(path.to_string(), "a.b");
        assert_eq!(Path::parse("a.b").unwrap().len(), 2);
    }

    #[test]
    fn test_resolve_kind_mismatch() {
        let doc = json!({"name": "plain", "list": [1, 2]});

        let err = resolve(&doc, "name[0]").unwrap_err();
        assert!(matches!(
            err,
            Error::PathNotFound {
                reason: NotFoundReason::ExpectedArray,
                ..
            }
        ));

        let err = resolve(&doc, "list.first").unwrap_err();
        assert!(matches!(
            err,
            Error::PathNotFound {
                reason: NotFoundReason::ExpectedObject,
                ..
            }
        ));
    }

    #[test]
    fn test_prefix_relation() {
        let parent = Path::parse("a").unwrap();
        let child = Path::parse("a.b").unwrap();
        let indexed = Path::parse("a[0]").unwrap();
        assert!(parent.is_prefix_of(&child));
        assert!(parent.is_prefix_of(&indexed));
        assert!(parent.is_prefix_of(&parent));
        assert!(!child.is_prefix_of(&parent));
        assert!(!Path::parse("ab").unwrap().is_prefix_of(&child));
    }

    #[test]
    fn test_child_builders() {
        let path = Path::root().child_field("entry").child_index(2);
        assert_eq!(path.to_string(), "entry[2]");
    }
}
