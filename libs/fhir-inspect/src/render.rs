//! Pretty-printing JSON with selected paths emphasised
//!
//! The layout is the one of `serde_json::to_string_pretty` (two spaces per
//! level, empty containers inline). Emphasis is delegated to a [`Marker`], so
//! the same traversal serves terminals ([`Ansi`]), logs and files ([`Plain`],
//! [`Annotate`]).

use crate::error::{Error, Result};
use crate::path::{Path, Segment};
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;

/// Kind of token handed to a [`Marker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Key,
    String,
    Bool,
    Number,
    Null,
}

/// Wraps an emphasised token in output-specific markup.
pub trait Marker {
    /// `token` is already formatted (quoted for keys and strings).
    fn emphasize(&self, kind: TokenKind, token: &str) -> String;
}

/// No markup at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct Plain;

impl Marker for Plain {
    fn emphasize(&self, _kind: TokenKind, token: &str) -> String {
        token.to_string()
    }
}

/// ANSI colours for terminal output.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ansi;

impl Marker for Ansi {
    fn emphasize(&self, kind: TokenKind, token: &str) -> String {
        match kind {
            TokenKind::Key => token.cyan(),
            TokenKind::String => token.green(),
            TokenKind::Bool => token.yellow(),
            TokenKind::Number => token.magenta(),
            TokenKind::Null => token.blue(),
        }
        .to_string()
    }
}

/// Inline `«token»` annotation for output that cannot carry colour.
#[derive(Debug, Clone, Copy, Default)]
pub struct Annotate;

impl Annotate {
    pub const OPEN: char = '«';
    pub const CLOSE: char = '»';
}

impl Marker for Annotate {
    fn emphasize(&self, _kind: TokenKind, token: &str) -> String {
        format!("{}{token}{}", Self::OPEN, Self::CLOSE)
    }
}

/// Paths to emphasise.
///
/// A node matches when its path equals a member, lies below a member, or lies
/// above a member. Comparison is per segment, so `name` covers `name[0].given`
/// but not `names`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightSet {
    paths: Vec<Path>,
}

impl HighlightSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse every entry with [`Path::parse`].
    pub fn parse<I, S>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::empty();
        for path in paths {
            set.insert(Path::parse(path.as_ref())?);
        }
        Ok(set)
    }

    pub fn insert(&mut self, path: Path) {
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn matches(&self, path: &Path) -> bool {
        self.matches_segments(path.segments())
    }

    pub(crate) fn matches_segments(&self, segments: &[Segment]) -> bool {
        self.paths.iter().any(|member| {
            let member = member.segments();
            member.starts_with(segments) || segments.starts_with(member)
        })
    }
}

impl FromIterator<Path> for HighlightSet {
    fn from_iter<T: IntoIterator<Item = Path>>(iter: T) -> Self {
        let mut set = Self::empty();
        for path in iter {
            set.insert(path);
        }
        set
    }
}

/// Render `document` with ANSI emphasis on the highlighted paths.
pub fn render(document: &Value, highlights: &HighlightSet) -> String {
    render_with(document, highlights, &Ansi)
}

/// Render `document`, emphasising highlighted nodes through `marker`.
pub fn render_with(document: &Value, highlights: &HighlightSet, marker: &dyn Marker) -> String {
    let mut renderer = Renderer {
        highlights,
        marker,
        path: Vec::new(),
        out: String::new(),
    };
    renderer.value(document, 0);
    renderer.out
}

/// Serialise `value` into a document first, then render it.
///
/// Fails with [`Error::UnsupportedValueKind`] when `value` has no JSON
/// representation (for instance a map keyed by tuples).
pub fn to_highlighted_string<T>(
    value: &T,
    highlights: &HighlightSet,
    marker: &dyn Marker,
) -> Result<String>
where
    T: Serialize + ?Sized,
{
    let document =
        serde_json::to_value(value).map_err(|e| Error::UnsupportedValueKind(e.to_string()))?;
    Ok(render_with(&document, highlights, marker))
}

struct Renderer<'a> {
    highlights: &'a HighlightSet,
    marker: &'a dyn Marker,
    path: Vec<Segment>,
    out: String,
}

impl Renderer<'_> {
    fn value(&mut self, value: &Value, indent: usize) {
        match value {
            Value::Object(map) if map.is_empty() => self.out.push_str("{}"),
            Value::Object(map) => {
                self.out.push_str("{\n");
                let last = map.len() - 1;
                for (i, (key, child)) in map.iter().enumerate() {
                    self.path.push(Segment::Field(key.clone()));
                    self.indent(indent + 1);
                    self.token(TokenKind::Key, &quote(key));
                    self.out.push_str(": ");
                    self.value(child, indent + 1);
                    self.path.pop();
                    if i < last {
                        self.out.push(',');
                    }
                    self.out.push('\n');
                }
                self.indent(indent);
                self.out.push('}');
            }
            Value::Array(items) if items.is_empty() => self.out.push_str("[]"),
            Value::Array(items) => {
                self.out.push_str("[\n");
                let last = items.len() - 1;
                for (i, item) in items.iter().enumerate() {
                    self.path.push(Segment::Index(i));
                    self.indent(indent + 1);
                    self.value(item, indent + 1);
                    self.path.pop();
                    if i < last {
                        self.out.push(',');
                    }
                    self.out.push('\n');
                }
                self.indent(indent);
                self.out.push(']');
            }
            Value::String(s) => self.token(TokenKind::String, &quote(s)),
            Value::Bool(b) => self.token(TokenKind::Bool, if *b { "true" } else { "false" }),
            Value::Number(n) => self.token(TokenKind::Number, &n.to_string()),
            Value::Null => self.token(TokenKind::Null, "null"),
        }
    }

    fn token(&mut self, kind: TokenKind, text: &str) {
        if self.highlights.matches_segments(&self.path) {
            let marked = self.marker.emphasize(kind, text);
            self.out.push_str(&marked);
        } else {
            self.out.push_str(text);
        }
    }

    fn indent(&mut self, level: usize) {
        for _ in 0..level {
            self.out.push_str("  ");
        }
    }
}

fn quote(s: &str) -> String {
    Value::from(s).to_string()
}
