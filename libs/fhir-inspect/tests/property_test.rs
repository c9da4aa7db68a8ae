//! Property-based tests using QuickCheck

use ferrum_inspect::{render_with, Error, HighlightSet, Marker, Path, Plain, TokenKind};
use quickcheck::{Arbitrary, Gen, QuickCheck};
use serde_json::{Map, Value};

/// Small random JSON document. Keys never contain `.` or `[` so every node
/// is addressable through the path syntax.
#[derive(Debug, Clone)]
struct Doc(Value);

impl Arbitrary for Doc {
    fn arbitrary(g: &mut Gen) -> Self {
        Doc(gen_value(g, 3))
    }
}

fn gen_value(g: &mut Gen, depth: usize) -> Value {
    let kinds = if depth == 0 { 5 } else { 7 };
    match u8::arbitrary(g) % kinds {
        0 => Value::Null,
        1 => Value::Bool(bool::arbitrary(g)),
        2 => Value::from(i64::arbitrary(g)),
        3 => Value::from(f64::from(i32::arbitrary(g)) / 4.0),
        4 => Value::String(String::arbitrary(g)),
        5 => {
            let len = usize::arbitrary(g) % 4;
            Value::Array((0..len).map(|_| gen_value(g, depth - 1)).collect())
        }
        _ => {
            let len = usize::arbitrary(g) % 4;
            let mut map = Map::new();
            for i in 0..len {
                map.insert(format!("k{i}_{}", u8::arbitrary(g)), gen_value(g, depth - 1));
            }
            Value::Object(map)
        }
    }
}

fn collect_paths(value: &Value, path: Path, out: &mut Vec<(Path, Value)>) {
    out.push((path.clone(), value.clone()));
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                collect_paths(child, path.child_field(key.as_str()), out);
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                collect_paths(item, path.child_index(i), out);
            }
        }
        _ => {}
    }
}

/// Marker whose delimiters can never appear in rendered JSON text
/// (control characters are always escaped).
struct Sentinel;

impl Marker for Sentinel {
    fn emphasize(&self, _kind: TokenKind, token: &str) -> String {
        format!("\u{1}{token}\u{2}")
    }
}

fn strip_sentinels(text: &str) -> String {
    text.chars().filter(|c| *c != '\u{1}' && *c != '\u{2}').collect()
}

/// Property: every node of a document is reachable by its own path
#[test]
fn prop_every_node_resolves() {
    fn property(doc: Doc) -> bool {
        let mut paths = Vec::new();
        collect_paths(&doc.0, Path::root(), &mut paths);
        paths.iter().all(|(path, expected)| {
            let reparsed: Path = path.to_string().parse().unwrap();
            reparsed == *path && path.resolve(&doc.0).ok() == Some(expected)
        })
    }
    QuickCheck::new()
        .tests(200)
        .quickcheck(property as fn(Doc) -> bool);
}

/// Property: stepping past the end of any container fails with PathNotFound
#[test]
fn prop_out_of_range_fails() {
    fn property(doc: Doc) -> bool {
        let mut paths = Vec::new();
        collect_paths(&doc.0, Path::root(), &mut paths);
        paths.iter().all(|(path, value)| {
            let beyond = match value {
                Value::Array(items) => path.child_index(items.len()),
                _ => path.child_field("missing"),
            };
            matches!(beyond.resolve(&doc.0), Err(Error::PathNotFound { .. }))
        })
    }
    QuickCheck::new()
        .tests(200)
        .quickcheck(property as fn(Doc) -> bool);
}

/// Property: emphasis changes markup only, never structure
#[test]
fn prop_emphasis_only_adds_markup() {
    fn property(doc: Doc, pick: usize) -> bool {
        let mut paths = Vec::new();
        collect_paths(&doc.0, Path::root(), &mut paths);
        let (chosen, _) = &paths[pick % paths.len()];
        let highlights: HighlightSet = std::iter::once(chosen.clone()).collect();

        let plain = render_with(&doc.0, &HighlightSet::empty(), &Plain);
        let marked = render_with(&doc.0, &highlights, &Sentinel);
        strip_sentinels(&marked) == plain
    }
    QuickCheck::new()
        .tests(200)
        .quickcheck(property as fn(Doc, usize) -> bool);
}

/// Property: rendering is deterministic
#[test]
fn prop_render_is_idempotent() {
    fn property(doc: Doc) -> bool {
        let highlights = HighlightSet::parse(["k0_0", "k1_1[0]"]).unwrap();
        render_with(&doc.0, &highlights, &Sentinel) == render_with(&doc.0, &highlights, &Sentinel)
    }
    QuickCheck::new()
        .tests(100)
        .quickcheck(property as fn(Doc) -> bool);
}

/// Property: plain rendering is exactly serde_json's pretty printer
#[test]
fn prop_plain_render_matches_pretty_printer() {
    fn property(doc: Doc) -> bool {
        serde_json::to_string_pretty(&doc.0).ok()
            == Some(render_with(&doc.0, &HighlightSet::empty(), &Plain))
    }
    QuickCheck::new()
        .tests(200)
        .quickcheck(property as fn(Doc) -> bool);
}
