//! Path-addressed inspection of JSON documents
//!
//! Two operations over a decoded JSON document (typically a FHIR response
//! body):
//!
//! - [`resolve`]: walk a dotted/indexed path such as `entry[0].resource.name`
//!   to the value it addresses, failing with [`Error::PathNotFound`] when the
//!   document has no such node.
//! - [`render`]: pretty-print the document with a set of paths emphasised.
//!   A node is emphasised when its path equals, lies below, or lies above a
//!   highlighted path.
//!
//! # Example
//!
//! ```rust
//! use ferrum_inspect::{render_with, resolve, Annotate, HighlightSet};
//! use serde_json::json;
//!
//! let bundle = json!({
//!     "resourceType": "Bundle",
//!     "entry": [{"resource": {"resourceType": "Patient", "gender": "male"}}]
//! });
//!
//! assert_eq!(resolve(&bundle, "entry[0].resource.gender").unwrap().as_str(), Some("male"));
//!
//! let highlights = HighlightSet::parse(["entry[0].resource.gender"]).unwrap();
//! let text = render_with(&bundle, &highlights, &Annotate);
//! assert!(text.contains("«\"gender\"»: «\"male\"»"));
//! ```
//!
//! Both operations are pure: documents are borrowed, never mutated, and
//! nothing is shared between calls.

pub mod error;
pub mod path;
pub mod render;

pub use error::{Error, NotFoundReason, Result};
pub use path::{resolve, Path, Segment};
pub use render::{
    render, render_with, to_highlighted_string, Annotate, Ansi, HighlightSet, Marker, Plain,
    TokenKind,
};
