//! XML node model for manifest documents
//!
//! Documents are parsed once into an owned tree that records namespaces,
//! source spans and provenance for every element. Trees are never mutated
//! after loading; transformations go through [`Transform`] and produce copies.

mod document;
mod element;
mod parser;
mod source;
mod transform;
mod writer;

pub use document::{DocumentType, NamespaceTable, XmlDocument};
pub use element::{Origin, QName, XmlAttribute, XmlElement, XmlNode};
pub use parser::parse_document;
pub use source::{SourceFile, SourceFilePosition, SourceSpan};
pub use transform::Transform;
pub use writer::write_document;

pub(crate) use source::LineIndex;
pub(crate) use writer::comment_text;

pub const ANDROID_URI: &str = "http://schemas.android.com/apk/res/android";
pub const TOOLS_URI: &str = "http://schemas.android.com/tools";
pub const DIST_URI: &str = "http://schemas.android.com/apk/distribution";
