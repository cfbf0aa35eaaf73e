use super::fqcn::ClassNameExpander;
use crate::error::MergeFailure;
use crate::model::ManifestModel;
use crate::placeholder::PlaceholderEncoder;
use crate::xml::{parse_document, DocumentType, SourceFile, XmlDocument};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Where an input document (manifest or navigation JSON) comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    File(PathBuf),
    Text { description: String, contents: String },
}

impl InputSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        InputSource::File(path.into())
    }

    pub fn text(description: impl Into<String>, contents: impl Into<String>) -> Self {
        InputSource::Text {
            description: description.into(),
            contents: contents.into(),
        }
    }

    pub(crate) fn read(&self) -> Result<(SourceFile, String), MergeFailure> {
        match self {
            InputSource::File(path) => {
                let contents = std::fs::read_to_string(path).map_err(|source| MergeFailure::Io {
                    path: path.clone(),
                    source,
                })?;
                Ok((SourceFile::from_path(path.clone()), contents))
            }
            InputSource::Text { description, contents } => {
                Ok((SourceFile::in_memory(description.clone()), contents.clone()))
            }
        }
    }
}

/// Read, parse and normalize one input document.
///
/// Placeholders in path-like attributes are encoded and relative class
/// names are qualified with `package`, or the document's own package.
pub(crate) fn load_document(
    source: &InputSource,
    doc_type: DocumentType,
    package: Option<&str>,
    model: &ManifestModel,
) -> Result<XmlDocument, MergeFailure> {
    let (file, text) = source.read()?;
    let doc = parse_document(&text, Arc::new(file), doc_type, package, model)?;
    debug!(
        "Loaded {} {} ({} elements)",
        doc_type,
        doc.source(),
        doc.root().element_count()
    );

    let (root, _) = doc.root().clone_and_transform(&mut PlaceholderEncoder::new());
    let root = match doc.root().origin().package.as_deref() {
        Some(package) => root.clone_and_transform(&mut ClassNameExpander { package }).0,
        None => root,
    };
    Ok(doc.with_root(root))
}
