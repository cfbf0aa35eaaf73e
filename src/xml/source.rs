use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Provenance handle for a loaded document: a file on disk or an in-memory buffer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceFile {
    path: Option<PathBuf>,
    description: Option<String>,
}

impl SourceFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            description: None,
        }
    }

    pub fn in_memory(description: impl Into<String>) -> Self {
        Self {
            path: None,
            description: Some(description.into()),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Short name used in user-facing messages
    pub fn file_name(&self) -> String {
        self.path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .or_else(|| self.description.clone())
            .unwrap_or_else(|| "Unknown file".to_string())
    }
}

impl fmt::Display for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.path, &self.description) {
            (Some(path), Some(description)) => write!(f, "[{}] {}", description, path.display()),
            (Some(path), None) => write!(f, "{}", path.display()),
            (None, Some(description)) => write!(f, "{}", description),
            (None, None) => write!(f, "Unknown file"),
        }
    }
}

/// 1-based line/column range of a node in its source text.
///
/// The start points at the opening `<`, the end is one past the closing `>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceSpan {
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl SourceSpan {
    pub fn new(start_line: usize, start_column: usize, end_line: usize, end_column: usize) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start_line == self.end_line {
            write!(f, "{}:{}-{}", self.start_line, self.start_column, self.end_column)
        } else {
            write!(
                f,
                "{}:{}-{}:{}",
                self.start_line, self.start_column, self.end_line, self.end_column
            )
        }
    }
}

/// A file plus an optional span inside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFilePosition {
    pub file: Arc<SourceFile>,
    pub span: Option<SourceSpan>,
}

impl SourceFilePosition {
    pub fn new(file: Arc<SourceFile>, span: Option<SourceSpan>) -> Self {
        Self { file, span }
    }

    pub fn line(&self) -> Option<usize> {
        self.span.map(|s| s.start_line)
    }
}

impl fmt::Display for SourceFilePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.span {
            Some(span) => write!(f, "{}:{}", self.file, span),
            None => write!(f, "{}", self.file),
        }
    }
}

/// Maps byte offsets of a text to 1-based line/column pairs
pub(crate) struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub(crate) fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    pub(crate) fn position(&self, offset: usize) -> (usize, usize) {
        let line = self.starts.partition_point(|&start| start <= offset).max(1);
        let column = offset - self.starts[line - 1] + 1;
        (line, column)
    }

    pub(crate) fn span(&self, start: usize, end: usize) -> SourceSpan {
        let (start_line, start_column) = self.position(start);
        let (end_line, end_column) = self.position(end);
        SourceSpan::new(start_line, start_column, end_line, end_column)
    }
}
