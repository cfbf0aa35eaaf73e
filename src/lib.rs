//! manifest-merger - Android manifest merging
//!
//! Merges a main `AndroidManifest.xml` with its overlays and library
//! manifests into one document, following the `tools:` merge directives.
//!
//! # Architecture
//!
//! The merge pipeline consists of:
//! 1. **Parsing** - Read XML into an owned node tree with source spans ([`xml`])
//! 2. **Keying** - Give every element a merge identity from the policy table ([`model`])
//! 3. **Merging** - Fold documents together by priority ([`merge`])
//! 4. **Placeholders** - Encode and substitute `${...}` values ([`placeholder`])
//! 5. **Validation** - Check inputs and the merged result ([`validation`])
//! 6. **Reporting** - Records, the provenance ledger and result documents ([`report`])
//!
//! ```no_run
//! use manifest_merger::{InputSource, Invoker, MergeType, MergedManifestKind};
//!
//! let report = Invoker::new(InputSource::file("app/AndroidManifest.xml"), MergeType::Application)
//!     .add_library(InputSource::file("lib/AndroidManifest.xml"))
//!     .with_placeholder("host", "example.com")
//!     .merge()?;
//! if let Some(xml) = report.merged_document(MergedManifestKind::Merged) {
//!     println!("{}", xml);
//! }
//! # Ok::<(), manifest_merger::MergeFailure>(())
//! ```

pub mod config;
pub mod error;
pub mod merge;
pub mod model;
pub mod placeholder;
pub mod report;
pub mod validation;
pub mod xml;

pub use config::Config;
pub use error::{InvalidFeatureName, MergeFailure};
pub use merge::{
    DeepLink, Feature, InputSource, Invoker, ManifestMerger, MergeType, NavigationXmlDocument, SystemProperty,
};
pub use model::{ManifestModel, NodeKey, NodeOperation, NodeType};
pub use placeholder::{KeyBasedValueResolver, PlaceholderEncoder, PlaceholderResolver, ResolverChain};
pub use report::{
    ActionType, Actions, MergeResult, MergedManifestKind, MergingReport, Record, ReportFormat, Reporter, Severity,
};
pub use validation::validate_feature_name;
pub use xml::{DocumentType, SourceFile, SourceFilePosition, XmlDocument};
