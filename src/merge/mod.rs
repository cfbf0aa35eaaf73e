//! Manifest merging
//!
//! The pipeline run by [`Invoker::merge`]:
//! 1. **Load** - parse every input, encode path placeholders, qualify class names
//! 2. **Pre-validate** - check directives, duplicates and selectors per document
//! 3. **Merge** - fold overlays, then libraries, into the main manifest
//! 4. **Inject** - apply system property overrides and feature attributes
//! 5. **Resolve** - substitute `${...}` placeholders
//! 6. **Expand** - turn `<nav-graph>` references into intent filters
//! 7. **Post-validate** - package and `android:exported` rules
//! 8. **Clean** - strip tools directives and build the result documents

mod aapt;
mod cleaner;
mod context;
mod document;
mod element;
mod features;
mod fqcn;
mod invoker;
mod loader;
mod navigation;
mod policy;
mod system_property;

pub use features::{Feature, MergeType};
pub use invoker::{Invoker, ManifestMerger};
pub use loader::InputSource;
pub use navigation::{DeepLink, NavigationXmlDocument};
pub use system_property::SystemProperty;

pub(crate) use context::MergeContext;
