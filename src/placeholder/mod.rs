//! `${name}` placeholders in attribute values
//!
//! Path-like attributes carry placeholders through the merge in an encoded,
//! XML-safe form (`dollar_openBracket_name_closeBracket`). After merging,
//! every plain or encoded placeholder is substituted from a
//! [`KeyBasedValueResolver`].

mod encoder;
mod resolver;

pub use encoder::PlaceholderEncoder;
pub use resolver::{KeyBasedValueResolver, PlaceholderResolver, ResolverChain};

pub(crate) use resolver::resolve_document;

/// Attributes whose values may hold placeholders the resource compiler rejects
pub const PATH_ATTRIBUTES: [&str; 3] = ["path", "pathPrefix", "pathPattern"];

/// Placeholder bound to the application id
pub const APPLICATION_ID: &str = "applicationId";

/// Placeholder bound to the package override
pub const PACKAGE_NAME: &str = "packageName";
