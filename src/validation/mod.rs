//! Checks run on input documents before merging and on the merged result

pub(crate) mod post;
pub(crate) mod pre;

use crate::error::InvalidFeatureName;

/// Dynamic feature names must look like `[A-Za-z][A-Za-z0-9_]*`
pub fn validate_feature_name(name: &str) -> Result<(), InvalidFeatureName> {
    let invalid = |reason| {
        Err(InvalidFeatureName {
            name: name.to_string(),
            reason,
        })
    };

    let mut chars = name.chars();
    match chars.next() {
        None => return invalid("it must not be empty"),
        Some(first) if !first.is_ascii_alphabetic() => return invalid("it must start with a letter"),
        Some(_) => {}
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return invalid("it may only contain letters, digits and underscores");
    }
    Ok(())
}

/// Whether `value` is a dotted Java package name
pub(crate) fn is_package_name(value: &str) -> bool {
    !value.is_empty()
        && value.split('.').all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}
