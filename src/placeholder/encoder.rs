use super::PATH_ATTRIBUTES;
use crate::xml::{Transform, XmlAttribute, XmlElement, ANDROID_URI};
use regex::Regex;
use std::borrow::Cow;

/// Rewrites `${name}` into `dollar_openBracket_name_closeBracket`
pub struct PlaceholderEncoder {
    pattern: Regex,
}

impl PlaceholderEncoder {
    pub fn new() -> Self {
        let pattern = Regex::new(r"\$\{([^}]*)\}").expect("placeholder pattern is valid");
        Self { pattern }
    }

    /// Encode every placeholder in `value`. Encoding is idempotent.
    pub fn encode<'a>(&self, value: &'a str) -> Cow<'a, str> {
        self.pattern
            .replace_all(value, "dollar_openBracket_${1}_closeBracket")
    }
}

impl Default for PlaceholderEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for PlaceholderEncoder {
    fn rewrite_attributes(&mut self, _element: &XmlElement, attributes: &mut Vec<XmlAttribute>) -> bool {
        let mut changed = false;
        for attribute in attributes.iter_mut() {
            let path_like = attribute.name.in_namespace(ANDROID_URI)
                && PATH_ATTRIBUTES.contains(&attribute.name.local.as_str());
            if !path_like {
                continue;
            }
            if let Cow::Owned(encoded) = self.encode(&attribute.value) {
                attribute.value = encoded;
                changed = true;
            }
        }
        changed
    }
}
