use crate::merge::MergeContext;
use crate::model::KeyResolver;
use crate::report::Severity;
use crate::xml::{Transform, XmlAttribute, XmlDocument, XmlElement};
use regex::{Captures, Regex};
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Source of placeholder values
pub trait KeyBasedValueResolver {
    fn value(&self, key: &str) -> Option<String>;
}

impl<S: BuildHasher> KeyBasedValueResolver for HashMap<String, String, S> {
    fn value(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl KeyBasedValueResolver for BTreeMap<String, String> {
    fn value(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Asks each resolver in turn; the first answer wins
#[derive(Default)]
pub struct ResolverChain<'r> {
    resolvers: Vec<&'r dyn KeyBasedValueResolver>,
}

impl<'r> ResolverChain<'r> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, resolver: &'r dyn KeyBasedValueResolver) -> Self {
        self.resolvers.push(resolver);
        self
    }
}

impl KeyBasedValueResolver for ResolverChain<'_> {
    fn value(&self, key: &str) -> Option<String> {
        self.resolvers.iter().find_map(|r| r.value(key))
    }
}

/// Finds plain and encoded placeholders and substitutes them
pub struct PlaceholderResolver {
    pattern: Regex,
}

impl PlaceholderResolver {
    pub fn new() -> Self {
        let pattern = Regex::new(r"\$\{([^}]*)\}|dollar_openBracket_(.+?)_closeBracket")
            .expect("placeholder pattern is valid");
        Self { pattern }
    }

    pub fn has_placeholder(&self, value: &str) -> bool {
        self.pattern.is_match(value)
    }

    /// Replace every placeholder in `value`.
    ///
    /// Returns the new value and the keys that had no value; those are left
    /// in place as `${key}`.
    pub fn substitute(&self, value: &str, values: &dyn KeyBasedValueResolver) -> (String, Vec<String>) {
        let mut missing = Vec::new();
        let substituted = self.pattern.replace_all(value, |caps: &Captures<'_>| {
            let key = placeholder_key(caps);
            values.value(key).unwrap_or_else(|| {
                missing.push(key.to_string());
                format!("${{{}}}", key)
            })
        });
        (substituted.into_owned(), missing)
    }

    /// Turn encoded placeholders back into `${key}`
    pub fn decode(&self, value: &str) -> String {
        self.pattern
            .replace_all(value, |caps: &Captures<'_>| format!("${{{}}}", placeholder_key(caps)))
            .into_owned()
    }
}

impl Default for PlaceholderResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn placeholder_key<'t>(caps: &Captures<'t>) -> &'t str {
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str())
        .unwrap_or_default()
}

struct Resolution<'r, 'c, 'm> {
    resolver: &'r PlaceholderResolver,
    values: &'r dyn KeyBasedValueResolver,
    replace: bool,
    ctx: &'c mut MergeContext<'m>,
}

impl Transform for Resolution<'_, '_, '_> {
    fn rewrite_attributes(&mut self, element: &XmlElement, attributes: &mut Vec<XmlAttribute>) -> bool {
        let old_key = self.ctx.model.key(element);
        let mut changed = false;

        for attribute in attributes.iter_mut() {
            if !self.resolver.has_placeholder(&attribute.value) {
                continue;
            }
            let value = if self.replace {
                let (value, missing) = self.resolver.substitute(&attribute.value, self.values);
                let severity = if attribute.origin.is_library() {
                    Severity::Warning
                } else {
                    Severity::Error
                };
                for key in missing {
                    self.ctx.add(
                        severity,
                        attribute.position(),
                        format!(
                            "Attribute {}@{} at {} requires a placeholder substitution but no value for <{}> is provided.",
                            old_key,
                            attribute.name,
                            attribute.position(),
                            key
                        ),
                    );
                }
                value
            } else {
                self.resolver.decode(&attribute.value)
            };
            if value != attribute.value {
                attribute.value = value;
                changed = true;
            }
        }

        let content_keyed = self.ctx.model.policy(element.node_type()).key_resolver == KeyResolver::Content;
        if changed && !content_keyed {
            let mut probe = element.shell();
            probe.attributes = attributes.clone();
            let new_key = self.ctx.model.key(&probe);
            self.ctx.actions.rekey(&old_key.to_string(), &new_key.to_string());
        }
        changed
    }
}

/// Substitute placeholders across the merged document.
///
/// With `replace` unset only encoded placeholders are turned back into `${key}`.
pub(crate) fn resolve_document(
    doc: &XmlDocument,
    values: &dyn KeyBasedValueResolver,
    replace: bool,
    ctx: &mut MergeContext<'_>,
) -> XmlDocument {
    let resolver = PlaceholderResolver::new();
    let mut resolution = Resolution {
        resolver: &resolver,
        values,
        replace,
        ctx,
    };
    let (root, _) = doc.root().clone_and_transform(&mut resolution);
    doc.with_root(root)
}
