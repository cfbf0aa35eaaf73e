//! Class name qualification

use crate::xml::{Transform, XmlAttribute, XmlElement, ANDROID_URI};

/// Qualify a relative class name with `package`.
///
/// `.Foo` and `Foo` both become `package.Foo`; qualified names and
/// placeholder-bearing values stay untouched.
pub(crate) fn expand(value: &str, package: &str) -> Option<String> {
    if value.is_empty() || package.is_empty() || value.contains("${") {
        return None;
    }
    if value.starts_with('.') {
        Some(format!("{}{}", package, value))
    } else if !value.contains('.') {
        Some(format!("{}.{}", package, value))
    } else {
        None
    }
}

/// Shorten a class name under `namespace` back to `.Foo`
pub(crate) fn extract(value: &str, namespace: &str) -> Option<String> {
    let rest = value.strip_prefix(namespace)?.strip_prefix('.')?;
    (!rest.is_empty()).then(|| format!(".{}", rest))
}

fn is_class_name(element: &XmlElement, attribute: &XmlAttribute) -> bool {
    attribute.name.in_namespace(ANDROID_URI)
        && element
            .node_type()
            .class_name_attributes()
            .contains(&attribute.name.local.as_str())
}

/// Qualifies class names at load time
pub(crate) struct ClassNameExpander<'a> {
    pub(crate) package: &'a str,
}

impl Transform for ClassNameExpander<'_> {
    fn rewrite_attributes(&mut self, element: &XmlElement, attributes: &mut Vec<XmlAttribute>) -> bool {
        let mut changed = false;
        for attribute in attributes.iter_mut() {
            if !is_class_name(element, attribute) {
                continue;
            }
            if let Some(expanded) = expand(&attribute.value, self.package) {
                attribute.value = expanded;
                changed = true;
            }
        }
        changed
    }
}

/// Contracts class names under the namespace in the final document
pub(crate) struct ClassNameExtractor<'a> {
    pub(crate) namespace: &'a str,
}

impl Transform for ClassNameExtractor<'_> {
    fn rewrite_attributes(&mut self, element: &XmlElement, attributes: &mut Vec<XmlAttribute>) -> bool {
        let mut changed = false;
        for attribute in attributes.iter_mut() {
            if !is_class_name(element, attribute) {
                continue;
            }
            if let Some(extracted) = extract(&attribute.value, self.namespace) {
                attribute.value = extracted;
                changed = true;
            }
        }
        changed
    }
}
