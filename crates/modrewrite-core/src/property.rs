//! Build property sources for `${property}` placeholders

use std::collections::{BTreeMap, HashMap};

/// Lookup of build properties by name
pub trait PropertySource {
    fn property(&self, name: &str) -> Option<String>;
}

/// A source with no properties at all
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProperties;

impl PropertySource for NoProperties {
    fn property(&self, _name: &str) -> Option<String> {
        None
    }
}

impl PropertySource for HashMap<String, String> {
    fn property(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl PropertySource for BTreeMap<String, String> {
    fn property(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl<P: PropertySource + ?Sized> PropertySource for &P {
    fn property(&self, name: &str) -> Option<String> {
        (**self).property(name)
    }
}

/// Name inside a whole-value `${...}` placeholder
pub fn placeholder_name(value: &str) -> Option<&str> {
    value.strip_prefix("${").and_then(|v| v.strip_suffix('}'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_name() {
        assert_eq!(placeholder_name("${version.lib}"), Some("version.lib"));
        assert_eq!(placeholder_name("1.0.0"), None);
        assert_eq!(placeholder_name("pre-${x}"), None);
    }

    #[test]
    fn test_map_sources() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), "1".to_string());
        assert_eq!(map.property("a").as_deref(), Some("1"));
        assert_eq!((&map).property("b"), None);
        assert_eq!(NoProperties.property("a"), None);
    }
}
