//! Template nodes and the lookup view they render against.

use std::collections::{BTreeMap, HashMap};

/// One parsed template node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Literal text copied into the output unchanged.
    Literal(String),
    /// A `[key]` placeholder resolved through the view at render time.
    Placeholder(String),
}

/// Key→value view a template renders against.
///
/// Implementations distinguish a key that is present but empty from a key
/// that is absent; rendering treats both as the empty string, but
/// perspective-scoped key resolution needs the distinction.
pub trait TemplateView {
    /// Look up a key, returning its value when present.
    fn lookup(&self, key: &str) -> Option<&str>;
}

impl TemplateView for BTreeMap<String, String> {
    fn lookup(&self, key: &str) -> Option<&str> {
        self.get(key).map(|s| s.as_str())
    }
}

impl TemplateView for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<&str> {
        self.get(key).map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_btree_view_lookup() {
        let mut view = BTreeMap::new();
        view.insert("a".to_string(), "1".to_string());
        view.insert("empty".to_string(), String::new());

        assert_eq!(view.lookup("a"), Some("1"));
        assert_eq!(view.lookup("empty"), Some(""));
        assert_eq!(view.lookup("missing"), None);
    }
}
