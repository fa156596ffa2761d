//! Attribute list delivered with open-tag events.

use std::collections::HashMap;

/// Ordered attribute list.
///
/// Duplicate names keep the first occurrence. Names are compared as plain
/// strings; nothing about a name (`__proto__`, `constructor`, ...) is special.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attributes {
    items: Vec<(String, String)>,
    /// Name to position in `items`.
    index: HashMap<String, usize>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `name=value` unless `name` is already present. Returns whether
    /// the attribute was stored.
    pub fn insert(&mut self, name: String, value: String) -> bool {
        if self.index.contains_key(&name) {
            return false;
        }
        self.index.insert(name.clone(), self.items.len());
        self.items.push((name, value));
        true
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        let &position = self.index.get(name)?;
        self.items.get(position).map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::Attributes;

    #[test]
    fn first_occurrence_wins() {
        let mut attrs = Attributes::new();
        assert!(attrs.insert("id".into(), "a".into()));
        assert!(!attrs.insert("id".into(), "b".into()));
        assert_eq!(attrs.get("id"), Some("a"));
        assert_eq!(attrs.len(), 1);
    }

    #[test]
    fn reserved_looking_names_are_ordinary() {
        let mut attrs = Attributes::new();
        attrs.insert("__proto__".into(), "x".into());
        attrs.insert("constructor".into(), "y".into());
        assert_eq!(attrs.get("__proto__"), Some("x"));
        assert_eq!(attrs.get("constructor"), Some("y"));
        assert_eq!(attrs.get("toString"), None);
        assert_eq!(
            attrs.iter().collect::<Vec<_>>(),
            [("__proto__", "x"), ("constructor", "y")]
        );
    }

    #[test]
    fn many_attributes_keep_order_and_first_values() {
        let mut attrs = Attributes::new();
        for round in 0..2 {
            for i in 0..5000 {
                attrs.insert(format!("a{i}"), format!("{round}"));
            }
        }
        assert_eq!(attrs.len(), 5000);
        assert_eq!(attrs.get("a4999"), Some("0"));
        assert_eq!(attrs.iter().next(), Some(("a0", "0")));
        assert_eq!(attrs.iter().last(), Some(("a4999", "0")));
    }
}
