//! Directory entry representation.

use std::collections::HashMap;

/// LDAP entry as returned by a search.
///
/// Directory entries are sparse: any requested attribute may be absent, and lookups report
/// that as `None` rather than failing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Distinguished name of the entry.
    pub dn: String,
    /// Attribute map (values keep the order the server sent them in).
    pub attributes: HashMap<String, Vec<String>>,
}

impl DirectoryEntry {
    /// Creates an entry with no attributes.
    #[must_use]
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: HashMap::new(),
        }
    }

    /// Adds an attribute value, keeping any existing values.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Returns all values for the attribute. Names match case-insensitively.
    #[must_use]
    pub fn values(&self, attribute: &str) -> Option<&[String]> {
        self.attributes
            .get(attribute)
            .or_else(|| {
                self.attributes
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(attribute))
                    .map(|(_, values)| values)
            })
            .map(Vec::as_slice)
    }

    /// Returns the first value of the attribute if present.
    #[must_use]
    pub fn first(&self, attribute: &str) -> Option<&str> {
        self.values(attribute)
            .and_then(|values| values.first().map(String::as_str))
    }

    /// Returns the first value of the attribute, or `(no <attribute>)` when it is unset.
    #[must_use]
    pub fn first_or_placeholder(&self, attribute: &str) -> String {
        self.first(attribute)
            .map_or_else(|| placeholder(attribute), str::to_owned)
    }
}

fn placeholder(attribute: &str) -> String {
    format!("(no {attribute})")
}
