
use itertools::Itertools;
use std::collections::BTreeSet;
use std::fmt;

use crate::data_types::record::MISSING_VALUE;

/// Ordered INFO entries; a `None` value is a key-only flag.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InfoField {
    entries: Vec<(String, Option<String>)>
}

impl InfoField {
    /// Parses a `;`-delimited INFO value. `.` is the empty field.
    pub fn parse(info: &str) -> Self {
        if info == MISSING_VALUE {
            return Self::default();
        }
        let entries = info.split(';')
            .filter(|e| !e.is_empty())
            .map(|e| match e.split_once('=') {
                Some((k, v)) => (k.to_string(), Some(v.to_string())),
                None => (e.to_string(), None)
            })
            .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _v)| k == key)
    }

    /// Value for a key; None both for flags and for absent keys
    pub fn value(&self, key: &str) -> Option<&str> {
        self.entries.iter()
            .find(|(k, _v)| k == key)
            .and_then(|(_k, v)| v.as_deref())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _v)| k.as_str())
    }

    pub fn key_set(&self) -> BTreeSet<&str> {
        self.keys().collect()
    }

    /// Renames a key in place, keeping its value and position. Returns false if the key was absent.
    pub fn rename_key(&mut self, from: &str, to: &str) -> bool {
        match self.entries.iter_mut().find(|(k, _v)| k == from) {
            Some(entry) => {
                entry.0 = to.to_string();
                true
            },
            None => false
        }
    }

    /// Puts a flag at the front, moving it there if it already exists
    pub fn insert_flag_front(&mut self, key: &str) {
        self.entries.retain(|(k, _v)| k != key);
        self.entries.insert(0, (key.to_string(), None));
    }

    /// Sets a value, replacing in place or appending
    pub fn insert(&mut self, key: &str, value: Option<String>) {
        match self.entries.iter_mut().find(|(k, _v)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value))
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Option<String>> {
        let index = self.entries.iter().position(|(k, _v)| k == key)?;
        Some(self.entries.remove(index).1)
    }
}

impl fmt::Display for InfoField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "{MISSING_VALUE}");
        }
        let joined = self.entries.iter()
            .map(|(k, v)| match v {
                Some(v) => format!("{k}={v}"),
                None => k.clone()
            })
            .join(";");
        write!(f, "{joined}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let text = "SVTYPE=DEL;SOMATIC;END=150";
        let info = InfoField::parse(text);
        assert_eq!(info.value("SVTYPE"), Some("DEL"));
        assert!(info.contains_key("SOMATIC"));
        assert_eq!(info.value("SOMATIC"), None);
        assert_eq!(info.value("MISSING"), None);
        // flags come back without `=`
        assert_eq!(info.to_string(), text);
    }

    #[test]
    fn test_empty() {
        let info = InfoField::parse(".");
        assert!(info.is_empty());
        assert_eq!(info.to_string(), ".");
        let mut info = InfoField::parse("");
        info.insert_flag_front("forcedHet");
        assert_eq!(info.to_string(), "forcedHet");
    }

    #[test]
    fn test_mutations() {
        let mut info = InfoField::parse("END=10;SVTYPE=INS;HOMLEN=2");
        assert!(info.rename_key("SVTYPE", "TYPEOFSV"));
        assert!(!info.rename_key("SVTYPE", "TYPEOFSV"));
        info.insert_flag_front("forcedHet");
        assert_eq!(info.to_string(), "forcedHet;END=10;TYPEOFSV=INS;HOMLEN=2");

        info.insert("END", Some("12".to_string()));
        info.insert("NEW", None);
        assert_eq!(info.remove("HOMLEN"), Some(Some("2".to_string())));
        assert_eq!(info.to_string(), "forcedHet;END=12;TYPEOFSV=INS;NEW");
        assert_eq!(info.key_set().into_iter().collect::<Vec<_>>(), vec!["END", "NEW", "TYPEOFSV", "forcedHet"]);
    }
}
