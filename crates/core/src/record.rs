//! The ordered fact list accumulated over one run.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::error::HarnessError;

/// Ordered `(key, value)` facts. Each key is written at most once and the
/// serialized object lists keys in the order the lifecycle wrote them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunRecord {
    entries: Vec<(String, Value)>,
}

impl RunRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fact. Writing a key twice is a harness bug and is rejected.
    pub fn insert<T>(&mut self, key: impl Into<String>, value: T) -> Result<(), HarnessError>
    where
        T: Serialize,
    {
        let key = key.into();
        if self.contains_key(&key) {
            return Err(HarnessError::DuplicateKey(key));
        }
        let value = serde_json::to_value(value)?;
        self.entries.push((key, value));
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Indented, human-readable JSON in insertion order.
    pub fn to_pretty_json(&self) -> Result<String, HarnessError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Serialize for RunRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn preserves_insertion_order() {
        let mut record = RunRecord::new();
        record.insert("zeta", 1).unwrap();
        record.insert("alpha", "two").unwrap();
        record.insert("mid", json!({"k": [1, 2]})).unwrap();

        let keys: Vec<&str> = record.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);

        let text = serde_json::to_string(&record).unwrap();
        assert_eq!(text, r#"{"zeta":1,"alpha":"two","mid":{"k":[1,2]}}"#);
    }

    #[test]
    fn rejects_duplicate_key() {
        let mut record = RunRecord::new();
        record.insert("error", "boom").unwrap();
        let err = record.insert("error", "again").unwrap_err();
        assert!(matches!(err, HarnessError::DuplicateKey(ref k) if k == "error"));
        assert_eq!(record.get("error"), Some(&json!("boom")));
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn pretty_json_is_indented() {
        let mut record = RunRecord::new();
        record.insert("a", true).unwrap();
        let text = record.to_pretty_json().unwrap();
        assert_eq!(text, "{\n  \"a\": true\n}");
    }

    #[test]
    fn empty_record() {
        let record = RunRecord::new();
        assert!(record.is_empty());
        assert_eq!(record.to_pretty_json().unwrap(), "{}");
    }
}
