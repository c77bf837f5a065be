use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The plain attribute payload of a record.
pub type Attributes = Map<String, Value>;

/// One stored object: an attribute set plus the identity the engine knows it by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: Option<String>,
    pub version: Option<u64>,
    pub attributes: Attributes,
}

impl Record {
    pub fn new(attributes: Attributes) -> Self {
        Self {
            id: None,
            version: None,
            attributes,
        }
    }

    pub fn with_id(id: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            id: Some(id.into()),
            version: None,
            attributes,
        }
    }

    /// 沒有屬性物件時回傳空集合
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(attributes) => Self::new(attributes),
            _ => Self::new(Attributes::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(|v| v.as_str())
    }

    /// Request body for create/update: attributes only, never the id.
    pub fn payload(&self) -> Value {
        Value::Object(self.attributes.clone())
    }

    pub fn has_id(&self) -> bool {
        self.id.as_deref().is_some_and(|id| !id.is_empty())
    }
}

/// Result collection filled in by a query.
#[derive(Debug, Clone, Default)]
pub struct RecordArray {
    query: Value,
    records: Vec<Record>,
    is_loaded: bool,
}

impl RecordArray {
    pub fn new(query: Value) -> Self {
        Self {
            query,
            records: Vec::new(),
            is_loaded: false,
        }
    }

    pub fn query(&self) -> &Value {
        &self.query
    }

    pub fn load(&mut self, records: impl IntoIterator<Item = Record>) -> usize {
        let before = self.records.len();
        self.records.extend(records);
        self.is_loaded = true;
        self.records.len() - before
    }

    pub fn is_loaded(&self) -> bool {
        self.is_loaded
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn object_at(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_excludes_id() {
        let record = Record::with_id(
            "3",
            json!({"name": "Alice"}).as_object().cloned().unwrap(),
        );
        assert_eq!(record.payload(), json!({"name": "Alice"}));
        assert!(record.has_id());
        assert!(!Record::with_id("", Attributes::new()).has_id());
    }

    #[test]
    fn test_record_array_load() {
        let mut results = RecordArray::new(json!({"query": {"match_all": {}}}));
        assert!(!results.is_loaded());

        let added = results.load(vec![Record::from_value(json!({"name": "Mary"}))]);
        assert_eq!(added, 1);
        assert!(results.is_loaded());
        assert_eq!(results.object_at(0).and_then(|r| r.get_str("name")), Some("Mary"));
    }
}
