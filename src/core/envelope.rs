//! Reply shapes of the document engine.
//!
//! A singular get nests the stored attributes under `_source` next to the
//! `_id`/`_version` metadata. Search replies wrap a list of those under
//! `hits.hits`, multi-get replies under `docs`.

use crate::domain::model::{Attributes, Record};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct GetEnvelope {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(rename = "_version", default)]
    pub version: Option<u64>,
    #[serde(default)]
    pub found: Option<bool>,
    #[serde(rename = "_source", default)]
    pub source: Option<Value>,
}

impl GetEnvelope {
    /// Older engines answer a miss with `200 {"found": false}`.
    pub fn is_missing(&self) -> bool {
        self.found == Some(false)
    }

    pub fn into_record(self) -> Record {
        let attributes = match self.source {
            Some(Value::Object(map)) => map,
            _ => Attributes::new(),
        };
        Record {
            id: self.id,
            version: self.version,
            attributes,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchEnvelope {
    pub hits: HitsEnvelope,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HitsEnvelope {
    #[serde(default)]
    pub hits: Vec<GetEnvelope>,
}

impl SearchEnvelope {
    pub fn into_records(self) -> Vec<Record> {
        self.hits
            .hits
            .into_iter()
            .map(GetEnvelope::into_record)
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MgetEnvelope {
    #[serde(default)]
    pub docs: Vec<GetEnvelope>,
}

/// Reply to index (create/update) requests.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexEnvelope {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(rename = "_version", default)]
    pub version: Option<u64>,
}
