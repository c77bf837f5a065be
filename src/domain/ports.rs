use crate::domain::model::{Record, RecordArray};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Per-model metadata naming the index/type collection its documents live in.
pub trait TypeDescriptor: Send + Sync {
    fn collection_path(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelType {
    path: String,
}

impl ModelType {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl TypeDescriptor for ModelType {
    fn collection_path(&self) -> &str {
        &self.path
    }
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn timeout_seconds(&self) -> Option<u64>;
    fn find_all_size(&self) -> usize;
    fn refresh_on_write(&self) -> bool;
}

#[async_trait]
pub trait Adapter: Send + Sync {
    async fn find(&self, ty: &dyn TypeDescriptor, id: &str) -> Result<Record>;
    async fn find_all(&self, ty: &dyn TypeDescriptor) -> Result<Vec<Record>>;
    async fn find_many(&self, ty: &dyn TypeDescriptor, ids: &[String]) -> Result<Vec<Record>>;
    async fn find_query(
        &self,
        ty: &dyn TypeDescriptor,
        query: &Value,
        results: &mut RecordArray,
    ) -> Result<usize>;
    async fn create_record(&self, ty: &dyn TypeDescriptor, record: &mut Record) -> Result<()>;
    async fn update_record(&self, ty: &dyn TypeDescriptor, record: &Record) -> Result<Option<u64>>;
    async fn delete_record(&self, ty: &dyn TypeDescriptor, record: &Record) -> Result<()>;
}
