use crate::config::AdapterConfig;
use crate::core::envelope::{GetEnvelope, IndexEnvelope, MgetEnvelope, SearchEnvelope};
use crate::core::urls;
use crate::core::{Adapter, Record, RecordArray, TypeDescriptor};
use crate::utils::error::{AdapterError, Result};
use crate::utils::validation::{validate_non_empty_string, Validate};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Adapter that keeps records as JSON documents in elasticsearch.
///
/// Each call maps onto exactly one HTTP request under
/// `{url}/{collection_path}`. Failures come back as typed errors.
pub struct ElasticsearchAdapter {
    config: AdapterConfig,
    base_url: Url,
    client: Client,
    cancel: CancellationToken,
}

impl ElasticsearchAdapter {
    pub fn new(config: AdapterConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(timeout));
        }
        let client = builder.build()?;
        Self::with_client(config, client)
    }

    /// 共用既有的 HTTP client（連線池）
    pub fn with_client(config: AdapterConfig, client: Client) -> Result<Self> {
        config.validate()?;
        let base_url = urls::parse_base_url(&config.url)?;
        Ok(Self {
            config,
            base_url,
            client,
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Cancelling the returned token aborts every request still in flight.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    fn read_url(&self, ty: &dyn TypeDescriptor, segment: Option<&str>) -> Result<Url> {
        urls::collection_url(&self.base_url, ty.collection_path(), segment)
    }

    fn write_url(&self, ty: &dyn TypeDescriptor, segment: Option<&str>) -> Result<Url> {
        let url = self.read_url(ty, segment)?;
        if self.config.refresh_on_write {
            Ok(urls::with_refresh(url))
        } else {
            Ok(url)
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<(StatusCode, String)> {
        let response = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(AdapterError::Cancelled),
            response = request.send() => response?,
        };

        let status = response.status();
        let body = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(AdapterError::Cancelled),
            body = response.text() => body?,
        };

        tracing::debug!("elasticsearch ({})", status.as_u16());
        tracing::trace!("elasticsearch ({}): {}", status.as_u16(), body);
        Ok((status, body))
    }

    fn check_status(
        ty: &dyn TypeDescriptor,
        segment: Option<&str>,
        status: StatusCode,
        body: String,
    ) -> Result<String> {
        if status.is_success() {
            return Ok(body);
        }

        let collection = ty.collection_path().to_string();
        let id = segment.unwrap_or_default().to_string();
        match status {
            StatusCode::NOT_FOUND => Err(AdapterError::NotFound { collection, id }),
            StatusCode::CONFLICT => Err(AdapterError::Conflict { collection, id }),
            _ => Err(AdapterError::Status {
                status: status.as_u16(),
                body,
            }),
        }
    }

    /// Runs a `_search`. A collection that does not exist yet has no hits.
    async fn search(&self, ty: &dyn TypeDescriptor, payload: &Value) -> Result<Vec<Record>> {
        let url = self.read_url(ty, Some("_search"))?;
        tracing::debug!("📡 POST {} {}", url, payload);

        let (status, body) = self.send(self.client.post(url).json(payload)).await?;
        if status == StatusCode::NOT_FOUND {
            tracing::debug!("Collection {} does not exist yet", ty.collection_path());
            return Ok(Vec::new());
        }
        let body = Self::check_status(ty, Some("_search"), status, body)?;

        let envelope: SearchEnvelope = serde_json::from_str(&body)?;
        Ok(envelope.into_records())
    }

    fn require_id<'a>(ty: &dyn TypeDescriptor, record: &'a Record) -> Result<&'a str> {
        match record.id.as_deref() {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(AdapterError::MissingId {
                collection: ty.collection_path().to_string(),
            }),
        }
    }
}

#[async_trait]
impl Adapter for ElasticsearchAdapter {
    async fn find(&self, ty: &dyn TypeDescriptor, id: &str) -> Result<Record> {
        validate_non_empty_string("id", id)?;
        let url = self.read_url(ty, Some(id))?;
        tracing::debug!("📡 find {} -> GET {}", id, url);

        let (status, body) = self.send(self.client.get(url)).await?;
        let body = Self::check_status(ty, Some(id), status, body)?;

        let envelope: GetEnvelope = serde_json::from_str(&body)?;
        if envelope.is_missing() {
            return Err(AdapterError::NotFound {
                collection: ty.collection_path().to_string(),
                id: id.to_string(),
            });
        }

        let mut record = envelope.into_record();
        record.id = Some(id.to_string());
        Ok(record)
    }

    async fn find_all(&self, ty: &dyn TypeDescriptor) -> Result<Vec<Record>> {
        let payload = json!({ "size": self.config.find_all_size });
        let records = self.search(ty, &payload).await?;
        tracing::debug!("findAll {}: {} records", ty.collection_path(), records.len());
        Ok(records)
    }

    async fn find_many(&self, ty: &dyn TypeDescriptor, ids: &[String]) -> Result<Vec<Record>> {
        if ids.is_empty() {
            return Err(AdapterError::Validation {
                message: "findMany needs at least one id".to_string(),
            });
        }

        let url = self.read_url(ty, Some("_mget"))?;
        let payload = json!({ "ids": ids });
        tracing::debug!("📡 findMany {:?} -> POST {}", ids, url);

        let (status, body) = self.send(self.client.post(url).json(&payload)).await?;
        let body = Self::check_status(ty, Some("_mget"), status, body)?;
        let envelope: MgetEnvelope = serde_json::from_str(&body)?;

        // 伺服器回傳的順序不一定等於請求順序，依 id 重新排列
        let mut by_id: HashMap<String, Record> = HashMap::new();
        for (position, doc) in envelope.docs.into_iter().enumerate() {
            if doc.is_missing() {
                continue;
            }
            let id = match doc.id.clone() {
                Some(id) => id,
                None => match ids.get(position) {
                    Some(id) => id.clone(),
                    None => continue,
                },
            };
            let mut record = doc.into_record();
            record.id = Some(id.clone());
            by_id.insert(id, record);
        }

        Ok(ids.iter().filter_map(|id| by_id.get(id).cloned()).collect())
    }

    async fn find_query(
        &self,
        ty: &dyn TypeDescriptor,
        query: &Value,
        results: &mut RecordArray,
    ) -> Result<usize> {
        let records = self.search(ty, query).await?;
        Ok(results.load(records))
    }

    async fn create_record(&self, ty: &dyn TypeDescriptor, record: &mut Record) -> Result<()> {
        let id = record.id.clone().filter(|id| !id.is_empty());
        let url = self.write_url(ty, id.as_deref())?;
        tracing::debug!("📡 createRecord {:?} -> POST {}", id, url);

        let (status, body) = self
            .send(self.client.post(url).json(&record.payload()))
            .await?;
        let body = Self::check_status(ty, id.as_deref(), status, body)?;

        match id {
            Some(_) => {
                if let Ok(IndexEnvelope {
                    version: Some(version),
                    ..
                }) = serde_json::from_str::<IndexEnvelope>(&body)
                {
                    record.version = Some(version);
                }
            }
            None => {
                let envelope: IndexEnvelope = serde_json::from_str(&body)?;
                let assigned = envelope
                    .id
                    .filter(|id| !id.is_empty())
                    .ok_or_else(|| <serde_json::Error as serde::de::Error>::missing_field("_id"))?;
                tracing::debug!("elasticsearch assigned id {}", assigned);
                (record.id, record.version) = (Some(assigned), envelope.version);
            }
        }
        Ok(())
    }

    async fn update_record(&self, ty: &dyn TypeDescriptor, record: &Record) -> Result<Option<u64>> {
        let id = Self::require_id(ty, record)?;
        let url = self.write_url(ty, Some(id))?;
        tracing::debug!("📡 updateRecord {} -> PUT {}", id, url);

        let (status, body) = self
            .send(self.client.put(url).json(&record.payload()))
            .await?;
        let body = Self::check_status(ty, Some(id), status, body)?;

        Ok(serde_json::from_str::<IndexEnvelope>(&body)
            .ok()
            .and_then(|envelope| envelope.version))
    }

    async fn delete_record(&self, ty: &dyn TypeDescriptor, record: &Record) -> Result<()> {
        let id = Self::require_id(ty, record)?;
        let url = self.write_url(ty, Some(id))?;
        tracing::debug!("📡 deleteRecord {} -> DELETE {}", id, url);

        let (status, body) = self.send(self.client.delete(url)).await?;
        Self::check_status(ty, Some(id), status, body)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ModelType;
    use crate::utils::error::ErrorCategory;

    fn people() -> ModelType {
        ModelType::new("people/person")
    }

    #[test]
    fn test_new_validates_config() {
        assert!(ElasticsearchAdapter::new(AdapterConfig::default()).is_ok());
        let err = ElasticsearchAdapter::new(AdapterConfig::new("ftp://nope")).err().unwrap();
        assert_eq!(err.category(), ErrorCategory::Config);
    }

    #[test]
    fn test_write_url_honours_refresh() {
        let adapter =
            ElasticsearchAdapter::new(AdapterConfig::default().with_refresh_on_write(true)).unwrap();
        let url = adapter.write_url(&people(), Some("3")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9200/people/person/3?refresh=true");

        let url = adapter.read_url(&people(), Some("3")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9200/people/person/3");
    }

    #[test]
    fn test_check_status_categories() {
        let ty = people();
        let not_found =
            ElasticsearchAdapter::check_status(&ty, Some("1"), StatusCode::NOT_FOUND, String::new());
        assert_eq!(not_found.unwrap_err().category(), ErrorCategory::NotFound);

        let conflict =
            ElasticsearchAdapter::check_status(&ty, Some("1"), StatusCode::CONFLICT, String::new());
        assert_eq!(conflict.unwrap_err().category(), ErrorCategory::Conflict);

        let server = ElasticsearchAdapter::check_status(
            &ty,
            None,
            StatusCode::INTERNAL_SERVER_ERROR,
            "boom".to_string(),
        );
        match server.unwrap_err() {
            AdapterError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let ok = ElasticsearchAdapter::check_status(&ty, None, StatusCode::CREATED, "{}".to_string());
        assert_eq!(ok.unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_missing_id_is_rejected_before_any_request() {
        let adapter = ElasticsearchAdapter::new(AdapterConfig::new("http://127.0.0.1:1")).unwrap();
        let record = Record::from_value(serde_json::json!({"name": "Nobody"}));

        let err = adapter.update_record(&people(), &record).await.unwrap_err();
        assert!(matches!(err, AdapterError::MissingId { .. }));

        let err = adapter.delete_record(&people(), &record).await.unwrap_err();
        assert!(matches!(err, AdapterError::MissingId { .. }));

        let err = adapter.find(&people(), "").await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_find_many_needs_ids() {
        let adapter = ElasticsearchAdapter::new(AdapterConfig::default()).unwrap();
        let err = tokio_test::block_on(adapter.find_many(&people(), &[])).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[tokio::test]
    async fn test_cancelled_token_aborts_requests() {
        let token = CancellationToken::new();
        let adapter = ElasticsearchAdapter::new(AdapterConfig::new("http://127.0.0.1:1"))
            .unwrap()
            .with_cancellation(token.clone());
        token.cancel();

        let err = adapter.find(&people(), "1").await.unwrap_err();
        assert!(matches!(err, AdapterError::Cancelled));
    }
}
