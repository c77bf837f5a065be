//! Record store façade driving an [`Adapter`].
//!
//! The store keeps one entry per record, tracks its lifecycle state and
//! pushes pending changes through the adapter on [`Store::commit`]. Every
//! state transition that the adapter completes is published as a
//! [`StoreEvent`] to subscribers.

use crate::core::{Adapter, Attributes, ModelType, Record, RecordArray, TypeDescriptor};
use crate::utils::error::{AdapterError, ErrorCategory, Result};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tokio::sync::{broadcast, RwLock};

const EVENT_CAPACITY: usize = 256;

/// Store-local handle of a record, stable across id assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl ClientId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    /// Requested but nothing arrived.
    Empty,
    Loaded,
    Created,
    Updated,
    Saving,
    Deleted { committed: bool },
    Error(ErrorCategory),
}

impl RecordState {
    pub fn is_loaded(&self) -> bool {
        !matches!(self, RecordState::Empty)
    }

    pub fn is_dirty(&self) -> bool {
        matches!(
            self,
            RecordState::Created
                | RecordState::Updated
                | RecordState::Error(_)
                | RecordState::Deleted { committed: false }
        )
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, RecordState::Deleted { .. })
    }

    pub fn is_saving(&self) -> bool {
        matches!(self, RecordState::Saving)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    DidLoad,
    DidChangeData,
    DidSaveData,
    DidCommit,
    DidDelete,
    BecameError(ErrorCategory),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    pub client_id: ClientId,
    pub collection: String,
    pub id: Option<String>,
    pub event: LifecycleEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Create,
    Update,
    Delete,
}

#[derive(Debug)]
struct Entry {
    collection: String,
    record: Record,
    state: RecordState,
    change: Option<Change>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    entries: BTreeMap<ClientId, Entry>,
    index: HashMap<(String, String), ClientId>,
}

impl Inner {
    fn allocate(&mut self, entry: Entry) -> ClientId {
        self.next_id += 1;
        let client_id = ClientId(self.next_id);
        if let Some(id) = entry.record.id.clone() {
            self.index.insert((entry.collection.clone(), id), client_id);
        }
        self.entries.insert(client_id, entry);
        client_id
    }

    fn entry_mut(&mut self, client_id: ClientId) -> Result<&mut Entry> {
        self.entries
            .get_mut(&client_id)
            .ok_or(AdapterError::UnknownRecord {
                client_id: client_id.0,
            })
    }
}

/// Outcome of a [`Store::commit`].
#[derive(Debug, Default)]
pub struct CommitReport {
    pub committed: Vec<ClientId>,
    pub failed: Vec<(ClientId, AdapterError)>,
}

impl CommitReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// The first failure, if any.
    pub fn into_result(self) -> Result<Vec<ClientId>> {
        match self.failed.into_iter().next() {
            Some((_, err)) => Err(err),
            None => Ok(self.committed),
        }
    }
}

fn collection_key(ty: &dyn TypeDescriptor) -> String {
    ty.collection_path().trim_matches('/').to_string()
}

pub struct Store<A: Adapter> {
    adapter: A,
    inner: RwLock<Inner>,
    events: broadcast::Sender<StoreEvent>,
}

impl<A: Adapter> Store<A> {
    pub fn new(adapter: A) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            adapter,
            inner: RwLock::new(Inner::default()),
            events,
        }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn emit(&self, client_id: ClientId, entry: &Entry, event: LifecycleEvent) {
        tracing::trace!("{} {} {:?}", client_id, entry.collection, event);
        // 沒有訂閱者時 send 會失敗，忽略即可
        let _ = self.events.send(StoreEvent {
            client_id,
            collection: entry.collection.clone(),
            id: entry.record.id.clone(),
            event,
        });
    }

    /// Loads a fetched record. Records with local changes or a deletion are left alone.
    async fn load(&self, collection: &str, record: Record) -> ClientId {
        let mut inner = self.inner.write().await;
        let existing = record
            .id
            .as_ref()
            .and_then(|id| inner.index.get(&(collection.to_string(), id.clone())).copied());

        if let Some(client_id) = existing {
            if let Some(entry) = inner.entries.get_mut(&client_id) {
                if matches!(entry.state, RecordState::Empty | RecordState::Loaded) {
                    entry.record = record;
                    entry.state = RecordState::Loaded;
                    self.emit(client_id, entry, LifecycleEvent::DidLoad);
                }
                return client_id;
            }
        }

        let client_id = inner.allocate(Entry {
            collection: collection.to_string(),
            record,
            state: RecordState::Loaded,
            change: None,
        });
        if let Some(entry) = inner.entries.get(&client_id) {
            self.emit(client_id, entry, LifecycleEvent::DidLoad);
        }
        client_id
    }

    async fn load_many(&self, collection: &str, records: Vec<Record>) -> Vec<ClientId> {
        let mut client_ids = Vec::with_capacity(records.len());
        for record in records {
            client_ids.push(self.load(collection, record).await);
        }
        client_ids
    }

    async fn register_empty(&self, collection: &str, id: &str) -> ClientId {
        let mut inner = self.inner.write().await;
        if let Some(client_id) = inner.index.get(&(collection.to_string(), id.to_string())) {
            return *client_id;
        }
        inner.allocate(Entry {
            collection: collection.to_string(),
            record: Record::with_id(id, Attributes::new()),
            state: RecordState::Empty,
            change: None,
        })
    }

    /// Fetches one record. A failed fetch leaves an `Empty` entry behind.
    pub async fn find(&self, ty: &dyn TypeDescriptor, id: &str) -> Result<ClientId> {
        let collection = collection_key(ty);
        match self.adapter.find(ty, id).await {
            Ok(record) => Ok(self.load(&collection, record).await),
            Err(err) => {
                if err.category() != ErrorCategory::Validation {
                    let client_id = self.register_empty(&collection, id).await;
                    tracing::debug!("find {} {} did not load: {}", collection, client_id, err);
                }
                Err(err)
            }
        }
    }

    pub async fn find_all(&self, ty: &dyn TypeDescriptor) -> Result<Vec<ClientId>> {
        let records = self.adapter.find_all(ty).await?;
        Ok(self.load_many(&collection_key(ty), records).await)
    }

    pub async fn find_many(&self, ty: &dyn TypeDescriptor, ids: &[String]) -> Result<Vec<ClientId>> {
        let records = self.adapter.find_many(ty, ids).await?;
        Ok(self.load_many(&collection_key(ty), records).await)
    }

    pub async fn find_query(&self, ty: &dyn TypeDescriptor, query: Value) -> Result<RecordArray> {
        let mut results = RecordArray::new(query.clone());
        self.adapter.find_query(ty, &query, &mut results).await?;
        self.load_many(&collection_key(ty), results.records().to_vec())
            .await;
        Ok(results)
    }

    /// Registers a new record to be stored on the next commit.
    pub async fn create_record(
        &self,
        ty: &dyn TypeDescriptor,
        attributes: Attributes,
        id: Option<String>,
    ) -> ClientId {
        let record = match id.filter(|id| !id.is_empty()) {
            Some(id) => Record::with_id(id, attributes),
            None => Record::new(attributes),
        };
        let mut inner = self.inner.write().await;
        inner.allocate(Entry {
            collection: collection_key(ty),
            record,
            state: RecordState::Created,
            change: Some(Change::Create),
        })
    }

    pub async fn set_attribute(
        &self,
        client_id: ClientId,
        key: impl Into<String>,
        value: Value,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        let entry = inner.entry_mut(client_id)?;
        let state = entry.state;
        match state {
            RecordState::Loaded => {
                entry.state = RecordState::Updated;
                entry.change = Some(Change::Update);
            }
            RecordState::Created | RecordState::Updated | RecordState::Error(_)
                if entry.change != Some(Change::Delete) => {}
            _ => {
                return Err(AdapterError::Validation {
                    message: format!("record {} cannot be modified while {:?}", client_id, state),
                })
            }
        }
        entry.record.attributes.insert(key.into(), value);
        Ok(())
    }

    pub async fn delete_record(&self, client_id: ClientId) -> Result<()> {
        let mut inner = self.inner.write().await;
        let entry = inner.entry_mut(client_id)?;
        match (entry.state, entry.change) {
            (RecordState::Empty, _) | (RecordState::Saving, _) | (RecordState::Deleted { .. }, _) => {
                Err(AdapterError::Validation {
                    message: format!("record {} cannot be deleted while {:?}", client_id, entry.state),
                })
            }
            // 從未存進引擎的紀錄直接丟棄
            (_, Some(Change::Create)) => {
                entry.state = RecordState::Deleted { committed: true };
                entry.change = None;
                Ok(())
            }
            _ => {
                entry.state = RecordState::Deleted { committed: false };
                entry.change = Some(Change::Delete);
                Ok(())
            }
        }
    }

    /// Pushes every pending change through the adapter, oldest record first.
    pub async fn commit(&self) -> CommitReport {
        let pending: Vec<(ClientId, Change, String, Record)> = {
            let mut inner = self.inner.write().await;
            inner
                .entries
                .iter_mut()
                .filter_map(|(client_id, entry)| {
                    // 取走待處理的變更，同時進行的 commit 不會重送同一筆
                    let change = entry.change.take()?;
                    if change != Change::Delete {
                        entry.state = RecordState::Saving;
                    }
                    Some((*client_id, change, entry.collection.clone(), entry.record.clone()))
                })
                .collect()
        };

        let mut report = CommitReport::default();
        tracing::debug!("Committing {} records", pending.len());

        for (client_id, change, collection, mut record) in pending {
            let ty = ModelType::new(collection.clone());
            let outcome = match change {
                Change::Create => self
                    .adapter
                    .create_record(&ty, &mut record)
                    .await
                    .map(|_| record.version),
                Change::Update => self.adapter.update_record(&ty, &record).await,
                Change::Delete => match self.adapter.delete_record(&ty, &record).await {
                    Err(AdapterError::NotFound { .. }) => {
                        tracing::warn!("{} {} was already gone", collection, client_id);
                        Ok(None)
                    }
                    other => other.map(|_| None),
                },
            };

            let mut inner = self.inner.write().await;
            match outcome {
                Ok(version) => {
                    if let (Change::Create, Some(id)) = (change, record.id.clone()) {
                        inner.index.insert((collection.clone(), id), client_id);
                    }
                    let Ok(entry) = inner.entry_mut(client_id) else {
                        continue;
                    };
                    entry.change = None;
                    match change {
                        Change::Create => {
                            (entry.record.id, entry.record.version) = (record.id, version);
                            entry.state = RecordState::Loaded;
                            self.emit(client_id, entry, LifecycleEvent::DidCommit);
                        }
                        Change::Update => {
                            if version.is_some() {
                                entry.record.version = version;
                            }
                            entry.state = RecordState::Loaded;
                            self.emit(client_id, entry, LifecycleEvent::DidChangeData);
                            self.emit(client_id, entry, LifecycleEvent::DidSaveData);
                            self.emit(client_id, entry, LifecycleEvent::DidCommit);
                        }
                        Change::Delete => {
                            entry.state = RecordState::Deleted { committed: true };
                            self.emit(client_id, entry, LifecycleEvent::DidDelete);
                        }
                    }
                    report.committed.push(client_id);
                }
                Err(err) => {
                    tracing::warn!("❌ Commit of {} {} failed: {}", collection, client_id, err);
                    if let Ok(entry) = inner.entry_mut(client_id) {
                        let category = err.category();
                        entry.change = Some(change);
                        if change != Change::Delete {
                            entry.state = RecordState::Error(category);
                        }
                        self.emit(client_id, entry, LifecycleEvent::BecameError(category));
                    }
                    report.failed.push((client_id, err));
                }
            }
        }

        report
    }

    pub async fn record(&self, client_id: ClientId) -> Option<Record> {
        let inner = self.inner.read().await;
        inner.entries.get(&client_id).map(|e| e.record.clone())
    }

    pub async fn state(&self, client_id: ClientId) -> Option<RecordState> {
        let inner = self.inner.read().await;
        inner.entries.get(&client_id).map(|e| e.state)
    }

    pub async fn lookup(&self, ty: &dyn TypeDescriptor, id: &str) -> Option<ClientId> {
        let inner = self.inner.read().await;
        inner.index.get(&(collection_key(ty), id.to_string())).copied()
    }

    /// State of the record known under `id`, if the store has seen it.
    pub async fn record_state(&self, ty: &dyn TypeDescriptor, id: &str) -> Option<RecordState> {
        let client_id = self.lookup(ty, id).await?;
        self.state(client_id).await
    }

    /// Live records of one collection: loaded and not deleted.
    pub async fn records_of(&self, ty: &dyn TypeDescriptor) -> Vec<(ClientId, Record)> {
        let collection = collection_key(ty);
        let inner = self.inner.read().await;
        inner
            .entries
            .iter()
            .filter(|(_, e)| e.collection == collection && e.state.is_loaded() && !e.state.is_deleted())
            .map(|(client_id, e)| (*client_id, e.record.clone()))
            .collect()
    }
}
