use crate::config::toml_config::DEFAULT_TASKS_COLLECTION;
use crate::core::store::{ClientId, Store};
use crate::core::{Adapter, Attributes, ModelType, Record};
use crate::utils::error::{AdapterError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: Option<String>,
    pub title: String,
    pub completed: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// 存進引擎的欄位，不含 id
#[derive(Debug, Serialize, Deserialize)]
struct TaskAttributes {
    title: String,
    #[serde(default)]
    completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            completed: false,
            created_at: Some(Utc::now()),
        }
    }

    pub fn from_record(record: &Record) -> Result<Self> {
        let attributes: TaskAttributes =
            serde_json::from_value(Value::Object(record.attributes.clone()))?;
        Ok(Self {
            id: record.id.clone(),
            title: attributes.title,
            completed: attributes.completed,
            created_at: attributes.created_at,
        })
    }

    pub fn attributes(&self) -> Result<Attributes> {
        let value = serde_json::to_value(TaskAttributes {
            title: self.title.clone(),
            completed: self.completed,
            created_at: self.created_at,
        })?;
        match value {
            Value::Object(attributes) => Ok(attributes),
            _ => Ok(Attributes::new()),
        }
    }
}

/// The to-do list: tasks kept in a [`Store`] under one collection.
pub struct TasksController<A: Adapter> {
    store: Store<A>,
    model: ModelType,
}

impl<A: Adapter> TasksController<A> {
    pub fn new(store: Store<A>) -> Self {
        Self::with_collection(store, DEFAULT_TASKS_COLLECTION)
    }

    pub fn with_collection(store: Store<A>, collection: &str) -> Self {
        Self {
            store,
            model: ModelType::new(collection),
        }
    }

    pub fn store(&self) -> &Store<A> {
        &self.store
    }

    /// Pulls every stored task into the store.
    pub async fn load(&self) -> Result<Vec<Task>> {
        self.store.find_all(&self.model).await?;
        self.tasks().await
    }

    /// Blank titles are ignored.
    pub async fn create_task(&self, title: &str) -> Result<Option<Task>> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(None);
        }

        let task = Task::new(title);
        let client_id = self
            .store
            .create_record(&self.model, task.attributes()?, None)
            .await;
        self.store.commit().await.into_result()?;

        let task = self.task(client_id).await?;
        tracing::info!("✅ Created task {:?}: {}", task.id, task.title);
        Ok(Some(task))
    }

    pub async fn complete_task(&self, id: &str, completed: bool) -> Result<Task> {
        let client_id = self.resolve(id).await?;
        self.store
            .set_attribute(client_id, "completed", Value::Bool(completed))
            .await?;
        self.store.commit().await.into_result()?;
        self.task(client_id).await
    }

    pub async fn remove_task(&self, id: &str) -> Result<()> {
        let client_id = self.resolve(id).await?;
        self.store.delete_record(client_id).await?;
        self.store.commit().await.into_result()?;
        tracing::info!("🗑️ Removed task {}", id);
        Ok(())
    }

    /// Tasks currently held by the store, oldest first.
    pub async fn tasks(&self) -> Result<Vec<Task>> {
        let mut tasks = self
            .store
            .records_of(&self.model)
            .await
            .iter()
            .map(|(_, record)| Task::from_record(record))
            .collect::<Result<Vec<_>>>()?;
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(tasks)
    }

    pub async fn remaining(&self) -> Result<Vec<Task>> {
        Ok(self
            .tasks()
            .await?
            .into_iter()
            .filter(|task| !task.completed)
            .collect())
    }

    async fn resolve(&self, id: &str) -> Result<ClientId> {
        match self.store.lookup(&self.model, id).await {
            Some(client_id) if self.is_live(client_id).await => Ok(client_id),
            _ => self.store.find(&self.model, id).await,
        }
    }

    async fn is_live(&self, client_id: ClientId) -> bool {
        self.store
            .state(client_id)
            .await
            .is_some_and(|state| state.is_loaded() && !state.is_deleted())
    }

    async fn task(&self, client_id: ClientId) -> Result<Task> {
        let record = self
            .store
            .record(client_id)
            .await
            .ok_or(AdapterError::UnknownRecord {
                client_id: client_id.as_u64(),
            })?;
        Task::from_record(&record)
    }
}
