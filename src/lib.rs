pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{CliConfig, Command};

pub use app::{Task, TasksController};
pub use config::{toml_config::TomlConfig, AdapterConfig};
pub use crate::core::{
    adapter::ElasticsearchAdapter,
    store::{ClientId, CommitReport, LifecycleEvent, RecordState, Store, StoreEvent},
    Adapter, ModelType, Record, RecordArray, TypeDescriptor,
};
pub use utils::error::{AdapterError, ErrorCategory, Result};
