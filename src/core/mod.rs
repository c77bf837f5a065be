pub mod adapter;
pub mod envelope;
pub mod store;
pub mod urls;

pub use crate::domain::model::{Attributes, Record, RecordArray};
pub use crate::domain::ports::{Adapter, ConfigProvider, ModelType, TypeDescriptor};
pub use crate::utils::error::Result;
