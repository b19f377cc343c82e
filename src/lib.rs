pub mod app;
pub mod cli;
pub mod config;
pub mod filter;
pub mod highlight;
pub mod list;
pub mod storage;
pub mod ui;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use list::ShoppingList;
pub use storage::{ItemRepository, KeyValueStore, MemoryStore, StorageHandle, StoreError};
