//! Application layer for the TaskFlow client.
//!
//! This crate owns everything with side effects: configuration, the persisted
//! session, HTTP access to the REST API, and the board that keeps the transient
//! task collection in sync with the server.

pub mod account;
pub mod board;
pub mod config;
pub mod error;
pub mod http;
pub mod service;
pub mod session;
pub mod storage;
pub mod task_api;

// Re-exports for convenience
pub use account::{AccountService, UserProfile};
pub use board::{LoadOutcome, LoadStatus, LoadTicket, OptimisticToggle, TaskBoard, TransactionState};
pub use config::{ApiConfig, ClientConfig, SessionConfig};
pub use error::ApiError;
pub use http::ApiClient;
pub use service::BoardService;
pub use session::{Session, SessionContext, SessionEvent, avatar_url};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use task_api::{HttpTaskApi, TaskApi};
