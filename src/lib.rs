//! ShelfDB: authors and books kept in memory and mirrored to a JSON file.
//!
//! Every mutation rewrites the whole backing file before it returns.

pub mod backend;
pub mod cli;
pub mod command;
pub mod config;
pub mod encoding;
pub mod entity;
pub mod store;

pub use backend::{Backend, FileBackend};
pub use config::{Config, LogConfig, UpdatePolicy};
pub use entity::{Entity, Kind, Patch};
pub use store::{Collection, Store, StoreError, StoreResult};
