//! Infrastructure layer: stores, configuration, bootstrap data and the
//! application services built on top of them.

pub mod config;
pub mod memory;
pub mod postgres;
pub mod seed;
pub mod services;
pub mod store;

pub use config::{ConfigError, Settings};
pub use memory::InMemoryStore;
pub use postgres::PgStore;
pub use services::{ServiceError, ServiceResult, Services, Stores};
pub use store::{StoreError, StoreResult};
