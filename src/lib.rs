//! Data-synchronization layer for an IT asset management dashboard.
//!
//! [`api`] speaks the backend's REST contract, [`cache`] keeps query results
//! keyed, coalesced and time-aware, and [`resources`] binds the two per
//! entity. A [`Session`] wires them together from a [`Config`].

pub mod api;
pub mod cache;
pub mod config;
pub mod logging;
pub mod resources;
pub mod retry;
pub mod session;

pub use api::{ApiClient, ApiError};
pub use cache::{QueryCache, QueryKey};
pub use config::Config;
pub use retry::RetryPolicy;
pub use session::Session;
