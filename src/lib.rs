//! Data-access layer for a music catalog client
//!
//! `model` holds the records and the HTTP client, `controller` holds the
//! state the screens render from.

pub mod auth;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod model;

pub use auth::{BearerToken, RequestAuthorizer, SharedToken};
pub use config::CatalogConfig;
pub use controller::{CatalogController, PaginatedCollection, SearchAggregator};
pub use error::{CatalogError, Result};
pub use model::CatalogApiClient;
