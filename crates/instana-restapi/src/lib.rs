//! rest payloads and facets for the instana api.

pub mod api;
pub mod client;
pub mod error;
pub mod models;
pub mod resource;

pub use api::{InstanaApi, InstanaClient};
pub use client::{ClientConfig, RestClient};
pub use error::RestError;
pub use resource::{
    DefaultRestResource, InstanaDataObject, ReadOnlyResource, ReadOnlyRestResource, RestResource,
    UpsertMode,
};
