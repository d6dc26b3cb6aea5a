// twinboard-api: Async Rust client for the building digital-twin REST API

pub mod buildings;
pub mod client;
pub mod error;
pub mod query;
pub mod realtime;
pub mod reports;
pub mod simulation;
pub mod transport;
pub mod types;

pub use client::{ApiClient, RequestOptions};
pub use error::Error;
pub use query::{QueryParams, QueryValue, to_query_string};
pub use realtime::{LinkStatus, RealtimeHandle, ReconnectConfig};
pub use transport::TransportConfig;
