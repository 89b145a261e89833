//! HTTP client implementations

pub mod client;
pub mod search_client;

pub use client::HttpClientBuilder;
pub use search_client::{ClusterInfo, ClusterVersion, SearchClient, SearchClientFactory};
