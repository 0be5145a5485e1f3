use async_trait::async_trait;

use crate::order::model::{FoodId, FoodItem, OrderRecord};

pub mod http;
pub mod memory;

pub use http::HttpDataApi;
pub use memory::InMemoryDataApi;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("food {0} not found")]
    NotFound(FoodId),
    #[error("data api unavailable: {0}")]
    Unavailable(String),
}

/// Read/write access to the remote food store.
#[async_trait]
pub trait DataApi: Send + Sync {
    async fn fetch_item(&self, id: FoodId) -> Result<FoodItem, ApiError>;
    async fn fetch_favorites(&self) -> Result<Vec<FoodItem>, ApiError>;
    async fn add_favorite(&self, item: &FoodItem) -> Result<(), ApiError>;
    async fn remove_favorite(&self, id: FoodId) -> Result<(), ApiError>;
    async fn create_order(&self, order: &OrderRecord) -> Result<(), ApiError>;
}
