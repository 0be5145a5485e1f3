use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{ApiError, DataApi};
use crate::order::model::{FoodId, FoodItem, OrderRecord};

/// JSON-over-HTTP data API (`foods/:id`, `favorites`, `orders`).
#[derive(Clone)]
pub struct HttpDataApi {
    client: Client,
    base_url: String,
}

impl HttpDataApi {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn checked(url: &str, res: Result<Response, reqwest::Error>) -> Result<Response, ApiError> {
        let res = res.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;
        let status = res.status();
        debug!(%url, %status, "data api response");
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(res)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        let res = Self::checked(&url, self.client.get(&url).send().await)?;
        res.json::<T>()
            .await
            .map_err(|source| ApiError::Decode { url, source })
    }
}

#[async_trait]
impl DataApi for HttpDataApi {
    async fn fetch_item(&self, id: FoodId) -> Result<FoodItem, ApiError> {
        match self.get_json(&format!("foods/{id}")).await {
            Err(ApiError::Status { status: 404, .. }) => Err(ApiError::NotFound(id)),
            other => other,
        }
    }

    async fn fetch_favorites(&self) -> Result<Vec<FoodItem>, ApiError> {
        self.get_json("favorites").await
    }

    async fn add_favorite(&self, item: &FoodItem) -> Result<(), ApiError> {
        let url = self.url("favorites");
        Self::checked(&url, self.client.post(&url).json(item).send().await)?;
        Ok(())
    }

    async fn remove_favorite(&self, id: FoodId) -> Result<(), ApiError> {
        let url = self.url(&format!("favorites/{id}"));
        Self::checked(&url, self.client.delete(&url).send().await)?;
        Ok(())
    }

    async fn create_order(&self, order: &OrderRecord) -> Result<(), ApiError> {
        let url = self.url("orders");
        Self::checked(&url, self.client.post(&url).json(order).send().await)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_base_and_path() {
        let api = HttpDataApi::new("http://localhost:3333/", Duration::from_secs(1)).unwrap();
        assert_eq!(api.url("foods/1"), "http://localhost:3333/foods/1");
        assert_eq!(api.url("/favorites"), "http://localhost:3333/favorites");
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        // bind then drop so the port is known to be free
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let api = HttpDataApi::new(&format!("http://127.0.0.1:{port}"), Duration::from_millis(500))
            .unwrap();
        let err = api.fetch_favorites().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport { .. }));
    }
}
