use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use super::{ApiError, DataApi};
use crate::order::model::{FoodId, FoodItem, OrderRecord};

/// One request issued against [`InMemoryDataApi`].
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    FetchItem(FoodId),
    FetchFavorites,
    AddFavorite(FoodId),
    RemoveFavorite(FoodId),
    CreateOrder(FoodId),
}

/// Which endpoint a failure is injected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    FetchItem,
    FetchFavorites,
    AddFavorite,
    RemoveFavorite,
    CreateOrder,
}

#[derive(Default)]
struct Store {
    foods: BTreeMap<FoodId, FoodItem>,
    favorites: Vec<FoodItem>,
    orders: Vec<OrderRecord>,
    calls: Vec<ApiCall>,
    failing: HashSet<Endpoint>,
}

/// Data API kept in process memory. Records every call and can be told to
/// fail or stall specific endpoints.
#[derive(Clone, Default)]
pub struct InMemoryDataApi {
    store: Arc<Mutex<Store>>,
    gate: Arc<Mutex<Option<Arc<Semaphore>>>>,
}

impl InMemoryDataApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_foods(foods: impl IntoIterator<Item = FoodItem>) -> Self {
        let api = Self::new();
        {
            let mut store = api.store();
            for food in foods {
                store.foods.insert(food.id, food);
            }
        }
        api
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert_food(&self, food: FoodItem) {
        self.store().foods.insert(food.id, food);
    }

    pub fn insert_favorite(&self, food: FoodItem) {
        self.store().favorites.push(food);
    }

    pub fn set_failing(&self, endpoint: Endpoint, failing: bool) {
        let mut store = self.store();
        if failing {
            store.failing.insert(endpoint);
        } else {
            store.failing.remove(&endpoint);
        }
    }

    /// Every call waits for a permit on `gate` before answering; `None`
    /// lets calls through immediately.
    pub fn set_gate(&self, gate: Option<Arc<Semaphore>>) {
        *self.gate.lock().unwrap_or_else(PoisonError::into_inner) = gate;
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.store().calls.clone()
    }

    pub fn favorites(&self) -> Vec<FoodItem> {
        self.store().favorites.clone()
    }

    pub fn orders(&self) -> Vec<OrderRecord> {
        self.store().orders.clone()
    }

    async fn enter(&self, call: ApiCall, endpoint: Endpoint) -> Result<(), ApiError> {
        self.store().calls.push(call);
        let gate = self
            .gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(gate) = gate {
            gate.acquire()
                .await
                .map_err(|_| ApiError::Unavailable("gate closed".into()))?
                .forget();
        }
        if self.store().failing.contains(&endpoint) {
            return Err(ApiError::Unavailable(format!("{endpoint:?} is failing")));
        }
        Ok(())
    }
}

#[async_trait]
impl DataApi for InMemoryDataApi {
    async fn fetch_item(&self, id: FoodId) -> Result<FoodItem, ApiError> {
        self.enter(ApiCall::FetchItem(id), Endpoint::FetchItem).await?;
        self.store()
            .foods
            .get(&id)
            .cloned()
            .ok_or(ApiError::NotFound(id))
    }

    async fn fetch_favorites(&self) -> Result<Vec<FoodItem>, ApiError> {
        self.enter(ApiCall::FetchFavorites, Endpoint::FetchFavorites)
            .await?;
        Ok(self.store().favorites.clone())
    }

    async fn add_favorite(&self, item: &FoodItem) -> Result<(), ApiError> {
        self.enter(ApiCall::AddFavorite(item.id), Endpoint::AddFavorite)
            .await?;
        self.store().favorites.push(item.clone());
        Ok(())
    }

    async fn remove_favorite(&self, id: FoodId) -> Result<(), ApiError> {
        self.enter(ApiCall::RemoveFavorite(id), Endpoint::RemoveFavorite)
            .await?;
        self.store().favorites.retain(|f| f.id != id);
        Ok(())
    }

    async fn create_order(&self, order: &OrderRecord) -> Result<(), ApiError> {
        self.enter(ApiCall::CreateOrder(order.product_id), Endpoint::CreateOrder)
            .await?;
        self.store().orders.push(order.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn food(id: u64) -> FoodItem {
        FoodItem {
            id: FoodId(id),
            name: format!("food-{id}"),
            description: String::new(),
            category: "1".into(),
            price: Decimal::TEN,
            image_url: String::new(),
            thumbnail_url: String::new(),
            extras: vec![],
            formatted_price: None,
        }
    }

    #[tokio::test]
    async fn serves_seeded_foods_and_reports_missing() {
        let api = InMemoryDataApi::with_foods([food(1)]);
        assert_eq!(api.fetch_item(FoodId(1)).await.unwrap().name, "food-1");
        let err = api.fetch_item(FoodId(2)).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(FoodId(2))));
        assert_eq!(
            api.calls(),
            vec![ApiCall::FetchItem(FoodId(1)), ApiCall::FetchItem(FoodId(2))]
        );
    }

    #[tokio::test]
    async fn favorites_add_and_remove() {
        let api = InMemoryDataApi::new();
        api.add_favorite(&food(4)).await.unwrap();
        assert_eq!(api.fetch_favorites().await.unwrap().len(), 1);
        api.remove_favorite(FoodId(4)).await.unwrap();
        assert!(api.favorites().is_empty());
    }

    #[tokio::test]
    async fn injected_failures_still_record_the_call() {
        let api = InMemoryDataApi::new();
        api.set_failing(Endpoint::FetchFavorites, true);
        assert!(matches!(
            api.fetch_favorites().await,
            Err(ApiError::Unavailable(_))
        ));
        api.set_failing(Endpoint::FetchFavorites, false);
        assert!(api.fetch_favorites().await.is_ok());
        assert_eq!(api.calls().len(), 2);
    }
}
