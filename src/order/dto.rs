use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::engine::{EngineSnapshot, SessionStatus};
use super::model::{Extra, FoodId, FoodItem, OrderRecord};

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub food_id: FoodId,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub status: SessionStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub opened_at: OffsetDateTime,
    pub item: Option<FoodItem>,
    pub extras: Vec<Extra>,
    pub base_quantity: Option<u32>,
    pub favorite: bool,
    pub total: Option<Decimal>,
    pub formatted_total: Option<String>,
}

impl SessionView {
    pub fn new(id: Uuid, opened_at: OffsetDateTime, snap: EngineSnapshot) -> Self {
        let (item, extras, base_quantity, favorite) = match snap.session {
            Some(s) => (
                Some(s.item().clone()),
                s.extras().to_vec(),
                Some(s.base_quantity()),
                s.is_favorite(),
            ),
            None => (None, Vec::new(), None, false),
        };
        Self {
            id,
            status: snap.status,
            opened_at,
            item,
            extras,
            base_quantity,
            favorite,
            total: snap.total,
            formatted_total: snap.formatted_total,
        }
    }
}

/// Tells the client where to go after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Navigation {
    Back,
}

#[derive(Debug, Serialize)]
pub struct SubmitOrderResponse {
    pub order: OrderRecord,
    pub navigate: Navigation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_serializes_without_item() {
        let view = SessionView::new(
            Uuid::nil(),
            OffsetDateTime::UNIX_EPOCH,
            EngineSnapshot {
                status: SessionStatus::Loading,
                session: None,
                total: None,
                formatted_total: None,
            },
        );
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "loading");
        assert_eq!(json["opened_at"], "1970-01-01T00:00:00Z");
        assert!(json["item"].is_null());
        assert_eq!(json["extras"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn navigation_is_lowercase() {
        assert_eq!(serde_json::to_value(Navigation::Back).unwrap(), "back");
    }
}
