use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;

use foodorder::api::memory::{ApiCall, Endpoint, InMemoryDataApi};
use foodorder::app::build_app;
use foodorder::order::dto::{CreateSessionRequest, Navigation};
use foodorder::order::engine::SessionStatus;
use foodorder::order::handlers;
use foodorder::order::model::{Extra, ExtraId, FoodId, FoodItem};
use foodorder::state::AppState;

fn menu_item() -> FoodItem {
    FoodItem {
        id: FoodId(2),
        name: "Veggie".into(),
        description: "Macarrão com pimentão, ervilha e ervas finas".into(),
        category: "1".into(),
        price: Decimal::new(2190, 2),
        image_url: "https://example.test/veggie.png".into(),
        thumbnail_url: "https://example.test/veggie_thumb.png".into(),
        extras: vec![
            Extra {
                id: ExtraId(3),
                name: "Queijo".into(),
                value: Decimal::new(150, 2),
                quantity: 0,
            },
            Extra {
                id: ExtraId(4),
                name: "Bacon".into(),
                value: Decimal::new(300, 2),
                quantity: 0,
            },
        ],
        formatted_price: None,
    }
}

fn state() -> (InMemoryDataApi, AppState) {
    let api = InMemoryDataApi::with_foods([menu_item()]);
    (api.clone(), AppState::fake(api))
}

async fn open(state: &AppState, food_id: u64) -> uuid::Uuid {
    let (status, Json(view)) = handlers::create_session(
        State(state.clone()),
        Json(CreateSessionRequest {
            food_id: FoodId(food_id),
        }),
    )
    .await
    .expect("session opens");
    assert_eq!(status, StatusCode::CREATED);
    view.id
}

#[test]
fn router_builds() {
    let (_, state) = state();
    let _app = build_app(state);
}

#[tokio::test]
async fn full_customization_flow() {
    let (api, state) = state();
    let id = open(&state, 2).await;

    let Json(view) = handlers::get_session(State(state.clone()), Path(id))
        .await
        .unwrap();
    assert_eq!(view.status, SessionStatus::Ready);
    assert_eq!(view.formatted_total.as_deref(), Some("R$ 21,90"));
    assert_eq!(
        view.item.as_ref().and_then(|i| i.formatted_price.as_deref()),
        Some("R$ 21,90")
    );
    assert!(!view.favorite);

    handlers::increment_extra(State(state.clone()), Path((id, 3)))
        .await
        .unwrap();
    let Json(view) = handlers::increment_extra(State(state.clone()), Path((id, 4)))
        .await
        .unwrap();
    assert_eq!(view.total, Some(Decimal::new(2640, 2)));

    let Json(view) = handlers::increment_quantity(State(state.clone()), Path(id))
        .await
        .unwrap();
    assert_eq!(view.base_quantity, Some(2));
    assert_eq!(view.formatted_total.as_deref(), Some("R$ 48,30"));

    let Json(view) = handlers::toggle_favorite(State(state.clone()), Path(id))
        .await
        .unwrap();
    assert!(view.favorite);

    let Json(done) = handlers::submit_order(State(state.clone()), Path(id))
        .await
        .unwrap();
    assert_eq!(done.navigate, Navigation::Back);
    assert_eq!(done.order.product_id, FoodId(2));
    assert!(state.sessions.get(id).is_none());

    assert_eq!(api.orders().len(), 1);
    assert_eq!(api.calls().last(), Some(&ApiCall::CreateOrder(FoodId(2))));
}

#[tokio::test]
async fn unknown_extra_and_unknown_session_are_404() {
    let (_, state) = state();
    let id = open(&state, 2).await;

    let err = handlers::decrement_extra(State(state.clone()), Path((id, 99)))
        .await
        .unwrap_err();
    assert_eq!(err.0, StatusCode::NOT_FOUND);

    let err = handlers::get_session(State(state.clone()), Path(uuid::Uuid::new_v4()))
        .await
        .unwrap_err();
    assert_eq!(err.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn failed_load_does_not_keep_a_session() {
    let (api, state) = state();
    api.set_failing(Endpoint::FetchItem, true);

    let err = handlers::create_session(
        State(state.clone()),
        Json(CreateSessionRequest { food_id: FoodId(2) }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.0, StatusCode::BAD_GATEWAY);
    assert!(state.sessions.is_empty());
}

#[tokio::test]
async fn failed_submit_keeps_session_for_retry() {
    let (api, state) = state();
    let id = open(&state, 2).await;
    handlers::increment_extra(State(state.clone()), Path((id, 3)))
        .await
        .unwrap();
    api.set_failing(Endpoint::CreateOrder, true);

    let err = handlers::submit_order(State(state.clone()), Path(id))
        .await
        .unwrap_err();
    assert_eq!(err.0, StatusCode::BAD_GATEWAY);

    let Json(view) = handlers::get_session(State(state.clone()), Path(id))
        .await
        .unwrap();
    assert_eq!(view.status, SessionStatus::Ready);
    assert_eq!(view.extras[0].quantity, 1);

    api.set_failing(Endpoint::CreateOrder, false);
    assert!(handlers::submit_order(State(state.clone()), Path(id))
        .await
        .is_ok());
}

#[tokio::test]
async fn discard_removes_session() {
    let (_, state) = state();
    let id = open(&state, 2).await;

    let status = handlers::discard_session(State(state.clone()), Path(id))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    let err = handlers::discard_session(State(state.clone()), Path(id))
        .await
        .unwrap_err();
    assert_eq!(err.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn favorite_sync_failure_is_bad_gateway() {
    let (api, state) = state();
    let id = open(&state, 2).await;
    api.set_failing(Endpoint::AddFavorite, true);

    let err = handlers::toggle_favorite(State(state.clone()), Path(id))
        .await
        .unwrap_err();
    assert_eq!(err.0, StatusCode::BAD_GATEWAY);

    let Json(view) = handlers::get_session(State(state.clone()), Path(id))
        .await
        .unwrap();
    assert!(!view.favorite);
}

#[tokio::test]
async fn quantity_past_the_largest_total_is_unprocessable() {
    let (api, state) = state();
    let mut banquet = menu_item();
    banquet.id = FoodId(9);
    banquet.price = Decimal::MAX;
    api.insert_food(banquet);

    let id = open(&state, 9).await;
    let err = handlers::increment_quantity(State(state.clone()), Path(id))
        .await
        .unwrap_err();
    assert_eq!(err.0, StatusCode::UNPROCESSABLE_ENTITY);

    let err = handlers::increment_extra(State(state.clone()), Path((id, 3)))
        .await
        .unwrap_err();
    assert_eq!(err.0, StatusCode::UNPROCESSABLE_ENTITY);

    let Json(view) = handlers::get_session(State(state.clone()), Path(id))
        .await
        .unwrap();
    assert_eq!(view.status, SessionStatus::Ready);
    assert_eq!(view.base_quantity, Some(1));
    assert_eq!(view.extras[0].quantity, 0);
    assert_eq!(view.total, Some(Decimal::MAX));
}
