//! Thin request layer: JSON in, core call, `{success, ...}` envelope out.
//! Mirrors the core's (ok, reason) contract; no core error ever escapes as
//! anything but a structured body.

use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::accounts::Accounts;
use crate::auth::{MemoryTokens, TokenVerifier};
use crate::catalog::Catalog;
use crate::error::{AuthError, OrderError};
use crate::models::{
    AddressChoice, AddressPatch, NewAddress, NewProduct, NewUser, ProductPatch, UserPatch,
    UserRole,
};
use crate::notifications::NotificationHub;
use crate::store::Store;
use crate::OrderEngine;

#[derive(Clone)]
pub struct AppState<S: Store> {
    pub engine: Arc<OrderEngine<S>>,
    pub accounts: Arc<Accounts<S>>,
    pub catalog: Arc<Catalog<S>>,
    pub tokens: Arc<MemoryTokens>,
}

pub fn router<S: Store>(state: AppState<S>) -> Router {
    Router::new()
        .route("/signup", post(signup::<S>))
        .route("/me", get(me::<S>).patch(update_me::<S>))
        .route("/addresses", post(add_address::<S>))
        .route("/addresses/:id", patch(update_address::<S>))
        .route("/products", get(list_products::<S>).post(add_product::<S>))
        .route(
            "/products/:id",
            get(view_product::<S>).patch(update_product::<S>),
        )
        .route("/products/:id/orders", get(product_orders::<S>))
        .route("/categories", post(add_category::<S>))
        .route("/cart", get(view_cart::<S>).post(add_to_cart::<S>))
        .route("/orders/:id/place", post(place_order::<S>))
        .route("/orders/:id/cancel", post(cancel_order::<S>))
        .route("/orders/:id/delivered", post(mark_delivered::<S>))
        .route("/ws", get(order_events::<S>))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub enum ApiError {
    Order(OrderError),
    Unauthorized,
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        Self::Order(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(_: AuthError) -> Self {
        Self::Unauthorized
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Token verification failed.".to_string(),
            ),
            Self::Order(err) => {
                let status = match &err {
                    OrderError::Validation(_) | OrderError::AddressRequired => {
                        StatusCode::BAD_REQUEST
                    }
                    OrderError::UserNotFound
                    | OrderError::OrderNotFound
                    | OrderError::ProductNotFound
                    | OrderError::AddressNotFound
                    | OrderError::NoDefaultAddress
                    | OrderError::CategoryNotFound
                    | OrderError::EmptyCart => StatusCode::NOT_FOUND,
                    OrderError::OutOfStock
                    | OrderError::InsufficientStock { .. }
                    | OrderError::NotInCart
                    | OrderError::CannotCancel
                    | OrderError::NotPlaced
                    | OrderError::Duplicate(_) => StatusCode::CONFLICT,
                    OrderError::PermissionDenied => StatusCode::FORBIDDEN,
                    OrderError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.to_string())
            }
        };
        let body = Json(json!({ "success": false, "message": message }));
        (status, body).into_response()
    }
}

fn ok(data: Value) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

async fn authenticate<S: Store>(
    state: &AppState<S>,
    headers: &HeaderMap,
) -> Result<i32, ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;
    Ok(state.tokens.verify(token).await?)
}

async fn require_admin<S: Store>(state: &AppState<S>, user_id: i32) -> Result<(), ApiError> {
    let user = state.accounts.get_user(user_id).await?;
    if user.role != UserRole::Admin {
        return Err(OrderError::PermissionDenied.into());
    }
    Ok(())
}

async fn signup<S: Store>(
    State(state): State<AppState<S>>,
    Json(new): Json<NewUser>,
) -> Result<Json<Value>, ApiError> {
    let user = state.accounts.create_user(new).await?;
    let token = state.tokens.issue(user.id);
    Ok(ok(json!({ "user_id": user.id, "token": token })))
}

async fn me<S: Store>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let user_id = authenticate(&state, &headers).await?;
    let user = state.accounts.get_user(user_id).await?;
    Ok(ok(json!(user)))
}

async fn update_me<S: Store>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Json(patch): Json<UserPatch>,
) -> Result<Json<Value>, ApiError> {
    let user_id = authenticate(&state, &headers).await?;
    let user = state.accounts.update_user(user_id, patch).await?;
    Ok(ok(json!(user)))
}

async fn add_address<S: Store>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Json(new): Json<NewAddress>,
) -> Result<Json<Value>, ApiError> {
    let user_id = authenticate(&state, &headers).await?;
    let address = state.accounts.create_address(user_id, new).await?;
    Ok(ok(json!(address)))
}

async fn update_address<S: Store>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Path(address_id): Path<i32>,
    Json(patch): Json<AddressPatch>,
) -> Result<Json<Value>, ApiError> {
    let user_id = authenticate(&state, &headers).await?;
    let address = state
        .accounts
        .update_address(user_id, address_id, patch)
        .await?;
    Ok(ok(json!(address)))
}

async fn list_products<S: Store>(
    State(state): State<AppState<S>>,
) -> Result<Json<Value>, ApiError> {
    let products = state.catalog.list_products().await?;
    Ok(ok(json!(products)))
}

async fn view_product<S: Store>(
    State(state): State<AppState<S>>,
    Path(product_id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    let product = state.catalog.get_product(product_id).await?;
    Ok(ok(json!(product)))
}

async fn add_product<S: Store>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Json(new): Json<NewProduct>,
) -> Result<Json<Value>, ApiError> {
    let user_id = authenticate(&state, &headers).await?;
    let product = state.catalog.create_product(user_id, new).await?;
    Ok(ok(json!(product)))
}

async fn update_product<S: Store>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Path(product_id): Path<i32>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<Value>, ApiError> {
    let user_id = authenticate(&state, &headers).await?;
    let product = state
        .catalog
        .update_product(user_id, product_id, patch)
        .await?;
    Ok(ok(json!(product)))
}

async fn product_orders<S: Store>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Path(product_id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    let user_id = authenticate(&state, &headers).await?;
    let rows = state.engine.orders_for_product(user_id, product_id).await?;
    Ok(ok(json!(rows)))
}

#[derive(Deserialize)]
struct CategoryRequest {
    name: String,
}

async fn add_category<S: Store>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Json(req): Json<CategoryRequest>,
) -> Result<Json<Value>, ApiError> {
    let user_id = authenticate(&state, &headers).await?;
    require_admin(&state, user_id).await?;
    let category = state.catalog.create_category(&req.name).await?;
    Ok(ok(json!(category)))
}

#[derive(Deserialize)]
struct AddToCartRequest {
    product_id: i32,
    qty: i32,
}

async fn add_to_cart<S: Store>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Json(req): Json<AddToCartRequest>,
) -> Result<Json<Value>, ApiError> {
    let user_id = authenticate(&state, &headers).await?;
    let update = state
        .engine
        .add_to_cart(user_id, req.product_id, req.qty)
        .await?;
    Ok(ok(json!(update)))
}

async fn view_cart<S: Store>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let user_id = authenticate(&state, &headers).await?;
    let lines = state.engine.cart_items(user_id).await?;
    Ok(ok(json!(lines)))
}

#[derive(Deserialize)]
struct PlaceOrderRequest {
    address_id: Option<i32>,
    #[serde(default)]
    use_default_address: bool,
}

async fn place_order<S: Store>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Path(order_id): Path<i32>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<Json<Value>, ApiError> {
    authenticate(&state, &headers).await?;
    let choice = match (req.address_id, req.use_default_address) {
        (Some(address_id), _) => AddressChoice::Address(address_id),
        (None, true) => AddressChoice::DefaultAddress,
        (None, false) => return Err(OrderError::AddressRequired.into()),
    };
    state.engine.place_order(order_id, choice).await?;
    Ok(ok(json!({ "message": "Order placed successfully." })))
}

async fn cancel_order<S: Store>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Path(order_id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    authenticate(&state, &headers).await?;
    state.engine.cancel_order(order_id).await?;
    Ok(ok(json!({ "message": "Order cancelled successfully." })))
}

async fn mark_delivered<S: Store>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Path(order_id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    let user_id = authenticate(&state, &headers).await?;
    require_admin(&state, user_id).await?;
    state.engine.mark_delivered(order_id).await?;
    Ok(ok(json!({ "message": "Order marked as delivered." })))
}

async fn order_events<S: Store>(
    State(state): State<AppState<S>>,
    ws: WebSocketUpgrade,
) -> Response {
    let sender = state.engine.event_sender();
    ws.on_upgrade(move |socket| NotificationHub::handle_socket(socket, sender))
}
