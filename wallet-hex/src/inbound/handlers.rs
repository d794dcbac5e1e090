//! HTTP request handlers.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use wallet_types::{
    AppError, CreateApiKeyRequest, CreateItemRequest, CreateMerchantRequest,
    CreateTransactionRequest, CreateWalletRequest, MarketRepository, PageRequest,
    RegisterUserRequest, UpdateItemRequest, UpdateMerchantRequest, UpdateWalletRequest,
};

use crate::MarketService;
use crate::access::Identity;
use crate::service::PurchaseOrder;

/// Application state shared across handlers.
pub struct AppState<R: MarketRepository> {
    pub service: MarketService<R>,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::InsufficientStock { .. } | AppError::InsufficientBalance { .. } => {
                (StatusCode::BAD_REQUEST, self.0.to_string())
            }
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "Missing or invalid API key".to_string(),
            ),
            AppError::TransactionFailed => (
                StatusCode::CONFLICT,
                "Transaction failed, no changes were made. Please retry.".to_string(),
            ),
            AppError::DataIntegrity(detail) | AppError::Internal(detail) => {
                tracing::error!(%detail, "request failed with internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error": message,
            "code": status.as_u16()
        });

        (status, Json(body)).into_response()
    }
}

fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid {} ID", what)))
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Users & API keys
// ─────────────────────────────────────────────────────────────────────────────

/// Register a user. Returns the first API key (shown only once).
#[tracing::instrument(skip(state, req), fields(username = %req.username))]
pub async fn register_user<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    Json(req): Json<RegisterUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let registered = state.service.register_user(req).await?;
    Ok((StatusCode::CREATED, Json(registered)))
}

#[tracing::instrument(skip(state))]
pub async fn current_user<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.service.current_user(identity).await?;
    Ok(Json(user))
}

/// Create a new API key for the caller.
#[tracing::instrument(skip(state, req), fields(key_name = %req.name))]
pub async fn create_api_key<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateApiKeyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let key = state.service.create_api_key(identity, req).await?;
    Ok((StatusCode::CREATED, Json(key)))
}

/// Delete (deactivate) an API key.
#[tracing::instrument(skip(state), fields(key_id = %id))]
pub async fn revoke_api_key<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let key_id = parse_id(&id, "API key")?;
    state.service.revoke_api_key(identity, key_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─────────────────────────────────────────────────────────────────────────────
// Merchants
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip(state, req))]
pub async fn create_merchant<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateMerchantRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let merchant = state.service.create_merchant(identity, req).await?;
    Ok((StatusCode::CREATED, Json(merchant)))
}

#[tracing::instrument(skip(state))]
pub async fn list_merchants<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    Query(page): Query<PageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let merchants = state.service.list_merchants(page).await?;
    Ok(Json(merchants))
}

#[tracing::instrument(skip(state), fields(merchant_id = %id))]
pub async fn get_merchant<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let merchant = state.service.get_merchant(parse_id(&id, "merchant")?).await?;
    Ok(Json(merchant))
}

#[tracing::instrument(skip(state, req), fields(merchant_id = %id))]
pub async fn update_merchant<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Json(req): Json<UpdateMerchantRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let merchant_id = parse_id(&id, "merchant")?;
    let merchant = state
        .service
        .update_merchant(identity, merchant_id, req)
        .await?;
    Ok(Json(merchant))
}

#[tracing::instrument(skip(state), fields(merchant_id = %id))]
pub async fn delete_merchant<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let merchant_id = parse_id(&id, "merchant")?;
    state.service.delete_merchant(identity, merchant_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─────────────────────────────────────────────────────────────────────────────
// Items
// ─────────────────────────────────────────────────────────────────────────────

/// Add an item to one of the caller's merchants.
#[tracing::instrument(skip(state, req), fields(merchant_id = %id))]
pub async fn create_item<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Json(req): Json<CreateItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let merchant_id = parse_id(&id, "merchant")?;
    let item = state.service.create_item(identity, merchant_id, req).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[tracing::instrument(skip(state))]
pub async fn list_items<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    Query(page): Query<PageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state.service.list_items(page).await?;
    Ok(Json(items))
}

#[tracing::instrument(skip(state), fields(item_id = %id))]
pub async fn get_item<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state.service.get_item(parse_id(&id, "item")?).await?;
    Ok(Json(item))
}

#[tracing::instrument(skip(state, req), fields(item_id = %id))]
pub async fn update_item<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let item_id = parse_id(&id, "item")?;
    let item = state.service.update_item(identity, item_id, req).await?;
    Ok(Json(item))
}

#[tracing::instrument(skip(state), fields(item_id = %id))]
pub async fn delete_item<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let item_id = parse_id(&id, "item")?;
    state.service.delete_item(identity, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─────────────────────────────────────────────────────────────────────────────
// Wallets
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip(state, req))]
pub async fn create_wallet<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateWalletRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let wallet = state.service.create_wallet(identity, req).await?;
    Ok((StatusCode::CREATED, Json(wallet)))
}

#[tracing::instrument(skip(state))]
pub async fn list_wallets<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    Extension(identity): Extension<Identity>,
    Query(page): Query<PageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let wallets = state.service.list_wallets(identity, page).await?;
    Ok(Json(wallets))
}

#[tracing::instrument(skip(state), fields(wallet_id = %id))]
pub async fn get_wallet<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let wallet_id = parse_id(&id, "wallet")?;
    let wallet = state.service.get_wallet(identity, wallet_id).await?;
    Ok(Json(wallet))
}

#[tracing::instrument(skip(state, req), fields(wallet_id = %id))]
pub async fn update_wallet<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Json(req): Json<UpdateWalletRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let wallet_id = parse_id(&id, "wallet")?;
    let wallet = state.service.update_wallet(identity, wallet_id, req).await?;
    Ok(Json(wallet))
}

#[tracing::instrument(skip(state), fields(wallet_id = %id))]
pub async fn delete_wallet<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let wallet_id = parse_id(&id, "wallet")?;
    state.service.delete_wallet(identity, wallet_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─────────────────────────────────────────────────────────────────────────────
// Transactions
// ─────────────────────────────────────────────────────────────────────────────

/// Buy an item: `/api/transactions/{buyer_wallet_id}/{vendor_wallet_id}/{item_id}`.
#[tracing::instrument(skip(state, req), fields(quantity = req.quantity))]
pub async fn purchase<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    Extension(identity): Extension<Identity>,
    Path((buyer, vendor, item)): Path<(String, String, String)>,
    Json(req): Json<CreateTransactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = PurchaseOrder {
        buyer_wallet_id: parse_id(&buyer, "wallet")?,
        vendor_wallet_id: parse_id(&vendor, "wallet")?,
        item_id: parse_id(&item, "item")?,
        quantity: req.quantity,
    };

    let receipt = state.service.purchase(identity, order).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

#[tracing::instrument(skip(state), fields(transaction_id = %id))]
pub async fn get_transaction<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let transaction_id = parse_id(&id, "transaction")?;
    let transaction = state
        .service
        .get_transaction(identity, transaction_id)
        .await?;
    Ok(Json(transaction))
}

#[tracing::instrument(skip(state), fields(transaction_id = %id))]
pub async fn delete_transaction<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let transaction_id = parse_id(&id, "transaction")?;
    state
        .service
        .delete_transaction(identity, transaction_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List a user's transactions. Callers may only list their own.
#[tracing::instrument(skip(state), fields(user_id = %id))]
pub async fn list_user_transactions<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Query(page): Query<PageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = parse_id(&id, "user")?;
    let transactions = state
        .service
        .list_transactions(identity, user_id, page)
        .await?;
    Ok(Json(transactions))
}
