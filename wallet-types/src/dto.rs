//! Data Transfer Objects (DTOs) for requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::{ApiKeyId, Item, Merchant, MerchantId, Money, Transaction, User, Wallet};
use crate::page::{PAGE_SIZE, PageRequest};

// ─────────────────────────────────────────────────────────────────────────────
// User & API key DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Response after registering: the user and their first API key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserResponse {
    pub user: User,
    /// The raw API key (shown only once)
    pub api_key: String,
    pub message: String,
}

/// Request to issue another API key for the current user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateApiKeyRequest {
    pub name: String,
}

/// A freshly issued API key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyResponse {
    pub id: ApiKeyId,
    pub name: String,
    /// The raw API key (shown only once)
    pub api_key: String,
    pub message: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Merchant DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMerchantRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Fields of a merchant that may be changed after creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMerchantRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantList {
    pub merchants: Vec<Merchant>,
    pub page: i64,
    pub page_count: i64,
    pub size_per_page: i64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Item DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Unit price in minor units
    pub price: Money,
    #[serde(default = "default_stock")]
    pub stock: i64,
}

fn default_stock() -> i64 {
    1
}

/// Fields of an item that may be changed after creation.
///
/// Stock is deliberately absent: only purchases move it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateItemRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemList {
    pub items: Vec<Item>,
    pub page: i64,
    pub page_count: i64,
    pub size_per_page: i64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Wallet DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWalletRequest {
    #[serde(default)]
    pub name: Option<String>,
    /// Opening balance in minor units
    #[serde(default = "Money::zero")]
    pub balance: Money,
    /// Binds the wallet to one of the caller's merchants
    #[serde(default)]
    pub merchant_id: Option<MerchantId>,
}

/// Fields of a wallet that may be changed after creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateWalletRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletList {
    pub wallets: Vec<Wallet>,
    pub page: i64,
    pub page_count: i64,
    pub size_per_page: i64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Transaction DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Body of a purchase request. Wallets and item come from the path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransactionRequest {
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

/// Response after a successful purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseResponse {
    pub transaction: Transaction,
    pub status: TransactionStatus,
    /// Buyer wallet balance after the purchase
    pub buyer_balance: Money,
    /// Item stock after the purchase
    pub remaining_stock: i64,
}

/// Status of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionList {
    pub transactions: Vec<Transaction>,
    pub page: i64,
    pub page_count: i64,
    pub size_per_page: i64,
}

// ─────────────────────────────────────────────────────────────────────────────
// List construction
// ─────────────────────────────────────────────────────────────────────────────

macro_rules! impl_page_list {
    ($list:ident, $field:ident, $entity:ty) => {
        impl $list {
            /// Wraps one page of records together with the page count derived
            /// from `total`.
            pub fn new(records: Vec<$entity>, page: PageRequest, total: i64) -> Self {
                Self {
                    $field: records,
                    page: page.page,
                    page_count: PageRequest::page_count(total),
                    size_per_page: PAGE_SIZE,
                }
            }
        }
    };
}

impl_page_list!(MerchantList, merchants, Merchant);
impl_page_list!(ItemList, items, Item);
impl_page_list!(WalletList, wallets, Wallet);
impl_page_list!(TransactionList, transactions, Transaction);
