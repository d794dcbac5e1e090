//! Database row types shared by the SQLite and PostgreSQL adapters.
//!
//! Ids and amounts are plain `i64` columns and timestamps decode through the
//! sqlx `chrono` integration, so one set of rows serves both backends.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use wallet_types::{
    ApiKey, ApiKeyId, Item, ItemId, Merchant, MerchantId, Money, RepoError, Transaction,
    TransactionId, User, UserId, Wallet, WalletId,
};

// ─────────────────────────────────────────────────────────────────────────────
// Database row structs (derive FromRow for automatic mapping)
// ─────────────────────────────────────────────────────────────────────────────

/// User row from database.
#[derive(FromRow)]
pub struct DbUser {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub disabled: bool,
    pub registered_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// API key row from database.
#[derive(FromRow)]
pub struct DbApiKey {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub key_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

/// Merchant row from database.
#[derive(FromRow)]
pub struct DbMerchant {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Item row from database.
#[derive(FromRow)]
pub struct DbItem {
    pub id: i64,
    pub user_id: i64,
    pub merchant_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub stock: i64,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

/// Wallet row from database.
#[derive(FromRow)]
pub struct DbWallet {
    pub id: i64,
    pub user_id: i64,
    pub merchant_id: Option<i64>,
    pub name: String,
    pub balance: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub merchant_name: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

/// Transaction row from database.
#[derive(FromRow)]
pub struct DbTransaction {
    pub id: i64,
    pub user_id: i64,
    pub wallet_id: i64,
    pub vendor_wallet_id: i64,
    pub item_id: i64,
    pub merchant_id: i64,
    pub quantity: i64,
    pub total_price: i64,
    pub item_name: String,
    pub merchant_name: String,
    pub buyer_name: String,
    pub created_at: DateTime<Utc>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Domain conversion
// ─────────────────────────────────────────────────────────────────────────────

impl DbUser {
    pub fn into_domain(self) -> User {
        User {
            id: UserId::new(self.id),
            username: self.username,
            email: self.email,
            telephone: self.telephone,
            first_name: self.first_name,
            last_name: self.last_name,
            disabled: self.disabled,
            registered_at: self.registered_at,
            last_login_at: self.last_login_at,
        }
    }
}

impl DbApiKey {
    pub fn into_domain(self) -> ApiKey {
        ApiKey {
            id: ApiKeyId::new(self.id),
            user_id: UserId::new(self.user_id),
            name: self.name,
            key_hash: self.key_hash,
            is_active: self.is_active,
            created_at: self.created_at,
            last_used_at: self.last_used_at,
        }
    }
}

impl DbMerchant {
    pub fn into_domain(self) -> Merchant {
        Merchant {
            id: MerchantId::new(self.id),
            user_id: UserId::new(self.user_id),
            name: self.name,
            description: self.description,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            telephone: self.telephone,
            created_at: self.created_at,
        }
    }
}

impl DbItem {
    /// Convert database row to domain Item.
    pub fn into_domain(self) -> Result<Item, RepoError> {
        let price = Money::new(self.price).map_err(RepoError::Domain)?;

        Ok(Item {
            id: ItemId::new(self.id),
            user_id: UserId::new(self.user_id),
            merchant_id: MerchantId::new(self.merchant_id),
            name: self.name,
            description: self.description,
            price,
            stock: self.stock,
            version: self.version,
            created_at: self.created_at,
        })
    }
}

impl DbWallet {
    /// Convert database row to domain Wallet.
    pub fn into_domain(self) -> Result<Wallet, RepoError> {
        let balance = Money::new(self.balance).map_err(RepoError::Domain)?;

        Ok(Wallet {
            id: WalletId::new(self.id),
            user_id: UserId::new(self.user_id),
            merchant_id: self.merchant_id.map(MerchantId::new),
            name: self.name,
            balance,
            first_name: self.first_name,
            last_name: self.last_name,
            merchant_name: self.merchant_name,
            version: self.version,
            created_at: self.created_at,
        })
    }
}

impl DbTransaction {
    /// Convert database row to domain Transaction.
    pub fn into_domain(self) -> Result<Transaction, RepoError> {
        let total_price = Money::new(self.total_price).map_err(RepoError::Domain)?;

        Ok(Transaction {
            id: TransactionId::new(self.id),
            user_id: UserId::new(self.user_id),
            wallet_id: WalletId::new(self.wallet_id),
            vendor_wallet_id: WalletId::new(self.vendor_wallet_id),
            item_id: ItemId::new(self.item_id),
            merchant_id: MerchantId::new(self.merchant_id),
            quantity: self.quantity,
            total_price,
            item_name: self.item_name,
            merchant_name: self.merchant_name,
            buyer_name: self.buyer_name,
            created_at: self.created_at,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Error helpers
// ─────────────────────────────────────────────────────────────────────────────

pub fn db_err(e: sqlx::Error) -> RepoError {
    RepoError::Database(e.to_string())
}

pub fn tx_err(e: sqlx::Error) -> RepoError {
    RepoError::Transaction(e.to_string())
}

/// Maps a unique-constraint violation to `Conflict`, anything else to `Database`.
pub fn insert_err(e: sqlx::Error, what: &str) -> RepoError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepoError::Conflict(format!("{} already exists", what))
        }
        _ => db_err(e),
    }
}

/// Conflict raised when a versioned row moved on between read and write.
pub fn stale(entity: &str, id: i64) -> RepoError {
    RepoError::Conflict(format!("{} {} was modified concurrently", entity, id))
}
