//! Repository port trait.
//!
//! This is the primary port in our hexagonal architecture.
//! Adapters (Postgres, SQLite, in-memory mocks) implement this trait.

use crate::domain::{
    ApiKey, ApiKeyId, Item, ItemId, Merchant, MerchantId, NewItem, NewMerchant, NewWallet,
    PurchaseCommit, Transaction, TransactionId, User, UserId, Wallet, WalletId,
};
use crate::dto::RegisterUserRequest;
use crate::error::RepoError;
use crate::page::PageRequest;

/// The entity store for the wallet service.
///
/// Records are plain values keyed by integer id. `update_item` and
/// `update_wallet` are guarded by the record's `version` and fail with
/// [`RepoError::Conflict`] when it is stale. `commit_purchase` MUST be
/// all-or-nothing.
#[async_trait::async_trait]
pub trait MarketRepository: Send + Sync + 'static {
    // ─────────────────────────────────────────────────────────────────────────────
    // Users & API keys
    // ─────────────────────────────────────────────────────────────────────────────

    /// Creates a user. Duplicate usernames fail with `Conflict`.
    async fn create_user(&self, req: RegisterUserRequest) -> Result<User, RepoError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepoError>;

    /// Stamps `last_login_at` with the current time.
    async fn record_login(&self, id: UserId) -> Result<(), RepoError>;

    /// Issues a new API key for `user_id`, returning the stored key and the
    /// raw key (the only time it is visible).
    async fn create_api_key(
        &self,
        user_id: UserId,
        name: &str,
    ) -> Result<(ApiKey, String), RepoError>;

    /// Finds an active key by hash and records its use.
    async fn verify_api_key_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, RepoError>;

    /// Deactivates a key owned by `user_id`. Returns false if none matched.
    async fn delete_api_key(&self, user_id: UserId, id: ApiKeyId) -> Result<bool, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Merchants
    // ─────────────────────────────────────────────────────────────────────────────

    async fn create_merchant(&self, merchant: NewMerchant) -> Result<Merchant, RepoError>;

    async fn get_merchant(&self, id: MerchantId) -> Result<Option<Merchant>, RepoError>;

    async fn list_merchants(&self, page: PageRequest) -> Result<Vec<Merchant>, RepoError>;

    async fn count_merchants(&self) -> Result<i64, RepoError>;

    async fn update_merchant(&self, merchant: &Merchant) -> Result<Merchant, RepoError>;

    /// Deletes a merchant together with its items and wallets.
    async fn delete_merchant(&self, id: MerchantId) -> Result<bool, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Items
    // ─────────────────────────────────────────────────────────────────────────────

    async fn create_item(&self, item: NewItem) -> Result<Item, RepoError>;

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, RepoError>;

    async fn list_items(&self, page: PageRequest) -> Result<Vec<Item>, RepoError>;

    async fn count_items(&self) -> Result<i64, RepoError>;

    async fn update_item(&self, item: &Item) -> Result<Item, RepoError>;

    async fn delete_item(&self, id: ItemId) -> Result<bool, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Wallets
    // ─────────────────────────────────────────────────────────────────────────────

    async fn create_wallet(&self, wallet: NewWallet) -> Result<Wallet, RepoError>;

    async fn get_wallet(&self, id: WalletId) -> Result<Option<Wallet>, RepoError>;

    async fn list_wallets_for_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Vec<Wallet>, RepoError>;

    async fn count_wallets_for_user(&self, user_id: UserId) -> Result<i64, RepoError>;

    async fn update_wallet(&self, wallet: &Wallet) -> Result<Wallet, RepoError>;

    async fn delete_wallet(&self, id: WalletId) -> Result<bool, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Transactions (commit MUST be atomic)
    // ─────────────────────────────────────────────────────────────────────────────

    /// Writes both wallets, the item and the new transaction as one unit.
    async fn commit_purchase(&self, commit: PurchaseCommit) -> Result<Transaction, RepoError>;

    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, RepoError>;

    async fn list_transactions_for_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Vec<Transaction>, RepoError>;

    async fn count_transactions_for_user(&self, user_id: UserId) -> Result<i64, RepoError>;

    async fn delete_transaction(&self, id: TransactionId) -> Result<bool, RepoError>;
}
