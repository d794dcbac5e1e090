//! SQLite repository adapter.
#![allow(clippy::collapsible_if)]

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

use wallet_types::{
    ApiKey, ApiKeyId, Item, ItemId, MarketRepository, Merchant, MerchantId, NewItem, NewMerchant,
    NewWallet, PageRequest, PurchaseCommit, RegisterUserRequest, RepoError, Transaction,
    TransactionId, User, UserId, Wallet, WalletId,
};

use crate::security::{generate_api_key, hash_api_key};
use crate::types::{
    DbApiKey, DbItem, DbMerchant, DbTransaction, DbUser, DbWallet, db_err, insert_err, stale,
    tx_err,
};

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation.
pub struct SqliteRepo {
    pool: SqlitePool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &SqlitePool, sql: &str, name: &str) -> anyhow::Result<()> {
    for statement in sql.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration {} failed: {}", name, e))?;
        }
    }
    Ok(())
}

/// Runs all database migrations.
async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    execute_migration(
        pool,
        include_str!("../migrations/0001_create_tables.sql"),
        "0001",
    )
    .await
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

impl SqliteRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            // Remove query parameters
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // Every connection to `:memory:` opens a fresh database, so the pool
        // must hold on to exactly one.
        let pool_options = if is_in_memory(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };

        let pool = pool_options.connect_with(options).await?;
        run_migrations(&pool).await?;

        tracing::debug!(in_memory = is_in_memory(database_url), "sqlite repository ready");
        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl MarketRepository for SqliteRepo {
    // ── Users & API keys ─────────────────────────────────────────────────────

    async fn create_user(&self, req: RegisterUserRequest) -> Result<User, RepoError> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"INSERT INTO users (username, email, telephone, first_name, last_name, disabled, registered_at)
               VALUES (?, ?, ?, ?, ?, 0, ?)"#,
        )
        .bind(&req.username)
        .bind(&req.email)
        .bind(&req.telephone)
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| insert_err(e, "Username"))?;

        Ok(User {
            id: UserId::new(result.last_insert_rowid()),
            username: req.username,
            email: req.email,
            telephone: req.telephone,
            first_name: req.first_name,
            last_name: req.last_name,
            disabled: false,
            registered_at: now,
            last_login_at: None,
        })
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepoError> {
        let row: Option<DbUser> = sqlx::query_as(
            r#"SELECT id, username, email, telephone, first_name, last_name, disabled, registered_at, last_login_at
               FROM users WHERE id = ?"#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(DbUser::into_domain))
    }

    async fn record_login(&self, id: UserId) -> Result<(), RepoError> {
        sqlx::query(r#"UPDATE users SET last_login_at = ? WHERE id = ?"#)
            .bind(Utc::now())
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(())
    }

    async fn create_api_key(
        &self,
        user_id: UserId,
        name: &str,
    ) -> Result<(ApiKey, String), RepoError> {
        let raw_key = generate_api_key();
        let key_hash = hash_api_key(&raw_key);
        let now = Utc::now();

        let result = sqlx::query(
            r#"INSERT INTO api_keys (user_id, name, key_hash, is_active, created_at)
               VALUES (?, ?, ?, 1, ?)"#,
        )
        .bind(user_id.get())
        .bind(name)
        .bind(&key_hash)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let api_key = ApiKey {
            id: ApiKeyId::new(result.last_insert_rowid()),
            user_id,
            name: name.to_string(),
            key_hash,
            is_active: true,
            created_at: now,
            last_used_at: None,
        };

        Ok((api_key, raw_key))
    }

    async fn verify_api_key_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, RepoError> {
        let row: Option<DbApiKey> = sqlx::query_as(
            r#"SELECT id, user_id, name, key_hash, is_active, created_at, last_used_at
               FROM api_keys WHERE key_hash = ? AND is_active = 1"#,
        )
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let now = Utc::now();
        sqlx::query(r#"UPDATE api_keys SET last_used_at = ? WHERE id = ?"#)
            .bind(now)
            .bind(row.id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        let mut api_key = row.into_domain();
        api_key.last_used_at = Some(now);
        Ok(Some(api_key))
    }

    async fn delete_api_key(&self, user_id: UserId, id: ApiKeyId) -> Result<bool, RepoError> {
        let result =
            sqlx::query(r#"UPDATE api_keys SET is_active = 0 WHERE id = ? AND user_id = ?"#)
                .bind(id.get())
                .bind(user_id.get())
                .execute(&self.pool)
                .await
                .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    // ── Merchants ────────────────────────────────────────────────────────────

    async fn create_merchant(&self, merchant: NewMerchant) -> Result<Merchant, RepoError> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"INSERT INTO merchants (user_id, name, description, first_name, last_name, email, telephone, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(merchant.user_id.get())
        .bind(&merchant.name)
        .bind(&merchant.description)
        .bind(&merchant.first_name)
        .bind(&merchant.last_name)
        .bind(&merchant.email)
        .bind(&merchant.telephone)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(Merchant {
            id: MerchantId::new(result.last_insert_rowid()),
            user_id: merchant.user_id,
            name: merchant.name,
            description: merchant.description,
            first_name: merchant.first_name,
            last_name: merchant.last_name,
            email: merchant.email,
            telephone: merchant.telephone,
            created_at: now,
        })
    }

    async fn get_merchant(&self, id: MerchantId) -> Result<Option<Merchant>, RepoError> {
        let row: Option<DbMerchant> = sqlx::query_as(
            r#"SELECT id, user_id, name, description, first_name, last_name, email, telephone, created_at
               FROM merchants WHERE id = ?"#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(DbMerchant::into_domain))
    }

    async fn list_merchants(&self, page: PageRequest) -> Result<Vec<Merchant>, RepoError> {
        let Some(offset) = page.offset() else {
            return Ok(Vec::new());
        };

        let rows: Vec<DbMerchant> = sqlx::query_as(
            r#"SELECT id, user_id, name, description, first_name, last_name, email, telephone, created_at
               FROM merchants ORDER BY id LIMIT ? OFFSET ?"#,
        )
        .bind(page.limit())
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(DbMerchant::into_domain).collect())
    }

    async fn count_merchants(&self) -> Result<i64, RepoError> {
        sqlx::query_scalar(r#"SELECT COUNT(*) FROM merchants"#)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn update_merchant(&self, merchant: &Merchant) -> Result<Merchant, RepoError> {
        let result = sqlx::query(r#"UPDATE merchants SET name = ?, description = ? WHERE id = ?"#)
            .bind(&merchant.name)
            .bind(&merchant.description)
            .bind(merchant.id.get())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(merchant.clone())
    }

    async fn delete_merchant(&self, id: MerchantId) -> Result<bool, RepoError> {
        let mut db_tx = self.pool.begin().await.map_err(tx_err)?;

        sqlx::query(r#"DELETE FROM items WHERE merchant_id = ?"#)
            .bind(id.get())
            .execute(&mut *db_tx)
            .await
            .map_err(db_err)?;

        sqlx::query(r#"DELETE FROM wallets WHERE merchant_id = ?"#)
            .bind(id.get())
            .execute(&mut *db_tx)
            .await
            .map_err(db_err)?;

        let result = sqlx::query(r#"DELETE FROM merchants WHERE id = ?"#)
            .bind(id.get())
            .execute(&mut *db_tx)
            .await
            .map_err(db_err)?;

        db_tx.commit().await.map_err(tx_err)?;

        Ok(result.rows_affected() > 0)
    }

    // ── Items ────────────────────────────────────────────────────────────────

    async fn create_item(&self, item: NewItem) -> Result<Item, RepoError> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"INSERT INTO items (user_id, merchant_id, name, description, price, stock, version, created_at)
               VALUES (?, ?, ?, ?, ?, ?, 0, ?)"#,
        )
        .bind(item.user_id.get())
        .bind(item.merchant_id.get())
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price.amount())
        .bind(item.stock)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(Item {
            id: ItemId::new(result.last_insert_rowid()),
            user_id: item.user_id,
            merchant_id: item.merchant_id,
            name: item.name,
            description: item.description,
            price: item.price,
            stock: item.stock,
            version: 0,
            created_at: now,
        })
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, RepoError> {
        let row: Option<DbItem> = sqlx::query_as(
            r#"SELECT id, user_id, merchant_id, name, description, price, stock, version, created_at
               FROM items WHERE id = ?"#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(DbItem::into_domain).transpose()
    }

    async fn list_items(&self, page: PageRequest) -> Result<Vec<Item>, RepoError> {
        let Some(offset) = page.offset() else {
            return Ok(Vec::new());
        };

        let rows: Vec<DbItem> = sqlx::query_as(
            r#"SELECT id, user_id, merchant_id, name, description, price, stock, version, created_at
               FROM items ORDER BY id LIMIT ? OFFSET ?"#,
        )
        .bind(page.limit())
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(DbItem::into_domain).collect()
    }

    async fn count_items(&self) -> Result<i64, RepoError> {
        sqlx::query_scalar(r#"SELECT COUNT(*) FROM items"#)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn update_item(&self, item: &Item) -> Result<Item, RepoError> {
        let result = sqlx::query(
            r#"UPDATE items SET name = ?, description = ?, price = ?, version = version + 1
               WHERE id = ? AND version = ?"#,
        )
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price.amount())
        .bind(item.id.get())
        .bind(item.version)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(stale("Item", item.id.get()));
        }

        Ok(Item {
            version: item.version + 1,
            ..item.clone()
        })
    }

    async fn delete_item(&self, id: ItemId) -> Result<bool, RepoError> {
        let result = sqlx::query(r#"DELETE FROM items WHERE id = ?"#)
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    // ── Wallets ──────────────────────────────────────────────────────────────

    async fn create_wallet(&self, wallet: NewWallet) -> Result<Wallet, RepoError> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"INSERT INTO wallets (user_id, merchant_id, name, balance, first_name, last_name, merchant_name, version, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?)"#,
        )
        .bind(wallet.user_id.get())
        .bind(wallet.merchant_id.map(MerchantId::get))
        .bind(&wallet.name)
        .bind(wallet.balance.amount())
        .bind(&wallet.first_name)
        .bind(&wallet.last_name)
        .bind(&wallet.merchant_name)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(Wallet {
            id: WalletId::new(result.last_insert_rowid()),
            user_id: wallet.user_id,
            merchant_id: wallet.merchant_id,
            name: wallet.name,
            balance: wallet.balance,
            first_name: wallet.first_name,
            last_name: wallet.last_name,
            merchant_name: wallet.merchant_name,
            version: 0,
            created_at: now,
        })
    }

    async fn get_wallet(&self, id: WalletId) -> Result<Option<Wallet>, RepoError> {
        let row: Option<DbWallet> = sqlx::query_as(
            r#"SELECT id, user_id, merchant_id, name, balance, first_name, last_name, merchant_name, version, created_at
               FROM wallets WHERE id = ?"#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(DbWallet::into_domain).transpose()
    }

    async fn list_wallets_for_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Vec<Wallet>, RepoError> {
        let Some(offset) = page.offset() else {
            return Ok(Vec::new());
        };

        let rows: Vec<DbWallet> = sqlx::query_as(
            r#"SELECT id, user_id, merchant_id, name, balance, first_name, last_name, merchant_name, version, created_at
               FROM wallets WHERE user_id = ? ORDER BY id LIMIT ? OFFSET ?"#,
        )
        .bind(user_id.get())
        .bind(page.limit())
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(DbWallet::into_domain).collect()
    }

    async fn count_wallets_for_user(&self, user_id: UserId) -> Result<i64, RepoError> {
        sqlx::query_scalar(r#"SELECT COUNT(*) FROM wallets WHERE user_id = ?"#)
            .bind(user_id.get())
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn update_wallet(&self, wallet: &Wallet) -> Result<Wallet, RepoError> {
        let result = sqlx::query(
            r#"UPDATE wallets SET name = ?, version = version + 1 WHERE id = ? AND version = ?"#,
        )
        .bind(&wallet.name)
        .bind(wallet.id.get())
        .bind(wallet.version)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(stale("Wallet", wallet.id.get()));
        }

        Ok(Wallet {
            version: wallet.version + 1,
            ..wallet.clone()
        })
    }

    async fn delete_wallet(&self, id: WalletId) -> Result<bool, RepoError> {
        let result = sqlx::query(r#"DELETE FROM wallets WHERE id = ?"#)
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    // ── Transactions ─────────────────────────────────────────────────────────

    async fn commit_purchase(&self, commit: PurchaseCommit) -> Result<Transaction, RepoError> {
        let PurchaseCommit {
            buyer,
            vendor,
            item,
            transaction,
        } = commit;

        let mut db_tx = self.pool.begin().await.map_err(tx_err)?;

        // Dropping `db_tx` on any early return rolls everything back.
        for wallet in [&buyer, &vendor] {
            let result = sqlx::query(
                r#"UPDATE wallets SET balance = ?, version = version + 1 WHERE id = ? AND version = ?"#,
            )
            .bind(wallet.balance.amount())
            .bind(wallet.id.get())
            .bind(wallet.version)
            .execute(&mut *db_tx)
            .await
            .map_err(db_err)?;

            if result.rows_affected() == 0 {
                return Err(stale("Wallet", wallet.id.get()));
            }
        }

        let result = sqlx::query(
            r#"UPDATE items SET stock = ?, version = version + 1 WHERE id = ? AND version = ?"#,
        )
        .bind(item.stock)
        .bind(item.id.get())
        .bind(item.version)
        .execute(&mut *db_tx)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(stale("Item", item.id.get()));
        }

        let result = sqlx::query(
            r#"INSERT INTO transactions (user_id, wallet_id, vendor_wallet_id, item_id, merchant_id, quantity, total_price, item_name, merchant_name, buyer_name, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(transaction.user_id.get())
        .bind(transaction.wallet_id.get())
        .bind(transaction.vendor_wallet_id.get())
        .bind(transaction.item_id.get())
        .bind(transaction.merchant_id.get())
        .bind(transaction.quantity)
        .bind(transaction.total_price.amount())
        .bind(&transaction.item_name)
        .bind(&transaction.merchant_name)
        .bind(&transaction.buyer_name)
        .bind(transaction.created_at)
        .execute(&mut *db_tx)
        .await
        .map_err(db_err)?;

        let id = TransactionId::new(result.last_insert_rowid());

        db_tx.commit().await.map_err(tx_err)?;

        Ok(transaction.into_transaction(id))
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, RepoError> {
        let row: Option<DbTransaction> = sqlx::query_as(
            r#"SELECT id, user_id, wallet_id, vendor_wallet_id, item_id, merchant_id, quantity, total_price, item_name, merchant_name, buyer_name, created_at
               FROM transactions WHERE id = ?"#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(DbTransaction::into_domain).transpose()
    }

    async fn list_transactions_for_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Vec<Transaction>, RepoError> {
        let Some(offset) = page.offset() else {
            return Ok(Vec::new());
        };

        let rows: Vec<DbTransaction> = sqlx::query_as(
            r#"SELECT id, user_id, wallet_id, vendor_wallet_id, item_id, merchant_id, quantity, total_price, item_name, merchant_name, buyer_name, created_at
               FROM transactions WHERE user_id = ? ORDER BY id LIMIT ? OFFSET ?"#,
        )
        .bind(user_id.get())
        .bind(page.limit())
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(DbTransaction::into_domain).collect()
    }

    async fn count_transactions_for_user(&self, user_id: UserId) -> Result<i64, RepoError> {
        sqlx::query_scalar(r#"SELECT COUNT(*) FROM transactions WHERE user_id = ?"#)
            .bind(user_id.get())
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn delete_transaction(&self, id: TransactionId) -> Result<bool, RepoError> {
        let result = sqlx::query(r#"DELETE FROM transactions WHERE id = ?"#)
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }
}
