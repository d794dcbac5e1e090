//! PostgreSQL repository adapter.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

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
// PostgreSQL Repository
// ─────────────────────────────────────────────────────────────────────────────

/// PostgreSQL repository with version-guarded writes.
pub struct PostgresRepo {
    pool: PgPool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &PgPool, sql: &str, name: &str) -> Result<(), anyhow::Error> {
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
async fn run_migrations(pool: &PgPool) -> Result<(), anyhow::Error> {
    execute_migration(
        pool,
        include_str!("../migrations/0001_create_tables_pg.sql"),
        "0001",
    )
    .await
}

impl PostgresRepo {
    /// Creates a new PostgreSQL repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl MarketRepository for PostgresRepo {
    async fn create_user(&self, req: RegisterUserRequest) -> Result<User, RepoError> {
        let row: DbUser = sqlx::query_as(
            r#"
            INSERT INTO users (username, email, telephone, first_name, last_name, disabled, registered_at)
            VALUES ($1, $2, $3, $4, $5, FALSE, $6)
            RETURNING id, username, email, telephone, first_name, last_name, disabled, registered_at, last_login_at
            "#,
        )
        .bind(&req.username)
        .bind(&req.email)
        .bind(&req.telephone)
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| insert_err(e, "Username"))?;

        Ok(row.into_domain())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepoError> {
        let row: Option<DbUser> = sqlx::query_as(
            r#"SELECT id, username, email, telephone, first_name, last_name, disabled, registered_at, last_login_at
               FROM users WHERE id = $1"#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(DbUser::into_domain))
    }

    async fn record_login(&self, id: UserId) -> Result<(), RepoError> {
        sqlx::query(r#"UPDATE users SET last_login_at = $1 WHERE id = $2"#)
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

        let row: DbApiKey = sqlx::query_as(
            r#"
            INSERT INTO api_keys (user_id, name, key_hash, is_active, created_at)
            VALUES ($1, $2, $3, TRUE, $4)
            RETURNING id, user_id, name, key_hash, is_active, created_at, last_used_at
            "#,
        )
        .bind(user_id.get())
        .bind(name)
        .bind(&key_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok((row.into_domain(), raw_key))
    }

    async fn verify_api_key_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, RepoError> {
        let row: Option<DbApiKey> = sqlx::query_as(
            r#"
            UPDATE api_keys SET last_used_at = $2
            WHERE key_hash = $1 AND is_active = TRUE
            RETURNING id, user_id, name, key_hash, is_active, created_at, last_used_at
            "#,
        )
        .bind(key_hash)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(DbApiKey::into_domain))
    }

    async fn delete_api_key(&self, user_id: UserId, id: ApiKeyId) -> Result<bool, RepoError> {
        let result =
            sqlx::query(r#"UPDATE api_keys SET is_active = FALSE WHERE id = $1 AND user_id = $2"#)
                .bind(id.get())
                .bind(user_id.get())
                .execute(&self.pool)
                .await
                .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_merchant(&self, merchant: NewMerchant) -> Result<Merchant, RepoError> {
        let row: DbMerchant = sqlx::query_as(
            r#"
            INSERT INTO merchants (user_id, name, description, first_name, last_name, email, telephone, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, name, description, first_name, last_name, email, telephone, created_at
            "#,
        )
        .bind(merchant.user_id.get())
        .bind(&merchant.name)
        .bind(&merchant.description)
        .bind(&merchant.first_name)
        .bind(&merchant.last_name)
        .bind(&merchant.email)
        .bind(&merchant.telephone)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.into_domain())
    }

    async fn get_merchant(&self, id: MerchantId) -> Result<Option<Merchant>, RepoError> {
        let row: Option<DbMerchant> = sqlx::query_as(
            r#"SELECT id, user_id, name, description, first_name, last_name, email, telephone, created_at
               FROM merchants WHERE id = $1"#,
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
               FROM merchants ORDER BY id LIMIT $1 OFFSET $2"#,
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
        let row: Option<DbMerchant> = sqlx::query_as(
            r#"
            UPDATE merchants SET name = $1, description = $2 WHERE id = $3
            RETURNING id, user_id, name, description, first_name, last_name, email, telephone, created_at
            "#,
        )
        .bind(&merchant.name)
        .bind(&merchant.description)
        .bind(merchant.id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(DbMerchant::into_domain).ok_or(RepoError::NotFound)
    }

    async fn delete_merchant(&self, id: MerchantId) -> Result<bool, RepoError> {
        let mut db_tx = self.pool.begin().await.map_err(tx_err)?;

        sqlx::query(r#"DELETE FROM items WHERE merchant_id = $1"#)
            .bind(id.get())
            .execute(&mut *db_tx)
            .await
            .map_err(db_err)?;

        sqlx::query(r#"DELETE FROM wallets WHERE merchant_id = $1"#)
            .bind(id.get())
            .execute(&mut *db_tx)
            .await
            .map_err(db_err)?;

        let result = sqlx::query(r#"DELETE FROM merchants WHERE id = $1"#)
            .bind(id.get())
            .execute(&mut *db_tx)
            .await
            .map_err(db_err)?;

        db_tx.commit().await.map_err(tx_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_item(&self, item: NewItem) -> Result<Item, RepoError> {
        let row: DbItem = sqlx::query_as(
            r#"
            INSERT INTO items (user_id, merchant_id, name, description, price, stock, version, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, 0, $7)
            RETURNING id, user_id, merchant_id, name, description, price, stock, version, created_at
            "#,
        )
        .bind(item.user_id.get())
        .bind(item.merchant_id.get())
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price.amount())
        .bind(item.stock)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        row.into_domain()
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, RepoError> {
        let row: Option<DbItem> = sqlx::query_as(
            r#"SELECT id, user_id, merchant_id, name, description, price, stock, version, created_at
               FROM items WHERE id = $1"#,
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
               FROM items ORDER BY id LIMIT $1 OFFSET $2"#,
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
        let row: Option<DbItem> = sqlx::query_as(
            r#"
            UPDATE items SET name = $1, description = $2, price = $3, version = version + 1
            WHERE id = $4 AND version = $5
            RETURNING id, user_id, merchant_id, name, description, price, stock, version, created_at
            "#,
        )
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price.amount())
        .bind(item.id.get())
        .bind(item.version)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match row {
            Some(row) => row.into_domain(),
            None => Err(stale("Item", item.id.get())),
        }
    }

    async fn delete_item(&self, id: ItemId) -> Result<bool, RepoError> {
        let result = sqlx::query(r#"DELETE FROM items WHERE id = $1"#)
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_wallet(&self, wallet: NewWallet) -> Result<Wallet, RepoError> {
        let row: DbWallet = sqlx::query_as(
            r#"
            INSERT INTO wallets (user_id, merchant_id, name, balance, first_name, last_name, merchant_name, version, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 0, $8)
            RETURNING id, user_id, merchant_id, name, balance, first_name, last_name, merchant_name, version, created_at
            "#,
        )
        .bind(wallet.user_id.get())
        .bind(wallet.merchant_id.map(MerchantId::get))
        .bind(&wallet.name)
        .bind(wallet.balance.amount())
        .bind(&wallet.first_name)
        .bind(&wallet.last_name)
        .bind(&wallet.merchant_name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        row.into_domain()
    }

    async fn get_wallet(&self, id: WalletId) -> Result<Option<Wallet>, RepoError> {
        let row: Option<DbWallet> = sqlx::query_as(
            r#"SELECT id, user_id, merchant_id, name, balance, first_name, last_name, merchant_name, version, created_at
               FROM wallets WHERE id = $1"#,
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
               FROM wallets WHERE user_id = $1 ORDER BY id LIMIT $2 OFFSET $3"#,
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
        sqlx::query_scalar(r#"SELECT COUNT(*) FROM wallets WHERE user_id = $1"#)
            .bind(user_id.get())
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn update_wallet(&self, wallet: &Wallet) -> Result<Wallet, RepoError> {
        let row: Option<DbWallet> = sqlx::query_as(
            r#"
            UPDATE wallets SET name = $1, version = version + 1
            WHERE id = $2 AND version = $3
            RETURNING id, user_id, merchant_id, name, balance, first_name, last_name, merchant_name, version, created_at
            "#,
        )
        .bind(&wallet.name)
        .bind(wallet.id.get())
        .bind(wallet.version)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match row {
            Some(row) => row.into_domain(),
            None => Err(stale("Wallet", wallet.id.get())),
        }
    }

    async fn delete_wallet(&self, id: WalletId) -> Result<bool, RepoError> {
        let result = sqlx::query(r#"DELETE FROM wallets WHERE id = $1"#)
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn commit_purchase(&self, commit: PurchaseCommit) -> Result<Transaction, RepoError> {
        let PurchaseCommit {
            buyer,
            vendor,
            item,
            transaction,
        } = commit;

        let mut db_tx = self.pool.begin().await.map_err(tx_err)?;

        // Version guards: a row that moved since it was read matches nothing
        // and the whole transaction is dropped (rolled back).
        for wallet in [&buyer, &vendor] {
            let result = sqlx::query(
                r#"UPDATE wallets SET balance = $1, version = version + 1 WHERE id = $2 AND version = $3"#,
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
            r#"UPDATE items SET stock = $1, version = version + 1 WHERE id = $2 AND version = $3"#,
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

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO transactions (user_id, wallet_id, vendor_wallet_id, item_id, merchant_id, quantity, total_price, item_name, merchant_name, buyer_name, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            "#,
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
        .fetch_one(&mut *db_tx)
        .await
        .map_err(db_err)?;

        db_tx.commit().await.map_err(tx_err)?;

        Ok(transaction.into_transaction(TransactionId::new(id)))
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, RepoError> {
        let row: Option<DbTransaction> = sqlx::query_as(
            r#"SELECT id, user_id, wallet_id, vendor_wallet_id, item_id, merchant_id, quantity, total_price, item_name, merchant_name, buyer_name, created_at
               FROM transactions WHERE id = $1"#,
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
               FROM transactions WHERE user_id = $1 ORDER BY id LIMIT $2 OFFSET $3"#,
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
        sqlx::query_scalar(r#"SELECT COUNT(*) FROM transactions WHERE user_id = $1"#)
            .bind(user_id.get())
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn delete_transaction(&self, id: TransactionId) -> Result<bool, RepoError> {
        let result = sqlx::query(r#"DELETE FROM transactions WHERE id = $1"#)
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }
}
