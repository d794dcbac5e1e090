//! Purchases and the transaction log.

use wallet_types::{
    AppError, ItemId, MarketRepository, PageRequest, PurchaseCommit, PurchaseResponse,
    Transaction, TransactionId, TransactionList, TransactionStatus, UserId, WalletId,
};

use super::{MarketService, integrity_fault};
use crate::access::Identity;

/// A purchase as addressed by the caller.
#[derive(Debug, Clone, Copy)]
pub struct PurchaseOrder {
    pub buyer_wallet_id: WalletId,
    pub vendor_wallet_id: WalletId,
    pub item_id: ItemId,
    pub quantity: i64,
}

impl<R: MarketRepository> MarketService<R> {
    // ─────────────────────────────────────────────────────────────────────────────
    // Purchase
    // ─────────────────────────────────────────────────────────────────────────────

    /// Buys `quantity` units of an item, paying from the caller's wallet into
    /// a wallet bound to the item's merchant.
    ///
    /// All rule checks happen before any write, stock before balance. The
    /// debit, credit, stock decrement and the new transaction record are then
    /// committed as one unit guarded by the versions read here; a concurrent
    /// change to any of them fails the purchase with `TransactionFailed`.
    ///
    /// Repeating the same request creates a second transaction.
    #[tracing::instrument(
        skip(self),
        fields(
            buyer_wallet = %order.buyer_wallet_id,
            vendor_wallet = %order.vendor_wallet_id,
            item = %order.item_id,
            quantity = order.quantity,
        )
    )]
    pub async fn purchase(
        &self,
        identity: Identity,
        order: PurchaseOrder,
    ) -> Result<PurchaseResponse, AppError> {
        let user_id = identity.require()?;

        if order.quantity < 1 {
            return Err(AppError::BadRequest("Quantity must be at least 1".into()));
        }
        if order.buyer_wallet_id == order.vendor_wallet_id {
            return Err(AppError::BadRequest(
                "Buyer and vendor wallets must differ".into(),
            ));
        }

        let buyer_wallet = self
            .repo
            .get_wallet(order.buyer_wallet_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Wallet {}", order.buyer_wallet_id)))?;
        identity.require_owner(buyer_wallet.user_id, "wallet")?;

        let item = self
            .repo
            .get_item(order.item_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item {}", order.item_id)))?;

        let merchant = self
            .repo
            .get_merchant(item.merchant_id)
            .await?
            .ok_or_else(|| {
                integrity_fault(format!(
                    "item {} references missing merchant {}",
                    item.id, item.merchant_id
                ))
            })?;

        let vendor_wallet = self
            .repo
            .get_wallet(order.vendor_wallet_id)
            .await?
            .ok_or_else(|| {
                integrity_fault(format!("vendor wallet {} is missing", order.vendor_wallet_id))
            })?;
        if vendor_wallet.merchant_id != Some(item.merchant_id) {
            return Err(AppError::BadRequest(format!(
                "Wallet {} is not a wallet of merchant {}",
                vendor_wallet.id, item.merchant_id
            )));
        }

        let buyer = self.load_requester(user_id).await?;

        let commit = PurchaseCommit::plan(
            &buyer,
            buyer_wallet,
            vendor_wallet,
            item,
            &merchant,
            order.quantity,
        )?;

        let buyer_balance = commit.buyer.balance;
        let remaining_stock = commit.item.stock;

        let transaction = self.repo.commit_purchase(commit).await.map_err(|e| {
            tracing::warn!(error = %e, "purchase commit failed, nothing was written");
            AppError::TransactionFailed
        })?;

        tracing::info!(
            transaction_id = %transaction.id,
            total_price = %transaction.total_price,
            "purchase committed"
        );

        Ok(PurchaseResponse {
            transaction,
            status: TransactionStatus::Success,
            buyer_balance,
            remaining_stock,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Transaction log
    // ─────────────────────────────────────────────────────────────────────────────

    /// Gets a transaction by ID.
    ///
    /// Any authenticated caller may read any transaction; unlike
    /// [`list_transactions`](Self::list_transactions) there is no ownership
    /// filter.
    pub async fn get_transaction(
        &self,
        identity: Identity,
        id: TransactionId,
    ) -> Result<Transaction, AppError> {
        identity.require()?;
        self.find_transaction(id).await
    }

    /// Lists one page of a user's purchases. Callers may only list their own.
    pub async fn list_transactions(
        &self,
        identity: Identity,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<TransactionList, AppError> {
        identity.require_owner(user_id, "transaction history")?;

        let transactions = self.repo.list_transactions_for_user(user_id, page).await?;
        let total = self.repo.count_transactions_for_user(user_id).await?;
        Ok(TransactionList::new(transactions, page, total))
    }

    /// Removes a transaction record the caller owns.
    ///
    /// Balances and stock are left as they are.
    #[tracing::instrument(skip(self))]
    pub async fn delete_transaction(
        &self,
        identity: Identity,
        id: TransactionId,
    ) -> Result<(), AppError> {
        identity.require()?;
        let transaction = self.find_transaction(id).await?;
        identity.require_owner(transaction.user_id, "transaction")?;

        if !self.repo.delete_transaction(id).await? {
            return Err(AppError::NotFound(format!("Transaction {}", id)));
        }
        Ok(())
    }

    async fn find_transaction(&self, id: TransactionId) -> Result<Transaction, AppError> {
        self.repo
            .get_transaction(id)
            .await
            .map_err(Into::into)
            .and_then(|opt| opt.ok_or_else(|| AppError::NotFound(format!("Transaction {}", id))))
    }
}
