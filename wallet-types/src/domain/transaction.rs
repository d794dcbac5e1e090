//! Transaction domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ItemId, MerchantId, TransactionId, UserId, WalletId};
use super::item::Item;
use super::merchant::Merchant;
use super::money::Money;
use super::user::User;
use super::wallet::Wallet;
use crate::error::DomainError;

/// A recorded purchase.
///
/// Transactions are immutable once created - `total_price` and the display
/// names are frozen at purchase time and never follow later changes to the
/// item, merchant or buyer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// Buyer
    pub user_id: UserId,
    /// Buyer wallet
    pub wallet_id: WalletId,
    pub vendor_wallet_id: WalletId,
    pub item_id: ItemId,
    pub merchant_id: MerchantId,
    pub quantity: i64,
    pub total_price: Money,
    pub item_name: String,
    pub merchant_name: String,
    pub buyer_name: String,
    pub created_at: DateTime<Utc>,
}

/// A transaction that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub user_id: UserId,
    pub wallet_id: WalletId,
    pub vendor_wallet_id: WalletId,
    pub item_id: ItemId,
    pub merchant_id: MerchantId,
    pub quantity: i64,
    pub total_price: Money,
    pub item_name: String,
    pub merchant_name: String,
    pub buyer_name: String,
    pub created_at: DateTime<Utc>,
}

impl NewTransaction {
    /// Attaches the id assigned by the store.
    pub fn into_transaction(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            user_id: self.user_id,
            wallet_id: self.wallet_id,
            vendor_wallet_id: self.vendor_wallet_id,
            item_id: self.item_id,
            merchant_id: self.merchant_id,
            quantity: self.quantity,
            total_price: self.total_price,
            item_name: self.item_name,
            merchant_name: self.merchant_name,
            buyer_name: self.buyer_name,
            created_at: self.created_at,
        }
    }
}

/// Every write a purchase performs, committed by the store as one unit.
///
/// `buyer`, `vendor` and `item` carry the balance/stock values to persist and
/// the `version` they were read at. The store must reject the whole commit if
/// any of the three has moved on since.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseCommit {
    pub buyer: Wallet,
    pub vendor: Wallet,
    pub item: Item,
    pub transaction: NewTransaction,
}

impl PurchaseCommit {
    /// Applies the purchase rules to freshly loaded records.
    ///
    /// Checks run in a fixed order: stock first, then balance. Nothing here
    /// touches storage.
    pub fn plan(
        buyer_user: &User,
        buyer: Wallet,
        vendor: Wallet,
        item: Item,
        merchant: &Merchant,
        quantity: i64,
    ) -> Result<Self, DomainError> {
        let unit_price = item.price;
        let item = item.reserve_stock(quantity)?;
        let total_price = unit_price.checked_mul(quantity)?;
        let buyer = buyer.debit(total_price)?;
        let vendor = vendor.credit(total_price)?;

        let transaction = NewTransaction {
            user_id: buyer_user.id,
            wallet_id: buyer.id,
            vendor_wallet_id: vendor.id,
            item_id: item.id,
            merchant_id: merchant.id,
            quantity,
            total_price,
            item_name: item.name.clone(),
            merchant_name: merchant.name.clone(),
            buyer_name: buyer_user.full_name(),
            created_at: Utc::now(),
        };

        Ok(Self {
            buyer,
            vendor,
            item,
            transaction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buyer_user() -> User {
        User {
            id: UserId::new(1),
            username: "buyer".into(),
            email: None,
            telephone: None,
            first_name: Some("Bob".into()),
            last_name: Some("Buyer".into()),
            disabled: false,
            registered_at: Utc::now(),
            last_login_at: None,
        }
    }

    fn wallet(id: i64, user_id: i64, balance: i64) -> Wallet {
        Wallet {
            id: WalletId::new(id),
            user_id: UserId::new(user_id),
            merchant_id: None,
            name: "Wallet".into(),
            balance: Money::new(balance).unwrap(),
            first_name: None,
            last_name: None,
            merchant_name: None,
            version: 2,
            created_at: Utc::now(),
        }
    }

    fn merchant() -> Merchant {
        Merchant {
            id: MerchantId::new(5),
            user_id: UserId::new(2),
            name: "Shop".into(),
            description: None,
            first_name: None,
            last_name: None,
            email: None,
            telephone: None,
            created_at: Utc::now(),
        }
    }

    fn item(price: i64, stock: i64) -> Item {
        Item {
            id: ItemId::new(9),
            user_id: UserId::new(2),
            merchant_id: MerchantId::new(5),
            name: "item1".into(),
            description: None,
            price: Money::new(price).unwrap(),
            stock,
            version: 1,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_plan_applies_all_deltas() {
        let commit = PurchaseCommit::plan(
            &buyer_user(),
            wallet(1, 1, 1000),
            wallet(2, 2, 50),
            item(100, 10),
            &merchant(),
            3,
        )
        .unwrap();

        assert_eq!(commit.transaction.total_price.amount(), 300);
        assert_eq!(commit.buyer.balance.amount(), 700);
        assert_eq!(commit.vendor.balance.amount(), 350);
        assert_eq!(commit.item.stock, 7);

        // versions are the ones read, the store bumps them
        assert_eq!(commit.buyer.version, 2);
        assert_eq!(commit.item.version, 1);
    }

    #[test]
    fn test_plan_denormalizes_display_fields() {
        let commit = PurchaseCommit::plan(
            &buyer_user(),
            wallet(1, 1, 1000),
            wallet(2, 2, 0),
            item(100, 10),
            &merchant(),
            1,
        )
        .unwrap();

        let tx = commit.transaction;
        assert_eq!(tx.item_name, "item1");
        assert_eq!(tx.merchant_name, "Shop");
        assert_eq!(tx.buyer_name, "Bob Buyer");
        assert_eq!(tx.user_id, UserId::new(1));
        assert_eq!(tx.wallet_id, WalletId::new(1));
        assert_eq!(tx.vendor_wallet_id, WalletId::new(2));
        assert_eq!(tx.item_id, ItemId::new(9));
        assert_eq!(tx.merchant_id, MerchantId::new(5));
    }

    #[test]
    fn test_plan_stock_checked_before_balance() {
        let result = PurchaseCommit::plan(
            &buyer_user(),
            wallet(1, 1, 50),
            wallet(2, 2, 0),
            item(100, 10),
            &merchant(),
            11,
        );
        assert!(matches!(result, Err(DomainError::InsufficientStock { .. })));
    }

    #[test]
    fn test_plan_insufficient_balance() {
        let result = PurchaseCommit::plan(
            &buyer_user(),
            wallet(1, 1, 50),
            wallet(2, 2, 0),
            item(100, 10),
            &merchant(),
            1,
        );
        assert!(matches!(
            result,
            Err(DomainError::InsufficientBalance {
                available: 50,
                requested: 100
            })
        ));
    }

    #[test]
    fn test_into_transaction_keeps_frozen_fields() {
        let commit = PurchaseCommit::plan(
            &buyer_user(),
            wallet(1, 1, 1000),
            wallet(2, 2, 0),
            item(100, 10),
            &merchant(),
            2,
        )
        .unwrap();

        let tx = commit.transaction.into_transaction(TransactionId::new(77));
        assert_eq!(tx.id, TransactionId::new(77));
        assert_eq!(tx.total_price.amount(), 200);
        assert_eq!(tx.quantity, 2);
    }
}
