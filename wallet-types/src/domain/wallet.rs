//! Wallet domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{MerchantId, UserId, WalletId};
use super::merchant::Merchant;
use super::money::Money;
use super::user::User;
use crate::dto::{CreateWalletRequest, UpdateWalletRequest};
use crate::error::DomainError;

/// A balance holder bound to a user, optionally in a merchant context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub user_id: UserId,
    pub merchant_id: Option<MerchantId>,
    pub name: String,
    pub balance: Money,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub merchant_name: Option<String>,
    /// Optimistic-concurrency token, bumped on every write
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

/// A wallet that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWallet {
    pub user_id: UserId,
    pub merchant_id: Option<MerchantId>,
    pub name: String,
    pub balance: Money,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub merchant_name: Option<String>,
}

impl NewWallet {
    /// Builds a wallet bound to `owner`. When `merchant` is given its name is
    /// denormalized onto the wallet.
    pub fn for_owner(
        owner: &User,
        merchant: Option<&Merchant>,
        req: CreateWalletRequest,
    ) -> Result<Self, DomainError> {
        let name = req.name.unwrap_or_else(|| "Wallet".to_string());
        if name.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Wallet name cannot be empty".into(),
            ));
        }

        Ok(Self {
            user_id: owner.id,
            merchant_id: merchant.map(|m| m.id),
            name,
            balance: req.balance,
            first_name: owner.first_name.clone(),
            last_name: owner.last_name.clone(),
            merchant_name: merchant.map(|m| m.name.clone()),
        })
    }
}

impl Wallet {
    /// Returns the wallet with `amount` taken out of its balance.
    pub fn debit(mut self, amount: Money) -> Result<Self, DomainError> {
        self.balance = self.balance.checked_sub(amount)?;
        Ok(self)
    }

    /// Returns the wallet with `amount` added to its balance.
    pub fn credit(mut self, amount: Money) -> Result<Self, DomainError> {
        self.balance = self.balance.checked_add(amount)?;
        Ok(self)
    }

    /// Applies an update payload.
    ///
    /// Only `name` is updatable. Balance, owner and merchant bindings and the
    /// denormalized owner/merchant names are preserved.
    pub fn merge(mut self, req: UpdateWalletRequest) -> Result<Self, DomainError> {
        if let Some(name) = req.name {
            if name.trim().is_empty() {
                return Err(DomainError::ValidationError(
                    "Wallet name cannot be empty".into(),
                ));
            }
            self.name = name;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet(balance: i64) -> Wallet {
        Wallet {
            id: WalletId::new(1),
            user_id: UserId::new(1),
            merchant_id: Some(MerchantId::new(2)),
            name: "Main".into(),
            balance: Money::new(balance).unwrap(),
            first_name: Some("Firstname".into()),
            last_name: Some("lastname".into()),
            merchant_name: Some("Shop".into()),
            version: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_wallet_debit() {
        let wallet = wallet(1000).debit(Money::new(300).unwrap()).unwrap();
        assert_eq!(wallet.balance.amount(), 700);
    }

    #[test]
    fn test_wallet_debit_exact_balance() {
        let wallet = wallet(300).debit(Money::new(300).unwrap()).unwrap();
        assert_eq!(wallet.balance.amount(), 0);
    }

    #[test]
    fn test_wallet_debit_insufficient() {
        let result = wallet(50).debit(Money::new(100).unwrap());
        assert!(matches!(
            result,
            Err(DomainError::InsufficientBalance {
                available: 50,
                requested: 100
            })
        ));
    }

    #[test]
    fn test_wallet_credit() {
        let wallet = wallet(0).credit(Money::new(300).unwrap()).unwrap();
        assert_eq!(wallet.balance.amount(), 300);
    }

    #[test]
    fn test_merge_only_touches_name() {
        let original = wallet(1000);
        let updated = original
            .clone()
            .merge(UpdateWalletRequest {
                name: Some("Savings".into()),
            })
            .unwrap();

        assert_eq!(updated.name, "Savings");
        assert_eq!(updated.balance, original.balance);
        assert_eq!(updated.user_id, original.user_id);
        assert_eq!(updated.merchant_id, original.merchant_id);
        assert_eq!(updated.first_name, original.first_name);
        assert_eq!(updated.last_name, original.last_name);
        assert_eq!(updated.merchant_name, original.merchant_name);
        assert_eq!(updated.version, original.version);
    }

    #[test]
    fn test_merge_rejects_blank_name() {
        let result = wallet(0).merge(UpdateWalletRequest {
            name: Some("".into()),
        });
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }
}
