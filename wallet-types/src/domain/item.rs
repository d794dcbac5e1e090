//! Item domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ItemId, MerchantId, UserId};
use super::money::Money;
use crate::dto::{CreateItemRequest, UpdateItemRequest};
use crate::error::DomainError;

/// A sellable good owned by a merchant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub user_id: UserId,
    pub merchant_id: MerchantId,
    pub name: String,
    pub description: Option<String>,
    /// Unit price
    pub price: Money,
    /// Units available for purchase, never negative
    pub stock: i64,
    /// Optimistic-concurrency token, bumped on every write
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

/// An item that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub user_id: UserId,
    pub merchant_id: MerchantId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock: i64,
}

impl NewItem {
    /// Validates a create request. Ownership comes from the caller, never
    /// from the payload.
    pub fn new(
        user_id: UserId,
        merchant_id: MerchantId,
        req: CreateItemRequest,
    ) -> Result<Self, DomainError> {
        if req.name.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Item name cannot be empty".into(),
            ));
        }
        if req.stock < 0 {
            return Err(DomainError::ValidationError(
                "Stock cannot be negative".into(),
            ));
        }

        Ok(Self {
            user_id,
            merchant_id,
            name: req.name,
            description: req.description,
            price: req.price,
            stock: req.stock,
        })
    }
}

impl Item {
    /// Takes `quantity` units out of stock.
    pub fn reserve_stock(mut self, quantity: i64) -> Result<Self, DomainError> {
        if quantity <= 0 {
            return Err(DomainError::ValidationError(
                "Quantity must be positive".into(),
            ));
        }
        if self.stock < quantity {
            return Err(DomainError::InsufficientStock {
                available: self.stock,
                requested: quantity,
            });
        }
        self.stock -= quantity;
        Ok(self)
    }

    /// Applies an update payload.
    ///
    /// Updatable: `name`, `description`, `price`. Preserved: owner, merchant,
    /// `stock`, `version`, `created_at`.
    pub fn merge(mut self, req: UpdateItemRequest) -> Result<Self, DomainError> {
        if let Some(name) = req.name {
            if name.trim().is_empty() {
                return Err(DomainError::ValidationError(
                    "Item name cannot be empty".into(),
                ));
            }
            self.name = name;
        }
        if let Some(description) = req.description {
            self.description = Some(description);
        }
        if let Some(price) = req.price {
            self.price = price;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(stock: i64) -> Item {
        Item {
            id: ItemId::new(1),
            user_id: UserId::new(1),
            merchant_id: MerchantId::new(1),
            name: "item1".into(),
            description: Some("Item Description".into()),
            price: Money::new(100).unwrap(),
            stock,
            version: 4,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_reserve_stock() {
        let item = item(10).reserve_stock(3).unwrap();
        assert_eq!(item.stock, 7);
    }

    #[test]
    fn test_reserve_entire_stock() {
        let item = item(10).reserve_stock(10).unwrap();
        assert_eq!(item.stock, 0);
    }

    #[test]
    fn test_reserve_stock_insufficient() {
        let result = item(10).reserve_stock(11);
        assert!(matches!(
            result,
            Err(DomainError::InsufficientStock {
                available: 10,
                requested: 11
            })
        ));
    }

    #[test]
    fn test_reserve_zero_fails() {
        assert!(matches!(
            item(10).reserve_stock(0),
            Err(DomainError::ValidationError(_))
        ));
    }

    #[test]
    fn test_new_item_rejects_negative_stock() {
        let result = NewItem::new(
            UserId::new(1),
            MerchantId::new(1),
            CreateItemRequest {
                name: "item1".into(),
                description: None,
                price: Money::new(100).unwrap(),
                stock: -1,
            },
        );
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[test]
    fn test_merge_preserves_stock_and_ownership() {
        let original = item(10);
        let updated = original
            .clone()
            .merge(UpdateItemRequest {
                name: Some("Test Update Item".into()),
                description: Some("test item description".into()),
                price: Some(Money::new(500).unwrap()),
            })
            .unwrap();

        assert_eq!(updated.name, "Test Update Item");
        assert_eq!(updated.description.as_deref(), Some("test item description"));
        assert_eq!(updated.price.amount(), 500);
        assert_eq!(updated.stock, original.stock);
        assert_eq!(updated.user_id, original.user_id);
        assert_eq!(updated.merchant_id, original.merchant_id);
        assert_eq!(updated.version, original.version);
        assert_eq!(updated.created_at, original.created_at);
    }

    #[test]
    fn test_merge_empty_payload_is_noop() {
        let original = item(10);
        let updated = original.clone().merge(UpdateItemRequest::default()).unwrap();
        assert_eq!(updated, original);
    }
}
