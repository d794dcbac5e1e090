//! Merchant domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{MerchantId, UserId};
use super::user::User;
use crate::dto::{CreateMerchantRequest, UpdateMerchantRequest};
use crate::error::DomainError;

/// A user's selling profile.
///
/// The owner's name and contact fields are copied in at creation time and are
/// not kept in sync with later profile changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merchant {
    pub id: MerchantId,
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A merchant that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMerchant {
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
}

impl NewMerchant {
    /// Builds a merchant for `owner`, denormalizing the owner's profile.
    pub fn for_owner(owner: &User, req: CreateMerchantRequest) -> Result<Self, DomainError> {
        if req.name.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Merchant name cannot be empty".into(),
            ));
        }

        Ok(Self {
            user_id: owner.id,
            name: req.name,
            description: req.description,
            first_name: owner.first_name.clone(),
            last_name: owner.last_name.clone(),
            email: owner.email.clone(),
            telephone: owner.telephone.clone(),
        })
    }
}

impl Merchant {
    /// Applies an update payload.
    ///
    /// Only `name` and `description` are updatable. Owner, denormalized
    /// contact fields and `created_at` are always preserved.
    pub fn merge(mut self, req: UpdateMerchantRequest) -> Result<Self, DomainError> {
        if let Some(name) = req.name {
            if name.trim().is_empty() {
                return Err(DomainError::ValidationError(
                    "Merchant name cannot be empty".into(),
                ));
            }
            self.name = name;
        }
        if let Some(description) = req.description {
            self.description = Some(description);
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> User {
        User {
            id: UserId::new(3),
            username: "user1".into(),
            email: Some("test@test.com".into()),
            telephone: Some("0812345678".into()),
            first_name: Some("Firstname".into()),
            last_name: Some("lastname".into()),
            disabled: false,
            registered_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn test_new_merchant_copies_owner_profile() {
        let merchant = NewMerchant::for_owner(
            &owner(),
            CreateMerchantRequest {
                name: "Shop".into(),
                description: Some("Merchant Description".into()),
            },
        )
        .unwrap();

        assert_eq!(merchant.user_id, UserId::new(3));
        assert_eq!(merchant.first_name.as_deref(), Some("Firstname"));
        assert_eq!(merchant.email.as_deref(), Some("test@test.com"));
        assert_eq!(merchant.telephone.as_deref(), Some("0812345678"));
    }

    #[test]
    fn test_new_merchant_empty_name_fails() {
        let result = NewMerchant::for_owner(
            &owner(),
            CreateMerchantRequest {
                name: " ".into(),
                description: None,
            },
        );
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[test]
    fn test_merge_preserves_owner_fields() {
        let merchant = Merchant {
            id: MerchantId::new(1),
            user_id: UserId::new(3),
            name: "Shop".into(),
            description: None,
            first_name: Some("Firstname".into()),
            last_name: Some("lastname".into()),
            email: Some("test@test.com".into()),
            telephone: None,
            created_at: Utc::now(),
        };

        let updated = merchant
            .clone()
            .merge(UpdateMerchantRequest {
                name: Some("Renamed".into()),
                description: Some("New description".into()),
            })
            .unwrap();

        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.description.as_deref(), Some("New description"));
        assert_eq!(updated.id, merchant.id);
        assert_eq!(updated.user_id, merchant.user_id);
        assert_eq!(updated.first_name, merchant.first_name);
        assert_eq!(updated.last_name, merchant.last_name);
        assert_eq!(updated.email, merchant.email);
        assert_eq!(updated.created_at, merchant.created_at);
    }
}
