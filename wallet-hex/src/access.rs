//! Access-Control Layer.
//!
//! Stateless identity and ownership checks applied in front of every domain
//! operation. The HTTP adapter resolves the bearer credential into an
//! [`Identity`]; services only ever see this value.

use wallet_types::{AppError, UserId};

/// Who is making the request, if anyone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identity(Option<UserId>);

impl Identity {
    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn user(id: UserId) -> Self {
        Self(Some(id))
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.0
    }

    /// Fails with `Unauthenticated` for anonymous callers.
    pub fn require(&self) -> Result<UserId, AppError> {
        self.0.ok_or(AppError::Unauthenticated)
    }

    /// Requires an identity that matches `owner`.
    pub fn require_owner(&self, owner: UserId, resource: &str) -> Result<UserId, AppError> {
        let requester = self.require()?;
        if requester != owner {
            tracing::warn!(%requester, %owner, resource, "ownership check failed");
            return Err(AppError::Forbidden(format!(
                "You do not have access to this {}",
                resource
            )));
        }
        Ok(requester)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_is_unauthenticated() {
        assert!(matches!(
            Identity::anonymous().require(),
            Err(AppError::Unauthenticated)
        ));
        assert!(matches!(
            Identity::default().require_owner(UserId::new(1), "wallet"),
            Err(AppError::Unauthenticated)
        ));
    }

    #[test]
    fn test_owner_passes() {
        let identity = Identity::user(UserId::new(7));
        assert_eq!(
            identity.require_owner(UserId::new(7), "wallet").unwrap(),
            UserId::new(7)
        );
    }

    #[test]
    fn test_non_owner_is_forbidden() {
        let identity = Identity::user(UserId::new(7));
        assert!(matches!(
            identity.require_owner(UserId::new(8), "item"),
            Err(AppError::Forbidden(_))
        ));
    }
}
