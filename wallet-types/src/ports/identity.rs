//! Identity port.

use crate::domain::UserId;
use crate::error::AppError;

/// Resolves an opaque bearer credential to the user it belongs to.
///
/// Unknown or revoked credentials fail with [`AppError::Unauthenticated`];
/// credentials of a disabled user fail with [`AppError::Forbidden`].
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    async fn authenticate(&self, credential: &str) -> Result<UserId, AppError>;
}
