//! Marketplace service: access checks, rule checks and store calls for
//! every API operation, one submodule per entity.

mod items;
mod merchants;
mod transactions;
mod users;
mod wallets;

pub use transactions::PurchaseOrder;

use wallet_types::{AppError, MarketRepository, RepoError, User, UserId};

/// Marketplace operations over an injected store.
pub struct MarketService<R: MarketRepository> {
    repo: R,
}

impl<R: MarketRepository> MarketService<R> {
    /// Creates a new marketplace service with the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns a reference to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Loads the user record behind an authenticated identity.
    ///
    /// The identity was resolved from a stored key, so a missing user means
    /// the store is inconsistent.
    async fn load_requester(&self, id: UserId) -> Result<User, AppError> {
        self.repo
            .get_user(id)
            .await?
            .ok_or_else(|| integrity_fault(format!("authenticated user {} has no record", id)))
    }
}

/// Logs a broken cross-record reference and returns the opaque error.
fn integrity_fault(detail: String) -> AppError {
    tracing::error!(%detail, "data integrity fault");
    AppError::DataIntegrity(detail)
}

/// Maps a failed version-guarded write to `TransactionFailed`.
fn write_conflict(err: RepoError) -> AppError {
    match err {
        RepoError::Conflict(msg) => {
            tracing::warn!(%msg, "concurrent modification");
            AppError::TransactionFailed
        }
        other => other.into(),
    }
}
