//! User registration, API keys and identity resolution.

use async_trait::async_trait;

use wallet_repo::security::{hash_api_key, verify_api_key};
use wallet_types::{
    ApiKeyId, ApiKeyResponse, AppError, CreateApiKeyRequest, IdentityProvider, MarketRepository,
    RegisterUserRequest, RegisterUserResponse, User, UserId,
};

use super::{MarketService, integrity_fault};
use crate::access::Identity;

const DEFAULT_KEY_NAME: &str = "default";

impl<R: MarketRepository> MarketService<R> {
    // ─────────────────────────────────────────────────────────────────────────────
    // Users
    // ─────────────────────────────────────────────────────────────────────────────

    /// Registers a user and issues their first API key.
    #[tracing::instrument(skip(self, req), fields(username = %req.username))]
    pub async fn register_user(
        &self,
        req: RegisterUserRequest,
    ) -> Result<RegisterUserResponse, AppError> {
        if req.username.trim().is_empty() {
            return Err(AppError::BadRequest("Username cannot be empty".into()));
        }

        let user = self.repo.create_user(req).await?;
        let (_key, raw_key) = self.repo.create_api_key(user.id, DEFAULT_KEY_NAME).await?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(RegisterUserResponse {
            user,
            api_key: raw_key,
            message: "Save this API key securely - it won't be shown again!".into(),
        })
    }

    /// Returns the caller's own profile.
    pub async fn current_user(&self, identity: Identity) -> Result<User, AppError> {
        let user_id = identity.require()?;
        self.load_requester(user_id).await
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // API keys
    // ─────────────────────────────────────────────────────────────────────────────

    /// Issues another API key for the caller.
    #[tracing::instrument(skip(self, req), fields(key_name = %req.name))]
    pub async fn create_api_key(
        &self,
        identity: Identity,
        req: CreateApiKeyRequest,
    ) -> Result<ApiKeyResponse, AppError> {
        let user_id = identity.require()?;
        if req.name.trim().is_empty() {
            return Err(AppError::BadRequest("API key name cannot be empty".into()));
        }

        let (key, raw_key) = self.repo.create_api_key(user_id, &req.name).await?;

        Ok(ApiKeyResponse {
            id: key.id,
            name: key.name,
            api_key: raw_key,
            message: "API key created. Save this key securely - it won't be shown again!".into(),
        })
    }

    /// Deactivates one of the caller's API keys.
    pub async fn revoke_api_key(&self, identity: Identity, id: ApiKeyId) -> Result<(), AppError> {
        let user_id = identity.require()?;

        if self.repo.delete_api_key(user_id, id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("API key {}", id)))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Identity provider
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl<R: MarketRepository> IdentityProvider for MarketService<R> {
    async fn authenticate(&self, credential: &str) -> Result<UserId, AppError> {
        let key = self
            .repo
            .verify_api_key_hash(&hash_api_key(credential))
            .await?
            .ok_or(AppError::Unauthenticated)?;

        if !verify_api_key(credential, &key.key_hash) {
            return Err(AppError::Unauthenticated);
        }

        let user = self
            .repo
            .get_user(key.user_id)
            .await?
            .ok_or_else(|| integrity_fault(format!("api key {} has no user", key.id)))?;

        if user.disabled {
            return Err(AppError::Forbidden("User account is disabled".into()));
        }

        self.repo.record_login(user.id).await?;
        Ok(user.id)
    }
}
