//! Merchant operations.

use wallet_types::{
    AppError, CreateMerchantRequest, MarketRepository, Merchant, MerchantId, MerchantList,
    NewMerchant, PageRequest, UpdateMerchantRequest,
};

use super::MarketService;
use crate::access::Identity;

impl<R: MarketRepository> MarketService<R> {
    /// Creates a merchant owned by the caller, copying in their profile.
    #[tracing::instrument(skip(self, req), fields(name = %req.name))]
    pub async fn create_merchant(
        &self,
        identity: Identity,
        req: CreateMerchantRequest,
    ) -> Result<Merchant, AppError> {
        let user_id = identity.require()?;
        let owner = self.load_requester(user_id).await?;

        let new = NewMerchant::for_owner(&owner, req)?;
        let merchant = self.repo.create_merchant(new).await?;

        tracing::info!(merchant_id = %merchant.id, "merchant created");
        Ok(merchant)
    }

    /// Gets a merchant by ID. Public.
    pub async fn get_merchant(&self, id: MerchantId) -> Result<Merchant, AppError> {
        self.repo
            .get_merchant(id)
            .await
            .map_err(Into::into)
            .and_then(|opt| opt.ok_or_else(|| AppError::NotFound(format!("Merchant {}", id))))
    }

    /// Lists one page of merchants. Public.
    pub async fn list_merchants(&self, page: PageRequest) -> Result<MerchantList, AppError> {
        let merchants = self.repo.list_merchants(page).await?;
        let total = self.repo.count_merchants().await?;
        Ok(MerchantList::new(merchants, page, total))
    }

    /// Updates name/description of a merchant the caller owns.
    #[tracing::instrument(skip(self, req))]
    pub async fn update_merchant(
        &self,
        identity: Identity,
        id: MerchantId,
        req: UpdateMerchantRequest,
    ) -> Result<Merchant, AppError> {
        identity.require()?;
        let merchant = self.get_merchant(id).await?;
        identity.require_owner(merchant.user_id, "merchant")?;

        let merged = merchant.merge(req)?;
        self.repo.update_merchant(&merged).await.map_err(Into::into)
    }

    /// Deletes a merchant the caller owns, along with its items and wallets.
    #[tracing::instrument(skip(self))]
    pub async fn delete_merchant(&self, identity: Identity, id: MerchantId) -> Result<(), AppError> {
        identity.require()?;
        let merchant = self.get_merchant(id).await?;
        identity.require_owner(merchant.user_id, "merchant")?;

        if !self.repo.delete_merchant(id).await? {
            return Err(AppError::NotFound(format!("Merchant {}", id)));
        }

        tracing::info!(merchant_id = %id, "merchant deleted");
        Ok(())
    }
}
