//! Wallet operations.
//!
//! Balances are only set here at creation. Afterwards they move exclusively
//! through purchases.

use wallet_types::{
    AppError, CreateWalletRequest, MarketRepository, NewWallet, PageRequest, UpdateWalletRequest,
    Wallet, WalletId, WalletList,
};

use super::{MarketService, write_conflict};
use crate::access::Identity;

impl<R: MarketRepository> MarketService<R> {
    #[tracing::instrument(skip(self, req), fields(merchant_id = ?req.merchant_id))]
    pub async fn create_wallet(
        &self,
        identity: Identity,
        req: CreateWalletRequest,
    ) -> Result<Wallet, AppError> {
        let user_id = identity.require()?;
        let owner = self.load_requester(user_id).await?;

        let merchant = match req.merchant_id {
            Some(merchant_id) => {
                let merchant = self.get_merchant(merchant_id).await?;
                identity.require_owner(merchant.user_id, "merchant")?;
                Some(merchant)
            }
            None => None,
        };

        let new = NewWallet::for_owner(&owner, merchant.as_ref(), req)?;
        let wallet = self.repo.create_wallet(new).await?;

        tracing::info!(wallet_id = %wallet.id, balance = %wallet.balance, "wallet created");
        Ok(wallet)
    }

    /// Gets a wallet the caller owns.
    pub async fn get_wallet(&self, identity: Identity, id: WalletId) -> Result<Wallet, AppError> {
        identity.require()?;
        let wallet = self.find_wallet(id).await?;
        identity.require_owner(wallet.user_id, "wallet")?;
        Ok(wallet)
    }

    /// Lists one page of the caller's wallets.
    pub async fn list_wallets(
        &self,
        identity: Identity,
        page: PageRequest,
    ) -> Result<WalletList, AppError> {
        let user_id = identity.require()?;

        let wallets = self.repo.list_wallets_for_user(user_id, page).await?;
        let total = self.repo.count_wallets_for_user(user_id).await?;
        Ok(WalletList::new(wallets, page, total))
    }

    /// Renames a wallet. Nothing else about a wallet is updatable.
    #[tracing::instrument(skip(self, req))]
    pub async fn update_wallet(
        &self,
        identity: Identity,
        id: WalletId,
        req: UpdateWalletRequest,
    ) -> Result<Wallet, AppError> {
        let wallet = self.get_wallet(identity, id).await?;

        let merged = wallet.merge(req)?;
        self.repo.update_wallet(&merged).await.map_err(write_conflict)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_wallet(&self, identity: Identity, id: WalletId) -> Result<(), AppError> {
        self.get_wallet(identity, id).await?;

        if !self.repo.delete_wallet(id).await? {
            return Err(AppError::NotFound(format!("Wallet {}", id)));
        }
        Ok(())
    }

    async fn find_wallet(&self, id: WalletId) -> Result<Wallet, AppError> {
        self.repo
            .get_wallet(id)
            .await
            .map_err(Into::into)
            .and_then(|opt| opt.ok_or_else(|| AppError::NotFound(format!("Wallet {}", id))))
    }
}
