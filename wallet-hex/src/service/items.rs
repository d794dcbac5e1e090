//! Item operations.

use wallet_types::{
    AppError, CreateItemRequest, Item, ItemId, ItemList, MarketRepository, MerchantId, NewItem,
    PageRequest, UpdateItemRequest,
};

use super::{MarketService, write_conflict};
use crate::access::Identity;

impl<R: MarketRepository> MarketService<R> {
    /// Adds an item to a merchant the caller owns.
    ///
    /// Owner and merchant come from the caller and the path, never from the
    /// payload.
    #[tracing::instrument(skip(self, req), fields(name = %req.name))]
    pub async fn create_item(
        &self,
        identity: Identity,
        merchant_id: MerchantId,
        req: CreateItemRequest,
    ) -> Result<Item, AppError> {
        identity.require()?;
        let merchant = self.get_merchant(merchant_id).await?;
        let user_id = identity.require_owner(merchant.user_id, "merchant")?;

        let new = NewItem::new(user_id, merchant.id, req)?;
        let item = self.repo.create_item(new).await?;

        tracing::info!(item_id = %item.id, "item created");
        Ok(item)
    }

    /// Gets an item by ID. Public.
    pub async fn get_item(&self, id: ItemId) -> Result<Item, AppError> {
        self.repo
            .get_item(id)
            .await
            .map_err(Into::into)
            .and_then(|opt| opt.ok_or_else(|| AppError::NotFound(format!("Item {}", id))))
    }

    /// Lists one page of items. Public.
    pub async fn list_items(&self, page: PageRequest) -> Result<ItemList, AppError> {
        let items = self.repo.list_items(page).await?;
        let total = self.repo.count_items().await?;
        Ok(ItemList::new(items, page, total))
    }

    /// Updates name, description or price. Stock only moves through purchases.
    #[tracing::instrument(skip(self, req))]
    pub async fn update_item(
        &self,
        identity: Identity,
        id: ItemId,
        req: UpdateItemRequest,
    ) -> Result<Item, AppError> {
        identity.require()?;
        let item = self.get_item(id).await?;
        identity.require_owner(item.user_id, "item")?;

        let merged = item.merge(req)?;
        self.repo.update_item(&merged).await.map_err(write_conflict)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_item(&self, identity: Identity, id: ItemId) -> Result<(), AppError> {
        identity.require()?;
        let item = self.get_item(id).await?;
        identity.require_owner(item.user_id, "item")?;

        if !self.repo.delete_item(id).await? {
            return Err(AppError::NotFound(format!("Item {}", id)));
        }
        Ok(())
    }
}
