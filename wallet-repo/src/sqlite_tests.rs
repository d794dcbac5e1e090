//! SQLite repository integration tests.

#[cfg(test)]
mod tests {
    use wallet_types::{
        CreateItemRequest, CreateMerchantRequest, CreateWalletRequest, Item, ItemId,
        MarketRepository, Merchant, Money, NewItem, NewMerchant, NewWallet, PageRequest,
        PurchaseCommit, RegisterUserRequest, RepoError, TransactionId, User, UserId, Wallet,
        WalletId,
    };

    use crate::SqliteRepo;
    use crate::security::hash_api_key;

    async fn setup_repo() -> SqliteRepo {
        SqliteRepo::new("sqlite::memory:").await.unwrap()
    }

    fn register(username: &str) -> RegisterUserRequest {
        RegisterUserRequest {
            username: username.to_string(),
            email: Some(format!("{}@example.com", username)),
            telephone: None,
            first_name: Some("Firstname".to_string()),
            last_name: Some("Lastname".to_string()),
        }
    }

    async fn seed_user(repo: &SqliteRepo, username: &str) -> User {
        repo.create_user(register(username)).await.unwrap()
    }

    async fn seed_merchant(repo: &SqliteRepo, owner: &User) -> Merchant {
        let new = NewMerchant::for_owner(
            owner,
            CreateMerchantRequest {
                name: "merchant1".to_string(),
                description: Some("Merchant Description".to_string()),
            },
        )
        .unwrap();
        repo.create_merchant(new).await.unwrap()
    }

    async fn seed_item(repo: &SqliteRepo, merchant: &Merchant, price: i64, stock: i64) -> Item {
        let new = NewItem::new(
            merchant.user_id,
            merchant.id,
            CreateItemRequest {
                name: "item1".to_string(),
                description: Some("Item Description".to_string()),
                price: Money::new(price).unwrap(),
                stock,
            },
        )
        .unwrap();
        repo.create_item(new).await.unwrap()
    }

    async fn seed_wallet(
        repo: &SqliteRepo,
        owner: &User,
        merchant: Option<&Merchant>,
        balance: i64,
    ) -> Wallet {
        let new = NewWallet::for_owner(
            owner,
            merchant,
            CreateWalletRequest {
                name: None,
                balance: Money::new(balance).unwrap(),
                merchant_id: merchant.map(|m| m.id),
            },
        )
        .unwrap();
        repo.create_wallet(new).await.unwrap()
    }

    struct Market {
        buyer: User,
        merchant: Merchant,
        item: Item,
        buyer_wallet: Wallet,
        vendor_wallet: Wallet,
    }

    async fn seed_market(repo: &SqliteRepo, buyer_balance: i64) -> Market {
        let buyer = seed_user(repo, "buyer").await;
        let seller = seed_user(repo, "seller").await;
        let merchant = seed_merchant(repo, &seller).await;
        let item = seed_item(repo, &merchant, 100, 10).await;
        let buyer_wallet = seed_wallet(repo, &buyer, None, buyer_balance).await;
        let vendor_wallet = seed_wallet(repo, &seller, Some(&merchant), 0).await;

        Market {
            buyer,
            merchant,
            item,
            buyer_wallet,
            vendor_wallet,
        }
    }

    fn plan(market: &Market, quantity: i64) -> PurchaseCommit {
        PurchaseCommit::plan(
            &market.buyer,
            market.buyer_wallet.clone(),
            market.vendor_wallet.clone(),
            market.item.clone(),
            &market.merchant,
            quantity,
        )
        .unwrap()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Users & API keys
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_create_and_get_user() {
        let repo = setup_repo().await;

        let user = seed_user(&repo, "user1").await;
        let fetched = repo.get_user(user.id).await.unwrap().unwrap();

        assert_eq!(fetched.username, "user1");
        assert_eq!(fetched.email.as_deref(), Some("user1@example.com"));
        assert!(!fetched.disabled);
        assert!(fetched.last_login_at.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let repo = setup_repo().await;
        seed_user(&repo, "user1").await;

        let result = repo.create_user(register("user1")).await;

        assert!(matches!(result, Err(RepoError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let repo = setup_repo().await;

        let result = repo.get_user(UserId::new(999)).await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_record_login() {
        let repo = setup_repo().await;
        let user = seed_user(&repo, "user1").await;

        repo.record_login(user.id).await.unwrap();

        let fetched = repo.get_user(user.id).await.unwrap().unwrap();
        assert!(fetched.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_api_key_lifecycle() {
        let repo = setup_repo().await;
        let user = seed_user(&repo, "user1").await;

        let (key, raw) = repo.create_api_key(user.id, "default").await.unwrap();
        assert!(raw.starts_with("sk_"));
        assert_eq!(key.key_hash, hash_api_key(&raw));

        let found = repo
            .verify_api_key_hash(&hash_api_key(&raw))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.user_id, user.id);
        assert!(found.last_used_at.is_some());

        assert!(repo.delete_api_key(user.id, key.id).await.unwrap());
        let revoked = repo.verify_api_key_hash(&hash_api_key(&raw)).await.unwrap();
        assert!(revoked.is_none());
    }

    #[tokio::test]
    async fn test_api_key_delete_scoped_to_owner() {
        let repo = setup_repo().await;
        let owner = seed_user(&repo, "owner").await;
        let other = seed_user(&repo, "other").await;

        let (key, _) = repo.create_api_key(owner.id, "default").await.unwrap();

        assert!(!repo.delete_api_key(other.id, key.id).await.unwrap());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Merchants, items, wallets
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_merchant_denormalizes_owner() {
        let repo = setup_repo().await;
        let owner = seed_user(&repo, "user1").await;

        let merchant = seed_merchant(&repo, &owner).await;
        let fetched = repo.get_merchant(merchant.id).await.unwrap().unwrap();

        assert_eq!(fetched.user_id, owner.id);
        assert_eq!(fetched.first_name.as_deref(), Some("Firstname"));
        assert_eq!(fetched.email.as_deref(), Some("user1@example.com"));
    }

    #[tokio::test]
    async fn test_update_merchant() {
        let repo = setup_repo().await;
        let owner = seed_user(&repo, "user1").await;
        let mut merchant = seed_merchant(&repo, &owner).await;

        merchant.name = "renamed".to_string();
        repo.update_merchant(&merchant).await.unwrap();

        let fetched = repo.get_merchant(merchant.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "renamed");
        assert_eq!(fetched.description.as_deref(), Some("Merchant Description"));
    }

    #[tokio::test]
    async fn test_delete_merchant_cascades() {
        let repo = setup_repo().await;
        let owner = seed_user(&repo, "user1").await;
        let merchant = seed_merchant(&repo, &owner).await;
        let item = seed_item(&repo, &merchant, 100, 10).await;
        let merchant_wallet = seed_wallet(&repo, &owner, Some(&merchant), 0).await;
        let personal_wallet = seed_wallet(&repo, &owner, None, 500).await;

        assert!(repo.delete_merchant(merchant.id).await.unwrap());

        assert!(repo.get_merchant(merchant.id).await.unwrap().is_none());
        assert!(repo.get_item(item.id).await.unwrap().is_none());
        assert!(repo.get_wallet(merchant_wallet.id).await.unwrap().is_none());
        assert!(repo.get_wallet(personal_wallet.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_item_update_bumps_version() {
        let repo = setup_repo().await;
        let owner = seed_user(&repo, "user1").await;
        let merchant = seed_merchant(&repo, &owner).await;
        let item = seed_item(&repo, &merchant, 100, 10).await;
        assert_eq!(item.version, 0);

        let mut changed = item.clone();
        changed.price = Money::new(250).unwrap();
        let updated = repo.update_item(&changed).await.unwrap();
        assert_eq!(updated.version, 1);

        let fetched = repo.get_item(item.id).await.unwrap().unwrap();
        assert_eq!(fetched.price.amount(), 250);
        assert_eq!(fetched.stock, 10);
        assert_eq!(fetched.version, 1);
    }

    #[tokio::test]
    async fn test_item_update_with_stale_version_conflicts() {
        let repo = setup_repo().await;
        let owner = seed_user(&repo, "user1").await;
        let merchant = seed_merchant(&repo, &owner).await;
        let item = seed_item(&repo, &merchant, 100, 10).await;

        repo.update_item(&item).await.unwrap();
        let result = repo.update_item(&item).await;

        assert!(matches!(result, Err(RepoError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_wallet_update_keeps_balance() {
        let repo = setup_repo().await;
        let owner = seed_user(&repo, "user1").await;
        let wallet = seed_wallet(&repo, &owner, None, 1000).await;

        let mut changed = wallet.clone();
        changed.name = "Savings".to_string();
        repo.update_wallet(&changed).await.unwrap();

        let fetched = repo.get_wallet(wallet.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Savings");
        assert_eq!(fetched.balance.amount(), 1000);
        assert_eq!(fetched.version, 1);
    }

    #[tokio::test]
    async fn test_delete_missing_records() {
        let repo = setup_repo().await;

        assert!(!repo.delete_item(ItemId::new(42)).await.unwrap());
        assert!(!repo.delete_wallet(WalletId::new(42)).await.unwrap());
        assert!(!repo.delete_transaction(TransactionId::new(42)).await.unwrap());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Pagination
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_list_items_pages() {
        let repo = setup_repo().await;
        let owner = seed_user(&repo, "user1").await;
        let merchant = seed_merchant(&repo, &owner).await;
        for _ in 0..55 {
            seed_item(&repo, &merchant, 100, 1).await;
        }

        assert_eq!(repo.count_items().await.unwrap(), 55);
        assert_eq!(repo.list_items(PageRequest::new(1)).await.unwrap().len(), 50);
        assert_eq!(repo.list_items(PageRequest::new(2)).await.unwrap().len(), 5);
        assert!(repo.list_items(PageRequest::new(3)).await.unwrap().is_empty());
        assert!(repo.list_items(PageRequest::new(0)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_wallets_scoped_to_user() {
        let repo = setup_repo().await;
        let alice = seed_user(&repo, "alice").await;
        let bob = seed_user(&repo, "bob").await;
        seed_wallet(&repo, &alice, None, 10).await;
        seed_wallet(&repo, &alice, None, 20).await;
        seed_wallet(&repo, &bob, None, 30).await;

        let wallets = repo
            .list_wallets_for_user(alice.id, PageRequest::default())
            .await
            .unwrap();

        assert_eq!(wallets.len(), 2);
        assert!(wallets.iter().all(|w| w.user_id == alice.id));
        assert_eq!(repo.count_wallets_for_user(alice.id).await.unwrap(), 2);
        assert_eq!(repo.count_wallets_for_user(bob.id).await.unwrap(), 1);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Purchases
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_commit_purchase_applies_all_writes() {
        let repo = setup_repo().await;
        let market = seed_market(&repo, 1000).await;

        let tx = repo.commit_purchase(plan(&market, 3)).await.unwrap();

        assert_eq!(tx.total_price.amount(), 300);
        assert_eq!(tx.quantity, 3);
        assert_eq!(tx.item_name, "item1");
        assert_eq!(tx.merchant_name, "merchant1");
        assert_eq!(tx.buyer_name, "Firstname Lastname");

        let buyer = repo
            .get_wallet(market.buyer_wallet.id)
            .await
            .unwrap()
            .unwrap();
        let vendor = repo
            .get_wallet(market.vendor_wallet.id)
            .await
            .unwrap()
            .unwrap();
        let item = repo.get_item(market.item.id).await.unwrap().unwrap();

        assert_eq!(buyer.balance.amount(), 700);
        assert_eq!(vendor.balance.amount(), 300);
        assert_eq!(item.stock, 7);
        assert_eq!(buyer.version, 1);
        assert_eq!(item.version, 1);

        let stored = repo.get_transaction(tx.id).await.unwrap().unwrap();
        assert_eq!(stored.id, tx.id);
        assert_eq!(stored.wallet_id, market.buyer_wallet.id);
        assert_eq!(stored.vendor_wallet_id, market.vendor_wallet.id);
        assert_eq!(stored.total_price, tx.total_price);
    }

    #[tokio::test]
    async fn test_commit_purchase_with_stale_item_rolls_back() {
        let repo = setup_repo().await;
        let market = seed_market(&repo, 1000).await;

        // Someone else touches the item between read and commit.
        repo.update_item(&market.item).await.unwrap();

        let result = repo.commit_purchase(plan(&market, 3)).await;
        assert!(matches!(result, Err(RepoError::Conflict(_))));

        let buyer = repo
            .get_wallet(market.buyer_wallet.id)
            .await
            .unwrap()
            .unwrap();
        let vendor = repo
            .get_wallet(market.vendor_wallet.id)
            .await
            .unwrap()
            .unwrap();
        let item = repo.get_item(market.item.id).await.unwrap().unwrap();

        assert_eq!(buyer.balance.amount(), 1000);
        assert_eq!(vendor.balance.amount(), 0);
        assert_eq!(item.stock, 10);
        assert_eq!(
            repo.count_transactions_for_user(market.buyer.id)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_commit_purchase_with_stale_wallet_rolls_back() {
        let repo = setup_repo().await;
        let market = seed_market(&repo, 1000).await;

        let first = plan(&market, 1);
        let second = plan(&market, 1);
        repo.commit_purchase(first).await.unwrap();

        // Planned from the same reads, so every version is stale now.
        let result = repo.commit_purchase(second).await;
        assert!(matches!(result, Err(RepoError::Conflict(_))));

        let buyer = repo
            .get_wallet(market.buyer_wallet.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(buyer.balance.amount(), 900);
        assert_eq!(
            repo.count_transactions_for_user(market.buyer.id)
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_transactions_listed_per_user() {
        let repo = setup_repo().await;
        let market = seed_market(&repo, 1000).await;
        repo.commit_purchase(plan(&market, 1)).await.unwrap();

        let mine = repo
            .list_transactions_for_user(market.buyer.id, PageRequest::default())
            .await
            .unwrap();
        let seller_txs = repo
            .list_transactions_for_user(market.merchant.user_id, PageRequest::default())
            .await
            .unwrap();

        assert_eq!(mine.len(), 1);
        assert!(seller_txs.is_empty());
    }

    #[tokio::test]
    async fn test_delete_transaction_keeps_effects() {
        let repo = setup_repo().await;
        let market = seed_market(&repo, 1000).await;
        let tx = repo.commit_purchase(plan(&market, 2)).await.unwrap();

        assert!(repo.delete_transaction(tx.id).await.unwrap());

        assert!(repo.get_transaction(tx.id).await.unwrap().is_none());
        let buyer = repo
            .get_wallet(market.buyer_wallet.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(buyer.balance.amount(), 800);
    }
}
