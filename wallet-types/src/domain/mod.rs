//! Domain models for the wallet service.

pub mod api_key;
pub mod ids;
pub mod item;
pub mod merchant;
pub mod money;
pub mod transaction;
pub mod user;
pub mod wallet;

pub use api_key::ApiKey;
pub use ids::{ApiKeyId, ItemId, MerchantId, TransactionId, UserId, WalletId};
pub use item::{Item, NewItem};
pub use merchant::{Merchant, NewMerchant};
pub use money::Money;
pub use transaction::{NewTransaction, PurchaseCommit, Transaction};
pub use user::User;
pub use wallet::{NewWallet, Wallet};
