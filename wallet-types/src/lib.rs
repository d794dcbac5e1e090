//! # Wallet Types
//!
//! Domain types and port traits for the wallet marketplace service.
//! This crate has ZERO external IO dependencies - only data structures,
//! business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (Money, Wallet, Item, Transaction, ...)
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Data Transfer Objects for API boundaries
//! - `page/` - Page-number pagination shared by all listings
//! - `error/` - Domain and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod page;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    ApiKey, ApiKeyId, Item, ItemId, Merchant, MerchantId, Money, NewItem, NewMerchant,
    NewTransaction, NewWallet, PurchaseCommit, Transaction, TransactionId, User, UserId, Wallet,
    WalletId,
};
pub use dto::*;
pub use error::{AppError, DomainError, RepoError};
pub use page::{PAGE_SIZE, PageRequest};
pub use ports::{IdentityProvider, MarketRepository};
