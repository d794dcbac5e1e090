//! # Wallet Hex
//!
//! Application service layer and HTTP adapter for the wallet marketplace.
//!
//! ## Architecture
//!
//! - `service/` - Application service (orchestrates domain operations)
//! - `access` - Caller identity and ownership checks
//! - `inbound/` - HTTP adapter (Axum server)
//!
//! The service is generic over `R: MarketRepository`, allowing
//! different repository implementations to be injected.

pub mod access;
pub mod inbound;
pub mod service;


pub use access::Identity;
pub use service::{MarketService, PurchaseOrder};
