//! Integer identifiers for every stored record.
//!
//! Each record type gets its own newtype so a wallet id can never be passed
//! where an item id is expected.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw database id.
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw database id.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

define_id!(
    /// Identifier of a [`User`](super::User).
    UserId
);
define_id!(
    /// Identifier of a [`Merchant`](super::Merchant).
    MerchantId
);
define_id!(
    /// Identifier of an [`Item`](super::Item).
    ItemId
);
define_id!(
    /// Identifier of a [`Wallet`](super::Wallet).
    WalletId
);
define_id!(
    /// Identifier of a [`Transaction`](super::Transaction).
    TransactionId
);
define_id!(
    /// Identifier of an [`ApiKey`](super::ApiKey).
    ApiKeyId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_parse_and_display() {
        let id: WalletId = "42".parse().unwrap();
        assert_eq!(id, WalletId::new(42));
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_id_parse_rejects_garbage() {
        assert!("abc".parse::<ItemId>().is_err());
    }

    #[test]
    fn test_id_serializes_as_plain_integer() {
        let json = serde_json::to_string(&TransactionId::new(7)).unwrap();
        assert_eq!(json, "7");
    }
}
