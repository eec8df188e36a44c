//! Strongly-typed identifiers
//!
//! Each id is a newtype over a UUID, so a rental id cannot be handed to a
//! function expecting a policy record id. Ids display with a short prefix
//! (`PRC-…`) in logs and parse with or without it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Log prefix, e.g. `PRC`
            pub const PREFIX: &'static str = $prefix;

            /// Random (v4) identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Time-ordered (v7) identifier, for rows that are scanned by age
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", Self::PREFIX, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let bare = s
                    .strip_prefix(Self::PREFIX)
                    .and_then(|rest| rest.strip_prefix('-'))
                    .unwrap_or(s);
                Uuid::parse_str(bare).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

define_id!(
    /// One quote-to-issuance attempt for a rental
    PolicyRecordId,
    "PRC"
);
define_id!(
    /// In-app notification row
    NotificationId,
    "NTF"
);

// Owned by the booking side; carried here as foreign keys
define_id!(TenantId, "TEN");
define_id!(RentalId, "RNT");
define_id!(CustomerId, "CUS");
define_id!(UserId, "USR");
