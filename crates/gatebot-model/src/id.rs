//! Snowflake id newtypes.
//!
//! Every platform object is addressed by a 64-bit snowflake. Wrapping each
//! kind in its own type keeps a `ChannelId` from being passed where a
//! `GuildId` is expected.

use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(pub u64);

        impl $name {
            /// Wrap a raw snowflake.
            #[inline]
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// The raw snowflake value.
            #[inline]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<u64>()
                    .map(Self)
                    .map_err(|_| ModelError::InvalidId(s.to_string()))
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

snowflake!(
    /// Id of a guild (server).
    GuildId
);
snowflake!(
    /// Id of a text or private channel.
    ChannelId
);
snowflake!(
    /// Id of a user account.
    UserId
);
snowflake!(
    /// Id of a guild role.
    RoleId
);
snowflake!(
    /// Id of a message.
    MessageId
);
