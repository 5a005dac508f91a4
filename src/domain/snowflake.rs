use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident, $what:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validates that `id` is a non-empty run of ASCII digits.
            pub fn new(id: impl Into<String>) -> Result<Self, String> {
                let id = id.into();
                if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
                    Ok(Self(id))
                } else {
                    Err(format!("{id:?} is not a valid {}.", $what))
                }
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(id: String) -> Result<Self, Self::Error> {
                Self::new(id)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

snowflake_id!(
    /// Identifier of a chat channel, either a server text channel or a DM channel.
    ChannelId,
    "channel id"
);

snowflake_id!(
    /// Identifier of a chat user. Subscribers are stored as these.
    UserId,
    "user id"
);

snowflake_id!(ServerId, "server id");

snowflake_id!(MessageId, "message id");
