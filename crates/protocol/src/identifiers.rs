//! Newtype domain identifiers.
//!
//! Every protocol concept that has an identity is represented as a distinct
//! newtype wrapping a primitive. This prevents accidentally interchanging, for
//! example, a [`CommandId`] with a [`UniversalId`] even though both are strings
//! on the wire.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Returned when an empty string is decoded as an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("identifier must not be empty")]
pub struct EmptyIdentifier;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display, and
// String conversions that keep empty values out of the type on decode.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = EmptyIdentifier;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value).ok_or(EmptyIdentifier)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

/// Decodes an optional identifier field, treating `""` the same as absent.
///
/// The device server echoes and accepts empty `IdCommand` / `UniversalID`
/// strings where no value exists.
pub(crate) fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<String>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|value| T::try_from(value).ok()))
}

// ---------------------------------------------------------------------------
// Command correlation
// ---------------------------------------------------------------------------

string_id! {
    /// Correlates an issued command with the `GetRezult` queries that track it.
    ///
    /// Sent on the wire as `IdCommand`. Generated once per execution attempt
    /// (see [`crate::correlator`]) and never changed afterwards.
    CommandId
}

impl CommandId {
    /// Generates a fresh identifier in the hyphenated GUID format the device
    /// server documents (`xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    /// Returns `true` if `value` has the shape produced by [`CommandId::generate`]:
    /// 36 characters, hyphens at positions 8, 13, 18 and 23, hex digits elsewhere.
    pub fn is_well_formed(value: &str) -> bool {
        value.len() == 36
            && value.char_indices().all(|(i, c)| match i {
                8 | 13 | 18 | 23 => c == '-',
                _ => c.is_ascii_hexdigit(),
            })
    }
}

string_id! {
    /// Transaction reference returned by the payment terminal for a card
    /// payment (`UniversalID`). Required to refund or cancel that payment.
    UniversalId
}

// ---------------------------------------------------------------------------
// Device addressing
// ---------------------------------------------------------------------------

/// Index of a device registered in the KKM Server (`NumDevice`).
///
/// `0` means "let the server pick": the first active device matching the
/// other selectors (`InnKkm`, `TaxVariant`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceNumber(u32);

impl DeviceNumber {
    /// The "any device" selector.
    pub const ANY: Self = Self(0);

    /// Creates a device number from a raw integer.
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the underlying integer value.
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns `true` for the "any device" selector.
    pub fn is_any(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for DeviceNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_not_an_identifier() {
        assert!(CommandId::new("").is_none());
        assert!(UniversalId::new(String::new()).is_none());
    }

    #[test]
    fn generated_ids_are_well_formed_and_distinct() {
        let a = CommandId::generate();
        let b = CommandId::generate();
        assert!(CommandId::is_well_formed(a.as_str()), "{a}");
        assert!(CommandId::is_well_formed(b.as_str()), "{b}");
        assert_ne!(a, b);
    }

    #[test]
    fn well_formed_rejects_other_shapes() {
        assert!(!CommandId::is_well_formed("not-a-guid"));
        assert!(!CommandId::is_well_formed("0123456789abcdef0123456789abcdef0123"));
        assert!(!CommandId::is_well_formed("zzzzzzzz-zzzz-zzzz-zzzz-zzzzzzzzzzzz"));
    }

    #[test]
    fn command_id_serialises_as_plain_string() {
        let id = CommandId::new("abc").expect("non-empty");
        assert_eq!(serde_json::to_string(&id).expect("serialise"), "\"abc\"");
    }

    #[test]
    fn empty_string_does_not_decode_as_an_identifier() {
        assert!(serde_json::from_str::<CommandId>("\"\"").is_err());
        assert!(serde_json::from_str::<UniversalId>("\"\"").is_err());
        let id: CommandId = serde_json::from_str("\"abc\"").expect("decode");
        assert_eq!(id.as_str(), "abc");
    }

    #[test]
    fn device_zero_means_any() {
        assert!(DeviceNumber::ANY.is_any());
        assert!(!DeviceNumber::new(2).is_any());
        assert_eq!(DeviceNumber::default(), DeviceNumber::ANY);
    }
}
