//! Strongly-typed identifier value objects.
//!
//! Identifiers are assigned by the persistence service and the hub, so
//! they are opaque strings rather than locally generated UUIDs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Generates a string-backed identifier newtype.
///
/// Each identifier gets `new`, `as_str`, `Display`, `FromStr` (rejecting
/// blank input) and `From<&str>`/`From<String>`.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an identifier issued elsewhere.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(ValidationError::blank($field));
                }
                Ok(Self(trimmed.to_string()))
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Identifier of a proposal document.
    DocumentId,
    "document_id"
);

string_id!(
    /// Identifier of a section. Stable for the life of the document.
    SectionId,
    "section_id"
);

string_id!(
    /// Identifier of a collaborator, as reported by the hub.
    UserId,
    "user_id"
);
