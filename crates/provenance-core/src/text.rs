//! Bounded text fields carried by a content record.
//!
//! Lengths are counted in characters (Unicode scalar values). `ContentType`
//! and `Title` are restricted to ASCII; `StorageUrl` accepts any UTF-8.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

macro_rules! bounded_text {
    ($(#[$meta:meta])* $name:ident, $field:literal, $max:expr, ascii = $ascii:expr) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Maximum length in characters.
            pub const MAX_CHARS: usize = $max;

            /// Validate and wrap a string.
            pub fn new(value: impl Into<String>) -> Result<Self> {
                let value = value.into();
                check_text($field, &value, Self::MAX_CHARS, $ascii)?;
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = CoreError;

            fn try_from(value: String) -> Result<Self> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = CoreError;

            fn try_from(value: &str) -> Result<Self> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

bounded_text!(
    /// Short tag describing the kind of content ("article", "image", ...).
    ContentType,
    "content_type",
    20,
    ascii = true
);

bounded_text!(
    /// Human-readable title of the registered content.
    Title,
    "title",
    100,
    ascii = true
);

bounded_text!(
    /// Pointer to off-registry storage for the content itself.
    StorageUrl,
    "storage_url",
    256,
    ascii = false
);

fn check_text(field: &'static str, value: &str, max_chars: usize, ascii: bool) -> Result<()> {
    if ascii && !value.is_ascii() {
        return Err(CoreError::invalid(field, "must be ASCII"));
    }
    let chars = value.chars().count();
    if chars > max_chars {
        return Err(CoreError::invalid(
            field,
            format!("{} characters exceeds maximum of {}", chars, max_chars),
        ));
    }
    Ok(())
}
