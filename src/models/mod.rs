use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::backend::Row;

pub mod blog_post;
pub mod contact;
pub mod dashboard;
pub mod faq;
pub mod product;
pub mod settings;
pub mod testimonial;

/// Decode a backend row into a model.
pub fn from_row<T: DeserializeOwned>(row: Row) -> Result<T, String> {
    serde_json::from_value(Value::Object(row)).map_err(|e| e.to_string())
}

/// Deserialize a column holding serialized JSON (lists, key/value lists).
/// Malformed or missing data degrades to `T::default()`.
pub fn json_text<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(Value::Null) => T::default(),
        Some(Value::String(s)) if s.trim().is_empty() => T::default(),
        Some(Value::String(s)) => serde_json::from_str(&s).unwrap_or_else(|e| {
            log::warn!("Malformed JSON column {:?}: {}", s, e);
            T::default()
        }),
        // Already structured (e.g. written through the mock as-is)
        Some(other) => serde_json::from_value(other).unwrap_or_default(),
    })
}

/// Serialize a list/object field for storage in a text column.
pub fn to_json_text<T: serde::Serialize>(value: &T) -> Value {
    Value::String(serde_json::to_string(value).unwrap_or_else(|_| "[]".to_string()))
}

/// Defines a persisted status enumeration: lowercase serde names,
/// `as_str`, and `FromStr`.
macro_rules! status_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("unknown {} {:?}", stringify!($name), other)),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

status_enum!(
    /// Products: soft-deleted via `Deleted`.
    ProductStatus {
        Active => "active",
        Inactive => "inactive",
        Deleted => "deleted",
    }
);

status_enum!(
    /// Blog posts: soft-deleted via `Deleted`.
    PostStatus {
        Draft => "draft",
        Published => "published",
        Archived => "archived",
        Deleted => "deleted",
    }
);

status_enum!(
    /// FAQs and testimonials.
    VisibilityStatus {
        Active => "active",
        Inactive => "inactive",
    }
);

status_enum!(
    MessageStatus {
        Unread => "unread",
        Read => "read",
        Archived => "archived",
    }
);

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn require(field: &str, value: &str) -> Result<(), String> {
    if is_blank(value) {
        Err(format!("{} is required", field))
    } else {
        Ok(())
    }
}
