//! Cache key namespace.
//!
//! Every cached resource gets a key built here, so two different queries can
//! never land on the same key and the same query always lands on the same one.
//!
//! Layout: `<family>:<segment>[:<segment>...]`. Caller-supplied text (slugs,
//! search queries, user ids) is form-urlencoded, so it never contains a raw
//! `:`, and any segment longer than [`MAX_SEGMENT_LEN`] is replaced by
//! `h` + the hex SHA-256 of the encoded text.
//!
//! | Family | Key |
//! |---|---|
//! | single product | `product:<slug>` |
//! | product list | `products:<page>:<limit>:<filters>` |
//! | products in a category | `products:in:<category>:<page>:<limit>` |
//! | featured products | `products:featured:<limit>` |
//! | single category | `category:<slug>` |
//! | category list / tree | `categories:all`, `categories:tree` |
//! | search | `search:<query>:<filters>` |
//! | per-user | `user:<id>:cart`, `user:<id>:orders:<page>` |
//! | settings | `settings:<name>` |

use std::collections::BTreeMap;
use std::fmt::Display;

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use url::form_urlencoded;

use crate::error::{CacheError, Result};

// == Family Prefixes ==
pub const PRODUCT_PREFIX: &str = "product:";
pub const PRODUCT_LIST_PREFIX: &str = "products:";
pub const CATEGORY_PREFIX: &str = "category:";
pub const CATEGORY_LIST_PREFIX: &str = "categories:";
pub const SEARCH_PREFIX: &str = "search:";
pub const USER_PREFIX: &str = "user:";
pub const SETTINGS_PREFIX: &str = "settings:";

/// Longest segment kept verbatim.
pub const MAX_SEGMENT_LEN: usize = 64;

/// Filter segment for an empty filter set.
pub const NO_FILTERS: &str = "none";

/// Default TTLs per family, in seconds.
///
/// Category and configuration data outlive product data, which outlives
/// search results. Per-user keys are short-lived and always user-scoped.
pub mod ttl {
    pub const CATEGORY: u64 = 7200;
    pub const CATEGORY_TREE: u64 = 7200;
    pub const SETTINGS: u64 = 3600;
    pub const PRODUCT: u64 = 600;
    pub const PRODUCT_LIST: u64 = 300;
    pub const SEARCH: u64 = 180;
    pub const USER: u64 = 60;
}

// == Filter Set ==
/// Named filter parameters with a stable, order-independent encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    params: BTreeMap<String, String>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter. A later value for the same name replaces the earlier one.
    pub fn with(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    /// Adds a filter only when a value is present.
    pub fn with_opt<V: Display>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with(name, value),
            None => self,
        }
    }

    /// Builds a filter set from any struct that serializes to a JSON object.
    ///
    /// `null` fields are dropped; strings are taken as-is and every other value
    /// uses its JSON text. Filters are compared by that text form, the same
    /// one [`FilterSet::with`] produces, so the string `"1"` and the number
    /// `1` select the same key.
    pub fn from_serialize<F: Serialize + ?Sized>(filters: &F) -> Result<Self> {
        let value = serde_json::to_value(filters)?;
        let Value::Object(fields) = value else {
            return Err(CacheError::InvalidRequest(
                "filters must serialize to an object".to_string(),
            ));
        };

        let params = fields
            .into_iter()
            .filter_map(|(name, value)| match value {
                Value::Null => None,
                Value::String(s) => Some((name, s)),
                other => Some((name, other.to_string())),
            })
            .collect();

        Ok(Self { params })
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Key segment for this filter set.
    ///
    /// Empty sets encode as [`NO_FILTERS`]; a non-empty encoding always
    /// contains `=`, so the two never meet.
    pub fn encode(&self) -> String {
        if self.params.is_empty() {
            return NO_FILTERS.to_string();
        }
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish();
        bounded(encoded)
    }
}

// == Key Builders ==
pub fn product_key(slug: &str) -> String {
    format!("{PRODUCT_PREFIX}{}", segment(slug))
}

pub fn products_key(page: u32, limit: u32, filters: &FilterSet) -> String {
    format!("{PRODUCT_LIST_PREFIX}{page}:{limit}:{}", filters.encode())
}

pub fn category_products_key(category_slug: &str, page: u32, limit: u32) -> String {
    format!(
        "{PRODUCT_LIST_PREFIX}in:{}:{page}:{limit}",
        segment(category_slug)
    )
}

pub fn featured_products_key(limit: u32) -> String {
    format!("{PRODUCT_LIST_PREFIX}featured:{limit}")
}

pub fn category_key(slug: &str) -> String {
    format!("{CATEGORY_PREFIX}{}", segment(slug))
}

pub fn categories_key() -> String {
    format!("{CATEGORY_LIST_PREFIX}all")
}

pub fn category_tree_key() -> String {
    format!("{CATEGORY_LIST_PREFIX}tree")
}

pub fn search_key(query: &str, filters: &FilterSet) -> String {
    format!("{SEARCH_PREFIX}{}:{}", segment(query), filters.encode())
}

/// Prefix shared by every key belonging to one user.
pub fn user_prefix(user_id: impl Display) -> String {
    format!("{USER_PREFIX}{}:", segment(&user_id.to_string()))
}

pub fn user_cart_key(user_id: impl Display) -> String {
    format!("{}cart", user_prefix(user_id))
}

pub fn user_orders_key(user_id: impl Display, page: u32) -> String {
    format!("{}orders:{page}", user_prefix(user_id))
}

pub fn settings_key(name: &str) -> String {
    format!("{SETTINGS_PREFIX}{}", segment(name))
}

pub fn site_settings_key() -> String {
    settings_key("site")
}

// == Encoding ==
/// Encodes caller-supplied text for use between `:` separators.
fn segment(raw: &str) -> String {
    bounded(form_urlencoded::byte_serialize(raw.as_bytes()).collect())
}

/// Keeps short segments verbatim and hashes long ones.
///
/// A hashed segment is always `MAX_SEGMENT_LEN + 1` characters, one more than
/// any verbatim segment can be.
fn bounded(encoded: String) -> String {
    if encoded.len() <= MAX_SEGMENT_LEN {
        return encoded;
    }
    let mut hasher = Sha256::new();
    hasher.update(encoded.as_bytes());
    format!("h{}", hex::encode(hasher.finalize()))
}
