//! Invalidation Module
//!
//! Named invalidation routines, called right after a write to the backing
//! store. Each routine removes more than strictly necessary: a change to one
//! product can show up in any list or search page, so all of those go too.

use tracing::debug;

use crate::cache::keys::{
    self, CATEGORY_LIST_PREFIX, PRODUCT_LIST_PREFIX, SEARCH_PREFIX, SETTINGS_PREFIX,
};
use crate::cache::Cache;

impl Cache {
    /// A product was created, updated or deleted.
    ///
    /// Drops the product itself, every product list and every search result.
    pub fn invalidate_product(&self, slug: &str) -> usize {
        let removed = usize::from(self.delete(&keys::product_key(slug)))
            + self.delete_pattern(PRODUCT_LIST_PREFIX)
            + self.delete_pattern(SEARCH_PREFIX);
        debug!(slug, removed, "invalidated product");
        removed
    }

    /// A category was created, updated or deleted.
    ///
    /// Drops the category, the category list and tree, and every product list
    /// and search result, since those embed category data.
    pub fn invalidate_category(&self, slug: &str) -> usize {
        let removed = usize::from(self.delete(&keys::category_key(slug)))
            + self.delete_pattern(CATEGORY_LIST_PREFIX)
            + self.delete_pattern(PRODUCT_LIST_PREFIX)
            + self.delete_pattern(SEARCH_PREFIX);
        debug!(slug, removed, "invalidated category");
        removed
    }

    /// Drops every cached search result.
    pub fn invalidate_search(&self) -> usize {
        let removed = self.delete_pattern(SEARCH_PREFIX);
        debug!(removed, "invalidated search results");
        removed
    }

    /// Drops everything cached for one user (cart, orders).
    pub fn invalidate_user(&self, user_id: impl std::fmt::Display) -> usize {
        let prefix = keys::user_prefix(&user_id);
        let removed = self.delete_pattern(&prefix);
        debug!(user = %user_id, removed, "invalidated user data");
        removed
    }

    /// Drops every settings key.
    pub fn invalidate_settings(&self) -> usize {
        let removed = self.delete_pattern(SETTINGS_PREFIX);
        debug!(removed, "invalidated settings");
        removed
    }
}
