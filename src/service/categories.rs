use std::sync::Arc;

use crate::app::{Result, TributaryError};
use crate::domain::{Category, Feed, Marker};
use crate::store::Store;

/// Category management and category-wide marking.
pub struct CategoryService<S> {
    store: Arc<S>,
}

impl<S> Clone for CategoryService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: Store> CategoryService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn create(&self, user_id: i64, name: &str) -> Result<Category> {
        if name.trim().is_empty() {
            return Err(TributaryError::Validation("empty category name".into()));
        }
        let mut category = Category::new(user_id, name.to_string());
        category.id = self.store.add_category(&category)?;
        Ok(category)
    }

    pub fn category(&self, user_id: i64, id: i64) -> Result<Category> {
        self.store
            .category_with_id(user_id, id)?
            .ok_or(TributaryError::CategoryNotFound(id))
    }

    pub fn categories(&self, user_id: i64) -> Result<Vec<Category>> {
        self.store.categories_for_user(user_id)
    }

    pub fn rename(&self, user_id: i64, id: i64, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(TributaryError::Validation("empty category name".into()));
        }
        if !self.store.rename_category(user_id, id, name)? {
            return Err(TributaryError::CategoryNotFound(id));
        }
        Ok(())
    }

    /// Delete the category; its feeds stay subscribed, uncategorized.
    pub fn delete(&self, user_id: i64, id: i64) -> Result<()> {
        if !self.store.delete_category(user_id, id)? {
            return Err(TributaryError::CategoryNotFound(id));
        }
        Ok(())
    }

    pub fn feeds(&self, user_id: i64, id: i64) -> Result<Vec<Feed>> {
        self.category(user_id, id)?;
        self.store.feeds_in_category(user_id, id)
    }

    /// Mark every entry across every feed in the category.
    pub fn mark(&self, user_id: i64, id: i64, marker: Marker) -> Result<()> {
        self.category(user_id, id)?;
        self.store.set_marker_by_category(user_id, id, marker)?;
        Ok(())
    }
}
