//! In-memory cache of known categories, refreshed from the remote service.

use crate::api::NoteStore;
use crate::error::{Error, Result};
use crate::models::Category;

/// Category cache used to populate filters and per-note tagging.
///
/// The registry never fabricates optimistic entries: after any create or
/// delete the cache is replaced wholesale by a refresh from the server.
pub struct CategoryRegistry<A: NoteStore> {
    api: A,
    categories: Vec<Category>,
}

impl<A: NoteStore> CategoryRegistry<A> {
    pub const fn new(api: A) -> Self {
        Self {
            api,
            categories: Vec::new(),
        }
    }

    /// Replace the full cached set from the server.
    pub async fn refresh(&mut self) -> Result<&[Category]> {
        self.categories = self.api.list_categories().await?;
        Ok(&self.categories)
    }

    /// Create a category, rejecting blank names locally, then refresh.
    pub async fn create(&mut self, name: &str) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation(
                "category name must not be empty".to_string(),
            ));
        }
        let category = self.api.create_category(name).await?;
        self.refresh().await?;
        Ok(category)
    }

    /// Delete a category by id, then refresh.
    pub async fn delete(&mut self, id: i64) -> Result<()> {
        self.api.delete_category(id).await?;
        self.refresh().await?;
        Ok(())
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    #[must_use]
    pub fn find_by_id(&self, id: i64) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    /// Case-insensitive name lookup.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Category> {
        let name = name.trim();
        self.categories
            .iter()
            .find(|category| category.name.eq_ignore_ascii_case(name))
    }
}
