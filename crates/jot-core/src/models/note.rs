//! Note model

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::models::category::{Category, CategoryPayload};

/// A user-authored title/content record, optionally archived, optionally
/// tagged with categories.
///
/// Notes are owned by the server; the client holds a transient cached copy
/// scoped to the current view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Server-assigned unique identifier
    pub id: i64,
    pub title: String,
    pub content: String,
    pub archived: bool,
    /// Categories attached to this note, in server order
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl Note {
    /// Check whether this note already carries the given category.
    #[must_use]
    pub fn has_category(&self, category_id: i64) -> bool {
        self.categories
            .iter()
            .any(|category| category.id == category_id)
    }

    /// Category names in server order.
    #[must_use]
    pub fn category_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .map(|category| category.name.clone())
            .collect()
    }

    /// First line of the content, truncated to `max_len` characters.
    #[must_use]
    pub fn content_preview(&self, max_len: usize) -> String {
        self.content
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(max_len)
            .collect()
    }
}

/// Raw note shape as received on the wire.
///
/// Converted with `TryFrom` to the strict model, failing closed with
/// `Error::Protocol` on missing or blank required fields.
#[derive(Debug, Deserialize)]
pub struct NotePayload {
    id: Option<i64>,
    title: Option<String>,
    content: Option<String>,
    archived: Option<bool>,
    categories: Option<Vec<CategoryPayload>>,
}

impl TryFrom<NotePayload> for Note {
    type Error = Error;

    fn try_from(value: NotePayload) -> Result<Self, Error> {
        let id = value
            .id
            .ok_or_else(|| Error::Protocol("note missing id".to_string()))?;
        let title = value
            .title
            .filter(|title| !title.trim().is_empty())
            .ok_or_else(|| Error::Protocol(format!("note {id} missing title")))?;
        let content = value
            .content
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| Error::Protocol(format!("note {id} missing content")))?;
        let categories = value
            .categories
            .unwrap_or_default()
            .into_iter()
            .map(Category::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id,
            title,
            content,
            archived: value.archived.unwrap_or(false),
            categories,
        })
    }
}
