//! Text and JSON rendering for note and category lists.

use jot_core::{Category, Note};
use serde::Serialize;

const PREVIEW_LEN: usize = 60;

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: i64,
    pub title: String,
    pub archived: bool,
    pub categories: Vec<String>,
    pub content: String,
}

pub fn note_items(notes: &[Note]) -> Vec<NoteListItem> {
    notes
        .iter()
        .map(|note| NoteListItem {
            id: note.id,
            title: note.title.clone(),
            archived: note.archived,
            categories: note.category_names(),
            content: note.content.clone(),
        })
        .collect()
}

pub fn format_note_lines(notes: &[Note]) -> Vec<String> {
    notes
        .iter()
        .map(|note| {
            let marker = if note.archived { " [archived]" } else { "" };
            let categories = if note.categories.is_empty() {
                String::new()
            } else {
                format!("  ({})", note.category_names().join(", "))
            };
            format!(
                "{:>5}  {}{marker}{categories}  {}",
                note.id,
                note.title,
                note.content_preview(PREVIEW_LEN)
            )
        })
        .collect()
}

pub fn format_category_lines(categories: &[Category]) -> Vec<String> {
    categories
        .iter()
        .map(|category| format!("{:>5}  {}", category.id, category.name))
        .collect()
}
