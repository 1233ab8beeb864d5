//! Data models for Jot

mod category;
mod note;

pub use category::{Category, CategoryPayload};
pub use note::{Note, NotePayload};
