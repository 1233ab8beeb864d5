//! jot-core - Core library for Jot
//!
//! This crate contains the session store, the remote note API client, the
//! category registry, and the note collection view-model shared by all Jot
//! interfaces.

pub mod api;
pub mod board;
pub mod error;
pub mod models;
pub mod registry;
pub mod session;
pub mod util;

pub use api::{NoteService, NoteStore};
pub use board::{ActiveView, CategoryFilter, NoteBoard};
pub use error::{Error, Result};
pub use models::{Category, Note};
pub use registry::CategoryRegistry;
pub use session::{CurrentUser, MemoryStorage, Session, SessionStorage, SessionStore};
