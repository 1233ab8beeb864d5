//! Note collection view-model.
//!
//! Holds the currently displayed note list, scoped to a view (active,
//! archived, manage-categories) and an orthogonal category filter, and the
//! operations that mutate notes and categories while keeping the displayed
//! list consistent with the server. Every successful mutation re-fetches the
//! displayed list in full; the client never patches its cached copy.

use crate::api::NoteStore;
use crate::error::{Error, Result};
use crate::models::{Category, Note};
use crate::registry::CategoryRegistry;

/// Which list the board is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveView {
    Active,
    Archived,
    ManageCategories,
}

/// Category restriction on the displayed list.
///
/// A named filter goes through the single category endpoint, which does not
/// additionally restrict by archive state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    Name(String),
}

/// View-model mediating between the remote store and the presentation layer.
pub struct NoteBoard<A: NoteStore + Clone> {
    api: A,
    registry: CategoryRegistry<A>,
    view: ActiveView,
    filter: CategoryFilter,
    displayed: Vec<Note>,
    loading: bool,
    reload_seq: u64,
}

impl<A: NoteStore + Clone> NoteBoard<A> {
    pub fn new(api: A) -> Self {
        Self {
            registry: CategoryRegistry::new(api.clone()),
            api,
            view: ActiveView::Active,
            filter: CategoryFilter::All,
            displayed: Vec::new(),
            loading: false,
            reload_seq: 0,
        }
    }

    #[must_use]
    pub fn notes(&self) -> &[Note] {
        &self.displayed
    }

    #[must_use]
    pub const fn view(&self) -> ActiveView {
        self.view
    }

    #[must_use]
    pub const fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub const fn registry(&self) -> &CategoryRegistry<A> {
        &self.registry
    }

    /// Switch the view, resetting the category filter and reloading the list
    /// appropriate to the new view. `ManageCategories` performs no note
    /// reload.
    pub async fn switch_view(&mut self, view: ActiveView) -> Result<()> {
        self.view = view;
        self.filter = CategoryFilter::All;
        self.reload().await
    }

    /// Change the category filter and reload through the matching endpoint.
    pub async fn apply_filter(&mut self, filter: CategoryFilter) -> Result<()> {
        self.filter = filter;
        self.reload().await
    }

    /// Create a note, optionally tagged with categories resolved by id
    /// through the registry. Blank title or content is rejected locally.
    ///
    /// With categories this uses the create-with-categories endpoint; a
    /// partial failure on the server side surfaces as the error without
    /// rollback, and the note may still exist.
    pub async fn create_note(
        &mut self,
        title: &str,
        content: &str,
        category_ids: &[i64],
    ) -> Result<Note> {
        let (title, content) = validated_fields(title, content)?;

        let note = if category_ids.is_empty() {
            self.api.create(title, content).await?
        } else {
            let names = category_ids
                .iter()
                .map(|id| {
                    self.registry
                        .find_by_id(*id)
                        .map(|category| category.name.clone())
                        .ok_or_else(|| Error::Validation(format!("unknown category id {id}")))
                })
                .collect::<Result<Vec<_>>>()?;
            self.api
                .create_with_categories(title, content, &names)
                .await?
        };

        self.reload().await?;
        Ok(note)
    }

    /// Update a note's title and content. On failure the displayed state is
    /// left unchanged; no optimistic mutation survives a failed call.
    pub async fn update_note(&mut self, id: i64, title: &str, content: &str) -> Result<Note> {
        let (title, content) = validated_fields(title, content)?;
        let note = self.api.update(id, title, content).await?;
        self.reload().await?;
        Ok(note)
    }

    pub async fn delete_note(&mut self, id: i64) -> Result<()> {
        self.api.delete(id).await?;
        self.reload().await
    }

    pub async fn archive_note(&mut self, id: i64) -> Result<()> {
        self.api.archive(id).await?;
        self.reload().await
    }

    pub async fn unarchive_note(&mut self, id: i64) -> Result<()> {
        self.api.unarchive(id).await?;
        self.reload().await
    }

    /// Attach a category to a note, rejecting locally when the last-fetched
    /// snapshot of the note already carries it. The snapshot can be stale;
    /// the server remains authoritative after the reload.
    pub async fn add_category_to_note(&mut self, note_id: i64, category_id: i64) -> Result<()> {
        let already_tagged = self
            .displayed
            .iter()
            .find(|note| note.id == note_id)
            .is_some_and(|note| note.has_category(category_id));
        if already_tagged {
            return Err(Error::Validation(
                "note already has this category".to_string(),
            ));
        }
        self.api.attach_category(note_id, category_id).await?;
        self.reload().await
    }

    pub async fn remove_category_from_note(&mut self, note_id: i64, category_id: i64) -> Result<()> {
        self.api.detach_category(note_id, category_id).await?;
        self.reload().await
    }

    pub async fn refresh_categories(&mut self) -> Result<()> {
        self.registry.refresh().await?;
        Ok(())
    }

    pub async fn create_category(&mut self, name: &str) -> Result<Category> {
        self.registry.create(name).await
    }

    /// Delete a category. When the deleted category is the active filter the
    /// filter resets to `All` and the unfiltered list for the current view is
    /// reloaded.
    pub async fn delete_category(&mut self, id: i64) -> Result<()> {
        let deleted_name = self
            .registry
            .find_by_id(id)
            .map(|category| category.name.clone());
        self.registry.delete(id).await?;

        let filter_deleted = match (&self.filter, &deleted_name) {
            (CategoryFilter::Name(filter), Some(name)) => filter.eq_ignore_ascii_case(name),
            _ => false,
        };
        if filter_deleted {
            self.filter = CategoryFilter::All;
            self.reload().await?;
        }
        Ok(())
    }

    /// Re-fetch the displayed list for the current view and filter.
    ///
    /// Reloads are tagged with a monotonic sequence number; a response is
    /// applied only while its sequence is still the latest, so a stale
    /// response can never overwrite a newer view's state.
    async fn reload(&mut self) -> Result<()> {
        self.reload_seq += 1;
        let issued = self.reload_seq;
        self.loading = true;

        let result = match &self.filter {
            CategoryFilter::Name(name) => self.api.list_by_category(name).await,
            CategoryFilter::All => match self.view {
                ActiveView::Active => self.api.list_active().await,
                ActiveView::Archived => self.api.list_archived().await,
                ActiveView::ManageCategories => {
                    self.loading = false;
                    return Ok(());
                }
            },
        };

        self.loading = false;
        let notes = result?;
        // Reloads cannot overlap while callers hold `&mut self`; the guard
        // takes effect once the board is driven through a shared handle with
        // interleaved reloads.
        if self.reload_seq == issued {
            self.displayed = notes;
        } else {
            tracing::debug!(issued, latest = self.reload_seq, "discarding stale reload");
        }
        Ok(())
    }
}

fn validated_fields<'a>(title: &'a str, content: &'a str) -> Result<(&'a str, &'a str)> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::Validation("title must not be empty".to_string()));
    }
    let content = content.trim();
    if content.is_empty() {
        return Err(Error::Validation("content must not be empty".to_string()));
    }
    Ok((title, content))
}


#[cfg(test)]
mod tests {
    use super::testing::FakeStore;
    use super::*;
    use crate::api::NoteStore;
    use pretty_assertions::assert_eq;

    fn board(store: &FakeStore) -> NoteBoard<FakeStore> {
        NoteBoard::new(store.clone())
    }

    #[tokio::test]
    async fn switch_view_loads_the_matching_list() {
        let store = FakeStore::new();
        let kept = store.seed_note("Keep", "active note");
        let archived = store.seed_note("Old", "archived note");
        store.archive(archived.id).await.unwrap();

        let mut board = board(&store);
        board.switch_view(ActiveView::Active).await.unwrap();
        assert_eq!(board.notes().len(), 1);
        assert_eq!(board.notes()[0].id, kept.id);

        board.switch_view(ActiveView::Archived).await.unwrap();
        assert_eq!(board.notes().len(), 1);
        assert_eq!(board.notes()[0].id, archived.id);
    }

    #[tokio::test]
    async fn switch_view_resets_the_filter() {
        let store = FakeStore::new();
        let mut board = board(&store);
        board
            .apply_filter(CategoryFilter::Name("work".to_string()))
            .await
            .unwrap();

        board.switch_view(ActiveView::Active).await.unwrap();
        assert_eq!(*board.filter(), CategoryFilter::All);
    }

    #[tokio::test]
    async fn manage_categories_view_does_not_reload_notes() {
        let store = FakeStore::new();
        let mut board = board(&store);
        board
            .switch_view(ActiveView::ManageCategories)
            .await
            .unwrap();

        assert_eq!(store.call_count("list_active"), 0);
        assert_eq!(store.call_count("list_archived"), 0);
        assert!(!board.is_loading());
    }

    #[tokio::test]
    async fn create_note_appears_once_in_the_reloaded_list() {
        let store = FakeStore::new();
        let mut board = board(&store);
        board.switch_view(ActiveView::Active).await.unwrap();

        let created = board.create_note(" T ", " C ", &[]).await.unwrap();
        assert_eq!(created.title, "T");
        assert!(!created.archived);

        let matching: Vec<_> = board
            .notes()
            .iter()
            .filter(|note| note.title == "T" && note.content == "C")
            .collect();
        assert_eq!(matching.len(), 1);
    }

    #[tokio::test]
    async fn create_note_rejects_blank_fields_locally() {
        let store = FakeStore::new();
        let mut board = board(&store);

        assert!(matches!(
            board.create_note("  ", "content", &[]).await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            board.create_note("title", " \n ", &[]).await,
            Err(Error::Validation(_))
        ));
        assert_eq!(store.call_count("create"), 0);
    }

    #[tokio::test]
    async fn create_note_with_categories_resolves_ids_to_names() {
        let store = FakeStore::new();
        let work = store.seed_category("work");
        let urgent = store.seed_category("urgent");

        let mut board = board(&store);
        board.refresh_categories().await.unwrap();
        let created = board
            .create_note("T", "C", &[work.id, urgent.id])
            .await
            .unwrap();

        assert_eq!(
            created.category_names(),
            vec!["work".to_string(), "urgent".to_string()]
        );
        assert_eq!(store.call_count("create_with_categories"), 1);
        assert_eq!(store.call_count("create"), 0);
        assert!(board.notes().iter().any(|note| note.id == created.id));
    }

    #[tokio::test]
    async fn create_note_with_unknown_category_id_is_rejected() {
        let store = FakeStore::new();
        let mut board = board(&store);

        let error = board.create_note("T", "C", &[99]).await.unwrap_err();
        assert!(matches!(error, Error::Validation(_)));
        assert_eq!(store.call_count("create_with_categories"), 0);
    }

    #[tokio::test]
    async fn archive_moves_note_between_views() {
        let store = FakeStore::new();
        let note = store.seed_note("T", "C");
        let mut board = board(&store);
        board.switch_view(ActiveView::Active).await.unwrap();

        board.archive_note(note.id).await.unwrap();
        assert!(board.notes().is_empty());

        board.switch_view(ActiveView::Archived).await.unwrap();
        assert_eq!(board.notes()[0].id, note.id);

        board.unarchive_note(note.id).await.unwrap();
        assert!(board.notes().is_empty());

        board.switch_view(ActiveView::Active).await.unwrap();
        assert_eq!(board.notes()[0].id, note.id);
    }

    #[tokio::test]
    async fn delete_note_disappears_from_the_displayed_list() {
        let store = FakeStore::new();
        let note = store.seed_note("T", "C");
        let mut board = board(&store);
        board.switch_view(ActiveView::Active).await.unwrap();

        board.delete_note(note.id).await.unwrap();
        assert!(board.notes().is_empty());
    }

    #[tokio::test]
    async fn failed_update_leaves_displayed_state_unchanged() {
        let store = FakeStore::new();
        let note = store.seed_note("T", "C");
        let mut board = board(&store);
        board.switch_view(ActiveView::Active).await.unwrap();
        let before = board.notes().to_vec();

        store.fail_on("update");
        let error = board.update_note(note.id, "Other", "text").await.unwrap_err();
        assert!(matches!(error, Error::Server { status: 500, .. }));
        assert_eq!(board.notes(), before.as_slice());
    }

    #[tokio::test]
    async fn category_attach_detach_round_trips_through_reload() {
        let store = FakeStore::new();
        let note = store.seed_note("T", "C");
        let work = store.seed_category("work");
        let mut board = board(&store);
        board.switch_view(ActiveView::Active).await.unwrap();

        board.add_category_to_note(note.id, work.id).await.unwrap();
        assert!(board.notes()[0].has_category(work.id));

        board
            .remove_category_from_note(note.id, work.id)
            .await
            .unwrap();
        assert!(!board.notes()[0].has_category(work.id));

        board.add_category_to_note(note.id, work.id).await.unwrap();
        assert!(board.notes()[0].has_category(work.id));
    }

    #[tokio::test]
    async fn duplicate_attach_is_rejected_against_the_snapshot() {
        let store = FakeStore::new();
        let note = store.seed_note("T", "C");
        let work = store.seed_category("work");
        let mut board = board(&store);
        board.switch_view(ActiveView::Active).await.unwrap();
        board.add_category_to_note(note.id, work.id).await.unwrap();

        let error = board
            .add_category_to_note(note.id, work.id)
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Validation(_)));
        assert_eq!(store.call_count("attach_category"), 1);
    }

    #[tokio::test]
    async fn filter_shows_only_matching_notes_and_all_restores() {
        let store = FakeStore::new();
        let tagged = store.seed_note("Tagged", "C");
        store.seed_note("Plain", "C");
        let work = store.seed_category("work");
        store.attach_category(tagged.id, work.id).await.unwrap();

        let mut board = board(&store);
        board.switch_view(ActiveView::Active).await.unwrap();
        assert_eq!(board.notes().len(), 2);

        board
            .apply_filter(CategoryFilter::Name("work".to_string()))
            .await
            .unwrap();
        assert_eq!(board.notes().len(), 1);
        assert_eq!(board.notes()[0].id, tagged.id);

        board.apply_filter(CategoryFilter::All).await.unwrap();
        assert_eq!(board.notes().len(), 2);
    }

    #[tokio::test]
    async fn deleting_the_filtered_category_resets_to_the_full_list() {
        let store = FakeStore::new();
        let tagged = store.seed_note("Tagged", "C");
        store.seed_note("Plain", "C");
        let work = store.seed_category("work");
        store.attach_category(tagged.id, work.id).await.unwrap();

        let mut board = board(&store);
        board.refresh_categories().await.unwrap();
        board.switch_view(ActiveView::Active).await.unwrap();
        board
            .apply_filter(CategoryFilter::Name("work".to_string()))
            .await
            .unwrap();
        assert_eq!(board.notes().len(), 1);

        board.delete_category(work.id).await.unwrap();
        assert_eq!(*board.filter(), CategoryFilter::All);
        assert_eq!(board.notes().len(), 2);
    }

    #[tokio::test]
    async fn deleting_an_unrelated_category_keeps_the_filter() {
        let store = FakeStore::new();
        store.seed_note("T", "C");
        let work = store.seed_category("work");
        let personal = store.seed_category("personal");

        let mut board = board(&store);
        board.refresh_categories().await.unwrap();
        board
            .apply_filter(CategoryFilter::Name(work.name.clone()))
            .await
            .unwrap();

        board.delete_category(personal.id).await.unwrap();
        assert_eq!(*board.filter(), CategoryFilter::Name("work".to_string()));
    }
}
