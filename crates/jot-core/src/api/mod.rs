//! Remote note service: a stateless async wrapper over the backend API.
//!
//! Every request carries the `Authorization` header read from the session
//! store at send time. Failures are classified as `Network` (no response),
//! `Server` (failure status), or `Protocol` (malformed success payload).
//! A 401 on any request clears the session as a side effect.

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, StatusCode};

use crate::error::{Error, Result};
use crate::models::{Category, CategoryPayload, Note, NotePayload};
use crate::session::{SessionStorage, SessionStore};
use crate::util::{compact_text, is_http_url, normalize_category_names};

/// Operations of the remote note store.
///
/// `NoteService` is the production implementation; the registry and the
/// view-model are generic over this trait so tests can drive them with an
/// in-memory fake.
#[allow(async_fn_in_trait)]
pub trait NoteStore {
    async fn list_active(&self) -> Result<Vec<Note>>;
    async fn list_archived(&self) -> Result<Vec<Note>>;
    async fn list_by_category(&self, name: &str) -> Result<Vec<Note>>;

    async fn create(&self, title: &str, content: &str) -> Result<Note>;
    /// Category names are normalized (trimmed, de-duplicated in order)
    /// before transmission.
    async fn create_with_categories(
        &self,
        title: &str,
        content: &str,
        categories: &[String],
    ) -> Result<Note>;
    async fn update(&self, id: i64, title: &str, content: &str) -> Result<Note>;
    async fn delete(&self, id: i64) -> Result<()>;
    async fn archive(&self, id: i64) -> Result<()>;
    async fn unarchive(&self, id: i64) -> Result<()>;

    async fn list_categories(&self) -> Result<Vec<Category>>;
    async fn create_category(&self, name: &str) -> Result<Category>;
    async fn delete_category(&self, id: i64) -> Result<()>;

    async fn attach_category(&self, note_id: i64, category_id: i64) -> Result<()>;
    async fn detach_category(&self, note_id: i64, category_id: i64) -> Result<()>;
}

/// Production [`NoteStore`] backed by the HTTP API.
///
/// Repeating `create`/`attach_category` creates duplicates on the server;
/// this layer performs no retries and no deduplication.
#[derive(Clone)]
pub struct NoteService<S: SessionStorage> {
    base_url: String,
    client: Client,
    session: SessionStore<S>,
}

impl<S: SessionStorage> NoteService<S> {
    pub fn new(base_url: impl AsRef<str>, session: SessionStore<S>) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url.as_ref())?,
            client: Client::builder().build()?,
            session,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Send a request with the session's `Authorization` header attached and
    /// return the raw success body.
    async fn execute(&self, request: RequestBuilder, url: &str) -> Result<String> {
        let request = match self.session.authorization_header()? {
            Some(header) => request.header(AUTHORIZATION, header),
            None => request,
        };

        let response = match request.send().await {
            Ok(response) => response,
            Err(error) => {
                tracing::error!(url, "request failed: {error}");
                return Err(Error::Network(error.to_string()));
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        classify_response(url, status, body, &self.session)
    }

    async fn get_json(&self, path: &str) -> Result<String> {
        let url = self.url(path);
        self.execute(self.client.get(&url), &url).await
    }

    async fn post_empty(&self, path: &str) -> Result<()> {
        let url = self.url(path);
        self.execute(self.client.post(&url), &url).await?;
        Ok(())
    }

    async fn post_note_body(&self, path: &str, title: &str, content: &str) -> Result<Note> {
        let url = self.url(path);
        let payload = serde_json::json!({ "title": title, "content": content });
        let body = self
            .execute(self.client.post(&url).json(&payload), &url)
            .await?;
        parse_json::<NotePayload>(&body)?.try_into()
    }
}

impl<S: SessionStorage> NoteStore for NoteService<S> {
    async fn list_active(&self) -> Result<Vec<Note>> {
        parse_notes(&self.get_json("/notes/active").await?)
    }

    async fn list_archived(&self) -> Result<Vec<Note>> {
        parse_notes(&self.get_json("/notes/archived").await?)
    }

    async fn list_by_category(&self, name: &str) -> Result<Vec<Note>> {
        let path = format!("/notes/category/{}", urlencoding::encode(name));
        parse_notes(&self.get_json(&path).await?)
    }

    async fn create(&self, title: &str, content: &str) -> Result<Note> {
        self.post_note_body("/notes", title, content).await
    }

    async fn create_with_categories(
        &self,
        title: &str,
        content: &str,
        categories: &[String],
    ) -> Result<Note> {
        let path = format!(
            "/notes/with-categories?categories={}",
            categories_query(categories)
        );
        self.post_note_body(&path, title, content).await
    }

    async fn update(&self, id: i64, title: &str, content: &str) -> Result<Note> {
        let url = self.url(&format!("/notes/{id}"));
        let payload = serde_json::json!({ "title": title, "content": content });
        let body = self
            .execute(self.client.put(&url).json(&payload), &url)
            .await?;
        parse_json::<NotePayload>(&body)?.try_into()
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let url = self.url(&format!("/notes/{id}"));
        self.execute(self.client.delete(&url), &url).await?;
        Ok(())
    }

    async fn archive(&self, id: i64) -> Result<()> {
        self.post_empty(&format!("/notes/{id}/archive")).await
    }

    async fn unarchive(&self, id: i64) -> Result<()> {
        self.post_empty(&format!("/notes/{id}/unarchive")).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let body = self.get_json("/categories").await?;
        parse_json::<Vec<CategoryPayload>>(&body)?
            .into_iter()
            .map(Category::try_from)
            .collect()
    }

    async fn create_category(&self, name: &str) -> Result<Category> {
        let url = self.url(&format!("/categories?name={}", urlencoding::encode(name)));
        let body = self.execute(self.client.post(&url), &url).await?;
        parse_json::<CategoryPayload>(&body)?.try_into()
    }

    async fn delete_category(&self, id: i64) -> Result<()> {
        let url = self.url(&format!("/categories/{id}"));
        self.execute(self.client.delete(&url), &url).await?;
        Ok(())
    }

    async fn attach_category(&self, note_id: i64, category_id: i64) -> Result<()> {
        self.post_empty(&format!("/notes/{note_id}/categories/{category_id}"))
            .await
    }

    async fn detach_category(&self, note_id: i64, category_id: i64) -> Result<()> {
        let url = self.url(&format!("/notes/{note_id}/categories/{category_id}"));
        self.execute(self.client.delete(&url), &url).await?;
        Ok(())
    }
}

/// Classify a response: 401 clears the session, failure statuses become
/// `Error::Server`, success returns the body.
fn classify_response<S: SessionStorage>(
    url: &str,
    status: StatusCode,
    body: String,
    session: &SessionStore<S>,
) -> Result<String> {
    if status == StatusCode::UNAUTHORIZED {
        session.handle_unauthorized()?;
    }
    if status.is_success() {
        return Ok(body);
    }
    tracing::error!(
        url,
        status = status.as_u16(),
        body = %compact_text(&body),
        "server returned failure status"
    );
    Err(Error::Server {
        status: status.as_u16(),
        body,
    })
}

fn parse_json<T: serde::de::DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|error| Error::Protocol(error.to_string()))
}

fn parse_notes(body: &str) -> Result<Vec<Note>> {
    parse_json::<Vec<NotePayload>>(body)?
        .into_iter()
        .map(Note::try_from)
        .collect()
}

/// Build the `categories` query-string value: normalized names, comma-joined,
/// url-encoded.
fn categories_query(names: &[String]) -> String {
    let joined = normalize_category_names(names).join(",");
    urlencoding::encode(&joined).into_owned()
}

/// Normalize an API base URL: scheme required, trailing slash trimmed, `/api`
/// base path appended when missing.
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::Validation("API URL must not be empty".to_string()));
    }
    if !is_http_url(trimmed) {
        return Err(Error::Validation(
            "API URL must include http:// or https://".to_string(),
        ));
    }
    if trimmed.ends_with("/api") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/api"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemoryStorage;
    use pretty_assertions::assert_eq;

    fn session() -> SessionStore<MemoryStorage> {
        SessionStore::new("https://notes.example.com", MemoryStorage::new()).unwrap()
    }

    #[test]
    fn normalize_base_url_appends_api_path() {
        let normalized = normalize_base_url("https://notes.example.com/").unwrap();
        assert_eq!(normalized, "https://notes.example.com/api");
    }

    #[test]
    fn normalize_base_url_keeps_existing_api_path() {
        let normalized = normalize_base_url("https://notes.example.com/api").unwrap();
        assert_eq!(normalized, "https://notes.example.com/api");
    }

    #[test]
    fn normalize_base_url_rejects_invalid_values() {
        assert!(normalize_base_url("   ").is_err());
        assert!(normalize_base_url("notes.example.com").is_err());
    }

    #[test]
    fn categories_query_normalizes_and_encodes() {
        let names = vec![" work ".to_string(), "urgent".to_string(), "work".to_string()];
        assert_eq!(categories_query(&names), "work%2Curgent");
    }

    #[test]
    fn categories_query_encodes_spaces_in_names() {
        let names = vec!["project x".to_string()];
        assert_eq!(categories_query(&names), "project%20x");
    }

    #[test]
    fn classify_response_returns_success_body() {
        let body = classify_response("https://x/api/notes", StatusCode::OK, "[]".to_string(), &session())
            .unwrap();
        assert_eq!(body, "[]");
    }

    #[test]
    fn classify_response_maps_failure_status() {
        let error = classify_response(
            "https://x/api/notes",
            StatusCode::INTERNAL_SERVER_ERROR,
            "boom".to_string(),
            &session(),
        )
        .unwrap_err();
        assert!(matches!(error, Error::Server { status: 500, ref body } if body == "boom"));
    }

    #[test]
    fn any_401_clears_the_session() {
        let session = session();
        session
            .save(&crate::session::Session {
                token: "abc123".to_string(),
                username: "alice".to_string(),
                auth_type: "Basic".to_string(),
            })
            .unwrap();

        let error = classify_response(
            "https://x/api/notes/1/archive",
            StatusCode::UNAUTHORIZED,
            String::new(),
            &session,
        )
        .unwrap_err();

        assert!(error.is_unauthorized());
        assert!(!session.is_authenticated());
        assert!(session.take_expired());
    }

    #[test]
    fn parse_notes_fails_closed_on_bad_element() {
        let error = parse_notes(r#"[{"id": 1, "title": "T"}]"#).unwrap_err();
        assert!(matches!(error, Error::Protocol(_)));
    }

    #[test]
    fn parse_notes_accepts_full_payload() {
        let notes = parse_notes(
            r#"[{"id": 1, "title": "T", "content": "C", "archived": false,
                "categories": [{"id": 2, "name": "work"}]}]"#,
        )
        .unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].category_names(), vec!["work".to_string()]);
    }
}
