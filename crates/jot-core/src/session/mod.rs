//! Session store: login, logout, and durable token persistence.
//!
//! The storage medium is injectable through [`SessionStorage`] so tests can
//! run against an in-memory fake instead of a real persistence medium.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use reqwest::Client;
use serde::Deserialize;

use crate::api::normalize_base_url;
use crate::error::{Error, Result};
use crate::util::compact_text;

const TOKEN_KEY: &str = "token";
const USERNAME_KEY: &str = "username";
const AUTH_TYPE_KEY: &str = "auth_type";

const DEFAULT_AUTH_TYPE: &str = "Basic";

/// The authenticated identity and credential material used to authorize
/// requests.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub auth_type: String,
}

impl fmt::Debug for Session {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("username", &self.username)
            .field("auth_type", &self.auth_type)
            .finish()
    }
}

/// Identity fields safe to show without the credential material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub username: String,
    pub auth_type: String,
}

/// Durable client-side key/value storage for session data.
pub trait SessionStorage: Clone + Send + Sync + 'static {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory [`SessionStorage`] used by tests and throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| Error::Storage("storage lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::Storage("storage lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::Storage("storage lock poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

/// Holds the auth token and username, persists them across runs, and signals
/// session expiry when any request reports a 401.
#[derive(Clone)]
pub struct SessionStore<S: SessionStorage> {
    base_url: String,
    client: Client,
    storage: S,
    expired: Arc<AtomicBool>,
}

impl<S: SessionStorage> SessionStore<S> {
    pub fn new(base_url: impl AsRef<str>, storage: S) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url.as_ref())?,
            client: Client::builder().build()?,
            storage,
            expired: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Authenticate against the backend and persist the resulting session.
    ///
    /// Blank credentials are rejected locally without a network call. On any
    /// network or server failure no session is established and any previously
    /// persisted session is cleared.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let username = username.trim();
        if username.is_empty() {
            return Err(Error::Validation("username must not be empty".to_string()));
        }
        if password.trim().is_empty() {
            return Err(Error::Validation("password must not be empty".to_string()));
        }

        let url = format!("{}/auth/login", self.base_url);
        let payload = serde_json::json!({
            "username": username,
            "password": password,
        });

        let response = match self.client.post(&url).json(&payload).send().await {
            Ok(response) => response,
            Err(error) => {
                self.clear()?;
                tracing::error!(%url, "login request failed: {error}");
                return Err(Error::Network(error.to_string()));
            }
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            self.clear()?;
            tracing::error!(%url, status, body = %compact_text(&body), "login rejected");
            return Err(Error::Server { status, body });
        }

        let body = response.text().await.map_err(Error::from)?;
        let payload: LoginPayload =
            serde_json::from_str(&body).map_err(|error| Error::Protocol(error.to_string()))?;
        let session = match payload.into_session(username) {
            Ok(session) => session,
            Err(error) => {
                self.clear()?;
                return Err(error);
            }
        };

        self.save(&session)?;
        self.expired.store(false, Ordering::Relaxed);
        Ok(session)
    }

    /// Clear persisted session data unconditionally.
    pub fn logout(&self) -> Result<()> {
        self.clear()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.storage.get(TOKEN_KEY), Ok(Some(token)) if !token.is_empty())
    }

    pub fn current_user(&self) -> Result<Option<CurrentUser>> {
        if !self.is_authenticated() {
            return Ok(None);
        }
        let username = self.storage.get(USERNAME_KEY)?.unwrap_or_default();
        let auth_type = self
            .storage
            .get(AUTH_TYPE_KEY)?
            .unwrap_or_else(|| DEFAULT_AUTH_TYPE.to_string());
        Ok(Some(CurrentUser {
            username,
            auth_type,
        }))
    }

    /// `Authorization` header value for outbound requests, when a session
    /// exists.
    pub fn authorization_header(&self) -> Result<Option<String>> {
        let Some(token) = self.storage.get(TOKEN_KEY)?.filter(|token| !token.is_empty()) else {
            return Ok(None);
        };
        let auth_type = self
            .storage
            .get(AUTH_TYPE_KEY)?
            .unwrap_or_else(|| DEFAULT_AUTH_TYPE.to_string());
        Ok(Some(format!("{auth_type} {token}")))
    }

    /// React to a 401 from any request: clear the session and raise the
    /// session-expired signal.
    pub fn handle_unauthorized(&self) -> Result<()> {
        self.clear()?;
        self.expired.store(true, Ordering::Relaxed);
        Ok(())
    }

    /// Observe and reset the session-expired signal.
    pub fn take_expired(&self) -> bool {
        self.expired.swap(false, Ordering::Relaxed)
    }

    pub(crate) fn save(&self, session: &Session) -> Result<()> {
        // Token is written last so a partially written session never looks
        // authenticated.
        self.storage.set(USERNAME_KEY, &session.username)?;
        self.storage.set(AUTH_TYPE_KEY, &session.auth_type)?;
        self.storage.set(TOKEN_KEY, &session.token)
    }

    fn clear(&self) -> Result<()> {
        // Token is removed first for the same reason it is written last.
        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(USERNAME_KEY)?;
        self.storage.remove(AUTH_TYPE_KEY)
    }
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    token: Option<String>,
    username: Option<String>,
    #[serde(rename = "authType")]
    auth_type: Option<String>,
}

impl LoginPayload {
    fn into_session(self, submitted_username: &str) -> Result<Session> {
        let token = self
            .token
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::Protocol("no authentication token received".to_string()))?;

        let username = self
            .username
            .filter(|username| !username.trim().is_empty())
            .unwrap_or_else(|| submitted_username.to_string());
        let auth_type = self
            .auth_type
            .filter(|auth_type| !auth_type.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_AUTH_TYPE.to_string());

        Ok(Session {
            token,
            username,
            auth_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store() -> SessionStore<MemoryStorage> {
        SessionStore::new("https://notes.example.com", MemoryStorage::new()).unwrap()
    }

    fn sample_session() -> Session {
        Session {
            token: "abc123".to_string(),
            username: "alice".to_string(),
            auth_type: "Basic".to_string(),
        }
    }

    #[tokio::test]
    async fn login_with_blank_username_is_rejected_locally() {
        let store = store();
        let error = store.login("   ", "pw").await.unwrap_err();
        assert!(matches!(error, Error::Validation(_)));
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn login_with_blank_password_is_rejected_locally() {
        let store = store();
        let error = store.login("alice", " \t ").await.unwrap_err();
        assert!(matches!(error, Error::Validation(_)));
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn failed_login_clears_any_previous_session() {
        // Port 1 is never listening, so the request fails without a response.
        let store = SessionStore::new("http://127.0.0.1:1", MemoryStorage::new()).unwrap();
        store.save(&sample_session()).unwrap();
        assert!(store.is_authenticated());

        let error = store.login("alice", "pw").await.unwrap_err();
        assert!(matches!(error, Error::Network(_)));
        assert!(!store.is_authenticated());
        assert_eq!(store.current_user().unwrap(), None);
    }

    #[test]
    fn saved_session_is_visible_through_accessors() {
        let store = store();
        store.save(&sample_session()).unwrap();

        assert!(store.is_authenticated());
        assert_eq!(
            store.current_user().unwrap(),
            Some(CurrentUser {
                username: "alice".to_string(),
                auth_type: "Basic".to_string(),
            })
        );
        assert_eq!(
            store.authorization_header().unwrap(),
            Some("Basic abc123".to_string())
        );
    }

    #[test]
    fn logout_clears_everything() {
        let store = store();
        store.save(&sample_session()).unwrap();
        store.logout().unwrap();

        assert!(!store.is_authenticated());
        assert_eq!(store.current_user().unwrap(), None);
        assert_eq!(store.authorization_header().unwrap(), None);
    }

    #[test]
    fn handle_unauthorized_clears_session_and_raises_signal() {
        let store = store();
        store.save(&sample_session()).unwrap();

        store.handle_unauthorized().unwrap();
        assert!(!store.is_authenticated());
        assert!(store.take_expired());
        // The signal resets on read.
        assert!(!store.take_expired());
    }

    #[test]
    fn login_payload_requires_token() {
        let payload = LoginPayload {
            token: None,
            username: Some("alice".to_string()),
            auth_type: None,
        };
        let error = payload.into_session("alice").unwrap_err();
        assert!(error.to_string().contains("no authentication token"));
    }

    #[test]
    fn login_payload_fills_defaults() {
        let payload = LoginPayload {
            token: Some("abc123".to_string()),
            username: None,
            auth_type: None,
        };
        let session = payload.into_session("alice").unwrap();
        assert_eq!(session, sample_session());
    }

    #[test]
    fn login_payload_parses_auth_type_field() {
        let payload: LoginPayload =
            serde_json::from_str(r#"{"token":"abc123","username":"alice","authType":"Bearer"}"#)
                .unwrap();
        let session = payload.into_session("alice").unwrap();
        assert_eq!(session.auth_type, "Bearer");
    }

    #[test]
    fn session_debug_redacts_token() {
        let rendered = format!("{:?}", sample_session());
        assert!(!rendered.contains("abc123"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
