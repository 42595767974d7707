//! Session authentication against the archive site.
//!
//! The site hands out a long-lived session cookie after a form login. The
//! cookie is wrapped in a [`Credential`] and persisted through a
//! [`CredentialStore`] so later runs skip the login round-trip. Storage is
//! injected rather than hardwired; the default store is a JSON file in the
//! user config directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::archive::USER_AGENT;
use crate::error::{Error, Result};

const LOGIN_URL: &str = "https://www.broadcastify.com/login/";
const SESSION_COOKIE: &str = "bcfyuser1";

/// An authenticated archive session, consumed as an opaque cookie header by
/// the listing and download calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    session: String,
}

impl Credential {
    pub fn new(session: impl Into<String>) -> Self {
        Self {
            session: session.into(),
        }
    }

    /// Value for the `cookie` request header.
    pub fn header_value(&self) -> String {
        format!("{SESSION_COOKIE}={}", self.session)
    }
}

/// Load/save strategy for the session credential.
pub trait CredentialStore {
    /// Returns the stored credential, or `None` if none has been saved yet.
    fn load(&self) -> Result<Option<Credential>>;
    fn save(&self, credential: &Credential) -> Result<()>;
}

/// Credential persisted as a small JSON file.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location: `<config dir>/feedarchive/session.json`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("feedarchive")
            .join("session.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for JsonFileStore {
    fn load(&self) -> Result<Option<Credential>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)?;
        let credential = serde_json::from_str(&contents)?;
        debug!(path = %self.path.display(), "loaded session credential");
        Ok(Some(credential))
    }

    fn save(&self, credential: &Credential) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(credential)?)?;
        debug!(path = %self.path.display(), "saved session credential");
        Ok(())
    }
}

/// Log in with account credentials and return the session cookie.
///
/// The site answers a successful form login with a redirect carrying the
/// session cookie; redirects are left unfollowed so the `set-cookie` header
/// stays observable.
pub async fn login(username: &str, password: &str) -> Result<Credential> {
    info!("logging in to archive site");

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::none())
        .build()?;

    let response = client
        .post(LOGIN_URL)
        .form(&[
            ("username", username),
            ("password", password),
            ("action", "auth"),
            ("redirect", "https://www.broadcastify.com"),
        ])
        .send()
        .await?;

    if !response.status().is_redirection() {
        return Err(Error::Auth(format!(
            "login rejected (status {})",
            response.status()
        )));
    }

    for header in response.headers().get_all(reqwest::header::SET_COOKIE) {
        if let Some(session) = header.to_str().ok().and_then(extract_session) {
            return Ok(Credential::new(session));
        }
    }

    Err(Error::Auth("login response carried no session cookie".into()))
}

/// Load the stored credential, or log in and persist a fresh one.
pub async fn ensure_credential(
    store: &dyn CredentialStore,
    username: &str,
    password: &str,
) -> Result<Credential> {
    if let Some(credential) = store.load()? {
        return Ok(credential);
    }

    let credential = login(username, password).await?;
    if let Err(e) = store.save(&credential) {
        warn!(error = %e, "failed to persist session credential");
    }
    Ok(credential)
}

/// Pull the session value out of a `set-cookie` header.
fn extract_session(header: &str) -> Option<String> {
    let rest = header.split_once(&format!("{SESSION_COOKIE}="))?.1;
    let value = rest.split(';').next()?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_value() {
        let credential = Credential::new("abc123");
        assert_eq!(credential.header_value(), "bcfyuser1=abc123");
    }

    #[test]
    fn test_extract_session() {
        assert_eq!(
            extract_session("bcfyuser1=tok-42; Path=/; HttpOnly").as_deref(),
            Some("tok-42")
        );
        assert_eq!(extract_session("bcfyuser1=last").as_deref(), Some("last"));
        assert_eq!(extract_session("other=1; Path=/"), None);
        assert_eq!(extract_session("bcfyuser1=; Path=/"), None);
    }

    #[test]
    fn test_json_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("session.json"));

        assert!(store.load().unwrap().is_none());

        store.save(&Credential::new("persisted")).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.header_value(), "bcfyuser1=persisted");
    }

    #[test]
    fn test_json_store_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/deeper/session.json"));
        store.save(&Credential::new("x")).unwrap();
        assert!(store.load().unwrap().is_some());
    }
}
