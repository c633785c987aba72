//! Client-held session: the `auth_token` and `user` cookie pair.
//!
//! Each entry holds JSON text, exactly as the web client keeps it in its
//! cookies. The file-backed store keeps them in
//! `<base>/session.json` with restricted permissions (0600). Tokens are never
//! logged.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use evento_types::User;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::paths;

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";
pub const USER_COOKIE: &str = "user";

/// A decoded credential pair. `user` is the server's user object as sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub auth_token: Value,
    pub user: Value,
}

impl Session {
    /// The stored user object read as a [`User`], if it has that shape.
    pub fn user_info(&self) -> Option<User> {
        serde_json::from_value(self.user.clone()).ok()
    }

    /// Encodes the pair as cookie values (JSON text).
    ///
    /// # Errors
    /// Returns an error if either value fails to serialize.
    pub fn to_cookies(&self) -> Result<CookieJar> {
        let mut jar = CookieJar::default();
        jar.set(
            AUTH_TOKEN_COOKIE,
            serde_json::to_string(&self.auth_token).context("Failed to encode auth token")?,
        );
        jar.set(
            USER_COOKIE,
            serde_json::to_string(&self.user).context("Failed to encode user")?,
        );
        Ok(jar)
    }

    /// Decodes a session from cookies. Both entries must be present and valid.
    pub fn from_cookies(jar: &CookieJar) -> Option<Self> {
        let auth_token = serde_json::from_str(jar.get(AUTH_TOKEN_COOKIE)?).ok()?;
        let user = serde_json::from_str(jar.get(USER_COOKIE)?).ok()?;
        Some(Self { auth_token, user })
    }

    /// `Cookie` request header carrying both entries, form-url-encoded.
    ///
    /// # Errors
    /// Returns an error if either value fails to serialize.
    pub fn cookie_header(&self) -> Result<String> {
        Ok(self.to_cookies()?.header_value())
    }
}

/// Name -> raw cookie value.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieJar {
    #[serde(flatten)]
    pub cookies: BTreeMap<String, String>,
}

impl CookieJar {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: &str, value: String) {
        self.cookies.insert(name.to_string(), value);
    }

    /// Renders `name=value; name=value` with values form-url-encoded.
    pub fn header_value(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| {
                let encoded: String = url::form_urlencoded::byte_serialize(value.as_bytes()).collect();
                format!("{name}={encoded}")
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Session storage shared by the API client and the CLI.
pub trait SessionStore: Send + Sync {
    /// Returns the current session, or `None` when logged out.
    fn load(&self) -> Option<Session>;

    /// Persists a session, replacing any previous one.
    ///
    /// # Errors
    /// Returns an error if the session cannot be stored.
    fn save(&self, session: &Session) -> Result<()>;

    /// Clears the session.
    ///
    /// # Errors
    /// Returns an error if stored state cannot be removed.
    fn reset(&self) -> Result<()>;

    fn is_logged_in(&self) -> bool {
        self.load().is_some()
    }

    fn user(&self) -> Option<User> {
        self.load().as_ref().and_then(Session::user_info)
    }

    fn auth_token(&self) -> Option<Value> {
        self.load().map(|s| s.auth_token)
    }
}

/// Session kept in memory only.
#[derive(Debug, Default)]
pub struct MemorySession {
    inner: Mutex<Option<Session>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logged_in(session: Session) -> Self {
        Self {
            inner: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySession {
    fn load(&self) -> Option<Session> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn save(&self, session: &Session) -> Result<()> {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn reset(&self) -> Result<()> {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Session persisted as a cookie jar on disk.
#[derive(Debug, Clone)]
pub struct CookieFileSession {
    path: PathBuf,
}

impl CookieFileSession {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `$EVENTO_HOME/session.json`.
    pub fn default_location() -> Self {
        Self::new(paths::session_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the jar. A missing file is an empty jar.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn read_jar(&self) -> Result<CookieJar> {
        if !self.path.exists() {
            return Ok(CookieJar::default());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session from {}", self.path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse session from {}", self.path.display()))
    }

    fn write_jar(&self, jar: &CookieJar) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents = serde_json::to_string_pretty(jar).context("Failed to serialize session")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.path, contents)
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        Ok(())
    }
}

impl SessionStore for CookieFileSession {
    fn load(&self) -> Option<Session> {
        match self.read_jar() {
            Ok(jar) => Session::from_cookies(&jar),
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "ignoring unreadable session file");
                None
            }
        }
    }

    fn save(&self, session: &Session) -> Result<()> {
        self.write_jar(&session.to_cookies()?)?;
        tracing::debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    fn reset(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove {}", self.path.display()))?;
        }
        tracing::debug!(path = %self.path.display(), "session reset");
        Ok(())
    }
}
