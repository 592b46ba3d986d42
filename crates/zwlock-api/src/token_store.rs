// Persisted session token
//
// A single JSON blob `{"session": "<token>"}` under the plugin storage
// directory. Read when no session is held, rewritten after every login.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Error;

/// File name of the token blob inside the storage directory.
pub const TOKEN_FILE_NAME: &str = ".zwlock-token";

#[derive(Serialize, Deserialize)]
struct PersistedToken {
    session: String,
}

/// Key-value blob store for the gateway session token.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Store at an explicit file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `{dir}/.zwlock-token`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(TOKEN_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted token. A missing file is `Ok(None)`; anything
    /// unreadable or malformed is an error.
    pub async fn load(&self) -> Result<Option<SecretString>, Error> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no persisted token");
                return Ok(None);
            }
            Err(e) => {
                return Err(Error::TokenStore(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };

        let parsed: PersistedToken = serde_json::from_str(&contents).map_err(|e| {
            Error::TokenStore(format!("malformed token file {}: {e}", self.path.display()))
        })?;

        if parsed.session.is_empty() {
            return Ok(None);
        }
        Ok(Some(SecretString::from(parsed.session)))
    }

    /// Overwrite the blob with `token`.
    pub async fn save(&self, token: &SecretString) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    Error::TokenStore(format!("failed to create {}: {e}", parent.display()))
                })?;
            }
        }

        let body = serde_json::to_string(&PersistedToken {
            session: token.expose_secret().to_owned(),
        })
        .map_err(|e| Error::TokenStore(format!("failed to encode token: {e}")))?;

        tokio::fs::write(&self.path, body).await.map_err(|e| {
            Error::TokenStore(format!("failed to write {}: {e}", self.path.display()))
        })?;
        debug!(path = %self.path.display(), "session token persisted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::in_dir(dir.path());
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load_returns_same_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::in_dir(dir.path().join("nested"));
        store
            .save(&SecretString::from("abc123def".to_owned()))
            .await
            .unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, r#"{"session":"abc123def"}"#);

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.expose_secret(), "abc123def");
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::in_dir(dir.path());
        std::fs::write(store.path(), "not json").unwrap();
        assert!(matches!(store.load().await, Err(Error::TokenStore(_))));
    }
}
