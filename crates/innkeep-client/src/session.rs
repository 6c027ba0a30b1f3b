//! Session store: the single published "who is logged in" value.
//!
//! The current identity lives in a [`tokio::sync::watch`] channel. Readers
//! always see the latest published value; subscribers are RAII handles that
//! stop observing when dropped. The identity is persisted to a
//! [`SessionStorage`] so it survives restarts.

use std::{
  collections::HashMap,
  fs, io,
  path::{Path, PathBuf},
  sync::{Arc, Mutex, PoisonError},
};

use innkeep_core::{Category, Identity, ValidationError, gateway::Gateway};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::{Error, Result};

/// Storage key for the serialised identity.
pub const CURRENT_USER_KEY: &str = "currentUser";
/// Storage key for the editor-mode grant.
pub const EDITOR_GRANT_KEY: &str = "editorGrant";

// ─── Durable storage ─────────────────────────────────────────────────────────

/// Small durable key/value storage for client state.
pub trait SessionStorage: Send + Sync {
  fn load(&self, key: &str) -> Result<Option<String>>;
  fn save(&self, key: &str, value: &str) -> Result<()>;
  /// Removing an absent key is not an error.
  fn remove(&self, key: &str) -> Result<()>;
}

/// One JSON file per key inside a state directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
  dir: PathBuf,
}

impl FileStorage {
  /// Use `dir` for state, creating it if necessary.
  pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
    let dir = dir.as_ref().to_path_buf();
    fs::create_dir_all(&dir).map_err(|source| Error::Storage {
      key: dir.display().to_string(),
      source,
    })?;
    Ok(Self { dir })
  }

  fn path(&self, key: &str) -> PathBuf { self.dir.join(format!("{key}.json")) }
}

impl SessionStorage for FileStorage {
  fn load(&self, key: &str) -> Result<Option<String>> {
    match fs::read_to_string(self.path(key)) {
      Ok(raw) => Ok(Some(raw)),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
      Err(source) => Err(Error::Storage { key: key.to_owned(), source }),
    }
  }

  fn save(&self, key: &str, value: &str) -> Result<()> {
    // Write-then-rename so a crash never leaves a half-written file.
    let tmp = self.dir.join(format!(".{key}.json.tmp"));
    fs::write(&tmp, value)
      .and_then(|()| fs::rename(&tmp, self.path(key)))
      .map_err(|source| Error::Storage { key: key.to_owned(), source })
  }

  fn remove(&self, key: &str) -> Result<()> {
    match fs::remove_file(self.path(key)) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
      Err(source) => Err(Error::Storage { key: key.to_owned(), source }),
    }
  }
}

/// Process-local storage, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
  entries: Mutex<HashMap<String, String>>,
}

impl SessionStorage for MemoryStorage {
  fn load(&self, key: &str) -> Result<Option<String>> {
    let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
    Ok(entries.get(key).cloned())
  }

  fn save(&self, key: &str, value: &str) -> Result<()> {
    let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
    entries.insert(key.to_owned(), value.to_owned());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<()> {
    let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
    entries.remove(key);
    Ok(())
  }
}

pub(crate) fn load_json<T: DeserializeOwned>(
  storage: &dyn SessionStorage,
  key: &str,
) -> Result<Option<T>> {
  storage
    .load(key)?
    .map(|raw| serde_json::from_str(&raw))
    .transpose()
    .map_err(|source| Error::Json { key: key.to_owned(), source })
}

pub(crate) fn save_json<T: Serialize>(
  storage: &dyn SessionStorage,
  key: &str,
  value: &T,
) -> Result<()> {
  let raw =
    serde_json::to_string(value).map_err(|source| Error::Json { key: key.to_owned(), source })?;
  storage.save(key, &raw)
}

// ─── Session store ───────────────────────────────────────────────────────────

/// A live view of the current identity.
///
/// Dropping the subscription ends it; nothing else needs to be released.
#[derive(Debug, Clone)]
pub struct Subscription {
  rx: watch::Receiver<Option<Identity>>,
}

impl Subscription {
  /// The latest published identity.
  pub fn current(&self) -> Option<Identity> { self.rx.borrow().clone() }

  /// Wait for the next change. Returns `None` once the store is gone.
  pub async fn changed(&mut self) -> Option<Option<Identity>> {
    self.rx.changed().await.ok()?;
    Some(self.rx.borrow_and_update().clone())
  }

  /// The identity published since the last look, without waiting.
  pub fn take_change(&mut self) -> Option<Option<Identity>> {
    match self.rx.has_changed() {
      Ok(true) => Some(self.rx.borrow_and_update().clone()),
      Ok(false) | Err(_) => None,
    }
  }
}

pub struct SessionStore<G> {
  gateway: Arc<G>,
  storage: Arc<dyn SessionStorage>,
  tx:      watch::Sender<Option<Identity>>,
}

impl<G: Gateway> SessionStore<G> {
  /// Restore the persisted identity, if any. Unreadable state is discarded
  /// and the store starts logged out.
  pub fn open(gateway: Arc<G>, storage: Arc<dyn SessionStorage>) -> Result<Self> {
    let restored = match load_json::<Identity>(storage.as_ref(), CURRENT_USER_KEY) {
      Ok(identity) => identity,
      Err(e @ Error::Json { .. }) => {
        warn!(error = %e, "discarding unreadable session");
        storage.remove(CURRENT_USER_KEY)?;
        None
      }
      Err(e) => return Err(e),
    };
    let (tx, _) = watch::channel(restored);
    Ok(Self { gateway, storage, tx })
  }

  pub fn gateway(&self) -> &Arc<G> { &self.gateway }

  pub fn storage(&self) -> &Arc<dyn SessionStorage> { &self.storage }

  /// The identity as of now; never a stale capture.
  pub fn current(&self) -> Option<Identity> { self.tx.borrow().clone() }

  pub fn subscribe(&self) -> Subscription { Subscription { rx: self.tx.subscribe() } }

  /// Exchange credentials for an identity, persist it and publish it.
  ///
  /// On any failure the stored and published identity are left untouched.
  pub async fn login(&self, username: &str, password: &str) -> Result<Identity> {
    if username.trim().is_empty() {
      return Err(ValidationError::required("username").into());
    }
    if password.is_empty() {
      return Err(ValidationError::required("password").into());
    }
    let identity = self.gateway.login(username.trim(), password).await.inspect_err(|e| {
      warn!(username = username.trim(), error = %e, "login rejected");
    })?;
    save_json(self.storage.as_ref(), CURRENT_USER_KEY, &identity)?;
    info!(username = %identity.username, role = %identity.role, "logged in");
    self.tx.send_replace(Some(identity.clone()));
    Ok(identity)
  }

  /// Forget the identity and any editor grant, then publish `None`.
  pub fn logout(&self) -> Result<()> {
    let removed = self
      .storage
      .remove(CURRENT_USER_KEY)
      .and(self.storage.remove(EDITOR_GRANT_KEY));
    if let Some(previous) = self.tx.send_replace(None) {
      info!(username = %previous.username, "logged out");
    }
    removed
  }

  /// Re-validate the stored identity against the backend.
  ///
  /// A rejection forces a logout and yields `false`. Transport failures are
  /// returned as errors and leave the session alone.
  pub async fn verify_session(&self) -> Result<bool> {
    let Some(identity) = self.current() else {
      return Ok(false);
    };
    match self.gateway.verify_session(&identity.username).await {
      Ok(()) => Ok(true),
      Err(e) if e.category() == Category::Auth => {
        warn!(username = %identity.username, error = %e, "session rejected");
        self.logout()?;
        Ok(false)
      }
      Err(e) => Err(e.into()),
    }
  }
}
