//! # Application State
//!
//! Shared state for the Axum application. Everything here is caller-owned:
//! the binary builds one [`AppState`] and hands it to [`crate::app`], tests
//! build their own.
//!
//! - **Users** — demo resource behind the typed user routes.
//! - **Pages** — ISR page cache.
//! - **Realtime** — room hub for broadcast and presence.
//! - **Build cache** — optional on-disk artifact cache.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zenith_cache::{BuildCache, CacheError, PageCache};
use zenith_realtime::RealtimeHub;

use crate::route::DEFAULT_BODY_LIMIT;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory store keyed by UUID.
///
/// The lock is `parking_lot` and is never held across an `.await`.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Retrieve a record by ID.
    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// List all records, in no particular order.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// First record matching `predicate`.
    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        self.data.read().values().find(|v| predicate(v)).cloned()
    }

    /// Insert unless a record matching `conflict` exists. Check and insert
    /// happen under one write lock.
    pub fn insert_unless(&self, id: Uuid, value: T, conflict: impl Fn(&T) -> bool) -> bool {
        let mut guard = self.data.write();
        if guard.values().any(conflict) {
            return false;
        }
        guard.insert(id, value);
        true
    }

    /// Update a record in place. Returns the updated record, or `None` if not found.
    pub fn update(&self, id: &Uuid, f: impl FnOnce(&mut T)) -> Option<T> {
        let mut guard = self.data.write();
        let entry = guard.get_mut(id)?;
        f(entry);
        Some(entry.clone())
    }

    /// Remove a record by ID, returning it if it existed.
    pub fn remove(&self, id: &Uuid) -> Option<T> {
        self.data.write().remove(id)
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Records ------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u64>,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

// -- Configuration ------------------------------------------------------------

/// Application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Maximum request body size in bytes.
    pub body_limit: usize,
    /// Freshness window for ISR pages.
    pub revalidate: Duration,
    /// Root directory of the build cache.
    pub build_cache_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            body_limit: DEFAULT_BODY_LIMIT,
            revalidate: Duration::from_secs(60),
            build_cache_dir: PathBuf::from(".zenith/cache"),
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// | Variable                 | Default         |
    /// |--------------------------|-----------------|
    /// | `PORT`                   | `8080`          |
    /// | `ZENITH_BODY_LIMIT`      | `2097152`       |
    /// | `ZENITH_REVALIDATE_SECS` | `60`            |
    /// | `ZENITH_BUILD_CACHE_DIR` | `.zenith/cache` |
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup. Unparseable
    /// values fall back to the default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: parsed(&lookup, "PORT").unwrap_or(defaults.port),
            body_limit: parsed(&lookup, "ZENITH_BODY_LIMIT").unwrap_or(defaults.body_limit),
            revalidate: parsed(&lookup, "ZENITH_REVALIDATE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.revalidate),
            build_cache_dir: lookup("ZENITH_BUILD_CACHE_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.build_cache_dir),
        }
    }
}

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = name, value = %raw, "ignoring unparseable setting");
            None
        }
    }
}

// -- Application State --------------------------------------------------------

/// Shared application state passed to all route handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub users: Store<User>,
    pub pages: PageCache,
    pub realtime: RealtimeHub,
    /// `parking_lot::Mutex`: build cache calls are short, synchronous file I/O.
    pub build_cache: Option<Arc<Mutex<BuildCache>>>,
}

impl AppState {
    /// State with empty stores and no build cache.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            users: Store::new(),
            pages: PageCache::new(),
            realtime: RealtimeHub::new(),
            build_cache: None,
        }
    }

    /// State with the build cache opened at `config.build_cache_dir`.
    pub fn try_with_build_cache(config: AppConfig) -> Result<Self, CacheError> {
        let cache = BuildCache::open(&config.build_cache_dir)?;
        Ok(Self::new(config).with_build_cache(cache))
    }

    pub fn with_build_cache(mut self, cache: BuildCache) -> Self {
        self.build_cache = Some(Arc::new(Mutex::new(cache)));
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}
