//! # Incremental Static Regeneration
//!
//! Rendered pages are cached per key and served without re-rendering
//! until they age past their revalidation window:
//!
//! | Cached entry          | Served          | Render                         |
//! |-----------------------|-----------------|--------------------------------|
//! | none                  | fresh render    | inline, caller waits (`MISS`)  |
//! | younger than window   | cached (`HIT`)  | none                           |
//! | older than window     | stale (`STALE`) | background, once per key       |
//!
//! A failed background render leaves the stale page in place; the next
//! request after the failure triggers another attempt.

use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;

use crate::error::CacheError;

/// How a page was served. Rendered into the `x-cache` response header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Stale,
    Miss,
}

impl CacheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Stale => "STALE",
            Self::Miss => "MISS",
        }
    }
}

/// A rendered page and the tags used for on-demand purging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub body: String,
    pub tags: Vec<String>,
}

impl Page {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            tags: Vec::new(),
        }
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

#[derive(Debug, Clone)]
struct Entry {
    page: Page,
    generated_at: Instant,
    revalidate: Duration,
}

impl Entry {
    fn is_fresh(&self, now: Instant) -> bool {
        now.duration_since(self.generated_at) < self.revalidate
    }
}

#[derive(Debug, Default)]
struct Inner {
    entries: RwLock<HashMap<String, Entry>>,
    regenerating: Mutex<HashSet<String>>,
}

/// Clears the in-flight mark for `key` when the background render ends,
/// including when it panics or its task is dropped.
struct Regenerating {
    cache: PageCache,
    key: String,
}

impl Drop for Regenerating {
    fn drop(&mut self) {
        self.cache.inner.regenerating.lock().remove(&self.key);
    }
}

/// Shared page cache. Clones share entries.
#[derive(Debug, Clone, Default)]
pub struct PageCache {
    inner: Arc<Inner>,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `key` from cache, rendering with `render` when needed.
    ///
    /// `revalidate` is the freshness window recorded with a newly rendered
    /// entry.
    pub async fn get_or_render<F, Fut, E>(
        &self,
        key: &str,
        revalidate: Duration,
        render: F,
    ) -> Result<(Page, CacheStatus), CacheError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Page, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let cached = self.inner.entries.read().get(key).cloned();

        match cached {
            Some(entry) if entry.is_fresh(Instant::now()) => Ok((entry.page, CacheStatus::Hit)),
            Some(entry) => {
                self.regenerate(key, revalidate, render);
                Ok((entry.page, CacheStatus::Stale))
            }
            None => {
                let page = render().await.map_err(|e| CacheError::Render {
                    key: key.to_string(),
                    reason: e.to_string(),
                })?;
                self.insert(key, page.clone(), revalidate);
                tracing::debug!(key, "page rendered on miss");
                Ok((page, CacheStatus::Miss))
            }
        }
    }

    /// Start a background render for `key` unless one is already running.
    fn regenerate<F, Fut, E>(&self, key: &str, revalidate: Duration, render: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Page, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        if !self.inner.regenerating.lock().insert(key.to_string()) {
            return;
        }
        let guard = Regenerating {
            cache: self.clone(),
            key: key.to_string(),
        };
        tokio::spawn(async move {
            let key = guard.key.as_str();
            match render().await {
                Ok(page) => {
                    guard.cache.insert(key, page, revalidate);
                    tracing::debug!(key, "page regenerated");
                }
                Err(e) => {
                    tracing::warn!(key, error = %e, "regeneration failed, serving stale page");
                }
            }
        });
    }

    fn insert(&self, key: &str, page: Page, revalidate: Duration) {
        self.inner.entries.write().insert(
            key.to_string(),
            Entry {
                page,
                generated_at: Instant::now(),
                revalidate,
            },
        );
    }

    /// Whether a background render for `key` is in flight.
    pub fn is_regenerating(&self, key: &str) -> bool {
        self.inner.regenerating.lock().contains(key)
    }

    /// Purge one page. The next request renders it inline.
    pub fn revalidate_path(&self, key: &str) -> bool {
        let removed = self.inner.entries.write().remove(key).is_some();
        tracing::debug!(key, removed, "revalidate path");
        removed
    }

    /// Purge every page carrying `tag`. Returns the number purged.
    pub fn revalidate_tag(&self, tag: &str) -> usize {
        let mut entries = self.inner.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.page.tags.iter().any(|t| t == tag));
        let purged = before - entries.len();
        tracing::debug!(tag, purged, "revalidate tag");
        purged
    }

    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
