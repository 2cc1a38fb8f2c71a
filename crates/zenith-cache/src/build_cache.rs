//! # Build Cache
//!
//! Persistent, content-addressed store for build outputs. Each cache key
//! (a module path, a page route) maps to the SHA-256 of the input it was
//! built from and the SHA-256 of the output artifact.
//!
//! ## Layout
//!
//! ```text
//! {root}/
//!   manifest.json           key → { inputDigest, outputDigest, size, storedAt }
//!   artifacts/{digest}.bin  output bytes, named by their own digest
//! ```
//!
//! ## Integrity
//!
//! A lookup only hits when the input digest matches and the artifact
//! re-hashes to the digest in its name. Anything else is a miss, so a
//! tampered or truncated artifact is rebuilt rather than served.
//!
//! Artifacts are written create-if-absent: identical outputs share one
//! file. The manifest is replaced atomically via a temp file and rename.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::digest::{is_sha256_hex, sha256_hex};
use crate::error::CacheError;

const MANIFEST_FILE: &str = "manifest.json";
const MANIFEST_TMP_FILE: &str = "manifest.json.tmp";
const ARTIFACTS_DIR: &str = "artifacts";

/// Manifest schema version. A manifest with any other version is discarded.
pub const MANIFEST_VERSION: u32 = 1;

/// One cached build output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub input_digest: String,
    pub output_digest: String,
    pub size: u64,
    pub stored_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Manifest {
    version: u32,
    entries: BTreeMap<String, ManifestEntry>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

/// Counters and sizes for the open cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub entries: usize,
    /// Distinct artifacts referenced by the manifest.
    pub artifacts: usize,
    /// Bytes across distinct referenced artifacts.
    pub total_bytes: u64,
    pub hits: u64,
    pub misses: u64,
}

/// A build cache rooted at one directory.
#[derive(Debug)]
pub struct BuildCache {
    root: PathBuf,
    manifest: Manifest,
    hits: u64,
    misses: u64,
}

impl BuildCache {
    /// Open (creating if needed) the cache at `root`.
    ///
    /// A missing manifest starts an empty cache. An unreadable manifest or
    /// one from another version is discarded with a warning.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let root = root.into();
        fs::create_dir_all(root.join(ARTIFACTS_DIR))?;

        let manifest = match fs::read(root.join(MANIFEST_FILE)) {
            Ok(bytes) => match serde_json::from_slice::<Manifest>(&bytes) {
                Ok(m) if m.version == MANIFEST_VERSION => m,
                Ok(m) => {
                    tracing::warn!(
                        found = m.version,
                        expected = MANIFEST_VERSION,
                        "build cache manifest version mismatch, resetting"
                    );
                    Manifest::default()
                }
                Err(e) => {
                    tracing::warn!(error = %e, "build cache manifest corrupt, resetting");
                    Manifest::default()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Manifest::default(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(root = %root.display(), entries = manifest.entries.len(), "build cache opened");
        Ok(Self {
            root,
            manifest,
            hits: 0,
            misses: 0,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn artifact_path(&self, digest: &str) -> PathBuf {
        self.root.join(ARTIFACTS_DIR).join(format!("{digest}.bin"))
    }

    /// Manifest entry for `key`, if any.
    pub fn entry(&self, key: &str) -> Option<&ManifestEntry> {
        self.manifest.entries.get(key)
    }

    /// Cached output for `key` built from `input`, if still valid.
    pub fn lookup(&mut self, key: &str, input: &[u8]) -> Result<Option<Vec<u8>>, CacheError> {
        let found = self.verified_output(key, input)?;
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        Ok(found)
    }

    fn verified_output(&self, key: &str, input: &[u8]) -> Result<Option<Vec<u8>>, CacheError> {
        let Some(entry) = self.manifest.entries.get(key) else {
            return Ok(None);
        };
        if entry.input_digest != sha256_hex(input) {
            return Ok(None);
        }

        let path = self.artifact_path(&entry.output_digest);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(key, path = %path.display(), "build artifact missing");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let actual = sha256_hex(&bytes);
        if actual != entry.output_digest {
            tracing::warn!(
                key,
                expected = %entry.output_digest,
                actual = %actual,
                "build artifact failed integrity check"
            );
            return Ok(None);
        }
        Ok(Some(bytes))
    }

    /// Record `output` as the build of `key` from `input`. Returns the
    /// output digest.
    pub fn store(&mut self, key: &str, input: &[u8], output: &[u8]) -> Result<String, CacheError> {
        let output_digest = sha256_hex(output);
        let path = self.artifact_path(&output_digest);

        match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut f) => f.write_all(output)?,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                // Same digest, same bytes, unless the file was tampered
                // with; rewrite it in that case.
                if sha256_hex(&fs::read(&path)?) != output_digest {
                    fs::write(&path, output)?;
                }
            }
            Err(e) => return Err(e.into()),
        }

        self.manifest.entries.insert(
            key.to_string(),
            ManifestEntry {
                input_digest: sha256_hex(input),
                output_digest: output_digest.clone(),
                size: output.len() as u64,
                stored_at: Utc::now(),
            },
        );
        self.persist()?;
        Ok(output_digest)
    }

    /// Forget `key`. The artifact stays until [`Self::prune`].
    pub fn invalidate(&mut self, key: &str) -> Result<bool, CacheError> {
        let removed = self.manifest.entries.remove(key).is_some();
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    /// Delete artifacts no manifest entry references. Returns how many
    /// files were removed. Files that are not artifacts are left alone.
    pub fn prune(&mut self) -> Result<usize, CacheError> {
        let referenced: HashSet<&str> = self
            .manifest
            .entries
            .values()
            .map(|e| e.output_digest.as_str())
            .collect();

        let mut removed = 0;
        for dir_entry in fs::read_dir(self.root.join(ARTIFACTS_DIR))? {
            let path = dir_entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("bin") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if is_sha256_hex(stem) && !referenced.contains(stem) {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        tracing::debug!(removed, "build cache pruned");
        Ok(removed)
    }

    /// Current counters and sizes.
    pub fn stats(&self) -> CacheStats {
        let mut seen = HashSet::new();
        let mut total_bytes = 0;
        for entry in self.manifest.entries.values() {
            if seen.insert(entry.output_digest.as_str()) {
                total_bytes += entry.size;
            }
        }
        CacheStats {
            entries: self.manifest.entries.len(),
            artifacts: seen.len(),
            total_bytes,
            hits: self.hits,
            misses: self.misses,
        }
    }

    fn persist(&self) -> Result<(), CacheError> {
        let tmp = self.root.join(MANIFEST_TMP_FILE);
        fs::write(&tmp, serde_json::to_vec_pretty(&self.manifest)?)?;
        fs::rename(&tmp, self.root.join(MANIFEST_FILE))?;
        Ok(())
    }
}
