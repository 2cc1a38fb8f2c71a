//! # zenith-cache — Page & Build Caching
//!
//! - [`isr::PageCache`]: in-memory stale-while-revalidate cache for
//!   rendered pages, with on-demand purge by path or tag.
//! - [`build_cache::BuildCache`]: on-disk, content-addressed cache of build
//!   outputs keyed by input digest.
//!
//! Both are caller-owned values; construct one per application and share it
//! through application state.

pub mod build_cache;
pub mod digest;
pub mod error;
pub mod isr;

pub use build_cache::{BuildCache, CacheStats, ManifestEntry};
pub use digest::sha256_hex;
pub use error::CacheError;
pub use isr::{CacheStatus, Page, PageCache};
