use std::sync::Arc;

use dashmap::DashMap;
use rayon::prelude::*;

use crate::{
    metadata::{
        digest::{Digest, DigestOptions},
        typesystem::{TypeHierarchy, TypeRc},
    },
    Result,
};

/// Concurrent cache of built digests, keyed by type name and options.
///
/// Digests are immutable, so a cached entry is shared as an [`Arc`] between all callers.
/// [`DigestCache::prefetch`] builds many digests in parallel; each digest itself is still
/// built on a single thread.
///
/// # Examples
///
/// ```rust
/// use metadigest::metadata::{
///     digest::{DigestCache, DigestOptions},
///     typesystem::{TypeBuilder, TypeRegistry},
/// };
///
/// let registry = TypeRegistry::new();
/// let service = TypeBuilder::class("demo.Service").build();
/// registry.register(service.clone())?;
///
/// let cache = DigestCache::new();
/// let options = DigestOptions::default();
/// let first = cache.get_or_build(&service, &registry, &options);
/// let second = cache.get_or_build(&service, &registry, &options);
/// assert!(std::sync::Arc::ptr_eq(&first, &second));
/// # Ok::<(), metadigest::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct DigestCache {
    digests: DashMap<(String, DigestOptions), Arc<Digest>>,
}

impl DigestCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        DigestCache::default()
    }

    /// Returns the cached digest of `ty`, building it on first use.
    ///
    /// No shard lock is held while the digest is built. When two callers race on the same key,
    /// both build and the first insert is kept.
    pub fn get_or_build<H: TypeHierarchy + ?Sized>(
        &self,
        ty: &TypeRc,
        hierarchy: &H,
        options: &DigestOptions,
    ) -> Arc<Digest> {
        let key = (ty.name.clone(), *options);
        if let Some(digest) = self.digests.get(&key) {
            return digest.clone();
        }

        let digest = Arc::new(Digest::from_type(ty, hierarchy, options));
        self.digests.entry(key).or_insert(digest).clone()
    }

    /// Returns the cached class-descriptor digest stored under `key`, decoding `data` on first use.
    ///
    /// # Errors
    /// Returns the decoding error; nothing is cached in that case.
    pub fn get_or_decode(
        &self,
        key: &str,
        data: &[u8],
        target: Option<&str>,
        options: &DigestOptions,
    ) -> Result<Arc<Digest>> {
        let cache_key = (key.to_string(), *options);
        if let Some(digest) = self.digests.get(&cache_key) {
            return Ok(digest.clone());
        }

        let digest = Arc::new(Digest::from_class_bytes(data.to_vec(), target, options)?);
        Ok(self.digests.entry(cache_key).or_insert(digest).clone())
    }

    /// Returns the cached digest of `type_name`, if any.
    #[must_use]
    pub fn get(&self, type_name: &str, options: &DigestOptions) -> Option<Arc<Digest>> {
        self.digests
            .get(&(type_name.to_string(), *options))
            .map(|digest| digest.clone())
    }

    /// Build the digests of all `types` in parallel.
    ///
    /// Types already cached for `options` are left untouched.
    pub fn prefetch<H: TypeHierarchy + Sync + ?Sized>(
        &self,
        types: &[TypeRc],
        hierarchy: &H,
        options: &DigestOptions,
    ) {
        types.par_iter().for_each(|ty| {
            let key = (ty.name.clone(), *options);
            if self.digests.contains_key(&key) {
                return;
            }
            let digest = Arc::new(Digest::from_type(ty, hierarchy, options));
            self.digests.entry(key).or_insert(digest);
        });
    }

    /// Drop every cached digest of `type_name`, for all options.
    pub fn invalidate(&self, type_name: &str) {
        self.digests.retain(|(name, _), _| name != type_name);
    }

    /// Drop everything.
    pub fn clear(&self) {
        self.digests.clear();
    }

    /// Number of cached digests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.digests.len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }
}
