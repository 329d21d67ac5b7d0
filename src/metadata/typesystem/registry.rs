//! Central registry of host types.
//!
//! The [`TypeRegistry`] maps fully-qualified names to [`TypeRc`]s. It is backed by a
//! [`dashmap::DashMap`], so registration and lookup can happen concurrently from many threads,
//! e.g. while a [`crate::metadata::digest::DigestCache`] prefetches digests in parallel.
//!
//! The registry also answers assignability questions through the [`TypeHierarchy`] trait. The
//! override resolver uses it to accept covariant return types.
//!
//! # Examples
//!
//! ```rust
//! use metadigest::metadata::typesystem::{TypeBuilder, TypeHierarchy, TypeRegistry};
//!
//! let registry = TypeRegistry::new();
//! let entity = TypeBuilder::class("demo.Entity").build();
//! let user = TypeBuilder::class("demo.User").extends(&entity).build();
//! registry.register(entity)?;
//! registry.register(user)?;
//!
//! assert!(registry.is_assignable("demo.Entity", "demo.User"));
//! assert!(!registry.is_assignable("demo.User", "demo.Entity"));
//! # Ok::<(), metadigest::Error>(())
//! ```

use dashmap::{mapref::entry::Entry, DashMap};

use crate::{
    metadata::typesystem::{type_chain, TypeRc},
    Result,
};

/// Answers whether a value of one type can be used where another is expected.
pub trait TypeHierarchy {
    /// Returns `true` if `source` is `target` or one of its subtypes.
    fn is_assignable(&self, target: &str, source: &str) -> bool;
}

/// A hierarchy without subtyping: only identical names are assignable.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactTypes;

impl TypeHierarchy for ExactTypes {
    fn is_assignable(&self, target: &str, source: &str) -> bool {
        target == source
    }
}

/// Concurrent name → type registry.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: DashMap<String, TypeRc>,
}

impl TypeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type under its fully-qualified name.
    ///
    /// # Errors
    /// Returns [`crate::Error::Error`] if a different type with the same name is already
    /// registered. Registering the same descriptor twice is accepted.
    pub fn register(&self, ty: TypeRc) -> Result<()> {
        match self.types.entry(ty.name.clone()) {
            Entry::Occupied(existing) => {
                if std::sync::Arc::ptr_eq(existing.get(), &ty) {
                    Ok(())
                } else {
                    Err(crate::Error::Error(format!(
                        "Type '{}' is already registered",
                        ty.name
                    )))
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(ty);
                Ok(())
            }
        }
    }

    /// Look up a type by fully-qualified name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<TypeRc> {
        self.types.get(name).map(|entry| entry.value().clone())
    }

    /// Returns `true` if a type with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Remove a type, returning it if it was registered.
    pub fn remove(&self, name: &str) -> Option<TypeRc> {
        self.types.remove(name).map(|(_, ty)| ty)
    }

    /// All registered types, in no particular order.
    #[must_use]
    pub fn types(&self) -> Vec<TypeRc> {
        self.types.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeHierarchy for TypeRegistry {
    fn is_assignable(&self, target: &str, source: &str) -> bool {
        if target == source {
            return true;
        }

        let Some(ty) = self.get(source) else {
            return false;
        };

        type_chain(&ty, true, true)
            .iter()
            .any(|candidate| candidate.name == target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::typesystem::{TypeBuilder, TypeFlags};

    #[test]
    fn register_and_lookup() {
        let registry = TypeRegistry::new();
        let ty = TypeBuilder::class("demo.Service").build();

        registry.register(ty.clone()).unwrap();
        registry.register(ty.clone()).unwrap();
        assert!(registry
            .register(TypeBuilder::class("demo.Service").build())
            .is_err());

        assert_eq!(registry.len(), 1);
        assert!(registry.contains("demo.Service"));
        assert!(registry.get("demo.Missing").is_none());
        assert!(registry.remove("demo.Service").is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn assignability_follows_classes_interfaces_and_root() {
        let registry = TypeRegistry::new();
        let root = TypeBuilder::class("lang.Object")
            .flags(TypeFlags::ROOT)
            .build();
        let named = TypeBuilder::interface("demo.Named").build();
        let entity = TypeBuilder::class("demo.Entity")
            .extends(&root)
            .implements(&named)
            .build();
        let user = TypeBuilder::class("demo.User").extends(&entity).build();
        for ty in [root, named, entity, user] {
            registry.register(ty).unwrap();
        }

        assert!(registry.is_assignable("demo.Entity", "demo.User"));
        assert!(registry.is_assignable("demo.Named", "demo.User"));
        assert!(registry.is_assignable("lang.Object", "demo.User"));
        assert!(!registry.is_assignable("demo.User", "demo.Entity"));
        assert!(!registry.is_assignable("demo.Entity", "demo.Unknown"));
        assert!(registry.is_assignable("int", "int"));
        assert!(!ExactTypes.is_assignable("demo.Entity", "demo.User"));
    }
}
