//! Digest configuration
//!
//! This module provides the options that control how a digest is built, for both the live and the
//! binary source.

use crate::metadata::resolver::ReturnCompatibility;

/// Configuration for building a [`crate::metadata::digest::Digest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DigestOptions {
    /// Follow superclasses and implemented interfaces (live source only)
    pub inherits: bool,

    /// Include the universal root type in the type chain (live source only)
    pub include_root: bool,

    /// How return types are compared when deciding whether one method overrides another
    pub return_compatibility: ReturnCompatibility,

    /// Also read markers that are retained in class descriptors but invisible at run time
    /// (binary source only)
    pub include_invisible: bool,

    /// Maximum nesting depth of markers and arrays in a class descriptor (default: 64)
    pub max_nesting_depth: usize,
}

impl Default for DigestOptions {
    fn default() -> Self {
        Self {
            inherits: true,
            include_root: false,
            return_compatibility: ReturnCompatibility::Covariant,
            include_invisible: false,
            max_nesting_depth: 64,
        }
    }
}

impl DigestOptions {
    /// Only markers declared directly on the inspected type and its members
    #[must_use]
    pub fn declared_only() -> Self {
        Self {
            inherits: false,
            ..Self::default()
        }
    }

    /// Overrides must repeat the return type exactly
    #[must_use]
    pub fn strict() -> Self {
        Self {
            return_compatibility: ReturnCompatibility::Exact,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        let default = DigestOptions::default();
        assert!(default.inherits);
        assert!(!default.include_root);
        assert!(!default.include_invisible);
        assert_eq!(default.return_compatibility, ReturnCompatibility::Covariant);
        assert_eq!(default.max_nesting_depth, 64);

        assert!(!DigestOptions::declared_only().inherits);
        assert_eq!(
            DigestOptions::strict().return_compatibility,
            ReturnCompatibility::Exact
        );
        assert_ne!(DigestOptions::strict(), default);
    }
}
