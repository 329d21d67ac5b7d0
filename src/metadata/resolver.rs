//! Override resolution for live types.
//!
//! A marker declared on a base-type method belongs to every method overriding it. The resolver
//! picks one authoritative *leaf* per override family, the most-derived method in the type chain,
//! and merges the markers of the whole family onto it.
//!
//! # Override Test
//!
//! Method `b` overrides method `a` when both share a name, have identical parameter type lists,
//! and `b`'s return type is compatible with `a`'s. Compatibility is decided by a
//! [`ReturnCompatibility`] policy over a [`TypeHierarchy`]: covariant by default (`a.return` is
//! assignable from `b.return`), or exact. Static and private methods never take part in overriding.
//!
//! # Leaf Candidates
//!
//! A method is a candidate unless it takes no parameters, returns `void` and carries no marker.
//! Such methods cannot be property accessors and cannot contribute markers.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::trace;

use crate::metadata::{
    datum::MetadataDatum,
    typesystem::{MemberSignature, MethodRc, TypeHierarchy, TypeRc},
};

/// How return types are compared by the override test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReturnCompatibility {
    /// The overriding return type must be assignable to the overridden one
    #[default]
    Covariant,
    /// Return types must be identical
    Exact,
}

/// Returns `true` if a method with signature `candidate` overrides one with signature `target`.
///
/// This is the pure signature test; identity, static and private methods are handled by
/// [`OverrideResolver::method_overrides`].
pub fn overrides<H: TypeHierarchy + ?Sized>(
    candidate: &MemberSignature,
    target: &MemberSignature,
    hierarchy: &H,
    compatibility: ReturnCompatibility,
) -> bool {
    if candidate.name != target.name || candidate.parameter_types != target.parameter_types {
        return false;
    }

    match compatibility {
        ReturnCompatibility::Exact => candidate.return_type == target.return_type,
        ReturnCompatibility::Covariant => {
            hierarchy.is_assignable(&target.return_type, &candidate.return_type)
        }
    }
}

/// Folds inherited method markers onto leaf methods.
pub struct OverrideResolver<'a, H: TypeHierarchy + ?Sized> {
    hierarchy: &'a H,
    compatibility: ReturnCompatibility,
}

impl<'a, H: TypeHierarchy + ?Sized> OverrideResolver<'a, H> {
    /// Create a resolver answering assignability through `hierarchy`.
    pub fn new(hierarchy: &'a H, compatibility: ReturnCompatibility) -> Self {
        OverrideResolver {
            hierarchy,
            compatibility,
        }
    }

    /// Returns `true` if `candidate` overrides `target`.
    ///
    /// A method only overrides itself when `include_self` is set.
    #[must_use]
    pub fn method_overrides(
        &self,
        candidate: &MethodRc,
        target: &MethodRc,
        include_self: bool,
    ) -> bool {
        if Arc::ptr_eq(candidate, target) || candidate == target {
            return include_self;
        }

        if candidate.is_static() || target.is_static() {
            return false;
        }
        if candidate.is_private() || target.is_private() {
            return false;
        }

        overrides(
            &candidate.signature,
            &target.signature,
            self.hierarchy,
            self.compatibility,
        )
    }

    /// Returns `true` if `method` may become a leaf.
    #[must_use]
    pub fn is_leaf_candidate(method: &MethodRc) -> bool {
        method.has_annotations() || !method.signature.is_void_no_arg()
    }

    /// Selects one leaf per override family, in chain order.
    #[must_use]
    pub fn leaves(&self, chain: &[TypeRc]) -> Vec<MethodRc> {
        let mut leaves: Vec<MethodRc> = Vec::new();

        for (position, ty) in chain.iter().enumerate() {
            for (_, method) in ty.methods.iter() {
                if !Self::is_leaf_candidate(method) {
                    continue;
                }

                if position == 0 {
                    leaves.push(method.clone());
                    continue;
                }

                if leaves
                    .iter()
                    .any(|leaf| self.method_overrides(leaf, method, false))
                {
                    continue;
                }

                if let Some(slot) = leaves
                    .iter()
                    .position(|leaf| self.method_overrides(method, leaf, false))
                {
                    trace!(
                        replaced = %leaves[slot],
                        leaf = %method,
                        "override leaf replaced"
                    );
                    leaves[slot] = method.clone();
                    continue;
                }

                leaves.push(method.clone());
            }
        }

        leaves
    }

    /// Collects the markers of every method in `chain` that `leaf` overrides, including `leaf`
    /// itself. Each marker type is reported once; the occurrence closest to the leaf wins.
    #[must_use]
    pub fn merged_markers(&self, leaf: &MethodRc, chain: &[TypeRc]) -> Vec<MetadataDatum<MethodRc>> {
        let mut merged: IndexMap<&str, MetadataDatum<MethodRc>> = IndexMap::new();

        for ty in chain {
            for (_, method) in ty.methods.iter() {
                if !self.method_overrides(leaf, method, true) {
                    continue;
                }

                for (_, annotation) in method.annotations.iter() {
                    merged
                        .entry(annotation.annotation_type())
                        .or_insert_with(|| annotation.with_element(Some(leaf.clone())));
                }
            }
        }

        merged.into_values().collect()
    }

    /// Resolves every leaf of `chain` to its merged markers, dropping leaves without markers.
    #[must_use]
    pub fn resolve(&self, chain: &[TypeRc]) -> IndexMap<MethodRc, Vec<MetadataDatum<MethodRc>>> {
        self.leaves(chain)
            .into_iter()
            .filter_map(|leaf| {
                let markers = self.merged_markers(&leaf, chain);
                (!markers.is_empty()).then_some((leaf, markers))
            })
            .collect()
    }
}
