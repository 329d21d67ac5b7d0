//! Marker sources.
//!
//! A [`MetadataReader`] produces the raw per-element marker maps a
//! [`crate::metadata::digest::Digest`] is built from. Two sources exist:
//!
//! - [`LiveReader`] introspects a registered [`crate::metadata::typesystem::TypeDescriptor`],
//!   following inheritance and folding inherited method markers onto overriding methods
//! - [`BinaryReader`] decodes the class-level markers of a compiled class descriptor in a single
//!   pass and may stop as soon as a requested marker type was seen
//!
//! All maps preserve discovery order and are never absent: a source without data for a category
//! returns an empty map. The binary source has no member information and always returns empty
//! member maps.

mod binary;
mod live;

use indexmap::IndexMap;

pub use binary::BinaryReader;
pub use live::LiveReader;

use crate::metadata::{
    datum::MetadataDatum,
    typesystem::{ConstructorRc, FieldRc, MethodRc, ParameterRc, TypeRc},
};

/// Type-level markers keyed by marker type name
pub type TypeMarkers = IndexMap<String, MetadataDatum<TypeRc>>;
/// Field markers keyed by field
pub type FieldMarkers = IndexMap<FieldRc, Vec<MetadataDatum<FieldRc>>>;
/// Method markers keyed by leaf method
pub type MethodMarkers = IndexMap<MethodRc, Vec<MetadataDatum<MethodRc>>>;
/// Constructor markers keyed by constructor
pub type ConstructorMarkers = IndexMap<ConstructorRc, Vec<MetadataDatum<ConstructorRc>>>;
/// Markers of every parameter position of a member
pub type ParameterMarkers = Vec<Vec<MetadataDatum<ParameterRc>>>;
/// Parameter markers keyed by method
pub type MethodParameterMarkers = IndexMap<MethodRc, ParameterMarkers>;
/// Parameter markers keyed by constructor
pub type ConstructorParameterMarkers = IndexMap<ConstructorRc, ParameterMarkers>;

/// A source of raw marker data.
pub trait MetadataReader {
    /// Fully-qualified name of the inspected type.
    fn type_name(&self) -> &str;

    /// Markers of the inspected type, first declaration in the type chain wins.
    fn type_markers(&self) -> TypeMarkers;

    /// Markers of every marked leaf method.
    fn all_method_markers(&self) -> MethodMarkers;

    /// Markers of every marked field.
    fn all_field_markers(&self) -> FieldMarkers;

    /// Markers of every marked constructor.
    fn all_constructor_markers(&self) -> ConstructorMarkers;

    /// Per-position parameter markers of every method with at least one marked parameter.
    fn all_method_parameter_markers(&self) -> MethodParameterMarkers;

    /// Per-position parameter markers of every constructor with at least one marked parameter.
    fn all_constructor_parameter_markers(&self) -> ConstructorParameterMarkers;
}
