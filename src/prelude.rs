//! # metadigest Prelude
//!
//! Re-exports of the types needed to build digests and read markers from them.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all metadigest operations
pub use crate::Error;

/// The result type used throughout metadigest
pub use crate::Result;

// ================================================================================================
// Marker Data
// ================================================================================================

pub use crate::metadata::datum::MetadataDatum;
pub use crate::metadata::properties::{PropertySet, PropertyValue, ScalarValue};

// ================================================================================================
// Type Model
// ================================================================================================

pub use crate::metadata::typesystem::{
    ConstructorRc, ExactTypes, FieldRc, MemberSignature, MethodRc, TypeBuilder, TypeFlags,
    TypeHierarchy, TypeRc, TypeRegistry,
};

// ================================================================================================
// Readers and Digest
// ================================================================================================

pub use crate::metadata::digest::{AccessibleDatum, Digest, DigestCache, DigestOptions};
pub use crate::metadata::reader::{BinaryReader, LiveReader, MetadataReader};
pub use crate::metadata::resolver::ReturnCompatibility;

// ================================================================================================
// Class Descriptors
// ================================================================================================

pub use crate::metadata::classfile::{ClassFileBuilder, ClassHeader, ClassVisitor};

// ================================================================================================
// Views
// ================================================================================================

pub use crate::metadata::view::{
    materialize, materialize_as, materialize_shallow, materialize_with, FromViewValue,
    InterfaceDescriptor, InterfaceMethod, MarkerView, MaterializeMode, ReturnType, View, ViewValue,
};
