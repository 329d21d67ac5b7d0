//! Marker capture and resolution.
//!
//! # Key Components
//!
//! - [`properties`] - [`properties::PropertySet`] and the closed [`properties::PropertyValue`]
//!   model
//! - [`datum`] - [`datum::MetadataDatum`], one captured marker with its element
//! - [`typesystem`] - host types, members and the [`typesystem::TypeRegistry`]
//! - [`resolver`] - the override test and leaf-method marker folding
//! - [`classfile`] - class descriptor decoding, visitor protocol and writer
//! - [`reader`] - the [`reader::MetadataReader`] sources
//! - [`digest`] - [`digest::Digest`] indices and [`digest::DigestCache`]
//! - [`view`] - interface materialization

/// Compiled class descriptor decoding and writing
pub mod classfile;
/// Captured markers
pub mod datum;
/// Aggregated marker indices
pub mod digest;
/// Layered property storage
pub mod properties;
/// Marker sources
pub mod reader;
/// Override resolution
pub mod resolver;
/// Host type model
pub mod typesystem;
/// Typed views over markers
pub mod view;
