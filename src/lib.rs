// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # metadigest
//!
//! Extracts declarative markers ("annotations") from program elements, resolves them across
//! inheritance and method overriding, indexes them per type and materializes them as typed views.
//!
//! Markers come from two sources:
//!
//! - **Live types**: [`metadata::typesystem::TypeDescriptor`]s registered in a
//!   [`metadata::typesystem::TypeRegistry`]. Markers on base-type and interface methods are
//!   attributed to the most-derived overriding method.
//! - **Compiled class descriptors**: decoded in one forward pass by
//!   [`metadata::reader::BinaryReader`], which can stop as soon as a requested marker type was seen.
//!
//! ## Quick Start
//!
//! ```rust
//! use metadigest::prelude::*;
//!
//! let registry = TypeRegistry::new();
//! let column: MetadataDatum =
//!     MetadataDatum::new("demo.Column", PropertySet::from([("length", "64")]), None)?;
//!
//! let base = TypeBuilder::class("demo.Base")
//!     .method("name", |m| m.returns("java.lang.String").annotation(column))
//!     .build();
//! let service = TypeBuilder::class("demo.Service")
//!     .extends(&base)
//!     .method("name", |m| m.returns("java.lang.String"))
//!     .build();
//! registry.register(base)?;
//! registry.register(service.clone())?;
//!
//! let digest = Digest::from_type(&service, &registry, &DigestOptions::default());
//! let marked = &digest.method_data("demo.Column")[0];
//! assert_eq!(marked.element().map(|m| m.declaring_type.as_str()), Some("demo.Service"));
//!
//! let interface = InterfaceDescriptor::new("demo.Column")
//!     .method(InterfaceMethod::new("length", ReturnType::Int))
//!     .build();
//! let view = materialize(marked, &interface);
//! assert_eq!(view.get::<i32>("length")?, Some(64));
//! # Ok::<(), metadigest::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`metadata::properties`] - layered, copy-on-write property sets
//! - [`metadata::datum`] - captured markers
//! - [`metadata::typesystem`] - the host type model
//! - [`metadata::resolver`] - override resolution
//! - [`metadata::classfile`] - class descriptor decoding and writing
//! - [`metadata::reader`] - marker sources
//! - [`metadata::digest`] - the queryable aggregate and its cache
//! - [`metadata::view`] - typed views over markers
//!
//! Errors are reported through the crate-wide [`Error`]. The library logs through `tracing` and
//! never installs a subscriber.

#[macro_use]
pub(crate) mod macros;

pub(crate) mod error;
pub(crate) mod file;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use metadigest::prelude::*;
///
/// let options = DigestOptions::declared_only();
/// assert!(!options.inherits);
/// ```
pub mod prelude;

/// Marker capture, resolution, indexing and materialization
pub mod metadata;

/// `metadigest` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `metadigest` Error type
///
/// # Examples
///
/// ```rust
/// use metadigest::{metadata::digest::{Digest, DigestOptions}, Error};
///
/// match Digest::from_class_bytes(vec![0, 1, 2, 3], None, &DigestOptions::default()) {
///     Err(Error::NotSupported) => {}
///     other => panic!("unexpected: {other:?}"),
/// }
/// ```
pub use error::Error;

/// Owned class descriptor input, memory-mapped from a file or held in memory
pub use file::Input;

/// Cursor over class descriptor bytes
pub use file::parser::Parser;
