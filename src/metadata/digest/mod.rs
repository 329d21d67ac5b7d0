//! The digest: queryable marker indices of one type.
//!
//! A [`Digest`] is built once from a [`MetadataReader`] and is immutable afterwards. Every index
//! is derived eagerly at construction from the reader's raw maps:
//!
//! - type markers by marker type name
//! - field, method and constructor markers by member, and grouped by marker type name
//! - member markers grouped by the name of the type declaring the member
//! - method and constructor parameter markers, filtered per marker type with positions preserved
//! - the *accessible* index: per marker type, field and method markers keyed by member simple
//!   name. A name used by both a field and a method withholds that index; asking for it fails
//!   with [`crate::Error::Conflict`].
//!
//! Lookups that find nothing return empty collections. Only [`Digest::class_datum`] returns
//! `None` for an unknown marker type.
//!
//! # Examples
//!
//! ```rust
//! use metadigest::metadata::{
//!     datum::MetadataDatum,
//!     digest::{Digest, DigestOptions},
//!     properties::PropertySet,
//!     typesystem::{TypeBuilder, TypeRegistry},
//! };
//!
//! let value: MetadataDatum =
//!     MetadataDatum::new("demo.Value", PropertySet::from([("value", "host")]), None)?;
//! let service = TypeBuilder::class("demo.Service")
//!     .field("host", "java.lang.String", |field| field.annotation(value))
//!     .build();
//!
//! let registry = TypeRegistry::new();
//! let digest = Digest::from_type(&service, &registry, &DigestOptions::default());
//!
//! assert_eq!(digest.field_data("demo.Value").len(), 1);
//! assert!(digest.field_data("demo.Missing").is_empty());
//! assert!(digest.class_datum("demo.Missing").is_none());
//! # Ok::<(), metadigest::Error>(())
//! ```

mod cache;
mod config;

use std::{borrow::Cow, path::Path};

use indexmap::IndexMap;
use tracing::debug;

pub use cache::DigestCache;
pub use config::DigestOptions;

use crate::{
    file::Input,
    metadata::{
        datum::MetadataDatum,
        reader::{
            BinaryReader, ConstructorMarkers, ConstructorParameterMarkers, FieldMarkers,
            LiveReader, MetadataReader, MethodMarkers, MethodParameterMarkers, ParameterMarkers,
            TypeMarkers,
        },
        typesystem::{ConstructorRc, FieldRc, MethodRc, ParameterRc, TypeHierarchy, TypeRc},
    },
    Error, Result,
};

/// A field or method marker in the accessible index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessibleDatum {
    /// Marker on a field
    Field(MetadataDatum<FieldRc>),
    /// Marker on a (leaf) method
    Method(MetadataDatum<MethodRc>),
}

impl AccessibleDatum {
    /// Simple name of the annotated member.
    #[must_use]
    pub fn member_name(&self) -> &str {
        match self {
            AccessibleDatum::Field(datum) => datum.element().map_or("", |field| &field.name),
            AccessibleDatum::Method(datum) => datum.element().map_or("", |method| method.name()),
        }
    }

    /// The marker without its element.
    #[must_use]
    pub fn datum(&self) -> MetadataDatum {
        match self {
            AccessibleDatum::Field(datum) => datum.detached(),
            AccessibleDatum::Method(datum) => datum.detached(),
        }
    }
}

/// Member simple name → marker, for one marker type
pub type AccessibleIndex = IndexMap<String, AccessibleDatum>;

/// Member markers of one declaring type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclaredMarkers {
    /// Field markers
    pub fields: Vec<MetadataDatum<FieldRc>>,
    /// Method markers
    pub methods: Vec<MetadataDatum<MethodRc>>,
    /// Constructor markers
    pub constructors: Vec<MetadataDatum<ConstructorRc>>,
}

/// Where the data of a digest came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestSource {
    /// A registered host type
    Live,
    /// A compiled class descriptor
    Binary {
        /// Decoding stopped at the target marker
        terminated_early: bool,
    },
}

/// Immutable marker indices of one type.
#[derive(Debug, Clone)]
pub struct Digest {
    type_name: String,
    source: DigestSource,
    type_markers: TypeMarkers,
    fields: FieldMarkers,
    methods: MethodMarkers,
    constructors: ConstructorMarkers,
    method_parameters: MethodParameterMarkers,
    constructor_parameters: ConstructorParameterMarkers,
    fields_by_marker: IndexMap<String, Vec<MetadataDatum<FieldRc>>>,
    methods_by_marker: IndexMap<String, Vec<MetadataDatum<MethodRc>>>,
    constructors_by_marker: IndexMap<String, Vec<MetadataDatum<ConstructorRc>>>,
    declared: IndexMap<String, DeclaredMarkers>,
    method_parameters_by_marker: IndexMap<String, MethodParameterMarkers>,
    constructor_parameters_by_marker: IndexMap<String, ConstructorParameterMarkers>,
    accessible: IndexMap<String, std::result::Result<AccessibleIndex, String>>,
}

fn group_by_marker<K, E: Clone>(
    markers: &IndexMap<K, Vec<MetadataDatum<E>>>,
) -> IndexMap<String, Vec<MetadataDatum<E>>> {
    let mut grouped: IndexMap<String, Vec<MetadataDatum<E>>> = IndexMap::new();
    for datum in markers.values().flatten() {
        grouped
            .entry(datum.annotation_type().to_string())
            .or_default()
            .push(datum.clone());
    }
    grouped
}

fn filter_parameters<K: Clone + std::hash::Hash + Eq>(
    markers: &IndexMap<K, ParameterMarkers>,
) -> IndexMap<String, IndexMap<K, ParameterMarkers>> {
    let mut marker_types: Vec<&str> = Vec::new();
    for datum in markers.values().flatten().flatten() {
        if !marker_types.contains(&datum.annotation_type()) {
            marker_types.push(datum.annotation_type());
        }
    }

    marker_types
        .into_iter()
        .map(|marker_type| {
            let filtered = markers
                .iter()
                .filter_map(|(member, positions)| {
                    let kept: ParameterMarkers = positions
                        .iter()
                        .map(|position| {
                            position
                                .iter()
                                .filter(|datum| datum.annotation_type() == marker_type)
                                .cloned()
                                .collect::<Vec<_>>()
                        })
                        .collect();
                    kept.iter()
                        .any(|position| !position.is_empty())
                        .then(|| (member.clone(), kept))
                })
                .collect();
            (marker_type.to_string(), filtered)
        })
        .collect()
}

impl Digest {
    /// Build a digest from any marker source.
    pub fn from_reader<R: MetadataReader + ?Sized>(reader: &R, source: DigestSource) -> Self {
        let type_markers = reader.type_markers();
        let fields = reader.all_field_markers();
        let methods = reader.all_method_markers();
        let constructors = reader.all_constructor_markers();
        let method_parameters = reader.all_method_parameter_markers();
        let constructor_parameters = reader.all_constructor_parameter_markers();

        let fields_by_marker = group_by_marker(&fields);
        let methods_by_marker = group_by_marker(&methods);
        let constructors_by_marker = group_by_marker(&constructors);

        let mut declared: IndexMap<String, DeclaredMarkers> = IndexMap::new();
        for (field, data) in &fields {
            declared
                .entry(field.declaring_type.clone())
                .or_default()
                .fields
                .extend(data.iter().cloned());
        }
        for (method, data) in &methods {
            declared
                .entry(method.declaring_type.clone())
                .or_default()
                .methods
                .extend(data.iter().cloned());
        }
        for (constructor, data) in &constructors {
            declared
                .entry(constructor.declaring_type.clone())
                .or_default()
                .constructors
                .extend(data.iter().cloned());
        }

        let accessible =
            Self::accessible_indices(reader.type_name(), &fields_by_marker, &methods_by_marker);

        let digest = Digest {
            type_name: reader.type_name().to_string(),
            source,
            method_parameters_by_marker: filter_parameters(&method_parameters),
            constructor_parameters_by_marker: filter_parameters(&constructor_parameters),
            type_markers,
            fields,
            methods,
            constructors,
            method_parameters,
            constructor_parameters,
            fields_by_marker,
            methods_by_marker,
            constructors_by_marker,
            declared,
            accessible,
        };

        debug!(
            type_name = %digest.type_name,
            type_markers = digest.type_markers.len(),
            fields = digest.fields.len(),
            methods = digest.methods.len(),
            constructors = digest.constructors.len(),
            "digest built"
        );
        digest
    }

    fn accessible_indices(
        type_name: &str,
        fields_by_marker: &IndexMap<String, Vec<MetadataDatum<FieldRc>>>,
        methods_by_marker: &IndexMap<String, Vec<MetadataDatum<MethodRc>>>,
    ) -> IndexMap<String, std::result::Result<AccessibleIndex, String>> {
        let mut indices = IndexMap::new();
        let marker_types = fields_by_marker.keys().chain(
            methods_by_marker
                .keys()
                .filter(|marker_type| !fields_by_marker.contains_key(*marker_type)),
        );

        for marker_type in marker_types {
            let mut index = AccessibleIndex::new();
            for datum in fields_by_marker.get(marker_type).into_iter().flatten() {
                let accessible = AccessibleDatum::Field(datum.clone());
                index
                    .entry(accessible.member_name().to_string())
                    .or_insert(accessible);
            }

            let mut conflict = None;
            let mut methods = AccessibleIndex::new();
            for datum in methods_by_marker.get(marker_type).into_iter().flatten() {
                let accessible = AccessibleDatum::Method(datum.clone());
                let name = accessible.member_name().to_string();
                if index.contains_key(&name) {
                    conflict = Some(name);
                    break;
                }
                methods.entry(name).or_insert(accessible);
            }

            let entry = match conflict {
                Some(name) => {
                    debug!(
                        type_name,
                        annotation_type = %marker_type,
                        member = %name,
                        "accessible index withheld, field and method share a name"
                    );
                    Err(name)
                }
                None => {
                    index.extend(methods);
                    Ok(index)
                }
            };
            indices.insert(marker_type.clone(), entry);
        }

        indices
    }

    /// Build a digest for a registered host type.
    pub fn from_type<H: TypeHierarchy + ?Sized>(
        ty: &TypeRc,
        hierarchy: &H,
        options: &DigestOptions,
    ) -> Self {
        let reader = LiveReader::new(ty, hierarchy, options);
        Self::from_reader(&reader, DigestSource::Live)
    }

    /// Build a digest from the class descriptor at `path`.
    ///
    /// # Errors
    /// Returns the errors of [`BinaryReader::decode`] and [`crate::Error::FileError`].
    pub fn from_class_file(
        path: impl AsRef<Path>,
        target: Option<&str>,
        options: &DigestOptions,
    ) -> Result<Self> {
        Self::from_class_input(Input::from_path(path)?, target, options)
    }

    /// Build a digest from an in-memory class descriptor.
    ///
    /// # Errors
    /// Returns the errors of [`BinaryReader::decode`] and [`crate::Error::Empty`].
    pub fn from_class_bytes(
        data: Vec<u8>,
        target: Option<&str>,
        options: &DigestOptions,
    ) -> Result<Self> {
        Self::from_class_input(Input::from_mem(data)?, target, options)
    }

    /// Build a digest from an owned class descriptor input.
    ///
    /// # Errors
    /// Returns the errors of [`BinaryReader::decode`].
    pub fn from_class_input(
        input: Input,
        target: Option<&str>,
        options: &DigestOptions,
    ) -> Result<Self> {
        let reader = BinaryReader::from_input(input, target, options)?;
        Ok(Self::from_reader(
            &reader,
            DigestSource::Binary {
                terminated_early: reader.terminated_early(),
            },
        ))
    }

    /// Fully-qualified name of the digested type.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Where the data came from.
    #[must_use]
    pub fn source(&self) -> DigestSource {
        self.source
    }

    /// Type-level markers, keyed by marker type name.
    #[must_use]
    pub fn class_data(&self) -> &TypeMarkers {
        &self.type_markers
    }

    /// The type-level marker of `annotation_type`, if present.
    #[must_use]
    pub fn class_datum(&self, annotation_type: &str) -> Option<&MetadataDatum<TypeRc>> {
        self.type_markers.get(annotation_type)
    }

    /// All field markers.
    #[must_use]
    pub fn fields(&self) -> &FieldMarkers {
        &self.fields
    }

    /// All leaf method markers.
    #[must_use]
    pub fn methods(&self) -> &MethodMarkers {
        &self.methods
    }

    /// All constructor markers.
    #[must_use]
    pub fn constructors(&self) -> &ConstructorMarkers {
        &self.constructors
    }

    /// All method parameter markers.
    #[must_use]
    pub fn method_parameters(&self) -> &MethodParameterMarkers {
        &self.method_parameters
    }

    /// All constructor parameter markers.
    #[must_use]
    pub fn constructor_parameters(&self) -> &ConstructorParameterMarkers {
        &self.constructor_parameters
    }

    /// Field markers of type `annotation_type`, in discovery order.
    #[must_use]
    pub fn field_data(&self, annotation_type: &str) -> &[MetadataDatum<FieldRc>] {
        self.fields_by_marker
            .get(annotation_type)
            .map_or(&[], Vec::as_slice)
    }

    /// Method markers of type `annotation_type`, in discovery order.
    #[must_use]
    pub fn method_data(&self, annotation_type: &str) -> &[MetadataDatum<MethodRc>] {
        self.methods_by_marker
            .get(annotation_type)
            .map_or(&[], Vec::as_slice)
    }

    /// Constructor markers of type `annotation_type`, in discovery order.
    #[must_use]
    pub fn constructor_data(&self, annotation_type: &str) -> &[MetadataDatum<ConstructorRc>] {
        self.constructors_by_marker
            .get(annotation_type)
            .map_or(&[], Vec::as_slice)
    }

    /// Markers of `field`.
    #[must_use]
    pub fn field_markers(&self, field: &FieldRc) -> &[MetadataDatum<FieldRc>] {
        self.fields.get(field).map_or(&[], Vec::as_slice)
    }

    /// Markers of `method`, including the ones inherited from methods it overrides.
    #[must_use]
    pub fn method_markers(&self, method: &MethodRc) -> &[MetadataDatum<MethodRc>] {
        self.methods.get(method).map_or(&[], Vec::as_slice)
    }

    /// Markers of `constructor`.
    #[must_use]
    pub fn constructor_markers(
        &self,
        constructor: &ConstructorRc,
    ) -> &[MetadataDatum<ConstructorRc>] {
        self.constructors.get(constructor).map_or(&[], Vec::as_slice)
    }

    /// Per-position parameter markers of `constructor`.
    #[must_use]
    pub fn constructor_parameter_markers(
        &self,
        constructor: &ConstructorRc,
    ) -> &[Vec<MetadataDatum<ParameterRc>>] {
        self.constructor_parameters
            .get(constructor)
            .map_or(&[], Vec::as_slice)
    }

    /// Per-position parameter markers of `method`.
    #[must_use]
    pub fn method_parameter_markers(&self, method: &MethodRc) -> &[Vec<MetadataDatum<ParameterRc>>] {
        self.method_parameters.get(method).map_or(&[], Vec::as_slice)
    }

    /// Member markers of the members declared by `type_name`.
    #[must_use]
    pub fn declared_data(&self, type_name: &str) -> Cow<'_, DeclaredMarkers> {
        self.declared
            .get(type_name)
            .map_or_else(|| Cow::Owned(DeclaredMarkers::default()), Cow::Borrowed)
    }

    /// Method parameter markers of type `annotation_type`.
    ///
    /// Every position of a listed method is kept, so indices still match the declaration; methods
    /// without such a marker on any parameter are left out.
    #[must_use]
    pub fn method_parameter_data(&self, annotation_type: &str) -> Cow<'_, MethodParameterMarkers> {
        self.method_parameters_by_marker
            .get(annotation_type)
            .map_or_else(|| Cow::Owned(MethodParameterMarkers::new()), Cow::Borrowed)
    }

    /// Constructor parameter markers of type `annotation_type`, positions preserved.
    #[must_use]
    pub fn constructor_parameter_data(
        &self,
        annotation_type: &str,
    ) -> Cow<'_, ConstructorParameterMarkers> {
        self.constructor_parameters_by_marker
            .get(annotation_type)
            .map_or_else(|| Cow::Owned(ConstructorParameterMarkers::new()), Cow::Borrowed)
    }

    /// Field and method markers of type `annotation_type`, keyed by member simple name.
    ///
    /// # Errors
    /// Returns [`crate::Error::Conflict`] if a field and a method with the same name both carry
    /// `annotation_type`.
    pub fn accessible_index(&self, annotation_type: &str) -> Result<Cow<'_, AccessibleIndex>> {
        match self.accessible.get(annotation_type) {
            None => Ok(Cow::Owned(AccessibleIndex::new())),
            Some(Ok(index)) => Ok(Cow::Borrowed(index)),
            Some(Err(name)) => Err(Error::Conflict {
                annotation_type: annotation_type.to_string(),
                name: name.clone(),
            }),
        }
    }

    /// Every marker type found on the type or any of its members, in discovery order.
    #[must_use]
    pub fn marker_types(&self) -> Vec<&str> {
        let mut marker_types: Vec<&str> = Vec::new();
        let names = self
            .type_markers
            .keys()
            .chain(self.fields_by_marker.keys())
            .chain(self.methods_by_marker.keys())
            .chain(self.constructors_by_marker.keys())
            .chain(self.method_parameters_by_marker.keys())
            .chain(self.constructor_parameters_by_marker.keys());
        for name in names {
            if !marker_types.contains(&name.as_str()) {
                marker_types.push(name);
            }
        }
        marker_types
    }

    /// Returns `true` if `annotation_type` appears on the type or any of its members.
    #[must_use]
    pub fn has_marker(&self, annotation_type: &str) -> bool {
        self.type_markers.contains_key(annotation_type)
            || self.fields_by_marker.contains_key(annotation_type)
            || self.methods_by_marker.contains_key(annotation_type)
            || self.constructors_by_marker.contains_key(annotation_type)
            || self.method_parameters_by_marker.contains_key(annotation_type)
            || self
                .constructor_parameters_by_marker
                .contains_key(annotation_type)
    }

    /// Returns `true` if no marker was found at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.type_markers.is_empty()
            && self.fields.is_empty()
            && self.methods.is_empty()
            && self.constructors.is_empty()
            && self.method_parameters.is_empty()
            && self.constructor_parameters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::typesystem::{ExactTypes, TypeBuilder},
        test::{class_with_markers, marker},
    };

    #[test]
    fn indices_group_by_marker_and_declaring_type() {
        let base = TypeBuilder::class("demo.Base")
            .field("id", "long", |f| f.annotation(marker("demo.Column", &[])))
            .method("name", |m| {
                m.returns("java.lang.String")
                    .annotation(marker("demo.Column", &[("value", "n")]))
            })
            .build();
        let service = TypeBuilder::class("demo.Service")
            .extends(&base)
            .field("email", "java.lang.String", |f| {
                f.annotation(marker("demo.Column", &[]))
                    .annotation(marker("demo.Unique", &[]))
            })
            .constructor(|c| c.annotation(marker("demo.Inject", &[])))
            .build();

        let digest = Digest::from_type(&service, &ExactTypes, &DigestOptions::default());

        assert_eq!(digest.source(), DigestSource::Live);
        assert_eq!(digest.field_data("demo.Column").len(), 2);
        assert_eq!(digest.field_data("demo.Unique").len(), 1);
        assert_eq!(digest.method_data("demo.Column").len(), 1);
        assert_eq!(digest.constructor_data("demo.Inject").len(), 1);
        assert!(digest.constructor_data("demo.Column").is_empty());

        let declared = digest.declared_data("demo.Base");
        assert_eq!(declared.fields.len(), 1);
        assert_eq!(declared.methods.len(), 1);
        assert!(declared.constructors.is_empty());
        assert_eq!(digest.declared_data("demo.Service").constructors.len(), 1);
        assert_eq!(digest.declared_data("demo.Nowhere").into_owned(), DeclaredMarkers::default());

        let index = digest.accessible_index("demo.Column").unwrap();
        assert_eq!(index.keys().collect::<Vec<_>>(), ["email", "id", "name"]);
        assert!(matches!(index["name"], AccessibleDatum::Method(_)));

        assert_eq!(
            digest.marker_types(),
            ["demo.Column", "demo.Unique", "demo.Inject"]
        );
        assert!(digest.has_marker("demo.Inject"));
        assert!(!digest.has_marker("demo.Missing"));
    }

    #[test]
    fn conflict_withholds_only_that_index() {
        let service = TypeBuilder::class("demo.Service")
            .field("name", "java.lang.String", |f| {
                f.annotation(marker("demo.Exposed", &[]))
                    .annotation(marker("demo.Column", &[]))
            })
            .method("name", |m| {
                m.returns("java.lang.String")
                    .annotation(marker("demo.Exposed", &[]))
            })
            .build();

        let digest = Digest::from_type(&service, &ExactTypes, &DigestOptions::default());

        match digest.accessible_index("demo.Exposed") {
            Err(Error::Conflict {
                annotation_type,
                name,
            }) => {
                assert_eq!(annotation_type, "demo.Exposed");
                assert_eq!(name, "name");
            }
            other => panic!("expected conflict, got {other:?}"),
        }
        assert_eq!(digest.accessible_index("demo.Column").unwrap().len(), 1);
        assert!(digest.accessible_index("demo.Missing").unwrap().is_empty());
    }

    #[test]
    fn parameter_data_is_filtered_with_positions() {
        let service = TypeBuilder::class("demo.Service")
            .method("configure", |m| {
                m.parameter("int", |p| p.annotation(marker("demo.Min", &[])))
                    .parameter("int", |p| p.annotation(marker("demo.Max", &[])))
            })
            .method("other", |m| {
                m.parameter("int", |p| p.annotation(marker("demo.Max", &[])))
            })
            .build();

        let digest = Digest::from_type(&service, &ExactTypes, &DigestOptions::default());

        let min = digest.method_parameter_data("demo.Min");
        assert_eq!(min.len(), 1);
        let positions = &min[0];
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].len(), 1);
        assert!(positions[1].is_empty());

        assert_eq!(digest.method_parameter_data("demo.Max").len(), 2);
        assert!(digest.method_parameter_data("demo.None").is_empty());
        assert!(digest.constructor_parameter_data("demo.Min").is_empty());

        let method = digest.method_parameters().keys().next().unwrap().clone();
        assert_eq!(digest.method_parameter_markers(&method).len(), 2);
    }

    #[test]
    fn binary_digest_has_no_members() {
        let data = class_with_markers(
            "demo.Service",
            &[marker("demo.Component", &[("value", "svc")])],
        );

        let digest = Digest::from_class_bytes(data, None, &DigestOptions::default()).unwrap();
        assert_eq!(digest.type_name(), "demo.Service");
        assert_eq!(
            digest.source(),
            DigestSource::Binary {
                terminated_early: false
            }
        );
        assert!(digest.class_datum("demo.Component").is_some());
        assert!(digest.fields().is_empty());
        assert!(digest.field_data("demo.Component").is_empty());
        assert!(digest.accessible_index("demo.Component").unwrap().is_empty());
        assert!(!digest.is_empty());
    }
}
