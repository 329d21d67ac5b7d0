//! Override-aware reader over registered host types.
//!
//! The reader computes the type chain once at construction. Every query then scans the chain in
//! order, so declarations closer to the inspected type win over inherited ones.

use indexmap::IndexMap;

use crate::metadata::{
    datum::MetadataDatum,
    digest::DigestOptions,
    reader::{
        ConstructorMarkers, ConstructorParameterMarkers, FieldMarkers, MetadataReader,
        MethodMarkers, MethodParameterMarkers, ParameterMarkers, TypeMarkers,
    },
    resolver::OverrideResolver,
    typesystem::{type_chain, AnnotationList, ParameterRc, TypeHierarchy, TypeRc},
};

/// Reads markers from a [`TypeRc`] and everything it inherits from.
///
/// # Examples
///
/// ```rust
/// use metadigest::metadata::{
///     datum::MetadataDatum,
///     digest::DigestOptions,
///     properties::PropertySet,
///     reader::{LiveReader, MetadataReader},
///     typesystem::{ExactTypes, TypeBuilder},
/// };
///
/// let component: MetadataDatum = MetadataDatum::new("demo.Component", PropertySet::new(), None)?;
/// let base = TypeBuilder::class("demo.Base").annotation(component).build();
/// let service = TypeBuilder::class("demo.Service").extends(&base).build();
///
/// let reader = LiveReader::new(&service, &ExactTypes, &DigestOptions::default());
/// assert!(reader.type_markers().contains_key("demo.Component"));
///
/// let reader = LiveReader::new(&service, &ExactTypes, &DigestOptions::declared_only());
/// assert!(reader.type_markers().is_empty());
/// # Ok::<(), metadigest::Error>(())
/// ```
pub struct LiveReader<'a, H: TypeHierarchy + ?Sized> {
    ty: TypeRc,
    chain: Vec<TypeRc>,
    resolver: OverrideResolver<'a, H>,
}

impl<'a, H: TypeHierarchy + ?Sized> LiveReader<'a, H> {
    /// Create a reader for `ty`, answering assignability questions through `hierarchy`.
    pub fn new(ty: &TypeRc, hierarchy: &'a H, options: &DigestOptions) -> Self {
        LiveReader {
            ty: ty.clone(),
            chain: type_chain(ty, options.inherits, options.include_root),
            resolver: OverrideResolver::new(hierarchy, options.return_compatibility),
        }
    }

    /// The inspected type.
    #[must_use]
    pub fn ty(&self) -> &TypeRc {
        &self.ty
    }

    /// The type chain the reader scans.
    #[must_use]
    pub fn chain(&self) -> &[TypeRc] {
        &self.chain
    }
}

/// Attach `element` to each marker of `annotations`, keeping the first marker of every type.
fn attach<E: Clone>(annotations: &AnnotationList, element: &E) -> Vec<MetadataDatum<E>> {
    let mut markers: IndexMap<&str, MetadataDatum<E>> = IndexMap::new();
    for (_, annotation) in annotations.iter() {
        markers
            .entry(annotation.annotation_type())
            .or_insert_with(|| annotation.with_element(Some(element.clone())));
    }
    markers.into_values().collect()
}

fn parameter_markers(parameters: &[ParameterRc]) -> ParameterMarkers {
    parameters
        .iter()
        .map(|parameter| attach(&parameter.annotations, parameter))
        .collect()
}

impl<H: TypeHierarchy + ?Sized> MetadataReader for LiveReader<'_, H> {
    fn type_name(&self) -> &str {
        &self.ty.name
    }

    fn type_markers(&self) -> TypeMarkers {
        let mut markers = TypeMarkers::new();
        for ty in &self.chain {
            for (_, annotation) in ty.annotations.iter() {
                if markers.contains_key(annotation.annotation_type()) {
                    continue;
                }
                markers.insert(
                    annotation.annotation_type().to_string(),
                    annotation.with_element(Some(ty.clone())),
                );
            }
        }
        markers
    }

    fn all_method_markers(&self) -> MethodMarkers {
        self.resolver.resolve(&self.chain)
    }

    fn all_field_markers(&self) -> FieldMarkers {
        let mut markers = FieldMarkers::new();
        for ty in &self.chain {
            for (_, field) in ty.fields.iter() {
                if field.annotations.count() == 0 || markers.contains_key(field) {
                    continue;
                }
                markers.insert(field.clone(), attach(&field.annotations, field));
            }
        }
        markers
    }

    fn all_constructor_markers(&self) -> ConstructorMarkers {
        let mut markers = ConstructorMarkers::new();
        for ty in &self.chain {
            for (_, constructor) in ty.constructors.iter() {
                if constructor.annotations.count() == 0 || markers.contains_key(constructor) {
                    continue;
                }
                markers.insert(
                    constructor.clone(),
                    attach(&constructor.annotations, constructor),
                );
            }
        }
        markers
    }

    fn all_method_parameter_markers(&self) -> MethodParameterMarkers {
        let mut markers = MethodParameterMarkers::new();
        for ty in &self.chain {
            for (_, method) in ty.methods.iter() {
                if !method.has_parameter_annotations() || markers.contains_key(method) {
                    continue;
                }
                markers.insert(method.clone(), parameter_markers(&method.parameters));
            }
        }
        markers
    }

    fn all_constructor_parameter_markers(&self) -> ConstructorParameterMarkers {
        let mut markers = ConstructorParameterMarkers::new();
        for ty in &self.chain {
            for (_, constructor) in ty.constructors.iter() {
                if !constructor.has_parameter_annotations() || markers.contains_key(constructor) {
                    continue;
                }
                markers.insert(
                    constructor.clone(),
                    parameter_markers(&constructor.parameters),
                );
            }
        }
        markers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::typesystem::{ExactTypes, TypeBuilder},
        test::marker,
    };

    #[test]
    fn first_declared_type_marker_wins() {
        let named = TypeBuilder::interface("demo.Named")
            .annotation(marker("demo.Scope", &[("value", "interface")]))
            .build();
        let base = TypeBuilder::class("demo.Base")
            .implements(&named)
            .annotation(marker("demo.Scope", &[("value", "base")]))
            .annotation(marker("demo.Component", &[]))
            .build();
        let service = TypeBuilder::class("demo.Service")
            .extends(&base)
            .annotation(marker("demo.Scope", &[("value", "service")]))
            .build();

        let reader = LiveReader::new(&service, &ExactTypes, &DigestOptions::default());
        let markers = reader.type_markers();

        assert_eq!(markers.len(), 2);
        let scope = &markers["demo.Scope"];
        assert_eq!(scope.get("value").and_then(|v| v.as_str()), Some("service"));
        assert_eq!(scope.element().map(|t| t.name.as_str()), Some("demo.Service"));
        assert_eq!(
            markers["demo.Component"].element().map(|t| t.name.as_str()),
            Some("demo.Base")
        );
    }

    #[test]
    fn fields_and_constructors_across_chain() {
        let base = TypeBuilder::class("demo.Base")
            .field("id", "long", |f| f.annotation(marker("demo.Id", &[])))
            .field("plain", "int", |f| f)
            .constructor(|c| c.annotation(marker("demo.Inject", &[])))
            .build();
        let service = TypeBuilder::class("demo.Service")
            .extends(&base)
            .field("name", "java.lang.String", |f| {
                f.annotation(marker("demo.Value", &[("value", "a")]))
                    .annotation(marker("demo.Value", &[("value", "b")]))
            })
            .build();

        let reader = LiveReader::new(&service, &ExactTypes, &DigestOptions::default());
        let fields = reader.all_field_markers();
        let names: Vec<&str> = fields.keys().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["name", "id"]);
        let name_markers = &fields[0];
        assert_eq!(name_markers.len(), 1);
        assert_eq!(
            name_markers[0].get("value").and_then(|v| v.as_str()),
            Some("a")
        );

        let constructors = reader.all_constructor_markers();
        assert_eq!(constructors.len(), 1);
        assert_eq!(
            constructors.keys().next().map(|c| c.declaring_type.as_str()),
            Some("demo.Base")
        );
    }

    #[test]
    fn parameter_markers_keep_positions() {
        let service = TypeBuilder::class("demo.Service")
            .method("configure", |m| {
                m.parameter("int", |p| p)
                    .parameter("java.lang.String", |p| {
                        p.annotation(marker("demo.Named", &[("value", "host")]))
                    })
            })
            .method("plain", |m| m.parameter("int", |p| p))
            .constructor(|c| {
                c.parameter("int", |p| p.annotation(marker("demo.Value", &[])))
            })
            .build();

        let reader = LiveReader::new(&service, &ExactTypes, &DigestOptions::default());
        let methods = reader.all_method_parameter_markers();
        assert_eq!(methods.len(), 1);
        let positions = &methods[0];
        assert_eq!(positions.len(), 2);
        assert!(positions[0].is_empty());
        assert_eq!(positions[1][0].annotation_type(), "demo.Named");
        assert_eq!(positions[1][0].element().map(|p| p.index), Some(1));

        let constructors = reader.all_constructor_parameter_markers();
        assert_eq!(constructors.len(), 1);
        assert_eq!(constructors[0][0].len(), 1);
    }

    #[test]
    fn declared_only_ignores_base() {
        let base = TypeBuilder::class("demo.Base")
            .method("name", |m| {
                m.returns("java.lang.String")
                    .annotation(marker("demo.M", &[]))
            })
            .build();
        let service = TypeBuilder::class("demo.Service")
            .extends(&base)
            .method("name", |m| m.returns("java.lang.String"))
            .build();

        let reader = LiveReader::new(&service, &ExactTypes, &DigestOptions::declared_only());
        assert_eq!(reader.chain().len(), 1);
        assert!(reader.all_method_markers().is_empty());

        let reader = LiveReader::new(&service, &ExactTypes, &DigestOptions::default());
        assert_eq!(reader.all_method_markers().len(), 1);
    }
}
